//! Role permission lookups.
//!
//! Roles and their assignments are managed by the host CMS; this service
//! only reads the permissions they grant.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

/// Well-known role IDs.
pub mod well_known {
    use uuid::Uuid;

    /// Authenticated user role (assigned to all logged-in users).
    pub const AUTHENTICATED_ROLE_ID: Uuid = Uuid::from_u128(2);
}

/// Get all permissions granted by a role.
pub async fn role_permissions(pool: &PgPool, role_id: Uuid) -> Result<Vec<String>> {
    let permissions = sqlx::query_scalar::<_, String>(
        "SELECT permission FROM role_permissions WHERE role_id = $1",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await
    .context("failed to get role permissions")?;

    Ok(permissions)
}

/// Get all permissions granted to a user through their assigned roles.
pub async fn user_permissions(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>> {
    let permissions = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT rp.permission
        FROM role_permissions rp
        JOIN user_roles ur ON rp.role_id = ur.role_id
        WHERE ur.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to get user permissions")?;

    Ok(permissions)
}
