//! Authorization gate with DashMap-based permission caching.
//!
//! Every menu item action is gated by a named [`Permission`]. Edit and
//! delete checks are target-aware: a principal lacking the general
//! permission may still act on items it owns if it holds the matching
//! "own" permission.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::role::{self, well_known};
use crate::models::{MenuItem, User};

/// The authenticated user a request acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

/// Menu item actions that require a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewMenuItems,
    ViewOwnMenuItems,
    ViewMenuItem,
    CreateMenuItems,
    EditMenuItems,
    EditOwnMenuItems,
    DeleteMenuItems,
    DeleteOwnMenuItems,
    LookupRouteTypes,
    LookupRoutes,
    LookupModels,
}

impl Permission {
    /// Machine name stored in `role_permissions`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewMenuItems => "view menu items",
            Self::ViewOwnMenuItems => "view own menu items",
            Self::ViewMenuItem => "view menu item",
            Self::CreateMenuItems => "create menu items",
            Self::EditMenuItems => "edit menu items",
            Self::EditOwnMenuItems => "edit own menu items",
            Self::DeleteMenuItems => "delete menu items",
            Self::DeleteOwnMenuItems => "delete own menu items",
            Self::LookupRouteTypes => "lookup menu route types",
            Self::LookupRoutes => "lookup menu routes",
            Self::LookupModels => "lookup menu models",
        }
    }

    /// The ownership-restricted variant consulted for target-aware checks.
    pub fn own_variant(&self) -> Option<Permission> {
        match self {
            Self::EditMenuItems => Some(Self::EditOwnMenuItems),
            Self::DeleteMenuItems => Some(Self::DeleteOwnMenuItems),
            _ => None,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where principals and their permissions come from.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Load an active principal by user ID.
    async fn principal(&self, user_id: Uuid) -> Result<Option<Principal>>;

    /// Load every permission granted to a principal.
    async fn permissions(&self, principal: &Principal) -> Result<HashSet<String>>;
}

/// Permission source reading the host's users and roles tables.
#[derive(Clone)]
pub struct PgPermissionSource {
    pool: PgPool,
}

impl PgPermissionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionSource for PgPermissionSource {
    async fn principal(&self, user_id: Uuid) -> Result<Option<Principal>> {
        let user = User::find_by_id(&self.pool, user_id).await?;
        Ok(user
            .filter(|u| u.is_active() && !u.is_anonymous())
            .map(|u| Principal {
                id: u.id,
                name: u.name,
                is_admin: u.is_admin,
            }))
    }

    async fn permissions(&self, principal: &Principal) -> Result<HashSet<String>> {
        let mut permissions = HashSet::new();

        // Direct role permissions
        permissions.extend(role::user_permissions(&self.pool, principal.id).await?);

        // All authenticated users also get the authenticated role permissions
        permissions.extend(
            role::role_permissions(&self.pool, well_known::AUTHENTICATED_ROLE_ID).await?,
        );

        Ok(permissions)
    }
}

/// Permission cache entry.
#[derive(Debug, Clone)]
struct CachedPermissions {
    permissions: HashSet<String>,
}

/// Authorization gate with fast DashMap-based lookups.
#[derive(Clone)]
pub struct AuthorizationGate {
    inner: Arc<AuthorizationGateInner>,
}

struct AuthorizationGateInner {
    /// Cache of user_id -> permissions.
    user_cache: DashMap<Uuid, CachedPermissions>,

    /// Source for cache misses.
    source: Arc<dyn PermissionSource>,
}

impl AuthorizationGate {
    /// Create a new gate over a permission source.
    pub fn new(source: Arc<dyn PermissionSource>) -> Self {
        Self {
            inner: Arc::new(AuthorizationGateInner {
                user_cache: DashMap::new(),
                source,
            }),
        }
    }

    /// Resolve a user ID to an active principal.
    pub async fn principal(&self, user_id: Uuid) -> Result<Option<Principal>> {
        self.inner.source.principal(user_id).await
    }

    /// Check if a principal holds a named permission.
    ///
    /// Admins hold every permission.
    pub async fn has_permission(&self, principal: &Principal, permission: &str) -> Result<bool> {
        if principal.is_admin {
            return Ok(true);
        }

        if let Some(cached) = self.inner.user_cache.get(&principal.id) {
            return Ok(cached.permissions.contains(permission));
        }

        // Cache miss - load from source
        let permissions = self.inner.source.permissions(principal).await?;
        let has_permission = permissions.contains(permission);

        self.inner
            .user_cache
            .insert(principal.id, CachedPermissions { permissions });

        Ok(has_permission)
    }

    /// Decide whether a principal may perform `permission`, optionally on `target`.
    pub async fn allows(
        &self,
        principal: &Principal,
        permission: Permission,
        target: Option<&MenuItem>,
    ) -> Result<bool> {
        if self.has_permission(principal, permission.as_str()).await? {
            return Ok(true);
        }

        let allowed = match (permission.own_variant(), target) {
            (Some(own), Some(item)) if item.owner_id == principal.id => {
                self.has_permission(principal, own.as_str()).await?
            }
            _ => false,
        };

        debug!(
            user_id = %principal.id,
            permission = %permission,
            allowed,
            "permission check fell through to ownership"
        );
        Ok(allowed)
    }

    /// Check if a principal holds at least one of `permissions`.
    pub async fn allows_any(&self, principal: &Principal, permissions: &[Permission]) -> Result<bool> {
        for permission in permissions {
            if self.has_permission(principal, permission.as_str()).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Invalidate the cache for a specific user.
    ///
    /// Call this when a user's roles or permissions change.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.inner.user_cache.remove(&user_id);
    }

    /// Invalidate the entire cache.
    ///
    /// Call this when role permissions change.
    pub fn invalidate_all(&self) {
        self.inner.user_cache.clear();
    }

    /// Get the number of cached entries (for monitoring).
    pub fn cache_size(&self) -> usize {
        self.inner.user_cache.len()
    }
}
