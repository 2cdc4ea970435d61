//! Menu route model.
//!
//! Menu routes are named, persisted link targets (e.g. a page of a module)
//! that menu items can point at directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Menu route record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuRoute {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Module that owns the route.
    pub module: String,

    /// Route path.
    pub route: String,

    /// Display title.
    pub title: String,

    /// Unix timestamp when created.
    pub created: i64,
}

impl MenuRoute {
    /// List every menu route.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        let routes = sqlx::query_as::<_, MenuRoute>(
            "SELECT id, module, route, title, created FROM menu_route ORDER BY created ASC, id ASC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list menu routes")?;

        Ok(routes)
    }

    /// List menu routes owned by a module.
    pub async fn list_by_module(pool: &PgPool, module: &str) -> Result<Vec<Self>> {
        let routes = sqlx::query_as::<_, MenuRoute>(
            r#"
            SELECT id, module, route, title, created
            FROM menu_route
            WHERE module = $1
            ORDER BY created ASC, id ASC
            "#,
        )
        .bind(module)
        .fetch_all(pool)
        .await
        .context("failed to list menu routes by module")?;

        Ok(routes)
    }
}

/// Read access to persisted menu routes.
#[async_trait]
pub trait MenuRouteStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<MenuRoute>>;

    async fn list_by_module(&self, module: &str) -> Result<Vec<MenuRoute>>;
}

/// PostgreSQL-backed menu route store.
#[derive(Clone)]
pub struct PgMenuRouteStore {
    pool: PgPool,
}

impl PgMenuRouteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRouteStore for PgMenuRouteStore {
    async fn list_all(&self) -> Result<Vec<MenuRoute>> {
        MenuRoute::list_all(&self.pool).await
    }

    async fn list_by_module(&self, module: &str) -> Result<Vec<MenuRoute>> {
        MenuRoute::list_by_module(&self.pool, module).await
    }
}
