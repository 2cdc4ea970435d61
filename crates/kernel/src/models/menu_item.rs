//! Menu item model.
//!
//! A menu item is one entry of a navigation menu. It points at a target
//! chosen through the dependent dropdowns of the admin form (module, route
//! type, route, and optionally a model row or a persisted menu route) and may
//! have a parent item for hierarchical menus.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Style applied to new items when none is given.
pub const DEFAULT_STYLE: &str = r#"{"icon":"0xf0f6","color":"rgb(234, 153, 153)","iconSize":"24"}"#;

/// Parsed [`DEFAULT_STYLE`].
pub fn default_style() -> serde_json::Value {
    serde_json::from_str(DEFAULT_STYLE).unwrap_or_else(|_| serde_json::json!({}))
}

/// Menu item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Menu this item belongs to.
    pub menu_id: Uuid,

    /// Optional parent item for hierarchy.
    pub parent_id: Option<Uuid>,

    /// Display label.
    pub label: String,

    /// Machine-friendly slug, unique per menu by convention.
    pub slug: String,

    /// Module the target was chosen from.
    pub module: Option<String>,

    /// Route kind: "widget", "model", "action" or "route".
    pub route_type: Option<String>,

    /// Chosen route (or widget label).
    pub route: Option<String>,

    /// Chosen row id for `model` routes.
    pub model_id: Option<String>,

    /// Chosen persisted menu route, if any.
    pub menu_route_id: Option<String>,

    /// Presentation settings (icon, color, size).
    pub style: serde_json::Value,

    /// Sort weight (lower = higher priority).
    pub sort: i32,

    /// User who created the item.
    pub owner_id: Uuid,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a menu item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMenuItem {
    pub menu_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub label: String,
    pub slug: String,
    pub module: Option<String>,
    pub route_type: Option<String>,
    pub route: Option<String>,
    pub model_id: Option<String>,
    pub menu_route_id: Option<String>,
    pub style: Option<serde_json::Value>,
    pub sort: Option<i32>,
    pub owner_id: Uuid,
}

/// Input for updating a menu item.
///
/// `None` leaves a field unchanged; nullable columns take `Some(None)` to clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenuItem {
    pub menu_id: Option<Uuid>,
    pub parent_id: Option<Option<Uuid>>,
    pub label: Option<String>,
    pub slug: Option<String>,
    pub module: Option<Option<String>>,
    pub route_type: Option<Option<String>>,
    pub route: Option<Option<String>>,
    pub model_id: Option<Option<String>>,
    pub menu_route_id: Option<Option<String>>,
    pub style: Option<serde_json::Value>,
    pub sort: Option<i32>,
}

impl MenuItem {
    /// Apply an update to this record in memory.
    ///
    /// Shared by every store so partial-update semantics stay identical.
    pub fn apply(&mut self, input: UpdateMenuItem, now: i64) {
        if let Some(v) = input.menu_id {
            self.menu_id = v;
        }
        if let Some(v) = input.parent_id {
            self.parent_id = v;
        }
        if let Some(v) = input.label {
            self.label = v;
        }
        if let Some(v) = input.slug {
            self.slug = v;
        }
        if let Some(v) = input.module {
            self.module = v;
        }
        if let Some(v) = input.route_type {
            self.route_type = v;
        }
        if let Some(v) = input.route {
            self.route = v;
        }
        if let Some(v) = input.model_id {
            self.model_id = v;
        }
        if let Some(v) = input.menu_route_id {
            self.menu_route_id = v;
        }
        if let Some(v) = input.style {
            self.style = v;
        }
        if let Some(v) = input.sort {
            self.sort = v;
        }
        self.changed = now;
    }

    /// Build a new record from creation input.
    pub fn from_input(input: CreateMenuItem, id: Uuid, now: i64) -> Self {
        Self {
            id,
            menu_id: input.menu_id,
            parent_id: input.parent_id,
            label: input.label,
            slug: input.slug,
            module: input.module,
            route_type: input.route_type,
            route: input.route,
            model_id: input.model_id,
            menu_route_id: input.menu_route_id,
            style: input.style.unwrap_or_else(default_style),
            sort: input.sort.unwrap_or(0),
            owner_id: input.owner_id,
            created: now,
            changed: now,
        }
    }

    /// Create a new menu item.
    pub async fn create(pool: &PgPool, input: CreateMenuItem) -> Result<Self> {
        let item = Self::from_input(input, Uuid::now_v7(), chrono::Utc::now().timestamp());

        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_item (id, menu_id, parent_id, label, slug, module, route_type, route,
                                   model_id, menu_route_id, style, sort, owner_id, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id, menu_id, parent_id, label, slug, module, route_type, route,
                      model_id, menu_route_id, style, sort, owner_id, created, changed
            "#,
        )
        .bind(item.id)
        .bind(item.menu_id)
        .bind(item.parent_id)
        .bind(&item.label)
        .bind(&item.slug)
        .bind(&item.module)
        .bind(&item.route_type)
        .bind(&item.route)
        .bind(&item.model_id)
        .bind(&item.menu_route_id)
        .bind(&item.style)
        .bind(item.sort)
        .bind(item.owner_id)
        .bind(item.created)
        .bind(item.changed)
        .fetch_one(pool)
        .await
        .context("failed to create menu item")?;

        Ok(item)
    }

    /// Find a menu item by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, menu_id, parent_id, label, slug, module, route_type, route,
                   model_id, menu_route_id, style, sort, owner_id, created, changed
            FROM menu_item
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch menu item by id")?;

        Ok(item)
    }

    /// Update a menu item.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateMenuItem) -> Result<Option<Self>> {
        let Some(mut item) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        item.apply(input, chrono::Utc::now().timestamp());

        let updated = sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_item
            SET menu_id = $1, parent_id = $2, label = $3, slug = $4, module = $5,
                route_type = $6, route = $7, model_id = $8, menu_route_id = $9,
                style = $10, sort = $11, changed = $12
            WHERE id = $13
            RETURNING id, menu_id, parent_id, label, slug, module, route_type, route,
                      model_id, menu_route_id, style, sort, owner_id, created, changed
            "#,
        )
        .bind(item.menu_id)
        .bind(item.parent_id)
        .bind(&item.label)
        .bind(&item.slug)
        .bind(&item.module)
        .bind(&item.route_type)
        .bind(&item.route)
        .bind(&item.model_id)
        .bind(&item.menu_route_id)
        .bind(&item.style)
        .bind(item.sort)
        .bind(item.changed)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update menu item")?;

        Ok(updated)
    }

    /// Delete a menu item. Children are detached, not deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu_item WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete menu item")?;

        Ok(result.rows_affected() > 0)
    }

    /// List items of a menu with pagination, optionally only those owned by `owner`.
    pub async fn list_by_menu(
        pool: &PgPool,
        menu_id: Uuid,
        owner: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let items = sqlx::query_as::<_, MenuItem>(
            r#"
            SELECT id, menu_id, parent_id, label, slug, module, route_type, route,
                   model_id, menu_route_id, style, sort, owner_id, created, changed
            FROM menu_item
            WHERE menu_id = $1 AND ($2::uuid IS NULL OR owner_id = $2)
            ORDER BY sort ASC, label ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(menu_id)
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("failed to list menu items by menu")?;

        Ok(items)
    }

    /// Count items of a menu, optionally only those owned by `owner`.
    pub async fn count_by_menu(pool: &PgPool, menu_id: Uuid, owner: Option<Uuid>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM menu_item WHERE menu_id = $1 AND ($2::uuid IS NULL OR owner_id = $2)",
        )
        .bind(menu_id)
        .bind(owner)
        .fetch_one(pool)
        .await
        .context("failed to count menu items by menu")?;

        Ok(count)
    }
}

/// Persistence for menu items.
#[async_trait]
pub trait MenuItemStore: Send + Sync {
    async fn create(&self, input: CreateMenuItem) -> Result<MenuItem>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MenuItem>>;

    /// Returns `None` if the item does not exist.
    async fn update(&self, id: Uuid, input: UpdateMenuItem) -> Result<Option<MenuItem>>;

    /// Returns `false` if the item does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list_by_menu(
        &self,
        menu_id: Uuid,
        owner: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MenuItem>>;

    async fn count_by_menu(&self, menu_id: Uuid, owner: Option<Uuid>) -> Result<i64>;

    /// Whether the backing store is reachable.
    async fn healthy(&self) -> bool {
        true
    }
}

/// PostgreSQL-backed menu item store.
#[derive(Clone)]
pub struct PgMenuItemStore {
    pool: PgPool,
}

impl PgMenuItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuItemStore for PgMenuItemStore {
    async fn create(&self, input: CreateMenuItem) -> Result<MenuItem> {
        MenuItem::create(&self.pool, input).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MenuItem>> {
        MenuItem::find_by_id(&self.pool, id).await
    }

    async fn update(&self, id: Uuid, input: UpdateMenuItem) -> Result<Option<MenuItem>> {
        MenuItem::update(&self.pool, id, input).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        MenuItem::delete(&self.pool, id).await
    }

    async fn list_by_menu(
        &self,
        menu_id: Uuid,
        owner: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MenuItem>> {
        MenuItem::list_by_menu(&self.pool, menu_id, owner, limit, offset).await
    }

    async fn count_by_menu(&self, menu_id: Uuid, owner: Option<Uuid>) -> Result<i64> {
        MenuItem::count_by_menu(&self.pool, menu_id, owner).await
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn input() -> CreateMenuItem {
        CreateMenuItem {
            menu_id: Uuid::nil(),
            parent_id: None,
            label: "Home".to_string(),
            slug: "home".to_string(),
            module: Some("menu".to_string()),
            route_type: Some("action".to_string()),
            route: Some("/".to_string()),
            model_id: None,
            menu_route_id: None,
            style: None,
            sort: None,
            owner_id: Uuid::from_u128(7),
        }
    }

    #[test]
    fn default_style_parses() {
        let style = default_style();
        assert_eq!(style["icon"], "0xf0f6");
        assert_eq!(style["iconSize"], "24");
    }

    #[test]
    fn from_input_fills_defaults() {
        let item = MenuItem::from_input(input(), Uuid::from_u128(1), 100);
        assert_eq!(item.sort, 0);
        assert_eq!(item.style, default_style());
        assert_eq!(item.created, 100);
        assert_eq!(item.changed, 100);
    }

    #[test]
    fn apply_updates_only_given_fields() {
        let mut item = MenuItem::from_input(input(), Uuid::from_u128(1), 100);
        item.apply(
            UpdateMenuItem {
                label: Some("Start".to_string()),
                route: Some(None),
                ..Default::default()
            },
            200,
        );

        assert_eq!(item.label, "Start");
        assert_eq!(item.slug, "home");
        assert_eq!(item.route, None);
        assert_eq!(item.module.as_deref(), Some("menu"));
        assert_eq!(item.created, 100);
        assert_eq!(item.changed, 200);
    }
}
