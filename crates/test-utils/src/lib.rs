//! Navkit test utilities.
//!
//! In-memory stores, permission sources, and fixture builders for driving
//! the kernel router without PostgreSQL or Redis.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use navkit_kernel::menu::{OptionPair, ProjectedQuery};
use navkit_kernel::models::{CreateMenuItem, MenuItem, MenuItemStore, MenuRoute, MenuRouteStore, UpdateMenuItem};
use navkit_kernel::permissions::{Permission, PermissionSource, Principal};

fn now() -> i64 {
    1_700_000_000
}

// =============================================================================
// Fixtures
// =============================================================================

/// Create a non-admin principal.
pub fn test_principal(name: &str) -> Principal {
    Principal {
        id: Uuid::now_v7(),
        name: name.to_string(),
        is_admin: false,
    }
}

/// Create an admin principal.
pub fn test_admin() -> Principal {
    Principal {
        id: Uuid::now_v7(),
        name: "admin".to_string(),
        is_admin: true,
    }
}

/// Create a test menu item with default values.
pub fn test_menu_item(menu_id: Uuid, label: &str) -> TestMenuItem {
    TestMenuItem {
        id: Uuid::now_v7(),
        input: CreateMenuItem {
            menu_id,
            parent_id: None,
            label: label.to_string(),
            slug: label.to_lowercase().replace(' ', "-"),
            module: None,
            route_type: None,
            route: None,
            model_id: None,
            menu_route_id: None,
            style: None,
            sort: None,
            owner_id: Uuid::nil(),
        },
    }
}

/// A menu item builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestMenuItem {
    id: Uuid,
    input: CreateMenuItem,
}

impl TestMenuItem {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner_id: Uuid) -> Self {
        self.input.owner_id = owner_id;
        self
    }

    /// Set the sort weight.
    pub fn with_sort(mut self, sort: i32) -> Self {
        self.input.sort = Some(sort);
        self
    }

    /// Point the item at a module route.
    pub fn with_route(mut self, module: &str, route_type: &str, route: &str) -> Self {
        self.input.module = Some(module.to_string());
        self.input.route_type = Some(route_type.to_string());
        self.input.route = Some(route.to_string());
        self
    }

    /// Build the record.
    pub fn build(self) -> MenuItem {
        MenuItem::from_input(self.input, self.id, now())
    }
}

/// Create a persisted menu route record.
pub fn test_menu_route(module: &str, title: &str) -> MenuRoute {
    MenuRoute {
        id: Uuid::now_v7(),
        module: module.to_string(),
        route: format!("/{module}/{}", title.to_lowercase()),
        title: title.to_string(),
        created: now(),
    }
}

// =============================================================================
// In-memory stores
// =============================================================================

/// Menu item store backed by a vector.
#[derive(Default)]
pub struct MemoryMenuItemStore {
    items: RwLock<Vec<MenuItem>>,
}

impl MemoryMenuItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing items.
    pub fn with_items(items: Vec<MenuItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Copy of every stored item.
    pub fn snapshot(&self) -> Vec<MenuItem> {
        self.items.read().clone()
    }

    /// Look up an item without going through the trait.
    pub fn get(&self, id: Uuid) -> Option<MenuItem> {
        self.items.read().iter().find(|i| i.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

fn in_scope(item: &MenuItem, menu_id: Uuid, owner: Option<Uuid>) -> bool {
    item.menu_id == menu_id && owner.is_none_or(|o| item.owner_id == o)
}

#[async_trait]
impl MenuItemStore for MemoryMenuItemStore {
    async fn create(&self, input: CreateMenuItem) -> Result<MenuItem> {
        let item = MenuItem::from_input(input, Uuid::now_v7(), now());
        self.items.write().push(item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MenuItem>> {
        Ok(self.get(id))
    }

    async fn update(&self, id: Uuid, input: UpdateMenuItem) -> Result<Option<MenuItem>> {
        let mut items = self.items.write();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        item.apply(input, now() + 1);
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Ok(false);
        }
        // Children are detached, as with ON DELETE SET NULL
        for child in items.iter_mut().filter(|i| i.parent_id == Some(id)) {
            child.parent_id = None;
        }
        Ok(true)
    }

    async fn list_by_menu(
        &self,
        menu_id: Uuid,
        owner: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MenuItem>> {
        let mut items: Vec<MenuItem> = self
            .items
            .read()
            .iter()
            .filter(|i| in_scope(i, menu_id, owner))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.sort.cmp(&b.sort).then_with(|| a.label.cmp(&b.label)));

        Ok(items
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn count_by_menu(&self, menu_id: Uuid, owner: Option<Uuid>) -> Result<i64> {
        let count = self
            .items
            .read()
            .iter()
            .filter(|i| in_scope(i, menu_id, owner))
            .count();
        Ok(i64::try_from(count)?)
    }
}

/// Menu route store over a fixed list.
#[derive(Default)]
pub struct MemoryMenuRouteStore {
    routes: Vec<MenuRoute>,
}

impl MemoryMenuRouteStore {
    pub fn new(routes: Vec<MenuRoute>) -> Self {
        Self { routes }
    }
}

#[async_trait]
impl MenuRouteStore for MemoryMenuRouteStore {
    async fn list_all(&self) -> Result<Vec<MenuRoute>> {
        Ok(self.routes.clone())
    }

    async fn list_by_module(&self, module: &str) -> Result<Vec<MenuRoute>> {
        Ok(self
            .routes
            .iter()
            .filter(|r| r.module == module)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Permissions and projections
// =============================================================================

/// Permission source with a fixed set of users.
#[derive(Default)]
pub struct StaticPermissions {
    users: RwLock<HashMap<Uuid, (Principal, HashSet<String>)>>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a principal holding `permissions`.
    pub fn with_user(self, principal: &Principal, permissions: &[Permission]) -> Self {
        self.grant(principal, permissions);
        self
    }

    /// Register or replace a principal's permissions.
    pub fn grant(&self, principal: &Principal, permissions: &[Permission]) {
        let names = permissions.iter().map(|p| p.as_str().to_string()).collect();
        self.users
            .write()
            .insert(principal.id, (principal.clone(), names));
    }

    /// Wrap for use as a gate source.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl PermissionSource for StaticPermissions {
    async fn principal(&self, user_id: Uuid) -> Result<Option<Principal>> {
        Ok(self.users.read().get(&user_id).map(|(p, _)| p.clone()))
    }

    async fn permissions(&self, principal: &Principal) -> Result<HashSet<String>> {
        Ok(self
            .users
            .read()
            .get(&principal.id)
            .map(|(_, perms)| perms.clone())
            .unwrap_or_default())
    }
}

/// Projection returning fixed rows, keyed by column name.
pub struct FixedProjection {
    columns: Vec<String>,
    rows: Vec<serde_json::Value>,
}

impl FixedProjection {
    /// Rows are JSON objects; missing or null values project as "".
    pub fn new(columns: &[&str], rows: Vec<serde_json::Value>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

fn cell(row: &serde_json::Value, column: &str) -> String {
    match &row[column] {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ProjectedQuery for FixedProjection {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn fetch(&self, id_field: &str, name_field: &str) -> Result<Vec<OptionPair>> {
        Ok(self
            .rows
            .iter()
            .map(|row| OptionPair::new(cell(row, id_field), cell(row, name_field)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_lists_by_menu_and_owner() {
        let menu = Uuid::now_v7();
        let owner = Uuid::now_v7();
        let store = MemoryMenuItemStore::with_items(vec![
            test_menu_item(menu, "B").with_sort(1).build(),
            test_menu_item(menu, "A").with_sort(1).with_owner(owner).build(),
            test_menu_item(menu, "C").build(),
            test_menu_item(Uuid::now_v7(), "Other").build(),
        ]);

        let all = store.list_by_menu(menu, None, 10, 0).await.unwrap();
        let labels: Vec<_> = all.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "A", "B"]);

        assert_eq!(store.count_by_menu(menu, Some(owner)).await.unwrap(), 1);
        assert_eq!(store.list_by_menu(menu, None, 1, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_detaches_children() {
        let menu = Uuid::now_v7();
        let parent = test_menu_item(menu, "Parent").build();
        let mut child = test_menu_item(menu, "Child").build();
        child.parent_id = Some(parent.id);
        let child_id = child.id;
        let store = MemoryMenuItemStore::with_items(vec![parent.clone(), child]);

        assert!(store.delete(parent.id).await.unwrap());
        assert!(!store.delete(parent.id).await.unwrap());
        assert_eq!(store.get(child_id).unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn static_permissions_lookup() {
        let user = test_principal("editor");
        let source = StaticPermissions::new().with_user(&user, &[Permission::EditMenuItems]);

        assert_eq!(source.principal(user.id).await.unwrap(), Some(user.clone()));
        assert!(source.principal(Uuid::now_v7()).await.unwrap().is_none());
        let perms = source.permissions(&user).await.unwrap();
        assert!(perms.contains("edit menu items"));
    }

    #[tokio::test]
    async fn fixed_projection_renders_cells() {
        let projection = FixedProjection::new(
            &["id_item", "title"],
            vec![serde_json::json!({"id_item": 1, "title": null})],
        );
        let rows = projection.fetch("id_item", "title").await.unwrap();
        assert_eq!(rows, vec![OptionPair::new("1", "")]);
    }
}
