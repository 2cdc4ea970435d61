//! Module registry - collects the menu item catalogs declared by modules.
//!
//! Catalogs come from two places: the built-in catalog of the menu module
//! itself, and catalog files (YAML or JSON) found in the configured modules
//! directory. The registry is built once at startup and only read afterwards.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::descriptor::{EntityDeclaration, FieldMapping, MenuItemDescriptor, ModuleCatalog};
use super::error::ResolveError;

/// Machine name of the menu module's own catalog.
pub const MENU_MODULE: &str = "menu";

/// Catalog files larger than this are skipped.
const MAX_CATALOG_FILE_SIZE: u64 = 1024 * 1024;

/// File extensions recognized as catalogs.
const CATALOG_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Registry of module catalogs, keyed by module name.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleCatalog>,
}

impl ModuleRegistry {
    /// Create an empty module registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding only the built-in menu module catalog.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(builtin_catalog());
        registry
    }

    /// Build a registry from catalog sources.
    ///
    /// Each element is a (source_name, text) tuple. Text is parsed as YAML,
    /// which also accepts JSON. Sources that fail to parse are logged and
    /// skipped.
    pub fn from_catalog_sources(sources: Vec<(String, String)>) -> Self {
        let mut registry = Self::new();
        registry.extend_from_sources(sources);
        registry
    }

    /// Parse and register additional catalog sources.
    pub fn extend_from_sources(&mut self, sources: Vec<(String, String)>) {
        for (source, text) in sources {
            match serde_yml::from_str::<ModuleCatalog>(&text) {
                Ok(catalog) => {
                    debug!(
                        source = %source,
                        module = %catalog.name,
                        items = catalog.items.len(),
                        "parsed module catalog"
                    );
                    self.register(catalog);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "failed to parse module catalog");
                }
            }
        }
    }

    /// Register every catalog file in `dir`.
    ///
    /// Files are read in file-name order so that replacement of duplicate
    /// module names is deterministic.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read modules directory {}", dir.display()))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| CATALOG_EXTENSIONS.contains(&ext))
            })
            .collect();
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let size = std::fs::metadata(&path)
                .with_context(|| format!("failed to stat {}", path.display()))?
                .len();
            if size > MAX_CATALOG_FILE_SIZE {
                warn!(path = %path.display(), size, "skipping oversized module catalog");
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            sources.push((path.display().to_string(), text));
        }

        let count = sources.len();
        self.extend_from_sources(sources);
        info!(
            dir = %dir.display(),
            files = count,
            modules = self.modules.len(),
            "loaded module catalogs"
        );
        Ok(count)
    }

    /// Register a module catalog, replacing any catalog with the same name.
    pub fn register(&mut self, catalog: ModuleCatalog) {
        if self.modules.contains_key(&catalog.name) {
            warn!(module = %catalog.name, "module catalog registered twice; replacing");
        }
        self.modules.insert(catalog.name.clone(), catalog);
    }

    /// Look up a module's catalog.
    pub fn get(&self, name: &str) -> Result<&ModuleCatalog, ResolveError> {
        self.modules
            .get(name)
            .ok_or_else(|| ResolveError::UnknownModule(name.to_string()))
    }

    /// Descriptors declared by a module.
    pub fn descriptors(&self, name: &str) -> Result<&[MenuItemDescriptor], ResolveError> {
        self.get(name).map(|catalog| catalog.items.as_slice())
    }

    /// Entity declarations across all modules.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDeclaration> {
        self.modules.values().flat_map(|catalog| catalog.entities.iter())
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get module count.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Catalog of the menu module itself.
fn builtin_catalog() -> ModuleCatalog {
    let mut routes = IndexMap::new();
    routes.insert("/menu/item".to_string(), "Menu Items".to_string());
    routes.insert("/menu/item/create".to_string(), "New Menu Item".to_string());

    ModuleCatalog {
        name: MENU_MODULE.to_string(),
        items: vec![
            MenuItemDescriptor {
                menu: "web".to_string(),
                kind: "model".to_string(),
                label: Some("Menu Item".to_string()),
                name: Some("menu_item".to_string()),
                route: Some("/menu/item/view".to_string()),
                class: Some("MenuItem".to_string()),
                field: Some(FieldMapping {
                    id: "id".to_string(),
                    name: "label".to_string(),
                }),
                routes: None,
            },
            MenuItemDescriptor {
                menu: "web".to_string(),
                kind: "action".to_string(),
                label: Some("Create Menu Item".to_string()),
                name: Some("menu_item_create".to_string()),
                route: Some("/menu/item/create".to_string()),
                class: None,
                field: None,
                routes: None,
            },
            MenuItemDescriptor {
                menu: "web".to_string(),
                kind: "route".to_string(),
                label: Some("Menu Pages".to_string()),
                name: Some("menu_pages".to_string()),
                route: None,
                class: None,
                field: None,
                routes: Some(routes),
            },
        ],
        entities: vec![
            EntityDeclaration {
                class: "MenuItem".to_string(),
                table: "menu_item".to_string(),
                columns: ["id", "label", "slug", "module", "route"]
                    .map(String::from)
                    .to_vec(),
            },
            EntityDeclaration {
                class: "MenuRoute".to_string(),
                table: "menu_route".to_string(),
                columns: ["id", "title", "module", "route"]
                    .map(String::from)
                    .to_vec(),
            },
        ],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn registry_from_json() {
        let json = r#"{
            "name": "blog",
            "items": [
                {"menu": "web", "type": "action", "route": "/blog/post/index"},
                {"menu": "web", "type": "widget", "label": "recent", "name": "Recent Posts"}
            ]
        }"#;

        let registry =
            ModuleRegistry::from_catalog_sources(vec![("blog.json".to_string(), json.to_string())]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors("blog").unwrap().len(), 2);
    }

    #[test]
    fn registry_from_yaml() {
        let yaml = r#"
name: catalog
items:
  - menu: main
    type: model
    route: /items
    class: Item
    field:
      id: id_item
      name: title
entities:
  - class: Item
    table: catalog_item
    columns: [id_item, title]
"#;

        let registry =
            ModuleRegistry::from_catalog_sources(vec![("catalog.yml".to_string(), yaml.to_string())]);

        let items = registry.descriptors("catalog").unwrap();
        assert_eq!(items[0].class.as_deref(), Some("Item"));
        assert_eq!(items[0].field.as_ref().unwrap().id, "id_item");
        assert_eq!(registry.entities().count(), 1);
    }

    #[test]
    fn malformed_source_is_skipped() {
        let registry = ModuleRegistry::from_catalog_sources(vec![
            ("bad.yml".to_string(), "items: [".to_string()),
            ("good.yml".to_string(), "name: good".to_string()),
        ]);

        assert_eq!(registry.names(), vec!["good"]);
    }

    #[test]
    fn unknown_module_is_an_error() {
        let registry = ModuleRegistry::with_builtin();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownModule(name) if name == "nope"));
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = ModuleRegistry::new();
        registry.extend_from_sources(vec![
            ("a.yml".to_string(), "name: shop\nitems: []".to_string()),
            (
                "b.yml".to_string(),
                "name: shop\nitems:\n  - {menu: web, type: action, route: /shop}".to_string(),
            ),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors("shop").unwrap().len(), 1);
    }

    #[test]
    fn load_dir_filters_orders_and_skips_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, text: &str| std::fs::write(dir.path().join(name), text).unwrap();

        // Same module in two files: the later file name wins
        write("a_shop.yml", "name: shop\nitems: []");
        write(
            "b_shop.json",
            r#"{"name": "shop", "items": [{"menu": "web", "type": "action", "route": "/shop"}]}"#,
        );
        write("blog.yaml", "name: blog");
        write("notes.txt", "name: notes");
        write("huge.yml", &format!("name: huge\n#{}", "x".repeat(1024 * 1024)));
        std::fs::create_dir(dir.path().join("nested.yml")).unwrap();

        let mut registry = ModuleRegistry::new();
        let count = registry.load_dir(dir.path()).unwrap();

        assert_eq!(count, 3);
        assert_eq!(registry.names(), vec!["blog", "shop"]);
        assert_eq!(registry.descriptors("shop").unwrap().len(), 1);
    }

    #[test]
    fn load_dir_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ModuleRegistry::new();
        assert!(registry.load_dir(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn builtin_catalog_is_registered() {
        let registry = ModuleRegistry::with_builtin();
        assert!(registry.get(MENU_MODULE).is_ok());
        assert!(registry.entities().any(|e| e.class == "MenuItem"));
    }
}
