//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::menu::{DependentOptionsResolver, ModuleRegistry, ProjectionRegistry};
use crate::models::{MenuItemStore, PgMenuItemStore, PgMenuRouteStore};
use crate::permissions::{AuthorizationGate, PgPermissionSource};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Menu item persistence.
    items: Arc<dyn MenuItemStore>,

    /// Registered module catalogs.
    modules: Arc<ModuleRegistry>,

    /// Dependent dropdown lookups.
    resolver: DependentOptionsResolver,

    /// Permission checks with per-user caching.
    gate: AuthorizationGate,
}

impl AppState {
    /// Create new application state, connecting to PostgreSQL and loading
    /// module catalogs.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool).await?;
        info!("Database migrations applied");

        let mut modules = ModuleRegistry::with_builtin();
        if let Some(dir) = &config.modules_dir {
            let loaded = modules
                .load_dir(dir)
                .with_context(|| format!("failed to load module catalogs from {}", dir.display()))?;
            info!(dir = %dir.display(), loaded, "Module catalogs loaded");
        }

        let projections = ProjectionRegistry::from_declarations(&pool, modules.entities());
        info!(
            modules = modules.len(),
            projections = projections.len(),
            "Menu registries ready"
        );

        let modules = Arc::new(modules);
        let resolver = DependentOptionsResolver::new(
            modules.clone(),
            Arc::new(projections),
            Arc::new(PgMenuRouteStore::new(pool.clone())),
            config.route_list_scope,
        );
        let gate = AuthorizationGate::new(Arc::new(PgPermissionSource::new(pool.clone())));

        Ok(Self::from_parts(
            Arc::new(PgMenuItemStore::new(pool)),
            modules,
            resolver,
            gate,
        ))
    }

    /// Assemble state from already-built components.
    pub fn from_parts(
        items: Arc<dyn MenuItemStore>,
        modules: Arc<ModuleRegistry>,
        resolver: DependentOptionsResolver,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                items,
                modules,
                resolver,
                gate,
            }),
        }
    }

    /// Get the menu item store.
    pub fn items(&self) -> &dyn MenuItemStore {
        self.inner.items.as_ref()
    }

    /// Get the module registry.
    pub fn modules(&self) -> &ModuleRegistry {
        &self.inner.modules
    }

    /// Get the dependent options resolver.
    pub fn resolver(&self) -> &DependentOptionsResolver {
        &self.inner.resolver
    }

    /// Get the authorization gate.
    pub fn gate(&self) -> &AuthorizationGate {
        &self.inner.gate
    }
}
