//! Dependent option resolution for the menu item form.
//!
//! The form's dropdowns form a cascade: menu type and module select the
//! available route types, a route type selects routes, and a `model` route
//! selects rows of a registered entity. Each stage receives the full prefix
//! of earlier choices; an incomplete prefix resolves to no options.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::descriptor::RouteKind;
use super::error::ResolveError;
use super::projection::ProjectionRegistry;
use super::registry::ModuleRegistry;
use crate::models::{MenuRoute, MenuRouteStore};

/// One selectable option of a dependent dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPair {
    pub id: String,
    pub name: String,
}

impl OptionPair {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<MenuRoute> for OptionPair {
    fn from(route: MenuRoute) -> Self {
        Self::new(route.id.to_string(), route.title)
    }
}

/// Partial selection posted by the form: `[menu_type, module, route_type, route]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChain {
    values: Vec<Option<String>>,
}

impl SelectionChain {
    /// Create a chain from positional values. `None` marks a gap.
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Value at `index`, or `None` when missing or empty.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values
            .get(index)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Values at `indexes`, only if every one of them is present.
    pub fn require<const N: usize>(&self, indexes: [usize; N]) -> Option<[&str; N]> {
        let mut out = [""; N];
        for (slot, index) in out.iter_mut().zip(indexes) {
            *slot = self.get(index)?;
        }
        Some(out)
    }

    /// Number of positions posted (including gaps).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing was posted.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionChain {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|s| Some(s.into())).collect())
    }
}

/// Which menu routes the route list stage returns.
///
/// `All` keeps the established behavior of listing every persisted route
/// whatever module was chosen. `Module` restricts the list to the chosen
/// module and is off until product confirms the intended behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteListScope {
    #[default]
    All,
    Module,
}

impl FromStr for RouteListScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "module" => Ok(Self::Module),
            other => Err(format!("unknown route list scope '{other}'")),
        }
    }
}

/// Resolves the next stage of the menu item form's dependent dropdowns.
#[derive(Clone)]
pub struct DependentOptionsResolver {
    modules: Arc<ModuleRegistry>,
    projections: Arc<ProjectionRegistry>,
    routes: Arc<dyn MenuRouteStore>,
    route_list_scope: RouteListScope,
}

impl DependentOptionsResolver {
    pub fn new(
        modules: Arc<ModuleRegistry>,
        projections: Arc<ProjectionRegistry>,
        routes: Arc<dyn MenuRouteStore>,
        route_list_scope: RouteListScope,
    ) -> Self {
        Self {
            modules,
            projections,
            routes,
            route_list_scope,
        }
    }

    /// Route kinds a module offers for a menu type, without duplicates.
    pub fn route_types(
        &self,
        menu_type: &str,
        module: &str,
    ) -> Result<Vec<OptionPair>, ResolveError> {
        if menu_type.is_empty() || module.is_empty() {
            return Ok(Vec::new());
        }

        let mut out: Vec<OptionPair> = Vec::new();
        for item in self.modules.descriptors(module)? {
            if item.menu != menu_type {
                continue;
            }
            let pair = OptionPair::new(&item.kind, &item.kind);
            if !out.contains(&pair) {
                out.push(pair);
            }
        }

        debug!(module, menu_type, options = out.len(), "resolved route types");
        Ok(out)
    }

    /// Routes of one kind a module offers for a menu type.
    ///
    /// Duplicates are kept. For `widget` descriptors the option id is the
    /// descriptor's label and the name is its name.
    pub fn routes(
        &self,
        menu_type: &str,
        module: &str,
        route_type: &str,
    ) -> Result<Vec<OptionPair>, ResolveError> {
        if menu_type.is_empty() || module.is_empty() || route_type.is_empty() {
            return Ok(Vec::new());
        }

        let kind = RouteKind::parse(route_type);
        let mut out = Vec::new();
        for item in self.modules.descriptors(module)? {
            if item.kind != route_type || item.menu != menu_type {
                continue;
            }
            match kind {
                Some(RouteKind::Widget) => out.push(OptionPair::new(
                    item.label.clone().unwrap_or_default(),
                    item.name.clone().unwrap_or_default(),
                )),
                Some(RouteKind::Model) => out.push(OptionPair::new(
                    item.route.clone().unwrap_or_default(),
                    item.class.clone().unwrap_or_default(),
                )),
                Some(RouteKind::Action) => {
                    let route = item.route.clone().unwrap_or_default();
                    out.push(OptionPair::new(route.clone(), route));
                }
                Some(RouteKind::Route) => {
                    if let Some(routes) = &item.routes {
                        out.extend(routes.iter().map(|(key, title)| OptionPair::new(key, title)));
                    }
                }
                None => {}
            }
        }

        debug!(module, menu_type, route_type, options = out.len(), "resolved routes");
        Ok(out)
    }

    /// Rows of the entity bound to a `model` route.
    ///
    /// The matching descriptor is chosen by kind and route only; if several
    /// match, the last one declared wins.
    pub async fn model_options(
        &self,
        menu_type: &str,
        module: &str,
        route_type: &str,
        route: &str,
    ) -> Result<Vec<OptionPair>, ResolveError> {
        if menu_type.is_empty() || module.is_empty() || route_type.is_empty() || route.is_empty()
        {
            return Ok(Vec::new());
        }

        let Some(item) = self
            .modules
            .descriptors(module)?
            .iter()
            .rev()
            .find(|item| item.kind == route_type && item.route.as_deref() == Some(route))
        else {
            return Ok(Vec::new());
        };

        let class = item.class.as_deref().unwrap_or_default();
        if class.is_empty() {
            return Ok(Vec::new());
        }
        let Some(field) = &item.field else {
            debug!(module, route, class, "model descriptor has no field mapping");
            return Ok(Vec::new());
        };

        self.projections
            .query_projected(class, &field.id, &field.name)
            .await
    }

    /// Persisted menu routes offered for linking.
    pub async fn route_list(
        &self,
        module: &str,
        route_type: &str,
    ) -> Result<Vec<OptionPair>, ResolveError> {
        if module.is_empty() || route_type.is_empty() {
            return Ok(Vec::new());
        }

        let routes = match self.route_list_scope {
            RouteListScope::All => self.routes.list_all().await?,
            RouteListScope::Module => self.routes.list_by_module(module).await?,
        };

        Ok(routes.into_iter().map(OptionPair::from).collect())
    }
}
