//! Menu system: module catalogs and dependent option lookups.
//!
//! Modules declare the routable targets a menu item can point at. The menu
//! item form walks those declarations one dropdown at a time:
//! - route types offered by a module for a menu type
//! - routes of the chosen type
//! - entity rows bound to a `model` route
//! - persisted menu routes

mod descriptor;
mod error;
mod projection;
mod registry;
mod resolver;

pub use descriptor::{EntityDeclaration, FieldMapping, MenuItemDescriptor, ModuleCatalog, RouteKind};
pub use error::ResolveError;
pub use projection::{ProjectedQuery, ProjectionRegistry, TableProjection};
pub use registry::{MENU_MODULE, ModuleRegistry};
pub use resolver::{DependentOptionsResolver, OptionPair, RouteListScope, SelectionChain};
