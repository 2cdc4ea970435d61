//! Database models.

pub mod menu_item;
pub mod menu_route;
pub mod role;
pub mod user;

pub use menu_item::{CreateMenuItem, MenuItem, MenuItemStore, PgMenuItemStore, UpdateMenuItem};
pub use menu_route::{MenuRoute, MenuRouteStore, PgMenuRouteStore};
pub use user::User;
