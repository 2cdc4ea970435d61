//! HTTP route handlers.

pub mod health;
pub mod helpers;
pub mod menu_item;

use axum::Router;

use crate::state::AppState;

/// Every route the kernel serves, without state or layers applied.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(menu_item::router())
}

/// The full application: routes, principal resolution, and state.
///
/// Session handling is layered on by the caller so tests can supply a
/// principal directly.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::resolve_principal,
        ))
        .with_state(state)
}
