#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] drives the REAL kernel router and handlers. Only the storage
//! and permission backends are swapped for in-memory doubles, so tests run
//! without PostgreSQL or Redis. A principal is attached to each request the
//! same way the session middleware would.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Extension;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use navkit_kernel::AppState;
use navkit_kernel::menu::{
    DependentOptionsResolver, ModuleRegistry, ProjectionRegistry, RouteListScope,
};
use navkit_kernel::models::{MenuItem, MenuRoute};
use navkit_kernel::permissions::{AuthorizationGate, Permission, Principal};
use navkit_test_utils::{
    FixedProjection, MemoryMenuItemStore, MemoryMenuRouteStore, StaticPermissions,
    test_principal,
};

/// Module catalogs registered for every test app.
pub const CATALOGS: &[(&str, &str)] = &[
    (
        "catalog.yml",
        r#"
name: catalog
items:
  - menu: main
    type: model
    route: /items
    class: Item
    field: {id: id_item, name: title}
"#,
    ),
    (
        "shop.yml",
        r#"
name: shop
items:
  - {menu: main, type: widget, label: cart-summary, name: Cart Summary}
  - {menu: main, type: action, route: /shop/checkout}
  - {menu: main, type: action, route: /shop/checkout}
  - {menu: main, type: route, routes: {a: Alpha, b: Beta}}
  - {menu: main, type: model, route: /ghosts, class: Ghost, field: {id: id, name: name}}
  - {menu: main, type: model, route: /secrets, class: Item, field: {id: id_item, name: password}}
  - {menu: mobile, type: action, route: /m/shop}
"#,
    ),
];

/// Permissions needed to use every lookup endpoint.
pub const LOOKUPS: &[Permission] = &[
    Permission::LookupRouteTypes,
    Permission::LookupRoutes,
    Permission::LookupModels,
];

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    pub state: AppState,
    pub items: Arc<MemoryMenuItemStore>,
    pub permissions: Arc<StaticPermissions>,
}

impl TestApp {
    /// Create a test application with no items and no menu routes.
    pub fn new() -> Self {
        Self::with_data(Vec::new(), Vec::new(), RouteListScope::All)
    }

    /// Create a test application seeded with menu items.
    pub fn with_items(items: Vec<MenuItem>) -> Self {
        Self::with_data(items, Vec::new(), RouteListScope::All)
    }

    /// Create a test application seeded with items, menu routes, and a
    /// route list scope.
    pub fn with_data(items: Vec<MenuItem>, routes: Vec<MenuRoute>, scope: RouteListScope) -> Self {
        let mut modules = ModuleRegistry::with_builtin();
        modules.extend_from_sources(
            CATALOGS
                .iter()
                .map(|(source, text)| (source.to_string(), text.to_string()))
                .collect(),
        );
        let modules = Arc::new(modules);

        let mut projections = ProjectionRegistry::new();
        projections.register(
            "Item",
            Arc::new(FixedProjection::new(
                &["id_item", "title"],
                vec![
                    serde_json::json!({"id_item": 1, "title": "Widget"}),
                    serde_json::json!({"id_item": 2, "title": null}),
                ],
            )),
        );

        let resolver = DependentOptionsResolver::new(
            modules.clone(),
            Arc::new(projections),
            Arc::new(MemoryMenuRouteStore::new(routes)),
            scope,
        );

        let permissions = StaticPermissions::new().shared();
        let gate = AuthorizationGate::new(permissions.clone());
        let items = Arc::new(MemoryMenuItemStore::with_items(items));
        let state = AppState::from_parts(items.clone(), modules, resolver, gate);

        Self {
            state,
            items,
            permissions,
        }
    }

    /// Register a user holding `permissions`.
    pub fn user(&self, name: &str, permissions: &[Permission]) -> Principal {
        let principal = test_principal(name);
        self.permissions.grant(&principal, permissions);
        principal
    }

    /// Send a request, optionally as a logged-in principal.
    pub async fn request(&self, principal: Option<&Principal>, request: Request<Body>) -> Response {
        let mut router = navkit_kernel::routes::app(self.state.clone());
        if let Some(principal) = principal {
            router = router.layer(Extension(principal.clone()));
        }
        router.oneshot(request).await.expect("Failed to send request")
    }

    /// GET `uri`.
    pub async fn get(&self, principal: Option<&Principal>, uri: &str) -> Response {
        self.request(principal, Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST url-encoded `fields` to `uri`.
    pub async fn post_form(
        &self,
        principal: Option<&Principal>,
        uri: &str,
        fields: &[(&str, &str)],
    ) -> Response {
        self.request(principal, form_request(uri, fields)).await
    }

    /// POST a dependent dropdown chain as `depdrop_parents[]` values.
    pub async fn depdrop(
        &self,
        principal: Option<&Principal>,
        uri: &str,
        parents: &[&str],
    ) -> Response {
        let fields: Vec<(&str, &str)> = parents.iter().map(|p| ("depdrop_parents[]", *p)).collect();
        self.post_form(principal, uri, &fields).await
    }
}

/// Build a url-encoded POST request.
pub fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

/// Read the redirect target of a response.
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("response has no Location header")
}

/// A fresh menu ID.
pub fn menu_id() -> Uuid {
    Uuid::now_v7()
}
