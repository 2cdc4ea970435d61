//! Menu item administration and dependent dropdown lookups.
//!
//! CRUD handlers return JSON view-models or redirects. The four lookup
//! endpoints answer the admin form's dependent dropdowns with
//! `{"output": [...], "selected": ""}`.

use std::collections::HashSet;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::form::{MenuItemForm, MenuItemFormView, ValidMenuItem, ValidationError};
use crate::menu::OptionPair;
use crate::models::MenuItem;
use crate::permissions::{Permission, Principal};
use crate::state::AppState;

use super::helpers::{is_ajax, parse_depdrop_parents, require_permission, require_principal};

/// Items per page on the list endpoint.
const PER_PAGE: i64 = 50;

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct IndexQuery {
    id_menu: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct MenuQuery {
    id_menu: Uuid,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    id_menu: Uuid,
    page: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    id_menu: Uuid,
    id_item: Option<Uuid>,
}

/// Payload consumed by the dependent dropdown widget.
#[derive(Debug, Serialize)]
struct DepDropResponse {
    output: Vec<OptionPair>,
    selected: String,
}

impl DepDropResponse {
    fn new(output: Vec<OptionPair>) -> Json<Self> {
        Json(Self {
            output,
            selected: String::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ItemPage {
    items: Vec<MenuItem>,
    total: i64,
    page: i64,
    total_pages: i64,
}

#[derive(Debug, Serialize)]
struct ItemView {
    model: MenuItem,
}

#[derive(Debug, Serialize)]
struct Saved {
    status: &'static str,
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct Deleted {
    status: &'static str,
}

fn index_url(menu_id: Uuid) -> String {
    format!("/menu/item?id_menu={menu_id}")
}

fn module_names(state: &AppState) -> Vec<String> {
    state
        .modules()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn validation_failed(view: MenuItemFormView) -> AppError {
    match serde_json::to_value(&view) {
        Ok(body) => AppError::Validation(body),
        Err(e) => AppError::Internal(e.into()),
    }
}

/// Validate a submission, including the parent reference.
///
/// `item_id` is the item being edited, if any. Its parent must exist and
/// must not be the item itself or one of its descendants.
async fn validate_submission(
    state: &AppState,
    form: &MenuItemForm,
    item_id: Option<Uuid>,
) -> AppResult<Result<ValidMenuItem, Vec<ValidationError>>> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(Err(errors)),
    };
    let Some(parent_id) = valid.parent_id else {
        return Ok(Ok(valid));
    };

    let mut seen = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(ancestor_id) = cursor {
        if Some(ancestor_id) == item_id {
            return Ok(Err(vec![ValidationError::field(
                "parent_id",
                "An item cannot be nested under itself.",
            )]));
        }
        if !seen.insert(ancestor_id) {
            break;
        }
        cursor = match state.items().find_by_id(ancestor_id).await? {
            Some(ancestor) => ancestor.parent_id,
            None if ancestor_id == parent_id => {
                return Ok(Err(vec![ValidationError::field(
                    "parent_id",
                    "Parent item does not exist.",
                )]));
            }
            None => None,
        };
    }

    Ok(Ok(valid))
}

/// Load an item or fail with 404.
async fn load_item(state: &AppState, id: Uuid) -> AppResult<MenuItem> {
    state.items().find_by_id(id).await?.ok_or(AppError::NotFound)
}

// =============================================================================
// Dependent dropdown lookups
// =============================================================================

/// Route types for `[menu_type, module]`.
///
/// POST /menu/item/route-type
async fn lookup_route_types(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    body: Bytes,
) -> AppResult<Json<DepDropResponse>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    require_permission(&state, &principal, Permission::LookupRouteTypes, None).await?;

    let chain = parse_depdrop_parents(&body)?;
    let output = match chain.require([0, 1]) {
        Some([menu_type, module]) => state.resolver().route_types(menu_type, module)?,
        None => Vec::new(),
    };

    Ok(DepDropResponse::new(output))
}

/// Routes for `[menu_type, module, route_type]`.
///
/// POST /menu/item/route
async fn lookup_routes(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    body: Bytes,
) -> AppResult<Json<DepDropResponse>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    require_permission(&state, &principal, Permission::LookupRoutes, None).await?;

    let chain = parse_depdrop_parents(&body)?;
    let output = match chain.require([0, 1, 2]) {
        Some([menu_type, module, route_type]) => {
            state.resolver().routes(menu_type, module, route_type)?
        }
        None => Vec::new(),
    };

    Ok(DepDropResponse::new(output))
}

/// Model rows for `[menu_type, module, route_type, route]`.
///
/// POST /menu/item/model
async fn lookup_models(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    body: Bytes,
) -> AppResult<Json<DepDropResponse>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    require_permission(&state, &principal, Permission::LookupModels, None).await?;

    let chain = parse_depdrop_parents(&body)?;
    let output = match chain.require([0, 1, 2, 3]) {
        Some([menu_type, module, route_type, route]) => {
            state
                .resolver()
                .model_options(menu_type, module, route_type, route)
                .await?
        }
        None => Vec::new(),
    };

    Ok(DepDropResponse::new(output))
}

/// Persisted menu routes. Any logged-in user may look these up.
///
/// POST /menu/item/route-list
async fn lookup_route_list(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    body: Bytes,
) -> AppResult<Json<DepDropResponse>> {
    require_principal(principal.map(|Extension(p)| p))?;

    let chain = parse_depdrop_parents(&body)?;
    let output = match chain.require([1, 2]) {
        Some([module, route_type]) => state.resolver().route_list(module, route_type).await?,
        None => Vec::new(),
    };

    Ok(DepDropResponse::new(output))
}

// =============================================================================
// CRUD
// =============================================================================

/// Menu item index. Items are managed from the create screen.
///
/// GET /menu/item?id_menu=
async fn index(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Query(query): Query<IndexQuery>,
) -> AppResult<Response> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    let allowed = state
        .gate()
        .allows_any(
            &principal,
            &[Permission::ViewMenuItems, Permission::ViewOwnMenuItems],
        )
        .await?;
    if !allowed {
        return Err(AppError::Forbidden);
    }

    let target = match query.id_menu {
        Some(menu_id) => format!("/menu/item/create?id_menu={menu_id}"),
        None => "/menu/item/create".to_string(),
    };
    Ok(Redirect::to(&target).into_response())
}

/// Paginated items of a menu. Principals with only the own-items
/// permission see just the items they created.
///
/// GET /menu/item/list?id_menu=&page=
async fn list(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ItemPage>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    let gate = state.gate();

    let owner = if gate
        .allows(&principal, Permission::ViewMenuItems, None)
        .await?
    {
        None
    } else if gate
        .allows(&principal, Permission::ViewOwnMenuItems, None)
        .await?
    {
        Some(principal.id)
    } else {
        return Err(AppError::Forbidden);
    };

    let page = query.page.unwrap_or(1).max(1);
    let offset = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(PER_PAGE))
        .ok_or_else(|| AppError::BadRequest(format!("page {page} out of range")))?;

    let items = state
        .items()
        .list_by_menu(query.id_menu, owner, PER_PAGE, offset)
        .await?;
    let total = state.items().count_by_menu(query.id_menu, owner).await?;
    let total_pages = (total + PER_PAGE - 1) / PER_PAGE;

    Ok(Json(ItemPage {
        items,
        total,
        page,
        total_pages,
    }))
}

/// Single item.
///
/// GET /menu/item/{id}
async fn view(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemView>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    let model = load_item(&state, id).await?;
    require_permission(&state, &principal, Permission::ViewMenuItem, Some(&model)).await?;

    Ok(Json(ItemView { model }))
}

/// Blank create form.
///
/// GET /menu/item/create?id_menu=
async fn create_form(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<MenuItemFormView>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    require_permission(&state, &principal, Permission::CreateMenuItems, None).await?;

    Ok(Json(MenuItemFormView::new(
        format!("/menu/item/create?id_menu={}", query.id_menu),
        query.id_menu,
        None,
        MenuItemForm::blank(),
        module_names(&state),
    )))
}

/// Create submit. When `id_item` names an existing item, that item is
/// updated instead.
///
/// POST /menu/item/create?id_menu=&id_item=
async fn create_submit(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Query(query): Query<CreateQuery>,
    Form(form): Form<MenuItemForm>,
) -> AppResult<Json<Saved>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    require_permission(&state, &principal, Permission::CreateMenuItems, None).await?;

    let existing = match query.id_item {
        Some(id) => state.items().find_by_id(id).await?,
        None => None,
    };

    let item_id = existing.as_ref().map(|item| item.id);
    let valid = match validate_submission(&state, &form, item_id).await? {
        Ok(valid) => valid,
        Err(errors) => {
            let view = MenuItemFormView::new(
                format!("/menu/item/create?id_menu={}", query.id_menu),
                query.id_menu,
                item_id,
                form,
                module_names(&state),
            );
            return Err(validation_failed(view.with_errors(errors)));
        }
    };

    let id = match existing {
        Some(item) => {
            // The item moves to the menu it was submitted from
            let mut update = valid.into_update();
            update.menu_id = Some(query.id_menu);
            let updated = state
                .items()
                .update(item.id, update)
                .await?
                .ok_or(AppError::NotFound)?;
            info!(item_id = %updated.id, user_id = %principal.id, "menu item updated via create");
            updated.id
        }
        None => {
            let created = state
                .items()
                .create(valid.into_create(query.id_menu, principal.id))
                .await?;
            info!(item_id = %created.id, menu_id = %created.menu_id, user_id = %principal.id, "menu item created");
            created.id
        }
    };

    Ok(Json(Saved {
        status: "success",
        id,
    }))
}

/// Edit form for an existing item.
///
/// GET /menu/item/{id}/update
async fn update_form(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MenuItemFormView>> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    let item = load_item(&state, id).await?;
    require_permission(&state, &principal, Permission::EditMenuItems, Some(&item)).await?;

    Ok(Json(MenuItemFormView::new(
        format!("/menu/item/{id}/update"),
        item.menu_id,
        Some(item.id),
        MenuItemForm::from_item(&item),
        module_names(&state),
    )))
}

/// Edit submit.
///
/// POST /menu/item/{id}/update
async fn update_submit(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(id): Path<Uuid>,
    Form(form): Form<MenuItemForm>,
) -> AppResult<Response> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    let item = load_item(&state, id).await?;
    require_permission(&state, &principal, Permission::EditMenuItems, Some(&item)).await?;

    let valid = match validate_submission(&state, &form, Some(item.id)).await? {
        Ok(valid) => valid,
        Err(errors) => {
            let view = MenuItemFormView::new(
                format!("/menu/item/{id}/update"),
                item.menu_id,
                Some(item.id),
                form,
                module_names(&state),
            );
            return Err(validation_failed(view.with_errors(errors)));
        }
    };

    let updated = state
        .items()
        .update(id, valid.into_update())
        .await?
        .ok_or(AppError::NotFound)?;
    info!(item_id = %updated.id, user_id = %principal.id, "menu item updated");

    Ok(Redirect::to(&index_url(updated.menu_id)).into_response())
}

/// Delete an item. Script callers get a JSON marker, browsers a redirect.
///
/// POST /menu/item/{id}/delete
async fn delete(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let principal = require_principal(principal.map(|Extension(p)| p))?;
    let item = load_item(&state, id).await?;
    require_permission(&state, &principal, Permission::DeleteMenuItems, Some(&item)).await?;

    if !state.items().delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(item_id = %id, user_id = %principal.id, "menu item deleted");

    if is_ajax(&headers) {
        return Ok(Json(Deleted { status: "success" }).into_response());
    }
    Ok(Redirect::to(&index_url(item.menu_id)).into_response())
}

/// Create the menu item router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu/item", get(index))
        .route("/menu/item/list", get(list))
        .route("/menu/item/create", get(create_form).post(create_submit))
        .route("/menu/item/route-type", post(lookup_route_types))
        .route("/menu/item/route", post(lookup_routes))
        .route("/menu/item/model", post(lookup_models))
        .route("/menu/item/route-list", post(lookup_route_list))
        .route("/menu/item/{id}", get(view))
        .route("/menu/item/{id}/update", get(update_form).post(update_submit))
        .route("/menu/item/{id}/delete", post(delete))
}
