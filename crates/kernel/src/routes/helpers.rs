//! Shared route helpers for menu item handlers.

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::menu::SelectionChain;
use crate::models::MenuItem;
use crate::permissions::{Permission, Principal};
use crate::state::AppState;

/// Posted field carrying the dependent dropdown selection chain.
pub const DEPDROP_PARENTS: &str = "depdrop_parents";

/// Highest accepted `depdrop_parents[N]` index, exclusive.
pub const MAX_DEPDROP_INDEX: usize = 16;

/// Require a logged-in principal.
pub fn require_principal(principal: Option<Principal>) -> AppResult<Principal> {
    principal.ok_or(AppError::Unauthorized)
}

/// Require that `principal` may perform `permission`, optionally on `target`.
pub async fn require_permission(
    state: &AppState,
    principal: &Principal,
    permission: Permission,
    target: Option<&MenuItem>,
) -> AppResult<()> {
    if state.gate().allows(principal, permission, target).await? {
        return Ok(());
    }

    debug!(user_id = %principal.id, %permission, "permission denied");
    Err(AppError::Forbidden)
}

/// Check whether the request was made by client-side script.
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("X-Requested-With")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Parse the selection chain from a url-encoded dependent dropdown post.
///
/// Accepts `depdrop_parents[]=a&depdrop_parents[]=b`, indexed
/// `depdrop_parents[0]=a&depdrop_parents[1]=b`, and repeated
/// `depdrop_parents=a&depdrop_parents=b`. Gaps in indexed posts become
/// absent positions. A post without the field at all, or with an index at
/// or above [`MAX_DEPDROP_INDEX`], is a bad request.
pub fn parse_depdrop_parents(body: &[u8]) -> AppResult<SelectionChain> {
    let mut appended: Vec<String> = Vec::new();
    let mut indexed: BTreeMap<usize, String> = BTreeMap::new();
    let mut seen = false;

    for (key, value) in url::form_urlencoded::parse(body) {
        let Some(rest) = key.strip_prefix(DEPDROP_PARENTS) else {
            continue;
        };
        match rest {
            "" | "[]" => appended.push(value.into_owned()),
            _ => {
                let Some(index) = rest
                    .strip_prefix('[')
                    .and_then(|r| r.strip_suffix(']'))
                    .and_then(|i| i.parse::<usize>().ok())
                else {
                    continue;
                };
                if index >= MAX_DEPDROP_INDEX {
                    return Err(AppError::BadRequest(format!(
                        "{DEPDROP_PARENTS} index {index} out of range"
                    )));
                }
                indexed.insert(index, value.into_owned());
            }
        }
        seen = true;
    }

    if !seen {
        return Err(AppError::BadRequest(format!(
            "missing {DEPDROP_PARENTS} field"
        )));
    }

    if indexed.is_empty() {
        return Ok(appended.into_iter().collect());
    }

    let len = indexed
        .keys()
        .next_back()
        .and_then(|max| max.checked_add(1))
        .unwrap_or(0);
    let mut values: Vec<Option<String>> = vec![None; len];
    for (index, value) in indexed {
        values[index] = Some(value);
    }
    values.extend(appended.into_iter().map(Some));
    Ok(SelectionChain::new(values))
}
