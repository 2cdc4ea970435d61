//! Session principal middleware.
//!
//! Resolves the session's user ID into a [`Principal`] request extension.
//! Requests without a session, or whose user is unknown or blocked, pass
//! through anonymously; handlers decide whether that is acceptable.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::permissions::Principal;
use crate::session::SESSION_USER_ID;
use crate::state::AppState;

/// Middleware to attach the logged-in principal to the request.
///
/// A principal already present in the extensions is left untouched.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.extensions().get::<Principal>().is_some() {
        return next.run(request).await;
    }

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return next.run(request).await;
    };

    let user_id: Option<Uuid> = match session.get(SESSION_USER_ID).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "failed to read session");
            None
        }
    };

    if let Some(user_id) = user_id {
        match state.gate().principal(user_id).await {
            Ok(Some(principal)) => {
                request.extensions_mut().insert(principal);
            }
            Ok(None) => {
                debug!(%user_id, "session user is missing or inactive");
            }
            Err(e) => {
                warn!(error = %e, %user_id, "failed to resolve session principal");
            }
        }
    }

    next.run(request).await
}
