//! Per-request access policy.
//!
//! The decision depends only on the request path and the cookies it carries:
//! public paths pass straight through, `/admin` paths skip the user gate and
//! are checked by [`admin_gate`] instead, and everything else needs a valid
//! `site_auth` cookie.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::debug;

use super::{ApiError, AppState};
use crate::constants::routes::{
    ADMIN_API_PREFIX, ADMIN_LOGIN_PAGE, ADMIN_ROOT, API_PREFIX, LOGIN_PAGE, PUBLIC_PATHS,
    PUBLIC_PREFIXES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Admin,
    Session,
}

impl RouteAccess {
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        if PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
            Self::Public
        } else if path == ADMIN_ROOT || path.starts_with("/admin/") {
            Self::Admin
        } else {
            Self::Session
        }
    }
}

/// Identity attached to requests that passed the user gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn reject(path: &str, headers: &HeaderMap, api_prefix: &str, login_page: &str) -> Response {
    if path.starts_with(api_prefix) || wants_json(headers) {
        ApiError::unauthorized("Authentication required").into_response()
    } else {
        Redirect::to(login_page).into_response()
    }
}

/// Applied to the whole router.
pub async fn site_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match RouteAccess::for_path(&path) {
        RouteAccess::Public | RouteAccess::Admin => next.run(request).await,
        RouteAccess::Session => {
            if let Some(username) = state.sessions.read(&jar) {
                tracing::Span::current().record("user_id", username.as_str());
                request.extensions_mut().insert(SessionUser(username));
                next.run(request).await
            } else {
                debug!(path = %path, "Rejected request without a valid session");
                reject(&path, request.headers(), API_PREFIX, LOGIN_PAGE)
            }
        }
    }
}

/// Applied as a `route_layer` on the admin routes that need the admin cookie.
pub async fn admin_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if state.admin.read(&jar) {
        tracing::Span::current().record("user_id", "admin");
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    debug!(path = %path, "Rejected admin request without a valid admin cookie");
    reject(&path, request.headers(), ADMIN_API_PREFIX, ADMIN_LOGIN_PAGE)
}
