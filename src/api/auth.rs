use axum::{Extension, Json, extract::State};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::{info, warn};

use super::access::SessionUser;
use super::{ApiError, ApiResponse, AppState, LoginRequest, LoginResponse, MessageResponse};
use crate::models::AccountView;
use crate::services::{AccountError, AuthFailure};

pub(crate) fn record_attempt(kind: &'static str, outcome: &'static str) {
    metrics::counter!("auth_attempts_total", "kind" => kind, "outcome" => outcome).increment(1);
}

const fn failure_outcome(failure: AuthFailure) -> &'static str {
    match failure {
        AuthFailure::InvalidCredentials => "invalid_credentials",
        AuthFailure::Deactivated => "deactivated",
        AuthFailure::Expired => "expired",
    }
}

/// POST /api/login
/// Checks the credentials and issues the `site_auth` cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let session = match state
        .accounts()
        .validate(&payload.username, &payload.password)
        .await
    {
        Ok(session) => session,
        Err(AccountError::Auth(failure)) => {
            record_attempt("user", failure_outcome(failure));
            warn!(
                username = %payload.username.trim().to_lowercase(),
                reason = %failure,
                "Login rejected"
            );
            return Err(AccountError::Auth(failure).into());
        }
        Err(err) => {
            record_attempt("user", "error");
            return Err(err.into());
        }
    };

    // At the exact expiry instant the cookie would carry Max-Age=0.
    if session.remaining_ms <= 0 {
        record_attempt("user", failure_outcome(AuthFailure::Expired));
        warn!(username = %session.username, "Login rejected at expiry instant");
        return Err(AccountError::Auth(AuthFailure::Expired).into());
    }

    record_attempt("user", "success");
    info!(username = %session.username, "User logged in");

    let cookie = state.sessions.issue(&session.username, session.remaining_ms);

    Ok((
        jar.add(cookie),
        Json(ApiResponse::success(LoginResponse {
            username: session.username,
            expires_at: session.expires_at,
            remaining_ms: session.remaining_ms,
        })),
    ))
}

/// POST /api/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    (
        jar.remove(state.sessions.clear()),
        Json(ApiResponse::success(MessageResponse::new("Logged out"))),
    )
}

/// GET /api/session
/// The account behind the caller's session cookie.
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    Extension(SessionUser(username)): Extension<SessionUser>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let view = state
        .accounts()
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Session no longer matches an account"))?;

    Ok(Json(ApiResponse::success(view)))
}
