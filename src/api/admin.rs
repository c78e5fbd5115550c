//! Admin console endpoints.
//!
//! Everything except login/logout sits behind [`super::access::admin_gate`].

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::{info, warn};

use super::auth::record_attempt;
use super::{
    AdminLoginRequest, ApiError, ApiResponse, AppState, CreateAccountRequest, ExtendRequest,
    ExtendResponse, MessageResponse,
};
use crate::models::{AccountSummary, AccountView};

/// POST /admin/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<MessageResponse>>), ApiError> {
    if !state.admin.is_enabled() {
        record_attempt("admin", "disabled");
        warn!("Admin login attempted but no admin password is configured");
        return Err(ApiError::unauthorized("Admin login is disabled"));
    }

    if !state.admin.check_password(&payload.password) {
        record_attempt("admin", "invalid_credentials");
        warn!("Admin login rejected");
        return Err(ApiError::unauthorized("Invalid admin password"));
    }

    record_attempt("admin", "success");
    info!("Admin logged in");

    Ok((
        jar.add(state.admin.issue()),
        Json(ApiResponse::success(MessageResponse::new("Logged in"))),
    ))
}

/// POST /admin/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    (
        jar.remove(state.admin.clear()),
        Json(ApiResponse::success(MessageResponse::new("Logged out"))),
    )
}

/// GET /admin/api/users
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountView>>>, ApiError> {
    let accounts = state.accounts().list().await?;
    Ok(Json(ApiResponse::success(accounts)))
}

/// POST /admin/api/users
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountSummary>>), ApiError> {
    let config = &state.shared.config.accounts;
    let days = payload
        .expiration_days
        .unwrap_or(config.default_expiration_days);

    let account = state
        .accounts()
        .create(
            &payload.username,
            &payload.password,
            days,
            &config.default_created_by,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

/// GET /admin/api/users/{username}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let view = state
        .accounts()
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{username}' not found")))?;

    Ok(Json(ApiResponse::success(view)))
}

/// DELETE /admin/api/users/{username}
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.accounts().delete(&username).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "User '{username}' deleted"
    )))))
}

/// POST /admin/api/users/{username}/extend
pub async fn extend_account(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Json(payload): Json<ExtendRequest>,
) -> Result<Json<ApiResponse<ExtendResponse>>, ApiError> {
    let expires_at = state.accounts().extend(&username, payload.days).await?;

    Ok(Json(ApiResponse::success(ExtendResponse {
        username: crate::models::normalize_username(&username),
        expires_at,
    })))
}

/// POST /admin/api/users/{username}/deactivate
pub async fn deactivate_account(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.accounts().deactivate(&username).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "User '{username}' deactivated"
    )))))
}
