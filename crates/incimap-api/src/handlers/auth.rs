//! Auth handlers: login, refresh, logout, me.

use axum::Json;
use axum::extract::State;
use tracing::info;
use validator::Validate;

use incimap_auth::session::UNAUTHORIZED;
use incimap_core::error::AppError;

use crate::dto::request::{LoginRequest, LogoutRequest, RefreshRequest};
use crate::dto::response::{
    ApiResponse, LoginResponse, MessageResponse, SubjectResponse, TokenResponse,
};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let subject = state
        .directory
        .authenticate(&req.email, &req.password)
        .await?
        .ok_or_else(|| AppError::authentication(UNAUTHORIZED))?;

    let tokens = state.issuer.issue_pair(&subject)?;
    info!(subject = %subject.id, "Login succeeded");

    Ok(Json(ApiResponse::ok(LoginResponse {
        tokens: tokens.into(),
        user: subject.into(),
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let tokens = state.issuer.refresh(&req.refresh_token)?;
    Ok(Json(ApiResponse::ok(tokens.into())))
}

/// POST /api/auth/logout
///
/// Any token within the length bound is revoked, valid or not.
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    state.issuer.invalidate(&req.refresh_token);

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<SubjectResponse>> {
    Json(ApiResponse::ok(auth.0.into()))
}
