// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::LoginResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login - Authenticate and receive a session token
///
/// Expected Input:
/// ```json
/// { "email": "ana@example.com", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": { "token": "eyJhbGciOiJIUzI1NiI...", "identity": "ana@example.com", "tenantRef": "tenant_3f1c..." }
/// }
/// ```
///
/// The first login of a licensed user provisions their transaction table.
///
/// Errors: 400 missing fields, 401 bad credentials, 403 inactive license.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResult> {
    let Json(req) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let result = state.sessions.login(&email, &password).await?;
    Ok(ApiResponse::success(result))
}
