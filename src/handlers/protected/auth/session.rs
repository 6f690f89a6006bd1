use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, SessionToken};
use crate::session::AuthSession;
use crate::state::AppState;

/// GET /api/auth/whoami - identity and tenant of the current session
///
/// ```json
/// { "success": true, "data": { "identity": "ana@example.com", "tenantRef": "tenant_3f1c..." } }
/// ```
pub async fn whoami(Extension(session): Extension<AuthSession>) -> ApiResult<AuthSession> {
    Ok(ApiResponse::success(session))
}

/// DELETE /api/auth/session - end the current session
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Value> {
    state.sessions.logout(&token).await;
    tracing::info!("Logout for {}", session.identity);
    Ok(ApiResponse::success(json!({ "ok": true })))
}
