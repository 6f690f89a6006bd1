use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::StoreBackend;
use crate::database::manager::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub name: String,
    pub updated_at: String,
    pub timezone: String,
}

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": state.info.name,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant personal finance ledger API",
            "endpoints": {
                "public": "/health, /version, /auth/login",
                "auth": "/api/auth/whoami, /api/auth/session (protected)",
                "transactions": "/api/transactions, /api/transactions/find (protected)",
                "metrics": "/api/metrics (protected)",
                "filters": "/api/filters (protected)",
            }
        }
    }))
}

/// GET /version
pub async fn version(State(state): State<AppState>) -> ApiResult<VersionInfo> {
    Ok(ApiResponse::success(VersionInfo {
        name: state.info.name.clone(),
        updated_at: state.info.updated_at.clone(),
        timezone: state.info.timezone.clone(),
    }))
}

/// GET /health - reports database reachability on the Postgres backend
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    if state.backend == StoreBackend::Memory {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "store": "memory" }
            })),
        );
    }

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "store": "postgres" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
