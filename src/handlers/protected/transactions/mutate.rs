use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::ledger::TransactionInput;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MutationResult;
use crate::session::AuthSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

/// PUT /api/transactions - insert or overwrite by identity key
///
/// Expected Input:
/// ```json
/// {
///   "date": "05/01/2024", "description": "Farmácia", "totalValue": "42,90",
///   "installment": "não", "installmentCount": 1, "kind": "saida",
///   "category": "Saúde", "subcategory": "", "paymentMethod": "Pix",
///   "notes": "", "status": true
/// }
/// ```
///
/// 409 LOCK_TIMEOUT when another change to the same ledger holds the lock.
pub async fn upsert_put(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    body: Result<Json<TransactionInput>, JsonRejection>,
) -> ApiResult<MutationResult> {
    let Json(input) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let result = state.ledger.upsert(&session.tenant_ref, &input).await?;
    Ok(ApiResponse::success(result))
}

/// DELETE /api/transactions - body `{ "key": "<date>|<description>|<value>" }`
///
/// An unknown key is not an error: the response is `{ ok: false, msg }`.
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<MutationResult> {
    let Json(req) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let result = state.ledger.delete(&session.tenant_ref, &req.key).await?;
    Ok(ApiResponse::success(result))
}
