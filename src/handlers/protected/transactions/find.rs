use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};

use crate::error::ApiError;
use crate::filter::{FilterSpec, Page};
use crate::ledger::Transaction;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::AuthSession;
use crate::state::AppState;

/// GET /api/transactions?dateFrom=..&kind=..&page=..&pageSize=..
///
/// Returns `{ total, page, pageSize, items }`, newest first. `total` counts
/// the whole filtered set; `pageSize` is capped at the configured maximum.
pub async fn list_get(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    query: Result<Query<FilterSpec>, QueryRejection>,
) -> ApiResult<Page<Transaction>> {
    let Query(spec) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = state.ledger.list_transactions(&session.tenant_ref, &spec).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/transactions/find - same as the listing, with the filter in
/// the JSON body
pub async fn find_post(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    body: Result<Json<FilterSpec>, JsonRejection>,
) -> ApiResult<Page<Transaction>> {
    let Json(spec) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let page = state.ledger.list_transactions(&session.tenant_ref, &spec).await?;
    Ok(ApiResponse::success(page))
}
