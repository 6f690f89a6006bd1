use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};

use crate::error::ApiError;
use crate::filter::FilterSpec;
use crate::ledger::FilterOptions;
use crate::metrics::MetricsResult;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::AuthSession;
use crate::state::AppState;

/// GET /api/metrics - income, expense and balance totals plus the top
/// categories over the filtered set (pagination parameters are ignored)
pub async fn metrics_get(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    query: Result<Query<FilterSpec>, QueryRejection>,
) -> ApiResult<MetricsResult> {
    let Query(spec) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let metrics = state.ledger.get_metrics(&session.tenant_ref, &spec).await?;
    Ok(ApiResponse::success(metrics))
}

/// GET /api/filters - distinct values for the filter controls
pub async fn filters_get(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<FilterOptions> {
    let options = state.ledger.get_filter_options(&session.tenant_ref).await?;
    Ok(ApiResponse::success(options))
}
