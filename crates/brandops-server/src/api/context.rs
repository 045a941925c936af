use axum::{extract::State, Extension, Json};
use brandops_context::BrandContextMetrics;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

pub(super) async fn get_context_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<BrandContextMetrics>> {
    let metrics = state.context.metrics().await;
    Json(ApiResponse::new(metrics, req_id.0))
}
