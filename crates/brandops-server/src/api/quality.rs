use axum::{
    extract::{Path, State},
    Extension, Json,
};
use brandops_quality::{DataQualityIssue, QualityError, QualityReport};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ResolveIssueRequest {
    pub resolved_by: String,
    pub note: Option<String>,
}

pub(super) async fn get_quality_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<QualityReport>> {
    let report = state.quality.generate_quality_report().await;
    Json(ApiResponse::new(report, req_id.0))
}

pub(super) async fn resolve_issue(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(issue_id): Path<Uuid>,
    Json(body): Json<ResolveIssueRequest>,
) -> Result<Json<ApiResponse<DataQualityIssue>>, ApiError> {
    let resolved_by = body.resolved_by.trim();
    if resolved_by.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "resolved_by must not be empty",
        ));
    }

    let issue = state
        .quality
        .resolve_issue(issue_id, resolved_by, body.note)
        .await
        .map_err(|e| match e {
            QualityError::IssueNotFound(_) => {
                ApiError::new(req_id.0.clone(), "not_found", e.to_string())
            }
        })?;
    Ok(Json(ApiResponse::new(issue, req_id.0)))
}
