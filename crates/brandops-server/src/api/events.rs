//! Event preparation: quality gate, brand context, persona match.

use axum::{extract::State, Extension, Json};
use brandops_core::{RuleSeverity, SocialEvent};
use brandops_quality::IssueType;
use brandops_scoring::ConfidenceLevel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_context_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitEventRequest {
    pub brand_id: Uuid,
    pub event: SocialEvent,
}

#[derive(Debug, Serialize)]
pub(super) struct IssueRef {
    id: Uuid,
    #[serde(rename = "type")]
    issue_type: IssueType,
    severity: RuleSeverity,
}

/// Ids and labels only. The full persona match stays in-process.
#[derive(Debug, Serialize)]
pub(super) struct PreparedEvent {
    event_id: String,
    accepted: bool,
    issues: Vec<IssueRef>,
    persona_id: Option<Uuid>,
    confidence_level: Option<ConfidenceLevel>,
}

pub(super) async fn submit_event(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SubmitEventRequest>,
) -> Result<Json<ApiResponse<PreparedEvent>>, ApiError> {
    let SubmitEventRequest { brand_id, event } = body;

    let outcome = state.quality.monitor_event(&event).await;
    let issues: Vec<IssueRef> = outcome
        .issues
        .iter()
        .map(|issue| IssueRef {
            id: issue.id,
            issue_type: issue.issue_type,
            severity: issue.severity,
        })
        .collect();

    if !outcome.is_valid {
        tracing::info!(
            event_id = %event.id,
            %brand_id,
            issues = issues.len(),
            "event rejected by quality gate"
        );
        return Ok(Json(ApiResponse::new(
            PreparedEvent {
                event_id: event.id,
                accepted: false,
                issues,
                persona_id: None,
                confidence_level: None,
            },
            req_id.0,
        )));
    }

    let context = state
        .context
        .load_brand_context(brand_id)
        .await
        .map_err(|e| map_context_error(req_id.0.clone(), &e))?;

    let matched = state.matcher.match_persona(&event, &context.personas);
    let (persona_id, confidence, confidence_level) = match &matched {
        Some(m) => (Some(m.persona.id), m.confidence, Some(m.confidence_level)),
        None => (None, 0.0, None),
    };

    if let Err(e) = state
        .audit
        .log_persona_matched(
            &event.id,
            brand_id,
            persona_id,
            confidence,
            confidence_level.map_or("none", ConfidenceLevel::as_str),
        )
        .await
    {
        tracing::warn!(error = %e, event_id = %event.id, "failed to audit persona match");
    }

    Ok(Json(ApiResponse::new(
        PreparedEvent {
            event_id: event.id,
            accepted: true,
            issues,
            persona_id,
            confidence_level,
        },
        req_id.0,
    )))
}
