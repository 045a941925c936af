//! Audit query API and decision intake.

use std::str::FromStr;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use brandops_core::{
    AuditEventType, AuditFilters, AuditLogEntry, AuditSeverity, AuditStatistics, DecisionOutput,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_audit_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct AuditQueryParams {
    /// Comma-separated.
    pub event_types: Option<String>,
    /// Comma-separated.
    pub severities: Option<String>,
    /// Comma-separated.
    pub tags: Option<String>,
    pub user_id: Option<String>,
    pub service_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub search_text: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecordedDecision {
    audit_id: Uuid,
    decision_id: Uuid,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_list<T: FromStr<Err = String>>(raw: Option<&str>) -> Result<Vec<T>, String> {
    split_list(raw).map(T::from_str).collect()
}

impl AuditQueryParams {
    pub(super) fn to_filters(&self) -> Result<AuditFilters, String> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err("start_time must not be after end_time".to_string());
            }
        }
        Ok(AuditFilters {
            event_types: parse_list::<AuditEventType>(self.event_types.as_deref())?,
            severities: parse_list::<AuditSeverity>(self.severities.as_deref())?,
            user_id: self.user_id.clone(),
            service_id: self.service_id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            tags: split_list(self.tags.as_deref()).map(String::from).collect(),
            search_text: self.search_text.clone(),
            limit: self.limit,
            offset: self.offset,
        })
    }
}

fn filters_or_error(req_id: &str, params: &AuditQueryParams) -> Result<AuditFilters, ApiError> {
    params
        .to_filters()
        .map_err(|message| ApiError::new(req_id, "validation_error", message))
}

pub(super) async fn list_audit_events(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<ApiResponse<Vec<AuditLogEntry>>>, ApiError> {
    let filters = filters_or_error(&req_id.0, &params)?;
    let entries = state
        .audit
        .query(&filters)
        .await
        .map_err(|e| map_audit_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(entries, req_id.0)))
}

pub(super) async fn get_audit_statistics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<ApiResponse<AuditStatistics>>, ApiError> {
    let filters = filters_or_error(&req_id.0, &params)?;
    let stats = state
        .audit
        .get_statistics(&filters)
        .await
        .map_err(|e| map_audit_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(stats, req_id.0)))
}

pub(super) async fn record_decision(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(decision): Json<DecisionOutput>,
) -> Result<(StatusCode, Json<ApiResponse<RecordedDecision>>), ApiError> {
    if !(0.0..=1.0).contains(&decision.confidence) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!(
                "confidence must be within [0, 1], got {}",
                decision.confidence
            ),
        ));
    }
    let audit_id = state
        .audit
        .log_decision_made(&decision, None)
        .await
        .map_err(|e| map_audit_error(req_id.0.clone(), &e))?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            RecordedDecision {
                audit_id,
                decision_id: decision.decision_id,
            },
            req_id.0,
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_separated_params_become_filters() {
        let params = AuditQueryParams {
            event_types: Some("decision_made, user_action".to_string()),
            severities: Some("warn".to_string()),
            tags: Some("decision,,escalate".to_string()),
            limit: Some(5),
            ..AuditQueryParams::default()
        };
        let filters = params.to_filters().expect("filters");
        assert_eq!(
            filters.event_types,
            vec![AuditEventType::DecisionMade, AuditEventType::UserAction]
        );
        assert_eq!(filters.severities, vec![AuditSeverity::Warn]);
        assert_eq!(filters.tags, vec!["decision", "escalate"]);
        assert_eq!(filters.limit, Some(5));
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let params = AuditQueryParams {
            event_types: Some("decision_made,teleported".to_string()),
            ..AuditQueryParams::default()
        };
        assert!(params.to_filters().is_err());
    }

    #[test]
    fn inverted_time_range_is_rejected() {
        let now = Utc::now();
        let params = AuditQueryParams {
            start_time: Some(now),
            end_time: Some(now - chrono::Duration::hours(1)),
            ..AuditQueryParams::default()
        };
        assert!(params.to_filters().is_err());
    }
}
