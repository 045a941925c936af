use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use brandops_audit::{capture_system_context, AuditLogger, AuditLoggerConfig, MemoryAuditStorage};
use brandops_context::{default_persona, BrandContextConfig, MemoryBrandContextSource};
use brandops_core::playbook::{BrandIdentity, ComplianceRules, VisualGuidelines, VoiceAndTone};
use brandops_core::BrandPlaybook;
use brandops_quality::MonitorConfig;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use super::*;

struct Harness {
    app: Router,
    source: Arc<MemoryBrandContextSource>,
}

fn harness_with(auth: AuthState, rate_limit: RateLimitState) -> Harness {
    let logger = AuditLogger::new(
        AuditLoggerConfig::default(),
        capture_system_context("brandops-test", "test"),
        Arc::new(MemoryAuditStorage::new()),
    );
    let audit = Arc::new(AuditService::new(logger));
    let source = Arc::new(MemoryBrandContextSource::new());
    let context = BrandContextService::new(
        BrandContextConfig::default(),
        source.clone(),
        Some(audit.clone()),
    );
    let quality = Arc::new(DataQualityMonitor::new(
        MonitorConfig::default(),
        Some(audit.clone()),
    ));
    let state = AppState {
        audit,
        context,
        quality,
        matcher: PersonaMatchingEngine::default(),
    };
    Harness {
        app: build_app(state, auth, rate_limit),
        source,
    }
}

fn harness() -> Harness {
    let auth = AuthState::from_keys(std::iter::empty(), true).expect("auth");
    harness_with(auth, default_rate_limit_state())
}

async fn seed_brand(source: &MemoryBrandContextSource) -> Uuid {
    let brand_id = Uuid::new_v4();
    source
        .put_playbook(BrandPlaybook {
            id: Uuid::new_v4(),
            brand_id,
            version: 2,
            last_updated: Utc::now(),
            brand_identity: BrandIdentity {
                name: "Sunny Soda".to_string(),
                ..BrandIdentity::default()
            },
            voice_and_tone: VoiceAndTone::default(),
            compliance_rules: ComplianceRules::default(),
            visual_guidelines: VisualGuidelines::default(),
            platform_specific_rules: Vec::new(),
        })
        .await;
    let mut fan = default_persona(brand_id);
    fan.id = Uuid::new_v4();
    fan.name = "Citrus Fan".to_string();
    source.put_personas(brand_id, vec![fan]).await;
    brand_id
}

fn event_json(likes: i64) -> Value {
    json!({
        "id": "evt-100",
        "platform": "twitter",
        "platformEventId": "1790012345678901234",
        "eventType": "mention",
        "contentType": "text",
        "timestamp": Utc::now().to_rfc3339(),
        "author": { "id": "u-1", "username": "hydrohomie" },
        "content": { "text": "The new citrus flavor is great" },
        "engagement": { "likes": likes, "views": 500 },
        "ingestionTimestamp": Utc::now().to_rfc3339()
    })
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("service_unavailable", StatusCode::SERVICE_UNAVAILABLE),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "{code}");
    }
}

#[tokio::test]
async fn health_reports_audit_storage() {
    let h = harness();
    let (status, json) = send(&h.app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["audit_storage"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let h = harness();
    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "req-abc")
        .body(Body::empty())
        .expect("request");
    let response = h.app.clone().oneshot(request).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
}

#[tokio::test]
async fn protected_routes_require_a_valid_key() {
    let auth = AuthState::from_keys(["s3cret"], false).expect("auth");
    let h = harness_with(auth, default_rate_limit_state());

    let (status, json) = send(&h.app, get("/api/v1/quality/report")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let request = Request::builder()
        .uri("/api/v1/quality/report")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&h.app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let auth = AuthState::from_keys(std::iter::empty(), true).expect("auth");
    let h = harness_with(auth, RateLimitState::new(1, Duration::from_secs(60)));

    let (first, _) = send(&h.app, get("/api/v1/brand-context/metrics")).await;
    let (second, json) = send(&h.app, get("/api/v1/brand-context/metrics")).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn recorded_decisions_are_queryable() {
    let h = harness();
    let decision = json!({
        "decision_id": Uuid::new_v4(),
        "event_id": "evt-7",
        "brand_id": Uuid::new_v4(),
        "decision_type": "escalate",
        "confidence": 0.42,
        "reasoning": ["negative sentiment from verified author"]
    });
    let (status, json) = send(&h.app, post_json("/api/v1/decisions", &decision)).await;
    assert_eq!(status, StatusCode::CREATED);
    let audit_id = json["data"]["audit_id"].as_str().expect("audit id").to_string();

    let (status, json) = send(
        &h.app,
        get("/api/v1/audit/events?event_types=decision_made&severities=warn&limit=10"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = json["data"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"].as_str(), Some(audit_id.as_str()));

    let (status, json) = send(&h.app, get("/api/v1/audit/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total_events"], 1);
}

#[tokio::test]
async fn decision_with_out_of_range_confidence_is_rejected() {
    let h = harness();
    let decision = json!({
        "decision_id": Uuid::new_v4(),
        "event_id": "evt-8",
        "brand_id": Uuid::new_v4(),
        "decision_type": "ignore",
        "confidence": 1.5
    });
    let (status, json) = send(&h.app, post_json("/api/v1/decisions", &decision)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn unknown_audit_filter_is_a_validation_error() {
    let h = harness();
    let (status, json) = send(&h.app, get("/api/v1/audit/events?severities=loud")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn valid_event_is_matched_without_exposing_scores() {
    let h = harness();
    let brand_id = seed_brand(&h.source).await;
    let body = json!({ "brand_id": brand_id, "event": event_json(12) });

    let (status, json) = send(&h.app, post_json("/api/v1/events", &body)).await;
    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["event_id"], "evt-100");
    assert_eq!(data["accepted"], true);
    assert!(data["issues"].as_array().expect("issues").is_empty());
    assert!(data.get("matching_factors").is_none());
    assert!(data.get("confidence").is_none());

    let (_, metrics) = send(&h.app, get("/api/v1/brand-context/metrics")).await;
    assert_eq!(metrics["data"]["brand_contexts_loaded"], 1);
}

#[tokio::test]
async fn blocking_issues_skip_context_load() {
    let h = harness();
    let brand_id = seed_brand(&h.source).await;
    let body = json!({ "brand_id": brand_id, "event": event_json(-5) });

    let (status, json) = send(&h.app, post_json("/api/v1/events", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["accepted"], false);
    assert_eq!(json["data"]["issues"][0]["type"], "INVALID_ENGAGEMENT");
    assert_eq!(json["data"]["issues"][0]["severity"], "high");
    assert_eq!(h.source.playbook_loads(), 0);
}

#[tokio::test]
async fn unknown_brand_is_not_found() {
    let h = harness();
    let body = json!({ "brand_id": Uuid::new_v4(), "event": event_json(3) });
    let (status, json) = send(&h.app, post_json("/api/v1/events", &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn issues_can_be_resolved_once() {
    let h = harness();
    let brand_id = seed_brand(&h.source).await;
    let mut event = event_json(12);
    event["engagement"]["views"] = json!(2);
    let body = json!({ "brand_id": brand_id, "event": event });
    let (_, json) = send(&h.app, post_json("/api/v1/events", &body)).await;
    let issue_id = json["data"]["issues"][0]["id"]
        .as_str()
        .expect("issue id")
        .to_string();

    let uri = format!("/api/v1/quality/issues/{issue_id}/resolve");
    let (status, first) = send(
        &h.app,
        post_json(&uri, &json!({ "resolved_by": "analyst", "note": "stale view count" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["resolved"], true);

    let (_, second) = send(&h.app, post_json(&uri, &json!({ "resolved_by": "someone-else" }))).await;
    assert_eq!(second["data"]["resolvedBy"], "analyst");
    assert_eq!(second["data"]["resolvedAt"], first["data"]["resolvedAt"]);

    let (status, _) = send(&h.app, post_json(&uri, &json!({ "resolved_by": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/v1/quality/issues/{}/resolve", Uuid::new_v4());
    let (status, _) = send(&h.app, post_json(&missing, &json!({ "resolved_by": "analyst" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, report) = send(&h.app, get("/api/v1/quality/report")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"]["summary"]["totalEventsProcessed"], 1);
    assert_eq!(report["data"]["summary"]["unresolvedIssues"], 0);
    assert_eq!(report["data"]["topIssues"][0]["type"], "UNREALISTIC_ENGAGEMENT");
}
