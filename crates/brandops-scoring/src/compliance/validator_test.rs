use brandops_core::event::{Author, Engagement, EventContent, ProcessingStatus};
use brandops_core::playbook::{
    BrandIdentity, ComplianceRules, PlatformRule, RegulatoryRule, VisualGuidelines, VoiceAndTone,
};
use brandops_core::{ContentType, EventType};
use chrono::Utc;
use serde_json::Map;
use uuid::Uuid;

use super::*;

fn playbook() -> BrandPlaybook {
    BrandPlaybook {
        id: Uuid::from_u128(1),
        brand_id: Uuid::from_u128(2),
        version: 1,
        last_updated: Utc::now(),
        brand_identity: BrandIdentity {
            name: "Sunny Soda".to_string(),
            ..BrandIdentity::default()
        },
        voice_and_tone: VoiceAndTone {
            primary_tone: "friendly".to_string(),
            attributes: vec!["warm".to_string()],
            do_use: vec!["thanks".to_string(), "we're here".to_string()],
            dont_use: vec!["cheap".to_string(), "whatever".to_string()],
        },
        compliance_rules: ComplianceRules {
            forbidden_claims: vec!["cures".to_string(), "guaranteed weight loss".to_string()],
            required_disclosures: vec![RequiredDisclosure {
                trigger_phrases: vec!["giveaway".to_string()],
                disclosure: "#ad".to_string(),
                platforms: Vec::new(),
            }],
            regulatory_compliance: vec![RegulatoryRule {
                framework: "FTC".to_string(),
                rule_id: "health-claims".to_string(),
                description: "No unqualified health claims".to_string(),
                prohibited_terms: vec!["clinically proven".to_string()],
                severity: RuleSeverity::Critical,
            }],
            content_restrictions: vec![
                ContentRestriction {
                    category: "pricing".to_string(),
                    description: "No discount codes in public replies".to_string(),
                    restricted_terms: Vec::new(),
                    pattern: Some(r"\bcode\s+[A-Z0-9]{4,}\b".to_string()),
                    severity: RuleSeverity::Low,
                    platforms: vec![Platform::Twitter],
                },
                ContentRestriction {
                    category: "broken".to_string(),
                    description: "Invalid pattern is skipped".to_string(),
                    restricted_terms: Vec::new(),
                    pattern: Some("([unclosed".to_string()),
                    severity: RuleSeverity::Critical,
                    platforms: Vec::new(),
                },
            ],
        },
        visual_guidelines: VisualGuidelines::default(),
        platform_specific_rules: vec![PlatformRule {
            platform: Platform::Twitter,
            max_length: Some(40),
            hashtag_limit: Some(1),
            tone_adjustment: None,
            allowed_content_types: Vec::new(),
            response_time_minutes: None,
        }],
    }
}

fn event(text: &str) -> SocialEvent {
    let now = Utc::now();
    SocialEvent {
        id: "evt-9".to_string(),
        platform: Platform::Instagram,
        platform_event_id: "17890000000".to_string(),
        event_type: EventType::Comment,
        content_type: ContentType::Text,
        timestamp: now,
        author: Author {
            id: "a-9".to_string(),
            username: "sam".to_string(),
            ..Author::default()
        },
        content: EventContent {
            text: text.to_string(),
            ..EventContent::default()
        },
        engagement: Engagement::default(),
        location: None,
        metadata: Map::new(),
        ingestion_timestamp: now,
        processing_status: ProcessingStatus::Pending,
    }
}

fn service() -> ComplianceValidationService {
    ComplianceValidationService::default()
}

#[test]
fn clean_on_brand_text_is_compliant() {
    let result = service().validate_text(
        "Thanks so much, we're here whenever you need us!",
        Platform::Instagram,
        &playbook(),
    );
    assert!(result.is_compliant);
    assert!(result.violations.is_empty());
    assert!(result.overall_score >= 0.7);
    assert_eq!(result.tone_analysis.matched_preferred.len(), 2);
    assert_eq!(result.tone_analysis.detected_tone, "friendly");
}

#[test]
fn forbidden_claim_is_case_insensitive() {
    let result = service().validate_text(
        "This drink CURES headaches",
        Platform::Instagram,
        &playbook(),
    );
    assert!(!result.is_compliant);
    assert_eq!(result.violations.len(), 1);
    let violation = &result.violations[0];
    assert_eq!(violation.violation_type, ViolationType::ForbiddenClaim);
    assert_eq!(violation.detected_text, "cures");
    assert!(violation.description.contains("cures"));
}

#[test]
fn trigger_without_disclosure_is_a_violation() {
    let pb = playbook();
    let missing = service().validate_text("Join our giveaway today", Platform::Instagram, &pb);
    assert_eq!(missing.violation_types(), vec!["missing_disclosure"]);

    let disclosed =
        service().validate_text("Join our giveaway today #ad", Platform::Instagram, &pb);
    assert!(disclosed.violations.is_empty());
}

#[test]
fn regulatory_terms_carry_rule_severity() {
    let result = service().validate_text(
        "Clinically proven refreshment",
        Platform::Instagram,
        &playbook(),
    );
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].severity, RuleSeverity::Critical);
    assert!(result.violations[0].description.starts_with("FTC"));
}

#[test]
fn restriction_pattern_only_applies_on_listed_platforms() {
    let pb = playbook();
    let text = "Use code SUNNY20 at checkout";
    let on_twitter = service().validate_text(text, Platform::Twitter, &pb);
    assert_eq!(on_twitter.violation_types(), vec!["content_restriction"]);
    assert_eq!(on_twitter.violations[0].detected_text, "code SUNNY20");

    let on_instagram = service().validate_text(text, Platform::Instagram, &pb);
    assert!(on_instagram.violations.is_empty());
}

#[test]
fn invalid_pattern_never_produces_a_violation() {
    let result = service().validate_text("([unclosed", Platform::Instagram, &playbook());
    assert!(result.violations.is_empty());
}

#[test]
fn warnings_do_not_block_compliance() {
    let result = service().validate_text(
        "Thanks! Not cheap but worth it #summer #soda",
        Platform::Twitter,
        &playbook(),
    );
    let kinds: Vec<WarningType> = result.warnings.iter().map(|w| w.warning_type).collect();
    assert!(kinds.contains(&WarningType::DiscouragedPhrase));
    assert!(kinds.contains(&WarningType::LengthExceeded));
    assert!(kinds.contains(&WarningType::HashtagLimitExceeded));
    assert!(result.violations.is_empty());
    assert_eq!(result.tone_analysis.matched_avoided, vec!["cheap".to_string()]);
}

#[test]
fn shouting_negative_text_scores_low_tone() {
    let result = service().validate_text(
        "THIS IS TERRIBLE AND AWFUL SERVICE",
        Platform::Instagram,
        &playbook(),
    );
    assert_eq!(result.tone_analysis.detected_tone, "aggressive");
    assert!(result.tone_analysis.score < 0.7);
}

#[test]
fn violations_always_mean_non_compliant() {
    let lenient = ComplianceValidationService::new(ComplianceConfig { min_score: 0.0 });
    let result = lenient.validate_text("cures everything", Platform::Instagram, &playbook());
    assert!(!result.violations.is_empty());
    assert!(!result.is_compliant);
}

#[test]
fn overall_score_combines_penalties_and_tone() {
    let result = service().validate_text("cures everything", Platform::Instagram, &playbook());
    let expected = 0.7 * (1.0 - 0.3) + 0.3 * result.tone_analysis.score;
    assert!((result.overall_score - expected).abs() < 1e-12);
}

#[test]
fn validation_is_deterministic() {
    let pb = playbook();
    let event = event("Giveaway! clinically proven, CURES everything, cheap");
    let first = service().validate_compliance(&event, &pb);
    let second = service().validate_compliance(&event, &pb);
    assert_eq!(first, second);
    assert_eq!(first.violations.len(), 3);
}

#[test]
fn min_score_comes_from_config() {
    let strict = ComplianceValidationService::new(ComplianceConfig { min_score: 0.99 });
    let result = strict.validate_text("hello there", Platform::Instagram, &playbook());
    assert!(result.violations.is_empty());
    assert!(!result.is_compliant);
}
