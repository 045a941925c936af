use brandops_core::event::{Author, Engagement, EventContent, EventLocation, ProcessingStatus};
use brandops_core::persona::{
    ActivityLevel, BehaviorPatterns, Demographics, PersonaTriggers, PlatformPreferences,
    Psychographics,
};
use brandops_core::{ContentType, EventType, Platform};
use chrono::{TimeZone, Utc, Weekday};
use serde_json::Map;
use uuid::Uuid;

use super::*;

fn event(platform: Platform, text: &str) -> SocialEvent {
    // 2026-03-04 is a Wednesday.
    let timestamp = Utc
        .with_ymd_and_hms(2026, 3, 4, 19, 15, 0)
        .single()
        .expect("valid timestamp");
    SocialEvent {
        id: "evt-1".to_string(),
        platform,
        platform_event_id: "1234567890".to_string(),
        event_type: EventType::Comment,
        content_type: ContentType::Text,
        timestamp,
        author: Author {
            id: "a-1".to_string(),
            username: "trailfan".to_string(),
            follower_count: Some(2_500),
            ..Author::default()
        },
        content: EventContent {
            text: text.to_string(),
            language: Some("en".to_string()),
            ..EventContent::default()
        },
        engagement: Engagement {
            likes: 40,
            shares: 5,
            comments: 3,
            views: 900,
        },
        location: Some(EventLocation {
            country: Some("US".to_string()),
            ..EventLocation::default()
        }),
        metadata: Map::new(),
        ingestion_timestamp: timestamp,
        processing_status: ProcessingStatus::Pending,
    }
}

fn runner() -> Persona {
    Persona {
        id: Uuid::from_u128(1),
        name: "Weekend Runner".to_string(),
        brand_id: Uuid::from_u128(100),
        priority: 2,
        description: None,
        demographics: Demographics {
            locations: vec!["us".to_string()],
            languages: vec!["en".to_string()],
            ..Demographics::default()
        },
        psychographics: Psychographics {
            interests: vec!["running".to_string(), "trail".to_string()],
            values: vec!["hydration".to_string()],
            ..Psychographics::default()
        },
        behavior_patterns: BehaviorPatterns {
            preferred_interactions: vec![EventType::Comment],
            content_preferences: vec![ContentType::Text],
            activity_level: ActivityLevel::Medium,
            active_hours: vec![18, 19, 20],
            active_days: vec![Weekday::Wed, Weekday::Sat],
            min_followers: Some(100),
            max_followers: Some(10_000),
        },
        platform_preferences: PlatformPreferences {
            primary: vec![Platform::Instagram, Platform::Tiktok],
            secondary: vec![Platform::Twitter],
        },
        triggers: PersonaTriggers {
            positive: vec!["personal best".to_string()],
            negative: vec!["sold out".to_string()],
        },
        response_strategies: Vec::new(),
    }
}

fn executive() -> Persona {
    Persona {
        id: Uuid::from_u128(2),
        name: "Busy Executive".to_string(),
        brand_id: Uuid::from_u128(100),
        priority: 1,
        description: None,
        demographics: Demographics {
            languages: vec!["de".to_string()],
            ..Demographics::default()
        },
        psychographics: Psychographics {
            interests: vec!["productivity".to_string()],
            ..Psychographics::default()
        },
        behavior_patterns: BehaviorPatterns {
            preferred_interactions: vec![EventType::DirectMessage],
            active_hours: vec![7, 8],
            ..BehaviorPatterns::default()
        },
        platform_preferences: PlatformPreferences {
            primary: vec![Platform::Linkedin],
            secondary: Vec::new(),
        },
        triggers: PersonaTriggers::default(),
        response_strategies: Vec::new(),
    }
}

#[test]
fn default_weights_are_valid() {
    assert!(MatchingWeights::default().validate().is_ok());
    assert!(ConfidenceThresholds::default().validate().is_ok());
}

#[test]
fn weights_must_sum_to_one() {
    let weights = MatchingWeights {
        content_analysis: 0.5,
        ..MatchingWeights::default()
    };
    let err = PersonaMatchingEngine::new(weights, ConfidenceThresholds::default()).unwrap_err();
    assert!(matches!(err, ScoringError::InvalidWeights(_)));
}

#[test]
fn negative_weight_is_rejected() {
    let weights = MatchingWeights {
        content_analysis: -0.1,
        platform_preference: 0.65,
        ..MatchingWeights::default()
    };
    assert!(matches!(
        weights.validate(),
        Err(ScoringError::InvalidWeights(_))
    ));
}

#[test]
fn thresholds_must_be_ordered() {
    let thresholds = ConfidenceThresholds {
        high_confidence: 0.5,
        medium_confidence: 0.6,
        minimum_match: 0.3,
    };
    let err = PersonaMatchingEngine::new(MatchingWeights::default(), thresholds).unwrap_err();
    assert!(matches!(err, ScoringError::InvalidThresholds(_)));
}

#[test]
fn relevant_persona_ranks_first() {
    let engine = PersonaMatchingEngine::default();
    let event = event(
        Platform::Instagram,
        "New personal best on the trail today, love this running fuel!",
    );
    let matches = engine.get_all_matches(&event, &[executive(), runner()]);

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].persona.name, "Weekend Runner");
    assert!(matches[0].confidence > matches[1].confidence);
    assert_eq!(matches[0].matching_factors.platform_score, 1.0);
    assert_eq!(matches[0].matching_factors.temporal_score, 1.0);
    assert_eq!(matches[0].confidence_level, ConfidenceLevel::High);
}

#[test]
fn scores_stay_in_unit_range_and_sorted() {
    let engine = PersonaMatchingEngine::default();
    for platform in Platform::ALL {
        let event = event(platform, "SOLD OUT again?! terrible");
        let matches = engine.get_all_matches(&event, &[runner(), executive()]);
        for pair in matches.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        for m in &matches {
            let f = m.matching_factors;
            for score in [
                m.confidence,
                f.content_score,
                f.platform_score,
                f.demographic_score,
                f.behavior_score,
                f.temporal_score,
            ] {
                assert!((0.0..=1.0).contains(&score), "score {score} out of range");
            }
            assert!(!m.reasoning.is_empty());
        }
    }
}

#[test]
fn matching_is_deterministic() {
    let engine = PersonaMatchingEngine::default();
    let event = event(Platform::Tiktok, "trail running tips please");
    let personas = [runner(), executive()];

    let first = engine.get_all_matches(&event, &personas);
    let second = engine.get_all_matches(&event, &personas);
    let summary = |ms: &[PersonaMatch]| {
        ms.iter()
            .map(|m| (m.persona.id, m.confidence, m.reasoning.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&first), summary(&second));
}

#[test]
fn ties_break_on_priority_then_id() {
    let engine = PersonaMatchingEngine::default();
    let event = event(Platform::Reddit, "hello");
    let base = Persona {
        psychographics: Psychographics::default(),
        behavior_patterns: BehaviorPatterns::default(),
        platform_preferences: PlatformPreferences::default(),
        demographics: Demographics::default(),
        triggers: PersonaTriggers::default(),
        ..runner()
    };
    let low_priority = Persona {
        id: Uuid::from_u128(5),
        priority: 9,
        ..base.clone()
    };
    let high_priority_b = Persona {
        id: Uuid::from_u128(4),
        priority: 1,
        ..base.clone()
    };
    let high_priority_a = Persona {
        id: Uuid::from_u128(3),
        priority: 1,
        ..base
    };

    let matches = engine.get_all_matches(&event, &[low_priority, high_priority_b, high_priority_a]);
    let ids: Vec<u128> = matches.iter().map(|m| m.persona.id.as_u128()).collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[test]
fn match_persona_respects_minimum() {
    let event = event(Platform::Youtube, "unrelated words");
    let strict = PersonaMatchingEngine::new(
        MatchingWeights::default(),
        ConfidenceThresholds {
            high_confidence: 1.0,
            medium_confidence: 1.0,
            minimum_match: 0.99,
        },
    )
    .expect("engine");
    assert!(strict.match_persona(&event, &[executive()]).is_none());

    let lenient = PersonaMatchingEngine::default();
    let best = lenient
        .get_all_matches(&event, &[executive(), runner()])
        .into_iter()
        .next()
        .expect("at least one match");
    let matched = lenient.match_persona(&event, &[executive(), runner()]);
    assert_eq!(matched.is_some(), best.confidence >= 0.3);
}

#[test]
fn no_personas_means_no_match() {
    let engine = PersonaMatchingEngine::default();
    assert!(engine
        .match_persona(&event(Platform::Twitter, "hi"), &[])
        .is_none());
}

#[test]
fn inactive_day_halves_temporal_score() {
    let engine = PersonaMatchingEngine::default();
    let mut persona = runner();
    persona.behavior_patterns.active_days = vec![Weekday::Sun];
    let matches = engine.get_all_matches(&event(Platform::Instagram, "hi"), &[persona]);
    assert!((matches[0].matching_factors.temporal_score - 0.5).abs() < 1e-12);
}

#[test]
fn secondary_platform_scores_below_primary() {
    let engine = PersonaMatchingEngine::default();
    let primary = engine.get_all_matches(&event(Platform::Instagram, "hi"), &[runner()]);
    let secondary = engine.get_all_matches(&event(Platform::Twitter, "hi"), &[runner()]);
    let unlisted = engine.get_all_matches(&event(Platform::Reddit, "hi"), &[runner()]);

    let p = primary[0].matching_factors.platform_score;
    let s = secondary[0].matching_factors.platform_score;
    let u = unlisted[0].matching_factors.platform_score;
    assert!(p > 0.5);
    assert!(s > 0.0 && s < p);
    assert!(u < s);
}
