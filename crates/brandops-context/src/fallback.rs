use brandops_core::persona::{
    BehaviorPatterns, Demographics, PersonaTriggers, PlatformPreferences, Psychographics,
    ResponseStrategy,
};
use brandops_core::{Persona, Platform};
use uuid::Uuid;

pub const DEFAULT_PERSONA_NAME: &str = "General Audience";

/// Neutral persona used when a brand has none configured.
///
/// Its id is the nil UUID and it ranks after every real persona.
#[must_use]
pub fn default_persona(brand_id: Uuid) -> Persona {
    Persona {
        id: Uuid::nil(),
        name: DEFAULT_PERSONA_NAME.to_string(),
        brand_id,
        priority: i32::MAX,
        description: Some("Fallback persona for brands without configured personas".to_string()),
        demographics: Demographics::default(),
        psychographics: Psychographics::default(),
        behavior_patterns: BehaviorPatterns::default(),
        platform_preferences: PlatformPreferences {
            primary: Vec::new(),
            secondary: Platform::ALL.to_vec(),
        },
        triggers: PersonaTriggers::default(),
        response_strategies: vec![ResponseStrategy {
            scenario: "general".to_string(),
            approach: "acknowledge and offer help".to_string(),
            tone: "neutral".to_string(),
            example_response: None,
        }],
    }
}
