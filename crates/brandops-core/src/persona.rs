//! Audience personas modeled by the brand team.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{ContentType, EventType, Platform};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ActivityLevel::Low),
            "medium" => Ok(ActivityLevel::Medium),
            "high" => Ok(ActivityLevel::High),
            other => Err(format!("unknown activity level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    #[serde(default)]
    pub age_ranges: Vec<String>,
    #[serde(default)]
    pub genders: Vec<String>,
    /// Country codes or region names, compared case-insensitively.
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub income_levels: Vec<String>,
    #[serde(default)]
    pub education_levels: Vec<String>,
    /// ISO 639-1 language codes.
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Psychographics {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub lifestyle: Vec<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPatterns {
    #[serde(default)]
    pub preferred_interactions: Vec<EventType>,
    #[serde(default)]
    pub content_preferences: Vec<ContentType>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    /// Hours of day (UTC, 0-23) in which the persona is typically active.
    #[serde(default)]
    pub active_hours: Vec<u8>,
    #[serde(default)]
    pub active_days: Vec<Weekday>,
    #[serde(default)]
    pub min_followers: Option<u64>,
    #[serde(default)]
    pub max_followers: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPreferences {
    /// Ordered by preference, most preferred first.
    #[serde(default)]
    pub primary: Vec<Platform>,
    #[serde(default)]
    pub secondary: Vec<Platform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaTriggers {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStrategy {
    pub scenario: String,
    pub approach: String,
    pub tone: String,
    #[serde(default)]
    pub example_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub brand_id: Uuid,
    /// Lower value ranks first.
    pub priority: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub psychographics: Psychographics,
    #[serde(default)]
    pub behavior_patterns: BehaviorPatterns,
    #[serde(default)]
    pub platform_preferences: PlatformPreferences,
    #[serde(default)]
    pub triggers: PersonaTriggers,
    #[serde(default)]
    pub response_strategies: Vec<ResponseStrategy>,
}

impl Persona {
    /// Every free-text keyword that describes what this persona talks about.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.psychographics
            .interests
            .iter()
            .chain(&self.psychographics.values)
            .chain(&self.psychographics.lifestyle)
            .chain(&self.psychographics.pain_points)
            .map(String::as_str)
    }
}
