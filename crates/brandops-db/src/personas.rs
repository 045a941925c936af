//! Read queries for personas and their detail tables.

use std::collections::HashMap;

use brandops_core::persona::{
    ActivityLevel, BehaviorPatterns, Demographics, PersonaTriggers, PlatformPreferences,
    Psychographics, ResponseStrategy,
};
use brandops_core::{ContentType, EventType, Persona, Platform};
use chrono::Weekday;
use sqlx::PgPool;
use uuid::Uuid;

use crate::playbooks::parse_label;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
struct PersonaRow {
    id: Uuid,
    brand_id: Uuid,
    name: String,
    description: Option<String>,
    priority: i32,
    age_ranges: Option<Vec<String>>,
    genders: Option<Vec<String>>,
    locations: Option<Vec<String>>,
    income_levels: Option<Vec<String>>,
    education_levels: Option<Vec<String>>,
    languages: Option<Vec<String>>,
    interests: Option<Vec<String>>,
    persona_values: Option<Vec<String>>,
    lifestyle: Option<Vec<String>>,
    personality_traits: Option<Vec<String>>,
    pain_points: Option<Vec<String>>,
    preferred_interactions: Option<Vec<String>>,
    content_preferences: Option<Vec<String>>,
    activity_level: Option<String>,
    active_hours: Option<Vec<i32>>,
    active_days: Option<Vec<String>>,
    min_followers: Option<i64>,
    max_followers: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PlatformPreferenceRow {
    persona_id: Uuid,
    platform: String,
    is_primary: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TriggerRow {
    persona_id: Uuid,
    trigger_type: String,
    phrase: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ResponseStrategyRow {
    persona_id: Uuid,
    scenario: String,
    approach: String,
    tone: String,
    example_response: Option<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active personas for `brand_id`, ordered by priority then id.
///
/// Missing detail rows yield empty sections. Unknown platform, interaction,
/// or weekday labels are dropped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn list_active_personas(pool: &PgPool, brand_id: Uuid) -> Result<Vec<Persona>, DbError> {
    let rows = sqlx::query_as::<_, PersonaRow>(
        "SELECT p.id, p.brand_id, p.name, p.description, p.priority, \
                d.age_ranges, d.genders, d.locations, d.income_levels, d.education_levels, \
                d.languages, \
                ps.interests, ps.persona_values, ps.lifestyle, ps.personality_traits, \
                ps.pain_points, \
                b.preferred_interactions, b.content_preferences, b.activity_level, \
                b.active_hours, b.active_days, b.min_followers, b.max_followers \
         FROM personas p \
         LEFT JOIN persona_demographics d ON d.persona_id = p.id \
         LEFT JOIN persona_psychographics ps ON ps.persona_id = p.id \
         LEFT JOIN persona_behavior_patterns b ON b.persona_id = p.id \
         WHERE p.brand_id = $1 AND p.is_active = true \
         ORDER BY p.priority, p.id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let preferences = sqlx::query_as::<_, PlatformPreferenceRow>(
        "SELECT persona_id, platform, is_primary \
         FROM persona_platform_preferences \
         WHERE persona_id = ANY($1) \
         ORDER BY persona_id, is_primary DESC, rank, platform",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let triggers = sqlx::query_as::<_, TriggerRow>(
        "SELECT persona_id, trigger_type, phrase \
         FROM persona_triggers \
         WHERE persona_id = ANY($1) \
         ORDER BY persona_id, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let strategies = sqlx::query_as::<_, ResponseStrategyRow>(
        "SELECT persona_id, scenario, approach, tone, example_response \
         FROM persona_response_strategies \
         WHERE persona_id = ANY($1) \
         ORDER BY persona_id, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut platform_prefs: HashMap<Uuid, PlatformPreferences> = HashMap::new();
    for pref in preferences {
        let Ok(platform) = pref.platform.parse::<Platform>() else {
            tracing::warn!(persona_id = %pref.persona_id, platform = %pref.platform, "skipping unknown platform preference");
            continue;
        };
        let entry = platform_prefs.entry(pref.persona_id).or_default();
        if pref.is_primary {
            entry.primary.push(platform);
        } else {
            entry.secondary.push(platform);
        }
    }

    let mut trigger_map: HashMap<Uuid, PersonaTriggers> = HashMap::new();
    for trigger in triggers {
        let entry = trigger_map.entry(trigger.persona_id).or_default();
        match trigger.trigger_type.as_str() {
            "positive" => entry.positive.push(trigger.phrase),
            "negative" => entry.negative.push(trigger.phrase),
            other => {
                tracing::warn!(persona_id = %trigger.persona_id, trigger_type = other, "skipping unknown trigger type");
            }
        }
    }

    let mut strategy_map: HashMap<Uuid, Vec<ResponseStrategy>> = HashMap::new();
    for s in strategies {
        strategy_map
            .entry(s.persona_id)
            .or_default()
            .push(ResponseStrategy {
                scenario: s.scenario,
                approach: s.approach,
                tone: s.tone,
                example_response: s.example_response,
            });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            persona_from_row(
                row,
                platform_prefs.remove(&id).unwrap_or_default(),
                trigger_map.remove(&id).unwrap_or_default(),
                strategy_map.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

fn persona_from_row(
    row: PersonaRow,
    platform_preferences: PlatformPreferences,
    triggers: PersonaTriggers,
    response_strategies: Vec<ResponseStrategy>,
) -> Persona {
    let activity_level = row
        .activity_level
        .as_deref()
        .and_then(|s| s.parse::<ActivityLevel>().ok())
        .unwrap_or_default();

    Persona {
        id: row.id,
        name: row.name,
        brand_id: row.brand_id,
        priority: row.priority,
        description: row.description,
        demographics: Demographics {
            age_ranges: row.age_ranges.unwrap_or_default(),
            genders: row.genders.unwrap_or_default(),
            locations: row.locations.unwrap_or_default(),
            income_levels: row.income_levels.unwrap_or_default(),
            education_levels: row.education_levels.unwrap_or_default(),
            languages: row.languages.unwrap_or_default(),
        },
        psychographics: Psychographics {
            interests: row.interests.unwrap_or_default(),
            values: row.persona_values.unwrap_or_default(),
            lifestyle: row.lifestyle.unwrap_or_default(),
            personality_traits: row.personality_traits.unwrap_or_default(),
            pain_points: row.pain_points.unwrap_or_default(),
        },
        behavior_patterns: BehaviorPatterns {
            preferred_interactions: row
                .preferred_interactions
                .unwrap_or_default()
                .iter()
                .filter_map(|s| parse_label::<EventType>(s))
                .collect(),
            content_preferences: row
                .content_preferences
                .unwrap_or_default()
                .iter()
                .filter_map(|s| parse_label::<ContentType>(s))
                .collect(),
            activity_level,
            active_hours: row
                .active_hours
                .unwrap_or_default()
                .into_iter()
                .filter_map(|h| u8::try_from(h).ok().filter(|h| *h < 24))
                .collect(),
            active_days: row
                .active_days
                .unwrap_or_default()
                .iter()
                .filter_map(|d| d.parse::<Weekday>().ok())
                .collect(),
            min_followers: row.min_followers.and_then(|n| u64::try_from(n).ok()),
            max_followers: row.max_followers.and_then(|n| u64::try_from(n).ok()),
        },
        platform_preferences,
        triggers,
        response_strategies,
    }
}
