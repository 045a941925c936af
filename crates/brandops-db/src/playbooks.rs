//! Read queries for brand playbooks and their 1:1 detail tables.

use brandops_core::playbook::{
    BrandIdentity, ComplianceRules, PlatformRule, VisualGuidelines, VoiceAndTone,
};
use brandops_core::{BrandPlaybook, ContentType, Platform};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
struct PlaybookRow {
    id: Uuid,
    brand_id: Uuid,
    version: i32,
    last_updated: DateTime<Utc>,
    name: String,
    mission: Option<String>,
    brand_values: Vec<String>,
    personality: Vec<String>,
    tagline: Option<String>,
    primary_tone: String,
    attributes: Vec<String>,
    do_use: Vec<String>,
    dont_use: Vec<String>,
    forbidden_claims: Option<Vec<String>>,
    required_disclosures: Option<Value>,
    regulatory_compliance: Option<Value>,
    content_restrictions: Option<Value>,
    primary_colors: Option<Vec<String>>,
    secondary_colors: Option<Vec<String>>,
    fonts: Option<Vec<String>>,
    logo_usage: Option<String>,
    imagery_style: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PlatformRuleRow {
    platform: String,
    max_length: Option<i32>,
    hashtag_limit: Option<i32>,
    tone_adjustment: Option<String>,
    allowed_content_types: Vec<String>,
    response_time_minutes: Option<i32>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the highest-version active playbook for `brand_id`, or `None`.
///
/// Compliance and visual guideline rows are optional; a playbook without
/// them gets empty rule sets.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails or [`DbError::Decode`] if a
/// JSONB rule list does not match the expected shape.
pub async fn get_active_playbook(
    pool: &PgPool,
    brand_id: Uuid,
) -> Result<Option<BrandPlaybook>, DbError> {
    let row = sqlx::query_as::<_, PlaybookRow>(
        "SELECT p.id, p.brand_id, p.version, p.last_updated, \
                bi.name, bi.mission, bi.brand_values, bi.personality, bi.tagline, \
                vt.primary_tone, vt.attributes, vt.do_use, vt.dont_use, \
                cr.forbidden_claims, cr.required_disclosures, cr.regulatory_compliance, \
                cr.content_restrictions, \
                vg.primary_colors, vg.secondary_colors, vg.fonts, vg.logo_usage, vg.imagery_style \
         FROM brand_playbooks p \
         JOIN playbook_brand_identity bi ON bi.playbook_id = p.id \
         JOIN playbook_voice_tone vt ON vt.playbook_id = p.id \
         LEFT JOIN playbook_compliance_rules cr ON cr.playbook_id = p.id \
         LEFT JOIN playbook_visual_guidelines vg ON vg.playbook_id = p.id \
         WHERE p.brand_id = $1 AND p.is_active = true \
         ORDER BY p.version DESC \
         LIMIT 1",
    )
    .bind(brand_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let rule_rows = sqlx::query_as::<_, PlatformRuleRow>(
        "SELECT platform, max_length, hashtag_limit, tone_adjustment, \
                allowed_content_types, response_time_minutes \
         FROM playbook_platform_rules \
         WHERE playbook_id = $1 \
         ORDER BY platform",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let platform_specific_rules = rule_rows
        .into_iter()
        .filter_map(platform_rule_from_row)
        .collect();

    Ok(Some(BrandPlaybook {
        id: row.id,
        brand_id: row.brand_id,
        version: row.version,
        last_updated: row.last_updated,
        brand_identity: BrandIdentity {
            name: row.name,
            mission: row.mission,
            values: row.brand_values,
            personality: row.personality,
            tagline: row.tagline,
        },
        voice_and_tone: VoiceAndTone {
            primary_tone: row.primary_tone,
            attributes: row.attributes,
            do_use: row.do_use,
            dont_use: row.dont_use,
        },
        compliance_rules: ComplianceRules {
            forbidden_claims: row.forbidden_claims.unwrap_or_default(),
            required_disclosures: decode_rule_list(
                "required_disclosures",
                row.required_disclosures,
            )?,
            regulatory_compliance: decode_rule_list(
                "regulatory_compliance",
                row.regulatory_compliance,
            )?,
            content_restrictions: decode_rule_list(
                "content_restrictions",
                row.content_restrictions,
            )?,
        },
        visual_guidelines: VisualGuidelines {
            primary_colors: row.primary_colors.unwrap_or_default(),
            secondary_colors: row.secondary_colors.unwrap_or_default(),
            fonts: row.fonts.unwrap_or_default(),
            logo_usage: row.logo_usage,
            imagery_style: row.imagery_style,
        },
        platform_specific_rules,
    }))
}

fn decode_rule_list<T: DeserializeOwned>(
    column: &'static str,
    value: Option<Value>,
) -> Result<Vec<T>, DbError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v).map_err(|e| DbError::decode(column, e)),
    }
}

/// Rules for platforms this service does not know are skipped.
fn platform_rule_from_row(row: PlatformRuleRow) -> Option<PlatformRule> {
    let platform = match row.platform.parse::<Platform>() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(platform = %row.platform, error = %e, "skipping platform rule");
            return None;
        }
    };

    Some(PlatformRule {
        platform,
        max_length: row.max_length.and_then(|n| usize::try_from(n).ok()),
        hashtag_limit: row.hashtag_limit.and_then(|n| usize::try_from(n).ok()),
        tone_adjustment: row.tone_adjustment,
        allowed_content_types: row
            .allowed_content_types
            .iter()
            .filter_map(|s| parse_label::<ContentType>(s))
            .collect(),
        response_time_minutes: row
            .response_time_minutes
            .and_then(|n| u32::try_from(n).ok()),
    })
}

/// Parses a snake_case enum label the same way serde does for payloads.
pub(crate) fn parse_label<T: DeserializeOwned>(label: &str) -> Option<T> {
    serde_json::from_value(Value::String(label.trim().to_ascii_lowercase())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandops_core::EventType;

    #[test]
    fn parse_label_accepts_snake_case() {
        assert_eq!(
            parse_label::<EventType>("direct_message"),
            Some(EventType::DirectMessage)
        );
        assert_eq!(parse_label::<ContentType>(" Video "), Some(ContentType::Video));
        assert_eq!(parse_label::<ContentType>("hologram"), None);
    }

    #[test]
    fn unknown_platform_rule_is_skipped() {
        let row = PlatformRuleRow {
            platform: "myspace".to_string(),
            max_length: Some(100),
            hashtag_limit: None,
            tone_adjustment: None,
            allowed_content_types: vec![],
            response_time_minutes: None,
        };
        assert!(platform_rule_from_row(row).is_none());
    }

    #[test]
    fn negative_limits_are_dropped() {
        let row = PlatformRuleRow {
            platform: "twitter".to_string(),
            max_length: Some(-1),
            hashtag_limit: Some(2),
            tone_adjustment: None,
            allowed_content_types: vec!["text".to_string(), "bogus".to_string()],
            response_time_minutes: Some(30),
        };
        let rule = platform_rule_from_row(row).expect("known platform");
        assert_eq!(rule.max_length, None);
        assert_eq!(rule.hashtag_limit, Some(2));
        assert_eq!(rule.allowed_content_types, vec![ContentType::Text]);
    }
}
