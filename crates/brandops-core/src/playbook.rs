//! Brand playbooks: voice, compliance rules, and per-platform guidance.
//!
//! Playbooks are owned by the brand-management application. This workspace
//! only reads the single active, highest-version playbook for each brand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{ContentType, Platform};

/// Severity attached to compliance rules and the violations they produce.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RuleSeverity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuleSeverity::Low => "low",
            RuleSeverity::Medium => "medium",
            RuleSeverity::High => "high",
            RuleSeverity::Critical => "critical",
        }
    }
}

impl std::str::FromStr for RuleSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RuleSeverity::Low),
            "medium" => Ok(RuleSeverity::Medium),
            "high" => Ok(RuleSeverity::High),
            "critical" => Ok(RuleSeverity::Critical),
            other => Err(format!("unknown rule severity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandIdentity {
    pub name: String,
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub tagline: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAndTone {
    pub primary_tone: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub do_use: Vec<String>,
    #[serde(default)]
    pub dont_use: Vec<String>,
}

/// A disclosure that must accompany any text mentioning one of the triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredDisclosure {
    pub trigger_phrases: Vec<String>,
    pub disclosure: String,
    /// Platforms the rule applies to; empty means all.
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryRule {
    pub framework: String,
    pub rule_id: String,
    pub description: String,
    #[serde(default)]
    pub prohibited_terms: Vec<String>,
    #[serde(default)]
    pub severity: RuleSeverity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRestriction {
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub restricted_terms: Vec<String>,
    /// Optional case-insensitive regular expression.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub severity: RuleSeverity,
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRules {
    #[serde(default)]
    pub forbidden_claims: Vec<String>,
    #[serde(default)]
    pub required_disclosures: Vec<RequiredDisclosure>,
    #[serde(default)]
    pub regulatory_compliance: Vec<RegulatoryRule>,
    #[serde(default)]
    pub content_restrictions: Vec<ContentRestriction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualGuidelines {
    #[serde(default)]
    pub primary_colors: Vec<String>,
    #[serde(default)]
    pub secondary_colors: Vec<String>,
    #[serde(default)]
    pub fonts: Vec<String>,
    #[serde(default)]
    pub logo_usage: Option<String>,
    #[serde(default)]
    pub imagery_style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRule {
    pub platform: Platform,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub hashtag_limit: Option<usize>,
    #[serde(default)]
    pub tone_adjustment: Option<String>,
    #[serde(default)]
    pub allowed_content_types: Vec<ContentType>,
    #[serde(default)]
    pub response_time_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPlaybook {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub version: i32,
    pub last_updated: DateTime<Utc>,
    pub brand_identity: BrandIdentity,
    pub voice_and_tone: VoiceAndTone,
    #[serde(default)]
    pub compliance_rules: ComplianceRules,
    #[serde(default)]
    pub visual_guidelines: VisualGuidelines,
    #[serde(default)]
    pub platform_specific_rules: Vec<PlatformRule>,
}

impl BrandPlaybook {
    /// Returns the platform-specific rule block for `platform`, if any.
    #[must_use]
    pub fn platform_rule(&self, platform: Platform) -> Option<&PlatformRule> {
        self.platform_specific_rules
            .iter()
            .find(|rule| rule.platform == platform)
    }
}
