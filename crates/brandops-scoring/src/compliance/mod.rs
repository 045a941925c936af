//! Compliance validation of event or response text against a brand playbook.

mod tone;

use brandops_core::playbook::{ContentRestriction, RequiredDisclosure};
use brandops_core::{AppConfig, BrandPlaybook, Platform, RuleSeverity, SocialEvent};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::lexicon::contains_phrase;

pub use tone::ToneAnalysis;

const TONE_WEIGHT: f64 = 0.3;
const RULE_WEIGHT: f64 = 1.0 - TONE_WEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    ForbiddenClaim,
    MissingDisclosure,
    RegulatoryViolation,
    ContentRestriction,
}

impl ViolationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationType::ForbiddenClaim => "forbidden_claim",
            ViolationType::MissingDisclosure => "missing_disclosure",
            ViolationType::RegulatoryViolation => "regulatory_violation",
            ViolationType::ContentRestriction => "content_restriction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceViolation {
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub severity: RuleSeverity,
    pub description: String,
    pub confidence: f64,
    pub detected_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningType {
    DiscouragedPhrase,
    LengthExceeded,
    HashtagLimitExceeded,
}

/// Non-blocking finding. Warnings never make a result non-compliant on
/// their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceWarning {
    #[serde(rename = "type")]
    pub warning_type: WarningType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub is_compliant: bool,
    pub overall_score: f64,
    pub violations: Vec<ComplianceViolation>,
    pub warnings: Vec<ComplianceWarning>,
    pub tone_analysis: ToneAnalysis,
}

impl ComplianceResult {
    #[must_use]
    pub fn violation_types(&self) -> Vec<&'static str> {
        self.violations
            .iter()
            .map(|v| v.violation_type.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplianceConfig {
    /// Minimum overall score for a compliant result.
    pub min_score: f64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self { min_score: 0.7 }
    }
}

impl ComplianceConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_score: config.compliance_min_score.clamp(0.0, 1.0),
        }
    }
}

/// Score deducted from the rule component per violation.
#[must_use]
pub fn severity_penalty(severity: RuleSeverity) -> f64 {
    match severity {
        RuleSeverity::Critical => 0.5,
        RuleSeverity::High => 0.3,
        RuleSeverity::Medium => 0.15,
        RuleSeverity::Low => 0.05,
    }
}

/// Pure, deterministic compliance checks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComplianceValidationService {
    config: ComplianceConfig,
}

impl ComplianceValidationService {
    #[must_use]
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    /// Validates the text of an inbound event.
    #[must_use]
    pub fn validate_compliance(
        &self,
        event: &SocialEvent,
        playbook: &BrandPlaybook,
    ) -> ComplianceResult {
        self.validate_text(&event.content.text, event.platform, playbook)
    }

    /// Validates arbitrary text, typically a proposed response, as if posted
    /// on `platform`.
    #[must_use]
    pub fn validate_text(
        &self,
        text: &str,
        platform: Platform,
        playbook: &BrandPlaybook,
    ) -> ComplianceResult {
        let lower = text.to_lowercase();
        let rules = &playbook.compliance_rules;

        let mut violations = Vec::new();
        forbidden_claims(&lower, &rules.forbidden_claims, &mut violations);
        for rule in &rules.required_disclosures {
            missing_disclosure(&lower, platform, rule, &mut violations);
        }
        for rule in &rules.regulatory_compliance {
            for term in rule
                .prohibited_terms
                .iter()
                .filter(|t| contains_phrase(&lower, t))
            {
                violations.push(ComplianceViolation {
                    violation_type: ViolationType::RegulatoryViolation,
                    severity: rule.severity,
                    description: format!(
                        "{} {}: {}",
                        rule.framework, rule.rule_id, rule.description
                    ),
                    confidence: 0.9,
                    detected_text: term.clone(),
                });
            }
        }
        for rule in &rules.content_restrictions {
            content_restriction(text, &lower, platform, rule, &mut violations);
        }

        let warnings = warnings(text, &lower, platform, playbook);
        let tone_analysis = tone::analyze(text, &lower, &playbook.voice_and_tone);

        let penalty: f64 = violations.iter().map(|v| severity_penalty(v.severity)).sum();
        let rule_score = (1.0 - penalty).max(0.0);
        let overall_score =
            (RULE_WEIGHT * rule_score + TONE_WEIGHT * tone_analysis.score).clamp(0.0, 1.0);
        let is_compliant = violations.is_empty() && overall_score >= self.config.min_score;

        if !violations.is_empty() {
            tracing::debug!(
                brand_id = %playbook.brand_id,
                violations = violations.len(),
                overall_score,
                "compliance violations detected"
            );
        }

        ComplianceResult {
            is_compliant,
            overall_score,
            violations,
            warnings,
            tone_analysis,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule checks
// ---------------------------------------------------------------------------

fn applies_to(platforms: &[Platform], platform: Platform) -> bool {
    platforms.is_empty() || platforms.contains(&platform)
}

fn forbidden_claims(lower: &str, claims: &[String], out: &mut Vec<ComplianceViolation>) {
    for claim in claims.iter().filter(|c| contains_phrase(lower, c)) {
        out.push(ComplianceViolation {
            violation_type: ViolationType::ForbiddenClaim,
            severity: RuleSeverity::High,
            description: format!("text makes the forbidden claim \"{claim}\""),
            confidence: 0.95,
            detected_text: claim.clone(),
        });
    }
}

fn missing_disclosure(
    lower: &str,
    platform: Platform,
    rule: &RequiredDisclosure,
    out: &mut Vec<ComplianceViolation>,
) {
    if !applies_to(&rule.platforms, platform) || contains_phrase(lower, &rule.disclosure) {
        return;
    }
    if let Some(trigger) = rule
        .trigger_phrases
        .iter()
        .find(|t| contains_phrase(lower, t))
    {
        out.push(ComplianceViolation {
            violation_type: ViolationType::MissingDisclosure,
            severity: RuleSeverity::Medium,
            description: format!(
                "\"{trigger}\" requires the disclosure \"{}\"",
                rule.disclosure
            ),
            confidence: 0.8,
            detected_text: trigger.clone(),
        });
    }
}

fn content_restriction(
    text: &str,
    lower: &str,
    platform: Platform,
    rule: &ContentRestriction,
    out: &mut Vec<ComplianceViolation>,
) {
    if !applies_to(&rule.platforms, platform) {
        return;
    }
    for term in rule
        .restricted_terms
        .iter()
        .filter(|t| contains_phrase(lower, t))
    {
        out.push(ComplianceViolation {
            violation_type: ViolationType::ContentRestriction,
            severity: rule.severity,
            description: format!("{}: {}", rule.category, rule.description),
            confidence: 0.85,
            detected_text: term.clone(),
        });
    }

    let Some(pattern) = rule.pattern.as_deref() else {
        return;
    };
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => {
            if let Some(found) = re.find(text) {
                out.push(ComplianceViolation {
                    violation_type: ViolationType::ContentRestriction,
                    severity: rule.severity,
                    description: format!("{}: {}", rule.category, rule.description),
                    confidence: 0.75,
                    detected_text: found.as_str().to_string(),
                });
            }
        }
        Err(e) => {
            tracing::warn!(
                category = %rule.category,
                pattern,
                error = %e,
                "skipping content restriction with invalid pattern"
            );
        }
    }
}

fn warnings(
    text: &str,
    lower: &str,
    platform: Platform,
    playbook: &BrandPlaybook,
) -> Vec<ComplianceWarning> {
    let mut out: Vec<ComplianceWarning> = playbook
        .voice_and_tone
        .dont_use
        .iter()
        .filter(|p| contains_phrase(lower, p))
        .map(|phrase| ComplianceWarning {
            warning_type: WarningType::DiscouragedPhrase,
            message: format!("uses discouraged phrase \"{phrase}\""),
        })
        .collect();

    if let Some(rule) = playbook.platform_rule(platform) {
        let length = text.chars().count();
        if let Some(max) = rule.max_length.filter(|max| length > *max) {
            out.push(ComplianceWarning {
                warning_type: WarningType::LengthExceeded,
                message: format!("{length} characters exceeds the {platform} limit of {max}"),
            });
        }
        let hashtags = text
            .split_whitespace()
            .filter(|w| w.starts_with('#') && w.len() > 1)
            .count();
        if let Some(limit) = rule.hashtag_limit.filter(|limit| hashtags > *limit) {
            out.push(ComplianceWarning {
                warning_type: WarningType::HashtagLimitExceeded,
                message: format!("{hashtags} hashtags exceeds the {platform} limit of {limit}"),
            });
        }
    }
    out
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
