use std::collections::BTreeMap;

use brandops_core::{Platform, RuleSeverity};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::issue::IssueType;

const TOP_ISSUES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformQuality {
    pub processed: u64,
    pub valid: u64,
    pub issues: u64,
}

impl PlatformQuality {
    #[must_use]
    pub fn quality_score(&self) -> f64 {
        ratio_score(self.valid, self.processed)
    }
}

/// Running counters and the scores derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub total_events_processed: u64,
    pub valid_events: u64,
    pub invalid_events: u64,
    pub total_issues: u64,
    pub unresolved_issues: u64,
    pub issues_by_type: BTreeMap<IssueType, u64>,
    pub issues_by_severity: BTreeMap<RuleSeverity, u64>,
    pub platforms: BTreeMap<Platform, PlatformQuality>,
    pub quality_score: f64,
    pub completeness_score: f64,
    pub accuracy_score: f64,
    pub consistency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub count: u64,
    /// Highest severity seen for this type.
    pub severity: RuleSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformBreakdown {
    pub platform: Platform,
    pub processed: u64,
    pub valid: u64,
    pub issues: u64,
    pub quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub summary: QualityMetrics,
    pub top_issues: Vec<IssueSummary>,
    pub platform_breakdown: Vec<PlatformBreakdown>,
    pub recommendations: Vec<String>,
}

/// `part / whole` as a percentage; 100 when nothing has been counted.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio_score(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        100.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `100 - issues / total`, floored at 0.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn dimension_score(issues: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        (100.0 - issues as f64 / total as f64 * 100.0).max(0.0)
    }
}

#[must_use]
pub fn recommendation(issue_type: IssueType, count: u64) -> String {
    let action = match issue_type {
        IssueType::MissingRequiredField => {
            "check the ingestion mapping for dropped ids and empty bodies"
        }
        IssueType::InvalidContentLength => {
            "truncate or reject content outside the platform length limits at ingestion"
        }
        IssueType::InvalidTimestamp => {
            "verify timezone handling and clock sync in the platform clients"
        }
        IssueType::InvalidEngagement => {
            "clamp engagement counters and investigate the source of negative values"
        }
        IssueType::UnrealisticEngagement => {
            "review engagement sources for bot activity or stale view counts"
        }
        IssueType::MissingAuthorInfo => {
            "request author fields from the platform API or enrich from the user endpoint"
        }
        IssueType::InvalidPlatformId => {
            "validate platform id formats in the client before normalization"
        }
        IssueType::SuspiciousContent => {
            "route suspicious content to spam review before generating responses"
        }
    };
    format!("{issue_type} ({count} occurrences): {action}")
}

pub(crate) fn build_report(
    summary: QualityMetrics,
    max_severity: &BTreeMap<IssueType, RuleSeverity>,
    generated_at: DateTime<Utc>,
) -> QualityReport {
    let mut top_issues: Vec<IssueSummary> = summary
        .issues_by_type
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(issue_type, count)| IssueSummary {
            issue_type: *issue_type,
            count: *count,
            severity: max_severity
                .get(issue_type)
                .copied()
                .unwrap_or(RuleSeverity::Low),
        })
        .collect();
    top_issues.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(b.severity.cmp(&a.severity))
            .then(a.issue_type.cmp(&b.issue_type))
    });
    top_issues.truncate(TOP_ISSUES);

    let platform_breakdown = summary
        .platforms
        .iter()
        .map(|(platform, counts)| PlatformBreakdown {
            platform: *platform,
            processed: counts.processed,
            valid: counts.valid,
            issues: counts.issues,
            quality_score: counts.quality_score(),
        })
        .collect();

    let recommendations = top_issues
        .iter()
        .map(|issue| recommendation(issue.issue_type, issue.count))
        .collect();

    QualityReport {
        generated_at,
        summary,
        top_issues,
        platform_breakdown,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_counters_score_full_marks() {
        assert_eq!(ratio_score(0, 0), 100.0);
        assert_eq!(dimension_score(0, 0), 100.0);
    }

    #[test]
    fn dimension_score_floors_at_zero() {
        assert_eq!(dimension_score(5, 2), 0.0);
        assert!((dimension_score(1, 4) - 75.0).abs() < 1e-12);
    }

    #[test]
    fn recommendations_name_the_issue_type() {
        let text = recommendation(IssueType::UnrealisticEngagement, 3);
        assert!(text.starts_with("UNREALISTIC_ENGAGEMENT (3 occurrences)"));
    }
}
