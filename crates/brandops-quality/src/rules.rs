//! Built-in data quality rules for inbound social events.

use std::sync::{Arc, LazyLock};

use brandops_core::{ContentType, Platform, RuleSeverity, SocialEvent};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::issue::IssueType;
use crate::RuleError;

/// Evaluation inputs shared by every rule for one event.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub now: DateTime<Utc>,
}

/// Returns `Ok(true)` when the event passes.
pub type RuleCondition =
    Arc<dyn Fn(&SocialEvent, &RuleContext) -> Result<bool, RuleError> + Send + Sync>;

pub type RuleMessage = Arc<dyn Fn(&SocialEvent) -> String + Send + Sync>;

#[derive(Clone)]
pub struct QualityRule {
    pub id: String,
    pub issue_type: IssueType,
    pub severity: RuleSeverity,
    pub enabled: bool,
    /// Platforms the rule runs for; empty means all.
    pub platforms: Vec<Platform>,
    pub condition: RuleCondition,
    pub message: RuleMessage,
}

impl std::fmt::Debug for QualityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityRule")
            .field("id", &self.id)
            .field("issue_type", &self.issue_type)
            .field("severity", &self.severity)
            .field("enabled", &self.enabled)
            .field("platforms", &self.platforms)
            .finish_non_exhaustive()
    }
}

impl QualityRule {
    pub fn new<C, M>(
        id: impl Into<String>,
        issue_type: IssueType,
        severity: RuleSeverity,
        condition: C,
        message: M,
    ) -> Self
    where
        C: Fn(&SocialEvent, &RuleContext) -> Result<bool, RuleError> + Send + Sync + 'static,
        M: Fn(&SocialEvent) -> String + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            issue_type,
            severity,
            enabled: true,
            platforms: Vec::new(),
            condition: Arc::new(condition),
            message: Arc::new(message),
        }
    }

    #[must_use]
    pub fn for_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.platforms = platforms.into_iter().collect();
        self
    }

    #[must_use]
    pub fn applies_to(&self, platform: Platform) -> bool {
        self.enabled && (self.platforms.is_empty() || self.platforms.contains(&platform))
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

const MAX_PAST: Duration = Duration::days(365);
const MAX_FUTURE: Duration = Duration::hours(1);
const MAX_REPEATED_RUN: usize = 10;
const MAX_URLS: usize = 3;
const MAX_SPECIAL_CHAR_RATIO: f64 = 0.3;
const MIN_LEN_FOR_RATIO: usize = 20;

const SPAM_PHRASES: &[&str] = &[
    "buy now",
    "click here",
    "free money",
    "limited time offer",
    "dm for promo",
    "follow for follow",
    "earn $",
    "crypto giveaway",
];

/// Maximum text length accepted per platform, in characters.
#[must_use]
pub fn max_content_length(platform: Platform) -> usize {
    match platform {
        Platform::Twitter => 280,
        Platform::Instagram | Platform::Tiktok => 2_200,
        Platform::Facebook => 63_206,
        Platform::Linkedin => 3_000,
        Platform::Youtube => 10_000,
        Platform::Reddit => 40_000,
    }
}

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhttps?://\S+").expect("valid url regex"));

static NUMERIC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,20}$").expect("valid numeric id regex"));

static COMPOUND_NUMERIC_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,20}(_\d{1,20})?$").expect("valid compound id regex"));

static YOUTUBE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11,}$").expect("valid youtube id regex"));

static LINKEDIN_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(urn:li:[A-Za-z]+:[A-Za-z0-9_-]+|\d{1,20})$").expect("valid linkedin id regex")
});

static REDDIT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(t[1-6]_)?[a-z0-9]{1,16}$").expect("valid reddit id regex"));

/// Whether `id` has the shape `platform` issues for its content ids.
#[must_use]
pub fn platform_id_is_valid(platform: Platform, id: &str) -> bool {
    let re: &Regex = match platform {
        Platform::Twitter | Platform::Tiktok => &NUMERIC_ID_RE,
        Platform::Instagram | Platform::Facebook => &COMPOUND_NUMERIC_ID_RE,
        Platform::Youtube => &YOUTUBE_ID_RE,
        Platform::Linkedin => &LINKEDIN_ID_RE,
        Platform::Reddit => &REDDIT_ID_RE,
    };
    re.is_match(id)
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

fn missing_fields(event: &SocialEvent) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if event.id.trim().is_empty() {
        missing.push("id");
    }
    if event.platform_event_id.trim().is_empty() {
        missing.push("platformEventId");
    }
    if event.content.text.trim().is_empty() && event.content.media_urls.is_empty() {
        missing.push("content");
    }
    missing
}

fn longest_repeated_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for c in text.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

#[allow(clippy::cast_precision_loss)]
fn special_char_ratio(text: &str) -> f64 {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.len() < MIN_LEN_FOR_RATIO {
        return 0.0;
    }
    let special = visible
        .iter()
        .filter(|c| !c.is_alphanumeric() && !matches!(c, '.' | ',' | '!' | '?' | '\'' | '#' | '@'))
        .count();
    special as f64 / visible.len() as f64
}

/// Every heuristic that flags `text`, as short descriptions.
fn suspicious_signals(text: &str) -> Vec<String> {
    let mut signals = Vec::new();
    let run = longest_repeated_run(text);
    if run >= MAX_REPEATED_RUN {
        signals.push(format!("{run} repeated characters"));
    }
    let urls = URL_RE.find_iter(text).count();
    if urls > MAX_URLS {
        signals.push(format!("{urls} links"));
    }
    let lower = text.to_lowercase();
    let spam: Vec<&str> = SPAM_PHRASES
        .iter()
        .copied()
        .filter(|p| lower.contains(p))
        .collect();
    if !spam.is_empty() {
        signals.push(format!("spam phrases ({})", spam.join(", ")));
    }
    let ratio = special_char_ratio(text);
    if ratio > MAX_SPECIAL_CHAR_RATIO {
        signals.push(format!("{:.0}% special characters", ratio * 100.0));
    }
    signals
}

/// The rule set every monitor starts with.
#[must_use]
pub fn builtin_rules() -> Vec<QualityRule> {
    vec![
        QualityRule::new(
            "required_fields",
            IssueType::MissingRequiredField,
            RuleSeverity::High,
            |event, _| Ok(missing_fields(event).is_empty()),
            |event| format!("missing required fields: {}", missing_fields(event).join(", ")),
        ),
        QualityRule::new(
            "content_length",
            IssueType::InvalidContentLength,
            RuleSeverity::Medium,
            |event, _| {
                let len = event.content.text.chars().count();
                let empty_text = event.content_type == ContentType::Text
                    && event.content.text.trim().is_empty();
                Ok(!empty_text && len <= max_content_length(event.platform))
            },
            |event| {
                format!(
                    "content length {} outside 1..={} for {}",
                    event.content.text.chars().count(),
                    max_content_length(event.platform),
                    event.platform
                )
            },
        ),
        QualityRule::new(
            "timestamp_range",
            IssueType::InvalidTimestamp,
            RuleSeverity::High,
            |event, ctx| {
                Ok(event.timestamp > ctx.now - MAX_PAST && event.timestamp < ctx.now + MAX_FUTURE)
            },
            |event| {
                format!(
                    "timestamp {} is more than a year old or in the future",
                    event.timestamp.to_rfc3339()
                )
            },
        ),
        QualityRule::new(
            "engagement_non_negative",
            IssueType::InvalidEngagement,
            RuleSeverity::High,
            |event, _| {
                let e = event.engagement;
                Ok(e.likes >= 0 && e.shares >= 0 && e.comments >= 0 && e.views >= 0)
            },
            |event| format!("negative engagement counters: {:?}", event.engagement),
        ),
        QualityRule::new(
            "engagement_ratio",
            IssueType::UnrealisticEngagement,
            RuleSeverity::Medium,
            |event, _| {
                let e = event.engagement;
                if e.likes < 0 || e.shares < 0 || e.views < 0 {
                    return Ok(true);
                }
                let likes_ok = e.views == 0 || e.likes <= e.views;
                let shares_ok = e.shares <= e.likes.saturating_mul(2);
                Ok(likes_ok && shares_ok)
            },
            |event| {
                let e = event.engagement;
                format!(
                    "unrealistic engagement: {} likes, {} shares, {} views",
                    e.likes, e.shares, e.views
                )
            },
        ),
        QualityRule::new(
            "author_info",
            IssueType::MissingAuthorInfo,
            RuleSeverity::Medium,
            |event, _| {
                Ok(!event.author.id.trim().is_empty() && !event.author.username.trim().is_empty())
            },
            |_| "author id or username is missing".to_string(),
        ),
        QualityRule::new(
            "platform_id_format",
            IssueType::InvalidPlatformId,
            RuleSeverity::Medium,
            |event, _| {
                Ok(event.platform_event_id.is_empty()
                    || platform_id_is_valid(event.platform, &event.platform_event_id))
            },
            |event| {
                format!(
                    "'{}' is not a valid {} id",
                    event.platform_event_id, event.platform
                )
            },
        ),
        QualityRule::new(
            "suspicious_content",
            IssueType::SuspiciousContent,
            RuleSeverity::Low,
            |event, _| Ok(suspicious_signals(&event.content.text).is_empty()),
            |event| {
                format!(
                    "suspicious content: {}",
                    suspicious_signals(&event.content.text).join("; ")
                )
            },
        ),
    ]
}
