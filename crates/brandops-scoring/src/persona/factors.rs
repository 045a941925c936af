//! Component scores for persona matching. Every score is in `[0.0, 1.0]`.

use brandops_core::persona::ActivityLevel;
use brandops_core::{Persona, SocialEvent};
use chrono::{Datelike, Timelike};

use crate::lexicon::contains_phrase;

/// A component score plus an optional human-readable reason.
pub(crate) struct Factor {
    pub score: f64,
    pub reason: Option<String>,
}

impl Factor {
    fn new(score: f64, reason: Option<String>) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            reason,
        }
    }
}

const KEYWORD_SATURATION: f64 = 3.0;
const TRIGGER_SATURATION: f64 = 2.0;

#[allow(clippy::cast_precision_loss)]
pub(crate) fn content(event: &SocialEvent, persona: &Persona, sentiment: f64) -> Factor {
    let mut haystack = event.content.text.to_lowercase();
    for tag in &event.content.hashtags {
        haystack.push(' ');
        haystack.push_str(&tag.to_lowercase());
    }

    let keywords: Vec<&str> = persona
        .keywords()
        .filter(|k| contains_phrase(&haystack, k))
        .collect();
    let keyword_score = (keywords.len() as f64 / KEYWORD_SATURATION).min(1.0);

    let positive = persona
        .triggers
        .positive
        .iter()
        .filter(|t| contains_phrase(&haystack, t))
        .count();
    let negative = persona
        .triggers
        .negative
        .iter()
        .filter(|t| contains_phrase(&haystack, t))
        .count();
    let trigger_score = ((positive + negative) as f64 / TRIGGER_SATURATION).min(1.0);

    let alignment = if (positive > 0 && sentiment > 0.0) || (negative > 0 && sentiment < 0.0) {
        1.0
    } else if positive + negative == 0 {
        0.5
    } else {
        0.25
    };

    let language = language_fit(event, persona).unwrap_or(0.5);

    let score = 0.4 * keyword_score + 0.25 * trigger_score + 0.15 * alignment + 0.2 * language;

    let mut parts = Vec::new();
    if !keywords.is_empty() {
        parts.push(format!("mentions {}", keywords.join(", ")));
    }
    if positive > 0 {
        parts.push(format!("{positive} positive trigger(s)"));
    }
    if negative > 0 {
        parts.push(format!("{negative} negative trigger(s)"));
    }
    let reason = (!parts.is_empty()).then(|| format!("content {}", parts.join("; ")));
    Factor::new(score, reason)
}

pub(crate) fn platform(event: &SocialEvent, persona: &Persona) -> Factor {
    let prefs = &persona.platform_preferences;
    if prefs.primary.is_empty() && prefs.secondary.is_empty() {
        return Factor::new(0.3, None);
    }
    if let Some(rank) = prefs.primary.iter().position(|p| *p == event.platform) {
        let rank = u32::try_from(rank).unwrap_or(u32::MAX);
        let score = (1.0 - 0.1 * f64::from(rank)).max(0.6);
        return Factor::new(
            score,
            Some(format!("{} is a primary platform", event.platform)),
        );
    }
    if prefs.secondary.contains(&event.platform) {
        return Factor::new(
            0.4,
            Some(format!("{} is a secondary platform", event.platform)),
        );
    }
    Factor::new(0.1, None)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn demographic(event: &SocialEvent, persona: &Persona) -> Factor {
    let demo = &persona.demographics;
    let mut checks: Vec<f64> = Vec::new();
    let mut reasons = Vec::new();

    if let Some(fit) = language_fit(event, persona) {
        checks.push(fit);
        if fit >= 1.0 {
            reasons.push("language matches".to_string());
        }
    }

    if !demo.locations.is_empty() {
        if let Some(location) = &event.location {
            let places: Vec<&str> = [&location.country, &location.region, &location.city]
                .into_iter()
                .filter_map(|p| p.as_deref())
                .collect();
            if !places.is_empty() {
                let hit = places.iter().any(|place| {
                    demo.locations
                        .iter()
                        .any(|l| l.trim().eq_ignore_ascii_case(place.trim()))
                });
                checks.push(if hit { 1.0 } else { 0.0 });
                if hit {
                    reasons.push("location matches".to_string());
                }
            }
        }
    }

    let behavior = &persona.behavior_patterns;
    if behavior.min_followers.is_some() || behavior.max_followers.is_some() {
        if let Some(followers) = event.author.follower_count {
            let above = behavior.min_followers.is_none_or(|min| followers >= min);
            let below = behavior.max_followers.is_none_or(|max| followers <= max);
            let hit = above && below;
            checks.push(if hit { 1.0 } else { 0.0 });
            if hit {
                reasons.push("follower count in range".to_string());
            }
        }
    }

    if checks.is_empty() {
        return Factor::new(0.5, None);
    }
    let score = checks.iter().sum::<f64>() / checks.len() as f64;
    let reason = (!reasons.is_empty()).then(|| format!("demographics: {}", reasons.join(", ")));
    Factor::new(score, reason)
}

pub(crate) fn behavior(event: &SocialEvent, persona: &Persona) -> Factor {
    let patterns = &persona.behavior_patterns;
    let mut reasons = Vec::new();

    let interaction = if patterns.preferred_interactions.is_empty() {
        0.5
    } else if patterns.preferred_interactions.contains(&event.event_type) {
        reasons.push(format!("prefers {}", event.event_type.as_str()));
        1.0
    } else {
        0.2
    };

    let content = if patterns.content_preferences.is_empty() {
        0.5
    } else if patterns.content_preferences.contains(&event.content_type) {
        reasons.push(format!("engages with {} content", event.content_type.as_str()));
        1.0
    } else {
        0.2
    };

    let interactions = event.engagement.total_interactions();
    let activity = match patterns.activity_level {
        ActivityLevel::High if interactions >= 100 => 1.0,
        ActivityLevel::Medium if (10..=1000).contains(&interactions) => 1.0,
        ActivityLevel::Low if interactions < 100 => 1.0,
        ActivityLevel::Medium => 0.6,
        ActivityLevel::High | ActivityLevel::Low => 0.5,
    };

    let score = (interaction + content + activity) / 3.0;
    let reason = (!reasons.is_empty()).then(|| format!("behavior: {}", reasons.join(", ")));
    Factor::new(score, reason)
}

pub(crate) fn temporal(event: &SocialEvent, persona: &Persona) -> Factor {
    let patterns = &persona.behavior_patterns;
    let hour = u8::try_from(event.timestamp.hour()).unwrap_or(0);

    let (mut score, mut reason) = if patterns.active_hours.is_empty() {
        (0.5, None)
    } else if patterns.active_hours.contains(&hour) {
        (1.0, Some(format!("posted during active hour {hour:02}:00 UTC")))
    } else if patterns
        .active_hours
        .iter()
        .any(|&h| next_hour(h) == u16::from(hour) || next_hour(hour) == u16::from(h))
    {
        (0.6, Some(format!("posted next to an active hour ({hour:02}:00 UTC)")))
    } else {
        (0.2, None)
    };

    let weekday = event.timestamp.weekday();
    if !patterns.active_days.is_empty() && !patterns.active_days.contains(&weekday) {
        score *= 0.5;
        reason = reason.map(|r| format!("{r}, but {weekday} is not an active day"));
    }
    Factor::new(score, reason)
}

fn next_hour(hour: u8) -> u16 {
    (u16::from(hour) + 1) % 24
}

/// `Some(1.0)` on a language match, `Some(0.0)` on a mismatch, `None` when
/// either side has no language to compare.
fn language_fit(event: &SocialEvent, persona: &Persona) -> Option<f64> {
    let languages = &persona.demographics.languages;
    let language = event.content.language.as_deref()?;
    if languages.is_empty() {
        return None;
    }
    let hit = languages
        .iter()
        .any(|l| l.trim().eq_ignore_ascii_case(language.trim()));
    Some(if hit { 1.0 } else { 0.0 })
}
