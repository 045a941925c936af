use brandops_core::playbook::VoiceAndTone;
use serde::{Deserialize, Serialize};

use crate::lexicon::{contains_phrase, is_shouting, lexicon_score};

const BASELINE: f64 = 0.7;
const PREFERRED_BONUS: f64 = 0.1;
const PREFERRED_BONUS_CAP: f64 = 0.3;
const AVOIDED_PENALTY: f64 = 0.2;
const NEGATIVE_ON_POSITIVE_VOICE: f64 = 0.2;
const SHOUTING_PENALTY: f64 = 0.1;

/// Primary tones that a negative-sentiment message contradicts.
const POSITIVE_TONES: &[&str] = &[
    "friendly",
    "warm",
    "positive",
    "enthusiastic",
    "playful",
    "cheerful",
    "upbeat",
    "encouraging",
    "optimistic",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneAnalysis {
    pub score: f64,
    pub detected_tone: String,
    pub matched_preferred: Vec<String>,
    pub matched_avoided: Vec<String>,
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn analyze(text: &str, lower: &str, voice: &VoiceAndTone) -> ToneAnalysis {
    let matched_preferred: Vec<String> = voice
        .do_use
        .iter()
        .filter(|p| contains_phrase(lower, p))
        .cloned()
        .collect();
    let matched_avoided: Vec<String> = voice
        .dont_use
        .iter()
        .filter(|p| contains_phrase(lower, p))
        .cloned()
        .collect();

    let sentiment = lexicon_score(text);
    let shouting = is_shouting(text);
    let positive_voice = {
        let tone = voice.primary_tone.to_lowercase();
        POSITIVE_TONES.iter().any(|t| tone.contains(t))
    };

    let mut score = BASELINE
        + (PREFERRED_BONUS * matched_preferred.len() as f64).min(PREFERRED_BONUS_CAP)
        - AVOIDED_PENALTY * matched_avoided.len() as f64;
    if sentiment < -0.1 && positive_voice {
        score -= NEGATIVE_ON_POSITIVE_VOICE;
    }
    if shouting {
        score -= SHOUTING_PENALTY;
    }

    let detected_tone = if shouting {
        "aggressive".to_string()
    } else if sentiment < -0.1 {
        "negative".to_string()
    } else if !matched_preferred.is_empty() && !voice.primary_tone.is_empty() {
        voice.primary_tone.to_lowercase()
    } else if sentiment > 0.1 {
        "positive".to_string()
    } else {
        "neutral".to_string()
    };

    ToneAnalysis {
        score: score.clamp(0.0, 1.0),
        detected_tone,
        matched_preferred,
        matched_avoided,
    }
}
