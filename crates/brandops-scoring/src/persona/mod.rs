//! Persona matching: scores a social event against a brand's personas.

mod factors;

use brandops_core::{Persona, SocialEvent};
use serde::{Deserialize, Serialize};

use crate::lexicon::{lexicon_score, sentiment_label};
use crate::ScoringError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative weight of each component score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingWeights {
    pub content_analysis: f64,
    pub platform_preference: f64,
    pub demographic_signals: f64,
    pub behavior_patterns: f64,
    pub temporal_patterns: f64,
}

impl Default for MatchingWeights {
    fn default() -> Self {
        Self {
            content_analysis: 0.35,
            platform_preference: 0.2,
            demographic_signals: 0.15,
            behavior_patterns: 0.15,
            temporal_patterns: 0.15,
        }
    }
}

impl MatchingWeights {
    fn as_array(self) -> [(&'static str, f64); 5] {
        [
            ("content_analysis", self.content_analysis),
            ("platform_preference", self.platform_preference),
            ("demographic_signals", self.demographic_signals),
            ("behavior_patterns", self.behavior_patterns),
            ("temporal_patterns", self.temporal_patterns),
        ]
    }

    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidWeights`] if a weight is outside
    /// `[0, 1]` or the weights do not sum to 1.
    pub fn validate(&self) -> Result<(), ScoringError> {
        for (name, weight) in self.as_array() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ScoringError::InvalidWeights(format!(
                    "{name} = {weight} is outside [0, 1]"
                )));
            }
        }
        let sum: f64 = self.as_array().iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights sum to {sum}, expected 1"
            )));
        }
        Ok(())
    }
}

/// Cut-offs used to label a match. Only `minimum_match` affects whether a
/// match is returned at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceThresholds {
    pub high_confidence: f64,
    pub medium_confidence: f64,
    pub minimum_match: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high_confidence: 0.8,
            medium_confidence: 0.6,
            minimum_match: 0.3,
        }
    }
}

impl ConfidenceThresholds {
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidThresholds`] unless
    /// `0 <= minimum_match <= medium_confidence <= high_confidence <= 1`.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let ordered = 0.0 <= self.minimum_match
            && self.minimum_match <= self.medium_confidence
            && self.medium_confidence <= self.high_confidence
            && self.high_confidence <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(ScoringError::InvalidThresholds(format!(
                "expected 0 <= minimum ({}) <= medium ({}) <= high ({}) <= 1",
                self.minimum_match, self.medium_confidence, self.high_confidence
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingFactors {
    pub content_score: f64,
    pub platform_score: f64,
    pub demographic_score: f64,
    pub behavior_score: f64,
    pub temporal_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaMatch {
    pub persona: Persona,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub matching_factors: MatchingFactors,
    /// Never empty.
    pub reasoning: Vec<String>,
}

/// Deterministic weighted scorer over a brand's personas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonaMatchingEngine {
    weights: MatchingWeights,
    thresholds: ConfidenceThresholds,
}

impl Default for PersonaMatchingEngine {
    fn default() -> Self {
        Self {
            weights: MatchingWeights::default(),
            thresholds: ConfidenceThresholds::default(),
        }
    }
}

impl PersonaMatchingEngine {
    /// # Errors
    ///
    /// Returns [`ScoringError`] if the weights or thresholds are invalid.
    pub fn new(
        weights: MatchingWeights,
        thresholds: ConfidenceThresholds,
    ) -> Result<Self, ScoringError> {
        weights.validate()?;
        thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    #[must_use]
    pub fn weights(&self) -> &MatchingWeights {
        &self.weights
    }

    #[must_use]
    pub fn thresholds(&self) -> &ConfidenceThresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn confidence_level(&self, confidence: f64) -> ConfidenceLevel {
        if confidence >= self.thresholds.high_confidence {
            ConfidenceLevel::High
        } else if confidence >= self.thresholds.medium_confidence {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Scores every persona, best first. Ties on confidence fall back to
    /// ascending priority, then persona id.
    #[must_use]
    pub fn get_all_matches(&self, event: &SocialEvent, personas: &[Persona]) -> Vec<PersonaMatch> {
        let sentiment = lexicon_score(&event.content.text);
        let mut matches: Vec<PersonaMatch> = personas
            .iter()
            .map(|persona| self.score(event, persona, sentiment))
            .collect();
        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.persona.priority.cmp(&b.persona.priority))
                .then(a.persona.id.cmp(&b.persona.id))
        });
        matches
    }

    /// The best match, or `None` when it scores below `minimum_match`.
    #[must_use]
    pub fn match_persona(&self, event: &SocialEvent, personas: &[Persona]) -> Option<PersonaMatch> {
        let best = self.get_all_matches(event, personas).into_iter().next()?;
        if best.confidence >= self.thresholds.minimum_match {
            Some(best)
        } else {
            tracing::debug!(
                event_id = %event.id,
                best = best.confidence,
                minimum = self.thresholds.minimum_match,
                "no persona above minimum match"
            );
            None
        }
    }

    fn score(&self, event: &SocialEvent, persona: &Persona, sentiment: f64) -> PersonaMatch {
        let content = factors::content(event, persona, sentiment);
        let platform = factors::platform(event, persona);
        let demographic = factors::demographic(event, persona);
        let behavior = factors::behavior(event, persona);
        let temporal = factors::temporal(event, persona);

        let w = &self.weights;
        let confidence = (w.content_analysis * content.score
            + w.platform_preference * platform.score
            + w.demographic_signals * demographic.score
            + w.behavior_patterns * behavior.score
            + w.temporal_patterns * temporal.score)
            .clamp(0.0, 1.0);
        let confidence_level = self.confidence_level(confidence);

        let matching_factors = MatchingFactors {
            content_score: content.score,
            platform_score: platform.score,
            demographic_score: demographic.score,
            behavior_score: behavior.score,
            temporal_score: temporal.score,
        };

        let mut reasoning: Vec<String> = [content, platform, demographic, behavior, temporal]
            .into_iter()
            .filter_map(|f| f.reason)
            .collect();
        reasoning.push(format!("{} sentiment", sentiment_label(sentiment)));
        reasoning.push(format!(
            "{confidence_level} confidence ({confidence:.2}) for {}",
            persona.name
        ));

        PersonaMatch {
            persona: persona.clone(),
            confidence,
            confidence_level,
            matching_factors,
            reasoning,
        }
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
