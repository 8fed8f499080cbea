//! Confidence estimation.
//!
//! Confidence is a weighted sum of four factors, each in [0, 1]:
//!
//! - **presence**: fields present / fields considered
//! - **quality**: decisive value is long enough and not a placeholder
//! - **strength**: [`MatchStrength::factor`](crate::core::types::MatchStrength::factor)
//! - **context**: evidence corroborated by a second source
//!
//! The factor fractions come from configuration and are normalized to sum to
//! 1.0, so the result always lies in [0, 1].

use crate::screening::outcome::Evidence;
use crate::utils::validation::count_to_f64;
use crate::vocabulary::compiled::CompiledVocabulary;
use crate::vocabulary::config::ConfidenceSettings;

/// Estimate confidence for a piece of evidence
#[must_use]
pub fn estimate(settings: &ConfidenceSettings, evidence: &Evidence) -> f64 {
    let presence = if evidence.fields_considered == 0 {
        0.0
    } else {
        count_to_f64(evidence.fields_present.min(evidence.fields_considered))
            / count_to_f64(evidence.fields_considered)
    };
    let quality = if evidence.quality_ok { 1.0 } else { 0.0 };
    let context = if evidence.corroborated { 1.0 } else { 0.0 };

    let score = settings.presence * presence
        + settings.quality * quality
        + settings.strength * evidence.strength.factor()
        + settings.context * context;

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Quality check for the decisive value of a criterion
#[must_use]
pub fn quality_ok(vocab: &CompiledVocabulary, value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        v.chars().count() >= vocab.confidence.min_quality_length && !vocab.is_placeholder(v)
    })
}

/// True when `confidence` falls below the review threshold
#[must_use]
pub fn is_uncertain(settings: &ConfidenceSettings, confidence: f64) -> bool {
    confidence < settings.review_threshold
}
