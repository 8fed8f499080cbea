use serde::{Deserialize, Serialize};

use crate::core::types::{Criterion, MatchStrength};
use crate::screening::confidence::{estimate, quality_ok};
use crate::screening::matcher::Scan;
use crate::vocabulary::compiled::CompiledVocabulary;

/// What a criterion check saw, kept for auditing and confidence estimation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub strength: MatchStrength,
    pub fields_considered: usize,
    pub fields_present: usize,
    /// Raw field name holding the decisive evidence
    pub matched_field: Option<String>,
    /// Keyword, pattern match or identifier that decided the check
    pub matched_term: Option<String>,
    /// Decisive value is long enough and not a placeholder
    pub quality_ok: bool,
    /// A second field (or a primary-tissue indicator) agrees
    pub corroborated: bool,
}

impl Evidence {
    /// Evidence from a field scan; quality and corroboration are filled in by the caller
    #[must_use]
    pub fn from_scan(scan: &Scan<'_>) -> Self {
        Self {
            strength: scan
                .hit
                .as_ref()
                .map_or(MatchStrength::None, |h| h.strength),
            fields_considered: scan.considered,
            fields_present: scan.present,
            matched_field: scan.hit.as_ref().map(|h| h.source.clone()),
            matched_term: scan.hit.as_ref().map(|h| h.term.clone()),
            quality_ok: false,
            corroborated: scan.hit_fields >= 2,
        }
    }

    /// No fields to look at
    #[must_use]
    pub fn none(fields_considered: usize) -> Self {
        Self {
            strength: MatchStrength::None,
            fields_considered,
            fields_present: 0,
            matched_field: None,
            matched_term: None,
            quality_ok: false,
            corroborated: false,
        }
    }
}

/// Outcome of one criterion for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub criterion: Criterion,
    /// Mandatory: 0 or the pass score. Optional: the graded credit.
    pub score: u32,
    pub passed: bool,
    /// Certainty of the evidence in [0, 1]; never affects `passed` or `score`
    pub confidence: f64,
    pub evidence: Evidence,
    pub reason: String,
}

impl CriterionOutcome {
    /// Finish an outcome: check quality of the decisive value and estimate confidence.
    ///
    /// `passed` is derived from `score`, so a mandatory pass must carry the
    /// (non-zero) pass score and any optional credit counts as a pass.
    #[must_use]
    pub fn conclude(
        criterion: Criterion,
        score: u32,
        mut evidence: Evidence,
        decisive: Option<&str>,
        reason: String,
        vocab: &CompiledVocabulary,
    ) -> Self {
        evidence.quality_ok = quality_ok(vocab, decisive);
        Self::with_evidence(criterion, score, evidence, reason, vocab)
    }

    /// Like [`CriterionOutcome::conclude`], with `evidence.quality_ok` already decided
    #[must_use]
    pub fn with_evidence(
        criterion: Criterion,
        score: u32,
        evidence: Evidence,
        reason: String,
        vocab: &CompiledVocabulary,
    ) -> Self {
        let confidence = estimate(&vocab.confidence, &evidence);
        Self {
            criterion,
            score,
            passed: score > 0,
            confidence,
            evidence,
            reason,
        }
    }
}
