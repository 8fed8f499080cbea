//! Human-readable explanations of evaluation results.
//!
//! A [`Narrator`] turns a canonical record and its [`EvaluationResult`] into
//! prose. It never changes the decision. [`TemplateNarrator`] is the built-in,
//! deterministic implementation; other backends plug in behind the same trait.

use std::fmt::Write as _;

use thiserror::Error;

use crate::core::canonical::CanonicalRecord;
use crate::screening::confidence::is_uncertain;
use crate::screening::engine::EvaluationResult;
use crate::vocabulary::config::ConfidenceSettings;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("Record '{record}' does not match result for '{result}'")]
    RecordMismatch { record: String, result: String },

    #[error("Failed to format narrative: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Produces an explanation for one evaluated record
pub trait Narrator: Send + Sync {
    /// # Errors
    ///
    /// Returns a `NarrativeError` if the record and result disagree or the
    /// backend cannot produce text.
    fn narrate(
        &self,
        record: &CanonicalRecord,
        result: &EvaluationResult,
    ) -> Result<String, NarrativeError>;
}

/// Fixed-template narrator
#[derive(Debug, Clone)]
pub struct TemplateNarrator {
    confidence: ConfidenceSettings,
    max_title_chars: usize,
}

impl TemplateNarrator {
    #[must_use]
    pub fn new(confidence: ConfidenceSettings) -> Self {
        Self {
            confidence,
            max_title_chars: 80,
        }
    }

    #[must_use]
    pub fn with_max_title_chars(mut self, max: usize) -> Self {
        self.max_title_chars = max;
        self
    }

    fn title(&self, record: &CanonicalRecord) -> Option<String> {
        let text = &record.title.as_ref()?.text;
        if text.chars().count() <= self.max_title_chars {
            Some(text.clone())
        } else {
            let cut: String = text.chars().take(self.max_title_chars).collect();
            Some(format!("{}...", cut.trim_end()))
        }
    }
}

impl Narrator for TemplateNarrator {
    fn narrate(
        &self,
        record: &CanonicalRecord,
        result: &EvaluationResult,
    ) -> Result<String, NarrativeError> {
        if record.record_id != result.record_id {
            return Err(NarrativeError::RecordMismatch {
                record: record.record_id.clone().unwrap_or_default(),
                result: result.record_id.clone().unwrap_or_default(),
            });
        }

        let id = result.record_id.as_deref().unwrap_or("record");
        let mut out = String::new();

        let verdict = if result.mandatory_passed {
            "retained"
        } else {
            "rejected"
        };
        write!(
            out,
            "{id} ({}) is {verdict} with grade {} (score {:.2}",
            result.source, result.grade, result.aggregate_score
        )?;
        if result.mandatory_passed {
            write!(out, ", optional {:.2}", result.optional_contribution)?;
        }
        writeln!(out, ").")?;

        if let Some(title) = self.title(record) {
            writeln!(out, "Title: \"{title}\".")?;
        }

        let failed: Vec<_> = result.mandatory.iter().filter(|o| !o.passed).collect();
        if failed.is_empty() {
            writeln!(out, "All evaluated mandatory criteria passed.")?;
        } else {
            for outcome in failed {
                writeln!(out, "Failed {}: {}.", outcome.criterion, outcome.reason)?;
            }
        }

        let credited: Vec<String> = result
            .optional
            .iter()
            .filter(|o| o.score > 0)
            .map(|o| format!("{} ({})", o.criterion, o.score))
            .collect();
        if !credited.is_empty() {
            writeln!(out, "Optional credit: {}.", credited.join(", "))?;
        }

        let uncertain: Vec<String> = result
            .outcomes()
            .filter(|o| is_uncertain(&self.confidence, o.confidence))
            .map(|o| format!("{} ({:.2})", o.criterion, o.confidence))
            .collect();
        if !uncertain.is_empty() {
            writeln!(out, "Low confidence: {}; manual review suggested.", uncertain.join(", "))?;
        }

        Ok(out.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RawRecord;
    use crate::screening::engine::{EvaluationMode, Evaluator};
    use crate::vocabulary::config::ScreeningConfig;

    fn eligible() -> RawRecord {
        RawRecord::new()
            .with("gse", "GSE123456")
            .with("organism", "Homo sapiens")
            .with("gse_title", "RNA-seq of brain tissue")
            .with("disease", "normal")
            .with("library_strategy", "10x scRNA-seq")
    }

    fn narrate(raw: &RawRecord, mode: EvaluationMode) -> String {
        let evaluator = Evaluator::new(&ScreeningConfig::load_embedded().unwrap())
            .unwrap()
            .with_mode(mode);
        let result = evaluator.evaluate(raw);
        let record = CanonicalRecord::from_raw(raw);
        TemplateNarrator::new(evaluator.vocabulary().confidence.clone())
            .narrate(&record, &result)
            .unwrap()
    }

    #[test]
    fn test_retained_record() {
        let text = narrate(&eligible(), EvaluationMode::ShortCircuit);
        assert!(text.starts_with("GSE123456 (GEO) is retained with grade"));
        assert!(text.contains("Title: \"rna-seq of brain tissue\"."));
        assert!(text.contains("All evaluated mandatory criteria passed."));
    }

    #[test]
    fn test_rejected_record_names_failure() {
        let raw = eligible().with("gse_title", "HeLa cells RNA-seq of brain tissue");
        let text = narrate(&raw, EvaluationMode::FullAudit);
        assert!(text.contains("is rejected with grade E"));
        assert!(text.contains("Failed cell_line:"));
        assert!(!text.contains("Failed species"));
    }

    #[test]
    fn test_long_title_is_truncated() {
        let raw = eligible().with("gse_title", "brain ".repeat(40));
        let evaluator = Evaluator::new(&ScreeningConfig::load_embedded().unwrap()).unwrap();
        let result = evaluator.evaluate(&raw);
        let text = TemplateNarrator::new(evaluator.vocabulary().confidence.clone())
            .with_max_title_chars(10)
            .narrate(&CanonicalRecord::from_raw(&raw), &result)
            .unwrap();
        assert!(text.contains("Title: \"brain brai...\"."));
    }

    #[test]
    fn test_mismatched_record_is_error() {
        let evaluator = Evaluator::new(&ScreeningConfig::load_embedded().unwrap()).unwrap();
        let result = evaluator.evaluate(&eligible());
        let other = CanonicalRecord::from_raw(&RawRecord::new().with("gse", "GSE1"));
        let err = TemplateNarrator::new(evaluator.vocabulary().confidence.clone())
            .narrate(&other, &result)
            .unwrap_err();
        assert!(matches!(err, NarrativeError::RecordMismatch { .. }));
    }
}
