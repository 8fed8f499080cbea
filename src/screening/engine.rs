use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::canonical::CanonicalRecord;
use crate::core::record::RawRecord;
use crate::core::types::{Criterion, CriterionKind, Grade, SourceShape};
use crate::screening::confidence::is_uncertain;
use crate::screening::outcome::CriterionOutcome;
use crate::screening::{mandatory, optional, scoring};
use crate::vocabulary::compiled::CompiledVocabulary;
use crate::vocabulary::config::{ScreeningConfig, VocabularyError};

/// How much of a record to evaluate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Stop at the first failing mandatory criterion
    #[default]
    ShortCircuit,
    /// Evaluate every criterion regardless of failures
    FullAudit,
}

/// Mandatory outcomes by criterion; `None` means skipped after an earlier failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MandatoryOutcomes {
    pub database_id: Option<CriterionOutcome>,
    pub species: Option<CriterionOutcome>,
    pub cell_line: Option<CriterionOutcome>,
    pub tumor_annotation: Option<CriterionOutcome>,
    pub sequencing_method: Option<CriterionOutcome>,
    pub tissue_source: Option<CriterionOutcome>,
}

impl MandatoryOutcomes {
    fn slot(&mut self, criterion: Criterion) -> Option<&mut Option<CriterionOutcome>> {
        match criterion {
            Criterion::DatabaseId => Some(&mut self.database_id),
            Criterion::Species => Some(&mut self.species),
            Criterion::CellLine => Some(&mut self.cell_line),
            Criterion::TumorAnnotation => Some(&mut self.tumor_annotation),
            Criterion::SequencingMethod => Some(&mut self.sequencing_method),
            Criterion::TissueSource => Some(&mut self.tissue_source),
            Criterion::Publication | Criterion::SampleSize | Criterion::Country | Criterion::Age => {
                None
            }
        }
    }

    /// Evaluated outcomes in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &CriterionOutcome> {
        [
            &self.database_id,
            &self.species,
            &self.cell_line,
            &self.tumor_annotation,
            &self.sequencing_method,
            &self.tissue_source,
        ]
        .into_iter()
        .flatten()
    }

    #[must_use]
    pub fn get(&self, criterion: Criterion) -> Option<&CriterionOutcome> {
        self.iter().find(|o| o.criterion == criterion)
    }
}

/// Optional outcomes by criterion; `None` means not evaluated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionalOutcomes {
    pub publication: Option<CriterionOutcome>,
    pub sample_size: Option<CriterionOutcome>,
    pub country: Option<CriterionOutcome>,
    pub age: Option<CriterionOutcome>,
}

impl OptionalOutcomes {
    fn slot(&mut self, criterion: Criterion) -> Option<&mut Option<CriterionOutcome>> {
        match criterion {
            Criterion::Publication => Some(&mut self.publication),
            Criterion::SampleSize => Some(&mut self.sample_size),
            Criterion::Country => Some(&mut self.country),
            Criterion::Age => Some(&mut self.age),
            Criterion::DatabaseId
            | Criterion::Species
            | Criterion::CellLine
            | Criterion::TumorAnnotation
            | Criterion::SequencingMethod
            | Criterion::TissueSource => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CriterionOutcome> {
        [&self.publication, &self.sample_size, &self.country, &self.age]
            .into_iter()
            .flatten()
    }

    #[must_use]
    pub fn get(&self, criterion: Criterion) -> Option<&CriterionOutcome> {
        self.iter().find(|o| o.criterion == criterion)
    }
}

/// Full, auditable evaluation of one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Position of the record in its input
    pub index: usize,
    pub record_id: Option<String>,
    pub source: SourceShape,
    pub mode: EvaluationMode,
    pub mandatory: MandatoryOutcomes,
    pub optional: OptionalOutcomes,
    pub mandatory_passed: bool,
    pub aggregate_score: f64,
    pub optional_contribution: f64,
    pub grade: Grade,
    /// Some evaluated criterion has confidence below the review threshold
    pub needs_review: bool,
    /// One line per evaluated criterion, in evaluation order
    pub reasons: Vec<String>,
}

impl EvaluationResult {
    /// Every evaluated outcome, mandatory first, in evaluation order
    pub fn outcomes(&self) -> impl Iterator<Item = &CriterionOutcome> {
        self.mandatory.iter().chain(self.optional.iter())
    }

    #[must_use]
    pub fn outcome(&self, criterion: Criterion) -> Option<&CriterionOutcome> {
        match criterion.kind() {
            CriterionKind::Mandatory => self.mandatory.get(criterion),
            CriterionKind::Optional => self.optional.get(criterion),
        }
    }

    /// Pass/fail of each evaluated mandatory criterion
    #[must_use]
    pub fn mandatory_pass_map(&self) -> BTreeMap<Criterion, bool> {
        self.mandatory.iter().map(|o| (o.criterion, o.passed)).collect()
    }

    /// Graded credit of each evaluated optional criterion
    #[must_use]
    pub fn optional_score_map(&self) -> BTreeMap<Criterion, u32> {
        self.optional.iter().map(|o| (o.criterion, o.score)).collect()
    }

    /// Confidence of every evaluated criterion
    #[must_use]
    pub fn confidence_map(&self) -> BTreeMap<Criterion, f64> {
        self.outcomes().map(|o| (o.criterion, o.confidence)).collect()
    }

    /// Mandatory criteria that were evaluated and failed
    pub fn failed_criteria(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.mandatory.iter().filter(|o| !o.passed).map(|o| o.criterion)
    }
}

fn evaluate_criterion(
    criterion: Criterion,
    record: &CanonicalRecord,
    vocab: &CompiledVocabulary,
) -> CriterionOutcome {
    match criterion {
        Criterion::DatabaseId => mandatory::database_id(record, vocab),
        Criterion::Species => mandatory::species(record, vocab),
        Criterion::CellLine => mandatory::cell_line(record, vocab),
        Criterion::TumorAnnotation => mandatory::tumor_annotation(record, vocab),
        Criterion::SequencingMethod => mandatory::sequencing_method(record, vocab),
        Criterion::TissueSource => mandatory::tissue_source(record, vocab),
        Criterion::Publication => optional::publication(record, vocab),
        Criterion::SampleSize => optional::sample_size(record, vocab),
        Criterion::Country => optional::country(record, vocab),
        Criterion::Age => optional::age(record, vocab),
    }
}

/// Two-phase record evaluator.
///
/// Phase one runs the mandatory criteria in order; phase two runs the optional
/// criteria when every mandatory criterion passed, or always under
/// [`EvaluationMode::FullAudit`]. Both modes share one loop, so any criterion
/// evaluated in both has the same outcome.
#[derive(Debug, Clone)]
pub struct Evaluator {
    vocab: CompiledVocabulary,
    mode: EvaluationMode,
}

impl Evaluator {
    /// Compile `config` into an evaluator
    ///
    /// # Errors
    ///
    /// Returns a `VocabularyError` if the configuration is invalid or any of
    /// its patterns fails to compile.
    pub fn new(config: &ScreeningConfig) -> Result<Self, VocabularyError> {
        Ok(Self {
            vocab: CompiledVocabulary::compile(config)?,
            mode: EvaluationMode::default(),
        })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    #[must_use]
    pub fn vocabulary(&self) -> &CompiledVocabulary {
        &self.vocab
    }

    /// Evaluate a single record at index 0
    #[must_use]
    pub fn evaluate(&self, record: &RawRecord) -> EvaluationResult {
        self.evaluate_with_index(record, 0)
    }

    /// Evaluate a record, tagging the result with its input position
    #[must_use]
    pub fn evaluate_with_index(&self, record: &RawRecord, index: usize) -> EvaluationResult {
        let canonical = CanonicalRecord::from_raw(record);
        self.evaluate_canonical(&canonical, index)
    }

    /// Evaluate an already-normalized record
    #[must_use]
    pub fn evaluate_canonical(&self, record: &CanonicalRecord, index: usize) -> EvaluationResult {
        let vocab = &self.vocab;
        let mut mandatory = MandatoryOutcomes::default();
        let mut optional = OptionalOutcomes::default();
        let mut reasons = Vec::new();
        let mut mandatory_passed = true;

        for criterion in Criterion::ALL {
            if !mandatory_passed && self.mode == EvaluationMode::ShortCircuit {
                break;
            }

            let outcome = evaluate_criterion(criterion, record, vocab);
            reasons.push(format!("{criterion}: {}", outcome.reason));
            if criterion.kind() == CriterionKind::Mandatory && !outcome.passed {
                mandatory_passed = false;
            }

            let slot = match criterion.kind() {
                CriterionKind::Mandatory => mandatory.slot(criterion),
                CriterionKind::Optional => optional.slot(criterion),
            };
            if let Some(slot) = slot {
                *slot = Some(outcome);
            }
        }

        let score = scoring::aggregate(vocab, mandatory.iter().chain(optional.iter()));
        let grade = scoring::grade(&vocab.grading, mandatory_passed, score.aggregate);
        let needs_review = mandatory
            .iter()
            .chain(optional.iter())
            .any(|o| is_uncertain(&vocab.confidence, o.confidence));

        debug!(
            "record {} ({}, {} fields): mandatory_passed={} grade={} score={:.2}",
            index,
            record.record_id.as_deref().unwrap_or("-"),
            record.populated_fields(),
            mandatory_passed,
            grade,
            score.aggregate
        );

        EvaluationResult {
            index,
            record_id: record.record_id.clone(),
            source: record.source,
            mode: self.mode,
            mandatory,
            optional,
            mandatory_passed,
            aggregate_score: score.aggregate,
            optional_contribution: score.optional_contribution,
            grade,
            needs_review,
            reasons,
        }
    }

    /// Evaluate many records; results come back in input order
    #[must_use]
    pub fn evaluate_batch(&self, records: &[RawRecord]) -> Vec<EvaluationResult> {
        if records.is_empty() {
            warn!("No records to evaluate");
            return Vec::new();
        }

        #[cfg(feature = "parallel")]
        let results: Vec<EvaluationResult> = {
            use rayon::prelude::*;
            records
                .par_iter()
                .enumerate()
                .map(|(i, r)| self.evaluate_with_index(r, i))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<EvaluationResult> = records
            .iter()
            .enumerate()
            .map(|(i, r)| self.evaluate_with_index(r, i))
            .collect();

        let retained = results.iter().filter(|r| r.mandatory_passed).count();
        info!(
            "Evaluated {} records ({:?}): {} retained",
            results.len(),
            self.mode,
            retained
        );
        results
    }
}
