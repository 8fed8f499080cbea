//! Batch statistics.
//!
//! The summary is a commutative, associative fold over results: integer
//! counters plus scores in fixed-point micro-units, so any record order (and
//! any parallel split) yields a bit-identical summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::types::{Criterion, Grade};
use crate::screening::engine::EvaluationResult;
use crate::utils::validation::count_to_f64;

/// Scores are accumulated as integers of this many units per point
const MICRO_UNITS: f64 = 1_000_000.0;

#[allow(clippy::cast_possible_truncation)]
fn to_micro(score: f64) -> i64 {
    if score.is_finite() {
        (score * MICRO_UNITS).round() as i64
    } else {
        0
    }
}

#[allow(clippy::cast_precision_loss)]
fn from_micro(micro: i128) -> f64 {
    micro as f64 / MICRO_UNITS
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_to_f64(part) / count_to_f64(whole)
    }
}

/// Per-criterion pass statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionStats {
    pub evaluated: usize,
    pub passed: usize,
    pub pass_rate: f64,
}

/// Aggregate statistics for a screened batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Records passing every mandatory criterion
    pub retained: usize,
    pub retention_rate: f64,
    pub needs_review: usize,
    pub criteria: BTreeMap<Criterion, CriterionStats>,
    pub grades: BTreeMap<Grade, usize>,
    /// Failed mandatory criteria, counted once per failing record
    pub rejections: BTreeMap<Criterion, usize>,
    pub score_min: f64,
    pub score_max: f64,
    pub score_mean: f64,
}

/// Mergeable partial state behind [`BatchSummary`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryAccumulator {
    total: usize,
    retained: usize,
    needs_review: usize,
    evaluated: [usize; Criterion::ALL.len()],
    passed: [usize; Criterion::ALL.len()],
    grades: [usize; Grade::ALL.len()],
    rejections: [usize; Criterion::ALL.len()],
    score_min: Option<i64>,
    score_max: Option<i64>,
    score_sum: i128,
}

impl SummaryAccumulator {
    /// Fold one result in
    #[must_use]
    pub fn add(mut self, result: &EvaluationResult) -> Self {
        self.total += 1;
        self.retained += usize::from(result.mandatory_passed);
        self.needs_review += usize::from(result.needs_review);

        for outcome in result.outcomes() {
            let i = outcome.criterion.index();
            self.evaluated[i] += 1;
            self.passed[i] += usize::from(outcome.passed);
        }
        for criterion in result.failed_criteria() {
            self.rejections[criterion.index()] += 1;
        }
        if let Some(slot) = Grade::ALL.iter().position(|g| *g == result.grade) {
            self.grades[slot] += 1;
        }

        let micro = to_micro(result.aggregate_score);
        self.score_min = Some(self.score_min.map_or(micro, |m| m.min(micro)));
        self.score_max = Some(self.score_max.map_or(micro, |m| m.max(micro)));
        self.score_sum += i128::from(micro);
        self
    }

    /// Combine two partial states
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.total += other.total;
        self.retained += other.retained;
        self.needs_review += other.needs_review;
        for i in 0..Criterion::ALL.len() {
            self.evaluated[i] += other.evaluated[i];
            self.passed[i] += other.passed[i];
            self.rejections[i] += other.rejections[i];
        }
        for i in 0..Grade::ALL.len() {
            self.grades[i] += other.grades[i];
        }
        self.score_min = match (self.score_min, other.score_min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.score_max = match (self.score_max, other.score_max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.score_sum += other.score_sum;
        self
    }

    #[must_use]
    pub fn finish(self) -> BatchSummary {
        let criteria = Criterion::ALL
            .iter()
            .filter(|c| self.evaluated[c.index()] > 0)
            .map(|&c| {
                let evaluated = self.evaluated[c.index()];
                let passed = self.passed[c.index()];
                (
                    c,
                    CriterionStats {
                        evaluated,
                        passed,
                        pass_rate: ratio(passed, evaluated),
                    },
                )
            })
            .collect();

        let grades = Grade::ALL
            .iter()
            .enumerate()
            .map(|(i, g)| (*g, self.grades[i]))
            .collect();

        let rejections = Criterion::MANDATORY
            .iter()
            .filter(|c| self.rejections[c.index()] > 0)
            .map(|&c| (c, self.rejections[c.index()]))
            .collect();

        let score_mean = if self.total == 0 {
            0.0
        } else {
            from_micro(self.score_sum) / count_to_f64(self.total)
        };

        BatchSummary {
            total: self.total,
            retained: self.retained,
            retention_rate: ratio(self.retained, self.total),
            needs_review: self.needs_review,
            criteria,
            grades,
            rejections,
            score_min: self.score_min.map_or(0.0, |m| from_micro(i128::from(m))),
            score_max: self.score_max.map_or(0.0, |m| from_micro(i128::from(m))),
            score_mean,
        }
    }
}

impl BatchSummary {
    /// Summarize a set of results
    #[must_use]
    pub fn from_results(results: &[EvaluationResult]) -> Self {
        if results.is_empty() {
            warn!("Summarizing an empty batch");
        }

        #[cfg(feature = "parallel")]
        let acc = {
            use rayon::prelude::*;
            results
                .par_iter()
                .fold(SummaryAccumulator::default, SummaryAccumulator::add)
                .reduce(SummaryAccumulator::default, SummaryAccumulator::merge)
        };

        #[cfg(not(feature = "parallel"))]
        let acc = results
            .iter()
            .fold(SummaryAccumulator::default(), SummaryAccumulator::add);

        acc.finish()
    }

    /// Criteria ordered by rejection count, most frequent first
    #[must_use]
    pub fn top_rejections(&self) -> Vec<(Criterion, usize)> {
        let mut sorted: Vec<(Criterion, usize)> =
            self.rejections.iter().map(|(c, n)| (*c, *n)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RawRecord;
    use crate::screening::engine::{EvaluationMode, Evaluator};
    use crate::vocabulary::config::ScreeningConfig;

    fn records() -> Vec<RawRecord> {
        let eligible = RawRecord::new()
            .with("gse", "GSE1")
            .with("organism", "Homo sapiens")
            .with("gse_title", "RNA-seq of brain tissue")
            .with("summary", "n=150 subjects, aged 45-60 years, from Germany")
            .with("disease", "normal")
            .with("pubmed_id", "12345")
            .with("library_strategy", "10x scRNA-seq");
        vec![
            eligible.clone(),
            eligible.clone().with("organism", "Mus musculus"),
            RawRecord::new().with("accession", "SRX999"),
            eligible.with("gse_title", "HeLa cell line RNA-seq of brain"),
        ]
    }

    fn results(mode: EvaluationMode) -> Vec<EvaluationResult> {
        Evaluator::new(&ScreeningConfig::load_embedded().unwrap())
            .unwrap()
            .with_mode(mode)
            .evaluate_batch(&records())
    }

    #[test]
    fn test_counts_and_rates() {
        let summary = BatchSummary::from_results(&results(EvaluationMode::ShortCircuit));
        assert_eq!(summary.total, 4);
        assert_eq!(summary.retained, 1);
        assert!((summary.retention_rate - 0.25).abs() < 1e-12);
        assert_eq!(summary.grades[&Grade::A], 1);
        assert_eq!(summary.grades[&Grade::E], 3);
        assert_eq!(summary.rejections[&Criterion::Species], 1);
        assert_eq!(summary.rejections[&Criterion::DatabaseId], 1);
        assert_eq!(summary.rejections[&Criterion::CellLine], 1);
        assert_eq!(summary.criteria[&Criterion::DatabaseId].evaluated, 4);
        assert_eq!(summary.criteria[&Criterion::Age].evaluated, 1);
        assert!((summary.score_max - 15.0).abs() < 1e-9);
        assert!(summary.score_min.abs() < 1e-9);
    }

    #[test]
    fn test_summary_is_order_independent() {
        let mut forward = results(EvaluationMode::FullAudit);
        let a = BatchSummary::from_results(&forward);
        forward.reverse();
        let b = BatchSummary::from_results(&forward);
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_matches_sequential_fold() {
        let all = results(EvaluationMode::FullAudit);
        let sequential = all
            .iter()
            .fold(SummaryAccumulator::default(), SummaryAccumulator::add);
        let (left, right) = all.split_at(2);
        let l = left.iter().fold(SummaryAccumulator::default(), SummaryAccumulator::add);
        let r = right.iter().fold(SummaryAccumulator::default(), SummaryAccumulator::add);
        assert_eq!(sequential, r.merge(l));
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_results(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.retention_rate.abs() < f64::EPSILON);
        assert!(summary.criteria.is_empty());
        assert_eq!(summary.grades.values().sum::<usize>(), 0);
    }

    #[test]
    fn test_top_rejections_sorted() {
        let summary = BatchSummary::from_results(&results(EvaluationMode::FullAudit));
        let top = summary.top_rejections();
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}
