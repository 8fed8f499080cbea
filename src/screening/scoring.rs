//! Score aggregation and grading.
//!
//! aggregate = Σ mandatory (passed ? 1 : 0) × weight + Σ optional credit × weight
//!
//! Weights are checked at load time so every mandatory criterion outweighs
//! every optional one. Any mandatory failure grades [`Grade::LOWEST`].

use serde::{Deserialize, Serialize};

use crate::core::types::{Criterion, CriterionKind, Grade};
use crate::screening::outcome::CriterionOutcome;
use crate::vocabulary::compiled::CompiledVocabulary;
use crate::vocabulary::config::GradeBoundaries;

/// Aggregate score split into its mandatory and optional parts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub mandatory_contribution: f64,
    pub optional_contribution: f64,
    pub aggregate: f64,
}

/// Sum weighted contributions over the evaluated outcomes
///
/// Outcomes are summed in criterion order, so the result does not depend on
/// the order they were produced in.
#[must_use]
pub fn aggregate<'a>(
    vocab: &CompiledVocabulary,
    outcomes: impl IntoIterator<Item = &'a CriterionOutcome>,
) -> ScoreBreakdown {
    let mut terms = [0.0; Criterion::ALL.len()];
    let mut is_mandatory = [false; Criterion::ALL.len()];
    for outcome in outcomes {
        let c = outcome.criterion;
        let weight = vocab.weights.get(c);
        terms[c.index()] = match c.kind() {
            CriterionKind::Mandatory => {
                is_mandatory[c.index()] = true;
                if outcome.passed {
                    weight
                } else {
                    0.0
                }
            }
            CriterionKind::Optional => f64::from(outcome.score) * weight,
        };
    }

    let mut mandatory_contribution = 0.0;
    let mut optional_contribution = 0.0;
    for (i, term) in terms.iter().enumerate() {
        if is_mandatory[i] {
            mandatory_contribution += term;
        } else {
            optional_contribution += term;
        }
    }

    ScoreBreakdown {
        mandatory_contribution,
        optional_contribution,
        aggregate: mandatory_contribution + optional_contribution,
    }
}

/// Best grade whose boundary the aggregate reaches; lowest on mandatory failure
#[must_use]
pub fn grade(boundaries: &GradeBoundaries, mandatory_passed: bool, aggregate: f64) -> Grade {
    if !mandatory_passed {
        return Grade::LOWEST;
    }
    let thresholds = [
        (Grade::A, boundaries.a),
        (Grade::B, boundaries.b),
        (Grade::C, boundaries.c),
        (Grade::D, boundaries.d),
        (Grade::E, boundaries.e),
    ];
    thresholds
        .iter()
        .find(|(_, min)| aggregate >= *min)
        .map_or(Grade::LOWEST, |(g, _)| *g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MatchStrength;
    use crate::screening::outcome::Evidence;
    use crate::vocabulary::config::ScreeningConfig;

    fn vocab() -> CompiledVocabulary {
        CompiledVocabulary::compile(&ScreeningConfig::load_embedded().unwrap()).unwrap()
    }

    fn outcome(criterion: Criterion, score: u32) -> CriterionOutcome {
        CriterionOutcome {
            criterion,
            score,
            passed: score > 0,
            confidence: 1.0,
            evidence: Evidence::none(1),
            reason: String::new(),
        }
    }

    fn all_mandatory_passed() -> Vec<CriterionOutcome> {
        Criterion::MANDATORY.iter().map(|&c| outcome(c, 2)).collect()
    }

    #[test]
    fn test_mandatory_only_is_twelve() {
        let v = vocab();
        let s = aggregate(&v, &all_mandatory_passed());
        assert!((s.aggregate - 12.0).abs() < 1e-9);
        assert!(s.optional_contribution.abs() < 1e-9);
        assert_eq!(grade(&v.grading, true, s.aggregate), Grade::D);
    }

    #[test]
    fn test_full_optional_is_grade_a() {
        let v = vocab();
        let mut outcomes = all_mandatory_passed();
        outcomes.push(outcome(Criterion::Publication, 2));
        outcomes.push(outcome(Criterion::SampleSize, 2));
        outcomes.push(outcome(Criterion::Country, 1));
        outcomes.push(outcome(Criterion::Age, 1));
        let s = aggregate(&v, &outcomes);
        assert!((s.optional_contribution - 3.0).abs() < 1e-9);
        assert!((s.aggregate - 15.0).abs() < 1e-9);
        assert_eq!(grade(&v.grading, true, s.aggregate), Grade::A);
    }

    #[test]
    fn test_grade_boundaries() {
        let v = vocab();
        assert_eq!(grade(&v.grading, true, 14.5), Grade::A);
        assert_eq!(grade(&v.grading, true, 14.0), Grade::B);
        assert_eq!(grade(&v.grading, true, 13.5), Grade::C);
        assert_eq!(grade(&v.grading, true, 12.5), Grade::D);
        assert_eq!(grade(&v.grading, true, 3.0), Grade::E);
        assert_eq!(grade(&v.grading, true, -1.0), Grade::E);
    }

    #[test]
    fn test_mandatory_failure_is_lowest_grade() {
        let v = vocab();
        assert_eq!(grade(&v.grading, false, 100.0), Grade::LOWEST);
    }

    #[test]
    fn test_failed_mandatory_contributes_nothing() {
        let v = vocab();
        let mut outcomes = all_mandatory_passed();
        outcomes[2] = outcome(Criterion::CellLine, 0);
        outcomes[2].evidence.strength = MatchStrength::Exact;
        let s = aggregate(&v, &outcomes);
        assert!((s.mandatory_contribution - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let v = vocab();
        let mut outcomes = all_mandatory_passed();
        outcomes.push(outcome(Criterion::Age, 1));
        outcomes.push(outcome(Criterion::Publication, 1));
        let forward = aggregate(&v, &outcomes);
        outcomes.reverse();
        let backward = aggregate(&v, &outcomes);
        assert_eq!(forward, backward);
    }
}
