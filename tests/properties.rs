//! Property tests for the screening invariants.

use proptest::prelude::*;

use sc_screen::{
    BatchSummary, Criterion, EvaluationMode, Evaluator, Grade, RawRecord, ScreeningConfig,
};

fn evaluator(mode: EvaluationMode) -> Evaluator {
    Evaluator::new(&ScreeningConfig::load_embedded().unwrap())
        .unwrap()
        .with_mode(mode)
}

fn eligible() -> RawRecord {
    RawRecord::new()
        .with("gse", "GSE123456")
        .with("organism", "Homo sapiens")
        .with("gse_title", "RNA-seq of brain tissue")
        .with("disease", "normal")
        .with("library_strategy", "10x scRNA-seq")
}

/// Field values mixing vocabulary terms, placeholders and noise
fn field_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Homo sapiens".to_string()),
        Just("Mus musculus".to_string()),
        Just("HeLa cell line".to_string()),
        Just("primary tumor biopsy".to_string()),
        Just("healthy control".to_string()),
        Just("10x Chromium scRNA-seq".to_string()),
        Just("liver".to_string()),
        Just("GSE1001".to_string()),
        Just("SRR42".to_string()),
        Just("N/A".to_string()),
        Just(String::new()),
        "[a-zA-Z0-9 ,;=-]{0,40}",
    ]
}

fn field_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "gse",
        "run_accession",
        "accession",
        "organism",
        "scientific_name",
        "taxon_id",
        "gse_title",
        "study_title",
        "summary",
        "study_abstract",
        "cell_type",
        "source_name",
        "disease",
        "library_strategy",
        "country",
        "characteristics_ch1",
        "pubmed_id",
        "sample_count",
    ])
}

fn record() -> impl Strategy<Value = RawRecord> {
    prop::collection::vec((field_name(), field_value()), 0..12)
        .prop_map(|fields| fields.into_iter().collect())
}

proptest! {
    #[test]
    fn mandatory_failure_gets_lowest_grade(record in record()) {
        for mode in [EvaluationMode::ShortCircuit, EvaluationMode::FullAudit] {
            let result = evaluator(mode).evaluate(&record);
            if !result.mandatory_passed {
                prop_assert_eq!(result.grade, Grade::LOWEST);
            }
        }
    }

    #[test]
    fn confidence_is_a_probability(record in record()) {
        let result = evaluator(EvaluationMode::FullAudit).evaluate(&record);
        prop_assert_eq!(result.outcomes().count(), Criterion::ALL.len());
        for outcome in result.outcomes() {
            prop_assert!((0.0..=1.0).contains(&outcome.confidence), "{:?}", outcome);
        }
    }

    #[test]
    fn evaluation_is_idempotent(record in record()) {
        let evaluator = evaluator(EvaluationMode::FullAudit);
        prop_assert_eq!(evaluator.evaluate(&record), evaluator.evaluate(&record));
    }

    #[test]
    fn modes_agree_on_evaluated_criteria(record in record()) {
        let short = evaluator(EvaluationMode::ShortCircuit).evaluate(&record);
        let audit = evaluator(EvaluationMode::FullAudit).evaluate(&record);
        prop_assert_eq!(short.mandatory_passed, audit.mandatory_passed);
        for outcome in short.outcomes() {
            prop_assert_eq!(Some(outcome), audit.outcome(outcome.criterion));
        }
    }

    #[test]
    fn aggregate_monotone_in_sample_count(a in 0u32..500, b in 0u32..500) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let evaluator = evaluator(EvaluationMode::ShortCircuit);
        let low_result = evaluator.evaluate(&eligible().with("sample_count", i64::from(low)));
        let high_result = evaluator.evaluate(&eligible().with("sample_count", i64::from(high)));
        prop_assert!(high_result.aggregate_score >= low_result.aggregate_score);
        prop_assert!(high_result.grade.at_least(low_result.grade));
    }

    #[test]
    fn optional_evidence_never_lowers_score(
        summary in prop::sample::subsequence(
            vec!["n=150 subjects", "aged 45-60 years", "from Germany", "published in a journal"],
            0..=4,
        )
    ) {
        let evaluator = evaluator(EvaluationMode::ShortCircuit);
        let base = evaluator.evaluate(&eligible());
        let richer = evaluator.evaluate(&eligible().with("summary", summary.join(", ")));
        prop_assert!(richer.optional_contribution >= base.optional_contribution);
        prop_assert!(richer.aggregate_score >= base.aggregate_score);
    }

    #[test]
    fn batch_summary_is_order_independent(
        records in prop::collection::vec(record(), 0..20).prop_shuffle(),
        seed in any::<u64>(),
    ) {
        let evaluator = evaluator(EvaluationMode::FullAudit);
        let forward = BatchSummary::from_results(&evaluator.evaluate_batch(&records));

        let mut rotated = records.clone();
        if !rotated.is_empty() {
            #[allow(clippy::cast_possible_truncation)]
            let k = (seed % rotated.len() as u64) as usize;
            rotated.rotate_left(k);
        }
        rotated.reverse();
        let backward = BatchSummary::from_results(&evaluator.evaluate_batch(&rotated));
        prop_assert_eq!(forward, backward);
    }
}
