//! End-to-end screening scenarios over realistic GEO and SRA rows.

use sc_screen::{
    BatchSummary, Criterion, EvaluationMode, Evaluator, Grade, RawRecord, ScreeningConfig,
};

fn evaluator(mode: EvaluationMode) -> Evaluator {
    Evaluator::new(&ScreeningConfig::load_embedded().unwrap())
        .unwrap()
        .with_mode(mode)
}

fn eligible_geo() -> RawRecord {
    RawRecord::new()
        .with("gse", "GSE123456")
        .with("organism", "Homo sapiens")
        .with("gse_title", "RNA-seq of brain tissue")
        .with("disease", "normal")
        .with("library_strategy", "10x scRNA-seq")
}

#[test]
fn test_eligible_record_passes_all_mandatory() {
    let result = evaluator(EvaluationMode::ShortCircuit).evaluate(&eligible_geo());
    assert!(result.mandatory_passed);
    for criterion in Criterion::MANDATORY {
        let outcome = result.outcome(criterion).unwrap();
        assert!(outcome.passed, "{criterion} should pass: {}", outcome.reason);
    }
    assert_eq!(result.record_id.as_deref(), Some("GSE123456"));
    assert!(result.optional.iter().count() == Criterion::OPTIONAL.len());
}

#[test]
fn test_cell_line_only_fails_cell_line() {
    let record = eligible_geo().with("gse_title", "HeLa cells RNA-seq of brain tissue");

    let short = evaluator(EvaluationMode::ShortCircuit).evaluate(&record);
    assert!(!short.mandatory_passed);
    assert_eq!(short.grade, Grade::E);
    assert_eq!(short.failed_criteria().collect::<Vec<_>>(), vec![Criterion::CellLine]);
    // Short-circuit stops at the first failure
    assert!(short.outcome(Criterion::TumorAnnotation).is_none());
    assert_eq!(short.optional.iter().count(), 0);

    let audit = evaluator(EvaluationMode::FullAudit).evaluate(&record);
    assert_eq!(audit.failed_criteria().collect::<Vec<_>>(), vec![Criterion::CellLine]);
    let passes = audit.mandatory_pass_map();
    assert_eq!(passes.len(), 6);
    assert_eq!(passes.values().filter(|p| **p).count(), 5);
    assert_eq!(audit.grade, Grade::E);
    assert_eq!(audit.optional.iter().count(), 4);
}

#[test]
fn test_unrecognized_accession_fails_database_id() {
    let result = evaluator(EvaluationMode::FullAudit)
        .evaluate(&RawRecord::new().with("accession", "SRX999"));
    let outcome = result.outcome(Criterion::DatabaseId).unwrap();
    assert!(!outcome.passed);
    assert!(!result.mandatory_passed);
    assert_eq!(result.grade, Grade::E);
}

#[test]
fn test_optional_evidence_reaches_maximum() {
    let config = ScreeningConfig::load_embedded().unwrap();
    let record = eligible_geo()
        .with("summary", "n=150 subjects, aged 45-60 years, from Germany")
        .with("pubmed_id", "31234567");
    let result = Evaluator::new(&config).unwrap().evaluate(&record);

    assert!(result.mandatory_passed);
    let scores = result.optional_score_map();
    for criterion in Criterion::OPTIONAL {
        assert!(scores[&criterion] > 0, "{criterion} should earn credit");
    }
    assert!((result.optional_contribution - config.max_optional_contribution()).abs() < 1e-9);
    assert_eq!(result.grade, Grade::A);
}

#[test]
fn test_sra_run_row() {
    let record = RawRecord::new()
        .with("run_accession", "SRR1234567")
        .with("scientific_name", "Homo sapiens")
        .with("study_title", "Single-cell RNA-seq of human pancreatic islets")
        .with("study_abstract", "Islets from healthy donors profiled with Chromium")
        .with("library_strategy", "RNA-Seq");
    let result = evaluator(EvaluationMode::ShortCircuit).evaluate(&record);
    assert!(result.mandatory_passed, "{:?}", result.reasons);
    assert_eq!(result.source, sc_screen::SourceShape::Sra);
}

#[test]
fn test_mouse_record_names_organism() {
    let record = eligible_geo().with("organism", "Mus musculus");
    let result = evaluator(EvaluationMode::ShortCircuit).evaluate(&record);
    let species = result.outcome(Criterion::Species).unwrap();
    assert!(!species.passed);
    assert!(species.reason.contains("mus musculus"), "{}", species.reason);
}

#[test]
fn test_batch_summary_over_mixed_records() {
    let records = vec![
        eligible_geo(),
        eligible_geo().with("gse_title", "HeLa cells RNA-seq of brain tissue"),
        RawRecord::new().with("accession", "SRX999"),
    ];
    let results = evaluator(EvaluationMode::FullAudit).evaluate_batch(&records);
    assert_eq!(results.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2]);

    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.retained, 1);
    assert_eq!(summary.rejections[&Criterion::CellLine], 1);
    assert_eq!(summary.criteria[&Criterion::DatabaseId].evaluated, 3);
    assert_eq!(summary.criteria[&Criterion::DatabaseId].passed, 2);
}

#[test]
fn test_humanized_mouse_is_not_human() {
    let engrafted = eligible_geo()
        .with("organism", "Mus musculus")
        .with("summary", "Humanized mice engrafted with human PBMC");
    let result = evaluator(EvaluationMode::FullAudit).evaluate(&engrafted);
    assert_eq!(result.failed_criteria().collect::<Vec<_>>(), vec![Criterion::Species]);
    let species = result.outcome(Criterion::Species).unwrap();
    assert!(species.reason.contains("'mus musculus' in organism"), "{}", species.reason);

    let prose_only = RawRecord::new()
        .with("gse", "GSE200")
        .with("gse_title", "Humanized mouse model of brain injury");
    let result = evaluator(EvaluationMode::FullAudit).evaluate(&prose_only);
    let species = result.outcome(Criterion::Species).unwrap();
    assert!(!species.passed);
    assert!(!species.reason.contains("'human'"), "{}", species.reason);
}

#[test]
fn test_normalized_counts_are_not_a_normal_annotation() {
    let record = RawRecord::new()
        .with("gse", "GSE201")
        .with("organism", "Homo sapiens")
        .with("gse_title", "RNA-seq of brain tissue")
        .with("library_strategy", "10x scRNA-seq")
        .with("summary", "Counts were normalized and controlled for batch effects");
    let result = evaluator(EvaluationMode::FullAudit).evaluate(&record);
    assert_eq!(
        result.failed_criteria().collect::<Vec<_>>(),
        vec![Criterion::TumorAnnotation]
    );
}

#[test]
fn test_colony_is_not_colon_tissue() {
    let record = RawRecord::new()
        .with("gse", "GSE202")
        .with("organism", "Homo sapiens")
        .with("gse_title", "Single-cell RNA-seq of colony-forming progenitors")
        .with("disease", "normal")
        .with("library_strategy", "10x scRNA-seq");
    let result = evaluator(EvaluationMode::FullAudit).evaluate(&record);
    assert_eq!(
        result.failed_criteria().collect::<Vec<_>>(),
        vec![Criterion::TissueSource]
    );

    let colonic = record.with("summary", "Colonic crypts from resections");
    assert!(evaluator(EvaluationMode::FullAudit).evaluate(&colonic).mandatory_passed);
}
