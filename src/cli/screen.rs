use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{open_output, OutputFormat};
use crate::core::canonical::CanonicalRecord;
use crate::core::record::RawRecord;
use crate::core::types::{Criterion, CriterionKind, Grade};
use crate::narrative::{Narrator, TemplateNarrator};
use crate::parsing::records::load_records;
use crate::screening::batch::BatchSummary;
use crate::screening::engine::{EvaluationMode, EvaluationResult, Evaluator};
use crate::vocabulary::config::ScreeningConfig;

#[derive(Args)]
pub struct ScreenArgs {
    /// Record file (JSON, JSON Lines, CSV or TSV; optionally .gz)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Path to a custom screening configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Evaluate every criterion even after a mandatory failure
    #[arg(long)]
    pub full_audit: bool,

    /// Only report records that pass every mandatory criterion
    #[arg(long)]
    pub retained_only: bool,

    /// Only report records graded at least this well (A-E)
    #[arg(long)]
    pub min_grade: Option<Grade>,

    /// Add a plain-language explanation per record
    #[arg(long)]
    pub explain: bool,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute screen subcommand
///
/// # Errors
///
/// Returns an error if the configuration or record file cannot be loaded, or
/// the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ScreenArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = ScreeningConfig::load(args.config.as_deref())
        .context("Failed to load screening configuration")?;
    let mode = if args.full_audit {
        EvaluationMode::FullAudit
    } else {
        EvaluationMode::ShortCircuit
    };
    let evaluator = Evaluator::new(&config)?.with_mode(mode);

    if verbose {
        eprintln!(
            "Using configuration '{}' v{} ({})",
            config.name,
            config.version,
            evaluator.vocabulary().fingerprint()
        );
    }

    let records = load_records(&args.input)
        .with_context(|| format!("Failed to load records from {}", args.input.display()))?;
    if records.is_empty() {
        eprintln!("Warning: no records found in {}", args.input.display());
    }

    let results = evaluator.evaluate_batch(&records);
    // Statistics always cover the whole batch, not just the reported records
    let summary = BatchSummary::from_results(&results);

    let selected: Vec<&EvaluationResult> = results
        .iter()
        .filter(|r| !args.retained_only || r.mandatory_passed)
        .filter(|r| args.min_grade.map_or(true, |g| r.grade.at_least(g)))
        .collect();

    if verbose {
        eprintln!(
            "Screened {} records: {} retained, {} reported",
            summary.total,
            summary.retained,
            selected.len()
        );
    }

    let explanations = if args.explain {
        Some(explain_all(&evaluator, &records, &selected)?)
    } else {
        None
    };

    let report = Report {
        config: &config,
        fingerprint: evaluator.vocabulary().fingerprint(),
        mode,
        summary: &summary,
        results: &selected,
        explanations: explanations.as_deref(),
    };

    let mut out = open_output(args.output.as_deref())?;
    match format {
        OutputFormat::Text => write_text(&mut out, &report)?,
        OutputFormat::Json => write_json(&mut out, &report)?,
        OutputFormat::Tsv => write_tsv(&mut out, &report)?,
    }
    out.flush()?;

    if let Some(path) = &args.output {
        eprintln!("Wrote {} results to {}", selected.len(), path.display());
    }

    Ok(())
}

struct Report<'a> {
    config: &'a ScreeningConfig,
    fingerprint: &'a str,
    mode: EvaluationMode,
    summary: &'a BatchSummary,
    results: &'a [&'a EvaluationResult],
    explanations: Option<&'a [String]>,
}

fn explain_all(
    evaluator: &Evaluator,
    records: &[RawRecord],
    results: &[&EvaluationResult],
) -> anyhow::Result<Vec<String>> {
    let narrator = TemplateNarrator::new(evaluator.vocabulary().confidence.clone());
    results
        .iter()
        .map(|result| {
            let record = CanonicalRecord::from_raw(&records[result.index]);
            Ok(narrator.narrate(&record, result)?)
        })
        .collect()
}

fn display_id(result: &EvaluationResult) -> String {
    result
        .record_id
        .clone()
        .unwrap_or_else(|| format!("record #{}", result.index + 1))
}

fn write_text(out: &mut dyn Write, report: &Report<'_>) -> anyhow::Result<()> {
    for (i, result) in report.results.iter().enumerate() {
        if i > 0 {
            writeln!(out, "\n{}", "─".repeat(60))?;
        }

        let status = if result.mandatory_passed {
            "RETAINED"
        } else {
            "REJECTED"
        };
        writeln!(
            out,
            "\n{} ({}) {} grade {}",
            display_id(result),
            result.source,
            status,
            result.grade
        )?;
        writeln!(
            out,
            "   Score: {:.2} (optional {:.2})",
            result.aggregate_score, result.optional_contribution
        )?;
        if result.needs_review {
            writeln!(out, "   Needs review: low confidence on some criteria")?;
        }

        writeln!(out, "\n   Criteria:")?;
        for outcome in result.outcomes() {
            let mark = match outcome.criterion.kind() {
                CriterionKind::Mandatory if outcome.passed => "PASS".to_string(),
                CriterionKind::Mandatory => "FAIL".to_string(),
                CriterionKind::Optional => format!("+{}", outcome.score),
            };
            writeln!(
                out,
                "   {:<18} {:<5} {:.2}  {}",
                outcome.criterion.as_str(),
                mark,
                outcome.confidence,
                outcome.reason
            )?;
        }

        if let Some(explanations) = report.explanations {
            if let Some(text) = explanations.get(i) {
                writeln!(out, "\n   Explanation:")?;
                for line in text.lines() {
                    writeln!(out, "   {line}")?;
                }
            }
        }
    }

    write_summary_text(out, report)
}

fn write_summary_text(out: &mut dyn Write, report: &Report<'_>) -> anyhow::Result<()> {
    let s = report.summary;
    writeln!(out, "\n{}", "═".repeat(60))?;
    writeln!(
        out,
        "Configuration: {} v{} ({})",
        report.config.name, report.config.version, report.fingerprint
    )?;
    writeln!(out, "Mode: {:?}", report.mode)?;
    writeln!(
        out,
        "Records: {} total, {} retained ({:.1}%), {} need review",
        s.total,
        s.retained,
        s.retention_rate * 100.0,
        s.needs_review
    )?;
    writeln!(
        out,
        "Scores: min {:.2}, max {:.2}, mean {:.2}",
        s.score_min, s.score_max, s.score_mean
    )?;

    let grades: Vec<String> = s.grades.iter().map(|(g, n)| format!("{g}={n}")).collect();
    writeln!(out, "Grades: {}", grades.join(" "))?;

    writeln!(out, "\nCriteria:")?;
    for (criterion, stats) in &s.criteria {
        writeln!(
            out,
            "   {:<18} {:>6}/{:<6} {:.1}%",
            criterion.as_str(),
            stats.passed,
            stats.evaluated,
            stats.pass_rate * 100.0
        )?;
    }

    let top = s.top_rejections();
    if !top.is_empty() {
        writeln!(out, "\nRejections:")?;
        for (criterion, count) in top {
            writeln!(out, "   {:<18} {count}", criterion.as_str())?;
        }
    }
    Ok(())
}

fn write_json(out: &mut dyn Write, report: &Report<'_>) -> anyhow::Result<()> {
    let results: Vec<serde_json::Value> = report
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let mut json = serde_json::to_value(result)?;
            if let (Some(explanations), Some(obj)) = (report.explanations, json.as_object_mut()) {
                if let Some(text) = explanations.get(i) {
                    obj.insert("explanation".to_string(), serde_json::json!(text));
                }
            }
            Ok(json)
        })
        .collect::<Result<_, serde_json::Error>>()?;

    let output = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "config": {
            "name": report.config.name,
            "version": report.config.version,
            "fingerprint": report.fingerprint,
        },
        "mode": report.mode,
        "summary": report.summary,
        "results": results,
    });
    serde_json::to_writer_pretty(&mut *out, &output)?;
    writeln!(out)?;
    Ok(())
}

fn write_tsv(out: &mut dyn Write, report: &Report<'_>) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(&mut *out);

    let mut header: Vec<String> = [
        "index",
        "record_id",
        "source",
        "retained",
        "grade",
        "aggregate_score",
        "optional_contribution",
        "needs_review",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    header.extend(Criterion::ALL.iter().map(|c| c.as_str().to_string()));
    header.push("failed".to_string());
    if report.explanations.is_some() {
        header.push("explanation".to_string());
    }
    writer.write_record(&header)?;

    for (i, result) in report.results.iter().enumerate() {
        let mut row = vec![
            result.index.to_string(),
            result.record_id.clone().unwrap_or_default(),
            result.source.to_string(),
            result.mandatory_passed.to_string(),
            result.grade.to_string(),
            format!("{:.4}", result.aggregate_score),
            format!("{:.4}", result.optional_contribution),
            result.needs_review.to_string(),
        ];
        for criterion in Criterion::ALL {
            // Blank when the criterion was not evaluated
            let cell = result.outcome(criterion).map_or_else(String::new, |o| {
                match criterion.kind() {
                    CriterionKind::Mandatory => (if o.passed { "pass" } else { "fail" }).to_string(),
                    CriterionKind::Optional => o.score.to_string(),
                }
            });
            row.push(cell);
        }
        let failed: Vec<&str> = result.failed_criteria().map(Criterion::as_str).collect();
        row.push(failed.join(","));
        if let Some(explanations) = report.explanations {
            let text = explanations.get(i).map_or("", String::as_str);
            row.push(text.replace('\n', " "));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_for(records: &[RawRecord], explain: bool) -> (Vec<EvaluationResult>, Vec<String>) {
        let evaluator = Evaluator::new(&ScreeningConfig::load_embedded().unwrap()).unwrap();
        let results = evaluator.evaluate_batch(records);
        let refs: Vec<&EvaluationResult> = results.iter().collect();
        let explanations = if explain {
            explain_all(&evaluator, records, &refs).unwrap()
        } else {
            Vec::new()
        };
        (results, explanations)
    }

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new()
                .with("gse", "GSE123456")
                .with("organism", "Homo sapiens")
                .with("gse_title", "RNA-seq of brain tissue")
                .with("disease", "normal")
                .with("library_strategy", "10x scRNA-seq"),
            RawRecord::new().with("accession", "SRX999"),
        ]
    }

    fn render(format: OutputFormat, explain: bool) -> String {
        let config = ScreeningConfig::load_embedded().unwrap();
        let (results, explanations) = report_for(&records(), explain);
        let summary = BatchSummary::from_results(&results);
        let refs: Vec<&EvaluationResult> = results.iter().collect();
        let report = Report {
            config: &config,
            fingerprint: "abc",
            mode: EvaluationMode::ShortCircuit,
            summary: &summary,
            results: &refs,
            explanations: explain.then_some(explanations.as_slice()),
        };
        let mut buf: Vec<u8> = Vec::new();
        match format {
            OutputFormat::Text => write_text(&mut buf, &report).unwrap(),
            OutputFormat::Json => write_json(&mut buf, &report).unwrap(),
            OutputFormat::Tsv => write_tsv(&mut buf, &report).unwrap(),
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_output() {
        let text = render(OutputFormat::Text, false);
        assert!(text.contains("GSE123456 (GEO) RETAINED"));
        assert!(text.contains("SRX999 (unknown) REJECTED"));
        assert!(text.contains("REJECTED grade E"));
        assert!(text.contains("Records: 2 total, 1 retained (50.0%)"));
    }

    #[test]
    fn test_json_output_has_explanations() {
        let json: serde_json::Value = serde_json::from_str(&render(OutputFormat::Json, true)).unwrap();
        assert_eq!(json["config"]["fingerprint"], "abc");
        assert_eq!(json["summary"]["total"], 2);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0]["explanation"].as_str().unwrap().contains("retained"));
    }

    #[test]
    fn test_tsv_output() {
        let tsv = render(OutputFormat::Tsv, false);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("index\trecord_id\tsource"));
        assert!(lines[0].ends_with("\tfailed"));
        assert!(lines[2].contains("\tfail\t"));
        assert!(lines[2].ends_with("database_id"));
    }
}
