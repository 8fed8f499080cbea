use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{open_output, OutputFormat};
use crate::parsing::table::load_table;
use crate::profiling::profiler::{ColumnProfiler, RelevanceMap};
use crate::vocabulary::config::ScreeningConfig;

#[derive(Args)]
pub struct ProfileArgs {
    /// Table sample JSON, or a record file to sample columns from
    #[arg(required = true)]
    pub input: PathBuf,

    /// Path to a custom screening configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum values inspected per column (defaults to the configured bound)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub max_samples: Option<u32>,

    /// Write the profile to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute profile subcommand
///
/// # Errors
///
/// Returns an error if the configuration or table cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ProfileArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = ScreeningConfig::load(args.config.as_deref())
        .context("Failed to load screening configuration")?;

    let max_samples = args
        .max_samples
        .map_or(config.profiling.max_samples, |n| n as usize);
    let profiler = ColumnProfiler::new(&config)?.with_max_samples(max_samples);

    let table = load_table(&args.input, max_samples)
        .with_context(|| format!("Failed to load table from {}", args.input.display()))?;

    if verbose {
        eprintln!(
            "Profiling {} columns of '{}' (up to {} samples each)",
            table.columns.len(),
            table.table,
            max_samples
        );
    }

    let map = profiler.profile_table(&table);

    let mut out = open_output(args.output.as_deref())?;
    match format {
        OutputFormat::Text => write_text(&mut out, &map, verbose)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &map)?;
            writeln!(out)?;
        }
        OutputFormat::Tsv => write_tsv(&mut out, &map)?,
    }
    out.flush()?;
    Ok(())
}

fn write_text(out: &mut dyn Write, map: &RelevanceMap, verbose: bool) -> anyhow::Result<()> {
    writeln!(out, "Table: {}", map.table)?;
    writeln!(
        out,
        "Columns: {} ({} classified)",
        map.profiles.len(),
        map.ranking.len()
    )?;

    if map.ranking.is_empty() {
        writeln!(out, "\nNo relevant columns found.")?;
    } else {
        writeln!(out, "\nRanking:")?;
        for (rank, name) in map.ranking.iter().enumerate() {
            if let Some(p) = map.profile(name) {
                writeln!(
                    out,
                    "   {:>2}. {:<28} {:<14} {:.2} via {:?} (nulls {:.0}%)",
                    rank + 1,
                    p.name,
                    p.category.to_string(),
                    p.confidence,
                    p.evidence,
                    p.null_ratio * 100.0
                )?;
            }
        }

        writeln!(out, "\nBy category:")?;
        for (category, names) in &map.by_category {
            writeln!(out, "   {:<14} {}", category.to_string(), names.join(", "))?;
        }
    }

    if verbose {
        let unclassified: Vec<&str> = map
            .profiles
            .iter()
            .filter(|p| !map.ranking.contains(&p.name))
            .map(|p| p.name.as_str())
            .collect();
        if !unclassified.is_empty() {
            writeln!(out, "\nUnclassified: {}", unclassified.join(", "))?;
        }
    }
    Ok(())
}

fn write_tsv(out: &mut dyn Write, map: &RelevanceMap) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(&mut *out);
    writer.write_record([
        "ordinal",
        "name",
        "data_type",
        "category",
        "evidence",
        "confidence",
        "relevance",
        "null_ratio",
        "distinct_ratio",
        "sampled",
    ])?;
    for p in &map.profiles {
        writer.write_record([
            p.ordinal.to_string(),
            p.name.clone(),
            p.data_type.clone(),
            p.category.to_string(),
            format!("{:?}", p.evidence).to_lowercase(),
            format!("{:.4}", p.confidence),
            format!("{:.4}", p.relevance),
            format!("{:.4}", p.null_ratio),
            format!("{:.4}", p.distinct_ratio),
            p.sampled.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::FieldValue;
    use crate::profiling::column::{TableColumn, TableSample};

    fn map() -> RelevanceMap {
        let table = TableSample {
            table: "geo".to_string(),
            columns: vec![
                TableColumn {
                    name: "organism".to_string(),
                    data_type: None,
                    samples: vec![FieldValue::from("Homo sapiens")],
                },
                TableColumn {
                    name: "misc".to_string(),
                    data_type: None,
                    samples: vec![FieldValue::from("foo")],
                },
            ],
        };
        ColumnProfiler::new(&ScreeningConfig::load_embedded().unwrap())
            .unwrap()
            .profile_table(&table)
    }

    #[test]
    fn test_text_lists_ranking() {
        let mut buf: Vec<u8> = Vec::new();
        write_text(&mut buf, &map(), true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Columns: 2 (1 classified)"));
        assert!(text.contains("organism"));
        assert!(text.contains("Unclassified: misc"));
    }

    #[test]
    fn test_tsv_has_row_per_column() {
        let mut buf: Vec<u8> = Vec::new();
        write_tsv(&mut buf, &map()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().contains("\tspecies\tname\t"));
        assert!(text.lines().nth(2).unwrap().contains("\tother\tnone\t"));
    }
}
