use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};

use crate::cli::{open_output, OutputFormat};
use crate::core::types::Criterion;
use crate::vocabulary::compiled::CompiledVocabulary;
use crate::vocabulary::config::ScreeningConfig;

#[derive(Args)]
pub struct VocabArgs {
    #[command(subcommand)]
    pub command: VocabCommands,
}

#[derive(Subcommand)]
pub enum VocabCommands {
    /// Summarize the active configuration
    Show {
        /// Path to custom configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export the configuration to a file
    Export {
        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        /// Path to custom configuration file to export (defaults to embedded)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that a configuration file loads and compiles
    Validate {
        /// Configuration file to check
        #[arg(required = true)]
        file: PathBuf,
    },
}

/// Execute vocab subcommand
///
/// # Errors
///
/// Returns an error if a configuration cannot be loaded or written, or fails
/// validation.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: VocabArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        VocabCommands::Show { config } => {
            let config = ScreeningConfig::load(config.as_deref())
                .context("Failed to load screening configuration")?;
            let mut out = open_output(None)?;
            match format {
                OutputFormat::Text => write_text(&mut out, &config, verbose)?,
                OutputFormat::Json => writeln!(out, "{}", config.to_json()?)?,
                OutputFormat::Tsv => write_tsv(&mut out, &config)?,
            }
            out.flush()?;
        }
        VocabCommands::Export { output, config } => {
            let config = ScreeningConfig::load(config.as_deref())
                .context("Failed to load screening configuration")?;
            std::fs::write(&output, config.to_json()?)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!(
                "Exported configuration '{}' v{} to {}",
                config.name,
                config.version,
                output.display()
            );
        }
        VocabCommands::Validate { file } => {
            let config = ScreeningConfig::load_from_file(&file)
                .with_context(|| format!("Invalid configuration {}", file.display()))?;
            let compiled = CompiledVocabulary::compile(&config)
                .with_context(|| format!("Invalid configuration {}", file.display()))?;
            println!(
                "{}: valid ('{}' v{}, fingerprint {})",
                file.display(),
                config.name,
                config.version,
                compiled.fingerprint()
            );
        }
    }
    Ok(())
}

/// Term counts per vocabulary table
fn table_sizes(config: &ScreeningConfig) -> Vec<(&'static str, usize)> {
    let m = &config.mandatory;
    let o = &config.optional;
    vec![
        ("species.keywords", m.species.keywords.len()),
        ("species.taxon_ids", m.species.taxon_ids.len()),
        ("species.non_target", m.species.non_target_indicators.len()),
        ("cell_line.blacklist", m.cell_line.blacklist.len()),
        ("cell_line.primary", m.cell_line.primary_indicators.len()),
        (
            "database_id.prefixes",
            m.database_id.geo_prefixes.len() + m.database_id.sra_prefixes.len(),
        ),
        ("tumor_annotation.tumor", m.tumor_annotation.tumor_keywords.len()),
        ("tumor_annotation.normal", m.tumor_annotation.normal_keywords.len()),
        ("sequencing_method", m.sequencing_method.keywords.len()),
        ("tissue_source", m.tissue_source.keywords.len()),
        ("publication", o.publication.keywords.len()),
        ("sample_size.patterns", o.sample_size.patterns.len()),
        ("country", o.country.countries.len()),
        ("age.patterns", o.age.patterns.len()),
        ("placeholders", config.placeholders.len()),
    ]
}

fn write_text(out: &mut dyn Write, config: &ScreeningConfig, verbose: bool) -> anyhow::Result<()> {
    writeln!(out, "Configuration: {} v{}", config.name, config.version)?;
    writeln!(out, "Fingerprint: {}", config.fingerprint())?;

    writeln!(out, "\nWeights:")?;
    for criterion in Criterion::ALL {
        let weight = config.weights.get(&criterion).copied().unwrap_or(0.0);
        writeln!(
            out,
            "   {:<18} {:<9} {weight:.2}",
            criterion.as_str(),
            format!("{:?}", criterion.kind()).to_lowercase()
        )?;
    }

    let g = &config.grading;
    writeln!(
        out,
        "\nGrades: A >= {:.2}, B >= {:.2}, C >= {:.2}, D >= {:.2}, E >= {:.2}",
        g.a, g.b, g.c, g.d, g.e
    )?;
    writeln!(
        out,
        "Maximum optional contribution: {:.2}",
        config.max_optional_contribution()
    )?;

    writeln!(out, "\nVocabularies:")?;
    for (table, size) in table_sizes(config) {
        writeln!(out, "   {table:<26} {size}")?;
    }

    if verbose {
        writeln!(out, "\nProfiling categories:")?;
        for (category, vocab) in &config.profiling.categories {
            writeln!(
                out,
                "   {:<14} {} aliases, {} content keywords",
                category.to_string(),
                vocab.name_aliases.len(),
                vocab.content_keywords.len()
            )?;
        }
    }
    Ok(())
}

fn write_tsv(out: &mut dyn Write, config: &ScreeningConfig) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(&mut *out);
    writer.write_record(["table", "terms"])?;
    for (table, size) in table_sizes(config) {
        writer.write_record([table.to_string(), size.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes_nonempty() {
        let config = ScreeningConfig::load_embedded().unwrap();
        let sizes = table_sizes(&config);
        assert!(sizes.iter().all(|(_, n)| *n > 0));
        assert!(sizes.contains(&("species.taxon_ids", 1)));
    }

    #[test]
    fn test_text_summary() {
        let config = ScreeningConfig::load_embedded().unwrap();
        let mut buf: Vec<u8> = Vec::new();
        write_text(&mut buf, &config, true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Configuration: sc-eqtl-default v1.0.0"));
        assert!(text.contains("Maximum optional contribution: 3.00"));
        assert!(text.contains("Profiling categories:"));
    }
}
