//! Command-line interface for sc-screen.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **screen**: Evaluate a record file against the screening criteria
//! - **profile**: Classify the columns of a table sample or record file
//! - **vocab**: Show, export, or validate a screening configuration
//! - **serve**: Start the JSON HTTP API
//!
//! ## Usage
//!
//! ```text
//! # Screen GEO series rows
//! sc-screen screen geo_series.tsv
//!
//! # Keep only retained records graded B or better, as JSON
//! sc-screen screen runs.jsonl.gz --retained-only --min-grade B --format json
//!
//! # Audit every criterion with explanations
//! sc-screen screen records.json --full-audit --explain
//!
//! # Find the relevant columns of a table
//! sc-screen profile geo_series_sample.json
//!
//! # Export the embedded vocabulary for editing
//! sc-screen vocab export my_vocab.json
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

pub mod profile;
pub mod screen;
pub mod vocab;

#[derive(Parser)]
#[command(name = "sc-screen")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Screen sequencing dataset metadata for single-cell eQTL suitability")]
#[command(
    long_about = "sc-screen evaluates GEO and SRA metadata records against a fixed set of suitability criteria for single-cell eQTL analysis.\n\nEach record receives:\n- A pass/fail decision on six mandatory criteria\n- A graded score over four optional criteria\n- A per-criterion confidence and a human-readable reason"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Screen metadata records
    Screen(screen::ScreenArgs),

    /// Profile table columns by relevance
    Profile(profile::ProfileArgs),

    /// Inspect or validate screening vocabularies
    Vocab(vocab::VocabArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Alternative screening configuration
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Write to `path` if given, otherwise stdout
pub(crate) fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let file = File::create(p)
                .with_context(|| format!("Failed to create output file {}", p.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}
