//! # sc-screen
//!
//! A library for screening sequencing-dataset metadata for single-cell eQTL studies.
//!
//! Public archives describe thousands of experiments, but only a fraction are
//! usable for single-cell eQTL mapping: human, primary tissue rather than cell
//! lines, single-cell or bulk RNA sequencing, with disease status and tissue
//! stated. The metadata that says so is scattered across free-text titles and
//! inconsistently named columns in GEO series rows and SRA run rows.
//!
//! `sc-screen` normalizes each record into a canonical form and evaluates it
//! against a fixed, versioned vocabulary.
//!
//! ## Features
//!
//! - **Mandatory gating**: six pass/fail criteria (accession, species, cell line,
//!   disease status, sequencing method, tissue)
//! - **Graded ranking**: four optional criteria (publication, sample size,
//!   country, donor age) refine an aggregate score and a letter grade
//! - **Confidence**: every decision carries a confidence in [0, 1] and a reason
//! - **Batch statistics**: retention, pass rates and rejection counts that do
//!   not depend on record order
//! - **Column profiling**: find the columns of an unfamiliar table that carry
//!   screening-relevant information
//!
//! ## Example
//!
//! ```rust
//! use sc_screen::{BatchSummary, Evaluator, RawRecord, ScreeningConfig};
//!
//! let config = ScreeningConfig::load_embedded().unwrap();
//! let evaluator = Evaluator::new(&config).unwrap();
//!
//! let records = vec![RawRecord::new()
//!     .with("gse", "GSE123456")
//!     .with("organism", "Homo sapiens")
//!     .with("gse_title", "RNA-seq of brain tissue")
//!     .with("disease", "normal")
//!     .with("library_strategy", "10x scRNA-seq")];
//!
//! let results = evaluator.evaluate_batch(&records);
//! assert!(results[0].mandatory_passed);
//!
//! let summary = BatchSummary::from_results(&results);
//! assert_eq!(summary.retained, 1);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Raw and canonical records, criterion and grade types
//! - [`vocabulary`]: Screening configuration, loading and compilation
//! - [`screening`]: Criteria evaluators, scoring and batch statistics
//! - [`profiling`]: Column relevance profiling
//! - [`narrative`]: Plain-language explanations of results
//! - [`parsing`]: Record and table-sample file loaders
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: JSON HTTP API

pub mod cli;
pub mod core;
pub mod narrative;
pub mod parsing;
pub mod profiling;
pub mod screening;
pub mod utils;
pub mod vocabulary;
pub mod web;

// Re-export commonly used types for convenience
pub use core::canonical::CanonicalRecord;
pub use core::record::{FieldValue, RawRecord};
pub use core::types::*;
pub use profiling::{ColumnProfiler, RelevanceMap, TableSample};
pub use screening::{BatchSummary, EvaluationMode, EvaluationResult, Evaluator};
pub use vocabulary::config::{ScreeningConfig, VocabularyError};
