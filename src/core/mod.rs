//! Core data types for metadata screening.
//!
//! - [`RawRecord`](record::RawRecord): a metadata row exactly as a source produced it
//! - [`CanonicalRecord`](canonical::CanonicalRecord): the normalized view every evaluator reads
//! - [`Criterion`](types::Criterion), [`Grade`](types::Grade), [`SourceShape`](types::SourceShape):
//!   classification types
//!
//! ## Field naming
//!
//! GEO and SRA describe the same concepts with different column names:
//!
//! | Concept  | GEO          | SRA              |
//! |----------|--------------|------------------|
//! | Title    | gse_title    | study_title      |
//! | Summary  | summary      | study_abstract   |
//! | Organism | organism     | scientific_name  |
//! | Accession| gse          | run_accession    |
//!
//! The normalizer resolves these through fixed alias tables, preferring the
//! record's own archive shape.

pub mod canonical;
pub mod record;
pub mod types;
