//! Loaders for metadata record files and table samples.
//!
//! Record files may be:
//!
//! - **JSON**: an array of objects, or an object with a `records` array
//! - **JSON Lines**: one object per line (`.jsonl`, `.ndjson`)
//! - **CSV / TSV**: a header row followed by one record per row
//!
//! Any of these may be gzip-compressed (`.gz`). Table samples for profiling are
//! either a `TableSample` JSON document or derived from a record file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sc_screen::parsing::records::load_records;
//! use std::path::Path;
//!
//! let records = load_records(Path::new("geo_series.tsv.gz")).unwrap();
//! println!("{} records", records.len());
//! ```

pub mod records;
pub mod table;

pub use records::{load_records, RecordFormat, RecordParseError};
pub use table::{load_table, table_from_records};
