//! Screening configuration: vocabularies, patterns, weights and thresholds.
//!
//! The default configuration is embedded at compile time from
//! `vocabularies/default.json` (checked by `build.rs`). An alternative file can
//! be loaded with [`ScreeningConfig::load_from_file`](config::ScreeningConfig::load_from_file).
//!
//! A [`ScreeningConfig`](config::ScreeningConfig) is plain data.
//! [`CompiledVocabulary`](compiled::CompiledVocabulary) turns it into keyword
//! sets and regexes once, before any record is evaluated.

pub mod compiled;
pub mod config;
pub mod store;
