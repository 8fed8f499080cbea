//! Shared helpers: input limits, filename checks, fingerprints.

pub mod validation;
