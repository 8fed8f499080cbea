//! Record screening: mandatory eligibility, optional grading and confidence.
//!
//! - [`Evaluator`]: compiles a configuration once and evaluates records
//! - [`EvaluationResult`]: per-record outcome with named per-criterion fields
//! - [`BatchSummary`]: order-independent batch statistics
//!
//! ## Evaluation
//!
//! 1. **Normalize**: raw GEO/SRA fields become a [`CanonicalRecord`](crate::core::canonical::CanonicalRecord)
//! 2. **Mandatory phase**: database id, species, cell line, tumor annotation,
//!    sequencing method, tissue source
//! 3. **Optional phase**: publication, sample size, country, age
//! 4. **Aggregate**: weighted sum and letter grade; any mandatory failure grades `E`
//!
//! ## Example
//!
//! ```rust
//! use sc_screen::{Evaluator, RawRecord, ScreeningConfig};
//!
//! let config = ScreeningConfig::load_embedded().unwrap();
//! let evaluator = Evaluator::new(&config).unwrap();
//!
//! let record = RawRecord::new()
//!     .with("gse", "GSE123456")
//!     .with("organism", "Homo sapiens")
//!     .with("gse_title", "RNA-seq of brain tissue")
//!     .with("disease", "normal")
//!     .with("library_strategy", "10x scRNA-seq");
//!
//! let result = evaluator.evaluate(&record);
//! assert!(result.mandatory_passed);
//! println!("{}: grade {}", result.record_id.unwrap_or_default(), result.grade);
//! ```

pub mod batch;
pub mod confidence;
pub mod engine;
pub mod mandatory;
pub mod matcher;
pub mod optional;
pub mod outcome;
pub mod scoring;

pub use batch::BatchSummary;
pub use engine::{EvaluationMode, EvaluationResult, Evaluator};
pub use outcome::{CriterionOutcome, Evidence};
