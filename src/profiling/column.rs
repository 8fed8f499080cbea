use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::canonical::normalize_text;
use crate::core::record::FieldValue;
use crate::core::types::ColumnCategory;
use crate::utils::validation::count_to_f64;
use crate::vocabulary::compiled::CompiledVocabulary;

/// One column of a sampled table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    /// Declared or inferred type (`text`, `integer`, `real`, `boolean`)
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub samples: Vec<FieldValue>,
}

/// Column names plus a bounded sample of values, as a schema inspector reports them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSample {
    pub table: String,
    pub columns: Vec<TableColumn>,
}

/// What a column's category was decided from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileEvidence {
    Name,
    Content,
    None,
}

/// Classification and statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub ordinal: usize,
    pub data_type: String,
    pub category: ColumnCategory,
    pub evidence: ProfileEvidence,
    pub confidence: f64,
    /// confidence × (1 − null ratio)
    pub relevance: f64,
    pub null_ratio: f64,
    pub distinct_ratio: f64,
    /// Number of sample values inspected
    pub sampled: usize,
}

/// Null and distinct statistics over a bounded sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStats {
    pub sampled: usize,
    pub nulls: usize,
    /// Normalized non-null values, in sample order
    pub values: Vec<String>,
    pub distinct: usize,
}

impl SampleStats {
    /// Inspect at most `max_samples` values; placeholders count as null
    #[must_use]
    pub fn collect(samples: &[FieldValue], max_samples: usize, vocab: &CompiledVocabulary) -> Self {
        let taken = &samples[..samples.len().min(max_samples)];
        let values: Vec<String> = taken
            .iter()
            .filter_map(FieldValue::as_text)
            .map(|t| normalize_text(&t))
            .filter(|t| !vocab.is_placeholder(t))
            .collect();
        let distinct = values.iter().collect::<HashSet<_>>().len();
        Self {
            sampled: taken.len(),
            nulls: taken.len() - values.len(),
            values,
            distinct,
        }
    }

    /// Fraction of sampled values that are null; 1.0 for an empty sample
    #[must_use]
    pub fn null_ratio(&self) -> f64 {
        if self.sampled == 0 {
            1.0
        } else {
            count_to_f64(self.nulls) / count_to_f64(self.sampled)
        }
    }

    /// Distinct values over non-null values
    #[must_use]
    pub fn distinct_ratio(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            count_to_f64(self.distinct) / count_to_f64(self.values.len())
        }
    }
}

/// Infer a coarse type from sample values
#[must_use]
pub fn infer_data_type(samples: &[FieldValue]) -> String {
    let mut seen_real = false;
    let mut seen_int = false;
    let mut seen_bool = false;
    let mut seen_text = false;
    for value in samples {
        match value {
            FieldValue::Null => {}
            FieldValue::Bool(_) => seen_bool = true,
            FieldValue::Number(n) if n.fract() == 0.0 => seen_int = true,
            FieldValue::Number(_) => seen_real = true,
            FieldValue::Text(t) if t.trim().is_empty() => {}
            FieldValue::Text(_) => seen_text = true,
        }
    }
    let kind = match (seen_text, seen_bool, seen_real, seen_int) {
        (true, ..) => "text",
        (false, true, false, false) => "boolean",
        (false, false, true, _) => "real",
        (false, false, false, true) => "integer",
        (false, false, false, false) => "unknown",
        _ => "text",
    };
    kind.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::config::ScreeningConfig;

    fn vocab() -> CompiledVocabulary {
        CompiledVocabulary::compile(&ScreeningConfig::load_embedded().unwrap()).unwrap()
    }

    #[test]
    fn test_stats_treat_placeholders_as_null() {
        let v = vocab();
        let samples: Vec<FieldValue> = vec![
            "Homo sapiens".into(),
            "homo  sapiens".into(),
            "N/A".into(),
            FieldValue::Null,
            "".into(),
            "Mus musculus".into(),
        ];
        let stats = SampleStats::collect(&samples, 100, &v);
        assert_eq!(stats.sampled, 6);
        assert_eq!(stats.nulls, 3);
        assert_eq!(stats.distinct, 2);
        assert!((stats.null_ratio() - 0.5).abs() < 1e-12);
        assert!((stats.distinct_ratio() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_stats_bounded_by_max_samples() {
        let v = vocab();
        let samples: Vec<FieldValue> = (0..10).map(|i| FieldValue::from(i64::from(i))).collect();
        let stats = SampleStats::collect(&samples, 4, &v);
        assert_eq!(stats.sampled, 4);
        assert_eq!(stats.values, vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn test_empty_sample_is_all_null() {
        let stats = SampleStats::collect(&[], 100, &vocab());
        assert!((stats.null_ratio() - 1.0).abs() < f64::EPSILON);
        assert!(stats.distinct_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn test_infer_data_type() {
        assert_eq!(infer_data_type(&[1_i64.into(), 2_i64.into()]), "integer");
        assert_eq!(infer_data_type(&[1_i64.into(), 2.5.into()]), "real");
        assert_eq!(infer_data_type(&["a".into(), 2_i64.into()]), "text");
        assert_eq!(infer_data_type(&[FieldValue::Bool(true)]), "boolean");
        assert_eq!(infer_data_type(&[FieldValue::Null]), "unknown");
    }
}
