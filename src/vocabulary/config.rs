use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{ColumnCategory, Criterion, CriterionKind};

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Vocabulary '{0}' is empty")]
    EmptyVocabulary(String),

    #[error("No weight configured for criterion '{0}'")]
    MissingWeight(Criterion),

    #[error("Weight for '{criterion}' must be finite and positive, got {value}")]
    InvalidWeight { criterion: Criterion, value: f64 },

    #[error(
        "Every mandatory weight must exceed every optional weight \
         (smallest mandatory {min_mandatory}, largest optional {max_optional})"
    )]
    WeightOrdering { min_mandatory: f64, max_optional: f64 },

    #[error("Grade boundaries must be finite and strictly ascending E < D < C < B < A: {0}")]
    GradeBoundaries(String),

    #[error("Invalid pattern for '{table}': {pattern}: {source}")]
    InvalidPattern {
        table: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid keyword in '{table}': '{keyword}' (a '*' stem marker must be last, after at least 3 characters)")]
    InvalidKeyword { table: String, keyword: String },

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid confidence settings: {0}")]
    InvalidConfidence(String),
}

/// Complete screening configuration: vocabularies, patterns, thresholds and weights.
///
/// Loaded once per run and never mutated while records are evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    pub version: String,
    pub name: String,
    /// Values that count as "no real content" (n/a, unknown, ...)
    pub placeholders: Vec<String>,
    pub mandatory: MandatoryVocabulary,
    pub optional: OptionalVocabulary,
    pub weights: BTreeMap<Criterion, f64>,
    pub grading: GradeBoundaries,
    pub confidence: ConfidenceSettings,
    pub profiling: ProfilingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MandatoryVocabulary {
    /// Score reported for a passing mandatory criterion
    pub pass_score: u32,
    pub species: SpeciesVocabulary,
    pub cell_line: CellLineVocabulary,
    pub database_id: AccessionRules,
    pub tumor_annotation: DiseaseVocabulary,
    pub sequencing_method: KeywordList,
    pub tissue_source: KeywordList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesVocabulary {
    pub keywords: Vec<String>,
    pub taxon_ids: Vec<String>,
    /// Organisms named in failure reasons when the required species is absent
    pub non_target_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellLineVocabulary {
    pub blacklist: Vec<String>,
    /// Terms suggesting primary material; only corroborate, never decide
    pub primary_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessionRules {
    pub geo_prefixes: Vec<String>,
    pub sra_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseVocabulary {
    pub tumor_keywords: Vec<String>,
    pub normal_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordList {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalVocabulary {
    pub publication: PublicationRules,
    pub sample_size: SampleSizeRules,
    pub country: CountryTable,
    pub age: AgeRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRules {
    pub full_credit: u32,
    pub partial_credit: u32,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeRules {
    /// Regexes over lower-cased text; capture group 1 holds the count
    pub patterns: Vec<String>,
    pub large_threshold: u64,
    pub medium_threshold: u64,
    pub large_credit: u32,
    pub medium_credit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTable {
    pub credit: u32,
    /// Canonical country name -> aliases
    pub countries: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeRules {
    pub credit: u32,
    pub patterns: Vec<String>,
}

/// Minimum aggregate score for each grade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBoundaries {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
}

/// Fractions of total confidence contributed by each factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSettings {
    pub presence: f64,
    pub quality: f64,
    pub strength: f64,
    pub context: f64,
    /// Shortest value (in characters) that passes the quality check
    pub min_quality_length: usize,
    /// Results with any confidence below this are flagged for human review
    pub review_threshold: f64,
}

impl ConfidenceSettings {
    /// Factor fractions rescaled to sum to 1.0
    #[must_use]
    pub fn normalized(&self) -> Self {
        let total = self.presence + self.quality + self.strength + self.context;

        if total <= 0.0 {
            return Self {
                presence: 0.25,
                quality: 0.25,
                strength: 0.25,
                context: 0.25,
                ..self.clone()
            };
        }

        Self {
            presence: self.presence / total,
            quality: self.quality / total,
            strength: self.strength / total,
            context: self.context / total,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingSettings {
    pub name_exact_confidence: f64,
    pub name_partial_confidence: f64,
    pub content_confidence: f64,
    /// Fraction of non-null samples that must match before content evidence counts
    pub min_content_ratio: f64,
    pub max_samples: usize,
    pub categories: BTreeMap<ColumnCategory, CategoryVocabulary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub name_aliases: Vec<String>,
    /// Extra content keywords on top of the screening vocabulary linked to the category
    #[serde(default)]
    pub content_keywords: Vec<String>,
}

impl ScreeningConfig {
    /// Check every structural invariant the evaluator relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: empty vocabularies, missing or
    /// mis-ordered weights, non-ascending grade boundaries, inconsistent
    /// thresholds, or out-of-range confidence settings.
    pub fn validate(&self) -> Result<(), VocabularyError> {
        self.validate_vocabularies()?;
        self.validate_keyword_markers()?;
        self.validate_weights()?;
        self.validate_grading()?;
        self.validate_thresholds()?;
        self.validate_confidence()?;
        Ok(())
    }

    fn validate_vocabularies(&self) -> Result<(), VocabularyError> {
        let m = &self.mandatory;
        let o = &self.optional;
        let tables: [(&str, bool); 10] = [
            ("species.keywords", m.species.keywords.is_empty()),
            ("cell_line.blacklist", m.cell_line.blacklist.is_empty()),
            (
                "database_id.prefixes",
                m.database_id.geo_prefixes.is_empty() && m.database_id.sra_prefixes.is_empty(),
            ),
            (
                "tumor_annotation.tumor_keywords",
                m.tumor_annotation.tumor_keywords.is_empty(),
            ),
            (
                "tumor_annotation.normal_keywords",
                m.tumor_annotation.normal_keywords.is_empty(),
            ),
            ("sequencing_method.keywords", m.sequencing_method.keywords.is_empty()),
            ("tissue_source.keywords", m.tissue_source.keywords.is_empty()),
            ("publication.keywords", o.publication.keywords.is_empty()),
            ("sample_size.patterns", o.sample_size.patterns.is_empty()),
            ("age.patterns", o.age.patterns.is_empty()),
        ];
        if let Some((name, _)) = tables.iter().find(|(_, empty)| *empty) {
            return Err(VocabularyError::EmptyVocabulary((*name).to_string()));
        }
        if o.country.countries.is_empty()
            || o.country.countries.values().any(std::vec::Vec::is_empty)
        {
            return Err(VocabularyError::EmptyVocabulary("country.countries".to_string()));
        }
        for category in ColumnCategory::CLASSIFIABLE {
            let missing = self
                .profiling
                .categories
                .get(&category)
                .map_or(true, |c| c.name_aliases.is_empty());
            if missing {
                return Err(VocabularyError::EmptyVocabulary(format!(
                    "profiling.categories.{category}"
                )));
            }
        }
        Ok(())
    }

    fn validate_keyword_markers(&self) -> Result<(), VocabularyError> {
        let m = &self.mandatory;
        let o = &self.optional;
        let mut tables: Vec<(String, &[String])> = vec![
            ("species.keywords".to_string(), m.species.keywords.as_slice()),
            ("species.non_target_indicators".to_string(), m.species.non_target_indicators.as_slice()),
            ("cell_line.blacklist".to_string(), m.cell_line.blacklist.as_slice()),
            ("cell_line.primary_indicators".to_string(), m.cell_line.primary_indicators.as_slice()),
            ("tumor_annotation.tumor_keywords".to_string(), m.tumor_annotation.tumor_keywords.as_slice()),
            ("tumor_annotation.normal_keywords".to_string(), m.tumor_annotation.normal_keywords.as_slice()),
            ("sequencing_method.keywords".to_string(), m.sequencing_method.keywords.as_slice()),
            ("tissue_source.keywords".to_string(), m.tissue_source.keywords.as_slice()),
            ("publication.keywords".to_string(), o.publication.keywords.as_slice()),
        ];
        for (country, aliases) in &o.country.countries {
            tables.push((format!("country.{country}"), aliases.as_slice()));
        }
        for (category, vocab) in &self.profiling.categories {
            tables.push((format!("profiling.{category}"), vocab.content_keywords.as_slice()));
        }

        for (table, keywords) in tables {
            if let Some(bad) = keywords.iter().find(|k| !valid_keyword_marker(k)) {
                return Err(VocabularyError::InvalidKeyword {
                    table,
                    keyword: bad.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_weights(&self) -> Result<(), VocabularyError> {
        let mut min_mandatory = f64::INFINITY;
        let mut max_optional = f64::NEG_INFINITY;
        for criterion in Criterion::ALL {
            let value = *self
                .weights
                .get(&criterion)
                .ok_or(VocabularyError::MissingWeight(criterion))?;
            if !value.is_finite() || value <= 0.0 {
                return Err(VocabularyError::InvalidWeight { criterion, value });
            }
            match criterion.kind() {
                CriterionKind::Mandatory => min_mandatory = min_mandatory.min(value),
                CriterionKind::Optional => max_optional = max_optional.max(value),
            }
        }
        if min_mandatory <= max_optional {
            return Err(VocabularyError::WeightOrdering {
                min_mandatory,
                max_optional,
            });
        }
        Ok(())
    }

    fn validate_grading(&self) -> Result<(), VocabularyError> {
        let g = &self.grading;
        let ordered = [g.e, g.d, g.c, g.b, g.a];
        let ascending = ordered.iter().all(|v| v.is_finite())
            && ordered.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(VocabularyError::GradeBoundaries(format!(
                "e={} d={} c={} b={} a={}",
                g.e, g.d, g.c, g.b, g.a
            )));
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), VocabularyError> {
        let s = &self.optional.sample_size;
        if s.medium_threshold == 0 || s.medium_threshold >= s.large_threshold {
            return Err(VocabularyError::InvalidThreshold(format!(
                "sample size tiers must satisfy 0 < medium ({}) < large ({})",
                s.medium_threshold, s.large_threshold
            )));
        }
        if s.medium_credit == 0 || s.medium_credit > s.large_credit {
            return Err(VocabularyError::InvalidThreshold(format!(
                "sample size credits must satisfy 0 < medium ({}) <= large ({})",
                s.medium_credit, s.large_credit
            )));
        }
        let p = &self.optional.publication;
        if p.partial_credit == 0 || p.partial_credit > p.full_credit {
            return Err(VocabularyError::InvalidThreshold(format!(
                "publication credits must satisfy 0 < partial ({}) <= full ({})",
                p.partial_credit, p.full_credit
            )));
        }
        if self.mandatory.pass_score == 0
            || self.optional.country.credit == 0
            || self.optional.age.credit == 0
        {
            return Err(VocabularyError::InvalidThreshold(
                "pass score and optional credits must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_confidence(&self) -> Result<(), VocabularyError> {
        let c = &self.confidence;
        let factors = [c.presence, c.quality, c.strength, c.context];
        if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(VocabularyError::InvalidConfidence(
                "factor fractions must be finite and non-negative".to_string(),
            ));
        }
        if factors.iter().sum::<f64>() <= 0.0 {
            return Err(VocabularyError::InvalidConfidence(
                "factor fractions must not all be zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&c.review_threshold) {
            return Err(VocabularyError::InvalidConfidence(format!(
                "review threshold {} outside [0, 1]",
                c.review_threshold
            )));
        }
        let p = &self.profiling;
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_unit(p.name_exact_confidence)
            && in_unit(p.name_partial_confidence)
            && in_unit(p.content_confidence)
            && in_unit(p.min_content_ratio))
        {
            return Err(VocabularyError::InvalidConfidence(
                "profiling confidences and ratios must lie in [0, 1]".to_string(),
            ));
        }
        if p.max_samples == 0 {
            return Err(VocabularyError::InvalidConfidence(
                "profiling max_samples must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Largest aggregate contribution the optional criteria can make
    ///
    /// Missing weights count as zero; [`ScreeningConfig::validate`] rejects them.
    #[must_use]
    pub fn max_optional_contribution(&self) -> f64 {
        let o = &self.optional;
        let weight = |c: Criterion| self.weights.get(&c).copied().unwrap_or(0.0);
        f64::from(o.publication.full_credit) * weight(Criterion::Publication)
            + f64::from(o.sample_size.large_credit) * weight(Criterion::SampleSize)
            + f64::from(o.country.credit) * weight(Criterion::Country)
            + f64::from(o.age.credit) * weight(Criterion::Age)
    }
}

/// A `*` may only end a keyword, after a stem of at least three characters
fn valid_keyword_marker(keyword: &str) -> bool {
    match keyword.trim().strip_suffix('*') {
        Some(stem) => !stem.contains('*') && stem.trim().chars().count() >= 3,
        None => !keyword.contains('*'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = ScreeningConfig::load_embedded().unwrap();
        config.validate().unwrap();
        assert!((config.max_optional_contribution() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_weight_rejected() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.weights.remove(&Criterion::Age);
        assert!(matches!(
            config.validate(),
            Err(VocabularyError::MissingWeight(Criterion::Age))
        ));
    }

    #[test]
    fn test_weight_ordering_rejected() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.weights.insert(Criterion::Publication, 5.0);
        assert!(matches!(
            config.validate(),
            Err(VocabularyError::WeightOrdering { .. })
        ));
    }

    #[test]
    fn test_non_ascending_grades_rejected() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.grading.c = config.grading.b;
        assert!(matches!(
            config.validate(),
            Err(VocabularyError::GradeBoundaries(_))
        ));
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.mandatory.tissue_source.keywords.clear();
        match config.validate() {
            Err(VocabularyError::EmptyVocabulary(name)) => {
                assert_eq!(name, "tissue_source.keywords");
            }
            other => panic!("expected empty vocabulary error, got {other:?}"),
        }
    }

    #[test]
    fn test_misplaced_stem_marker_rejected() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.mandatory.tissue_source.keywords.push("br*ain".to_string());
        assert!(matches!(
            config.validate(),
            Err(VocabularyError::InvalidKeyword { ref table, .. }) if table == "tissue_source.keywords"
        ));

        config.mandatory.tissue_source.keywords.pop();
        config.mandatory.tissue_source.keywords.push("ab*".to_string());
        assert!(config.validate().is_err());

        config.mandatory.tissue_source.keywords.pop();
        config.mandatory.tissue_source.keywords.push("adipo*".to_string());
        config.validate().unwrap();
    }

    #[test]
    fn test_confidence_fractions_normalized() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.confidence.presence = 3.0;
        config.confidence.quality = 2.0;
        config.confidence.strength = 3.0;
        config.confidence.context = 2.0;
        let n = config.confidence.normalized();
        assert!((n.presence - 0.3).abs() < 1e-12);
        assert!((n.presence + n.quality + n.strength + n.context - 1.0).abs() < 1e-12);
        assert_eq!(n.min_quality_length, config.confidence.min_quality_length);
    }

    #[test]
    fn test_inverted_sample_tiers_rejected() {
        let mut config = ScreeningConfig::load_embedded().unwrap();
        config.optional.sample_size.medium_threshold = 500;
        assert!(matches!(
            config.validate(),
            Err(VocabularyError::InvalidThreshold(_))
        ));
    }
}
