//! Configuration compiled into matchers: keyword sets, regexes and weight tables.
//!
//! Built once from a validated [`ScreeningConfig`] and shared read-only by the
//! evaluator and the column profiler.

use std::collections::HashSet;

use regex::Regex;

use crate::core::canonical::normalize_text;
use crate::core::types::{ColumnCategory, Criterion};
use crate::screening::matcher::{compile_patterns, KeywordSet};
use crate::vocabulary::config::{
    ConfidenceSettings, GradeBoundaries, ProfilingSettings, SampleSizeRules, ScreeningConfig,
    VocabularyError,
};

/// Which archive an accession belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessionFamily {
    Geo,
    Sra,
}

/// Prefix-anchored accession patterns, e.g. `^(?:SRR|SRP)\d+$`
#[derive(Debug, Clone)]
pub struct AccessionPattern {
    geo: Option<Regex>,
    sra: Option<Regex>,
}

impl AccessionPattern {
    fn new(geo_prefixes: &[String], sra_prefixes: &[String]) -> Result<Self, VocabularyError> {
        Ok(Self {
            geo: prefix_regex("database_id.geo_prefixes", geo_prefixes)?,
            sra: prefix_regex("database_id.sra_prefixes", sra_prefixes)?,
        })
    }

    /// Classify an accession; `None` if it matches neither family
    #[must_use]
    pub fn classify(&self, value: &str) -> Option<AccessionFamily> {
        let value = value.trim();
        if self.geo.as_ref().is_some_and(|re| re.is_match(value)) {
            Some(AccessionFamily::Geo)
        } else if self.sra.as_ref().is_some_and(|re| re.is_match(value)) {
            Some(AccessionFamily::Sra)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.classify(value).is_some()
    }
}

fn prefix_regex(table: &str, prefixes: &[String]) -> Result<Option<Regex>, VocabularyError> {
    let alternatives: Vec<String> = prefixes
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)^(?:{})\d+$", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| VocabularyError::InvalidPattern {
            table: table.to_string(),
            pattern,
            source,
        })
}

/// Per-criterion weights, indexed by [`Criterion::index`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionWeights([f64; Criterion::ALL.len()]);

impl CriterionWeights {
    fn from_config(config: &ScreeningConfig) -> Result<Self, VocabularyError> {
        let mut weights = [0.0; Criterion::ALL.len()];
        for criterion in Criterion::ALL {
            weights[criterion.index()] = *config
                .weights
                .get(&criterion)
                .ok_or(VocabularyError::MissingWeight(criterion))?;
        }
        Ok(Self(weights))
    }

    #[must_use]
    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0[criterion.index()]
    }
}

/// How a profiled column's sample values are recognized
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    pub category: ColumnCategory,
    /// Column-name aliases in normalized `snake_case` form
    pub aliases: Vec<String>,
    pub keywords: KeywordSet,
}

/// The compiled, read-only form of a [`ScreeningConfig`]
#[derive(Debug, Clone)]
pub struct CompiledVocabulary {
    pub pass_score: u32,
    placeholders: HashSet<String>,

    pub species: KeywordSet,
    pub taxon_ids: Vec<String>,
    pub non_target_species: KeywordSet,
    pub cell_lines: KeywordSet,
    pub primary_indicators: KeywordSet,
    pub accessions: AccessionPattern,
    pub tumor: KeywordSet,
    pub normal: KeywordSet,
    pub sequencing: KeywordSet,
    pub tissue: KeywordSet,

    pub publication: KeywordSet,
    pub publication_full_credit: u32,
    pub publication_partial_credit: u32,
    pub sample_patterns: Vec<Regex>,
    pub sample_size: SampleSizeRules,
    /// Canonical country name and its aliases, in name order
    pub countries: Vec<(String, KeywordSet)>,
    pub country_credit: u32,
    pub age_patterns: Vec<Regex>,
    pub age_credit: u32,

    pub weights: CriterionWeights,
    pub grading: GradeBoundaries,
    /// Factor fractions, already normalized
    pub confidence: ConfidenceSettings,
    pub profiling: ProfilingSettings,
    /// In [`ColumnCategory::CLASSIFIABLE`] order
    pub categories: Vec<CategoryMatcher>,

    fingerprint: String,
}

impl CompiledVocabulary {
    /// Validate and compile a configuration
    ///
    /// # Errors
    ///
    /// Returns any [`ScreeningConfig::validate`] error, or
    /// `VocabularyError::InvalidPattern` for a regex that does not compile.
    pub fn compile(config: &ScreeningConfig) -> Result<Self, VocabularyError> {
        config.validate()?;

        let m = &config.mandatory;
        let o = &config.optional;

        let patterns = |table: &str, sources: &[String]| {
            compile_patterns(sources).map_err(|(pattern, source)| VocabularyError::InvalidPattern {
                table: table.to_string(),
                pattern,
                source,
            })
        };

        let countries = o
            .country
            .countries
            .iter()
            .map(|(name, aliases)| {
                // The canonical name always counts as its own alias
                let all = std::iter::once(name.as_str()).chain(aliases.iter().map(String::as_str));
                (name.clone(), KeywordSet::new(all))
            })
            .collect::<Vec<_>>();

        let mut compiled = Self {
            pass_score: m.pass_score,
            placeholders: config.placeholders.iter().map(|p| normalize_text(p)).collect(),

            species: KeywordSet::new(&m.species.keywords),
            taxon_ids: m
                .species
                .taxon_ids
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            non_target_species: KeywordSet::new(&m.species.non_target_indicators),
            cell_lines: KeywordSet::new(&m.cell_line.blacklist),
            primary_indicators: KeywordSet::new(&m.cell_line.primary_indicators),
            accessions: AccessionPattern::new(
                &m.database_id.geo_prefixes,
                &m.database_id.sra_prefixes,
            )?,
            tumor: KeywordSet::new(&m.tumor_annotation.tumor_keywords),
            normal: KeywordSet::new(&m.tumor_annotation.normal_keywords),
            sequencing: KeywordSet::new(&m.sequencing_method.keywords),
            tissue: KeywordSet::new(&m.tissue_source.keywords),

            publication: KeywordSet::new(&o.publication.keywords),
            publication_full_credit: o.publication.full_credit,
            publication_partial_credit: o.publication.partial_credit,
            sample_patterns: patterns("sample_size.patterns", &o.sample_size.patterns)?,
            sample_size: o.sample_size.clone(),
            countries,
            country_credit: o.country.credit,
            age_patterns: patterns("age.patterns", &o.age.patterns)?,
            age_credit: o.age.credit,

            weights: CriterionWeights::from_config(config)?,
            grading: config.grading,
            confidence: config.confidence.normalized(),
            profiling: config.profiling.clone(),
            categories: Vec::new(),

            fingerprint: config.fingerprint(),
        };
        compiled.categories = compiled.build_category_matchers(config);
        Ok(compiled)
    }

    fn build_category_matchers(&self, config: &ScreeningConfig) -> Vec<CategoryMatcher> {
        ColumnCategory::CLASSIFIABLE
            .iter()
            .filter_map(|&category| {
                let vocab = config.profiling.categories.get(&category)?;
                let linked: Vec<&str> = match category {
                    ColumnCategory::Species => self
                        .species
                        .iter()
                        .chain(self.non_target_species.iter())
                        .collect(),
                    ColumnCategory::CellType => self.cell_lines.iter().collect(),
                    ColumnCategory::Tissue => self.tissue.iter().collect(),
                    ColumnCategory::Sequencing => self.sequencing.iter().collect(),
                    ColumnCategory::Geographic => {
                        self.countries.iter().flat_map(|(_, set)| set.iter()).collect()
                    }
                    ColumnCategory::DiseaseState => {
                        self.tumor.iter().chain(self.normal.iter()).collect()
                    }
                    ColumnCategory::Publication => self.publication.iter().collect(),
                    // Pattern-backed or keyword-only categories
                    ColumnCategory::SampleInfo
                    | ColumnCategory::Age
                    | ColumnCategory::DatabaseId
                    | ColumnCategory::Other => Vec::new(),
                };
                let keywords = KeywordSet::new(
                    linked
                        .into_iter()
                        .chain(vocab.content_keywords.iter().map(String::as_str)),
                );
                Some(CategoryMatcher {
                    category,
                    aliases: vocab.name_aliases.iter().map(|a| column_key(a)).collect(),
                    keywords,
                })
            })
            .collect()
    }

    /// Whether a normalized sample value looks like content of `category`
    #[must_use]
    pub fn content_matches(&self, matcher: &CategoryMatcher, value: &str) -> bool {
        match matcher.category {
            ColumnCategory::DatabaseId => self.accessions.is_match(value),
            ColumnCategory::Age => {
                self.age_patterns.iter().any(|re| re.is_match(value)) || is_plain_age(value)
            }
            ColumnCategory::Species => {
                self.is_target_taxon(value) || matcher.keywords.matches(value)
            }
            _ => matcher.keywords.matches(value),
        }
    }

    /// Whether `value` names a required taxon; `9606.0` matches `9606`
    #[must_use]
    pub fn is_target_taxon(&self, value: &str) -> bool {
        let value = value.trim();
        let number = taxon_number(value);
        self.taxon_ids
            .iter()
            .any(|id| id == value || (number.is_some() && taxon_number(id) == number))
    }

    /// True for values that carry no real content (`n/a`, `unknown`, ...)
    #[must_use]
    pub fn is_placeholder(&self, text: &str) -> bool {
        self.placeholders.contains(text)
    }

    /// MD5 digest of the configuration this was compiled from
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Integer taxon id, also accepting a whole float such as `9606.0`
fn taxon_number(text: &str) -> Option<u64> {
    let text = text.trim();
    text.parse::<u64>().ok().or_else(|| {
        let value: f64 = text.parse().ok()?;
        if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < 1e15) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let id = value as u64;
        Some(id)
    })
}

/// Bare ages like "45" in a dedicated age column
fn is_plain_age(value: &str) -> bool {
    value.len() <= 3 && value.parse::<u16>().is_ok_and(|n| n <= 120)
}

/// Normalize a column name: lower-case, non-alphanumerics to `_`, runs collapsed
#[must_use]
pub fn column_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_string()
}
