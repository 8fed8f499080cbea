use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::types::ColumnCategory;
use crate::profiling::column::{
    infer_data_type, ColumnProfile, ProfileEvidence, SampleStats, TableColumn, TableSample,
};
use crate::utils::validation::count_to_f64;
use crate::vocabulary::compiled::{column_key, CategoryMatcher, CompiledVocabulary};
use crate::vocabulary::config::{ScreeningConfig, VocabularyError};

/// Profiles of every column plus a relevance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceMap {
    pub table: String,
    /// In column order
    pub profiles: Vec<ColumnProfile>,
    /// Classified column names, most confident first
    pub ranking: Vec<String>,
    /// Classified column names per category, in ranking order
    pub by_category: BTreeMap<ColumnCategory, Vec<String>>,
}

impl RelevanceMap {
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&ColumnProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Classifies table columns into domain categories by name, then by content
#[derive(Debug, Clone)]
pub struct ColumnProfiler {
    vocab: CompiledVocabulary,
    max_samples: usize,
}

impl ColumnProfiler {
    /// Build a profiler from a configuration
    ///
    /// # Errors
    ///
    /// Returns a `VocabularyError` if the configuration does not compile.
    pub fn new(config: &ScreeningConfig) -> Result<Self, VocabularyError> {
        Ok(Self::from_vocabulary(CompiledVocabulary::compile(config)?))
    }

    #[must_use]
    pub fn from_vocabulary(vocab: CompiledVocabulary) -> Self {
        let max_samples = vocab.profiling.max_samples;
        Self { vocab, max_samples }
    }

    /// Override the configured per-column sample bound (minimum 1)
    #[must_use]
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(1);
        self
    }

    /// Profile every column of a table sample
    #[must_use]
    pub fn profile_table(&self, table: &TableSample) -> RelevanceMap {
        if table.columns.is_empty() {
            warn!("Table '{}' has no columns to profile", table.table);
        }

        let profiles: Vec<ColumnProfile> = table
            .columns
            .iter()
            .enumerate()
            .map(|(ordinal, column)| self.profile_column(column, ordinal))
            .collect();

        let mut ranked: Vec<&ColumnProfile> = profiles
            .iter()
            .filter(|p| p.category != ColumnCategory::Other)
            .collect();
        ranked.sort_by(|a, b| rank_order(a, b));

        let ranking: Vec<String> = ranked.iter().map(|p| p.name.clone()).collect();
        let mut by_category: BTreeMap<ColumnCategory, Vec<String>> = BTreeMap::new();
        for profile in &ranked {
            by_category
                .entry(profile.category)
                .or_default()
                .push(profile.name.clone());
        }

        info!(
            "Profiled table '{}': {} columns, {} classified",
            table.table,
            profiles.len(),
            ranking.len()
        );

        RelevanceMap {
            table: table.table.clone(),
            profiles,
            ranking,
            by_category,
        }
    }

    /// Profile one column
    #[must_use]
    pub fn profile_column(&self, column: &TableColumn, ordinal: usize) -> ColumnProfile {
        let stats = SampleStats::collect(&column.samples, self.max_samples, &self.vocab);
        let settings = &self.vocab.profiling;

        let (category, evidence, confidence) = if let Some((category, exact)) =
            self.classify_name(&column.name)
        {
            let confidence = if exact {
                settings.name_exact_confidence
            } else {
                settings.name_partial_confidence
            };
            (category, ProfileEvidence::Name, confidence)
        } else if let Some((category, ratio)) = self.classify_content(&stats) {
            (
                category,
                ProfileEvidence::Content,
                settings.content_confidence * ratio,
            )
        } else {
            (ColumnCategory::Other, ProfileEvidence::None, 0.0)
        };

        let null_ratio = stats.null_ratio();
        debug!(
            "column {} ({}): {} via {:?} at {:.2}",
            ordinal, column.name, category, evidence, confidence
        );

        ColumnProfile {
            name: column.name.clone(),
            ordinal,
            data_type: column
                .data_type
                .clone()
                .unwrap_or_else(|| infer_data_type(&column.samples)),
            category,
            evidence,
            confidence,
            relevance: confidence * (1.0 - null_ratio),
            null_ratio,
            distinct_ratio: stats.distinct_ratio(),
            sampled: stats.sampled,
        }
    }

    /// Name phase: exact alias first, then the longest alias the column name
    /// ends with; ties go to taxonomy order.
    fn classify_name(&self, name: &str) -> Option<(ColumnCategory, bool)> {
        let key = column_key(name);
        if key.is_empty() {
            return None;
        }

        let categories = &self.vocab.categories;
        if let Some(m) = categories.iter().find(|m| m.aliases.iter().any(|a| *a == key)) {
            return Some((m.category, true));
        }

        let tokens: Vec<&str> = key.split('_').collect();
        let tokens = without_channel(&tokens);
        let mut best: Option<(ColumnCategory, usize)> = None;
        for matcher in categories {
            let longest = longest_token_alias(matcher, tokens);
            if longest > best.map_or(0, |(_, len)| len) {
                best = Some((matcher.category, longest));
            }
        }
        best.map(|(category, _)| (category, false))
    }

    /// Content phase: best hit ratio over non-null values, if above the minimum
    fn classify_content(&self, stats: &SampleStats) -> Option<(ColumnCategory, f64)> {
        if stats.values.is_empty() {
            return None;
        }
        let total = count_to_f64(stats.values.len());
        let mut best: Option<(ColumnCategory, f64)> = None;
        for matcher in &self.vocab.categories {
            let hits = stats
                .values
                .iter()
                .filter(|v| self.vocab.content_matches(matcher, v))
                .count();
            if hits == 0 {
                continue;
            }
            let ratio = count_to_f64(hits) / total;
            if ratio > best.map_or(0.0, |(_, r)| r) {
                best = Some((matcher.category, ratio));
            }
        }
        best.filter(|(_, ratio)| *ratio >= self.vocab.profiling.min_content_ratio)
    }
}

/// Token length of the longest alias that ends the token run.
///
/// Anchoring at the end keeps qualifiers on the left (`donor_age`) while
/// rejecting prefixes like `gse` in `gse_title`.
fn longest_token_alias(matcher: &CategoryMatcher, tokens: &[&str]) -> usize {
    matcher
        .aliases
        .iter()
        .filter_map(|alias| {
            let alias_tokens: Vec<&str> = alias.split('_').collect();
            tokens
                .ends_with(alias_tokens.as_slice())
                .then_some(alias_tokens.len())
        })
        .max()
        .unwrap_or(0)
}

/// Drop a trailing GEO channel token (`ch1`, `ch2`, ...)
fn without_channel<'a, 'b>(tokens: &'a [&'b str]) -> &'a [&'b str] {
    match tokens.split_last() {
        Some((last, rest))
            if !rest.is_empty()
                && last.len() > 2
                && last.starts_with("ch")
                && last[2..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => tokens,
    }
}

/// Confidence descending, name evidence before content, then column order
fn rank_order(a: &ColumnProfile, b: &ColumnProfile) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(a.evidence.cmp(&b.evidence))
        .then(a.ordinal.cmp(&b.ordinal))
}
