//! Keyword and pattern matching shared by the criterion evaluators and the
//! column profiler.
//!
//! Keywords match case-insensitively as whole words: the character before the
//! match must not be alphanumeric, and the match must end on a word boundary,
//! optionally after a plural `s` or `es`. So `tumor` matches "tumors" but
//! `normal` does not match "normalized" and `rat` does not match "separation".
//!
//! A keyword ending in [`PREFIX_MARKER`] is a stem and only needs the word
//! start: `transcriptom*` matches "transcriptome" and "transcriptomic".

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::canonical::{normalize_text, FieldText};
use crate::core::types::MatchStrength;

/// Trailing marker for stem keywords
pub const PREFIX_MARKER: char = '*';

/// An ordered, normalized keyword list
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    /// Normalized entries, stems keeping their trailing marker
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Build from raw terms: normalized, blanks dropped, duplicates removed
    /// keeping the first occurrence
    pub fn new<S: AsRef<str>>(terms: impl IntoIterator<Item = S>) -> Self {
        let mut keywords: Vec<String> = Vec::new();
        for term in terms {
            let norm = normalize_text(term.as_ref());
            if !stem(&norm).trim().is_empty() && !keywords.contains(&norm) {
                keywords.push(norm);
            }
        }
        Self { keywords }
    }

    /// First keyword (in configuration order) found in `text`, without its
    /// stem marker
    #[must_use]
    pub fn first_in(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| keyword_in(text, k))
            .map(|k| stem(k))
    }

    /// Keyword equal to the whole of `text`
    #[must_use]
    pub fn exact(&self, text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .map(|k| stem(k))
            .find(|k| *k == text)
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.first_in(text).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Entries as configured, stems with their marker
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

/// Keyword text without a trailing stem marker
fn stem(keyword: &str) -> &str {
    keyword.strip_suffix(PREFIX_MARKER).unwrap_or(keyword)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// True when `rest` starts at a word end, allowing a plural `s` or `es`
fn ends_word(rest: &str) -> bool {
    let bare = |r: &str| r.chars().next().map_or(true, |c| !is_word_char(c));
    bare(rest)
        || rest.strip_prefix('s').is_some_and(bare)
        || rest.strip_prefix("es").is_some_and(bare)
}

/// Whole-word keyword search over already-normalized text; a trailing
/// [`PREFIX_MARKER`] relaxes the word-end requirement
#[must_use]
pub fn keyword_in(text: &str, keyword: &str) -> bool {
    let is_stem = keyword.ends_with(PREFIX_MARKER);
    let keyword = stem(keyword);
    if keyword.is_empty() {
        return false;
    }
    text.match_indices(keyword).any(|(start, _)| {
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        before_ok && (is_stem || ends_word(&text[start + keyword.len()..]))
    })
}

/// Whether a field holds dedicated content or free prose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Dedicated field (organism, cell_type, library_strategy, ...)
    Structured,
    /// Title, summary and similar prose
    FreeText,
}

/// A canonical field offered to a scan
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub name: &'static str,
    pub value: Option<&'a FieldText>,
    pub role: FieldRole,
}

impl<'a> FieldRef<'a> {
    #[must_use]
    pub fn structured(name: &'static str, value: Option<&'a FieldText>) -> Self {
        Self {
            name,
            value,
            role: FieldRole::Structured,
        }
    }

    #[must_use]
    pub fn free_text(name: &'static str, value: Option<&'a FieldText>) -> Self {
        Self {
            name,
            value,
            role: FieldRole::FreeText,
        }
    }
}

/// Where and how a keyword or pattern was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    /// Canonical field name
    pub field: String,
    /// Raw field the canonical value came from
    pub source: String,
    /// Matched keyword or pattern text
    pub term: String,
    pub strength: MatchStrength,
}

/// Outcome of scanning several fields for one vocabulary
#[derive(Debug, Clone)]
pub struct Scan<'a> {
    /// First hit, fields taken in the order given
    pub hit: Option<Hit>,
    /// Number of distinct fields with at least one hit
    pub hit_fields: usize,
    pub considered: usize,
    pub present: usize,
    /// First present field, used for quality checks when nothing matched
    pub first_present: Option<&'a FieldText>,
    /// Field holding the first hit
    pub hit_value: Option<&'a FieldText>,
}

impl<'a> Scan<'a> {
    fn empty(considered: usize) -> Self {
        Self {
            hit: None,
            hit_fields: 0,
            considered,
            present: 0,
            first_present: None,
            hit_value: None,
        }
    }

    #[must_use]
    pub fn matched(&self) -> bool {
        self.hit.is_some()
    }

    /// The field a quality check should look at
    #[must_use]
    pub fn decisive_value(&self) -> Option<&'a FieldText> {
        self.hit_value.or(self.first_present)
    }
}

/// Strength of a keyword found in a field of the given role
#[must_use]
pub fn role_strength(role: FieldRole) -> MatchStrength {
    match role {
        FieldRole::Structured => MatchStrength::Structured,
        FieldRole::FreeText => MatchStrength::FreeText,
    }
}

/// Scan `fields` in order for any keyword of `set`
#[must_use]
pub fn scan_keywords<'a>(set: &KeywordSet, fields: &[FieldRef<'a>]) -> Scan<'a> {
    scan_fields(fields, |text, role| {
        if role == FieldRole::Structured {
            if let Some(k) = set.exact(text) {
                return Some((k.to_string(), MatchStrength::Exact));
            }
        }
        set.first_in(text).map(|k| (k.to_string(), role_strength(role)))
    })
}

/// Scan `fields` in order for the first of `patterns` that matches
#[must_use]
pub fn scan_patterns<'a>(patterns: &[Regex], fields: &[FieldRef<'a>]) -> Scan<'a> {
    scan_fields(fields, |text, role| {
        patterns.iter().find_map(|re| {
            re.find(text)
                .map(|m| (m.as_str().to_string(), role_strength(role)))
        })
    })
}

/// Scan `fields` in order with a custom finder returning `(term, strength)`
pub fn scan_fields<'a, F>(fields: &[FieldRef<'a>], mut find: F) -> Scan<'a>
where
    F: FnMut(&str, FieldRole) -> Option<(String, MatchStrength)>,
{
    let mut scan = Scan::empty(fields.len());
    for field in fields {
        let Some(value) = field.value else {
            continue;
        };
        scan.present += 1;
        if scan.first_present.is_none() {
            scan.first_present = Some(value);
        }
        if let Some((term, strength)) = find(&value.text, field.role) {
            scan.hit_fields += 1;
            if scan.hit.is_none() {
                scan.hit = Some(Hit {
                    field: field.name.to_string(),
                    source: value.source.clone(),
                    term,
                    strength,
                });
                scan.hit_value = Some(value);
            }
        }
    }
    scan
}

/// Compile a list of regex sources, reporting the first invalid one
///
/// # Errors
///
/// Returns the offending pattern text and the regex error.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, (String, regex::Error)> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| (p.clone(), e)))
        .collect()
}
