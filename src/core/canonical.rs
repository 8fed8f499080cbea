//! Field normalization: heterogeneous GEO/SRA rows to one canonical view.
//!
//! Every evaluator reads only [`CanonicalRecord`]. Raw field names never leak
//! past this module.

use serde::{Deserialize, Serialize};

use crate::core::record::{FieldValue, RawRecord};
use crate::core::types::SourceShape;

/// Alias lists for one canonical field.
///
/// Lookup order is the record shape's own list, then `generic`, then the other
/// shape's list.
struct Aliases {
    geo: &'static [&'static str],
    sra: &'static [&'static str],
    generic: &'static [&'static str],
}

impl Aliases {
    fn ordered(&self, shape: SourceShape) -> impl Iterator<Item = &'static str> {
        let (first, last) = match shape {
            SourceShape::Sra => (self.sra, self.geo),
            // GEO-first for integrated and unknown rows: series-level text is richer
            SourceShape::Geo | SourceShape::Integrated | SourceShape::Unknown => {
                (self.geo, self.sra)
            }
        };
        let generic = self.generic;
        first.iter().chain(generic.iter()).chain(last.iter()).copied()
    }
}

const ORGANISM: Aliases = Aliases {
    geo: &["organism", "organism_ch1", "geo_organism"],
    sra: &["scientific_name", "sra_organism", "common_name"],
    generic: &["species"],
};

const TAXON_ID: Aliases = Aliases {
    geo: &["taxid_ch1"],
    sra: &["taxon_id"],
    generic: &["taxid", "tax_id"],
};

const TITLE: Aliases = Aliases {
    geo: &["gse_title", "geo_title"],
    sra: &["study_title", "sra_study_title"],
    generic: &["title"],
};

const SUMMARY: Aliases = Aliases {
    geo: &["summary", "geo_summary", "overall_design"],
    sra: &["study_abstract", "sra_study_abstract", "study_description"],
    generic: &["abstract", "description"],
};

const CELL_TYPE: Aliases = Aliases {
    geo: &["cell_type_ch1"],
    sra: &["sra_cell_type"],
    generic: &["cell_type", "celltype"],
};

const SOURCE_NAME: Aliases = Aliases {
    geo: &["source_name_ch1", "geo_source_name"],
    sra: &["sample_name", "sra_tissue"],
    generic: &["source_name", "tissue"],
};

const DISEASE: Aliases = Aliases {
    geo: &["disease_state_ch1"],
    sra: &["sra_disease"],
    generic: &["disease", "disease_state", "condition", "phenotype"],
};

const LIBRARY_STRATEGY: Aliases = Aliases {
    geo: &["technology", "library_strategy_ch1", "molecule_ch1"],
    sra: &["library_strategy", "sra_library_strategy", "instrument_model"],
    generic: &["platform", "assay"],
};

const COUNTRY: Aliases = Aliases {
    geo: &["geo_country", "contact_country"],
    sra: &["sra_country", "geo_loc_name"],
    generic: &["country"],
};

const CHARACTERISTICS: Aliases = Aliases {
    geo: &["characteristics_ch1", "geo_characteristics"],
    sra: &["sample_attributes", "sra_sample_attributes"],
    generic: &["characteristics", "age"],
};

const SAMPLE_COUNT: Aliases = Aliases {
    geo: &["sample_count", "gsm_count", "n_gsm"],
    sra: &["sra_sample_count"],
    generic: &["n_samples", "num_samples", "sample_size"],
};

const ACCESSIONS: Aliases = Aliases {
    geo: &["gse", "geo_accession"],
    sra: &[
        "run_accession",
        "sra_run_accession",
        "study_accession",
        "sra_study_accession",
    ],
    generic: &["accession"],
};

const PUBLICATION_IDS: Aliases = Aliases {
    geo: &["pubmed_id", "geo_pubmed_id"],
    sra: &["sra_pubmed_id"],
    generic: &["pmid", "pubmed_ids", "doi", "pmc_id", "pmcid"],
};

const GEO_ONLY: &[&str] = &["gse", "gse_title", "organism_ch1", "source_name_ch1", "geo_accession"];
const SRA_ONLY: &[&str] = &["run_accession", "study_title", "study_abstract", "scientific_name"];

/// A resolved text field: the lower-cased value plus the raw field it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldText {
    pub source: String,
    pub text: String,
}

/// An identifier value with its raw field name; the value keeps its original case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub source: String,
    pub value: String,
}

/// Result of lenient numeric parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum NumericField {
    Absent,
    /// A field was present but held no leading integer
    Malformed,
    Value(u64),
}

impl NumericField {
    #[must_use]
    pub fn value(self) -> Option<u64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent | Self::Malformed => None,
        }
    }
}

/// Canonical, source-independent view of a metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub source: SourceShape,
    pub record_id: Option<String>,
    pub organism: Option<FieldText>,
    pub taxon_id: Option<FieldText>,
    pub title: Option<FieldText>,
    pub summary: Option<FieldText>,
    pub cell_type: Option<FieldText>,
    pub source_name: Option<FieldText>,
    pub disease: Option<FieldText>,
    pub library_strategy: Option<FieldText>,
    pub country: Option<FieldText>,
    pub characteristics: Option<FieldText>,
    pub accessions: Vec<Identifier>,
    pub publication_ids: Vec<Identifier>,
    pub sample_count: NumericField,
}

impl CanonicalRecord {
    /// Normalize a raw record. Never fails: anything unusable is simply absent.
    #[must_use]
    pub fn from_raw(raw: &RawRecord) -> Self {
        let source = detect_shape(raw);

        let accessions = collect_identifiers(raw, &ACCESSIONS, source);
        let publication_ids = collect_identifiers(raw, &PUBLICATION_IDS, source);
        let record_id = accessions.first().map(|a| a.value.clone());

        Self {
            source,
            record_id,
            organism: resolve_text(raw, &ORGANISM, source),
            taxon_id: resolve_text(raw, &TAXON_ID, source),
            title: resolve_text(raw, &TITLE, source),
            summary: resolve_text(raw, &SUMMARY, source),
            cell_type: resolve_text(raw, &CELL_TYPE, source),
            source_name: resolve_text(raw, &SOURCE_NAME, source),
            disease: resolve_text(raw, &DISEASE, source),
            library_strategy: resolve_text(raw, &LIBRARY_STRATEGY, source),
            country: resolve_text(raw, &COUNTRY, source),
            characteristics: resolve_text(raw, &CHARACTERISTICS, source),
            accessions,
            publication_ids,
            sample_count: resolve_numeric(raw, &SAMPLE_COUNT, source),
        }
    }

    /// Number of populated text fields, for diagnostics
    #[must_use]
    pub fn populated_fields(&self) -> usize {
        [
            &self.organism,
            &self.taxon_id,
            &self.title,
            &self.summary,
            &self.cell_type,
            &self.source_name,
            &self.disease,
            &self.library_strategy,
            &self.country,
            &self.characteristics,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
    }
}

fn detect_shape(raw: &RawRecord) -> SourceShape {
    if let Some(explicit) = raw.get("data_source").and_then(FieldValue::as_text) {
        match explicit.to_ascii_uppercase().as_str() {
            "GEO" => return SourceShape::Geo,
            "SRA" => return SourceShape::Sra,
            "GEO+SRA" | "INTEGRATED" => return SourceShape::Integrated,
            _ => {}
        }
    }

    let has_geo = GEO_ONLY.iter().any(|k| raw.contains(k));
    let has_sra = SRA_ONLY.iter().any(|k| raw.contains(k));
    match (has_geo, has_sra) {
        (true, true) => SourceShape::Integrated,
        (true, false) => SourceShape::Geo,
        (false, true) => SourceShape::Sra,
        (false, false) => SourceShape::Unknown,
    }
}

fn resolve_text(raw: &RawRecord, aliases: &Aliases, shape: SourceShape) -> Option<FieldText> {
    aliases.ordered(shape).find_map(|name| {
        raw.get(name)
            .and_then(FieldValue::as_text)
            .map(|value| FieldText {
                source: name.to_string(),
                text: normalize_text(&value),
            })
    })
}

fn collect_identifiers(raw: &RawRecord, aliases: &Aliases, shape: SourceShape) -> Vec<Identifier> {
    let mut out: Vec<Identifier> = Vec::new();
    for name in aliases.ordered(shape) {
        if let Some(value) = raw.get(name).and_then(FieldValue::as_text) {
            // Multi-valued cells ("123; 456") are split into separate identifiers
            for part in value.split([';', ',', '|']) {
                let part = part.trim();
                if !part.is_empty() && !out.iter().any(|i| i.value == part) {
                    out.push(Identifier {
                        source: name.to_string(),
                        value: part.to_string(),
                    });
                }
            }
        }
    }
    out
}

/// First alias that parses wins; `Malformed` only when no alias parses and one was present
fn resolve_numeric(raw: &RawRecord, aliases: &Aliases, shape: SourceShape) -> NumericField {
    let mut resolved = NumericField::Absent;
    for value in aliases.ordered(shape).filter_map(|name| raw.get(name)) {
        match parse_lenient_count(value) {
            NumericField::Value(n) => return NumericField::Value(n),
            NumericField::Malformed => resolved = NumericField::Malformed,
            NumericField::Absent => {}
        }
    }
    resolved
}

/// Lower-case, trim and collapse internal whitespace
#[must_use]
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a count leniently.
///
/// Numbers are taken as-is when finite and non-negative (fractions truncated).
/// Strings yield their leading integer: `"150 samples"` is 150, `"1,200"` is
/// 1200. Anything else is [`NumericField::Malformed`].
#[must_use]
pub fn parse_lenient_count(value: &FieldValue) -> NumericField {
    match value {
        FieldValue::Null => NumericField::Absent,
        FieldValue::Bool(_) => NumericField::Malformed,
        FieldValue::Number(n) => {
            if n.is_finite() && *n >= 0.0 && *n < 1e18 {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                NumericField::Value(n.trunc() as u64)
            } else {
                NumericField::Malformed
            }
        }
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return NumericField::Absent;
            }
            leading_integer(trimmed).map_or(NumericField::Malformed, NumericField::Value)
        }
    }
}

fn leading_integer(s: &str) -> Option<u64> {
    let s = s.strip_prefix('+').unwrap_or(s);
    let mut digits = String::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else if c == ',' && !digits.is_empty() {
            // Accept thousands separators only when followed by a digit
            chars.next();
            if !chars.peek().is_some_and(char::is_ascii_digit) {
                break;
            }
        } else {
            break;
        }
    }
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_record() -> RawRecord {
        RawRecord::new()
            .with("gse", "GSE123456")
            .with("GSE_TITLE", "  Single-cell   RNA-seq of Human Brain ")
            .with("summary", "We profiled tissue")
            .with("organism", "Homo sapiens")
            .with("pubmed_id", "12345678")
            .with("sample_count", "48")
    }

    #[test]
    fn test_geo_shape_and_fields() {
        let record = CanonicalRecord::from_raw(&geo_record());
        assert_eq!(record.source, SourceShape::Geo);
        assert_eq!(record.record_id.as_deref(), Some("GSE123456"));

        let title = record.title.unwrap();
        assert_eq!(title.source, "gse_title");
        assert_eq!(title.text, "single-cell rna-seq of human brain");

        assert_eq!(record.organism.unwrap().text, "homo sapiens");
        assert_eq!(record.publication_ids.len(), 1);
        assert_eq!(record.sample_count, NumericField::Value(48));
    }

    #[test]
    fn test_sra_precedence_over_generic() {
        let raw = RawRecord::new()
            .with("run_accession", "SRR1")
            .with("title", "generic title")
            .with("study_title", "sra title");
        let record = CanonicalRecord::from_raw(&raw);
        assert_eq!(record.source, SourceShape::Sra);
        assert_eq!(record.title.unwrap().text, "sra title");
    }

    #[test]
    fn test_generic_fallback() {
        let raw = RawRecord::new().with("title", "only generic");
        let record = CanonicalRecord::from_raw(&raw);
        assert_eq!(record.source, SourceShape::Unknown);
        assert_eq!(record.title.unwrap().source, "title");
    }

    #[test]
    fn test_explicit_data_source_wins() {
        let raw = RawRecord::new()
            .with("data_source", "sra")
            .with("gse", "GSE1")
            .with("gse_title", "geo title")
            .with("study_title", "sra title");
        let record = CanonicalRecord::from_raw(&raw);
        assert_eq!(record.source, SourceShape::Sra);
        assert_eq!(record.title.unwrap().text, "sra title");
    }

    #[test]
    fn test_integrated_collects_all_accessions() {
        let raw = RawRecord::new()
            .with("geo_accession", "GSE9")
            .with("sra_run_accession", "SRR9")
            .with("study_title", "x");
        let record = CanonicalRecord::from_raw(&raw);
        assert_eq!(record.source, SourceShape::Integrated);
        let values: Vec<&str> = record.accessions.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["GSE9", "SRR9"]);
    }

    #[test]
    fn test_malformed_count_falls_through_to_next_alias() {
        let raw = geo_record()
            .with("sample_count", "unknown")
            .with("gsm_count", "24 GSMs");
        assert_eq!(
            CanonicalRecord::from_raw(&raw).sample_count,
            NumericField::Value(24)
        );

        let all_bad = geo_record().with("sample_count", "many");
        assert_eq!(
            CanonicalRecord::from_raw(&all_bad).sample_count,
            NumericField::Malformed
        );
    }

    #[test]
    fn test_lenient_count_parsing() {
        assert_eq!(parse_lenient_count(&"150 samples".into()), NumericField::Value(150));
        assert_eq!(parse_lenient_count(&"1,200".into()), NumericField::Value(1200));
        assert_eq!(parse_lenient_count(&"12,".into()), NumericField::Value(12));
        assert_eq!(parse_lenient_count(&"about 20".into()), NumericField::Malformed);
        assert_eq!(parse_lenient_count(&"   ".into()), NumericField::Absent);
        assert_eq!(parse_lenient_count(&FieldValue::Number(-3.0)), NumericField::Malformed);
        assert_eq!(parse_lenient_count(&FieldValue::Number(33.9)), NumericField::Value(33));
        assert_eq!(
            parse_lenient_count(&"99999999999999999999999".into()),
            NumericField::Malformed
        );
    }

    #[test]
    fn test_empty_record_is_all_absent() {
        let record = CanonicalRecord::from_raw(&RawRecord::new());
        assert_eq!(record.populated_fields(), 0);
        assert!(record.accessions.is_empty());
        assert_eq!(record.sample_count, NumericField::Absent);
        assert!(record.record_id.is_none());
    }

    #[test]
    fn test_multi_valued_identifiers_split() {
        let raw = RawRecord::new().with("pubmed_id", "111; 222;111");
        let record = CanonicalRecord::from_raw(&raw);
        let ids: Vec<&str> = record.publication_ids.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(ids, vec!["111", "222"]);
    }
}
