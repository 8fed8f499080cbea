//! The six mandatory checks.
//!
//! Each check reads only the [`CanonicalRecord`] and returns 0 or the
//! configured pass score. Absent fields are "no evidence", never negative
//! evidence: a record with no descriptive text fails the keyword checks but
//! passes the cell-line exclusion.

use crate::core::canonical::{CanonicalRecord, FieldText};
use crate::core::types::{Criterion, MatchStrength};
use crate::screening::matcher::{scan_keywords, FieldRef, FieldRole, KeywordSet};
use crate::screening::outcome::{CriterionOutcome, Evidence};
use crate::vocabulary::compiled::{AccessionFamily, CompiledVocabulary};

/// Accessions listed in a failure reason
const MAX_LISTED_ACCESSIONS: usize = 5;

fn text_of(value: Option<&FieldText>) -> Option<&str> {
    value.map(|v| v.text.as_str())
}

fn pass_or_zero(vocab: &CompiledVocabulary, passed: bool) -> u32 {
    if passed {
        vocab.pass_score
    } else {
        0
    }
}

/// Database identifier: any accession matching a GEO or SRA prefix pattern
#[must_use]
pub fn database_id(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let mut evidence = Evidence::none(1);
    evidence.fields_present = usize::from(!record.accessions.is_empty());

    let valid: Vec<_> = record
        .accessions
        .iter()
        .filter_map(|a| vocab.accessions.classify(&a.value).map(|family| (a, family)))
        .collect();

    let (passed, decisive, reason) = if let Some((accession, family)) = valid.first() {
        evidence.strength = MatchStrength::Exact;
        evidence.matched_field = Some(accession.source.clone());
        evidence.matched_term = Some(accession.value.clone());
        evidence.corroborated = valid.len() >= 2;
        let archive = match family {
            AccessionFamily::Geo => "GEO",
            AccessionFamily::Sra => "SRA",
        };
        (
            true,
            Some(accession.value.as_str()),
            format!("{archive} accession {} in {}", accession.value, accession.source),
        )
    } else if record.accessions.is_empty() {
        (false, None, "no accession field".to_string())
    } else {
        let listed: Vec<&str> = record
            .accessions
            .iter()
            .take(MAX_LISTED_ACCESSIONS)
            .map(|a| a.value.as_str())
            .collect();
        (
            false,
            record.accessions.first().map(|a| a.value.as_str()),
            format!("no valid GEO or SRA accession among {}", listed.join(", ")),
        )
    };

    CriterionOutcome::conclude(
        Criterion::DatabaseId,
        pass_or_zero(vocab, passed),
        evidence,
        decisive,
        reason,
        vocab,
    )
}

/// Species: required taxon id, or a species keyword in organism, title or summary.
///
/// A non-target organism in the structured organism field fails the record
/// even when prose mentions the required species.
#[must_use]
pub fn species(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("organism", record.organism.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let scan = scan_keywords(&vocab.species, &fields);

    let taxon = record.taxon_id.as_ref();
    let taxon_hit = taxon.filter(|t| vocab.is_target_taxon(&t.text));
    let organism_hit = scan.hit.as_ref().is_some_and(|h| h.field == "organism");
    let non_target_organism = scan_keywords(&vocab.non_target_species, &fields[..1]).hit;

    let mut evidence = Evidence::from_scan(&scan);
    evidence.fields_considered += 1;
    evidence.fields_present += usize::from(taxon.is_some());

    let (passed, decisive, reason) = if let Some(t) = taxon_hit {
        evidence.strength = MatchStrength::Exact;
        evidence.matched_field = Some(t.source.clone());
        evidence.matched_term = Some(t.text.clone());
        evidence.corroborated = scan.matched();
        (true, Some(t.text.as_str()), format!("taxon id {} in {}", t.text, t.source))
    } else if let Some(other) = non_target_organism.filter(|_| !organism_hit) {
        evidence.strength = other.strength;
        evidence.matched_field = Some(other.source.clone());
        evidence.matched_term = Some(other.term.clone());
        (
            false,
            text_of(record.organism.as_ref()),
            format!(
                "non-target organism '{}' in {} overrides free-text species mentions",
                other.term, other.source
            ),
        )
    } else if let Some(hit) = &scan.hit {
        (
            true,
            text_of(scan.decisive_value()),
            format!("'{}' in {}", hit.term, hit.source),
        )
    } else {
        let decisive = text_of(scan.decisive_value()).or(text_of(taxon));
        let reason = match scan_keywords(&vocab.non_target_species, &fields).hit {
            Some(other) => format!(
                "required species not found; non-target organism '{}' in {}",
                other.term, other.source
            ),
            None if evidence.fields_present == 0 => {
                "no organism, taxon id, title or summary to check".to_string()
            }
            None => "required species not found in organism, title or summary".to_string(),
        };
        (false, decisive, reason)
    };

    CriterionOutcome::conclude(
        Criterion::Species,
        pass_or_zero(vocab, passed),
        evidence,
        decisive,
        reason,
        vocab,
    )
}

/// Cell-line exclusion: fails on any blacklist keyword, passes otherwise.
///
/// A pass has no matched keyword, so its strength reflects what was
/// inspected: a dedicated field, prose only, or nothing.
#[must_use]
pub fn cell_line(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("cell_type", record.cell_type.as_ref()),
        FieldRef::structured("source_name", record.source_name.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let scan = scan_keywords(&vocab.cell_lines, &fields);
    let mut evidence = Evidence::from_scan(&scan);

    let (passed, reason) = if let Some(hit) = &scan.hit {
        (
            false,
            format!("cell line indicator '{}' in {}", hit.term, hit.source),
        )
    } else {
        evidence.strength = inspected_strength(&fields);
        let primary = scan_keywords(&vocab.primary_indicators, &fields);
        let reason = if let Some(indicator) = &primary.hit {
            evidence.corroborated = true;
            evidence.matched_field = Some(indicator.source.clone());
            evidence.matched_term = Some(indicator.term.clone());
            format!(
                "no cell line indicators; primary material '{}' in {}",
                indicator.term, indicator.source
            )
        } else if scan.present == 0 {
            "no cell line indicators (no descriptive fields present)".to_string()
        } else {
            "no cell line indicators in cell type, source name, title or summary".to_string()
        };
        (true, reason)
    };

    CriterionOutcome::conclude(
        Criterion::CellLine,
        pass_or_zero(vocab, passed),
        evidence,
        text_of(scan.decisive_value()),
        reason,
        vocab,
    )
}

fn inspected_strength(fields: &[FieldRef<'_>]) -> MatchStrength {
    let present = |role: FieldRole| fields.iter().any(|f| f.role == role && f.value.is_some());
    if present(FieldRole::Structured) {
        MatchStrength::Structured
    } else if present(FieldRole::FreeText) {
        MatchStrength::FreeText
    } else {
        MatchStrength::None
    }
}

/// Tumor/condition annotation: tumor-side or normal-side vocabulary present
#[must_use]
pub fn tumor_annotation(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("disease", record.disease.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let tumor = scan_keywords(&vocab.tumor, &fields);
    let normal = scan_keywords(&vocab.normal, &fields);

    let tumor_strength = tumor.hit.as_ref().map_or(MatchStrength::None, |h| h.strength);
    let normal_strength = normal.hit.as_ref().map_or(MatchStrength::None, |h| h.strength);
    // Stronger side wins; tumor on ties
    let (side, scan) = if normal_strength > tumor_strength {
        ("normal", normal)
    } else {
        ("tumor", tumor)
    };

    let evidence = Evidence::from_scan(&scan);
    let (passed, reason) = match &scan.hit {
        Some(hit) => (
            true,
            format!("{side} annotation '{}' in {}", hit.term, hit.source),
        ),
        None => (
            false,
            "no tumor or normal annotation in disease, title or summary".to_string(),
        ),
    };

    CriterionOutcome::conclude(
        Criterion::TumorAnnotation,
        pass_or_zero(vocab, passed),
        evidence,
        text_of(scan.decisive_value()),
        reason,
        vocab,
    )
}

/// Sequencing method: assay or platform keyword in library strategy, title or summary
#[must_use]
pub fn sequencing_method(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("library_strategy", record.library_strategy.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    keyword_check(
        Criterion::SequencingMethod,
        &vocab.sequencing,
        &fields,
        "sequencing method",
        "library strategy, title or summary",
        vocab,
    )
}

/// Tissue source: organ or tissue keyword in source name, title or summary
#[must_use]
pub fn tissue_source(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("source_name", record.source_name.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    keyword_check(
        Criterion::TissueSource,
        &vocab.tissue,
        &fields,
        "tissue",
        "source name, title or summary",
        vocab,
    )
}

fn keyword_check(
    criterion: Criterion,
    set: &KeywordSet,
    fields: &[FieldRef<'_>],
    what: &str,
    where_: &str,
    vocab: &CompiledVocabulary,
) -> CriterionOutcome {
    let scan = scan_keywords(set, fields);
    let evidence = Evidence::from_scan(&scan);
    let (passed, reason) = match &scan.hit {
        Some(hit) => (true, format!("{what} '{}' in {}", hit.term, hit.source)),
        None => (false, format!("no {what} keyword in {where_}")),
    };
    CriterionOutcome::conclude(
        criterion,
        pass_or_zero(vocab, passed),
        evidence,
        text_of(scan.decisive_value()),
        reason,
        vocab,
    )
}
