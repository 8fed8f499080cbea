//! The four graded optional checks.
//!
//! Optional criteria never decide eligibility; their graded credit feeds the
//! aggregate score. `passed` means "earned some credit".

use crate::core::canonical::{CanonicalRecord, FieldText, NumericField};
use crate::core::types::{Criterion, MatchStrength};
use crate::screening::confidence::quality_ok;
use crate::screening::matcher::{
    role_strength, scan_fields, scan_keywords, scan_patterns, FieldRef, FieldRole,
};
use crate::screening::outcome::{CriterionOutcome, Evidence};
use crate::vocabulary::compiled::CompiledVocabulary;

fn text_of(value: Option<&FieldText>) -> Option<&str> {
    value.map(|v| v.text.as_str())
}

/// Publication: identifier field for full credit, a keyword in prose for partial
#[must_use]
pub fn publication(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let prose = [
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let scan = scan_keywords(&vocab.publication, &prose);

    let mut evidence = Evidence::from_scan(&scan);
    evidence.fields_considered += 1;

    let (score, decisive, reason) = if let Some(id) = record.publication_ids.first() {
        evidence.fields_present += 1;
        evidence.strength = MatchStrength::Exact;
        evidence.matched_field = Some(id.source.clone());
        evidence.matched_term = Some(id.value.clone());
        evidence.corroborated = scan.matched() || record.publication_ids.len() >= 2;
        (
            vocab.publication_full_credit,
            Some(id.value.as_str()),
            format!("publication identifier {} in {}", id.value, id.source),
        )
    } else if let Some(hit) = &scan.hit {
        (
            vocab.publication_partial_credit,
            text_of(scan.decisive_value()),
            format!("publication mention '{}' in {}", hit.term, hit.source),
        )
    } else {
        (
            0,
            text_of(scan.decisive_value()),
            "no publication identifier or mention".to_string(),
        )
    };

    CriterionOutcome::conclude(Criterion::Publication, score, evidence, decisive, reason, vocab)
}

/// Credit for a sample count under the configured tiers
#[must_use]
pub fn sample_size_credit(vocab: &CompiledVocabulary, count: u64) -> u32 {
    let rules = &vocab.sample_size;
    if count >= rules.large_threshold {
        rules.large_credit
    } else if count >= rules.medium_threshold {
        rules.medium_credit
    } else {
        0
    }
}

/// First count extracted from prose: fields in order, then patterns in order
fn extract_count<'a>(
    vocab: &CompiledVocabulary,
    fields: &[FieldRef<'a>],
) -> Option<(u64, &'a FieldText)> {
    fields.iter().find_map(|field| {
        let value = field.value?;
        vocab.sample_patterns.iter().find_map(|re| {
            re.captures(&value.text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .map(|n| (n, value))
        })
    })
}

/// Sample size: numeric field, else a count extracted from title or summary.
///
/// A malformed numeric field falls back to extraction but zeroes the quality
/// factor.
#[must_use]
pub fn sample_size(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let prose = [
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let extracted = extract_count(vocab, &prose);

    let mut evidence = Evidence::none(prose.len() + 1);
    evidence.fields_present = prose.iter().filter(|f| f.value.is_some()).count();

    let (score, reason) = match record.sample_count {
        NumericField::Value(count) => {
            evidence.fields_present += 1;
            evidence.strength = MatchStrength::Exact;
            evidence.matched_field = Some("sample_count".to_string());
            evidence.matched_term = Some(count.to_string());
            evidence.quality_ok = true;
            evidence.corroborated = extracted.is_some();
            (sample_size_credit(vocab, count), format!("sample count {count}"))
        }
        NumericField::Absent | NumericField::Malformed => {
            let malformed = record.sample_count == NumericField::Malformed;
            if malformed {
                evidence.fields_present += 1;
            }
            match extracted {
                Some((count, field)) => {
                    evidence.strength = MatchStrength::FreeText;
                    evidence.matched_field = Some(field.source.clone());
                    evidence.matched_term = Some(count.to_string());
                    evidence.quality_ok = !malformed && quality_ok(vocab, Some(&field.text));
                    (
                        sample_size_credit(vocab, count),
                        format!("{count} samples stated in {}", field.source),
                    )
                }
                None => {
                    let reason = if malformed {
                        "sample count field is malformed and no count found in text"
                    } else {
                        "no sample count"
                    };
                    (0, reason.to_string())
                }
            }
        }
    };

    CriterionOutcome::with_evidence(Criterion::SampleSize, score, evidence, reason, vocab)
}

/// Geographic origin: a country alias in country, characteristics, title or summary
#[must_use]
pub fn country(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("country", record.country.as_ref()),
        FieldRef::structured("characteristics", record.characteristics.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let scan = scan_fields(&fields, |text, role| {
        vocab.countries.iter().find_map(|(name, aliases)| {
            if role == FieldRole::Structured && aliases.exact(text).is_some() {
                return Some((name.clone(), MatchStrength::Exact));
            }
            aliases
                .first_in(text)
                .map(|_| (name.clone(), role_strength(role)))
        })
    });

    let evidence = Evidence::from_scan(&scan);
    let (score, reason) = match &scan.hit {
        Some(hit) => (vocab.country_credit, format!("country '{}' in {}", hit.term, hit.source)),
        None => (0, "no country of origin".to_string()),
    };

    CriterionOutcome::conclude(
        Criterion::Country,
        score,
        evidence,
        text_of(scan.decisive_value()),
        reason,
        vocab,
    )
}

/// Age: any age pattern in characteristics, title or summary
#[must_use]
pub fn age(record: &CanonicalRecord, vocab: &CompiledVocabulary) -> CriterionOutcome {
    let fields = [
        FieldRef::structured("characteristics", record.characteristics.as_ref()),
        FieldRef::free_text("title", record.title.as_ref()),
        FieldRef::free_text("summary", record.summary.as_ref()),
    ];
    let scan = scan_patterns(&vocab.age_patterns, &fields);

    let evidence = Evidence::from_scan(&scan);
    let (score, reason) = match &scan.hit {
        Some(hit) => (vocab.age_credit, format!("age '{}' in {}", hit.term, hit.source)),
        None => (0, "no donor age information".to_string()),
    };

    CriterionOutcome::conclude(
        Criterion::Age,
        score,
        evidence,
        text_of(scan.decisive_value()),
        reason,
        vocab,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RawRecord;
    use crate::vocabulary::config::ScreeningConfig;

    fn vocab() -> CompiledVocabulary {
        CompiledVocabulary::compile(&ScreeningConfig::load_embedded().unwrap()).unwrap()
    }

    fn canonical(raw: RawRecord) -> CanonicalRecord {
        CanonicalRecord::from_raw(&raw)
    }

    #[test]
    fn test_publication_tiers() {
        let v = vocab();
        let full = publication(&canonical(RawRecord::new().with("pubmed_id", "31234567")), &v);
        assert_eq!(full.score, 2);
        assert!(full.passed);

        let partial = publication(
            &canonical(RawRecord::new().with("summary", "Published in Nature, 2021")),
            &v,
        );
        assert_eq!(partial.score, 1);

        let none = publication(&canonical(RawRecord::new().with("title", "brain atlas")), &v);
        assert_eq!(none.score, 0);
        assert!(!none.passed);
    }

    #[test]
    fn test_sample_size_thresholds() {
        let v = vocab();
        assert_eq!(sample_size_credit(&v, 150), 2);
        assert_eq!(sample_size_credit(&v, 100), 2);
        assert_eq!(sample_size_credit(&v, 99), 1);
        assert_eq!(sample_size_credit(&v, 20), 1);
        assert_eq!(sample_size_credit(&v, 19), 0);
    }

    #[test]
    fn test_sample_size_from_field() {
        let v = vocab();
        let out = sample_size(&canonical(RawRecord::new().with("sample_count", "48")), &v);
        assert_eq!(out.score, 1);
        assert_eq!(out.evidence.strength, MatchStrength::Exact);
        assert!(out.evidence.quality_ok);
    }

    #[test]
    fn test_sample_size_extracted_from_text() {
        let v = vocab();
        let out = sample_size(
            &canonical(RawRecord::new().with("summary", "We profiled n=150 subjects")),
            &v,
        );
        assert_eq!(out.score, 2);
        assert_eq!(out.evidence.matched_term.as_deref(), Some("150"));
        assert_eq!(out.evidence.strength, MatchStrength::FreeText);
    }

    #[test]
    fn test_malformed_count_falls_back_with_low_quality() {
        let v = vocab();
        let record = canonical(
            RawRecord::new()
                .with("sample_count", "many")
                .with("title", "Atlas of 35 donors"),
        );
        assert_eq!(record.sample_count, NumericField::Malformed);
        let out = sample_size(&record, &v);
        assert_eq!(out.score, 1);
        assert!(!out.evidence.quality_ok);

        let clean = sample_size(&canonical(RawRecord::new().with("title", "Atlas of 35 donors")), &v);
        assert!(clean.evidence.quality_ok);
        assert!(out.confidence < clean.confidence);
    }

    #[test]
    fn test_sample_size_absent() {
        let v = vocab();
        let out = sample_size(&canonical(RawRecord::new()), &v);
        assert_eq!(out.score, 0);
        assert_eq!(out.reason, "no sample count");
    }

    #[test]
    fn test_country_aliases() {
        let v = vocab();
        let exact = country(&canonical(RawRecord::new().with("country", "Germany")), &v);
        assert_eq!(exact.score, 1);
        assert_eq!(exact.evidence.strength, MatchStrength::Exact);
        assert_eq!(exact.evidence.matched_term.as_deref(), Some("germany"));

        let alias = country(
            &canonical(RawRecord::new().with("summary", "Donors recruited in the UK")),
            &v,
        );
        assert_eq!(alias.evidence.matched_term.as_deref(), Some("united kingdom"));

        let none = country(&canonical(RawRecord::new().with("summary", "Ukrainian cohort")), &v);
        assert_eq!(none.score, 0);
    }

    #[test]
    fn test_age_patterns() {
        let v = vocab();
        let range = age(
            &canonical(RawRecord::new().with("summary", "donors aged 45-60 years")),
            &v,
        );
        assert_eq!(range.score, 1);

        let characteristics = age(
            &canonical(RawRecord::new().with("characteristics_ch1", "age: 34")),
            &v,
        );
        assert_eq!(characteristics.score, 1);
        assert_eq!(characteristics.evidence.strength, MatchStrength::Structured);

        let none = age(&canonical(RawRecord::new().with("summary", "stage iii")), &v);
        assert_eq!(none.score, 0);
    }
}
