use serde::{Deserialize, Serialize};

/// Whether a criterion gates eligibility or refines ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    Mandatory,
    Optional,
}

/// The fixed criterion taxonomy.
///
/// Declaration order is the mandatory evaluation order followed by the optional
/// order; `Ord` follows it so maps keyed by criterion iterate predictably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Valid GEO or SRA accession
    DatabaseId,
    /// Required species (e.g. Homo sapiens)
    Species,
    /// Not an immortalized or transformed cell line
    CellLine,
    /// Disease status (tumor or normal) is stated
    TumorAnnotation,
    /// Recognized sequencing assay or platform
    SequencingMethod,
    /// Recognized organ or tissue
    TissueSource,
    /// Publication identifier or mention
    Publication,
    /// Sample count, from a field or extracted from text
    SampleSize,
    /// Country of origin
    Country,
    /// Donor age information
    Age,
}

impl Criterion {
    /// Mandatory criteria in evaluation order (cheapest and most discriminating first)
    pub const MANDATORY: [Criterion; 6] = [
        Criterion::DatabaseId,
        Criterion::Species,
        Criterion::CellLine,
        Criterion::TumorAnnotation,
        Criterion::SequencingMethod,
        Criterion::TissueSource,
    ];

    pub const OPTIONAL: [Criterion; 4] = [
        Criterion::Publication,
        Criterion::SampleSize,
        Criterion::Country,
        Criterion::Age,
    ];

    pub const ALL: [Criterion; 10] = [
        Criterion::DatabaseId,
        Criterion::Species,
        Criterion::CellLine,
        Criterion::TumorAnnotation,
        Criterion::SequencingMethod,
        Criterion::TissueSource,
        Criterion::Publication,
        Criterion::SampleSize,
        Criterion::Country,
        Criterion::Age,
    ];

    #[must_use]
    pub fn kind(self) -> CriterionKind {
        match self {
            Self::DatabaseId
            | Self::Species
            | Self::CellLine
            | Self::TumorAnnotation
            | Self::SequencingMethod
            | Self::TissueSource => CriterionKind::Mandatory,
            Self::Publication | Self::SampleSize | Self::Country | Self::Age => {
                CriterionKind::Optional
            }
        }
    }

    /// Stable position in [`Criterion::ALL`], used for array-backed tables
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DatabaseId => "database_id",
            Self::Species => "species",
            Self::CellLine => "cell_line",
            Self::TumorAnnotation => "tumor_annotation",
            Self::SequencingMethod => "sequencing_method",
            Self::TissueSource => "tissue_source",
            Self::Publication => "publication",
            Self::SampleSize => "sample_size",
            Self::Country => "country",
            Self::Age => "age",
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordinal quality label, best (`A`) to worst (`E`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// Best to worst
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E];

    /// The grade every mandatory failure receives
    pub const LOWEST: Grade = Grade::E;

    /// True if `self` is at least as good as `other`
    #[must_use]
    pub fn at_least(self, other: Grade) -> bool {
        self <= other
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            other => Err(format!("unknown grade '{other}' (expected A-E)")),
        }
    }
}

/// Which archive shape a raw record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceShape {
    /// GEO series/sample rows (gse, gse_title, summary, ...)
    Geo,
    /// SRA run rows (run_accession, study_title, study_abstract, ...)
    Sra,
    /// Rows already joined from both archives (geo_*/sra_* columns)
    Integrated,
    Unknown,
}

impl std::fmt::Display for SourceShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geo => write!(f, "GEO"),
            Self::Sra => write!(f, "SRA"),
            Self::Integrated => write!(f, "GEO+SRA"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// How directly a piece of evidence was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrength {
    /// Nothing matched
    None,
    /// Keyword or pattern found inside title/summary prose
    FreeText,
    /// Keyword found inside a dedicated field (organism, cell_type, ...)
    Structured,
    /// Dedicated field equals the vocabulary term, or an identifier field matched
    Exact,
}

impl MatchStrength {
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::FreeText => 0.5,
            Self::Structured => 0.75,
            Self::Exact => 1.0,
        }
    }
}

/// Domain categories a table column can be classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnCategory {
    Species,
    CellType,
    Tissue,
    SampleInfo,
    Sequencing,
    Geographic,
    Age,
    DiseaseState,
    Publication,
    DatabaseId,
    Other,
}

impl ColumnCategory {
    /// Every category except [`ColumnCategory::Other`], in tie-break order
    pub const CLASSIFIABLE: [ColumnCategory; 10] = [
        ColumnCategory::Species,
        ColumnCategory::CellType,
        ColumnCategory::Tissue,
        ColumnCategory::SampleInfo,
        ColumnCategory::Sequencing,
        ColumnCategory::Geographic,
        ColumnCategory::Age,
        ColumnCategory::DiseaseState,
        ColumnCategory::Publication,
        ColumnCategory::DatabaseId,
    ];
}

impl std::fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Species => "species",
            Self::CellType => "cell_type",
            Self::Tissue => "tissue",
            Self::SampleInfo => "sample_info",
            Self::Sequencing => "sequencing",
            Self::Geographic => "geographic",
            Self::Age => "age",
            Self::DiseaseState => "disease_state",
            Self::Publication => "publication",
            Self::DatabaseId => "database_id",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_kinds() {
        for c in Criterion::MANDATORY {
            assert_eq!(c.kind(), CriterionKind::Mandatory);
        }
        for c in Criterion::OPTIONAL {
            assert_eq!(c.kind(), CriterionKind::Optional);
        }
        for (i, c) in Criterion::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_grade_ordering() {
        assert!(Grade::A < Grade::E);
        assert!(Grade::B.at_least(Grade::C));
        assert!(!Grade::D.at_least(Grade::C));
        assert_eq!("b".parse::<Grade>().unwrap(), Grade::B);
        assert!("F".parse::<Grade>().is_err());
    }

    #[test]
    fn test_criterion_serde_name() {
        let json = serde_json::to_string(&Criterion::TumorAnnotation).unwrap();
        assert_eq!(json, "\"tumor_annotation\"");
        assert_eq!(Criterion::TumorAnnotation.to_string(), "tumor_annotation");
    }
}
