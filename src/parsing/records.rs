use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::record::{FieldValue, RawRecord};
use crate::utils::validation::{check_column_limit, check_record_limit, MAX_RECORDS};

#[derive(Error, Debug)]
pub enum RecordParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported record format: {0}")]
    UnsupportedFormat(String),

    #[error("Too many records: {0} exceeds maximum allowed ({MAX_RECORDS})")]
    TooManyRecords(usize),

    #[error("{0}")]
    TooManyColumns(String),

    #[error("Row {0} is not a JSON object")]
    NonObjectRow(usize),
}

/// On-disk layout of a record file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// A JSON array of objects, or `{"records": [...]}`
    Json,
    /// One JSON object per line
    JsonLines,
    Csv,
    Tsv,
}

impl RecordFormat {
    /// Detect the format from a file name, looking through a trailing `.gz`.
    ///
    /// Returns the format and whether the file is gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns `RecordParseError::UnsupportedFormat` for unknown extensions.
    pub fn from_path(path: &Path) -> Result<(Self, bool), RecordParseError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let (stem, gzipped) = match name.strip_suffix(".gz") {
            Some(stem) => (stem, true),
            None => (name.as_str(), false),
        };

        let format = match stem.rsplit_once('.').map(|(_, ext)| ext) {
            Some("json") => Self::Json,
            Some("jsonl" | "ndjson") => Self::JsonLines,
            Some("csv") => Self::Csv,
            Some("tsv" | "tab" | "txt") => Self::Tsv,
            _ => {
                return Err(RecordParseError::UnsupportedFormat(format!(
                    "{} (expected .json, .jsonl, .csv or .tsv, optionally .gz)",
                    path.display()
                )))
            }
        };
        Ok((format, gzipped))
    }
}

/// Load every record from a file, choosing the parser by extension
///
/// # Errors
///
/// Returns `RecordParseError` if the file cannot be opened or decoded, has an
/// unsupported extension, or exceeds the record limit.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, RecordParseError> {
    let (format, gzipped) = RecordFormat::from_path(path)?;
    let file = File::open(path)?;

    let records = if gzipped {
        parse_records_reader(BufReader::new(GzDecoder::new(file)), format)?
    } else {
        parse_records_reader(BufReader::new(file), format)?
    };

    info!("Loaded {} records from {}", records.len(), path.display());
    if records.is_empty() {
        warn!("No records found in {}", path.display());
    }
    Ok(records)
}

/// Parse records of a known format from a reader
///
/// # Errors
///
/// Returns `RecordParseError` for malformed input or too many records.
pub fn parse_records_reader<R: BufRead>(
    reader: R,
    format: RecordFormat,
) -> Result<Vec<RawRecord>, RecordParseError> {
    match format {
        RecordFormat::Json => parse_json_array(reader),
        RecordFormat::JsonLines => parse_json_lines(reader),
        RecordFormat::Csv => parse_delimited(reader, b','),
        RecordFormat::Tsv => parse_delimited(reader, b'\t'),
    }
}

/// Parse records of a known format from text
///
/// # Errors
///
/// Returns `RecordParseError` for malformed input or too many records.
pub fn parse_records_text(text: &str, format: RecordFormat) -> Result<Vec<RawRecord>, RecordParseError> {
    parse_records_reader(text.as_bytes(), format)
}

fn push_record(records: &mut Vec<RawRecord>, record: RawRecord) -> Result<(), RecordParseError> {
    if check_record_limit(records.len()).is_some() {
        return Err(RecordParseError::TooManyRecords(records.len() + 1));
    }
    records.push(record);
    Ok(())
}

fn object_row(value: serde_json::Value, row: usize) -> Result<RawRecord, RecordParseError> {
    match value {
        serde_json::Value::Object(map) => Ok(RawRecord::from(map)),
        _ => Err(RecordParseError::NonObjectRow(row)),
    }
}

fn parse_json_array<R: Read>(mut reader: R) -> Result<Vec<RawRecord>, RecordParseError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|source| RecordParseError::Json { line: 1, source })?;

    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => match map.remove("records") {
            Some(serde_json::Value::Array(rows)) => rows,
            // A lone object is a single record
            Some(other) => {
                map.insert("records".to_string(), other);
                vec![serde_json::Value::Object(map)]
            }
            None => vec![serde_json::Value::Object(map)],
        },
        _ => return Err(RecordParseError::NonObjectRow(0)),
    };

    let mut records = Vec::with_capacity(rows.len().min(MAX_RECORDS));
    for (i, row) in rows.into_iter().enumerate() {
        push_record(&mut records, object_row(row, i)?)?;
    }
    Ok(records)
}

fn parse_json_lines<R: BufRead>(reader: R) -> Result<Vec<RawRecord>, RecordParseError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|source| RecordParseError::Json { line: i + 1, source })?;
        let row = records.len();
        push_record(&mut records, object_row(value, row)?)?;
    }
    Ok(records)
}

fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRecord>, RecordParseError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if let Some(msg) = check_column_limit(headers.len()) {
        return Err(RecordParseError::TooManyColumns(msg));
    }
    debug!("Delimited input has {} columns", headers.len());

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| (name.clone(), cell_value(cell)))
            .collect();
        push_record(&mut records, record)?;
    }
    Ok(records)
}

/// Empty cells become nulls; everything else stays text for lenient parsing later
fn cell_value(cell: &str) -> FieldValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(trimmed.to_string())
    }
}
