use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::core::record::{FieldValue, RawRecord};
use crate::parsing::records::{parse_records_text, RecordFormat, RecordParseError};
use crate::profiling::column::{infer_data_type, TableColumn, TableSample};
use crate::utils::validation::check_column_limit;

/// Load a table sample for profiling.
///
/// A JSON object with a `columns` array is read as a [`TableSample`]; any other
/// record file is loaded as records and sampled with [`table_from_records`].
///
/// # Errors
///
/// Returns `RecordParseError` if the file cannot be read or parsed, or has
/// too many columns.
pub fn load_table(path: &Path, max_samples: usize) -> Result<TableSample, RecordParseError> {
    let (format, gzipped) = RecordFormat::from_path(path)?;
    let file = File::open(path)?;
    let mut text = String::new();
    if gzipped {
        BufReader::new(GzDecoder::new(file)).read_to_string(&mut text)?;
    } else {
        BufReader::new(file).read_to_string(&mut text)?;
    }

    let name = table_name(path);

    if format == RecordFormat::Json {
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|source| RecordParseError::Json { line: 1, source })?;
        if value.get("columns").is_some_and(serde_json::Value::is_array) {
            let mut table: TableSample = serde_json::from_value(value)
                .map_err(|source| RecordParseError::Json { line: 1, source })?;
            if let Some(msg) = check_column_limit(table.columns.len()) {
                return Err(RecordParseError::TooManyColumns(msg));
            }
            if table.table.trim().is_empty() {
                table.table = name;
            }
            info!(
                "Loaded table sample '{}' with {} columns",
                table.table,
                table.columns.len()
            );
            return Ok(table);
        }
    }

    let records = parse_records_text(&text, format)?;
    table_from_records(&name, &records, max_samples)
}

/// Build a column-oriented sample from the first `max_samples` records.
///
/// Columns appear in first-seen order; a record lacking a column contributes
/// a null for it.
///
/// # Errors
///
/// Returns `RecordParseError::TooManyColumns` if the records span too many columns.
pub fn table_from_records(
    name: &str,
    records: &[RawRecord],
    max_samples: usize,
) -> Result<TableSample, RecordParseError> {
    let sampled = &records[..records.len().min(max_samples)];

    let mut names: Vec<String> = Vec::new();
    for record in sampled {
        for (field, _) in record.iter() {
            let field = field.trim();
            if !names.iter().any(|n| n.eq_ignore_ascii_case(field)) {
                names.push(field.to_string());
                if let Some(msg) = check_column_limit(names.len()) {
                    return Err(RecordParseError::TooManyColumns(msg));
                }
            }
        }
    }

    let columns: Vec<TableColumn> = names
        .into_iter()
        .map(|name| {
            let samples: Vec<FieldValue> = sampled
                .iter()
                .map(|r| r.get(&name).cloned().unwrap_or(FieldValue::Null))
                .collect();
            TableColumn {
                data_type: Some(infer_data_type(&samples)),
                name,
                samples,
            }
        })
        .collect();

    debug!(
        "Derived {} columns from {} records for '{}'",
        columns.len(),
        sampled.len(),
        name
    );

    Ok(TableSample {
        table: name.to_string(),
        columns,
    })
}

fn table_name(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("table");
    let file = file.strip_suffix(".gz").unwrap_or(file);
    file.rsplit_once('.')
        .map_or(file, |(stem, _)| stem)
        .to_string()
}
