//! Centralized validation and helper functions.

/// Maximum number of records accepted from one input (DOS protection)
pub const MAX_RECORDS: usize = 1_000_000;

/// Maximum number of columns accepted in one table sample
pub const MAX_COLUMNS: usize = 10_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Compute a stable MD5 fingerprint of a canonical text.
///
/// # Examples
///
/// ```
/// use sc_screen::utils::validation::compute_fingerprint;
///
/// let fp = compute_fingerprint("{\"version\":\"1.0.0\"}");
/// assert_eq!(fp.len(), 32);
/// assert_eq!(fp, compute_fingerprint("{\"version\":\"1.0.0\"}"));
/// ```
#[must_use]
pub fn compute_fingerprint(text: &str) -> String {
    let digest = md5::compute(text.as_bytes());
    format!("{digest:x}")
}

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Check a table sample's column count against [`MAX_COLUMNS`]
#[must_use]
pub fn check_column_limit(count: usize) -> Option<String> {
    if count > MAX_COLUMNS {
        Some(format!("Too many columns: {count} exceeds maximum of {MAX_COLUMNS}"))
    } else {
        None
    }
}

/// Convert a count to f64 for ratio calculations
#[must_use]
pub fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
}

/// Validate a table or output name supplied by a client
///
/// Rejects empty names, names over [`MAX_FILENAME_LENGTH`], path traversal and
/// control characters. Returns the name with anything outside
/// `[A-Za-z0-9._- ]` removed.
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the name is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_' || *c == ' ')
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}
