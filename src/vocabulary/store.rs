use std::path::Path;

use tracing::warn;

use crate::utils::validation::compute_fingerprint;
use crate::vocabulary::config::{ScreeningConfig, VocabularyError};

/// Configuration format version for compatibility checking
pub const CONFIG_VERSION: &str = "1.0.0";

impl ScreeningConfig {
    /// Load the embedded default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON fails to parse or validate, which
    /// `build.rs` should already have caught.
    pub fn load_embedded() -> Result<Self, VocabularyError> {
        // Embedded at compile time; validated by build.rs
        const EMBEDDED_CONFIG: &str = include_str!("../../vocabularies/default.json");
        Self::from_json(EMBEDDED_CONFIG)
    }

    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError::ReadError` if the file cannot be read, or a
    /// parse/validation error if its content is not a complete configuration.
    pub fn load_from_file(path: &Path) -> Result<Self, VocabularyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from `path` if given, otherwise the embedded default
    ///
    /// # Errors
    ///
    /// See [`ScreeningConfig::load_from_file`].
    pub fn load(path: Option<&Path>) -> Result<Self, VocabularyError> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Self::load_embedded(),
        }
    }

    /// Parse and validate configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError::ParseError` for malformed or incomplete JSON
    /// and the matching validation error for structurally invalid settings.
    pub fn from_json(json: &str) -> Result<Self, VocabularyError> {
        let config: ScreeningConfig = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if config.version != CONFIG_VERSION {
            warn!(
                "Configuration version mismatch (expected {}, found {})",
                CONFIG_VERSION, config.version
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Export configuration to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, VocabularyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Stable digest identifying this exact configuration
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // Struct fields and BTreeMaps serialize in a fixed order
        serde_json::to_string(self)
            .map(|json| compute_fingerprint(&json))
            .unwrap_or_default()
    }
}
