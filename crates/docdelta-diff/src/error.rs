//! Error types for the diff crate.

/// Errors that can occur while configuring the diff engine.
///
/// Diffing itself never fails: malformed items are left out of the
/// comparison instead of aborting it.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A configuration value is out of range or empty.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A TOML configuration fragment could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl DiffError {
    /// Create an invalid-configuration error for a named field.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
