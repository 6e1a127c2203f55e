//! Configuration error types.
//!
//! These errors describe malformed session configuration (answer keys,
//! concept mappings, detection payloads). They are raised before any
//! scoring begins; lookup misses and ambiguous marks during scoring are
//! never errors.

use thiserror::Error;

/// Errors raised while building or validating marking configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An answer key was built with no entries.
    #[error("answer key for {0} has no questions")]
    EmptyAnswerKey(String),

    /// The same label appears twice in one answer key.
    #[error("duplicate answer key label: {0}")]
    DuplicateLabel(String),

    /// The concept mapping does not have the subject → area → ids shape.
    #[error("invalid concept mapping at {path}: {reason}")]
    InvalidConceptMapping { path: String, reason: String },

    /// A detection payload entry is not null, a string, or a list of strings.
    #[error("invalid detection value for field {label}: {reason}")]
    InvalidRawResponse { label: String, reason: String },
}

impl ConfigError {
    pub(crate) fn mapping(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConceptMapping {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
