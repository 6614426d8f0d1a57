//! Error types for typed context access.

use thiserror::Error;

/// Errors raised by context accessors and the surrounding configuration layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A non-nullable accessor resolved to nothing: no ancestor registration
    /// and no usable default.
    #[error("No value provided for key: \"{key}\"")]
    MissingContextValue { key: String },

    #[error("Invalid policy usage for key \"{key}\": {reason}")]
    InvalidPolicyUsage { key: String, reason: String },

    #[error("Contract violation for key \"{key}\": absent value written to a non-nullable context")]
    ContractViolation { key: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ContextError {
    pub(crate) fn missing(key: impl std::fmt::Display) -> Self {
        ContextError::MissingContextValue {
            key: key.to_string(),
        }
    }
}

impl From<config::ConfigError> for ContextError {
    fn from(err: config::ConfigError) -> Self {
        ContextError::ConfigError(err.to_string())
    }
}
