//! Error types for the reconciliation engine.
//!
//! Extraction, scoring and conflict resolution are total functions: malformed
//! records, unknown sources and unparseable timestamps are recovered locally
//! and never surface here. What remains is configuration loading and the
//! persistence hand-off, both strongly typed with thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::SinkError;

/// Validation errors raised while checking configuration values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Weight {value} for source '{source_id}' is out of range [0.0, 1.0]")]
    WeightOutOfRange {
        source_id: String,
        value: f64,
    },

    #[error("Priority {value} for source '{source_id}' must be below the unknown-source priority {limit}")]
    PriorityOutOfRange {
        source_id: String,
        value: u32,
        limit: u32,
    },

    #[error("Source identifier cannot be empty")]
    EmptySourceId,

    #[error("Parameter '{name}' must be a finite, non-negative number (got {value})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Validation(#[from] ValidationError),
}

/// Top-level error type for a reconciliation batch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Persistence failed: {0}")]
    Persistence(#[from] SinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl ReconcileError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the batch failed while handing edges to the sink.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if the caller may retry the whole batch.
    ///
    /// The engine itself never retries; this only classifies the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(e) => matches!(e, SinkError::Unavailable(_)),
            Self::Config(_) | Self::Internal { .. } => false,
        }
    }
}

impl From<ValidationError> for ReconcileError {
    fn from(err: ValidationError) -> Self {
        Self::Config(ConfigError::Validation(err))
    }
}

/// Result type alias for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
