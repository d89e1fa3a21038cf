//! Error types for dialect-aware migration resolution.

use std::path::PathBuf;

use crate::validation::DialectValidationResult;

/// Boxed error returned by caller-supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving or validating migration sources.
///
/// A missing or empty layer is never an error; it is reported through
/// [`LayerDiagnostic`](crate::layer::LayerDiagnostic) instead.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Filesystem error while walking a source tree or reading a script.
    #[error("IO error at '{}': {source}", path.display())]
    Io {
        /// Path (relative to the source root) that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The caller-supplied dialect resolver failed.
    #[error("dialect resolver failed: {0}")]
    Resolver(#[source] BoxError),

    /// One or more validation targets have no SQL files in any layer.
    #[error("{message}")]
    MissingCoverage {
        /// Aggregated human-readable report.
        message: String,
        /// The full validation result that triggered the failure.
        result: Box<DialectValidationResult>,
    },

    /// Validation rejected by a caller-supplied validator.
    #[error("dialect validation failed: {0}")]
    Validation(String),

    /// Malformed alias override (expected `alias=canonical`).
    #[error("invalid dialect alias '{0}', expected alias=canonical")]
    InvalidAlias(String),

    /// Database error while connecting for dialect detection.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MigrateError {
    /// Creates an IO error tagged with the path that failed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the validation result carried by a coverage failure.
    #[must_use]
    pub fn validation_result(&self) -> Option<&DialectValidationResult> {
        match self {
            Self::MissingCoverage { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Result type for migration resolution.
pub type Result<T> = std::result::Result<T, MigrateError>;
