//! Error types for pf-expect

use thiserror::Error;

/// Validation engine errors.
///
/// An expectation that fails, or that references a missing column, is a
/// result, not an error. These variants abort a validation run.
#[derive(Error, Debug)]
pub enum ExpectError {
    /// X001: Suite file could not be parsed
    #[error("[X001] Invalid expectation suite '{path}': {message}")]
    SuiteParse { path: String, message: String },

    /// X002: Expectation type is not supported
    #[error("[X002] Unsupported expectation type '{expectation_type}' in suite '{suite}'")]
    UnknownExpectation {
        suite: String,
        expectation_type: String,
    },

    /// X003: Expectation kwargs are missing or of the wrong type
    #[error("[X003] Invalid kwargs for {expectation_type}: {message}")]
    InvalidKwargs {
        expectation_type: String,
        message: String,
    },

    /// X004: Checkpoint names a suite that was never registered
    #[error("[X004] Expectation suite '{name}' is not registered")]
    SuiteNotRegistered { name: String },

    /// X005: Storage error while evaluating a batch
    #[error("[X005] {0}")]
    Db(#[from] pf_db::DbError),

    /// X006: IO error with file path context
    #[error("[X006] Failed to access '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// X007: JSON serialization error
    #[error("[X007] JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExpectError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ExpectError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type alias for ExpectError
pub type ExpectResult<T> = Result<T, ExpectError>;
