//! Error types for pf-pipeline

use thiserror::Error;

/// Errors raised while fetching data or materializing assets
#[derive(Error, Debug)]
pub enum PipelineError {
    /// P001: Fixture payload could not be read
    #[error("[P001] Failed to read sample payload '{path}': {source}")]
    Fixture {
        path: String,
        source: std::io::Error,
    },

    /// P002: Payload is not the expected shape
    #[error("[P002] Invalid market payload: {0}")]
    Payload(String),

    /// P003: HTTP transport error (connect, timeout, body decode)
    #[error("[P003] Market-data request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// P004: Endpoint answered with a non-success status
    #[error("[P004] Market-data endpoint returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// P005: Storage error
    #[error("[P005] {0}")]
    Db(#[from] pf_db::DbError),

    /// P006: Core error (partition, selection, definitions)
    #[error("[P006] {0}")]
    Core(#[from] pf_core::CoreError),
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
