//! Error types for pf-core

use thiserror::Error;

/// Core error type for Priceflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Partition key is not a `YYYY-MM-DD` date
    #[error("[E001] Invalid partition key '{key}': {reason}")]
    InvalidPartitionKey { key: String, reason: String },

    /// E002: Partition key outside the partition set
    #[error("[E002] Partition '{key}' is outside the daily partition range [{start}, {end})")]
    PartitionOutOfRange {
        key: String,
        start: String,
        end: String,
    },

    /// E003: Circular dependency detected
    #[error("[E003] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E004: Asset not defined
    #[error("[E004] Asset not found: {name}")]
    AssetNotFound { name: String },

    /// E005: Invalid selector
    #[error("[E005] Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// E006: Invalid cron expression
    #[error("[E006] Invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    /// E007: Name is not a lowercase identifier
    #[error("[E007] Invalid name '{name}' in {context}: expected a lowercase identifier")]
    InvalidName { name: String, context: String },

    /// E008: A stored row does not match the record schema
    #[error("[E008] Cannot decode row from '{table}': {message}")]
    RecordDecode { table: String, message: String },

    /// E009: Invalid settings value
    #[error("[E009] Invalid settings: {message}")]
    SettingsInvalid { message: String },

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
