//! Error types for IDA post-processing

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of the extraction, plotting and reporting stages.
///
/// Soft conditions (a missing dump for one amplitude, a dump without
/// displacement rows) are not errors; they surface as `Ok(None)`.
#[derive(Error, Debug)]
pub enum IdaError {
    #[error("IDA directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No *{suffix} files found in {dir}")]
    MetadataNotFound { dir: PathBuf, suffix: String },

    #[error("Summary CSV not found: {0}")]
    SummaryNotFound(PathBuf),

    #[error("Summary table {0} has no result rows")]
    EmptySummary(PathBuf),

    #[error("Malformed summary: {0}")]
    MalformedSummary(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Plot rendering error: {0}")]
    Plot(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),
}

/// Result type for IDA operations
pub type IdaResult<T> = Result<T, IdaError>;
