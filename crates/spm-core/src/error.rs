use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the performance-metric pipeline.
#[derive(Error, Debug)]
pub enum SpmError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written or persisted.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data root handed to the scanner does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A required artifact from an earlier pipeline step is absent.
    #[error("Missing input: {path}")]
    MissingInput { path: PathBuf },

    /// A CSV artifact has an absent or unexpected header.
    #[error("Invalid header in {path}: {reason}")]
    SchemaMismatch { path: PathBuf, reason: String },

    /// A pipeline step failed after the steps before it succeeded.
    #[error("{step} step failed: {source}")]
    DependentStep {
        step: String,
        #[source]
        source: Box<SpmError>,
    },

    /// A CSV document could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or serialized.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SpmError {
    /// Wrap `source` as the failure of a later pipeline `step`.
    pub fn dependent(step: impl Into<String>, source: SpmError) -> Self {
        SpmError::DependentStep {
            step: step.into(),
            source: Box::new(source),
        }
    }
}

/// Convenience alias used throughout the spm crates.
pub type Result<T> = std::result::Result<T, SpmError>;
