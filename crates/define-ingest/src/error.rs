//! Error types for subset specification loading.

use std::path::PathBuf;

use define_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON or does not have the expected shape.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry has a value the model rejects.
    #[error("invalid entry {key} in {path}: {source}")]
    InvalidEntry {
        key: String,
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// Inclusion lists name a variable the specification does not declare.
    #[error("inclusion lists in {path} reference unknown variable {key}")]
    UnknownVariable { key: String, path: PathBuf },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = IngestError::UnknownVariable {
            key: "DM.SEX".to_string(),
            path: PathBuf::from("/data/subset_terms.json"),
        };
        assert_eq!(
            err.to_string(),
            "inclusion lists in /data/subset_terms.json reference unknown variable DM.SEX"
        );
    }
}
