//! Error types for worksheet and report output.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create the output directory.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a worksheet.
    #[error("failed to write worksheet {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write the diagnostics report.
    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Rendered worksheet is not UTF-8.
    #[error("worksheet {sheet} is not valid UTF-8")]
    Encoding { sheet: &'static str },
}

pub type Result<T> = std::result::Result<T, OutputError>;
