//! Error types for terminology resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Why an authority lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FailureKind {
    #[error("codelist not found")]
    NotFound,

    #[error("terminology package not loaded")]
    UnknownPackage,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// A failed lookup of one (package, codelist) pair.
///
/// Returned as a value, never raised: callers decide whether the missing
/// codelist is fatal for what they are deriving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to resolve codelist {codelist} in {package}: {kind}")]
pub struct ResolutionFailure {
    pub package: String,
    pub codelist: String,
    pub kind: FailureKind,
}

impl ResolutionFailure {
    pub fn new(package: impl Into<String>, codelist: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            package: package.into(),
            codelist: codelist.into(),
            kind,
        }
    }

    /// `package/codelist` identifier of the failed lookup.
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.package, self.codelist)
    }

    /// HTTP status, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Status(code) => Some(code),
            FailureKind::NotFound => Some(404),
            _ => None,
        }
    }
}

/// Errors setting up a resolver.
#[derive(Debug, Error)]
pub enum TerminologyError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("API key contains characters that are not valid in an HTTP header")]
    InvalidApiKey,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CT file {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("cannot derive a package identifier from {path} (expected e.g. SDTM_CT_2021-12-17.csv)")]
    PackageName { path: PathBuf },
}
