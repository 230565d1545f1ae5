//! The `CorpusError` taxonomy.
//!
//! A typed error enum covering the corpus pipeline's failure modes:
//! missing documents, unsafe identifiers, unparseable documents, source
//! authentication failures, and upstream unavailability. I/O failures
//! convert in automatically via `#[from]`.

use thiserror::Error;

/// Errors produced by the corpus store and the connectors that feed it.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// A requested document or artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A slug is not path-safe and cannot be used to address a document.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A document exists on disk but could not be parsed.
    #[error("malformed document {slug}: {reason}")]
    MalformedDocument { slug: String, reason: String },

    /// No configured region accepted the API key.
    #[error("authentication failed for regions: {regions}")]
    AuthenticationFailed { regions: String },

    /// An upstream source halted the run with a non-success status.
    #[error("upstream unavailable (HTTP {status}); {fetched} items fetched before the halt")]
    UpstreamUnavailable { status: u16, fetched: usize },

    /// An underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CorpusError {
    /// True when this error represents a missing document or artifact.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CorpusError::NotFound(_))
    }
}
