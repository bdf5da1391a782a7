//! Pipeline error type.

use thiserror::Error;

use crate::domain::WindowError;
use crate::providers::email::ProviderError;
use crate::providers::nlp::NlpError;
use crate::storage::SinkError;

/// Errors raised while running the ingestion pipeline.
///
/// `FetchFailed`, `DecodeFailed` and `ClassificationFailed` concern one
/// message and are skipped by the orchestrator. The rest abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A window bound is not a `YYYY/MM/DD` date.
    #[error("malformed date: {0}")]
    MalformedDate(String),

    /// The window ends before it starts.
    #[error("invalid date window: {0}")]
    InvalidDateWindow(String),

    /// A search page could not be listed.
    #[error("search failed: {0}")]
    SearchFailed(#[source] ProviderError),

    /// A single message could not be fetched.
    #[error("fetch failed for message {id}: {source}")]
    FetchFailed {
        id: String,
        #[source]
        source: ProviderError,
    },

    /// A message body could not be decoded.
    #[error("decode failed for message {id}: {reason}")]
    DecodeFailed { id: String, reason: String },

    /// The classifier or recognizer failed.
    #[error("classification failed: {0}")]
    ClassificationFailed(#[from] NlpError),

    /// The record sink could not persist the results.
    #[error("output failed: {0}")]
    Sink(#[from] SinkError),
}

impl From<WindowError> for PipelineError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::Malformed(date) => Self::MalformedDate(date),
            reversed @ WindowError::Reversed { .. } => Self::InvalidDateWindow(reversed.to_string()),
        }
    }
}
