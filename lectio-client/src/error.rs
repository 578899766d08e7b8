//! Error types for lectio-client

use lectio_common::FieldError;
use thiserror::Error;

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with the failure envelope
    #[error("Server rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Unknown note: {0}")]
    UnknownNote(String),

    #[error("Unknown bookmark: {0}")]
    UnknownBookmark(String),

    /// Verse operations need a book and chapter in view
    #[error("No verse range loaded")]
    NoVerseRange,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] lectio_common::Error),
}

impl ClientError {
    /// Per-field validation messages, when the server sent any
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Rejected { field_errors, .. } => field_errors,
            _ => &[],
        }
    }
}
