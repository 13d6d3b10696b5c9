//! Document error types

use thiserror::Error;

/// Rejected document identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidId {
    #[error("Document id is empty")]
    Empty,

    #[error("Document id exceeds {max} bytes")]
    TooLong { max: usize },

    #[error("Document id contains a forbidden character: {0:?}")]
    ForbiddenChar(char),
}

/// Base64 content could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Content is empty")]
    Empty,

    #[error("Invalid base64 content: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
