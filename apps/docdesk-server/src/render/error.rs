//! Render error types

use std::time::Duration;

use thiserror::Error;

/// Failures while opening or paginating document content
#[derive(Debug, Error)]
pub enum RenderError {
    /// Bytes are not a readable paginated document
    #[error("Unreadable document: {0}")]
    Unreadable(String),

    #[error("Encrypted documents are not supported")]
    Encrypted,

    #[error("Document has no pages")]
    NoPages,

    /// Page number outside `1..=page_count`
    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("Failed to extract page {page}: {message}")]
    PageExtraction { page: usize, message: String },

    #[error("Render operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Unreadable(err.to_string())
    }
}

/// Result type alias for render operations
pub type RenderResult<T> = std::result::Result<T, RenderError>;
