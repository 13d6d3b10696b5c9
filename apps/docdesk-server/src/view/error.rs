//! View and action error types

use std::fmt;

use thiserror::Error;

use crate::document::DecodeError;
use crate::render::RenderError;
use crate::store::{Partition, StoreError};

use super::ViewStatus;

/// Why a navigation did not produce a ready view
#[derive(Debug, Error)]
pub enum ViewError {
    /// Absent from both partitions, or gone before the fetch landed
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Store transport or permission failure; not retried
    #[error("Failed to load document: {0}")]
    Transient(#[from] StoreError),

    #[error("Document content could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("Document could not be opened: {0}")]
    Render(#[from] RenderError),
}

impl ViewError {
    /// Terminal view status for this failure
    ///
    /// Undecodable and unrenderable content look the same as a missing
    /// document to the viewer.
    pub fn status(&self) -> ViewStatus {
        match self {
            ViewError::Transient(_) => ViewStatus::Failed,
            ViewError::NotFound(_) | ViewError::Decode(_) | ViewError::Render(_) => {
                ViewStatus::NotFound
            }
        }
    }
}

/// User-triggered lifecycle actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Download => f.write_str("download"),
            Action::Delete => f.write_str("delete"),
        }
    }
}

/// Lifecycle action failures
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("The {0} action is not enabled for this view")]
    Disabled(Action),

    #[error("No document is loaded in this view")]
    NotLoaded,

    /// Delete only targets the processing partition
    #[error("Deleting a {0} document is not supported")]
    Unsupported(Partition),

    #[error("Delete failed: {0}")]
    Store(#[from] StoreError),
}
