//! Store types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle partition holding a document
///
/// A document id lives in at most one partition at a time. Requests start
/// in `Processing` and move to `Finished` when staff complete them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Processing,
    Finished,
}

impl Partition {
    /// Probe order used when resolving an id: the end state wins
    pub const RESOLUTION_ORDER: [Partition; 2] = [Partition::Finished, Partition::Processing];

    /// Collection name in the backing store
    pub fn collection(&self) -> &'static str {
        match self {
            Partition::Processing => "processing",
            Partition::Finished => "finished",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Record body as persisted by every adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(default)]
    pub file_name: Option<String>,
    /// Base64-encoded document bytes
    pub file_content: String,
}

impl StoredRecord {
    pub fn new(file_name: Option<&str>, file_content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.map(str::to_string),
            file_content: file_content.into(),
        }
    }
}

/// Transport-level store failures
///
/// Absence is never an error here; adapters report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Malformed record {key}: {source}")]
    MalformedRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
