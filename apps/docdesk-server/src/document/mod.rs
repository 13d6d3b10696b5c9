//! Document records and content decoding
//!
//! A [`DocumentRecord`] is the read-only copy of a stored request document
//! that a view holds after fetching it. Its id is stable; its partition is
//! derived at read time from the collection it was found in.

mod codec;
mod error;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::store::{Partition, StoredRecord};

pub use codec::{decode, encode, DecodedContent};
pub use error::{DecodeError, InvalidId};

/// Label shown when a record has no file name
pub const UNKNOWN_DOCUMENT_LABEL: &str = "Unknown Document";

/// Maximum accepted id length in bytes
pub const MAX_ID_LEN: usize = 256;

/// Validated document identifier
///
/// Ids are opaque, but they become storage keys, so path separators and
/// control characters are refused up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn parse(raw: &str) -> Result<Self, InvalidId> {
        if raw.is_empty() {
            return Err(InvalidId::Empty);
        }
        if raw.len() > MAX_ID_LEN {
            return Err(InvalidId::TooLong { max: MAX_ID_LEN });
        }
        if let Some(c) = raw.chars().find(|c| matches!(c, '/' | '\\') || c.is_control()) {
            return Err(InvalidId::ForbiddenChar(c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A fetched document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub file_name: Option<String>,
    /// Base64 payload; never serialized into view responses
    #[serde(skip_serializing)]
    pub file_content: Arc<str>,
    pub partition: Partition,
}

impl DocumentRecord {
    pub fn from_stored(id: impl Into<String>, partition: Partition, stored: StoredRecord) -> Self {
        Self {
            id: id.into(),
            file_name: stored.file_name,
            file_content: Arc::from(stored.file_content),
            partition,
        }
    }

    /// Name for display, falling back to a placeholder label
    pub fn display_name(&self) -> &str {
        match self.file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNKNOWN_DOCUMENT_LABEL,
        }
    }

    /// File name offered by the save-as flow
    pub fn download_name(&self) -> String {
        match self.file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("{}.pdf", self.id),
        }
    }
}
