//! Content decoder
//!
//! Records carry their document as base64 text. Decoding turns it into the
//! shared byte buffer that the render engine opens and the download action
//! hands back to the user.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

use super::error::DecodeError;

/// Decoded document bytes plus their content digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedContent {
    bytes: Arc<Vec<u8>>,
    digest: String,
}

impl DecodedContent {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let digest = hex::encode(Sha256::digest(&bytes));
        Self {
            bytes: Arc::new(bytes),
            digest,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes (no copy)
    pub fn shared(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    /// Hex SHA-256 of the decoded bytes
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decode base64 document content
///
/// Accepts an optional `data:<mime>;base64,` prefix and ignores ASCII
/// whitespace, so line-wrapped payloads decode the same as compact ones.
pub fn decode(encoded: &str) -> Result<DecodedContent, DecodeError> {
    let payload = strip_data_url(encoded.trim());

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(DecodedContent::from_bytes(bytes))
}

/// Encode bytes the way records store them
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn strip_data_url(input: &str) -> &str {
    if !input.starts_with("data:") {
        return input;
    }
    match input.find(";base64,") {
        Some(pos) => &input[pos + ";base64,".len()..],
        None => input,
    }
}
