//! Outbound request envelope.
//!
//! # Example
//!
//! ```
//! use draftwire_client::protocol::{encode_request, DocumentMode};
//!
//! let frame = encode_request("doc1", DocumentMode::Create, "Draft an NDA").unwrap();
//! assert_eq!(
//!     frame,
//!     r#"{"message":"Draft an NDA","document_id":"doc1","is_new_document":true}"#
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::JsonCodec;
use crate::error::Result;

/// Whether a request creates a brand-new document or revises an existing one.
///
/// Chosen by the caller for every request; the session never infers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentMode {
    /// Generate a new document.
    #[default]
    Create,
    /// Update the document already associated with the correlation key.
    Update,
}

impl DocumentMode {
    /// Value of the `is_new_document` wire flag.
    #[inline]
    pub fn is_new_document(self) -> bool {
        matches!(self, DocumentMode::Create)
    }

    /// Map the wire flag back to a mode. A missing flag means `Update`.
    #[inline]
    pub fn from_flag(is_new_document: Option<bool>) -> Self {
        if is_new_document == Some(true) {
            DocumentMode::Create
        } else {
            DocumentMode::Update
        }
    }
}

/// One logical "generate document" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Correlation key: the document the backend works on.
    pub document_id: String,
    /// New document vs. update.
    pub mode: DocumentMode,
    /// Free-text instruction.
    pub message: String,
}

impl GenerateRequest {
    /// Request that creates a new document.
    pub fn create(document_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            mode: DocumentMode::Create,
            message: message.into(),
        }
    }

    /// Request that updates an existing document.
    pub fn update(document_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            mode: DocumentMode::Update,
            message: message.into(),
        }
    }

    /// Encode to the wire frame.
    pub fn encode(&self) -> Result<String> {
        encode_request(&self.document_id, self.mode, &self.message)
    }
}

/// The wire shape of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub message: String,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new_document: Option<bool>,
}

impl RequestFrame {
    /// Mode carried by this frame.
    pub fn mode(&self) -> DocumentMode {
        DocumentMode::from_flag(self.is_new_document)
    }
}

/// Encode a request as a single self-contained JSON text frame.
pub fn encode_request(document_id: &str, mode: DocumentMode, message: &str) -> Result<String> {
    let frame = RequestFrame {
        message: message.to_string(),
        document_id: document_id.to_string(),
        is_new_document: Some(mode.is_new_document()),
    };
    JsonCodec::encode(&frame)
}
