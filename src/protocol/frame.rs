//! Inbound frame classification.
//!
//! A frame is parsed as a JSON object and classified into exactly one
//! [`Event`]. Decoding is total: any byte sequence yields either an event or
//! a [`DecodeError`], never a panic.
//!
//! # Example
//!
//! ```
//! use draftwire_client::protocol::{decode_frame, Event};
//!
//! let event = decode_frame(br#"{"chunk":"Non-"}"#).unwrap();
//! assert_eq!(event, Event::Chunk("Non-".to_string()));
//!
//! assert!(decode_frame(b"garbage").is_err());
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use super::event::Event;

/// Wire field names of inbound frames.
pub mod fields {
    pub const ERROR: &str = "error";
    pub const STREAMING: &str = "streaming";
    pub const CHUNK: &str = "chunk";
    pub const DRAFT_CONTENT: &str = "draftContent";
    pub const UPDATE: &str = "update";
    pub const INTERRUPT: &str = "interrupt";
}

/// A frame that could not be classified. Logged and dropped by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not valid JSON (or not UTF-8).
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Valid JSON, but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// An object with none of the known event fields (keys listed).
    #[error("unrecognized frame with keys {0:?}")]
    Unrecognized(Vec<String>),
}

/// Decode one inbound frame into an [`Event`].
pub fn decode_frame(bytes: &[u8]) -> Result<Event, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    classify(&object)
        .ok_or_else(|| DecodeError::Unrecognized(object.keys().cloned().collect()))
}

/// Encode an event in the shape the backend sends it.
///
/// Used by in-process backends and tests; the client itself never sends events.
pub fn encode_event(event: &Event) -> String {
    let value = match event {
        Event::StreamingState(streaming) => Value::Bool(*streaming),
        other => Value::String(other.clone().into_text().unwrap_or_default()),
    };
    let mut object = Map::new();
    object.insert(event.kind().as_str().to_string(), value);
    Value::Object(object).to_string()
}

fn classify(object: &Map<String, Value>) -> Option<Event> {
    // An error payload wins over everything else in the frame.
    if let Some(message) = object.get(fields::ERROR).and_then(error_message) {
        return Some(Event::Error(message));
    }

    if let Some(streaming) = object.get(fields::STREAMING).and_then(Value::as_bool) {
        return Some(Event::StreamingState(streaming));
    }

    let text = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_string);

    text(fields::CHUNK)
        .map(Event::Chunk)
        .or_else(|| text(fields::DRAFT_CONTENT).map(Event::DraftContent))
        .or_else(|| text(fields::UPDATE).map(Event::Update))
        .or_else(|| text(fields::INTERRUPT).map(Event::Interrupt))
}

/// Message for an `error` field, or `None` when the field is empty-ish
/// (`null`, `false`, `""`).
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
