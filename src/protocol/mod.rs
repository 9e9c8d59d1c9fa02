//! Protocol module - the JSON envelope spoken with the document backend.
//!
//! - Outbound: one [`RequestFrame`] per logical request
//! - Inbound: each frame classifies to exactly one [`Event`] or a [`DecodeError`]
//!
//! Frames are single-purpose. When a frame carries several event fields only
//! the highest-precedence one is acted on:
//! `error` > `streaming` > `chunk` > `draftContent` > `update` > `interrupt`.

mod event;
mod frame;
mod request;

pub use event::{Event, EventKind};
pub use frame::{decode_frame, encode_event, fields, DecodeError};
pub use request::{encode_request, DocumentMode, GenerateRequest, RequestFrame};
