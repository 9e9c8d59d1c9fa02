//! Inbound event vocabulary.

use std::fmt;

/// One semantic event decoded from an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Backend reported an error payload. Not terminal.
    Error(String),
    /// Streaming started (`true`) or ended (`false`).
    StreamingState(bool),
    /// Incremental text.
    Chunk(String),
    /// A full draft checkpoint. Not necessarily end-of-stream.
    DraftContent(String),
    /// Name of the backend node that just ran.
    Update(String),
    /// Required information is missing; payload describes what.
    Interrupt(String),
}

impl Event {
    /// The kind used to route this event to a handler.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Error(_) => EventKind::Error,
            Event::StreamingState(_) => EventKind::Streaming,
            Event::Chunk(_) => EventKind::Chunk,
            Event::DraftContent(_) => EventKind::DraftContent,
            Event::Update(_) => EventKind::Update,
            Event::Interrupt(_) => EventKind::Interrupt,
        }
    }

    /// Text payload of the event, if it carries one.
    pub fn into_text(self) -> Option<String> {
        match self {
            Event::Error(s)
            | Event::Chunk(s)
            | Event::DraftContent(s)
            | Event::Update(s)
            | Event::Interrupt(s) => Some(s),
            Event::StreamingState(_) => None,
        }
    }
}

/// Closed set of routable event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Error,
    Streaming,
    Chunk,
    DraftContent,
    Update,
    Interrupt,
}

impl EventKind {
    /// Wire field name carrying this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Error => "error",
            EventKind::Streaming => "streaming",
            EventKind::Chunk => "chunk",
            EventKind::DraftContent => "draftContent",
            EventKind::Update => "update",
            EventKind::Interrupt => "interrupt",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
