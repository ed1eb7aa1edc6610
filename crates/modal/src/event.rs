//! Events delivered to the session and its responses.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pointer buttons the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Places blocks while held.
    Primary,
    /// Deletes blocks while held.
    Secondary,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The pointer moved.
    PointerMove,
    /// A button went down.
    Press(Button),
    /// A button came up.
    Release(Button),
    /// The polling timer fired.
    Tick,
    /// The user asked to leave the session.
    Cancel,
    /// Any input the session does not interpret (navigation keys, wheel, ...).
    Other,
}

/// One host event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Event type.
    pub kind: EventKind,
    /// Pointer position in viewport region coordinates.
    pub pointer: Vec2,
    /// Monotonic timestamp.
    pub at: Duration,
}

impl Event {
    /// Create an event.
    pub fn new(kind: EventKind, pointer: Vec2, at: Duration) -> Self {
        Self { kind, pointer, at }
    }
}

/// How the session disposed of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// The session used the event; the host must not forward it.
    Consumed,
    /// The session ignored the event; the host handles it normally.
    PassThrough,
    /// The session ended.
    Cancelled,
}
