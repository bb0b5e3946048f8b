// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed events published by sequences.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Value carried by an event or system command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EventPayload {
    /// No payload
    #[default]
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float value
    Float(f32),
    /// 3D vector
    Vec3([f32; 3]),
    /// Text
    Text(String),
}

impl EventPayload {
    /// Get as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EventPayload::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer if possible
    pub fn as_int(&self) -> Option<i64> {
        match self {
            EventPayload::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            EventPayload::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec3 if possible
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            EventPayload::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as text if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EventPayload::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

static NO_PAYLOAD: EventPayload = EventPayload::None;

/// Event emitted from a running sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SequenceEvent {
    /// Named signal without data
    Signal(String),
    /// Named event with a payload
    Custom {
        /// Event name
        name: String,
        /// Event data
        payload: EventPayload,
    },
}

impl SequenceEvent {
    /// Create a signal event
    pub fn signal(name: impl Into<String>) -> Self {
        SequenceEvent::Signal(name.into())
    }

    /// Create a custom event
    pub fn custom(name: impl Into<String>, payload: EventPayload) -> Self {
        SequenceEvent::Custom {
            name: name.into(),
            payload,
        }
    }

    /// Event name
    pub fn name(&self) -> &str {
        match self {
            SequenceEvent::Signal(name) | SequenceEvent::Custom { name, .. } => name,
        }
    }

    /// Event payload
    pub fn payload(&self) -> &EventPayload {
        match self {
            SequenceEvent::Signal(_) => &NO_PAYLOAD,
            SequenceEvent::Custom { payload, .. } => payload,
        }
    }
}

/// Receiver for events published by steps
pub trait EventSink {
    /// Publish a single event
    fn publish(&self, event: SequenceEvent);
}

impl<F: Fn(SequenceEvent)> EventSink for F {
    fn publish(&self, event: SequenceEvent) {
        self(event);
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: SequenceEvent) {}
}

/// Sink that keeps every event in publish order
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<SequenceEvent>>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Names of recorded events, in order
    pub fn names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Take recorded events and clear the log
    pub fn take(&self) -> Vec<SequenceEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EventSink for EventLog {
    fn publish(&self, event: SequenceEvent) {
        self.events.borrow_mut().push(event);
    }
}
