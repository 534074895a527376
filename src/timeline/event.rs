//! One captured editor mutation.

use std::fmt;

use crate::clock::ElapsedMillis;
use crate::editor::{Position, Range, TextEdit};

/// Editor mutation stamped with its offset from the recording start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Caret moved.
    Cursor {
        timestamp: ElapsedMillis,
        position: Position,
        source: Option<String>,
    },
    /// Selection changed.
    Selection {
        timestamp: ElapsedMillis,
        range: Range,
        source: Option<String>,
    },
    /// Every edit of one editor transaction, in transaction order.
    TextEdit {
        timestamp: ElapsedMillis,
        edits: Vec<TextEdit>,
    },
}

impl Event {
    pub fn timestamp(&self) -> ElapsedMillis {
        match self {
            Event::Cursor { timestamp, .. }
            | Event::Selection { timestamp, .. }
            | Event::TextEdit { timestamp, .. } => *timestamp,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Cursor { .. } => EventKind::Cursor,
            Event::Selection { .. } => EventKind::Selection,
            Event::TextEdit { .. } => EventKind::TextEdit,
        }
    }
}

/// Discriminant of [`Event`], used for logging and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Cursor,
    Selection,
    TextEdit,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cursor => "cursor",
            Self::Selection => "selection",
            Self::TextEdit => "text",
        };
        f.pad(label)
    }
}
