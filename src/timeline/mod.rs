//! Recorded session: events, initial document and audio track.
//!
//! A [`Timeline`] is built once by the recorder and is read-only afterwards.
//! Players share it through an `Arc`, so any number of them can replay the
//! same session into different editors.

pub mod event;

pub use event::{Event, EventKind};

use chrono::{DateTime, Local};

use crate::clock::ElapsedMillis;

/// Encoded audio track (a complete WAV file). Empty when nothing was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBlob {
    bytes: Vec<u8>,
}

impl AudioBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Complete, immutable record of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    events: Vec<Event>,
    initial_value: String,
    audio: AudioBlob,
    duration: ElapsedMillis,
    audio_offset: ElapsedMillis,
    recorded_at: Option<DateTime<Local>>,
}

impl Timeline {
    /// Builds a timeline from events in recorded order.
    pub fn new(
        initial_value: impl Into<String>,
        events: Vec<Event>,
        audio: AudioBlob,
        duration: ElapsedMillis,
    ) -> Self {
        Self {
            events,
            initial_value: initial_value.into(),
            audio,
            duration,
            audio_offset: 0,
            recorded_at: None,
        }
    }

    pub fn with_audio_offset(mut self, audio_offset: ElapsedMillis) -> Self {
        self.audio_offset = audio_offset;
        self
    }

    pub fn with_recorded_at(mut self, recorded_at: DateTime<Local>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Document text when recording started.
    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    pub fn audio(&self) -> &AudioBlob {
        &self.audio
    }

    /// Total recording length. May exceed the last event's timestamp.
    pub fn duration(&self) -> ElapsedMillis {
        self.duration
    }

    /// Delay between the document snapshot and the start of audio capture.
    pub fn audio_offset(&self) -> ElapsedMillis {
        self.audio_offset
    }

    pub fn recorded_at(&self) -> Option<DateTime<Local>> {
        self.recorded_at
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<ElapsedMillis> {
        self.events.last().map(Event::timestamp)
    }

    /// Events from index `start` onwards whose timestamp is at most `up_to`,
    /// stopping at the first event that is not yet due.
    pub fn due_from(&self, start: usize, up_to: ElapsedMillis) -> &[Event] {
        let pending = self.events.get(start..).unwrap_or(&[]);
        let due = pending
            .iter()
            .take_while(|event| event.timestamp() <= up_to)
            .count();
        &pending[..due]
    }

    /// Whether timestamps never decrease in recorded order.
    pub fn is_monotonic(&self) -> bool {
        self.events
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp())
    }
}
