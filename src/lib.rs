//! Record and replay code editing sessions.
//!
//! A [`Recorder`] listens to an editor and captures every content, caret and
//! selection change as a timestamped [`Event`], together with microphone
//! audio, into a [`Timeline`]. A [`Player`] later resets an editor to the
//! recorded starting document and re-applies the events at their recorded
//! offsets while the audio plays.
//!
//! The editor itself is abstracted behind [`EditorAdapter`]; [`MemoryEditor`]
//! is an in-memory implementation used by the CLI demo and the tests.

pub mod clock;
pub mod config;
pub mod device;
pub mod editor;
pub mod error;
pub mod logging;
pub mod playback;
pub mod recording;
pub mod timeline;

pub use clock::{Clock, ElapsedMillis, ManualClock, SystemClock};
pub use editor::{EditorAdapter, MemoryEditor, Position, Range, TextEdit};
pub use error::{AudioError, EditorError};
pub use playback::{Player, PlayerState};
pub use recording::{Recorder, RecorderState};
pub use timeline::{AudioBlob, Event, EventKind, Timeline};
