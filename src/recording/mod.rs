//! Session recording.
//!
//! The [`Recorder`] turns editor change signals into timestamped events and
//! captures microphone audio alongside them.

pub mod audio;
pub mod recorder;

pub use audio::{AudioCapture, AudioChunk, AudioTrack, CaptureFormat, CpalMicrophone};
pub use recorder::{Recorder, RecorderState};
