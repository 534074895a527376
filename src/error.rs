//! Error types for the capture/replay engine.
//!
//! Both recorder and player treat these as recoverable: audio failures degrade
//! to a silent recording and editor failures drop the single event involved.

use thiserror::Error;

/// Failures reported by an [`EditorAdapter`](crate::editor::EditorAdapter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// The editor's document model has been disposed.
    #[error("editor model has been disposed")]
    Disposed,

    /// A range does not describe a valid span of the document.
    #[error("invalid range {0}")]
    InvalidRange(String),

    /// Two edits of one transaction touch the same span.
    #[error("edits in one transaction overlap at {0}")]
    OverlappingEdits(String),
}

/// Failures of the audio capture and playback capabilities.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The platform refused access to the microphone.
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// No device of the requested kind exists.
    #[error("no audio {0} device available")]
    NoDevice(&'static str),

    /// A named or indexed device could not be resolved.
    #[error("audio device '{0}' not found. Use 'codecast list-devices' to see available devices.")]
    DeviceNotFound(String),

    /// Building or running a device stream failed.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// Packaging captured samples into a payload failed.
    #[error("audio encoding failed: {0}")]
    Encoding(#[from] hound::Error),

    /// The payload handed to an output could not be decoded.
    #[error("audio decoding failed: {0}")]
    Decoding(String),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::Stream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::Stream(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        AudioError::Stream(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::Stream(err.to_string())
    }
}
