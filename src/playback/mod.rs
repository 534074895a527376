//! Session playback.
//!
//! The [`Player`] applies a recorded [`Timeline`](crate::timeline::Timeline)
//! to an editor frame by frame and plays the recorded audio next to it.

pub mod audio;
pub mod player;

pub use audio::{decode_wav, AudioOutput, CpalSpeaker, DecodedAudio};
pub use player::{Player, PlayerState, DEFAULT_FRAME_INTERVAL};
