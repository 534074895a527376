//! Audio output for replaying a recorded track.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};

use crate::device::{find_device, suppress_alsa_warnings, DeviceKind};
use crate::error::AudioError;
use crate::timeline::AudioBlob;

/// Playable-audio capability used by the player.
pub trait AudioOutput {
    /// Prepares `blob` for playback at position 0.
    fn load(&mut self, blob: &AudioBlob) -> Result<(), AudioError>;

    /// Starts or continues playback from the current position.
    fn play(&mut self) -> Result<(), AudioError>;

    /// Halts playback, keeping the position.
    fn pause(&mut self);

    /// Moves the position back to 0.
    fn rewind(&mut self);

    /// Playback position within the track.
    fn position(&self) -> Duration;
}

/// Mono PCM decoded from a WAV payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl DecodedAudio {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Decodes a 16-bit integer WAV blob, averaging multi-channel frames to mono.
///
/// # Errors
/// - If the payload is not a WAV file
/// - If samples are not 16-bit integers
pub fn decode_wav(blob: &AudioBlob) -> Result<DecodedAudio, AudioError> {
    let reader = hound::WavReader::new(Cursor::new(blob.as_bytes()))
        .map_err(|e| AudioError::Decoding(e.to_string()))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(AudioError::Decoding(format!(
            "unsupported WAV format: {:?} {} bits",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let interleaved = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(|e| AudioError::Decoding(e.to_string()))?;

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    Ok(DecodedAudio {
        sample_rate: spec.sample_rate,
        samples,
    })
}

/// Read head over decoded samples, shared with the device callback.
#[derive(Debug)]
struct PlaybackBuffer {
    audio: DecodedAudio,
    /// Fractional index into `audio.samples`
    cursor: f64,
    /// Source samples consumed per output frame
    step: f64,
}

impl PlaybackBuffer {
    /// Next sample, resampled by nearest neighbour. Silence past the end.
    fn next_sample(&mut self) -> i16 {
        let index = self.cursor as usize;
        match self.audio.samples.get(index) {
            Some(&sample) => {
                self.cursor += self.step;
                sample
            }
            None => 0,
        }
    }

    fn position(&self) -> Duration {
        if self.audio.sample_rate == 0 {
            return Duration::ZERO;
        }
        let played = self.cursor.min(self.audio.samples.len() as f64);
        Duration::from_secs_f64(played / self.audio.sample_rate as f64)
    }
}

/// Plays a recorded track on a specified or default output device.
///
/// The stream runs from `load` on and outputs silence while paused.
pub struct CpalSpeaker {
    /// Device name, index or "default"
    device_name: String,
    buffer: Option<Arc<Mutex<PlaybackBuffer>>>,
    playing: Arc<AtomicBool>,
    /// Active output stream (kept alive while loaded)
    stream: Option<cpal::Stream>,
}

impl CpalSpeaker {
    pub fn new(device_name: String) -> Self {
        Self {
            device_name,
            buffer: None,
            playing: Arc::new(AtomicBool::new(false)),
            stream: None,
        }
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        buffer: Arc<Mutex<PlaybackBuffer>>,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample + FromSample<i16>,
    {
        let playing = Arc::clone(&self.playing);
        let channels = config.channels.max(1) as usize;

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut buffer = buffer.lock().ok();
                for frame in data.chunks_mut(channels) {
                    let sample = match buffer.as_mut() {
                        Some(buffer) if playing.load(Ordering::Relaxed) => buffer.next_sample(),
                        _ => 0,
                    };
                    let value = <T as FromSample<i16>>::from_sample_(sample);
                    for slot in frame.iter_mut() {
                        *slot = value;
                    }
                }
            },
            |err| {
                tracing::error!("Audio output stream error: {}", err);
            },
            None,
        )?;
        Ok(stream)
    }
}

impl AudioOutput for CpalSpeaker {
    fn load(&mut self, blob: &AudioBlob) -> Result<(), AudioError> {
        self.playing.store(false, Ordering::Relaxed);
        self.stream = None;

        let audio = decode_wav(blob)?;
        let device = find_device(DeviceKind::Output, &self.device_name)?;
        let supported = suppress_alsa_warnings(|| device.default_output_config())
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        let device_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();

        tracing::info!(
            "Playback device: {} ({}Hz, track {}Hz, {:.2}s)",
            device.name().unwrap_or_else(|_| "Unknown device".to_string()),
            device_rate,
            audio.sample_rate,
            audio.duration().as_secs_f32()
        );

        let step = audio.sample_rate as f64 / device_rate.max(1) as f64;
        let buffer = Arc::new(Mutex::new(PlaybackBuffer {
            audio,
            cursor: 0.0,
            step,
        }));

        let config: cpal::StreamConfig = supported.into();
        let stream = match sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config, Arc::clone(&buffer))?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config, Arc::clone(&buffer))?,
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config, Arc::clone(&buffer))?,
            other => {
                return Err(AudioError::Stream(format!(
                    "unsupported output sample format {other:?}"
                )))
            }
        };
        stream.play()?;

        self.stream = Some(stream);
        self.buffer = Some(buffer);
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.stream.is_none() {
            return Err(AudioError::Stream("no track loaded".to_string()));
        }
        self.playing.store(true, Ordering::Relaxed);
        tracing::debug!("Audio playback running");
        Ok(())
    }

    fn pause(&mut self) {
        self.playing.store(false, Ordering::Relaxed);
        tracing::debug!("Audio playback paused");
    }

    fn rewind(&mut self) {
        if let Some(buffer) = &self.buffer {
            if let Ok(mut buffer) = buffer.lock() {
                buffer.cursor = 0.0;
            }
        }
    }

    fn position(&self) -> Duration {
        self.buffer
            .as_ref()
            .and_then(|buffer| buffer.lock().ok().map(|buffer| buffer.position()))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{AudioChunk, AudioTrack, CaptureFormat};

    fn blob(sample_rate: u32, samples: Vec<i16>) -> AudioBlob {
        let mut track = AudioTrack::new(CaptureFormat { sample_rate });
        track.append(vec![AudioChunk { samples }]);
        track.into_blob().unwrap()
    }

    #[test]
    fn decodes_recorded_tracks() {
        let decoded = decode_wav(&blob(4_000, vec![3; 2_000])).unwrap();
        assert_eq!(decoded.sample_rate, 4_000);
        assert_eq!(decoded.samples.len(), 2_000);
        assert_eq!(decoded.duration(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_payloads_that_are_not_wav() {
        let result = decode_wav(&AudioBlob::new(b"definitely not audio".to_vec()));
        assert!(matches!(result, Err(AudioError::Decoding(_))));
    }

    #[test]
    fn read_head_resamples_and_pads_with_silence() {
        let mut buffer = PlaybackBuffer {
            audio: DecodedAudio {
                sample_rate: 2,
                samples: vec![10, 20, 30, 40],
            },
            cursor: 0.0,
            step: 2.0,
        };

        assert_eq!(buffer.next_sample(), 10);
        assert_eq!(buffer.next_sample(), 30);
        assert_eq!(buffer.next_sample(), 0);
        assert_eq!(buffer.position(), Duration::from_secs(2));
    }
}
