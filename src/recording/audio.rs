//! Microphone capture for recording sessions.
//!
//! Capture is chunked: the device callback appends mono PCM to a pending
//! buffer and cuts a chunk every `chunk_interval`. The recorder drains chunks
//! into an [`AudioTrack`] while recording and packages the track into a WAV
//! [`AudioBlob`] when it stops.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use hound::WavWriter;

use crate::clock::ElapsedMillis;
use crate::device::{find_device, suppress_alsa_warnings, DeviceKind};
use crate::error::AudioError;
use crate::timeline::AudioBlob;

/// Stream parameters reported by a capture once it has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    /// Sample rate of the delivered chunks in Hz
    pub sample_rate: u32,
}

/// Block of mono 16-bit PCM samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
}

/// Microphone capability used by the recorder.
pub trait AudioCapture {
    /// Opens the input stream. Fails when the microphone is unavailable or
    /// access is denied.
    fn start(&mut self) -> Result<CaptureFormat, AudioError>;

    /// Drains chunks completed since the last call.
    fn take_chunks(&mut self) -> Vec<AudioChunk>;

    /// Closes the stream and returns every remaining chunk, including the
    /// partially filled one.
    fn stop(&mut self) -> Vec<AudioChunk>;
}

/// Samples collected for one recording.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    format: CaptureFormat,
    samples: Vec<i16>,
}

impl AudioTrack {
    pub fn new(format: CaptureFormat) -> Self {
        Self {
            format,
            samples: Vec::new(),
        }
    }

    pub fn append(&mut self, chunks: Vec<AudioChunk>) {
        for chunk in chunks {
            self.samples.extend_from_slice(&chunk.samples);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_millis(&self) -> ElapsedMillis {
        if self.format.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.format.sample_rate as u64
    }

    /// Encodes the track as a mono 16-bit WAV file. An empty track yields an
    /// empty blob.
    pub fn into_blob(self) -> Result<AudioBlob, AudioError> {
        if self.samples.is_empty() {
            return Ok(AudioBlob::empty());
        }

        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut buffer, wav_spec)?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        Ok(AudioBlob::new(buffer.into_inner()))
    }
}

/// Pending samples and completed chunks, shared with the device callback.
#[derive(Debug)]
struct CaptureBuffer {
    pending: Vec<i16>,
    chunks: Vec<AudioChunk>,
    chunk_len: usize,
}

impl CaptureBuffer {
    fn new(chunk_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(chunk_len),
            chunks: Vec::new(),
            chunk_len: chunk_len.max(1),
        }
    }

    fn push_mono(&mut self, sample: i16) {
        self.pending.push(sample);
        if self.pending.len() >= self.chunk_len {
            let samples = std::mem::replace(&mut self.pending, Vec::with_capacity(self.chunk_len));
            self.chunks.push(AudioChunk { samples });
        }
    }

    /// Converts interleaved frames to mono by averaging channels.
    fn push_frames(&mut self, data: &[i16], channels: usize) {
        match channels {
            0 => {}
            1 => {
                for &sample in data {
                    self.push_mono(sample);
                }
            }
            _ => {
                for frame in data.chunks_exact(channels) {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    self.push_mono((sum / channels as i32) as i16);
                }
            }
        }
    }

    fn take_chunks(&mut self) -> Vec<AudioChunk> {
        std::mem::take(&mut self.chunks)
    }

    fn flush(&mut self) -> Vec<AudioChunk> {
        if !self.pending.is_empty() {
            let samples = std::mem::take(&mut self.pending);
            self.chunks.push(AudioChunk { samples });
        }
        self.take_chunks()
    }
}

/// Captures from a specified or default input device through cpal.
///
/// Features:
/// - Records at the device's native sample rate
/// - Converts multi-channel audio to mono by averaging channels
/// - Accepts i16, u16 and f32 device formats
pub struct CpalMicrophone {
    /// Device name, index or "default"
    device_name: String,
    /// Requested sample rate; the device rate wins when they differ
    requested_sample_rate: u32,
    chunk_interval: Duration,
    buffer: Arc<Mutex<CaptureBuffer>>,
    /// Active input stream (kept alive while capturing)
    stream: Option<cpal::Stream>,
}

impl CpalMicrophone {
    /// Creates a microphone capture.
    ///
    /// # Arguments
    /// * `device_name` - Device name/ID to use. Use "default" for system default device
    /// * `requested_sample_rate` - The desired sample rate in Hz (actual may differ based on device)
    /// * `chunk_interval` - Audio length of each delivered chunk
    pub fn new(device_name: String, requested_sample_rate: u32, chunk_interval: Duration) -> Self {
        Self {
            device_name,
            requested_sample_rate,
            chunk_interval,
            buffer: Arc::new(Mutex::new(CaptureBuffer::new(1))),
            stream: None,
        }
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let buffer = Arc::clone(&self.buffer);
        let channels = config.channels as usize;

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let converted: Vec<i16> = data
                    .iter()
                    .map(|&sample| <i16 as FromSample<T>>::from_sample_(sample))
                    .collect();
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.push_frames(&converted, channels);
                }
            },
            |err| {
                tracing::error!("Audio input stream error: {}", err);
            },
            None,
        )?;
        Ok(stream)
    }
}

impl AudioCapture for CpalMicrophone {
    fn start(&mut self) -> Result<CaptureFormat, AudioError> {
        let device = find_device(DeviceKind::Input, &self.device_name)?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let supported = suppress_alsa_warnings(|| device.default_input_config())?;
        let sample_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();

        if sample_rate != self.requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.requested_sample_rate,
                sample_rate
            );
        }
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            supported.channels(),
            sample_format
        );

        let chunk_len = (sample_rate as u128 * self.chunk_interval.as_millis() / 1000) as usize;
        self.buffer = Arc::new(Mutex::new(CaptureBuffer::new(chunk_len)));

        let config: cpal::StreamConfig = supported.into();
        let stream = match sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config)?,
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config)?,
            other => {
                return Err(AudioError::Stream(format!(
                    "unsupported input sample format {other:?}"
                )))
            }
        };

        stream.play()?;
        self.stream = Some(stream);
        tracing::debug!("Audio input stream started");

        Ok(CaptureFormat { sample_rate })
    }

    fn take_chunks(&mut self) -> Vec<AudioChunk> {
        match self.buffer.lock() {
            Ok(mut buffer) => buffer.take_chunks(),
            Err(_) => Vec::new(),
        }
    }

    fn stop(&mut self) -> Vec<AudioChunk> {
        // Dropping the stream stops the callback before the final flush
        self.stream = None;

        let chunks = match self.buffer.lock() {
            Ok(mut buffer) => buffer.flush(),
            Err(_) => Vec::new(),
        };
        tracing::debug!("Audio input stream stopped ({} chunks flushed)", chunks.len());
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_cuts_chunks_and_flushes_the_remainder() {
        let mut buffer = CaptureBuffer::new(4);
        buffer.push_frames(&[1, 2, 3, 4, 5, 6], 1);

        let completed = buffer.take_chunks();
        assert_eq!(completed, vec![AudioChunk { samples: vec![1, 2, 3, 4] }]);

        let rest = buffer.flush();
        assert_eq!(rest, vec![AudioChunk { samples: vec![5, 6] }]);
        assert!(buffer.flush().is_empty());
    }

    #[test]
    fn stereo_frames_are_averaged_to_mono() {
        let mut buffer = CaptureBuffer::new(16);
        buffer.push_frames(&[100, 300, -50, 50], 2);
        assert_eq!(buffer.flush(), vec![AudioChunk { samples: vec![200, 0] }]);
    }

    #[test]
    fn track_encodes_a_readable_wav() {
        let mut track = AudioTrack::new(CaptureFormat { sample_rate: 8_000 });
        track.append(vec![
            AudioChunk { samples: vec![0; 4_000] },
            AudioChunk { samples: vec![7; 4_000] },
        ]);
        assert_eq!(track.duration_millis(), 1_000);

        let blob = track.into_blob().unwrap();
        let reader = hound::WavReader::new(Cursor::new(blob.as_bytes().to_vec())).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 8_000);
    }

    #[test]
    fn empty_track_yields_empty_blob() {
        let track = AudioTrack::new(CaptureFormat { sample_rate: 16_000 });
        assert!(track.into_blob().unwrap().is_empty());
    }
}
