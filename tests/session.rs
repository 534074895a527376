//! Integration tests for complete record and replay sessions
//!
//! These tests drive the recorder and the player together:
//! - The reference editing scenario
//! - Audio capture that fails or succeeds next to editor events
//! - Async playback paced by the system clock

mod common;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use codecast::clock::{ManualClock, SystemClock};
use codecast::editor::{EditorAdapter, MemoryEditor, Position, TextEdit};
use codecast::error::AudioError;
use codecast::playback::{decode_wav, Player, PlayerState};
use codecast::recording::{AudioCapture, AudioChunk, CaptureFormat, Recorder};
use codecast::timeline::Event;
use common::replay;

/// Microphone that delivers a fixed chunk every poll.
struct SteadyMicrophone {
    sample_rate: u32,
}

impl AudioCapture for SteadyMicrophone {
    fn start(&mut self) -> Result<CaptureFormat, AudioError> {
        Ok(CaptureFormat {
            sample_rate: self.sample_rate,
        })
    }

    fn take_chunks(&mut self) -> Vec<AudioChunk> {
        vec![AudioChunk {
            samples: vec![100; self.sample_rate as usize / 10],
        }]
    }

    fn stop(&mut self) -> Vec<AudioChunk> {
        Vec::new()
    }
}

struct MissingMicrophone;

impl AudioCapture for MissingMicrophone {
    fn start(&mut self) -> Result<CaptureFormat, AudioError> {
        Err(AudioError::NoDevice("input"))
    }

    fn take_chunks(&mut self) -> Vec<AudioChunk> {
        Vec::new()
    }

    fn stop(&mut self) -> Vec<AudioChunk> {
        Vec::new()
    }
}

#[test]
fn test_reference_scenario_round_trip() {
    let editor = Rc::new(MemoryEditor::new("function x() {}"));
    let clock = Rc::new(ManualClock::new());
    let mut recorder = Recorder::new(editor.clone(), clock.clone());

    recorder.record();
    clock.set(200);
    editor
        .apply_edits(&[TextEdit::insert(Position::new(1, 15), "\n  return 1;")])
        .unwrap();
    clock.set(400);
    editor.set_position(Position::new(2, 3), None).unwrap();
    let timeline = recorder.stop();

    assert_eq!(timeline.len(), 2);
    assert!(matches!(timeline.events()[0], Event::TextEdit { timestamp: 200, .. }));
    assert!(matches!(timeline.events()[1], Event::Cursor { timestamp: 400, .. }));
    assert!(timeline.duration() >= 400);

    let target = replay(timeline, "arbitrary\ncontent", 16);
    assert_eq!(target.value().unwrap(), "function x() {\n  return 1;}");
    assert_eq!(target.position(), Some(Position::new(2, 3)));
}

#[test]
fn test_missing_microphone_keeps_every_event() {
    let editor = Rc::new(MemoryEditor::new(""));
    let clock = Rc::new(ManualClock::new());
    let mut recorder =
        Recorder::new(editor.clone(), clock.clone()).with_audio(Box::new(MissingMicrophone));

    recorder.record();
    for word in ["let", " ", "x"] {
        clock.advance(25);
        editor.type_text(word).unwrap();
    }
    let timeline = recorder.stop();

    // each word is one content change plus one caret move
    assert_eq!(timeline.len(), 6);
    assert!(timeline.audio().is_empty());

    let target = replay(timeline, "", 5);
    assert_eq!(target.value().unwrap(), "let x");
}

#[test]
fn test_recorded_audio_decodes_with_capture_rate() {
    let editor = Rc::new(MemoryEditor::new(""));
    let clock = Rc::new(ManualClock::new());
    let mut recorder = Recorder::new(editor.clone(), clock.clone())
        .with_audio(Box::new(SteadyMicrophone { sample_rate: 8_000 }));

    recorder.record();
    for _ in 0..5 {
        clock.advance(100);
        recorder.poll_audio();
    }
    editor.type_text("a").unwrap();
    let timeline = recorder.stop();

    let audio = decode_wav(timeline.audio()).unwrap();
    assert_eq!(audio.sample_rate, 8_000);
    assert_eq!(audio.duration(), Duration::from_millis(500));
    assert_eq!(timeline.duration(), 500);
}

/// Audio starts right after the document snapshot; the gap between the two
/// is recorded and stays well under one frame on a real clock.
#[test]
fn test_audio_offset_stays_within_a_frame() {
    let editor = Rc::new(MemoryEditor::new(""));
    let mut recorder = Recorder::new(editor, Rc::new(SystemClock::new()))
        .with_audio(Box::new(SteadyMicrophone { sample_rate: 1_000 }));

    recorder.record();
    let timeline = recorder.stop();

    assert!(timeline.audio_offset() <= 16, "offset {}ms", timeline.audio_offset());
}

#[tokio::test]
async fn test_async_replay_matches_recording() {
    let source = Rc::new(MemoryEditor::new("fn main() {}"));
    let clock = Rc::new(SystemClock::new());
    let mut recorder = Recorder::new(source.clone(), clock.clone());

    recorder.record();
    source.set_position(Position::new(1, 12), Some("mouse")).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    source.type_text("\n    run();\n").unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let timeline = recorder.stop();

    let target = Rc::new(MemoryEditor::new(""));
    let player = Player::new(Arc::new(timeline), target.clone(), clock)
        .with_frame_interval(Duration::from_millis(4));
    tokio::time::timeout(Duration::from_secs(5), player.play_to_end())
        .await
        .expect("playback should finish");

    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(target.value().unwrap(), source.value().unwrap());
    assert_eq!(target.position(), source.position());
}
