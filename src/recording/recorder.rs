//! Session recorder: editor signals in, [`Timeline`] out.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local};

use super::audio::{AudioCapture, AudioTrack};
use crate::clock::{Clock, ElapsedMillis};
use crate::editor::{ContentChange, CursorChange, EditorAdapter, SelectionChange, Subscription};
use crate::timeline::{AudioBlob, Event, Timeline};

/// Recorder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Stopped,
    Recording,
}

/// Event buffer shared with the editor listeners.
#[derive(Debug)]
struct Session {
    started_at: u64,
    events: Vec<Event>,
}

impl Session {
    fn new(started_at: u64) -> Self {
        Self {
            started_at,
            events: Vec::new(),
        }
    }

    /// Offset of `now` from the session start, never earlier than the last
    /// appended event.
    fn stamp(&self, now: u64) -> ElapsedMillis {
        let elapsed = now.saturating_sub(self.started_at);
        self.events
            .last()
            .map(|last| elapsed.max(last.timestamp()))
            .unwrap_or(elapsed)
    }

    fn push(&mut self, now: u64, event: impl FnOnce(ElapsedMillis) -> Event) {
        let timestamp = self.stamp(now);
        let event = event(timestamp);
        tracing::debug!("Captured {} event at {}ms", event.kind(), timestamp);
        self.events.push(event);
    }
}

/// Records editor mutations and microphone audio into a [`Timeline`].
///
/// The editor is injected at construction; listeners are attached on
/// [`record`](Recorder::record) and disposed on [`stop`](Recorder::stop), before
/// every new recording, and when the recorder is dropped.
pub struct Recorder {
    editor: Rc<dyn EditorAdapter>,
    clock: Rc<dyn Clock>,
    capture: Option<Box<dyn AudioCapture>>,
    state: RecorderState,
    session: Rc<RefCell<Session>>,
    subscriptions: Vec<Subscription>,
    initial_value: String,
    audio_track: Option<AudioTrack>,
    audio_offset: ElapsedMillis,
    recorded_at: Option<DateTime<Local>>,
}

impl Recorder {
    /// Creates a recorder for `editor` that captures events only.
    pub fn new(editor: Rc<dyn EditorAdapter>, clock: Rc<dyn Clock>) -> Self {
        Self {
            editor,
            clock,
            capture: None,
            state: RecorderState::Stopped,
            session: Rc::new(RefCell::new(Session::new(0))),
            subscriptions: Vec::new(),
            initial_value: String::new(),
            audio_track: None,
            audio_offset: 0,
            recorded_at: None,
        }
    }

    /// Adds a microphone. Capture is best-effort: if it fails to start, the
    /// recording continues without audio.
    pub fn with_audio(mut self, capture: Box<dyn AudioCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Events captured so far in the current (or last) recording.
    pub fn event_count(&self) -> usize {
        self.session.borrow().events.len()
    }

    /// Time since the current recording started, or 0 when stopped.
    pub fn elapsed(&self) -> ElapsedMillis {
        match self.state {
            RecorderState::Recording => self
                .clock
                .now_millis()
                .saturating_sub(self.session.borrow().started_at),
            RecorderState::Stopped => 0,
        }
    }

    /// Starts a recording. Does nothing if one is already running.
    pub fn record(&mut self) {
        if self.state == RecorderState::Recording {
            tracing::debug!("record() ignored: already recording");
            return;
        }

        self.dispose_listeners();
        self.audio_track = None;
        self.audio_offset = 0;

        self.initial_value = match self.editor.value() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not snapshot editor content: {}", e);
                String::new()
            }
        };

        let started_at = self.clock.now_millis();
        *self.session.borrow_mut() = Session::new(started_at);
        self.recorded_at = Some(Local::now());

        self.attach_listeners();
        self.state = RecorderState::Recording;
        tracing::info!(
            "Recording started ({} chars initial document)",
            self.initial_value.chars().count()
        );

        self.start_audio(started_at);
    }

    /// Stops the recording and returns the frozen timeline. Returns an empty
    /// timeline when not recording.
    pub fn stop(&mut self) -> Timeline {
        if self.state == RecorderState::Stopped {
            tracing::debug!("stop() ignored: not recording");
            return Timeline::default();
        }

        self.dispose_listeners();
        let audio = self.finish_audio();

        let now = self.clock.now_millis();
        let session = std::mem::replace(&mut *self.session.borrow_mut(), Session::new(now));
        let duration = now.saturating_sub(session.started_at);
        self.state = RecorderState::Stopped;

        tracing::info!(
            "Recording stopped: {} events over {}ms, {} bytes of audio",
            session.events.len(),
            duration,
            audio.len()
        );

        let mut timeline = Timeline::new(
            std::mem::take(&mut self.initial_value),
            session.events,
            audio,
            duration,
        )
        .with_audio_offset(self.audio_offset);
        if let Some(recorded_at) = self.recorded_at.take() {
            timeline = timeline.with_recorded_at(recorded_at);
        }
        timeline
    }

    /// Moves completed audio chunks from the capture into the session.
    /// Hosts may call this periodically; [`stop`](Recorder::stop) always
    /// performs a final flush.
    pub fn poll_audio(&mut self) {
        if let (Some(capture), Some(track)) = (self.capture.as_mut(), self.audio_track.as_mut()) {
            track.append(capture.take_chunks());
        }
    }

    fn attach_listeners(&mut self) {
        let session = Rc::clone(&self.session);
        let clock = Rc::clone(&self.clock);
        let text = self
            .editor
            .on_content_changed(Box::new(move |change: &ContentChange| {
                session
                    .borrow_mut()
                    .push(clock.now_millis(), |timestamp| Event::TextEdit {
                        timestamp,
                        edits: change.changes.clone(),
                    });
            }));

        let session = Rc::clone(&self.session);
        let clock = Rc::clone(&self.clock);
        let cursor = self
            .editor
            .on_cursor_position_changed(Box::new(move |change: &CursorChange| {
                session
                    .borrow_mut()
                    .push(clock.now_millis(), |timestamp| Event::Cursor {
                        timestamp,
                        position: change.position,
                        source: change.source.clone(),
                    });
            }));

        let session = Rc::clone(&self.session);
        let clock = Rc::clone(&self.clock);
        let selection = self
            .editor
            .on_selection_changed(Box::new(move |change: &SelectionChange| {
                session
                    .borrow_mut()
                    .push(clock.now_millis(), |timestamp| Event::Selection {
                        timestamp,
                        range: change.selection,
                        source: change.source.clone(),
                    });
            }));

        self.subscriptions.extend([text, cursor, selection]);
    }

    fn dispose_listeners(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }

    fn start_audio(&mut self, started_at: u64) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };

        match capture.start() {
            Ok(format) => {
                self.audio_offset = self.clock.now_millis().saturating_sub(started_at);
                self.audio_track = Some(AudioTrack::new(format));
                tracing::debug!(
                    "Audio capture started {}ms after snapshot at {}Hz",
                    self.audio_offset,
                    format.sample_rate
                );
            }
            Err(e) => {
                tracing::warn!("Audio capture unavailable, recording without audio: {}", e);
            }
        }
    }

    fn finish_audio(&mut self) -> AudioBlob {
        let Some(mut track) = self.audio_track.take() else {
            return AudioBlob::empty();
        };
        if let Some(capture) = self.capture.as_mut() {
            track.append(capture.stop());
        }

        tracing::debug!(
            "Packaging {} samples ({}ms) of audio",
            track.sample_count(),
            track.duration_millis()
        );
        match track.into_blob() {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("Failed to package recorded audio: {}", e);
                AudioBlob::empty()
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.dispose_listeners();
        if self.audio_track.is_some() {
            if let Some(capture) = self.capture.as_mut() {
                capture.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::editor::{MemoryEditor, Position, Range, TextEdit};
    use crate::error::AudioError;
    use crate::recording::audio::{AudioChunk, CaptureFormat};

    fn setup(text: &str) -> (Rc<MemoryEditor>, Rc<ManualClock>, Recorder) {
        let editor = Rc::new(MemoryEditor::new(text));
        let clock = Rc::new(ManualClock::new());
        let recorder = Recorder::new(editor.clone(), clock.clone());
        (editor, clock, recorder)
    }

    struct DeniedMicrophone;

    impl AudioCapture for DeniedMicrophone {
        fn start(&mut self) -> Result<CaptureFormat, AudioError> {
            Err(AudioError::PermissionDenied("blocked by user".into()))
        }

        fn take_chunks(&mut self) -> Vec<AudioChunk> {
            Vec::new()
        }

        fn stop(&mut self) -> Vec<AudioChunk> {
            Vec::new()
        }
    }

    /// Delivers one chunk per poll and a final partial chunk on stop.
    struct ScriptedMicrophone {
        stopped: Rc<RefCell<bool>>,
    }

    impl AudioCapture for ScriptedMicrophone {
        fn start(&mut self) -> Result<CaptureFormat, AudioError> {
            Ok(CaptureFormat { sample_rate: 1_000 })
        }

        fn take_chunks(&mut self) -> Vec<AudioChunk> {
            vec![AudioChunk { samples: vec![1; 100] }]
        }

        fn stop(&mut self) -> Vec<AudioChunk> {
            *self.stopped.borrow_mut() = true;
            vec![AudioChunk { samples: vec![2; 50] }]
        }
    }

    #[test]
    fn concrete_session_is_captured() {
        let (editor, clock, mut recorder) = setup("function x() {}");
        recorder.record();

        clock.advance(200);
        editor
            .apply_edits(&[TextEdit::insert(Position::new(1, 15), "\n  return 1;")])
            .unwrap();
        clock.advance(200);
        editor.set_position(Position::new(2, 3), None).unwrap();
        clock.advance(50);

        let timeline = recorder.stop();
        assert_eq!(timeline.initial_value(), "function x() {}");
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.events()[0].timestamp(), 200);
        assert_eq!(
            timeline.events()[1],
            Event::Cursor {
                timestamp: 400,
                position: Position::new(2, 3),
                source: None,
            }
        );
        assert_eq!(timeline.duration(), 450);
        assert!(timeline.audio().is_empty());
        assert!(timeline.recorded_at().is_some());
    }

    #[test]
    fn record_twice_keeps_a_single_set_of_listeners() {
        let (editor, clock, mut recorder) = setup("");
        recorder.record();
        recorder.record();
        assert_eq!(editor.listener_count(), 3);

        clock.advance(10);
        editor.type_text("a").unwrap();
        let timeline = recorder.stop();

        // one content change plus the caret move from typing
        assert_eq!(timeline.len(), 2);
        assert_eq!(editor.listener_count(), 0);
    }

    #[test]
    fn dropping_while_recording_releases_listeners_and_microphone() {
        let stopped = Rc::new(RefCell::new(false));
        let (editor, _clock, recorder) = setup("");
        let mut recorder = recorder.with_audio(Box::new(ScriptedMicrophone {
            stopped: Rc::clone(&stopped),
        }));

        recorder.record();
        assert_eq!(editor.listener_count(), 3);
        drop(recorder);

        assert_eq!(editor.listener_count(), 0);
        assert!(*stopped.borrow());
        editor.type_text("after").unwrap();
    }

    #[test]
    fn stop_is_idempotent() {
        let (_editor, _clock, mut recorder) = setup("x");
        recorder.record();
        let first = recorder.stop();
        let second = recorder.stop();

        assert_eq!(first.initial_value(), "x");
        assert_eq!(second, Timeline::default());
        assert_eq!(recorder.state(), RecorderState::Stopped);
    }

    #[test]
    fn new_recording_clears_previous_events() {
        let (editor, clock, mut recorder) = setup("");
        recorder.record();
        editor.type_text("first").unwrap();
        recorder.stop();

        recorder.record();
        clock.advance(5);
        editor.set_selection(Range::new(1, 1, 1, 3), None).unwrap();
        let timeline = recorder.stop();

        assert_eq!(timeline.initial_value(), "first");
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.events()[0].timestamp(), 5);
    }

    #[test]
    fn edits_after_stop_are_not_captured() {
        let (editor, _clock, mut recorder) = setup("");
        recorder.record();
        let timeline = recorder.stop();
        editor.type_text("late").unwrap();

        assert!(timeline.is_empty());
        assert_eq!(recorder.event_count(), 0);
    }

    #[test]
    fn events_in_the_same_tick_share_a_timestamp() {
        let (editor, clock, mut recorder) = setup("");
        recorder.record();
        clock.advance(30);
        editor.type_text("ab").unwrap();

        let timeline = recorder.stop();
        assert!(timeline.events().iter().all(|event| event.timestamp() == 30));
        assert!(timeline.is_monotonic());
    }

    #[test]
    fn denied_microphone_still_records_events() {
        let (editor, clock, recorder) = setup("");
        let mut recorder = recorder.with_audio(Box::new(DeniedMicrophone));
        recorder.record();
        clock.advance(20);
        editor.type_text("ok").unwrap();

        let timeline = recorder.stop();
        assert_eq!(timeline.len(), 2);
        assert!(timeline.audio().is_empty());
        assert_eq!(timeline.audio_offset(), 0);
    }

    #[test]
    fn stop_flushes_chunks_not_yet_polled() {
        let stopped = Rc::new(RefCell::new(false));
        let (_editor, clock, recorder) = setup("");
        let mut recorder = recorder.with_audio(Box::new(ScriptedMicrophone {
            stopped: Rc::clone(&stopped),
        }));

        recorder.record();
        clock.advance(100);
        recorder.poll_audio();
        clock.advance(50);
        let timeline = recorder.stop();

        assert!(*stopped.borrow());
        let reader =
            hound::WavReader::new(std::io::Cursor::new(timeline.audio().as_bytes().to_vec()))
                .unwrap();
        assert_eq!(reader.len(), 150);
        assert_eq!(timeline.duration(), 150);
    }
}
