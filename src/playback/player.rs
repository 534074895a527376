//! Frame-driven replay of a [`Timeline`] into an editor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use super::audio::AudioOutput;
use crate::clock::{Clock, ElapsedMillis};
use crate::editor::EditorAdapter;
use crate::error::EditorError;
use crate::timeline::{Event, Timeline};

/// Default pause between frames, roughly one display refresh.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Player lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

/// Replays a recorded session into an editor, optionally with its audio.
///
/// Every frame applies, in recorded order, all events whose timestamp has
/// been reached. Frames come either from [`run`](Player::run), which paces
/// itself with a tokio interval, or from a host calling [`tick`](Player::tick)
/// on its own schedule. All methods take `&self` so a running loop can be
/// stopped or paused from elsewhere on the same thread, including from editor
/// listeners fired while an event is being applied.
pub struct Player {
    timeline: Arc<Timeline>,
    editor: Rc<dyn EditorAdapter>,
    clock: Rc<dyn Clock>,
    audio: RefCell<Option<Box<dyn AudioOutput>>>,
    audio_loaded: Cell<bool>,
    frame_interval: Duration,
    state: Cell<PlayerState>,
    /// Clock reading that corresponds to timeline time 0
    play_start: Cell<u64>,
    /// Timeline time of the last frame
    last_played_time: Cell<ElapsedMillis>,
    /// Timeline time frozen by `pause`
    paused_at: Cell<ElapsedMillis>,
    next_index: Cell<usize>,
    applied: Cell<usize>,
    /// Bumped by every `play`, so a frame can tell it was restarted
    generation: Cell<u64>,
    wake: Notify,
}

impl Player {
    pub fn new(
        timeline: Arc<Timeline>,
        editor: Rc<dyn EditorAdapter>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            timeline,
            editor,
            clock,
            audio: RefCell::new(None),
            audio_loaded: Cell::new(false),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            state: Cell::new(PlayerState::Stopped),
            play_start: Cell::new(0),
            last_played_time: Cell::new(0),
            paused_at: Cell::new(0),
            next_index: Cell::new(0),
            applied: Cell::new(0),
            generation: Cell::new(0),
            wake: Notify::new(),
        }
    }

    /// Adds an audio output for the timeline's track. Audio is best-effort:
    /// if it cannot be loaded or started, events still replay.
    pub fn with_audio(mut self, output: Box<dyn AudioOutput>) -> Self {
        self.audio = RefCell::new(Some(output));
        self
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval.max(Duration::from_millis(1));
        self
    }

    pub fn state(&self) -> PlayerState {
        self.state.get()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Timeline time reached by the last frame.
    pub fn current_time(&self) -> ElapsedMillis {
        self.last_played_time.get()
    }

    /// Events successfully applied since the last `play`.
    pub fn applied_count(&self) -> usize {
        self.applied.get()
    }

    /// Resets the editor to the recorded initial document and starts replay.
    /// Does nothing while already playing; from `Paused` it starts over.
    pub fn play(&self) {
        if self.state.get() == PlayerState::Playing {
            tracing::debug!("play() ignored: already playing");
            return;
        }

        if let Err(e) = self.editor.set_value(self.timeline.initial_value()) {
            tracing::debug!("Could not reset editor before replay: {}", e);
        }
        self.editor.focus();

        self.generation.set(self.generation.get().wrapping_add(1));
        self.next_index.set(0);
        self.applied.set(0);
        self.last_played_time.set(0);
        self.paused_at.set(0);
        self.play_start.set(self.clock.now_millis());
        self.state.set(PlayerState::Playing);

        tracing::info!(
            "Playback started: {} events over {}ms",
            self.timeline.len(),
            self.timeline.duration()
        );

        self.start_audio();
        self.wake.notify_one();
    }

    /// Halts replay immediately. Events that are due but not yet applied
    /// stay unapplied. Audio is paused and rewound. Safe to call repeatedly.
    pub fn stop(&self) {
        if self.state.get() == PlayerState::Stopped {
            tracing::debug!("stop() while stopped");
        } else {
            tracing::info!(
                "Playback stopped at {}ms ({}/{} events)",
                self.last_played_time.get(),
                self.next_index.get(),
                self.timeline.len()
            );
        }
        self.state.set(PlayerState::Stopped);

        if let Some(audio) = self.audio.borrow_mut().as_mut() {
            audio.pause();
            audio.rewind();
        }
        self.wake.notify_one();
    }

    /// Freezes replay at the current offset. Only valid while playing.
    pub fn pause(&self) {
        if self.state.get() != PlayerState::Playing {
            tracing::debug!("pause() ignored: not playing");
            return;
        }

        let offset = self.elapsed();
        self.paused_at.set(offset);
        self.state.set(PlayerState::Paused);
        if let Some(audio) = self.audio.borrow_mut().as_mut() {
            audio.pause();
        }
        tracing::info!("Playback paused at {}ms", offset);
        self.wake.notify_one();
    }

    /// Continues from the offset saved by [`pause`](Player::pause).
    pub fn resume(&self) {
        if self.state.get() != PlayerState::Paused {
            tracing::debug!("resume() ignored: not paused");
            return;
        }

        let offset = self.paused_at.get();
        self.play_start.set(self.clock.now_millis().saturating_sub(offset));
        self.state.set(PlayerState::Playing);
        if self.audio_loaded.get() {
            if let Some(audio) = self.audio.borrow_mut().as_mut() {
                if let Err(e) = audio.play() {
                    tracing::warn!("Could not resume audio: {}", e);
                }
            }
        }
        tracing::info!("Playback resumed at {}ms", offset);
        self.wake.notify_one();
    }

    /// Runs one frame. Returns whether another frame is needed.
    pub fn tick(&self) -> bool {
        if self.state.get() != PlayerState::Playing {
            return false;
        }

        let generation = self.generation.get();
        let current_time = self.elapsed();
        let start = self.next_index.get();
        let due = self.timeline.due_from(start, current_time);
        if !due.is_empty() {
            tracing::debug!(
                "Frame at {}ms applies {} event(s) from #{}",
                current_time,
                due.len(),
                start
            );
        }

        for event in due {
            // A listener may stop, pause or restart the player mid-frame
            if self.generation.get() != generation {
                return self.state.get() == PlayerState::Playing;
            }
            if self.state.get() != PlayerState::Playing {
                return false;
            }
            self.next_index.set(self.next_index.get() + 1);
            match self.apply(event) {
                Ok(()) => self.applied.set(self.applied.get() + 1),
                Err(e) => tracing::debug!(
                    "Dropped {} event at {}ms: {}",
                    event.kind(),
                    event.timestamp(),
                    e
                ),
            }
        }
        if self.generation.get() != generation {
            return self.state.get() == PlayerState::Playing;
        }
        self.last_played_time.set(current_time);

        if self.state.get() != PlayerState::Playing {
            return false;
        }
        if self.next_index.get() >= self.timeline.len() || current_time > self.timeline.duration() {
            self.finish(current_time);
            return false;
        }
        true
    }

    /// Drives frames until playback finishes or is stopped. Parks while
    /// paused. Returns immediately when stopped.
    pub async fn run(&self) {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            match self.state.get() {
                PlayerState::Stopped => break,
                PlayerState::Paused => self.wake.notified().await,
                PlayerState::Playing => {
                    tokio::select! {
                        _ = frames.tick() => {}
                        _ = self.wake.notified() => continue,
                    }
                    self.tick();
                }
            }
        }
    }

    /// Starts playback and drives it to completion or until stopped.
    pub async fn play_to_end(&self) {
        self.play();
        self.run().await;
    }

    fn elapsed(&self) -> ElapsedMillis {
        self.clock.now_millis().saturating_sub(self.play_start.get())
    }

    fn apply(&self, event: &Event) -> Result<(), EditorError> {
        match event {
            Event::Cursor {
                position, source, ..
            } => self.editor.set_position(*position, source.as_deref()),
            Event::Selection { range, source, .. } => {
                self.editor.set_selection(*range, source.as_deref())
            }
            Event::TextEdit { edits, .. } => self.editor.apply_edits(edits),
        }
    }

    fn start_audio(&self) {
        let blob = self.timeline.audio();
        if blob.is_empty() {
            return;
        }
        let mut audio = self.audio.borrow_mut();
        let Some(output) = audio.as_mut() else {
            return;
        };

        if self.audio_loaded.get() {
            output.rewind();
        } else {
            match output.load(blob) {
                Ok(()) => self.audio_loaded.set(true),
                Err(e) => {
                    tracing::warn!("Audio unavailable, replaying without sound: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = output.play() {
            tracing::warn!("Audio unavailable, replaying without sound: {}", e);
        }
    }

    fn finish(&self, current_time: ElapsedMillis) {
        self.state.set(PlayerState::Stopped);

        if self.audio_loaded.get() {
            if let Some(audio) = self.audio.borrow().as_ref() {
                let expected = current_time.saturating_sub(self.timeline.audio_offset());
                let heard = audio.position().as_millis() as i64;
                tracing::debug!(
                    "Audio drift at end of events: {}ms",
                    heard - expected as i64
                );
            }
        }
        tracing::info!(
            "Playback finished at {}ms: {} applied, {} dropped",
            current_time,
            self.applied.get(),
            self.next_index.get() - self.applied.get()
        );
    }
}
