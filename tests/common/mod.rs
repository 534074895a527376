//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::rc::Rc;
use std::sync::Arc;

use codecast::clock::ManualClock;
use codecast::editor::{EditorAdapter, MemoryEditor, Position, Range};
use codecast::playback::{Player, PlayerState};
use codecast::timeline::Timeline;

/// Editor state compared after a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub position: Option<Position>,
    pub selection: Option<Range>,
}

pub fn snapshot(editor: &MemoryEditor) -> Snapshot {
    Snapshot {
        text: editor.value().unwrap_or_default(),
        position: editor.position(),
        selection: editor.selection(),
    }
}

/// Replays `timeline` into a new editor holding `existing`, advancing a
/// manual clock by `frame_ms` per frame until playback stops.
pub fn replay(timeline: Timeline, existing: &str, frame_ms: u64) -> Rc<MemoryEditor> {
    let editor = Rc::new(MemoryEditor::new(existing));
    let clock = Rc::new(ManualClock::new());
    let player = Player::new(Arc::new(timeline), editor.clone(), clock.clone());

    player.play();
    let mut frames = 0;
    while player.tick() {
        clock.advance(frame_ms.max(1));
        frames += 1;
        assert!(frames < 1_000_000, "playback never finished");
    }
    assert_eq!(player.state(), PlayerState::Stopped);
    editor
}
