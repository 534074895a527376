//! Scripted record-and-replay session.
//!
//! Records a short editing session on an in-memory editor (with the
//! microphone when audio is enabled), then replays it into a fresh editor
//! with the recorded audio.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use codecast::clock::SystemClock;
use codecast::config::CodecastConfig;
use codecast::editor::{EditorAdapter, MemoryEditor, Position, Range, TextEdit};
use codecast::error::EditorError;
use codecast::playback::{CpalSpeaker, Player};
use codecast::recording::{CpalMicrophone, Recorder};
use codecast::timeline::{Event, Timeline};

const INITIAL_DOCUMENT: &str = "function x() {}";

/// One scripted editor action, performed `delay_ms` after the previous one.
struct Step {
    delay_ms: u64,
    action: Action,
}

enum Action {
    Insert(Position, &'static str),
    MoveCursor(Position),
    Select(Range),
    Type(&'static str),
}

fn script() -> Vec<Step> {
    vec![
        Step {
            delay_ms: 200,
            action: Action::Insert(Position::new(1, 15), "\n  return 1;"),
        },
        Step {
            delay_ms: 200,
            action: Action::MoveCursor(Position::new(2, 3)),
        },
        Step {
            delay_ms: 300,
            action: Action::Select(Range::new(2, 10, 2, 11)),
        },
        Step {
            delay_ms: 250,
            action: Action::Type("42"),
        },
    ]
}

fn perform(editor: &MemoryEditor, action: &Action) -> Result<(), EditorError> {
    match action {
        Action::Insert(position, text) => {
            editor.apply_edits(&[TextEdit::insert(*position, *text)])
        }
        Action::MoveCursor(position) => editor.set_position(*position, Some("mouse")),
        Action::Select(range) => editor.set_selection(*range, Some("mouse")),
        Action::Type(text) => editor.type_text(text),
    }
}

/// Records the scripted session and replays it.
///
/// # Errors
/// - If the config cannot be loaded
/// - If the scripted edits are rejected by the editor
pub async fn handle_demo(no_audio: bool) -> anyhow::Result<()> {
    let config = CodecastConfig::load()?;
    let audio = config.audio.enabled && !no_audio;
    tracing::info!("Demo starting (audio: {})", audio);

    let hint = if audio { " (speak now)" } else { "" };
    println!("Recording scripted session{hint}...");
    let timeline = record(&config, audio).await?;
    print_timeline(&timeline);

    println!();
    println!("Replaying (Ctrl-C to stop)...");
    replay(&config, audio, timeline).await;
    Ok(())
}

async fn record(config: &CodecastConfig, audio: bool) -> anyhow::Result<Timeline> {
    let editor = Rc::new(MemoryEditor::new(INITIAL_DOCUMENT));
    let clock = Rc::new(SystemClock::new());

    let mut recorder = Recorder::new(editor.clone(), clock);
    if audio {
        recorder = recorder.with_audio(Box::new(CpalMicrophone::new(
            config.audio.input_device.clone(),
            config.audio.sample_rate,
            config.audio.chunk_interval(),
        )));
    }

    recorder.record();
    for step in script() {
        tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        recorder.poll_audio();
        perform(&editor, &step.action)?;
    }
    // Trailing silence so the last keystrokes are audible on replay
    tokio::time::sleep(Duration::from_millis(300)).await;

    Ok(recorder.stop())
}

fn print_timeline(timeline: &Timeline) {
    println!(
        "Captured {} events over {}ms ({} bytes of audio, offset {}ms)",
        timeline.len(),
        timeline.duration(),
        timeline.audio().len(),
        timeline.audio_offset()
    );
    for event in timeline.events() {
        let detail = match event {
            Event::Cursor { position, .. } => format!("caret to {position}"),
            Event::Selection { range, .. } => format!("select {range}"),
            Event::TextEdit { edits, .. } => edits
                .iter()
                .map(|edit| format!("{} <- {:?}", edit.range, edit.text))
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!("  [{:>5}ms] {:<9} {}", event.timestamp(), event.kind(), detail);
    }
}

async fn replay(config: &CodecastConfig, audio: bool, timeline: Timeline) {
    let editor = Rc::new(MemoryEditor::new("// previous content"));
    let clock = Rc::new(SystemClock::new());
    let mut player = Player::new(Arc::new(timeline), editor.clone(), clock)
        .with_frame_interval(config.frame_interval());
    if audio {
        let speaker = CpalSpeaker::new(config.audio.output_device.clone());
        player = player.with_audio(Box::new(speaker));
    }

    let finished = async {
        player.play_to_end().await;
        if audio {
            // Events can finish before the track does
            let rest = player.timeline().duration().saturating_sub(player.current_time());
            tokio::time::sleep(Duration::from_millis(rest)).await;
        }
    };

    tokio::select! {
        _ = finished => {}
        _ = tokio::signal::ctrl_c() => {
            player.stop();
            println!("Playback stopped.");
        }
    }

    println!();
    println!("Document after replay:");
    println!("{}", editor.value().unwrap_or_default());
    if let Some(position) = editor.position() {
        println!("Cursor at {position}");
    }
}
