//! Configuration file editor command.
//!
//! Opens the codecast config in the user's editor and checks the result, so
//! a typo shows up here instead of on the next `codecast demo`.

use std::path::Path;
use std::process::Command;

use anyhow::anyhow;
use codecast::config::CodecastConfig;

#[cfg(windows)]
const FALLBACK_EDITOR: &str = "notepad";
#[cfg(not(windows))]
const FALLBACK_EDITOR: &str = "vi";

/// Opens the config file for editing, then validates what was saved.
///
/// The editor is `$VISUAL`, then `$EDITOR`, then the platform fallback.
/// Either variable may carry arguments, as in `code --wait`.
///
/// # Errors
/// - If the config file cannot be created
/// - If the editor cannot be started or exits with an error
/// - If the edited file is no longer a valid config
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = CodecastConfig::ensure_file()?;

    let (program, args) = editor_command(
        std::env::var("VISUAL").ok().as_deref(),
        std::env::var("EDITOR").ok().as_deref(),
    );
    tracing::info!("Editing {} with {}", config_path.display(), program);

    let status = Command::new(&program)
        .args(&args)
        .arg(&config_path)
        .status()
        .map_err(|e| anyhow!("Could not start '{program}': {e}. Set $VISUAL or $EDITOR."))?;
    if !status.success() {
        return Err(anyhow!("'{program}' exited with {status}"));
    }

    check_config(&config_path)
}

/// Splits the first non-empty editor variable into program and arguments.
fn editor_command(visual: Option<&str>, editor: Option<&str>) -> (String, Vec<String>) {
    let command = [visual, editor]
        .into_iter()
        .flatten()
        .map(str::split_whitespace)
        .find_map(|mut words| words.next().map(|program| (program, words)));

    match command {
        Some((program, rest)) => (program.to_string(), rest.map(str::to_string).collect()),
        None => (FALLBACK_EDITOR.to_string(), Vec::new()),
    }
}

/// Re-reads the saved config and prints the settings codecast will use.
fn check_config(path: &Path) -> anyhow::Result<()> {
    let config = CodecastConfig::load_from(path)
        .map_err(|e| anyhow!("{e}\nRun `codecast config` again to fix it."))?;
    tracing::info!("Config at {} is valid", path.display());

    let audio = &config.audio;
    if audio.enabled {
        println!(
            "Audio: {} Hz from '{}', replayed on '{}'",
            audio.sample_rate, audio.input_device, audio.output_device
        );
    } else {
        println!("Audio: disabled");
    }
    println!("Replay frame: {}ms", config.frame_interval().as_millis());
    Ok(())
}
