//! Command-line parsing and command routing.

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::commands;
use codecast::logging;

/// Record and replay code editing sessions with synchronized audio
#[derive(Parser)]
#[command(name = "codecast")]
#[command(version)]
#[command(
    long_about = "Record and replay code editing sessions with synchronized audio.\n\nDEFAULT COMMAND:\n    If no command is specified, 'demo' is used by default.\n\nEXAMPLES:\n    # Record a scripted session and replay it with audio\n    $ codecast\n\n    # Same, without touching audio devices\n    $ codecast demo --no-audio\n\n    # Pick devices for codecast.toml\n    $ codecast list-devices"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/codecast/codecast.toml\n    Logs:               ~/.local/state/codecast/codecast.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a scripted editing session and replay it (default)
    ///
    /// Types a short program into an in-memory editor while recording the
    /// microphone, then replays the session into a fresh editor with the
    /// audio. Press Ctrl-C to stop playback early.
    #[command(visible_alias = "d")]
    Demo {
        /// Skip audio capture and playback
        #[arg(long)]
        no_audio: bool,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input and output devices
    ///
    /// Shows device IDs and names for the input_device and output_device
    /// settings in codecast.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   codecast completions bash > codecast.bash
    ///   codecast completions zsh > _codecast
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If the config cannot be loaded
/// - If command execution fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "codecast", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;
    tracing::debug!("codecast {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None => commands::handle_demo(false).await?,
        Some(Commands::Demo { no_audio }) => commands::handle_demo(no_audio).await?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
