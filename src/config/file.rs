//! Configuration file management for codecast.
//!
//! Loads and saves the TOML config in the user's config directory. A missing
//! file is created from the embedded default on first use.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/codecast.toml");

/// Audio capture and playback configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Record and replay audio at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Input device to record from. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `codecast list-devices`
    /// - device name from `codecast list-devices`
    #[serde(default = "default_device")]
    pub input_device: String,
    /// Output device used during replay, same format as `input_device`
    #[serde(default = "default_device")]
    pub output_device: String,
    /// Requested recording sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Length of each captured chunk in milliseconds
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_device: default_device(),
            output_device: default_device(),
            sample_rate: default_sample_rate(),
            chunk_interval_ms: default_chunk_interval_ms(),
        }
    }
}

impl AudioConfig {
    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms.max(1))
    }
}

/// Replay pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Time between frames in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_chunk_interval_ms() -> u64 {
    250
}

fn default_frame_interval_ms() -> u64 {
    16
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecastConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl CodecastConfig {
    /// Loads configuration from the user's config directory, writing the
    /// default file first if none exists.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::ensure_file()?)
    }

    /// Returns the config file path, writing the default file first if none
    /// exists. An existing file is left untouched, even if it is malformed.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the default file cannot be written
    pub fn ensure_file() -> anyhow::Result<PathBuf> {
        let config_path = config_path()?;
        if !config_path.exists() {
            write_default(&config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
        }
        Ok(config_path)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the TOML is malformed
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {e}", path.display()))?;
        let config: CodecastConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("Invalid config {}: {e}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Saves configuration to an explicit path, creating parent directories.
    ///
    /// # Errors
    /// - If the directory cannot be created
    /// - If the file cannot be written
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.playback.frame_interval_ms.max(1))
    }
}

/// Writes the embedded default config to `path`.
///
/// # Errors
/// - If the directory cannot be created
/// - If the file cannot be written
pub fn write_default(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}

/// Path of the config file, `~/.config/codecast/codecast.toml`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("codecast").join("codecast.toml"))
}
