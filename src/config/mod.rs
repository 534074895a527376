//! Configuration management for codecast.
//!
//! Settings live in `~/.config/codecast/codecast.toml`; see [`CodecastConfig`].

pub mod file;

pub use file::{config_path, write_default, AudioConfig, CodecastConfig, PlaybackConfig};
