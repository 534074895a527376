//! Command handlers for the codecast binary.
//!
//! # Commands
//! - `demo`: Record a scripted session and replay it
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input and output devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod demo;
pub mod list_devices;
pub mod logs;

pub use config::handle_config;
pub use demo::handle_demo;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
