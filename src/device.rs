//! Audio device lookup shared by capture, playback and `list-devices`.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::AudioError;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Which side of the host a device is looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Input,
    Output,
}

impl DeviceKind {
    fn label(self) -> &'static str {
        match self {
            DeviceKind::Input => "input",
            DeviceKind::Output => "output",
        }
    }
}

/// Resolves a device by name, index or "default".
///
/// # Arguments
/// * `kind` - Input (microphone) or output (speaker) side
/// * `device_spec` - "default", a numeric index (0, 1, 2, ...) or a device name
///
/// # Errors
/// - If no default device exists
/// - If the index is out of range or no device has the given name
pub fn find_device(kind: DeviceKind, device_spec: &str) -> Result<cpal::Device, AudioError> {
    suppress_alsa_warnings(|| {
        let host = cpal::default_host();

        if device_spec == "default" {
            let device = match kind {
                DeviceKind::Input => host.default_input_device(),
                DeviceKind::Output => host.default_output_device(),
            };
            return device.ok_or(AudioError::NoDevice(kind.label()));
        }

        let devices: Vec<cpal::Device> = list_devices(&host, kind)?;

        if let Ok(index) = device_spec.parse::<usize>() {
            return devices
                .into_iter()
                .nth(index)
                .ok_or_else(|| AudioError::DeviceNotFound(device_spec.to_string()));
        }

        devices
            .into_iter()
            .find(|device| device.name().map(|name| name == device_spec).unwrap_or(false))
            .ok_or_else(|| AudioError::DeviceNotFound(device_spec.to_string()))
    })
}

/// Enumerates devices of one kind, skipping any whose name cannot be queried.
pub fn list_devices(host: &cpal::Host, kind: DeviceKind) -> Result<Vec<cpal::Device>, AudioError> {
    let devices = match kind {
        DeviceKind::Input => host.input_devices(),
        DeviceKind::Output => host.output_devices(),
    }
    .map_err(|e| AudioError::Stream(format!("Failed to enumerate devices: {e}")))?;

    Ok(devices.filter(|device| device.name().is_ok()).collect())
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// If the redirect itself fails, `f` still runs with stderr untouched.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    let dev_null = match OpenOptions::new().write(true).open("/dev/null") {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("Failed to open /dev/null: {}", e);
            return f();
        }
    };

    // Save the current stderr file descriptor
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }

    let redirect_result = unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    // Restore the original stderr
    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
