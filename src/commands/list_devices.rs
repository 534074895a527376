//! List available audio input and output devices.

use cpal::traits::{DeviceTrait, HostTrait};

use codecast::device::{list_devices, suppress_alsa_warnings, DeviceKind};

/// Prints every input and output device with its index, name and default
/// configuration.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();

    print_devices(&host, DeviceKind::Input)?;
    print_devices(&host, DeviceKind::Output)?;
    Ok(())
}

fn print_devices(host: &cpal::Host, kind: DeviceKind) -> anyhow::Result<()> {
    let (devices, default_name) = suppress_alsa_warnings(|| {
        let devices = list_devices(host, kind)?;
        let default_device = match kind {
            DeviceKind::Input => host.default_input_device(),
            DeviceKind::Output => host.default_output_device(),
        };
        let default_name = default_device.and_then(|device| device.name().ok());
        Ok::<_, codecast::AudioError>((devices, default_name))
    })?;

    let label = match kind {
        DeviceKind::Input => "input",
        DeviceKind::Output => "output",
    };

    println!();
    if devices.is_empty() {
        println!("No audio {label} devices found on this system.");
        return Ok(());
    }
    println!("Available audio {label} devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_indicator = if default_name.as_ref() == Some(&device_name) {
            " [DEFAULT]"
        } else {
            ""
        };

        let config = suppress_alsa_warnings(|| match kind {
            DeviceKind::Input => device.default_input_config(),
            DeviceKind::Output => device.default_output_config(),
        });
        let config_info = match config {
            Ok(config) => format!(
                " ({}Hz, {} channels)",
                config.sample_rate().0,
                config.channels()
            ),
            Err(_) => " (configuration unavailable)".to_string(),
        };

        println!("  ID: {}", index);
        println!("    Name: {}{}", device_name, default_indicator);
        println!("    Config:{}", config_info);
        println!();
    }

    Ok(())
}
