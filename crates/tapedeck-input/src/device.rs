//! Input device enumeration.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait};

/// Input device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    /// Device index
    pub index: usize,
    /// Device name
    pub name: String,
    /// Number of input channels
    pub channels: u16,
    /// Supported sample rates
    pub sample_rates: Vec<u32>,
}

impl InputDeviceInfo {
    fn from_device(index: usize, device: &cpal::Device) -> Self {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let (channels, sample_rates) = match device.default_input_config() {
            Ok(config) => (config.channels(), vec![config.sample_rate().0]),
            Err(_) => (0, Vec::new()),
        };

        Self {
            index,
            name,
            channels,
            sample_rates,
        }
    }
}

/// Enumerate input devices on the default host.
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>> {
    Ok(cpal::default_host()
        .input_devices()?
        .enumerate()
        .map(|(index, device)| InputDeviceInfo::from_device(index, &device))
        .collect())
}

/// Resolve a device index, or the host default when `None`.
pub(crate) fn get_device(index: Option<usize>) -> Result<(usize, cpal::Device)> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.input_devices()?.collect();
            let count = devices.len();
            devices
                .into_iter()
                .nth(i)
                .map(|device| (i, device))
                .ok_or_else(|| {
                    Error::DeviceNotFound(format!(
                        "Device index {i} out of range ({count} available)"
                    ))
                })
        }
        None => host
            .default_input_device()
            .map(|device| (0, device))
            .ok_or_else(|| Error::DeviceNotFound("No input device available".into())),
    }
}
