use cpal::traits::{DeviceTrait, HostTrait};

use crate::media::MediaError;

/// Default input device as reported by the host audio API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicrophoneInfo {
    pub name: String,
    pub sample_rate_hz: u32,
    pub channels: u16,
}

/// Looks up the default microphone and its preferred input format.
///
/// # Errors
/// `NotFound` without an input device, `Device` if its format cannot be read.
pub fn probe_default_microphone() -> Result<MicrophoneInfo, MediaError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| MediaError::NotFound("microphone".into()))?;
    let name = device.name().unwrap_or_else(|_| "Default Microphone".into());
    let config = device
        .default_input_config()
        .map_err(|e| MediaError::Device(format!("input format for {name}: {e}")))?;
    Ok(MicrophoneInfo {
        name,
        sample_rate_hz: config.sample_rate().0,
        channels: config.channels(),
    })
}
