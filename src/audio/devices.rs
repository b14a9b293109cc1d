//! Picks the output device tones are played on.

use cpal::{
    traits::{DeviceTrait, HostTrait},
    Device,
};
use tracing::debug;

use crate::{
    error::{Result, ToneError},
    misc::Similarity,
};

/// Finds the output device to use.
/// `default` (any case) picks the host default, any other name picks the device
/// whose name has the highest string similarity (dice coefficient) to it.
pub fn output_device(wanted: &str) -> Result<Device> {
    let host = cpal::default_host();
    let wanted = wanted.to_lowercase();

    if wanted == "default" {
        return host
            .default_output_device()
            .ok_or_else(|| ToneError::device("No default output device"));
    }

    let (score, device) = host
        .output_devices()
        .map_err(ToneError::device)?
        .map(|x| (device_name(&x).to_lowercase().similarity(&wanted), x))
        .reduce(|a, b| if a.0 >= b.0 { a } else { b })
        .ok_or_else(|| ToneError::device("No output device found"))?;

    debug!("Matched `{wanted}` to `{}` ({score:.2})", device_name(&device));
    Ok(device)
}

/// Names of every output device on the default host.
pub fn output_device_names() -> Result<Vec<String>> {
    let host = cpal::default_host();
    Ok(host
        .output_devices()
        .map_err(ToneError::device)?
        .map(|x| device_name(&x))
        .collect())
}

pub fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "<unknown>".to_owned())
}
