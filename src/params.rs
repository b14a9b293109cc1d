//! The user-adjustable state of a tone.
//! Every mutation goes through a setter that clamps (or rejects) the value,
//! so a [`ToneParameters`] is always safe to synthesize from.

use std::{fmt, ops::RangeInclusive};

use serde::Serialize;

use crate::{
    audio::tone::Waveform,
    error::{Result, ToneError},
};

/// Output sample rate used for everything: synthesis, playback and recording.
pub const SAMPLE_RATE: u32 = 44100;

pub const FREQUENCY_RANGE: RangeInclusive<i64> = 0..=3000;
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const DURATION_RANGE: RangeInclusive<f64> = 0.1..=10.0;

/// How far one nudge moves the frequency, in Hz.
pub const NUDGE_STEP: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToneParameters {
    frequency: u32,
    volume: f32,
    duration: f64,
    waveform: Waveform,
    sample_rate: u32,
}

impl ToneParameters {
    pub fn new() -> Self {
        Self {
            frequency: 440,
            volume: 0.5,
            duration: 1.0,
            waveform: Waveform::Sine,
            sample_rate: SAMPLE_RATE,
        }
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples a tone with these parameters is made of.
    pub fn sample_count(&self) -> usize {
        (self.sample_rate as f64 * self.duration).floor() as usize
    }

    /// Sets the frequency in Hz, clamped to [`FREQUENCY_RANGE`].
    /// Returns the value that was actually stored.
    pub fn set_frequency(&mut self, hz: i64) -> u32 {
        self.frequency = hz.clamp(*FREQUENCY_RANGE.start(), *FREQUENCY_RANGE.end()) as u32;
        self.frequency
    }

    /// Moves the frequency by `steps` nudges of [`NUDGE_STEP`] Hz.
    pub fn nudge_frequency(&mut self, steps: i64) -> u32 {
        let hz = (self.frequency as i64).saturating_add(steps.saturating_mul(NUDGE_STEP));
        self.set_frequency(hz)
    }

    /// Parses a manually entered frequency.
    /// Fractions are truncated toward zero before clamping.
    pub fn set_frequency_text(&mut self, text: &str) -> Result<u32> {
        let hz = parse_number(text).ok_or_else(|| ToneError::invalid("frequency", text))?;
        Ok(self.set_frequency(hz.trunc() as i64))
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<f32> {
        if volume.is_nan() {
            return Err(ToneError::invalid("volume", volume.to_string()));
        }

        self.volume = volume.clamp(*VOLUME_RANGE.start(), *VOLUME_RANGE.end());
        Ok(self.volume)
    }

    pub fn set_volume_text(&mut self, text: &str) -> Result<f32> {
        let volume = parse_number(text).ok_or_else(|| ToneError::invalid("volume", text))?;
        self.set_volume(volume as f32)
    }

    /// Sets the duration in seconds, clamped to [`DURATION_RANGE`].
    pub fn set_duration(&mut self, seconds: f64) -> Result<f64> {
        if seconds.is_nan() {
            return Err(ToneError::invalid("duration", seconds.to_string()));
        }

        self.duration = seconds.clamp(*DURATION_RANGE.start(), *DURATION_RANGE.end());
        Ok(self.duration)
    }

    pub fn set_duration_text(&mut self, text: &str) -> Result<f64> {
        let seconds = parse_number(text).ok_or_else(|| ToneError::invalid("duration", text))?;
        self.set_duration(seconds)
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn set_waveform_text(&mut self, text: &str) -> Result<Waveform> {
        let waveform = text
            .parse::<Waveform>()
            .map_err(|_| ToneError::invalid("waveform", text))?;
        self.set_waveform(waveform);
        Ok(waveform)
    }

    /// Checks that the parameters can be played.
    pub fn validate(&self) -> Result<()> {
        if !FREQUENCY_RANGE.contains(&(self.frequency as i64)) {
            return Err(ToneError::FrequencyOutOfRange(self.frequency as i64));
        }

        Ok(())
    }

    /// Skips clamping, for exercising the checks in [`Self::validate`].
    #[cfg(test)]
    pub fn unchecked_frequency(mut self, hz: u32) -> Self {
        self.frequency = hz;
        self
    }

    /// Human readable summary of the current tone.
    pub fn status_text(&self) -> String {
        self.to_string()
    }
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToneParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Current Tone: Frequency = {} Hz, Volume = {:.2}, Duration = {} s, Waveform = {}",
            self.frequency, self.volume, self.duration, self.waveform
        )
    }
}

/// Parses a finite number out of user input.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}
