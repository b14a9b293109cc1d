//! The surface a front end drives.
//! Holds the one [`ToneParameters`] of the session and the playback controller,
//! and funnels every user action through them.

use std::path::Path;

use tracing::{debug, warn};

use crate::{
    audio::{
        playback::{AudioOutput, PlaybackController, PlaybackState},
        tone::{self, ToneBuffer, Waveform},
    },
    error::Result,
    params::ToneParameters,
    record,
};

pub struct Session<O: AudioOutput> {
    params: ToneParameters,
    playback: PlaybackController<O>,
}

impl<O: AudioOutput> Session<O> {
    pub fn new(params: ToneParameters, output: O) -> Self {
        Self {
            params,
            playback: PlaybackController::new(output),
        }
    }

    pub fn params(&self) -> &ToneParameters {
        &self.params
    }

    pub fn set_frequency(&mut self, hz: i64) -> u32 {
        let out = self.params.set_frequency(hz);
        debug!("Frequency set to {out}Hz");
        out
    }

    /// Frequency from a text field. Bad input leaves the frequency as it was.
    pub fn set_frequency_text(&mut self, text: &str) -> Result<u32> {
        self.params.set_frequency_text(text).map_err(rejected)
    }

    /// Moves the frequency up (positive) or down (negative) by whole nudge steps.
    pub fn nudge_frequency(&mut self, steps: i64) -> u32 {
        let out = self.params.nudge_frequency(steps);
        debug!("Frequency nudged to {out}Hz");
        out
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<f32> {
        self.params.set_volume(volume).map_err(rejected)
    }

    pub fn set_volume_text(&mut self, text: &str) -> Result<f32> {
        self.params.set_volume_text(text).map_err(rejected)
    }

    pub fn set_duration(&mut self, seconds: f64) -> Result<f64> {
        self.params.set_duration(seconds).map_err(rejected)
    }

    pub fn set_duration_text(&mut self, text: &str) -> Result<f64> {
        self.params.set_duration_text(text).map_err(rejected)
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params.set_waveform(waveform);
    }

    pub fn set_waveform_text(&mut self, text: &str) -> Result<Waveform> {
        self.params.set_waveform_text(text).map_err(rejected)
    }

    /// Plays the current tone, cutting off anything already playing.
    pub fn play(&mut self) -> Result<()> {
        self.playback.play(&self.params)
    }

    pub fn stop(&mut self) -> bool {
        self.playback.stop()
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Renders the current tone and saves it to `path`.
    pub fn record(&self, path: impl AsRef<Path>) -> Result<()> {
        record::record(&self.buffer(), path)
    }

    /// A fresh rendering of the current tone, for previews.
    pub fn buffer(&self) -> ToneBuffer {
        tone::generate(&self.params)
    }

    pub fn status_text(&self) -> String {
        self.params.status_text()
    }

    pub fn playback(&self) -> &PlaybackController<O> {
        &self.playback
    }
}

fn rejected<E: std::fmt::Display>(err: E) -> E {
    warn!("{err}");
    err
}
