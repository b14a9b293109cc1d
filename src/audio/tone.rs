use std::{f64::consts::PI, fmt, str::FromStr};

use clap::ValueEnum;
use serde::Serialize;

use crate::params::ToneParameters;

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }

    /// Value of one period of the waveform at `phase` (in `[0, 1)`), without gain.
    ///
    /// The square wave is +1 for the whole first half period, including the
    /// zero crossing at phase 0, and -1 for the second half.
    fn at(&self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square if phase < 0.5 => 1.0,
            Waveform::Square => -1.0,
            Waveform::Triangle if phase < 0.5 => 4.0 * phase - 1.0,
            Waveform::Triangle => 3.0 - 4.0 * phase,
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Waveform::ALL
            .into_iter()
            .find(|x| x.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown waveform `{s}`"))
    }
}

/// Sample-by-sample generator for a finite tone.
///
/// The phase of sample `i` is worked out as `(frequency * i) mod sample_rate`
/// in integers, so it never drifts and identical inputs give identical samples.
#[derive(Clone, Copy, Debug)]
pub struct Tone {
    i: usize,
    len: usize,
    frequency: u32,
    sample_rate: u32,
    volume: f32,
    waveform: Waveform,
}

impl Tone {
    pub fn new(params: &ToneParameters) -> Self {
        Self {
            i: 0,
            len: params.sample_count(),
            frequency: params.frequency(),
            sample_rate: params.sample_rate(),
            volume: params.volume(),
            waveform: params.waveform(),
        }
    }

    fn phase(&self) -> f64 {
        let cycles = self.frequency as u64 * self.i as u64;
        (cycles % self.sample_rate as u64) as f64 / self.sample_rate as f64
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.i >= self.len {
            return None;
        }

        // A 0 Hz tone is DC. Only the square wave has a non-zero value there.
        let raw = match self.waveform {
            Waveform::Square => self.waveform.at(self.phase()),
            _ if self.frequency == 0 => 0.0,
            _ => self.waveform.at(self.phase()),
        };

        self.i += 1;
        Some((self.volume as f64 * raw) as f32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len.saturating_sub(self.i);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Tone {}

/// A fully rendered tone.
/// Never modified once made, a parameter change means rendering a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct ToneBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl ToneBuffer {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of the buffer in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Time in seconds of each sample.
    pub fn time_axis(&self) -> impl Iterator<Item = f64> + '_ {
        let sr = self.sample_rate as f64;
        (0..self.samples.len()).map(move |i| i as f64 / sr)
    }

    /// The first `count` samples paired with their time, for plotting.
    pub fn preview(&self, count: usize) -> Vec<(f64, f32)> {
        self.time_axis()
            .zip(self.samples.iter().copied())
            .take(count)
            .collect()
    }
}

/// Renders a whole tone from the given parameters.
pub fn generate(params: &ToneParameters) -> ToneBuffer {
    ToneBuffer {
        samples: Tone::new(params).collect(),
        sample_rate: params.sample_rate(),
    }
}
