//! Plays rendered tones on an output device.
//!
//! The [`PlaybackController`] owns at most one live stream at a time.
//! Starting a new tone always halts the previous stream first, and halting
//! only returns once the device has stopped pulling samples.

use std::sync::Arc;

use cpal::{
    traits::{DeviceTrait, StreamTrait},
    Device, SampleFormat, Stream, StreamConfig,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::{
    devices::device_name,
    tone::{self, ToneBuffer},
};
use crate::{
    error::{Result, ToneError},
    params::ToneParameters,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Something that can play a [`ToneBuffer`] in the background.
pub trait AudioOutput {
    /// Starts playing the buffer and returns right away.
    fn start(&mut self, buffer: &ToneBuffer) -> Result<Box<dyn OutputStream>>;
}

/// Handle to a stream started by an [`AudioOutput`].
pub trait OutputStream {
    /// True once every sample has been played or the stream was halted.
    fn is_finished(&self) -> bool;
    /// Stops output immediately, dropping anything not played yet.
    /// The device is silent by the time this returns.
    fn halt(self: Box<Self>);
}

pub struct PlaybackController<O: AudioOutput> {
    output: O,
    stream: Option<Box<dyn OutputStream>>,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            stream: None,
        }
    }

    /// Renders a tone from `params` and plays it, replacing whatever is playing.
    /// If the parameters can't be played the current stream is left alone.
    pub fn play(&mut self, params: &ToneParameters) -> Result<()> {
        params.validate()?;
        let buffer = tone::generate(params);
        self.play_buffer(&buffer)
    }

    pub fn play_buffer(&mut self, buffer: &ToneBuffer) -> Result<()> {
        self.stop();

        let stream = self.output.start(buffer)?;
        info!(
            "Playing {} samples ({:.2}s)",
            buffer.len(),
            buffer.duration()
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Halts the current stream, if any.
    /// Returns true if something was actually playing.
    pub fn stop(&mut self) -> bool {
        let Some(stream) = self.stream.take() else {
            return false;
        };

        let was_playing = !stream.is_finished();
        stream.halt();
        if was_playing {
            info!("Playback stopped");
        }

        was_playing
    }

    pub fn state(&self) -> PlaybackState {
        match &self.stream {
            Some(stream) if !stream.is_finished() => PlaybackState::Playing,
            _ => PlaybackState::Idle,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

impl<O: AudioOutput> Drop for PlaybackController<O> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Plays tones through a cpal output device.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
}

impl CpalOutput {
    /// Opens `device` at a fixed sample rate with f32 samples.
    pub fn new(device: Device, sample_rate: u32) -> Result<Self> {
        let name = device_name(&device);
        let config = device
            .supported_output_configs()
            .map_err(ToneError::device)?
            .filter(|x| x.sample_format() == SampleFormat::F32)
            .filter(|x| (x.min_sample_rate().0..=x.max_sample_rate().0).contains(&sample_rate))
            .min_by_key(|x| x.channels())
            .ok_or_else(|| {
                ToneError::device(format!("`{name}` can't play f32 audio at {sample_rate}Hz"))
            })?
            .with_sample_rate(cpal::SampleRate(sample_rate));

        info!(
            "Output hooked into `{name}` ({}Hz, {} channel(s))",
            config.sample_rate().0,
            config.channels()
        );

        Ok(Self {
            device,
            config: config.into(),
        })
    }
}

impl AudioOutput for CpalOutput {
    fn start(&mut self, buffer: &ToneBuffer) -> Result<Box<dyn OutputStream>> {
        let playhead = Arc::new(Mutex::new(Playhead::new(buffer.samples().into())));
        let channels = self.config.channels as usize;

        let stream = {
            let playhead = playhead.clone();
            self.device
                .build_output_stream(
                    &self.config,
                    move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                        playhead.lock().fill(data, channels);
                    },
                    move |err| error!("Output stream error: {err}"),
                    None,
                )
                .map_err(ToneError::device)?
        };

        stream.play().map_err(ToneError::device)?;
        Ok(Box::new(CpalStream { stream, playhead }))
    }
}

struct CpalStream {
    stream: Stream,
    playhead: Arc<Mutex<Playhead>>,
}

impl OutputStream for CpalStream {
    fn is_finished(&self) -> bool {
        self.playhead.lock().is_finished()
    }

    fn halt(self: Box<Self>) {
        let this = *self;

        // Silence the callback first in case the backend keeps calling it until the drop
        this.playhead.lock().halted = true;
        if let Err(err) = this.stream.pause() {
            warn!("Failed to pause output stream: {err}");
        }

        drop(this.stream);
        debug!("Output stream closed");
    }
}

/// Read position into the samples of a playing stream.
struct Playhead {
    samples: Arc<[f32]>,
    position: usize,
    halted: bool,
    /// Set by the first device request after the last sample was handed out,
    /// at which point the device has taken the whole tail.
    drained: bool,
}

impl Playhead {
    fn new(samples: Arc<[f32]>) -> Self {
        Self {
            samples,
            position: 0,
            halted: false,
            drained: false,
        }
    }

    /// Writes the next frames into an interleaved device buffer.
    /// Every channel of a frame gets the same sample, silence once out of samples.
    fn fill(&mut self, data: &mut [f32], channels: usize) {
        if self.position >= self.samples.len() {
            self.drained = true;
        }

        let mut last = 0.0;
        for (i, e) in data.iter_mut().enumerate() {
            if i % channels == 0 {
                last = self.next().unwrap_or(0.0);
            }

            *e = last;
        }
    }

    fn is_finished(&self) -> bool {
        self.halted || self.drained
    }
}

impl Iterator for Playhead {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }

        let out = *self.samples.get(self.position)?;
        self.position += 1;
        Some(out)
    }
}


#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::{fake::FakeOutput, PlaybackController, PlaybackState, Playhead};
    use crate::{audio::tone::Waveform, error::ToneError, params::ToneParameters};

    #[test]
    fn test_play_then_stop() {
        let mut ctrl = PlaybackController::new(FakeOutput::default());
        assert_eq!(ctrl.state(), PlaybackState::Idle);

        ctrl.play(&ToneParameters::new()).unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Playing);
        assert_eq!(ctrl.output().live(), 1);

        assert!(ctrl.stop());
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert_eq!(ctrl.output().live(), 0);

        // Stopping while idle does nothing
        assert!(!ctrl.stop());
        assert_eq!(ctrl.output().live(), 0);
    }

    #[test]
    fn test_replay_keeps_one_stream() {
        let mut ctrl = PlaybackController::new(FakeOutput::default());
        let mut params = ToneParameters::new();
        ctrl.play(&params).unwrap();

        params.set_frequency(1000);
        params.set_waveform(Waveform::Square);
        ctrl.play(&params).unwrap();

        assert_eq!(ctrl.output().live(), 1);
        assert_eq!(ctrl.state(), PlaybackState::Playing);

        let started = ctrl.output().started.lock();
        assert_eq!(started.len(), 2);
        assert_eq!(started[1], crate::audio::tone::generate(&params));
    }

    #[test]
    fn test_parameter_change_needs_replay() {
        let mut ctrl = PlaybackController::new(FakeOutput::default());
        let mut params = ToneParameters::new();
        ctrl.play(&params).unwrap();

        params.set_volume(0.1).unwrap();
        let original = crate::audio::tone::generate(&ToneParameters::new());
        let started = ctrl.output().started.lock();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0], original);
    }

    #[test]
    fn test_rejected_play_keeps_stream() {
        let mut ctrl = PlaybackController::new(FakeOutput::default());
        ctrl.play(&ToneParameters::new()).unwrap();

        let bad = ToneParameters::new().unchecked_frequency(4000);
        assert!(matches!(
            ctrl.play(&bad),
            Err(ToneError::FrequencyOutOfRange(4000))
        ));
        assert_eq!(ctrl.state(), PlaybackState::Playing);
        assert_eq!(ctrl.output().live(), 1);
        assert_eq!(ctrl.output().started.lock().len(), 1);
    }

    #[test]
    fn test_device_unavailable() {
        let output = FakeOutput {
            unavailable: true,
            ..Default::default()
        };
        let mut ctrl = PlaybackController::new(output);

        assert!(matches!(
            ctrl.play(&ToneParameters::new()),
            Err(ToneError::DeviceUnavailable(_))
        ));
        assert_eq!(ctrl.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_natural_finish_is_idle() {
        let mut ctrl = PlaybackController::new(FakeOutput::default());
        ctrl.play(&ToneParameters::new()).unwrap();
        ctrl.output().finish_last();
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert!(!ctrl.stop());
        assert_eq!(ctrl.output().live(), 0);
    }

    #[test]
    fn test_drop_halts() {
        let output = FakeOutput::default();
        {
            let mut ctrl = PlaybackController::new(output.clone());
            ctrl.play(&ToneParameters::new()).unwrap();
            assert_eq!(output.live(), 1);
        }
        assert_eq!(output.live(), 0);
    }

    #[test]
    fn test_playhead() {
        let mut head = Playhead::new(Arc::from(vec![0.1, 0.2, 0.3]));
        assert_eq!(head.next(), Some(0.1));
        assert!(!head.is_finished());

        head.halted = true;
        assert_eq!(head.next(), None);
        assert!(head.is_finished());

        let mut head = Playhead::new(Arc::from(vec![0.5]));
        assert_eq!(head.by_ref().collect::<Vec<_>>(), vec![0.5]);
        assert!(!head.is_finished());
    }

    #[test]
    fn test_playhead_fill_waits_for_tail() {
        let mut head = Playhead::new(Arc::from(vec![0.1, 0.2, 0.3]));
        let mut period = [9.0; 4];

        head.fill(&mut period, 2);
        assert_eq!(period, [0.1, 0.1, 0.2, 0.2]);
        assert!(!head.is_finished());

        // The last sample goes out in this period, padded with silence
        head.fill(&mut period, 2);
        assert_eq!(period, [0.3, 0.3, 0.0, 0.0]);
        assert!(!head.is_finished());

        // Only the next request shows the device took the tail
        head.fill(&mut period, 2);
        assert_eq!(period, [0.0; 4]);
        assert!(head.is_finished());
    }
}
