//! Saves tones as 16 bit mono WAV files.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter},
    path::{Path, PathBuf},
    process,
};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{info, warn};

use crate::{
    audio::tone::ToneBuffer,
    error::{Result, ToneError},
};

pub const DEFAULT_PATH: &str = "tone.wav";

/// Writes `buffer` to `path` as a mono 16 bit PCM WAV file.
///
/// The samples go to a scratch file next to `path` which is only renamed over
/// `path` once it was fully written, so a failed recording never leaves a
/// truncated file behind or clobbers an older recording.
pub fn record(buffer: &ToneBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let scratch = scratch_path(path);

    if let Err(err) = write_wav(buffer, &scratch).and_then(|_| fs::rename(&scratch, path)) {
        if scratch.exists() {
            if let Err(err) = fs::remove_file(&scratch) {
                warn!("Failed to clean up `{}`: {err}", scratch.display());
            }
        }

        return Err(ToneError::write(path, err));
    }

    info!("Tone recorded to `{}`", path.display());
    Ok(())
}

/// Converts a sample in [-1, 1] to a 16 bit integer, saturating anything outside.
pub fn quantize(sample: f32) -> i16 {
    (sample * i16::MAX as f32)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn write_wav(buffer: &ToneBuffer, path: &Path) -> io::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut writer = WavWriter::new(BufWriter::new(file), spec).map_err(hound_to_io)?;
    let mut samples = writer.get_i16_writer(buffer.len() as u32);
    for &sample in buffer.samples() {
        samples.write_sample(quantize(sample));
    }

    samples.flush().map_err(hound_to_io)?;
    writer.finalize().map_err(hound_to_io)?;

    File::open(path)?.sync_all()
}

fn scratch_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_PATH.to_owned());
    path.with_file_name(format!(".{name}.{}.partial", process::id()))
}

fn hound_to_io(err: hound::Error) -> io::Error {
    match err {
        hound::Error::IoError(err) => err,
        err => io::Error::new(io::ErrorKind::Other, err),
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use hound::{SampleFormat, WavReader};

    use super::{quantize, record};
    use crate::{
        audio::tone::{generate, Waveform},
        error::ToneError,
        params::{ToneParameters, SAMPLE_RATE},
    };

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32767);
        assert_eq!(quantize(0.5), 16384);
        assert_eq!(quantize(1.5), 32767);
        assert_eq!(quantize(-3.0), -32768);
    }

    #[test]
    fn test_record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let mut params = ToneParameters::new();
        params.set_waveform(Waveform::Triangle);
        params.set_volume(0.9).unwrap();
        params.set_duration(0.25).unwrap();
        let buffer = generate(&params);
        record(&buffer, &path).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);

        let decoded = reader
            .samples::<i16>()
            .map(|x| x.unwrap() as f32 / 32767.0)
            .collect::<Vec<_>>();
        assert_eq!(decoded.len(), buffer.len());
        for (a, b) in decoded.iter().zip(buffer.samples()) {
            assert!((a - b).abs() <= 1.0 / 32767.0);
        }

        // Only the finished file is left in the directory
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_record_replaces_old_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        fs::write(&path, b"old").unwrap();

        let buffer = generate(&ToneParameters::new());
        record(&buffer, &path).unwrap();
        assert_eq!(WavReader::open(&path).unwrap().len() as usize, buffer.len());
    }

    #[test]
    fn test_record_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = generate(&ToneParameters::new());

        let missing = dir.path().join("missing").join("tone.wav");
        assert!(matches!(
            record(&buffer, &missing),
            Err(ToneError::FileWriteFailure { .. })
        ));

        // Renaming over a directory fails after the samples were written
        let taken = dir.path().join("taken");
        fs::create_dir(&taken).unwrap();
        fs::write(taken.join("keep"), b"keep").unwrap();
        assert!(matches!(
            record(&buffer, &taken),
            Err(ToneError::FileWriteFailure { .. })
        ));
        assert!(taken.join("keep").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
