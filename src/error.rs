//! Errors that can come out of the tone core.
//! None of these are fatal, every caller is expected to report them and carry on.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToneError>;

#[derive(Error, Debug)]
pub enum ToneError {
    /// Unparsable or non-finite input for a parameter.
    /// The previous value of the parameter is kept.
    #[error("Invalid value for {name}: `{value}`")]
    InvalidParameter { name: &'static str, value: String },
    #[error("Frequency must be between 0 and 3000 Hz (got {0} Hz)")]
    FrequencyOutOfRange(i64),
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Failed to write `{}`: {source}", .path.display())]
    FileWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ToneError {
    pub fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    pub fn device(err: impl ToString) -> Self {
        Self::DeviceUnavailable(err.to_string())
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWriteFailure {
            path: path.into(),
            source,
        }
    }
}
