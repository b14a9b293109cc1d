//! Audio utilities.
//! Tone synthesis, output device selection and playback.

pub mod devices;
pub mod playback;
pub mod tone;
