//! Audio samples, playback and live analysis.
//!
//! This module provides:
//! - Sample discovery by file extension and decoding via Symphonia
//! - Looping playback on the default output device via cpal
//! - FFT band levels via RustFFT, volume, peak and beat detection

pub mod analysis;
pub mod fft;
pub mod loader;
pub mod player;

pub use analysis::{calculate_rms, AudioFeatures, FeatureExtractor, LevelTracker};
pub use fft::SpectrumAnalyzer;
pub use loader::{load_audio, AudioData, AudioError, SampleLibrary};
pub use player::{AudioOutput, Playback, PlaybackError};
