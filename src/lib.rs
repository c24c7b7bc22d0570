//! Impact Synth
//!
//! Real-time video synthesizer driven by MIDI Control-Change input and audio
//! playback, with a GPU scanline pass over every frame.
//!
//! # Features
//!
//! - Switchable visualizations drawing into a CPU canvas
//! - MIDI CC routing with per-controller callbacks via midir
//! - WAV sample playback via Symphonia and cpal, FFT bands via RustFFT
//! - WGSL post-processing via wgpu, validated with naga at startup
//! - Fullscreen or windowed output via winit

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod gpu;
pub mod midi;
pub mod visualizations;

// Re-export commonly used types
pub use app::{run, App, StartupError};
pub use audio::{load_audio, AudioData, AudioFeatures, FeatureExtractor, Playback, SampleLibrary};
pub use config::{ConfigError, StepMode, SynthConfig};
pub use gpu::{GpuContext, OffscreenRenderer, ScanlinePass};
pub use midi::{scale_cc, MidiRouter};
pub use visualizations::{
    build_registry, Canvas, Switcher, SynthContext, Visualization, VisualizationError,
    VisualizationKind,
};
