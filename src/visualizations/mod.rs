//! Visualization system.
//!
//! Provides the selectable visual effects:
//! - ImageDisplay: Centered image with periodic color inversion
//! - AudioWave: Spectrum bars driven by a looping sample
//! - CircleWave: Ring of points with a travelling radial wave
//! - SineWave: Glowing sine line
//! - StressTest: Connected, glowing bouncing particles
//! - MidiLines: Crosshair positioned by two CC controls
//! - ALife: Conway's Game of Life with CC-controlled grid
//!
//! Visualizations are a closed, compiled-in set. Each is keyed by a stable
//! string so samples and images can be matched to it by file stem.

pub mod canvas;
pub mod registry;

mod a_life;
mod audio_wave;
mod circle_wave;
mod image_display;
mod midi_lines;
mod sine_wave;
mod stress_test;

pub use a_life::{ALife, LifeGrid};
pub use audio_wave::AudioWave;
pub use canvas::{rgb, rgba, Canvas, Color, Point};
pub use circle_wave::CircleWave;
pub use image_display::ImageDisplay;
pub use midi_lines::MidiLines;
pub use registry::{build_registry, RegistryError, Switcher};
pub use sine_wave::SineWave;
pub use stress_test::StressTest;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::audio::{AudioError, Playback, SampleLibrary};
use crate::midi::MidiRouter;

/// Errors a visualization can raise from `setup`, `update` or `draw`.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("{0}")]
    Other(String),
}

/// What a visualization receives on activation.
///
/// The MIDI and audio handles are optional; a visualization must fall back
/// to defaults when they are absent.
#[derive(Clone)]
pub struct SynthContext {
    pub width: u32,
    pub height: u32,
    pub midi: Option<Arc<MidiRouter>>,
    pub audio: Option<Arc<Playback>>,
    pub samples: Arc<SampleLibrary>,
    pub images_dir: PathBuf,
}

impl SynthContext {
    /// Context with no MIDI, no audio and no assets.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            midi: None,
            audio: None,
            samples: Arc::new(SampleLibrary::default()),
            images_dir: PathBuf::from("assets/images"),
        }
    }

    pub fn with_midi(mut self, midi: Arc<MidiRouter>) -> Self {
        self.midi = Some(midi);
        self
    }

    pub fn with_audio(mut self, audio: Arc<Playback>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_samples(mut self, samples: SampleLibrary) -> Self {
        self.samples = Arc::new(samples);
        self
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = dir.into();
        self
    }

    /// Read a CC value, or `default` without a router.
    pub fn cc(&self, cc: u8, default: u8) -> u8 {
        self.midi
            .as_ref()
            .map_or(default, |midi| midi.get_cc(cc, default))
    }
}

/// A selectable visual effect.
pub trait Visualization: Send {
    /// Display name.
    fn name(&self) -> &str;

    /// Called once, the first time the visualization becomes active.
    fn setup(&mut self, _ctx: &SynthContext) -> Result<(), VisualizationError> {
        Ok(())
    }

    /// Advance animation state by `dt` seconds.
    fn update(&mut self, dt: f32) -> Result<(), VisualizationError>;

    /// Render into the canvas. Returns whether anything was drawn.
    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError>;

    /// Whether the main loop clears the canvas to black before `draw`.
    /// Returning `false` keeps the previous frame's pixels.
    fn clears_each_frame(&self) -> bool {
        true
    }
}

/// Available visualization types, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizationKind {
    ImageDisplay,
    AudioWave,
    CircleWave,
    SineWave,
    StressTest,
    MidiLines,
    ALife,
}

impl VisualizationKind {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "0_image_display" | "image-display" | "image" => Some(Self::ImageDisplay),
            "1_audio_wave" | "audio-wave" | "audio" => Some(Self::AudioWave),
            "2_circle_wave" | "circle-wave" | "circle" => Some(Self::CircleWave),
            "3_sine_wave" | "sine-wave" | "sine" => Some(Self::SineWave),
            "4_stress_test" | "stress-test" | "stress" => Some(Self::StressTest),
            "5_midi_test" | "midi-lines" | "midi" => Some(Self::MidiLines),
            "6_a_life" | "a-life" | "life" => Some(Self::ALife),
            _ => None,
        }
    }

    /// Stable key; also the file stem of matching samples and images.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ImageDisplay => "0_image_display",
            Self::AudioWave => "1_audio_wave",
            Self::CircleWave => "2_circle_wave",
            Self::SineWave => "3_sine_wave",
            Self::StressTest => "4_stress_test",
            Self::MidiLines => "5_midi_test",
            Self::ALife => "6_a_life",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ImageDisplay => "Image Display",
            Self::AudioWave => "Audio Waveform",
            Self::CircleWave => "Circle Wave",
            Self::SineWave => "Sine Wave",
            Self::StressTest => "Stress Test",
            Self::MidiLines => "MIDI Lines",
            Self::ALife => "A-Life Simulation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ImageDisplay => "Centered image, colors invert periodically",
            Self::AudioWave => "Spectrum bars and volume meter from a looping sample",
            Self::CircleWave => "Ring of points with a travelling radial wave",
            Self::SineWave => "Glowing sine line",
            Self::StressTest => "Connected glowing particles bouncing off the edges",
            Self::MidiLines => "Crosshair positioned by CC21 and CC22",
            Self::ALife => "Game of Life with CC-controlled grid, speed and color",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::ImageDisplay,
            Self::AudioWave,
            Self::CircleWave,
            Self::SineWave,
            Self::StressTest,
            Self::MidiLines,
            Self::ALife,
        ]
    }

    /// Create a fresh instance.
    pub fn create(&self) -> Box<dyn Visualization> {
        match self {
            Self::ImageDisplay => Box::new(ImageDisplay::new(self.key())),
            Self::AudioWave => Box::new(AudioWave::new(self.key())),
            Self::CircleWave => Box::new(CircleWave::new()),
            Self::SineWave => Box::new(SineWave::new()),
            Self::StressTest => Box::new(StressTest::new()),
            Self::MidiLines => Box::new(MidiLines::new()),
            Self::ALife => Box::new(ALife::new()),
        }
    }
}
