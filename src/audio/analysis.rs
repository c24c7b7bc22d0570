//! Live audio features: band levels, volume, peak and beat.
//!
//! Computed once per frame from the most recent playback window.

use super::fft::SpectrumAnalyzer;

/// Gain applied to RMS to get a 0.0..=1.0 volume.
const VOLUME_GAIN: f32 = 3.0;

/// Per-frame peak decay factor.
const PEAK_DECAY: f32 = 0.95;

/// Audio features for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFeatures {
    /// Band levels in 0.0..=1.0, lowest frequency first.
    pub bands: Vec<f32>,
    /// Volume in 0.0..=1.0.
    pub volume: f32,
    /// Decaying peak volume.
    pub peak: f32,
    /// Whether this frame's volume jumped enough to count as a beat.
    pub beat: bool,
}

/// Calculate RMS (Root Mean Square) energy of audio samples.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Volume follower with decaying peak and ratio-based beat detection.
#[derive(Debug, Clone, Copy)]
pub struct LevelTracker {
    volume: f32,
    peak: f32,
    beat: bool,
    /// A beat needs `volume > previous * ratio`.
    ratio: f32,
    /// A beat needs `volume > floor`.
    floor: f32,
}

impl Default for LevelTracker {
    fn default() -> Self {
        Self::new(1.2, 0.3)
    }
}

impl LevelTracker {
    pub fn new(ratio: f32, floor: f32) -> Self {
        Self {
            volume: 0.0,
            peak: 0.0,
            beat: false,
            ratio,
            floor,
        }
    }

    /// Feed the next volume reading.
    pub fn update(&mut self, volume: f32) {
        let previous = self.volume;
        self.volume = volume;
        self.peak = (self.peak * PEAK_DECAY).max(volume);
        self.beat = volume > previous * self.ratio && volume > self.floor;
    }

    /// Forget history, e.g. when playback restarts.
    pub fn reset(&mut self) {
        self.volume = 0.0;
        self.peak = 0.0;
        self.beat = false;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn beat(&self) -> bool {
        self.beat
    }
}

/// Turns sample windows into [`AudioFeatures`].
pub struct FeatureExtractor {
    analyzer: SpectrumAnalyzer,
    tracker: LevelTracker,
    num_bands: usize,
}

impl FeatureExtractor {
    pub fn new(fft_size: usize, num_bands: usize) -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(fft_size),
            tracker: LevelTracker::default(),
            num_bands,
        }
    }

    /// Window length callers should provide.
    pub fn window_len(&self) -> usize {
        self.analyzer.fft_size()
    }

    /// Analyze one mono window.
    pub fn process(&mut self, window: &[f32]) -> AudioFeatures {
        let bands = self.analyzer.band_levels(window, self.num_bands);
        let volume = (calculate_rms(window) * VOLUME_GAIN).min(1.0);
        self.tracker.update(volume);

        AudioFeatures {
            bands,
            volume,
            peak: self.tracker.peak(),
            beat: self.tracker.beat(),
        }
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}
