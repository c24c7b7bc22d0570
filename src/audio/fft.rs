//! FFT spectrum analysis using RustFFT.
//!
//! Provides real-time spectrum analysis for audio-reactive visualizations.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Bins skipped at the bottom of the spectrum (DC and near-DC).
const SKIPPED_BINS: usize = 2;

/// Gain applied to averaged band magnitudes before clamping to 1.0.
const BAND_GAIN: f32 = 5.0;

/// Spectrum analyzer for audio data.
///
/// Uses FFT to convert time-domain audio samples to frequency-domain
/// magnitude spectrum suitable for visualization. The FFT plan and buffers
/// are allocated once and reused every frame.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create a new spectrum analyzer with the given FFT size.
    ///
    /// Common FFT sizes: 512, 1024, 2048, 4096
    pub fn new(fft_size: usize) -> Self {
        assert!(fft_size.is_power_of_two(), "FFT size must be a power of 2");

        // Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        Self {
            fft,
            fft_size,
            window,
            buffer: vec![Complex::default(); fft_size],
            scratch,
            magnitudes: vec![0.0; fft_size / 2],
        }
    }

    /// FFT size being used.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins in the output (FFT size / 2).
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Compute magnitude spectrum from the first `fft_size` samples.
    ///
    /// Shorter input is zero-padded. The returned slice has length
    /// `fft_size / 2` and stays valid until the next call.
    pub fn analyze(&mut self, samples: &[f32]) -> &[f32] {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = (self.fft_size as f32).sqrt();
        for (mag, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = c.norm() / norm;
        }
        &self.magnitudes
    }

    /// Get the frequency in Hz for a given bin index.
    pub fn bin_to_freq(&self, bin: usize, sample_rate: u32) -> f32 {
        bin as f32 * sample_rate as f32 / self.fft_size as f32
    }

    /// Get the bin index for a given frequency in Hz.
    pub fn freq_to_bin(&self, freq: f32, sample_rate: u32) -> usize {
        (freq * self.fft_size as f32 / sample_rate as f32).round() as usize
    }

    /// Compute `num_bands` band levels in 0.0..=1.0.
    ///
    /// Bands are spaced on a `2^x` curve over the spectrum (after dropping
    /// the lowest bins), averaged, then scaled and clamped. Levels are not
    /// normalized against each other, so quiet input gives low bars.
    pub fn band_levels(&mut self, samples: &[f32], num_bands: usize) -> Vec<f32> {
        if num_bands == 0 {
            return Vec::new();
        }
        let spectrum = &self.analyze(samples)[SKIPPED_BINS..];
        let span = spectrum.len().saturating_sub(1) as f32;

        (0..num_bands)
            .map(|i| {
                let edge = |k: usize| (span * (2f32.powf(k as f32 / num_bands as f32) - 1.0)) as usize;
                let start = edge(i).min(spectrum.len().saturating_sub(1));
                let end = edge(i + 1).max(start + 1).min(spectrum.len());
                let count = end.saturating_sub(start).max(1);
                let sum: f32 = spectrum[start..end].iter().sum();
                (sum / count as f32 * BAND_GAIN).min(1.0)
            })
            .collect()
    }
}
