//! Spectrum bars and volume meter.
//!
//! On setup the sample whose stem matches the visualization key is started
//! on the shared playback. Bars follow the live spectrum of what is playing;
//! with no audio a synthetic spectrum keeps the display moving.

use std::sync::Arc;

use crate::audio::{load_audio, AudioFeatures, FeatureExtractor, LevelTracker, Playback};

use super::canvas::{rgb, Canvas, WHITE};
use super::{SynthContext, Visualization, VisualizationError};

const NUM_BANDS: usize = 8;
const FFT_SIZE: usize = 1024;

/// Synthetic spectrum at `time` seconds.
pub fn mock_features(time: f32, tracker: &mut LevelTracker) -> AudioFeatures {
    let t = time * 2.0;
    let mut bands: Vec<f32> = (0..NUM_BANDS)
        .map(|i| {
            let i = i as f32;
            (0.5 * (t + i * 0.2).sin() + 0.3 * (t * 1.5 + i * 0.1).sin() + 0.2 * (t * 0.7 + i * 0.3).sin())
                .abs()
        })
        .collect();
    let mut volume = (0.4 * t.sin() + 0.2).abs();

    if bands.iter().all(|&b| b == 0.0) {
        bands = (0..NUM_BANDS)
            .map(|i| (t + i as f32 * 0.2).sin().abs())
            .collect();
        volume = (0.6 * t.sin() + 0.4).abs();
    }

    tracker.update(volume);
    AudioFeatures {
        bands,
        volume,
        peak: tracker.peak(),
        beat: tracker.beat(),
    }
}

/// Bar geometry for band `index`: `(x, y, width, height)`.
pub fn bar_rect(index: usize, level: f32, volume: f32, width: u32, height: u32) -> (i32, i32, i32, i32) {
    let (w, h) = (width as f32, height as f32);
    let bar_width = (w * 0.8) / NUM_BANDS as f32;
    let padding = bar_width / 4.0;
    let start_x = (w - (bar_width + padding) * NUM_BANDS as f32 + padding) / 2.0;

    let level = level.max(0.05);
    let bar_height = (100.0 * level * (1.0 + volume)).max(20.0).min(h - 100.0);
    let x = start_x + index as f32 * (bar_width + padding);
    let y = h - bar_height - 50.0;
    (x as i32, y as i32, bar_width as i32, bar_height as i32)
}

/// Looping sample with spectrum bars.
pub struct AudioWave {
    key: String,
    time: f32,
    playback: Option<Arc<Playback>>,
    extractor: FeatureExtractor,
    mock_tracker: LevelTracker,
    features: AudioFeatures,
}

impl AudioWave {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            time: 0.0,
            playback: None,
            extractor: FeatureExtractor::new(FFT_SIZE, NUM_BANDS),
            mock_tracker: LevelTracker::new(1.3, 0.1),
            features: AudioFeatures::default(),
        }
    }

    /// Features from the most recent update.
    pub fn features(&self) -> &AudioFeatures {
        &self.features
    }
}

impl Visualization for AudioWave {
    fn name(&self) -> &str {
        "Audio Waveform"
    }

    fn setup(&mut self, ctx: &SynthContext) -> Result<(), VisualizationError> {
        let Some(playback) = ctx.audio.clone() else {
            log::info!("{}: no audio output, using synthetic spectrum", self.key);
            return Ok(());
        };
        let Some(path) = ctx.samples.find(&self.key) else {
            log::warn!(
                "No sample named {}.wav in {}",
                self.key,
                ctx.samples.dir().display()
            );
            return Ok(());
        };

        let clip = load_audio(path)?;
        log::info!("Playing {} ({:.1}s)", path.display(), clip.duration());
        playback.play(Arc::new(clip));
        self.extractor.reset();
        self.playback = Some(playback);
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<(), VisualizationError> {
        self.time += dt;
        let window = self
            .playback
            .as_ref()
            .and_then(|p| p.recent_window(self.extractor.window_len()));
        self.features = match window {
            Some(window) => self.extractor.process(&window),
            None => mock_features(self.time, &mut self.mock_tracker),
        };
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        let (width, height) = (canvas.width(), canvas.height());
        let volume = self.features.volume;

        if self.features.beat {
            canvas.fill(rgb(50, 50, 50));
        }

        for (i, &level) in self.features.bands.iter().enumerate() {
            let (x, y, w, h) = bar_rect(i, level, volume, width, height);
            canvas.fill_rect(x, y, w, h, rgb(128, 128, 128));
        }

        let meter_x = (width as f32 * 0.1) as i32;
        let meter_y = height as i32 - 20;
        let meter_width = width as f32 * 0.8;
        canvas.fill_rect(meter_x, meter_y, meter_width as i32, 10, rgb(50, 50, 50));
        let level_width = (meter_width * volume).max(20.0);
        canvas.fill_rect(meter_x, meter_y, level_width as i32, 10, WHITE);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizations::canvas::BLACK;

    #[test]
    fn test_mock_features_shape() {
        let mut tracker = LevelTracker::new(1.3, 0.1);
        for step in 0..100 {
            let features = mock_features(step as f32 * 0.05, &mut tracker);
            assert_eq!(features.bands.len(), NUM_BANDS);
            assert!(features.bands.iter().all(|b| (0.0..=1.0).contains(b)));
            assert!((0.0..=0.6).contains(&features.volume));
        }
    }

    #[test]
    fn test_mock_features_time_zero_fallback() {
        // At t=0 the primary mix is non-zero for every band past the first,
        // so the fallback is not taken.
        let mut tracker = LevelTracker::new(1.3, 0.1);
        let features = mock_features(0.0, &mut tracker);
        assert!(features.bands.iter().any(|&b| b > 0.0));
        assert!((features.volume - 0.2).abs() < 1e-6);
        assert!(features.beat);
    }

    #[test]
    fn test_bar_layout_centered() {
        let (first_x, _, w, _) = bar_rect(0, 0.5, 0.0, 1280, 720);
        let (last_x, _, _, _) = bar_rect(NUM_BANDS - 1, 0.5, 0.0, 1280, 720);
        let right_margin = 1280 - (last_x + w);
        assert!((first_x - right_margin).abs() <= 2);
    }

    #[test]
    fn test_bar_height_limits() {
        let (_, y, _, h) = bar_rect(0, 0.0, 0.0, 1280, 720);
        assert_eq!(h, 20);
        assert_eq!(y, 720 - 20 - 50);

        let (_, _, _, h) = bar_rect(0, 100.0, 1.0, 1280, 200);
        assert_eq!(h, 100);
    }

    #[test]
    fn test_draws_without_audio() {
        let ctx = SynthContext::new(320, 240);
        let mut wave = AudioWave::new("1_audio_wave");
        wave.setup(&ctx).unwrap();
        wave.update(0.5).unwrap();

        let mut canvas = Canvas::new(320, 240);
        assert!(wave.draw(&mut canvas).unwrap());
        // Meter background spans the bottom band
        assert_eq!(canvas.pixel(250, 225), Some(rgb(50, 50, 50)));
        // Meter level starts at the left edge
        assert_eq!(canvas.pixel(33, 225), Some(WHITE));
        // Top-left corner untouched unless a beat flashed
        let corner = canvas.pixel(0, 0).unwrap();
        assert!(corner == BLACK || corner == rgb(50, 50, 50));
    }

    #[test]
    fn test_plays_matching_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_audio_wave.wav");
        write_test_wav(&path);

        let samples = crate::audio::SampleLibrary::scan(dir.path()).unwrap();
        let playback = Arc::new(Playback::new(44100));
        let ctx = SynthContext::new(320, 240)
            .with_samples(samples)
            .with_audio(Arc::clone(&playback));

        let mut wave = AudioWave::new("1_audio_wave");
        wave.setup(&ctx).unwrap();
        assert!(playback.is_playing());

        wave.update(0.05).unwrap();
        assert_eq!(wave.features().bands.len(), NUM_BANDS);
    }

    /// Short 16-bit mono PCM WAV.
    fn write_test_wav(path: &std::path::Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..4410 {
            writer
                .write_sample(((i as f32 * 0.06).sin() * 16000.0) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
}
