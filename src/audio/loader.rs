//! Sample discovery and decoding using Symphonia.
//!
//! Samples live in one directory and are matched to visualizations by file
//! stem, so `samples/1_audio_wave.wav` belongs to the `1_audio_wave`
//! visualization.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use thiserror::Error;

/// File extensions recognised as samples.
pub const SAMPLE_EXTENSIONS: &[&str] = &["wav"];

/// Errors that can occur during audio loading.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to probe audio format: {0}")]
    ProbeError(#[from] symphonia::core::errors::Error),

    #[error("No audio track found in file")]
    NoAudioTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Audio file contains no samples")]
    Empty,
}

/// Decoded audio clip.
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved audio samples (f32, normalized to -1.0..1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: usize,
}

impl AudioData {
    /// Duration of the audio in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Mono value of one frame (average over channels).
    pub fn mono_frame(&self, frame: usize) -> f32 {
        let start = frame * self.channels;
        match self.samples.get(start..start + self.channels) {
            Some(values) => values.iter().sum::<f32>() / self.channels as f32,
            None => 0.0,
        }
    }
}

/// Decode a sample file to interleaved f32.
pub fn load_audio(path: &Path) -> Result<AudioData, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioError::UnknownSampleRate)?;
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::debug!("Skipping undecodable packet in {}: {err}", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if samples.is_empty() || channels == 0 {
        return Err(AudioError::Empty);
    }

    log::info!(
        "Loaded {} ({:.2}s, {}Hz, {}ch)",
        path.display(),
        samples.len() as f64 / (sample_rate as f64 * channels as f64),
        sample_rate,
        channels
    );

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
    })
}

/// Samples found in the samples directory, keyed by file stem.
#[derive(Debug, Clone, Default)]
pub struct SampleLibrary {
    dir: PathBuf,
    samples: BTreeMap<String, PathBuf>,
}

impl SampleLibrary {
    /// Scan `dir` (non-recursively) for files with a sample extension.
    ///
    /// A missing directory yields an empty library.
    pub fn scan(dir: &Path) -> Result<Self, AudioError> {
        let mut samples = BTreeMap::new();

        if !dir.is_dir() {
            log::warn!(
                "Samples directory {} not found, audio visualizations will be simulated",
                dir.display()
            );
            return Ok(Self {
                dir: dir.to_path_buf(),
                samples,
            });
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !has_sample_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                samples.insert(stem.to_string(), path.clone());
            }
        }

        log::info!("Found {} sample(s) in {}", samples.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            samples,
        })
    }

    /// Path of the sample named `stem`.
    pub fn find(&self, stem: &str) -> Option<&Path> {
        self.samples.get(stem).map(PathBuf::as_path)
    }

    /// Sample names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Directory the library was scanned from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn has_sample_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SAMPLE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_data_duration() {
        let audio = AudioData {
            samples: vec![0.0; 44100 * 2], // 1 second of stereo
            sample_rate: 44100,
            channels: 2,
        };
        assert!((audio.duration() - 1.0).abs() < 0.001);
        assert_eq!(audio.num_frames(), 44100);
    }

    #[test]
    fn test_mono_frame() {
        let audio = AudioData {
            samples: vec![0.5, -0.5, 1.0, 0.0],
            sample_rate: 44100,
            channels: 2,
        };
        assert!((audio.mono_frame(0) - 0.0).abs() < 0.001);
        assert!((audio.mono_frame(1) - 0.5).abs() < 0.001);
        assert_eq!(audio.mono_frame(2), 0.0);
    }

    #[test]
    fn test_sample_extension_matching() {
        assert!(has_sample_extension(Path::new("a/1_audio_wave.wav")));
        assert!(has_sample_extension(Path::new("LOUD.WAV")));
        assert!(!has_sample_extension(Path::new("notes.txt")));
        assert!(!has_sample_extension(Path::new("wav")));
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let library = SampleLibrary::scan(Path::new("/nonexistent/samples")).unwrap();
        assert!(library.is_empty());
        assert!(library.find("1_audio_wave").is_none());
    }
}
