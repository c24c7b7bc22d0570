//! Looping sample playback on the default output device via cpal.
//!
//! Playback is fire-and-forget: [`Playback::play`] swaps in a clip that then
//! loops until another clip replaces it. The output callback only ever
//! `try_lock`s the shared clip, so a busy main thread produces a short gap
//! of silence rather than blocking the audio thread.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use thiserror::Error;

use super::loader::AudioData;

/// Errors that can occur while opening the output device.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Failed to query output config: {0}")]
    OutputConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Unsupported output sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("Failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Playback state shared between the output callback and the main loop.
pub struct Playback {
    clip: Mutex<Option<Arc<AudioData>>>,
    /// Read position in source frames, stored as `f64` bits.
    position: AtomicU64,
    output_rate: AtomicU32,
}

impl Playback {
    pub fn new(output_rate: u32) -> Self {
        Self {
            clip: Mutex::new(None),
            position: AtomicU64::new(0f64.to_bits()),
            output_rate: AtomicU32::new(output_rate.max(1)),
        }
    }

    /// Start looping `clip` from the beginning, replacing any current clip.
    pub fn play(&self, clip: Arc<AudioData>) {
        let mut current = self.clip.lock().unwrap_or_else(PoisonError::into_inner);
        self.position.store(0f64.to_bits(), Ordering::Release);
        *current = Some(clip);
    }

    pub fn is_playing(&self) -> bool {
        self.current().is_some()
    }

    /// Output sample rate the clip is resampled to.
    pub fn output_rate(&self) -> u32 {
        self.output_rate.load(Ordering::Relaxed)
    }

    /// Current read position in source frames.
    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }

    fn current(&self) -> Option<Arc<AudioData>> {
        self.clip
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fill an interleaved output buffer, advancing and wrapping the position.
    ///
    /// Channels beyond the clip's count repeat its last channel. Resampling is
    /// nearest-frame.
    pub fn render(&self, out: &mut [f32], out_channels: usize) {
        let clip = match self.clip.try_lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(clip) = clip.filter(|c| c.num_frames() > 0) else {
            out.fill(0.0);
            return;
        };
        if out_channels == 0 {
            return;
        }

        let frames = clip.num_frames() as f64;
        let step = clip.sample_rate as f64 / self.output_rate() as f64;
        let mut position = self.position();

        for frame in out.chunks_mut(out_channels) {
            let index = (position as usize).min(clip.num_frames() - 1);
            let base = index * clip.channels;
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = clip.samples[base + channel.min(clip.channels - 1)];
            }
            position += step;
            if position >= frames {
                position %= frames;
            }
        }

        self.position.store(position.to_bits(), Ordering::Release);
    }

    /// The `len` mono frames leading up to the read position, wrapping
    /// through the clip start. `None` when nothing is playing.
    pub fn recent_window(&self, len: usize) -> Option<Vec<f32>> {
        let clip = self.current()?;
        let frames = clip.num_frames();
        if frames == 0 {
            return None;
        }
        let end = self.position() as usize % frames;
        Some(
            (0..len)
                .map(|i| {
                    let back = (len - i) % frames;
                    clip.mono_frame((end + frames - back) % frames)
                })
                .collect(),
        )
    }
}

/// An open output stream feeding from a shared [`Playback`].
pub struct AudioOutput {
    _stream: cpal::Stream,
    playback: Arc<Playback>,
    device_name: String,
}

impl AudioOutput {
    /// Open the default output device and start the stream (silent until a
    /// clip is played).
    pub fn open() -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoOutputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let playback = Arc::new(Playback::new(config.sample_rate.0));

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, &playback)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, &playback)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, &playback)?,
            cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, &playback)?,
            other => return Err(PlaybackError::UnsupportedFormat(other)),
        };
        stream.play()?;

        log::info!(
            "Audio output: {} @ {}Hz, {}ch",
            device_name,
            config.sample_rate.0,
            config.channels
        );

        Ok(Self {
            _stream: stream,
            playback,
            device_name,
        })
    }

    /// Handle visualizations use to start clips and read features.
    pub fn playback(&self) -> Arc<Playback> {
        Arc::clone(&self.playback)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    playback: &Arc<Playback>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let playback = Arc::clone(playback);
    let mut mix = Vec::new();

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            mix.resize(data.len(), 0.0f32);
            playback.render(&mut mix, channels);
            for (out, &sample) in data.iter_mut().zip(&mix) {
                *out = T::from_sample(sample);
            }
        },
        |err| log::warn!("Audio output stream error: {err}"),
        None,
    )
}
