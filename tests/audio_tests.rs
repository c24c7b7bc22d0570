//! Integration tests for audio module.


use std::sync::Arc;

use fixtures::{sine, write_wav, SAMPLE_RATE};
use impact_synth::audio::{
    load_audio, FeatureExtractor, LevelTracker, Playback, SampleLibrary, SpectrumAnalyzer,
};

#[test]
fn test_sine_wave_spectrum_peak() {
    let freq = 1000.0;
    let samples = sine(freq, SAMPLE_RATE, 1.0, 1.0);

    let mut analyzer = SpectrumAnalyzer::new(2048);
    let spectrum = analyzer.analyze(&samples);

    let peak_bin = spectrum
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();

    let peak_freq = analyzer.bin_to_freq(peak_bin, SAMPLE_RATE);
    assert!(
        (peak_freq - freq).abs() < 50.0,
        "Expected peak at {} Hz, got {} Hz",
        freq,
        peak_freq
    );
}

#[test]
fn test_low_tone_lights_low_bands() {
    let mut analyzer = SpectrumAnalyzer::new(1024);
    let low = sine(200.0, SAMPLE_RATE, 0.1, 0.8);
    let bands = analyzer.band_levels(&low, 8);

    assert_eq!(bands.len(), 8);
    assert!(bands.iter().all(|b| (0.0..=1.0).contains(b)));
    let loudest = bands
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    assert!(loudest < 4, "200 Hz peaked in band {loudest}");
}

#[test]
fn test_silence_gives_flat_features() {
    let mut extractor = FeatureExtractor::new(1024, 8);
    let features = extractor.process(&vec![0.0; 1024]);
    assert!(features.bands.iter().all(|&b| b == 0.0));
    assert_eq!(features.volume, 0.0);
    assert!(!features.beat);
}

#[test]
fn test_onset_detected_as_beat() {
    let mut extractor = FeatureExtractor::new(1024, 8);
    extractor.process(&vec![0.0; 1024]);
    let loud = sine(440.0, SAMPLE_RATE, 0.1, 0.9);
    let features = extractor.process(&loud[..1024]);
    assert!(features.beat);
    assert!(features.volume > 0.3);
    assert_eq!(features.peak, features.volume);
}

#[test]
fn test_peak_decays() {
    let mut tracker = LevelTracker::default();
    tracker.update(1.0);
    for _ in 0..10 {
        tracker.update(0.0);
    }
    assert!((tracker.peak() - 0.95f32.powi(10)).abs() < 1e-5);
}

#[test]
fn test_sample_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let tone = sine(440.0, SAMPLE_RATE, 0.05, 0.5);
    write_wav(&dir.path().join("1_audio_wave.wav"), &tone, SAMPLE_RATE, 1);
    write_wav(&dir.path().join("LOUD.WAV"), &tone, SAMPLE_RATE, 1);
    std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();
    std::fs::write(dir.path().join("track.mp3"), [0u8; 16]).unwrap();
    std::fs::create_dir(dir.path().join("nested.wav")).unwrap();

    let library = SampleLibrary::scan(dir.path()).unwrap();
    let names: Vec<_> = library.names().collect();
    assert_eq!(names, vec!["1_audio_wave", "LOUD"]);
    assert!(library.find("1_audio_wave").is_some());
    assert!(library.find("notes").is_none());
}

#[test]
fn test_missing_sample_dir_is_empty() {
    let library = SampleLibrary::scan(std::path::Path::new("/nonexistent/samples")).unwrap();
    assert!(library.is_empty());
}

#[test]
fn test_load_stereo_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let frames = 2205;
    let interleaved: Vec<f32> = (0..frames).flat_map(|_| [0.5, -0.5]).collect();
    write_wav(&path, &interleaved, SAMPLE_RATE, 2);

    let audio = load_audio(&path).unwrap();
    assert_eq!(audio.sample_rate, SAMPLE_RATE);
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.num_frames(), frames);
    assert!((audio.duration() - 0.05).abs() < 1e-3);
    assert!(audio.mono_frame(10).abs() < 1e-3);
}

#[test]
fn test_playback_loops_clip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blip.wav");
    write_wav(&path, &sine(440.0, SAMPLE_RATE, 0.01, 0.5), SAMPLE_RATE, 1);
    let clip = Arc::new(load_audio(&path).unwrap());
    let frames = clip.num_frames();

    let playback = Playback::new(SAMPLE_RATE);
    playback.play(clip);
    let mut out = vec![0.0; frames * 2 + 10];
    playback.render(&mut out, 1);
    assert!((playback.position() - 10.0).abs() < 1e-6);
    assert_eq!(out[0], out[frames]);
}
