//! Frame timing: per-frame `dt`, elapsed time, FPS and pacing deadline.

use std::time::{Duration, Instant};

use crate::config::StepMode;

/// Upper bound on a measured frame delta, so a stall does not teleport
/// animations.
pub const MAX_MEASURED_DT: f32 = 0.25;

const FPS_WINDOW: Duration = Duration::from_secs(1);

pub struct FrameClock {
    step: StepMode,
    frame_interval: Duration,
    start: Instant,
    last_tick: Option<Instant>,
    fps: f32,
    fps_frames: u32,
    fps_window_start: Instant,
}

impl FrameClock {
    pub fn new(step: StepMode, target_fps: u32, now: Instant) -> Self {
        Self {
            step,
            frame_interval: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            start: now,
            last_tick: None,
            fps: 0.0,
            fps_frames: 0,
            fps_window_start: now,
        }
    }

    /// Start a frame at `now` and return its `dt` in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.step {
            StepMode::Fixed { dt } => dt,
            StepMode::Measured => match self.last_tick {
                Some(last) => now
                    .saturating_duration_since(last)
                    .as_secs_f32()
                    .min(MAX_MEASURED_DT),
                None => self.frame_interval.as_secs_f32(),
            },
        };
        self.last_tick = Some(now);

        self.fps_frames += 1;
        let window = now.saturating_duration_since(self.fps_window_start);
        if window >= FPS_WINDOW {
            self.fps = self.fps_frames as f32 / window.as_secs_f32();
            self.fps_frames = 0;
            self.fps_window_start = now;
        }
        dt
    }

    /// Seconds since the clock started, as of the last tick.
    pub fn elapsed(&self) -> f32 {
        self.last_tick
            .map_or(0.0, |t| t.saturating_duration_since(self.start).as_secs_f32())
    }

    /// Frames per second over the last full measurement window.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// When the next frame is due.
    pub fn next_deadline(&self) -> Instant {
        self.last_tick.map_or(self.start, |t| t + self.frame_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_ignores_wall_clock() {
        let start = Instant::now();
        let mut clock = FrameClock::new(StepMode::Fixed { dt: 0.05 }, 30, start);
        assert_eq!(clock.tick(start), 0.05);
        assert_eq!(clock.tick(start + Duration::from_secs(3)), 0.05);
    }

    #[test]
    fn test_measured_step_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::new(StepMode::Measured, 30, start);
        let first = clock.tick(start);
        assert!((first - 1.0 / 30.0).abs() < 1e-6);

        let dt = clock.tick(start + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-6);

        let dt = clock.tick(start + Duration::from_secs(5));
        assert_eq!(dt, MAX_MEASURED_DT);
    }

    #[test]
    fn test_fps_window() {
        let start = Instant::now();
        let mut clock = FrameClock::new(StepMode::default(), 30, start);
        for i in 0..30 {
            clock.tick(start + Duration::from_millis(i * 34));
        }
        assert_eq!(clock.fps(), 0.0);
        clock.tick(start + Duration::from_millis(1000));
        assert!((clock.fps() - 31.0).abs() < 0.5);
    }

    #[test]
    fn test_deadline_and_elapsed() {
        let start = Instant::now();
        let mut clock = FrameClock::new(StepMode::default(), 20, start);
        assert_eq!(clock.next_deadline(), start);
        assert_eq!(clock.elapsed(), 0.0);

        let now = start + Duration::from_millis(500);
        clock.tick(now);
        assert_eq!(clock.next_deadline(), now + Duration::from_millis(50));
        assert!((clock.elapsed() - 0.5).abs() < 1e-6);
    }
}
