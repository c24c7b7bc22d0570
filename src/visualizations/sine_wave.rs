//! Horizontally scrolling sine line with a layered green glow.

use super::canvas::{rgb, Canvas, Color, Point};
use super::{Visualization, VisualizationError};

const AMPLITUDE: f32 = 50.0;
const FREQUENCY: f32 = 0.01;

/// Glow layers drawn under the core line, widest first.
const GLOW: [(f32, Color); 4] = [
    (10.0, rgb(0, 40, 0)),
    (8.0, rgb(0, 80, 0)),
    (6.0, rgb(0, 120, 0)),
    (4.0, rgb(0, 160, 0)),
];
const CORE: (f32, Color) = (2.0, rgb(0, 255, 0));

/// Wave samples every two pixels across `width`.
pub fn wave_points(width: u32, height: u32, offset: f32) -> Vec<Point> {
    let mid = height as f32 / 2.0;
    (0..width)
        .step_by(2)
        .map(|x| {
            let x = x as f32;
            (x, mid + AMPLITUDE * (x * FREQUENCY + offset).sin())
        })
        .collect()
}

pub struct SineWave {
    offset: f32,
}

impl SineWave {
    pub fn new() -> Self {
        Self { offset: 0.0 }
    }
}

impl Default for SineWave {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for SineWave {
    fn name(&self) -> &str {
        "Sine Wave"
    }

    fn update(&mut self, dt: f32) -> Result<(), VisualizationError> {
        self.offset += dt;
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        let points = wave_points(canvas.width(), canvas.height(), self.offset);
        if points.len() < 2 {
            return Ok(false);
        }
        for (width, color) in GLOW.iter().chain(std::iter::once(&CORE)) {
            canvas.draw_polyline(&points, *color, *width);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_follow_sine() {
        let points = wave_points(200, 100, 0.0);
        assert_eq!(points.len(), 100);
        assert_eq!(points[0], (0.0, 50.0));
        let (x, y) = points[50];
        assert_eq!(x, 100.0);
        assert!((y - (50.0 + 50.0 * 1.0f32.sin())).abs() < 1e-4);
    }

    #[test]
    fn test_core_drawn_over_glow() {
        let mut wave = SineWave::new();
        let mut canvas = Canvas::new(200, 200);
        assert!(wave.draw(&mut canvas).unwrap());
        assert_eq!(canvas.pixel(0, 100), Some(rgb(0, 255, 0)));
        // Below the line only the widest glow reaches
        assert_eq!(canvas.pixel(0, 105), Some(rgb(0, 40, 0)));
    }

    #[test]
    fn test_offset_advances() {
        let mut wave = SineWave::new();
        wave.update(0.25).unwrap();
        wave.update(0.25).unwrap();
        assert!((wave.offset - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_narrow_canvas_draws_nothing() {
        let mut wave = SineWave::new();
        let mut canvas = Canvas::new(1, 10);
        assert!(!wave.draw(&mut canvas).unwrap());
    }
}
