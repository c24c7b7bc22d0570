//! Ring of points whose radius ripples around the circle over time.

use std::f32::consts::TAU;

use super::canvas::{rgb, Canvas, Point};
use super::{Visualization, VisualizationError};

const NUM_POINTS: usize = 36;
const BASE_RADIUS: f32 = 100.0;
const WAVE_AMPLITUDE: f32 = 50.0;

/// Ring point positions at `time`, centered on `center`.
pub fn ring_points(center: Point, time: f32) -> Vec<Point> {
    (0..NUM_POINTS)
        .map(|i| {
            let angle = TAU * i as f32 / NUM_POINTS as f32;
            let radius = BASE_RADIUS + WAVE_AMPLITUDE * (time * 2.0 + i as f32 * 0.3).sin();
            let x = (center.0 + radius * angle.cos()).trunc();
            let y = (center.1 + radius * angle.sin()).trunc();
            (x, y)
        })
        .collect()
}

pub struct CircleWave {
    time: f32,
}

impl CircleWave {
    pub fn new() -> Self {
        Self { time: 0.0 }
    }
}

impl Default for CircleWave {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for CircleWave {
    fn name(&self) -> &str {
        "Circle Wave"
    }

    fn update(&mut self, dt: f32) -> Result<(), VisualizationError> {
        self.time += dt;
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        let center = (
            (canvas.width() / 2) as f32,
            (canvas.height() / 2) as f32,
        );
        let points = ring_points(center, self.time);
        let color = rgb(0, 100, 255);

        for (i, &point) in points.iter().enumerate() {
            canvas.fill_circle(point, 5.0, color);
            let next = points[(i + 1) % points.len()];
            canvas.draw_line(point, next, color, 2.0);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_radius_bounds() {
        for step in 0..20 {
            for (x, y) in ring_points((0.0, 0.0), step as f32 * 0.1) {
                let r = (x * x + y * y).sqrt();
                assert!((48.0..=151.0).contains(&r), "radius {r}");
            }
        }
    }

    #[test]
    fn test_first_point_at_time_zero() {
        let points = ring_points((640.0, 360.0), 0.0);
        assert_eq!(points.len(), NUM_POINTS);
        assert_eq!(points[0], (740.0, 360.0));
    }

    #[test]
    fn test_draw_marks_first_point() {
        let mut wave = CircleWave::new();
        let mut canvas = Canvas::new(400, 400);
        assert!(wave.draw(&mut canvas).unwrap());
        assert_eq!(canvas.pixel(300, 200), Some(rgb(0, 100, 255)));
        assert_eq!(canvas.pixel(200, 200), Some(rgb(0, 0, 0)));
    }
}
