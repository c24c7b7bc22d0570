//! CPU reference for the scanline pass.
//!
//! Mirrors `shaders/scanlines.wgsl` so the effect can be tested without a
//! GPU. `y` is the fragment's window coordinate, so pixel row `r` is
//! evaluated at `r + 0.5`.

use crate::visualizations::{Canvas, Color};

/// Distance between scanlines in pixels.
pub const LINE_SPACING: f32 = 10.0;

/// `line_pattern` threshold above which a pixel is in the band.
pub const BAND_THRESHOLD: f32 = 0.4;

/// Blend weight inside the band before pulsing.
pub const BAND_EFFECT: f32 = 0.5;

/// Color the scanlines pulse toward.
pub const SCANLINE_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// Overlay grid color, in 0..=1 components.
pub const GRID_COLOR: [f32; 4] = [50.0 / 255.0, 50.0 / 255.0, 50.0 / 255.0, 1.0];

/// `|fract(y / 10) - 0.5|`, in 0.0..=0.5.
pub fn line_pattern(y: f32) -> f32 {
    let v = y / LINE_SPACING;
    (v - v.floor() - 0.5).abs()
}

pub fn in_line_band(y: f32) -> bool {
    line_pattern(y) > BAND_THRESHOLD
}

/// `sin(2t) * 0.5 + 0.5`: period pi, range 0..=1.
pub fn pulse(time: f32) -> f32 {
    (time * 2.0).sin() * 0.5 + 0.5
}

/// Blend weight toward [`SCANLINE_COLOR`] at coordinate `y` and `time`.
pub fn scanline_factor(y: f32, time: f32) -> f32 {
    if in_line_band(y) {
        BAND_EFFECT * pulse(time)
    } else {
        0.0
    }
}

/// Whether window position `(x, y)` falls on an overlay grid line.
pub fn on_grid_line(x: f32, y: f32, spacing: f32) -> bool {
    if spacing <= 0.0 {
        return false;
    }
    let near = |v: f32| (v / spacing).fract() * spacing < 1.0;
    near(x) || near(y)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Apply the scanline blend (and the grid when `grid_spacing` is set) to
/// one pixel at `(column, row)`.
pub fn shade_pixel(
    color: Color,
    column: u32,
    row: u32,
    time: f32,
    grid_spacing: Option<f32>,
) -> [f32; 4] {
    let (x, y) = (column as f32 + 0.5, row as f32 + 0.5);
    let source = color.0.map(|c| c as f32 / 255.0);
    let t = scanline_factor(y, time);
    let mut out: [f32; 4] = std::array::from_fn(|i| mix(source[i], SCANLINE_COLOR[i], t));
    if let Some(spacing) = grid_spacing {
        if on_grid_line(x, y, spacing) {
            out = GRID_COLOR;
        }
    }
    out
}

/// Run the pass over a whole canvas, producing RGBA8 rows like a readback.
pub fn apply_scanlines(canvas: &Canvas, time: f32, grid_spacing: Option<f32>) -> Vec<u8> {
    let mut out = Vec::with_capacity(canvas.as_raw().len());
    for (column, row, pixel) in canvas.image().enumerate_pixels() {
        let shaded = shade_pixel(*pixel, column, row, time, grid_spacing);
        out.extend(shaded.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizations::rgb;
    use std::f32::consts::PI;

    #[test]
    fn test_multiples_of_ten_in_band() {
        for k in 0..50 {
            let y = k as f32 * 10.0;
            assert!(in_line_band(y), "y={y}");
            assert!(!in_line_band(y + 5.0), "y={}", y + 5.0);
        }
    }

    #[test]
    fn test_band_is_one_pixel_either_side() {
        // Pixel centers at row + 0.5: rows 9 and 10 straddle the line at y=10
        assert!(in_line_band(9.5));
        assert!(in_line_band(10.5));
        assert!(!in_line_band(8.5));
        assert!(!in_line_band(11.5));
    }

    #[test]
    fn test_pulse_range_and_period() {
        for i in 0..200 {
            let t = i as f32 * 0.037;
            let p = pulse(t);
            assert!((0.0..=1.0).contains(&p));
            assert!((p - pulse(t + PI)).abs() < 1e-4);
        }
        assert!((pulse(PI / 4.0) - 1.0).abs() < 1e-6);
        assert!(pulse(3.0 * PI / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_shade_outside_band_is_identity() {
        let color = rgb(12, 200, 77);
        let shaded = shade_pixel(color, 3, 4, 1.0, None);
        let bytes = shaded.map(|c| (c * 255.0).round() as u8);
        assert_eq!(bytes, color.0);
    }

    #[test]
    fn test_shade_peak_pulse_halfway_to_yellow() {
        let shaded = shade_pixel(rgb(0, 0, 0), 0, 10, PI / 4.0, None);
        assert!((shaded[0] - 0.5).abs() < 1e-5);
        assert!((shaded[1] - 0.5).abs() < 1e-5);
        assert_eq!(shaded[2], 0.0);
    }

    #[test]
    fn test_grid_overrides_scanlines() {
        assert!(on_grid_line(0.5, 20.5, 50.0));
        assert!(on_grid_line(50.5, 20.5, 50.0));
        assert!(!on_grid_line(25.5, 20.5, 50.0));
        assert!(!on_grid_line(0.5, 0.5, 0.0));

        let shaded = shade_pixel(rgb(255, 255, 255), 0, 20, 0.0, Some(50.0));
        assert_eq!(shaded, GRID_COLOR);
    }

    #[test]
    fn test_apply_scanlines_rows() {
        let mut canvas = Canvas::new(4, 20);
        canvas.fill(rgb(0, 0, 255));
        let out = apply_scanlines(&canvas, PI / 4.0, None);
        let row = |r: usize| &out[r * 16..r * 16 + 4];
        assert_eq!(row(5), &[0, 0, 255, 255]);
        let lit = row(10);
        assert!((127..=128).contains(&lit[0]) && lit[0] == lit[1] && lit[0] == lit[2]);
        assert_eq!(lit[3], 255);
    }
}
