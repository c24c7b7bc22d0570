//! CPU frame buffer and drawing primitives.
//!
//! The canvas is allocated once by the main loop and handed to the active
//! visualization every frame. Coordinates are pixels with the origin at the
//! top-left; everything is clipped to the canvas bounds.

use image::{Pixel, Rgba, RgbaImage};

/// RGBA color with straight (non-premultiplied) alpha.
pub type Color = Rgba<u8>;

pub const BLACK: Color = Rgba([0, 0, 0, 255]);
pub const WHITE: Color = Rgba([255, 255, 255, 255]);

/// Opaque color from RGB components.
pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Rgba([r, g, b, 255])
}

/// Color with explicit alpha.
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
    Rgba([r, g, b, a])
}

/// A 2D point in canvas pixels.
pub type Point = (f32, f32);

/// The drawing surface visualizations render into.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, BLACK),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Tightly packed RGBA8 rows, top row first.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).copied()
    }

    /// Overwrite every pixel.
    pub fn fill(&mut self, color: Color) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// Composite `color` over one pixel. Out-of-bounds writes are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let target = self.image.get_pixel_mut(x as u32, y as u32);
        match color[3] {
            0 => {}
            255 => *target = color,
            _ => target.blend(&color),
        }
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.width() as i32);
        let y1 = (y + height).min(self.height() as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Filled circle centered on `center`.
    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let (cx, cy) = center;
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i32;
        let x1 = (cx + radius).ceil() as i32;
        let y0 = (cy - radius).floor() as i32;
        let y1 = (cy + radius).ceil() as i32;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 - cx;
                let dy = py as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Straight line of the given width. Each covered pixel is written once,
    /// so translucent colors blend evenly.
    pub fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        if width <= 1.0 {
            self.draw_hairline(from, to, color);
            return;
        }

        let half = width / 2.0;
        let (ax, ay) = from;
        let (bx, by) = to;
        let (dx, dy) = (bx - ax, by - ay);
        let len2 = dx * dx + dy * dy;

        let x0 = (ax.min(bx) - half).floor() as i32;
        let x1 = (ax.max(bx) + half).ceil() as i32;
        let y0 = (ay.min(by) - half).floor() as i32;
        let y1 = (ay.max(by) + half).ceil() as i32;

        for py in y0.max(0)..=y1.min(self.height() as i32 - 1) {
            for px in x0.max(0)..=x1.min(self.width() as i32 - 1) {
                let (qx, qy) = (px as f32, py as f32);
                let t = if len2 > 0.0 {
                    (((qx - ax) * dx + (qy - ay) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (ex, ey) = (ax + t * dx - qx, ay + t * dy - qy);
                if ex * ex + ey * ey <= half * half {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Connected line segments through `points`.
    pub fn draw_polyline(&mut self, points: &[Point], color: Color, width: f32) {
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1], color, width);
        }
    }

    /// Composite `source` with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, source: &RgbaImage, x: i32, y: i32) {
        for (sx, sy, pixel) in source.enumerate_pixels() {
            self.blend_pixel(x + sx as i32, y + sy as i32, *pixel);
        }
    }

    fn draw_hairline(&mut self, from: Point, to: Point, color: Color) {
        let (ax, ay) = from;
        let (bx, by) = to;
        let steps = (bx - ax).abs().max((by - ay).abs()).round().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (ax + (bx - ax) * t).round() as i32;
            let y = (ay + (by - ay) * t).round() as i32;
            self.blend_pixel(x, y, color);
        }
    }
}
