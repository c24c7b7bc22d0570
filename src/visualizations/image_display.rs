//! Image display visualization.
//!
//! Shows `<images_dir>/<key>.{png,jpg,jpeg}` centered on a background taken
//! from the image's top-left pixel. Colors invert for two seconds out of
//! every six.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::canvas::{rgb, Canvas};
use super::{SynthContext, Visualization, VisualizationError};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const PLACEHOLDER_SIZE: u32 = 200;

/// Look up `<dir>/<stem>.<ext>` for the first extension that exists.
pub fn find_image(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}

/// Whether colors are inverted at `time` seconds.
pub fn inverted_at(time: f32) -> bool {
    (time.max(0.0) as u64) % 6 < 2
}

/// Gray square with a light cross, shown when no image is found.
fn placeholder() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, rgb(100, 100, 100));
    let last = PLACEHOLDER_SIZE - 1;
    for i in 0..PLACEHOLDER_SIZE {
        image.put_pixel(i, i, rgb(255, 255, 255));
        image.put_pixel(last - i, i, rgb(255, 255, 255));
    }
    image
}

/// Scale `image` down to fit `width` x `height`, keeping its aspect ratio.
fn fit_within(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.width() <= width && image.height() <= height {
        return image;
    }
    let scale = (width as f32 / image.width() as f32).min(height as f32 / image.height() as f32);
    let w = ((image.width() as f32 * scale) as u32).max(1);
    let h = ((image.height() as f32 * scale) as u32).max(1);
    imageops::resize(&image, w, h, FilterType::Triangle)
}

/// Centered image with periodic color inversion.
pub struct ImageDisplay {
    key: String,
    time: f32,
    image: Option<RgbaImage>,
    inverted: Option<RgbaImage>,
}

impl ImageDisplay {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            time: 0.0,
            image: None,
            inverted: None,
        }
    }

    fn set_image(&mut self, image: RgbaImage) {
        let mut inverted = image.clone();
        imageops::invert(&mut inverted);
        self.image = Some(image);
        self.inverted = Some(inverted);
    }
}

impl Visualization for ImageDisplay {
    fn name(&self) -> &str {
        "Image Display"
    }

    fn setup(&mut self, ctx: &SynthContext) -> Result<(), VisualizationError> {
        let Some(path) = find_image(&ctx.images_dir, &self.key) else {
            log::warn!(
                "No image named {}.png/.jpg in {}, showing placeholder",
                self.key,
                ctx.images_dir.display()
            );
            self.set_image(placeholder());
            return Ok(());
        };

        // Keep the placeholder if decoding fails so draw still has something to show.
        self.set_image(placeholder());
        let image = image::open(&path)?.to_rgba8();
        log::info!(
            "Loaded image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.set_image(fit_within(image, ctx.width, ctx.height));
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<(), VisualizationError> {
        self.time += dt;
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        let image = if inverted_at(self.time) {
            self.inverted.as_ref()
        } else {
            self.image.as_ref()
        };
        let Some(image) = image else {
            return Ok(false);
        };

        let mut background = *image.get_pixel(0, 0);
        background[3] = 255;
        canvas.fill(background);

        let x = (canvas.width() as i32 - image.width() as i32) / 2;
        let y = (canvas.height() as i32 - image.height() as i32) / 2;
        canvas.blit(image, x, y);
        Ok(true)
    }
}
