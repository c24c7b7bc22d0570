//! Crosshair positioned by two CC controls.
//!
//! CC21 moves the vertical line across the width, CC22 moves the horizontal
//! line down the height. Both start centered.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::midi::{MidiRouter, CC_MAX};

use super::canvas::{rgb, Canvas};
use super::{SynthContext, Visualization, VisualizationError};

pub const HORIZONTAL_CC: u8 = 21;
pub const VERTICAL_CC: u8 = 22;
const DEFAULT_VALUE: u8 = 64;
const LINE_WIDTH: f32 = 3.0;

pub struct MidiLines {
    horizontal: Arc<AtomicU8>,
    vertical: Arc<AtomicU8>,
    midi: Option<Arc<MidiRouter>>,
}

impl MidiLines {
    pub fn new() -> Self {
        Self {
            horizontal: Arc::new(AtomicU8::new(DEFAULT_VALUE)),
            vertical: Arc::new(AtomicU8::new(DEFAULT_VALUE)),
            midi: None,
        }
    }

    /// Normalized `(horizontal, vertical)` positions in 0.0..=1.0.
    pub fn positions(&self) -> (f32, f32) {
        let norm = |v: &AtomicU8| v.load(Ordering::Relaxed) as f32 / CC_MAX as f32;
        (norm(&self.horizontal), norm(&self.vertical))
    }
}

impl Default for MidiLines {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for MidiLines {
    fn name(&self) -> &str {
        "MIDI Lines"
    }

    fn setup(&mut self, ctx: &SynthContext) -> Result<(), VisualizationError> {
        let Some(midi) = ctx.midi.clone() else {
            log::info!("MIDI lines: no router, lines stay centered");
            return Ok(());
        };
        for (cc, target) in [
            (HORIZONTAL_CC, Arc::clone(&self.horizontal)),
            (VERTICAL_CC, Arc::clone(&self.vertical)),
        ] {
            midi.register_cc_callback(cc, move |_, value, _| {
                target.store(value, Ordering::Relaxed);
            });
        }
        self.midi = Some(midi);
        Ok(())
    }

    fn update(&mut self, _dt: f32) -> Result<(), VisualizationError> {
        if let Some(midi) = &self.midi {
            let h = midi.get_cc(HORIZONTAL_CC, self.horizontal.load(Ordering::Relaxed));
            let v = midi.get_cc(VERTICAL_CC, self.vertical.load(Ordering::Relaxed));
            self.horizontal.store(h, Ordering::Relaxed);
            self.vertical.store(v, Ordering::Relaxed);
        }
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        let (hpos, vpos) = self.positions();
        let x = (w * hpos).trunc();
        let y = (h * vpos).trunc();
        let color = rgb(0, 175, 191);

        canvas.draw_line((0.0, y), (w, y), color, LINE_WIDTH);
        canvas.draw_line((x, 0.0), (x, h), color, LINE_WIDTH);
        canvas.fill_circle((x, y), 6.0, rgb(255, 0, 0));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_without_midi() {
        let mut lines = MidiLines::new();
        lines.setup(&SynthContext::new(254, 254)).unwrap();
        lines.update(0.1).unwrap();
        let (h, v) = lines.positions();
        assert!((h - 64.0 / 127.0).abs() < 1e-6);
        assert!((v - 64.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn test_callbacks_move_lines() {
        let router = Arc::new(MidiRouter::new());
        let ctx = SynthContext::new(127, 127).with_midi(Arc::clone(&router));
        let mut lines = MidiLines::new();
        lines.setup(&ctx).unwrap();
        assert_eq!(router.callback_count(HORIZONTAL_CC), 1);
        assert_eq!(router.callback_count(VERTICAL_CC), 1);

        router.on_cc(HORIZONTAL_CC, 127, 0);
        router.on_cc(VERTICAL_CC, 0, 0);
        assert_eq!(lines.positions(), (1.0, 0.0));
    }

    #[test]
    fn test_draw_places_intersection() {
        let router = Arc::new(MidiRouter::new());
        router.on_cc(HORIZONTAL_CC, 127, 0);
        router.on_cc(VERTICAL_CC, 0, 0);
        let ctx = SynthContext::new(100, 100).with_midi(Arc::clone(&router));

        let mut lines = MidiLines::new();
        lines.setup(&ctx).unwrap();
        lines.update(0.0).unwrap();

        let mut canvas = Canvas::new(100, 100);
        lines.draw(&mut canvas).unwrap();
        // Horizontal line along the top edge, vertical at the right edge
        assert_eq!(canvas.pixel(10, 0), Some(rgb(0, 175, 191)));
        assert_eq!(canvas.pixel(99, 50), Some(rgb(0, 175, 191)));
        assert_eq!(canvas.pixel(97, 2), Some(rgb(255, 0, 0)));
        assert_eq!(canvas.pixel(50, 50), Some(rgb(0, 0, 0)));
    }
}
