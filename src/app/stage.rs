//! The windowless part of a frame: MIDI dispatch, update, clear and draw.

use std::sync::Arc;

use crate::midi::MidiRouter;
use crate::visualizations::canvas::BLACK;
use crate::visualizations::{Canvas, Switcher, VisualizationError};

pub struct Stage {
    switcher: Switcher,
    canvas: Canvas,
    midi: Option<Arc<MidiRouter>>,
}

impl Stage {
    /// The canvas takes the size recorded in the switcher's context.
    pub fn new(switcher: Switcher) -> Self {
        let ctx = switcher.context();
        let canvas = Canvas::new(ctx.width, ctx.height);
        let midi = ctx.midi.clone();
        Self {
            switcher,
            canvas,
            midi,
        }
    }

    /// Run one frame's UpdateMIDI, Update and Draw phases.
    ///
    /// Returns whether the visualization drew. The canvas is cleared first
    /// unless the active visualization opts out.
    pub fn advance(&mut self, dt: f32) -> Result<bool, VisualizationError> {
        if let Some(midi) = &self.midi {
            midi.pump();
        }

        let visualization = self.switcher.current_mut();
        visualization.update(dt)?;
        if visualization.clears_each_frame() {
            self.canvas.fill(BLACK);
        }
        visualization.draw(&mut self.canvas)
    }

    /// Run [`advance`](Self::advance) and return the canvas to present, or
    /// `None` when the visualization failed and the frame is skipped.
    pub fn frame(&mut self, dt: f32) -> Option<&Canvas> {
        match self.advance(dt) {
            Ok(_) => Some(&self.canvas),
            Err(e) => {
                log::warn!("{} skipped a frame: {e}", self.current_name());
                None
            }
        }
    }

    pub fn next(&mut self) {
        self.switcher.next();
    }

    pub fn previous(&mut self) {
        self.switcher.previous();
    }

    pub fn switcher(&self) -> &Switcher {
        &self.switcher
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn current_name(&self) -> &str {
        self.switcher.current().name()
    }
}
