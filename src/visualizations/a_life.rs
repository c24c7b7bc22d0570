//! Conway's Game of Life on a wrap-around grid.
//!
//! MIDI controls:
//! - CC21 / CC22: grid width / height (10-100 cells), content is kept
//! - CC23: simulation speed (0.2x-2.0x)
//! - CC24: cell hue
//! - CC25: seeding density for the next reset (0.05-0.95)
//! - CC44: reset with a fresh random grid when above 64

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::midi::{scale_cc, MidiRouter};

use super::canvas::{rgb, Canvas, Color, BLACK};
use super::{SynthContext, Visualization, VisualizationError};

pub const WIDTH_CC: u8 = 21;
pub const HEIGHT_CC: u8 = 22;
pub const SPEED_CC: u8 = 23;
pub const COLOR_CC: u8 = 24;
pub const DENSITY_CC: u8 = 25;
pub const RESET_CC: u8 = 44;

const DEFAULT_GRID: (usize, usize) = (50, 30);
const DEFAULT_DENSITY: f32 = 0.3;
const DEFAULT_DENSITY_CC: u8 = 38;
const UPDATE_INTERVAL: f32 = 0.1;
const CELL_COLOR: Color = rgb(0, 200, 100);
const DEFAULT_HUE_CC: u8 = 64;
const GRID_LINE_COLOR: Color = rgb(20, 20, 20);

/// A toroidal Game of Life grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl LifeGrid {
    /// All-dead grid. Dimensions are at least one cell.
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Grid with each cell alive with probability `density`.
    pub fn random(width: usize, height: usize, density: f32, rng: &mut impl Rng) -> Self {
        let mut grid = Self::new(width, height);
        for cell in grid.cells.iter_mut() {
            *cell = rng.gen::<f32>() < density;
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether `(x, y)` is alive. Out-of-range coordinates are dead.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = alive;
        }
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    fn live_neighbors(&self, x: usize, y: usize) -> usize {
        let mut count = 0;
        for dy in [self.height - 1, 0, 1] {
            for dx in [self.width - 1, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x + dx) % self.width;
                let ny = (y + dy) % self.height;
                count += self.cells[ny * self.width + nx] as usize;
            }
        }
        count
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        let next = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .map(|(x, y)| {
                let alive = self.cells[y * self.width + x];
                matches!((alive, self.live_neighbors(x, y)), (true, 2) | (_, 3))
            })
            .collect();
        self.cells = next;
    }

    /// Change dimensions, keeping the overlapping top-left region.
    pub fn resize(&mut self, width: usize, height: usize) {
        let mut resized = Self::new(width, height);
        for y in 0..self.height.min(resized.height) {
            for x in 0..self.width.min(resized.width) {
                resized.set(x, y, self.get(x, y));
            }
        }
        *self = resized;
    }
}

/// Map a hue in 0.0..=1.0 to a fully saturated color.
pub fn hue_to_rgb(hue: f32) -> Color {
    let h = hue.clamp(0.0, 1.0) * 6.0;
    let x = 1.0 - ((h % 2.0) - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

fn grid_dimension(value: u8) -> usize {
    scale_cc(value as f32, 10.0, 100.0) as usize
}

/// Cell size and centering offsets for a grid drawn on a canvas.
pub fn layout(grid: &LifeGrid, width: u32, height: u32) -> (i32, i32, i32) {
    let cell = (width as usize / grid.width())
        .min(height as usize / grid.height())
        .max(2) as i32;
    let offset_x = (width as i32 - grid.width() as i32 * cell) / 2;
    let offset_y = (height as i32 - grid.height() as i32 * cell) / 2;
    (cell, offset_x, offset_y)
}

/// Controls received since the last update, latest value per CC.
///
/// Callbacks keep firing while the visualization is inactive, so only the
/// newest value of each control is kept. A reset press is latched until
/// the next update.
#[derive(Debug, Default)]
pub struct PendingControls {
    values: Vec<(u8, u8)>,
    reset: bool,
}

impl PendingControls {
    pub fn record(&mut self, cc: u8, value: u8) {
        if cc == RESET_CC {
            self.reset |= value > 64;
            return;
        }
        match self.values.iter_mut().find(|(c, _)| *c == cc) {
            Some(entry) => entry.1 = value,
            None => self.values.push((cc, value)),
        }
    }

    /// Number of distinct controls waiting.
    pub fn len(&self) -> usize {
        self.values.len() + self.reset as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ALife {
    grid: LifeGrid,
    rng: StdRng,
    density: f32,
    speed: f32,
    color: Color,
    time_since_update: f32,
    midi: Option<Arc<MidiRouter>>,
    pending: Arc<Mutex<PendingControls>>,
}

impl ALife {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic seeding.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let grid = LifeGrid::random(DEFAULT_GRID.0, DEFAULT_GRID.1, DEFAULT_DENSITY, &mut rng);
        Self {
            grid,
            rng,
            density: DEFAULT_DENSITY,
            speed: 1.0,
            color: CELL_COLOR,
            time_since_update: 0.0,
            midi: None,
            pending: Arc::default(),
        }
    }

    pub fn grid(&self) -> &LifeGrid {
        &self.grid
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Controls queued by callbacks and not yet applied.
    pub fn pending_controls(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, PendingControls> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&mut self, width: usize, height: usize) {
        self.grid = LifeGrid::random(width, height, self.density, &mut self.rng);
        self.time_since_update = 0.0;
        log::debug!(
            "A-Life reset to {}x{} at density {:.2}",
            width,
            height,
            self.density
        );
    }

    fn apply_control(&mut self, cc: u8, value: u8) {
        match cc {
            WIDTH_CC => self.grid.resize(grid_dimension(value), self.grid.height()),
            HEIGHT_CC => self.grid.resize(self.grid.width(), grid_dimension(value)),
            SPEED_CC => self.speed = scale_cc(value as f32, 0.2, 2.0),
            COLOR_CC => self.color = hue_to_rgb(value as f32 / 127.0),
            DENSITY_CC => self.density = scale_cc(value as f32, 0.05, 0.95),
            _ => {}
        }
    }
}

impl Default for ALife {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for ALife {
    fn name(&self) -> &str {
        "A-Life Simulation"
    }

    fn setup(&mut self, ctx: &SynthContext) -> Result<(), VisualizationError> {
        let Some(midi) = ctx.midi.clone() else {
            return Ok(());
        };

        let width = grid_dimension(midi.get_cc(WIDTH_CC, 64));
        let height = grid_dimension(midi.get_cc(HEIGHT_CC, 64));
        self.speed = scale_cc(midi.get_cc(SPEED_CC, 64) as f32, 0.2, 2.0);
        self.density = scale_cc(midi.get_cc(DENSITY_CC, DEFAULT_DENSITY_CC) as f32, 0.05, 0.95);
        self.apply_control(COLOR_CC, midi.get_cc(COLOR_CC, DEFAULT_HUE_CC));
        self.reset(width, height);

        for cc in [WIDTH_CC, HEIGHT_CC, SPEED_CC, COLOR_CC, DENSITY_CC, RESET_CC] {
            let pending = Arc::clone(&self.pending);
            midi.register_cc_callback(cc, move |cc, value, _| {
                pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(cc, value);
            });
        }
        self.midi = Some(midi);
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<(), VisualizationError> {
        let pending = std::mem::take(&mut *self.lock_pending());
        for (cc, value) in pending.values {
            self.apply_control(cc, value);
        }
        if pending.reset {
            self.reset(self.grid.width(), self.grid.height());
        }

        if let Some(midi) = &self.midi {
            let width = grid_dimension(midi.get_cc(WIDTH_CC, 64));
            let height = grid_dimension(midi.get_cc(HEIGHT_CC, 64));
            self.speed = scale_cc(midi.get_cc(SPEED_CC, 64) as f32, 0.2, 2.0);
            if (width, height) != (self.grid.width(), self.grid.height()) {
                self.reset(width, height);
            }
        }

        self.time_since_update += dt * self.speed;
        if self.time_since_update >= UPDATE_INTERVAL {
            self.grid.step();
            self.time_since_update = 0.0;
        }
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        canvas.fill(BLACK);
        let (cell, offset_x, offset_y) = layout(&self.grid, canvas.width(), canvas.height());
        let grid_w = self.grid.width() as i32 * cell;
        let grid_h = self.grid.height() as i32 * cell;

        if cell > 3 {
            for i in 0..=self.grid.width() as i32 {
                let x = (offset_x + i * cell) as f32;
                canvas.draw_line(
                    (x, offset_y as f32),
                    (x, (offset_y + grid_h) as f32),
                    GRID_LINE_COLOR,
                    1.0,
                );
            }
            for j in 0..=self.grid.height() as i32 {
                let y = (offset_y + j * cell) as f32;
                canvas.draw_line(
                    (offset_x as f32, y),
                    ((offset_x + grid_w) as f32, y),
                    GRID_LINE_COLOR,
                    1.0,
                );
            }
        }

        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                if self.grid.get(x, y) {
                    canvas.fill_rect(
                        offset_x + x as i32 * cell,
                        offset_y + y as i32 * cell,
                        cell - 1,
                        cell - 1,
                        self.color,
                    );
                }
            }
        }
        Ok(true)
    }
}
