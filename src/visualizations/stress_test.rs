//! Bouncing particles joined by fading lines, each with a pulsing glow.
//!
//! Heavy on purpose: pairwise distance checks and layered translucent
//! circles every frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::canvas::{rgba, Canvas, Color};
use super::{SynthContext, Visualization, VisualizationError};

const NUM_PARTICLES: usize = 100;
const CONNECT_DISTANCE: f32 = 200.0;

/// Spawn area, independent of the output size.
const SPAWN_WIDTH: f32 = 1280.0;
const SPAWN_HEIGHT: f32 = 720.0;

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: u32,
    pub frequency: f32,
    pub amplitude: f32,
    pub color: [u8; 3],
}

impl Particle {
    fn random(rng: &mut impl Rng) -> Self {
        Self {
            x: rng.gen_range(0.0..SPAWN_WIDTH),
            y: rng.gen_range(0.0..SPAWN_HEIGHT),
            vx: rng.gen_range(-2.0..2.0),
            vy: rng.gen_range(-2.0..2.0),
            size: rng.gen_range(3..=15),
            frequency: rng.gen_range(0.5..3.0),
            amplitude: rng.gen_range(10.0..50.0),
            color: [
                rng.gen_range(100..=255),
                rng.gen_range(100..=255),
                rng.gen_range(100..=255),
            ],
        }
    }

    fn color(&self, alpha: u8) -> Color {
        rgba(self.color[0], self.color[1], self.color[2], alpha)
    }

    /// Glow radius at `time`, never below one pixel.
    pub fn current_size(&self, time: f32) -> u32 {
        let pulse = ((time * self.frequency).sin() * 3.0) as i32;
        (self.size as i32 + pulse).max(1) as u32
    }
}

/// Flip velocity and clamp when `pos` leaves `0..=limit`.
fn bounce(pos: &mut f32, velocity: &mut f32, limit: f32) {
    if *pos < 0.0 || *pos > limit {
        *velocity = -*velocity;
        *pos = pos.clamp(0.0, limit);
    }
}

pub struct StressTest {
    particles: Vec<Particle>,
    time: f32,
    width: f32,
    height: f32,
}

impl StressTest {
    pub fn new() -> Self {
        Self::with_seed(StdRng::from_entropy())
    }

    fn with_seed(mut rng: StdRng) -> Self {
        Self {
            particles: (0..NUM_PARTICLES).map(|_| Particle::random(&mut rng)).collect(),
            time: 0.0,
            width: SPAWN_WIDTH,
            height: SPAWN_HEIGHT,
        }
    }

    /// Deterministic particle field.
    pub fn seeded(seed: u64) -> Self {
        Self::with_seed(StdRng::seed_from_u64(seed))
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

impl Default for StressTest {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for StressTest {
    fn name(&self) -> &str {
        "Stress Test"
    }

    fn setup(&mut self, ctx: &SynthContext) -> Result<(), VisualizationError> {
        self.width = ctx.width as f32;
        self.height = ctx.height as f32;
        log::debug!("Stress test with {} particles", self.particles.len());
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<(), VisualizationError> {
        self.time += dt;
        let time = self.time;
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.x += p.vx + (time * p.frequency).sin() * 0.5;
            p.y += p.vy + (time * p.frequency + i as f32 * 0.1).cos() * 0.5;
            bounce(&mut p.x, &mut p.vx, self.width);
            bounce(&mut p.y, &mut p.vy, self.height);
        }
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<bool, VisualizationError> {
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                if distance < CONNECT_DISTANCE {
                    let alpha = (255.0 * (1.0 - distance / CONNECT_DISTANCE)) as u8;
                    canvas.draw_line((a.x, a.y), (b.x, b.y), a.color(alpha), 1.0);
                }
            }
        }

        for p in &self.particles {
            let size = p.current_size(self.time);
            for s in (1..=size).rev() {
                let alpha = (255 * s / size) as u8;
                canvas.fill_circle((p.x, p.y), s as f32, p.color(alpha));
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_ranges() {
        let stress = StressTest::seeded(7);
        assert_eq!(stress.particles().len(), NUM_PARTICLES);
        for p in stress.particles() {
            assert!((0.0..SPAWN_WIDTH).contains(&p.x));
            assert!((0.0..SPAWN_HEIGHT).contains(&p.y));
            assert!((-2.0..2.0).contains(&p.vx));
            assert!((3..=15).contains(&p.size));
            assert!(p.color.iter().all(|&c| c >= 100));
        }
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let mut stress = StressTest::seeded(11);
        stress.setup(&SynthContext::new(200, 100)).unwrap();
        for _ in 0..500 {
            stress.update(1.0 / 30.0).unwrap();
            for p in stress.particles() {
                assert!((0.0..=200.0).contains(&p.x));
                assert!((0.0..=100.0).contains(&p.y));
            }
        }
    }

    #[test]
    fn test_bounce_reverses_velocity() {
        let (mut pos, mut vel) = (-3.0, -1.5);
        bounce(&mut pos, &mut vel, 10.0);
        assert_eq!((pos, vel), (0.0, 1.5));

        let (mut pos, mut vel) = (5.0, 1.0);
        bounce(&mut pos, &mut vel, 10.0);
        assert_eq!((pos, vel), (5.0, 1.0));
    }

    #[test]
    fn test_current_size_floor() {
        let p = Particle {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            size: 1,
            frequency: 1.0,
            amplitude: 10.0,
            color: [255, 255, 255],
        };
        // sin(-pi/2) * 3 = -3
        assert_eq!(p.current_size(-std::f32::consts::FRAC_PI_2), 1);
        assert_eq!(p.current_size(0.0), 1);
    }

    #[test]
    fn test_draw_lights_particle_centers() {
        let mut stress = StressTest::seeded(3);
        let mut canvas = Canvas::new(1280, 720);
        assert!(stress.draw(&mut canvas).unwrap());
        let p = &stress.particles()[0];
        let center = canvas.pixel(p.x as u32, p.y as u32).unwrap();
        assert_ne!(center, rgba(0, 0, 0, 255));
    }
}
