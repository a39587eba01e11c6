//! A single drifting dot.

use glam::DVec2;
use rand::Rng;

use crate::canvas::{Canvas, Glow};
use crate::pointer::PointerState;

/// `Particle`
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Particle {
    /// Current coordinates on the surface.
    pub position: DVec2,
    /// Heading, each component in the range `-1.0..=1.0`. Only its signs ever change, when the
    /// particle bounces off an edge.
    pub direction: DVec2,
    /// How far along its direction the particle moves each tick.
    pub speed: f64,
    /// Size of the dot.
    pub radius: f64,
    /// The width and height of the surface at the time the particle was created. These are NOT
    /// updated when the surface resizes, so after a shrink a particle can wander outside the
    /// visible area until it bounces off its original edge.
    pub bounds: DVec2,
}

impl Particle {
    /// Instantiate
    #[must_use]
    pub const fn new(
        position: DVec2,
        direction: DVec2,
        speed: f64,
        radius: f64,
        bounds: DVec2,
    ) -> Self {
        Self {
            position,
            direction,
            speed,
            radius,
            bounds,
        }
    }

    /// Create a particle somewhere on a surface of the given size, heading off in a random
    /// direction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f64, height: f64) -> Self {
        let position = DVec2::new(rng.gen::<f64>() * width, rng.gen::<f64>() * height);
        let direction = DVec2::new(rng.gen::<f64>() * 2.0 - 1.0, rng.gen::<f64>() * 2.0 - 1.0);
        let speed = rng.gen::<f64>() * 0.5 + 0.2;
        let radius = rng.gen::<f64>() * 2.0 + 0.5;

        Self::new(
            position,
            direction,
            speed,
            radius,
            DVec2::new(width, height),
        )
    }

    /// Advance one tick.
    ///
    /// Reflection only flips the direction, it doesn't pull an overshooting particle back inside.
    /// So for one tick a particle can be slightly over the edge.
    pub fn update(&mut self, pointer: &PointerState) {
        self.position += self.direction * self.speed;

        if self.position.x >= self.bounds.x || self.position.x <= 0.0 {
            self.direction.x = -self.direction.x;
        }
        if self.position.y >= self.bounds.y || self.position.y <= 0.0 {
            self.direction.y = -self.direction.y;
        }

        self.position += pointer.repulsion(self.position);
    }

    /// Render the dot, then render it again with a soft halo.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, colours: &crate::field::Colours) {
        canvas.fill_circle(self.position, self.radius, colours.particle, None);
        canvas.fill_circle(
            self.position,
            self.radius,
            colours.particle,
            Some(Glow::new(colours.glow_blur, colours.glow)),
        );
    }
}
