//! The whole population of particles, the pointer, and the lines that join them together.

use glam::DVec2;
use rand::Rng;

use crate::canvas::{with_alpha, Canvas, Colour, Rgb, Stroke};
use crate::particle::Particle;
use crate::pointer::PointerState;

/// Default area of surface per particle. Bigger means a sparser field.
pub const DENSITY: f64 = 15_000.0;

/// Default distance below which 2 particles get a line drawn between them.
pub const LINK_RADIUS: f64 = 120.0;

/// All the config for the field.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Area of surface per particle.
    pub density: f64,
    /// Distance below which particles are linked.
    pub link_radius: f64,
    /// Opacity of a link between 2 particles that are right on top of each other.
    pub link_opacity: f64,
    /// Width of the lines between particles.
    pub link_width: f64,
    /// Distance within which the pointer pushes and links to particles.
    pub influence_radius: f64,
    /// Opacity of a link between the pointer and a particle right underneath it.
    pub pointer_link_opacity: f64,
    /// Width of the lines between the pointer and particles.
    pub pointer_link_width: f64,
    /// How far a particle right under the pointer gets pushed in a single tick.
    pub push_strength: f64,
    /// All the colours.
    pub colours: Colours,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            density: DENSITY,
            link_radius: LINK_RADIUS,
            link_opacity: 0.3,
            link_width: 0.5,
            influence_radius: crate::pointer::INFLUENCE_RADIUS,
            pointer_link_opacity: 0.6,
            pointer_link_width: 1.0,
            push_strength: crate::pointer::PUSH_STRENGTH,
            colours: Colours::default(),
        }
    }
}

/// The colours of everything in the field.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Colours {
    /// The dots.
    pub particle: Colour,
    /// The halo around the dots.
    pub glow: Colour,
    /// How far the halo reaches.
    pub glow_blur: f64,
    /// Lines between particles. The opacity depends on the distance between them.
    pub link: Rgb,
    /// Lines between the pointer and particles.
    pub pointer_link: Rgb,
}

impl Default for Colours {
    fn default() -> Self {
        Self {
            particle: (0.0, 212.0 / 255.0, 1.0, 0.8),
            glow: (0.0, 212.0 / 255.0, 1.0, 0.5),
            glow_blur: 10.0,
            link: (0.0, 212.0 / 255.0, 1.0),
            pointer_link: (0.0, 1.0, 136.0 / 255.0),
        }
    }
}

/// The opacity of a line between 2 points that are `distance` apart. Fully opaque (times the
/// `scale`) at 0 distance, fading linearly to nothing at the `radius`. `None` when the points are
/// too far apart to be linked.
#[must_use]
pub fn link_opacity(distance: f64, radius: f64, scale: f64) -> Option<f64> {
    (distance < radius).then(|| (1.0 - distance / radius) * scale)
}

/// How many particles fit on a surface of the given size.
#[must_use]
#[expect(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Float to int casts saturate, so degenerate surfaces just get no particles"
)]
pub fn population(width: f64, height: f64, density: f64) -> usize {
    if density <= 0.0 {
        return 0;
    }
    (width * height / density).floor() as usize
}

/// `ParticleField`
#[derive(Debug, Clone)]
pub struct ParticleField {
    /// The particles. Their order only matters for making the pairwise link checks deterministic.
    particles: Vec<Particle>,
    /// The size of the drawing surface.
    surface_size: DVec2,
    /// Where the pointer is, and how it affects particles.
    pointer: PointerState,
    /// Tunable constants.
    config: Config,
}

impl ParticleField {
    /// Instantiate an empty field. Nothing appears until it's initialised.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            particles: Vec::new(),
            surface_size: DVec2::ZERO,
            pointer: PointerState::new(config.influence_radius, config.push_strength),
            config,
        }
    }

    /// Replace the whole population with freshly randomised particles that fit a surface of the
    /// given size.
    pub fn initialize<R: Rng + ?Sized>(&mut self, width: f64, height: f64, rng: &mut R) {
        let count = population(width, height, self.config.density);
        self.surface_size = DVec2::new(width, height);
        self.particles = (0..count)
            .map(|_| Particle::random(rng, width, height))
            .collect();

        tracing::debug!("Field initialised with {count} particles for a {width}x{height} surface");
    }

    /// The backing surface changed size. This deliberately does NOT regenerate the particles:
    /// they keep bouncing off the edges of the surface they were created for.
    pub fn resize(&mut self, width: f64, height: f64) {
        tracing::trace!("Field resized to {width}x{height}, keeping existing particles");
        self.surface_size = DVec2::new(width, height);
    }

    /// Set where the pointer is, `None` when it has left the surface.
    pub fn set_pointer(&mut self, position: Option<DVec2>) {
        self.pointer.position = position;
    }

    /// Add a single particle to the field. For seeding a field by hand, with exact positions,
    /// rather than from a random source.
    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// All the particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The current size of the drawing surface.
    #[must_use]
    pub const fn surface_size(&self) -> DVec2 {
        self.surface_size
    }

    /// The pointer.
    #[must_use]
    pub const fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// The field's config.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// One animation frame: clear the surface, move and draw every particle, then draw all the
    /// links.
    ///
    /// Each particle is updated and then immediately drawn, before moving on to the next one.
    pub fn tick<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        canvas.clear();

        for particle in &mut self.particles {
            particle.update(&self.pointer);
            particle.draw(canvas, &self.config.colours);
        }

        self.connect(canvas);
    }

    /// Draw lines between every pair of particles that are close enough, and between the pointer
    /// and every particle near it.
    ///
    /// This compares every particle with every other particle, so it's O(n²). That's fine at the
    /// population sizes the density gives. A spatial grid would be the way to go for much bigger
    /// fields.
    pub fn connect<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for (index, particle) in self.particles.iter().enumerate() {
            for other in self.particles.iter().skip(index + 1) {
                let distance = particle.position.distance(other.position);
                let Some(opacity) =
                    link_opacity(distance, self.config.link_radius, self.config.link_opacity)
                else {
                    continue;
                };

                canvas.stroke_line(
                    particle.position,
                    other.position,
                    Stroke::new(
                        with_alpha(self.config.colours.link, opacity),
                        self.config.link_width,
                    ),
                );
            }
        }

        let Some(pointer) = self.pointer.position else {
            return;
        };

        for particle in &self.particles {
            let Some(distance) = self.pointer.distance_within_influence(particle.position) else {
                continue;
            };
            let Some(opacity) = link_opacity(
                distance,
                self.pointer.influence_radius,
                self.config.pointer_link_opacity,
            ) else {
                continue;
            };

            canvas.stroke_line(
                pointer,
                particle.position,
                Stroke::new(
                    with_alpha(self.config.colours.pointer_link, opacity),
                    self.config.pointer_link_width,
                ),
            );
        }
    }
}

#[cfg(test)]
#[expect(clippy::indexing_slicing, reason = "Tests aren't so strict")]
mod test {
    use rand::SeedableRng as _;

    use super::*;

    fn field() -> ParticleField {
        ParticleField::new(Config::default())
    }

    #[test]
    fn population_is_area_over_density() {
        assert_eq!(population(0.0, 0.0, DENSITY), 0);
        assert_eq!(population(100.0, 100.0, DENSITY), 0);
        assert_eq!(population(150.0, 100.0, DENSITY), 1);
        assert_eq!(population(1920.0, 1080.0, DENSITY), 138);
        assert_eq!(population(1920.0, 1080.0, 0.0), 0);
    }

    #[test]
    fn initialise_fills_the_surface() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut field = field();
        field.initialize(800.0, 600.0, &mut rng);
        assert_eq!(field.particles().len(), 32);
        assert_eq!(field.surface_size(), DVec2::new(800.0, 600.0));
        for particle in field.particles() {
            assert_eq!(particle.bounds, DVec2::new(800.0, 600.0));
        }
    }

    #[test]
    fn initialise_replaces_the_whole_population() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut field = field();
        field.initialize(800.0, 600.0, &mut rng);
        field.initialize(400.0, 300.0, &mut rng);
        assert_eq!(field.particles().len(), 8);
        assert_eq!(field.particles()[0].bounds, DVec2::new(400.0, 300.0));
    }

    #[test]
    fn link_opacity_fades_to_nothing() {
        assert_eq!(link_opacity(0.0, 120.0, 0.3), Some(0.3));
        assert_eq!(link_opacity(60.0, 120.0, 0.3), Some(0.15));
        assert_eq!(link_opacity(120.0, 120.0, 0.3), None);
        assert_eq!(link_opacity(500.0, 120.0, 0.3), None);
    }

    #[test]
    fn pointer_config_is_applied() {
        let config = Config {
            influence_radius: 42.0,
            push_strength: 7.0,
            ..Config::default()
        };
        let mut field = ParticleField::new(config);
        assert_eq!(field.pointer().influence_radius, 42.0);
        assert_eq!(field.pointer().push_strength, 7.0);
        assert!(!field.pointer().is_present());

        field.set_pointer(Some(DVec2::new(1.0, 2.0)));
        assert_eq!(field.pointer().position, Some(DVec2::new(1.0, 2.0)));
        field.set_pointer(None);
        assert!(!field.pointer().is_present());
    }
}
