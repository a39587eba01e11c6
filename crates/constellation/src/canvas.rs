//! The drawing surface that the particle field renders into. Everything the simulation draws
//! goes through the [`Canvas`] trait, so the field itself never knows whether it's painting a
//! terminal, an image or a test recorder.

use glam::DVec2;

/// An RGBA colour. All channels are in the range `0.0..=1.0`.
pub type Colour = (f32, f32, f32, f32);

/// An RGB colour, for when the alpha channel is calculated at draw time.
pub type Rgb = (f32, f32, f32);

/// Add an alpha channel to an RGB colour.
#[must_use]
#[expect(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    reason = "Opacities are always in the range 0.0..=1.0"
)]
pub fn with_alpha(rgb: Rgb, alpha: f64) -> Colour {
    (rgb.0, rgb.1, rgb.2, alpha.clamp(0.0, 1.0) as f32)
}

/// A soft halo painted around a filled shape.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Glow {
    /// How far the halo reaches beyond the edge of the shape.
    pub blur: f64,
    /// The colour of the halo at the edge of the shape. It fades linearly to nothing at the
    /// extent of the blur.
    pub colour: Colour,
}

impl Glow {
    /// Instantiate
    #[must_use]
    pub const fn new(blur: f64, colour: Colour) -> Self {
        Self { blur, colour }
    }
}

/// The style of a stroked line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Stroke {
    /// Line colour, including its opacity.
    pub colour: Colour,
    /// Line width in surface units.
    pub width: f64,
}

impl Stroke {
    /// Instantiate
    #[must_use]
    pub const fn new(colour: Colour, width: f64) -> Self {
        Self { colour, width }
    }
}

/// A 2D drawing target, measured in the same units as particle positions.
///
/// None of these operations can fail. Anything drawn outside the surface is clipped.
pub trait Canvas {
    /// The current width and height of the surface.
    fn dimensions(&self) -> DVec2;

    /// Erase everything.
    fn clear(&mut self);

    /// Draw a straight line between two points.
    fn stroke_line(&mut self, from: DVec2, to: DVec2, stroke: Stroke);

    /// Fill a circle. The glow only applies to this one call, it never carries over onto
    /// subsequent draws.
    fn fill_circle(&mut self, centre: DVec2, radius: f64, colour: Colour, glow: Option<Glow>);
}
