//! A raster of true colour pixels that can be rendered to a terminal.
//!
//! Pixels are half a terminal cell tall, because 2 "pixels" fit in a single TTY cell using the
//! UTF8 half-block trick: ▀▄▀▄. Particle coordinates are in "logical" units, where one pixel is
//! `scale` units wide and tall. That keeps all the simulation's distances (link radius, pointer
//! influence, etc) independent of how big a terminal pixel happens to be.

use glam::DVec2;
use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Position as TermwizPosition;

use crate::blender;
use crate::canvas::{Canvas, Colour, Glow, Stroke};

/// `Surface`
#[derive(Clone, Debug)]
pub struct Surface {
    /// The terminal's width in columns. Also the width in pixels.
    pub width: usize,
    /// The terminal's height in rows. There are twice as many pixel rows.
    pub height: usize,
    /// How many logical units make up one pixel.
    pub scale: f64,
    /// Every pixel, row by row.
    pixels: Vec<Colour>,
}

/// Convert a logical coordinate to a pixel index. Anything negative or out of range gets clipped
/// later on.
#[expect(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    reason = "Float to int casts saturate, and out-of-range pixels are clipped anyway"
)]
fn to_pixel(value: f64) -> isize {
    value.floor() as isize
}

/// Convert a pixel index back to the float domain.
#[expect(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    reason = "Terminals are never big enough to lose precision"
)]
fn to_float(value: isize) -> f64 {
    value as f64
}

impl Surface {
    /// Create a surface the size of a terminal.
    #[must_use]
    pub fn new(width: usize, height: usize, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            pixels: vec![blender::TRANSPARENT; width * height * 2],
        }
    }

    /// The number of pixel rows.
    #[must_use]
    pub const fn pixel_height(&self) -> usize {
        self.height * 2
    }

    /// Change the size of the backing raster. Everything on it is erased.
    pub fn resize(&mut self, width: usize, height: usize) {
        tracing::debug!("Resizing surface to {width}x{height}");
        self.width = width;
        self.height = height;
        self.pixels = vec![blender::TRANSPARENT; width * height * 2];
    }

    /// The logical coordinates at the centre of a terminal cell. The centre of a cell is the
    /// border between its upper and lower pixels.
    #[must_use]
    pub fn cell_centre(&self, column: u16, row: u16) -> DVec2 {
        DVec2::new(
            (f64::from(column) + 0.5) * self.scale,
            (f64::from(row) * 2.0 + 1.0) * self.scale,
        )
    }

    /// The colour of a pixel, if there is one there.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width || y >= self.pixel_height() {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Composite a colour onto a pixel. Coordinates outside the surface are silently ignored,
    /// particles are allowed to drift slightly off the edge.
    fn blend_pixel(&mut self, x: isize, y: isize, colour: Colour) {
        let (Ok(x_usize), Ok(y_usize)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x_usize >= self.width || y_usize >= self.pixel_height() {
            return;
        }

        let index = y_usize * self.width + x_usize;
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = blender::over(colour, *pixel);
        }
    }

    /// The logical coordinates at the centre of a pixel.
    fn pixel_centre(&self, x: isize, y: isize) -> DVec2 {
        DVec2::new(
            (to_float(x) + 0.5) * self.scale,
            (to_float(y) + 0.5) * self.scale,
        )
    }

    /// Convert the pixels into terminal cells.
    ///
    /// The rule is that we default to rendering any pair of colours using the upper half block.
    /// Therefore the upper "pixel" is rendered with the cell's foreground and the lower "pixel"
    /// is rendered with the cell's background colour.
    ///
    /// However, there is one edge case that requires this to be inverted: when an empty cell
    /// needs a pixel in the lower half. It is impossible to do this with an upper half block
    /// *whilst retaining the ANSI-coded default background colour*.
    #[must_use]
    pub fn to_termwiz(&self) -> termwiz::surface::Surface {
        let mut frame = termwiz::surface::Surface::new(self.width, self.height);

        for row in 0..self.height {
            for column in 0..self.width {
                let upper = self
                    .pixel(column, row * 2)
                    .filter(|colour| blender::is_visible(*colour));
                let lower = self
                    .pixel(column, row * 2 + 1)
                    .filter(|colour| blender::is_visible(*colour));

                let (character, foreground, background) = match (upper, lower) {
                    (None, None) => continue,
                    (Some(upper_colour), None) => {
                        ("▀", upper_colour, Self::make_default_bg_colour())
                    }
                    (None, Some(lower_colour)) => {
                        ("▄", lower_colour, Self::make_default_bg_colour())
                    }
                    (Some(upper_colour), Some(lower_colour)) => (
                        "▀",
                        upper_colour,
                        Self::make_bg_colour(blender::flatten(
                            lower_colour,
                            blender::DEFAULT_BACKGROUND,
                        )),
                    ),
                };

                frame.add_changes(vec![
                    TermwizChange::CursorPosition {
                        x: TermwizPosition::Absolute(column),
                        y: TermwizPosition::Absolute(row),
                    },
                    Self::make_fg_colour(blender::flatten(
                        foreground,
                        blender::DEFAULT_BACKGROUND,
                    )),
                    background,
                ]);
                frame.add_change(character);
            }
        }

        frame
    }

    /// Make a Termwiz colour attribute
    #[must_use]
    pub const fn make_colour_attribute(colour: Colour) -> termwiz::color::ColorAttribute {
        termwiz::color::ColorAttribute::TrueColorWithDefaultFallback(termwiz::color::SrgbaTuple(
            colour.0, colour.1, colour.2, colour.3,
        ))
    }

    /// Make a Termwiz background colour
    #[must_use]
    pub const fn make_bg_colour(colour: Colour) -> TermwizChange {
        let colour_attribute = Self::make_colour_attribute(colour);
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(colour_attribute))
    }

    /// Make the default Termwiz background colour. This is the non-colour, usually black, that a
    /// terminal displays when nothing else has been set. It's often what's used on a GUI terminal
    /// to make its background transparent.
    #[must_use]
    pub const fn make_default_bg_colour() -> TermwizChange {
        let colour_attribute = termwiz::color::ColorAttribute::Default;
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(colour_attribute))
    }

    /// Make a Termwiz foreground colour
    #[must_use]
    pub const fn make_fg_colour(colour: Colour) -> TermwizChange {
        let colour_attribute = Self::make_colour_attribute(colour);
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Foreground(colour_attribute))
    }
}

impl Canvas for Surface {
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Terminals are never big enough to lose precision"
    )]
    fn dimensions(&self) -> DVec2 {
        DVec2::new(
            self.width as f64 * self.scale,
            self.pixel_height() as f64 * self.scale,
        )
    }

    fn clear(&mut self) {
        self.pixels.fill(blender::TRANSPARENT);
    }

    /// A simple DDA line. Lines thinner than a pixel are still a whole pixel wide.
    fn stroke_line(&mut self, from: DVec2, to: DVec2, stroke: Stroke) {
        let start = from / self.scale;
        let end = to / self.scale;
        let delta = end - start;

        let steps = to_pixel(delta.x.abs().max(delta.y.abs()).ceil()).max(1);
        let thickness = to_pixel((stroke.width / self.scale).round()).max(1);
        let offset = thickness / 2;

        let mut previous = None;
        for step in 0..=steps {
            let point = start + delta * (to_float(step) / to_float(steps));
            let pixel = (to_pixel(point.x), to_pixel(point.y));
            if previous == Some(pixel) {
                continue;
            }
            previous = Some(pixel);

            for brush_y in 0..thickness {
                for brush_x in 0..thickness {
                    self.blend_pixel(
                        pixel.0 + brush_x - offset,
                        pixel.1 + brush_y - offset,
                        stroke.colour,
                    );
                }
            }
        }
    }

    /// Every pixel whose centre is inside the circle gets the full colour. A circle smaller than
    /// a pixel still paints the pixel its centre is in. The glow fades linearly from the edge of
    /// the circle out to the extent of its blur.
    fn fill_circle(&mut self, centre: DVec2, radius: f64, colour: Colour, glow: Option<Glow>) {
        let reach = radius + glow.map_or(0.0, |halo| halo.blur);
        let top_left = (
            to_pixel((centre.x - reach) / self.scale),
            to_pixel((centre.y - reach) / self.scale),
        );
        let bottom_right = (
            to_pixel((centre.x + reach) / self.scale),
            to_pixel((centre.y + reach) / self.scale),
        );
        let centre_pixel = (
            to_pixel(centre.x / self.scale),
            to_pixel(centre.y / self.scale),
        );

        for y in top_left.1..=bottom_right.1 {
            for x in top_left.0..=bottom_right.0 {
                let distance = self.pixel_centre(x, y).distance(centre);
                if distance <= radius || (x, y) == centre_pixel {
                    self.blend_pixel(x, y, colour);
                    continue;
                }

                let Some(halo) = glow else {
                    continue;
                };
                if halo.blur <= 0.0 || distance >= radius + halo.blur {
                    continue;
                }

                let falloff = 1.0 - (distance - radius) / halo.blur;
                let alpha = f64::from(halo.colour.3) * falloff;
                let halo_colour = crate::canvas::with_alpha(
                    (halo.colour.0, halo.colour.1, halo.colour.2),
                    alpha,
                );
                self.blend_pixel(x, y, halo_colour);
            }
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    clippy::float_cmp,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;

    const WHITE: Colour = (1.0, 1.0, 1.0, 1.0);
    const RED: Colour = (1.0, 0.0, 0.0, 1.0);

    fn count_lit(surface: &Surface) -> usize {
        let mut count = 0;
        for y in 0..surface.pixel_height() {
            for x in 0..surface.width {
                if surface.pixel(x, y).is_some_and(blender::is_visible) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn dimensions_are_in_logical_units() {
        let surface = Surface::new(10, 5, 8.0);
        assert_eq!(surface.dimensions(), DVec2::new(80.0, 80.0));
    }

    #[test]
    fn tiny_circles_still_paint_a_pixel() {
        let mut surface = Surface::new(4, 2, 8.0);
        surface.fill_circle(DVec2::new(12.0, 20.0), 0.5, WHITE, None);
        assert_eq!(surface.pixel(1, 2), Some(WHITE));
        assert_eq!(count_lit(&surface), 1);
    }

    #[test]
    fn glow_fades_around_the_circle() {
        let mut surface = Surface::new(10, 5, 1.0);
        let glow = Glow::new(3.0, (1.0, 1.0, 1.0, 0.5));
        surface.fill_circle(DVec2::new(5.5, 5.5), 0.5, WHITE, Some(glow));

        assert_eq!(surface.pixel(5, 5), Some(WHITE));
        let near = surface.pixel(6, 5).unwrap();
        let far = surface.pixel(8, 5).unwrap();
        assert!(near.3 > far.3);
        assert!(near.3 < 1.0);
        assert_eq!(surface.pixel(9, 5), Some(blender::TRANSPARENT));
    }

    #[test]
    fn drawing_off_the_edge_is_clipped() {
        let mut surface = Surface::new(2, 1, 1.0);
        surface.fill_circle(DVec2::new(-5.0, -5.0), 1.0, WHITE, None);
        surface.stroke_line(DVec2::new(-10.0, 0.5), DVec2::new(10.0, 0.5), Stroke::new(RED, 1.0));
        assert_eq!(count_lit(&surface), 2);
    }

    #[test]
    fn horizontal_lines_paint_every_pixel_between_their_ends() {
        let mut surface = Surface::new(10, 1, 1.0);
        surface.stroke_line(
            DVec2::new(1.5, 0.5),
            DVec2::new(6.5, 0.5),
            Stroke::new(RED, 0.5),
        );
        for x in 1..=6 {
            assert_eq!(surface.pixel(x, 0), Some(RED));
        }
        assert_eq!(count_lit(&surface), 6);
    }

    #[test]
    fn clearing_erases_everything() {
        let mut surface = Surface::new(3, 3, 1.0);
        surface.fill_circle(DVec2::new(1.5, 1.5), 2.0, WHITE, None);
        assert!(count_lit(&surface) > 0);
        surface.clear();
        assert_eq!(count_lit(&surface), 0);
    }

    #[test]
    fn resizing_changes_the_raster() {
        let mut surface = Surface::new(3, 3, 2.0);
        surface.resize(4, 1);
        assert_eq!(surface.pixel_height(), 2);
        assert!(surface.pixel(3, 1).is_some());
        assert!(surface.pixel(4, 1).is_none());
        assert_eq!(surface.dimensions(), DVec2::new(8.0, 4.0));
    }

    #[test]
    fn cells_with_only_an_upper_pixel() {
        let mut surface = Surface::new(2, 1, 1.0);
        surface.fill_circle(DVec2::new(0.5, 0.5), 0.1, WHITE, None);
        let mut frame = surface.to_termwiz();
        let cells = frame.screen_cells();
        let cell = &cells[0][0];
        assert_eq!(cell.str(), "▀");
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(WHITE)
        );
        assert_eq!(
            cell.attrs().background(),
            termwiz::color::ColorAttribute::Default
        );
        assert_eq!(cells[0][1].str(), " ");
    }

    #[test]
    fn cells_with_only_a_lower_pixel() {
        let mut surface = Surface::new(1, 1, 1.0);
        surface.fill_circle(DVec2::new(0.5, 1.5), 0.1, RED, None);
        let mut frame = surface.to_termwiz();
        let cell = &frame.screen_cells()[0][0];
        assert_eq!(cell.str(), "▄");
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(RED)
        );
        assert_eq!(
            cell.attrs().background(),
            termwiz::color::ColorAttribute::Default
        );
    }

    #[test]
    fn cells_with_both_pixels() {
        let mut surface = Surface::new(1, 1, 1.0);
        surface.fill_circle(DVec2::new(0.5, 0.5), 0.1, RED, None);
        surface.fill_circle(DVec2::new(0.5, 1.5), 0.1, WHITE, None);
        let mut frame = surface.to_termwiz();
        let cell = &frame.screen_cells()[0][0];
        assert_eq!(cell.str(), "▀");
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(RED)
        );
        assert_eq!(
            cell.attrs().background(),
            Surface::make_colour_attribute(WHITE)
        );
    }

    #[test]
    fn cell_centres() {
        let surface = Surface::new(10, 10, 4.0);
        assert_eq!(surface.cell_centre(0, 0), DVec2::new(2.0, 4.0));
        assert_eq!(surface.cell_centre(3, 2), DVec2::new(14.0, 20.0));
    }
}
