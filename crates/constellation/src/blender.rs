//! A central place for all the colour compositing needed when lots of translucent dots, halos and
//! lines get painted over each other.

use palette::blend::Compose as _;

use crate::canvas::Colour;

/// The colour that a "blank" pixel is flattened onto. Most terminals use a dark theme, so when
/// alpha blending, let's say that the default colour is pure black.
/// TODO: support light theme terminals by reading the terminal's actual background colour.
pub const DEFAULT_BACKGROUND: Colour = (0.0, 0.0, 0.0, 1.0);

/// A completely transparent pixel.
pub const TRANSPARENT: Colour = (0.0, 0.0, 0.0, 0.0);

/// Convert to `palette`'s linear light representation, which is where compositing should happen.
fn to_linear(colour: Colour) -> palette::LinSrgba {
    palette::Srgba::new(colour.0, colour.1, colour.2, colour.3).into_linear()
}

/// Convert back from linear light into plain sRGB.
fn from_linear(colour: palette::LinSrgba) -> Colour {
    let srgba = palette::Srgba::from_linear(colour);
    (srgba.red, srgba.green, srgba.blue, srgba.alpha)
}

/// Composite a colour on top of another, the Porter-Duff "over" operator.
#[must_use]
pub fn over(above: Colour, below: Colour) -> Colour {
    if above.3 <= 0.0 {
        return below;
    }
    if above.3 >= 1.0 {
        return above;
    }

    from_linear(to_linear(above).over(to_linear(below)))
}

/// Whether a pixel has had anything painted onto it.
#[must_use]
pub fn is_visible(colour: Colour) -> bool {
    colour.3 > 0.0
}

/// Flatten a translucent pixel onto the background so that it can be sent to a terminal. Terminals
/// ignore alpha, so the result is always fully opaque.
#[must_use]
pub fn flatten(colour: Colour, background: Colour) -> Colour {
    let flattened = over(colour, background);
    (flattened.0, flattened.1, flattened.2, 1.0)
}
