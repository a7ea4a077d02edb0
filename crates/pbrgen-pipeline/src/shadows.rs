//! Shadow and highlight suppression.
//!
//! Baked-in lighting is the main obstacle to reusing a photo as an
//! albedo map. This operator flattens it: pixels brighter than the
//! highlight band get darkened, pixels darker than the shadow band get
//! brightened, and the mid-band passes through untouched.

use crate::types::RgbBuffer;

/// Luminance above which a pixel counts as a highlight.
pub const HIGHLIGHT_BAND: f32 = 0.7;

/// Luminance below which a pixel counts as a shadow.
pub const SHADOW_BAND: f32 = 0.3;

/// Suppress shadows and highlights in an RGB buffer.
///
/// Per pixel, with luminance `L = (r + g + b) / 3`: if `L > 0.7` the
/// excess `(L - 0.7) * strength` is subtracted from every channel; if
/// `L < 0.3` the (negative) deficit `(L - 0.3) * strength` is
/// subtracted, brightening the pixel. `strength = 0` is the identity.
#[must_use = "returns the corrected buffer"]
pub fn remove_shadow_highlight(buffer: &RgbBuffer, strength: f32) -> RgbBuffer {
    RgbBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        let [r, g, b] = buffer.get(x, y);
        let luminance = (r + g + b) / 3.0;

        let mut correction = 0.0;
        if luminance > HIGHLIGHT_BAND {
            correction = luminance - HIGHLIGHT_BAND;
        }
        if luminance < SHADOW_BAND {
            correction = luminance - SHADOW_BAND;
        }
        correction *= strength;

        [r - correction, g - correction, b - correction]
    })
}
