//! Ambient occlusion estimation from a height field.
//!
//! A pixel is occluded when it sits below the average height of its
//! surroundings. The window average is taken over the toroidal window
//! `[-spread, spread)` on both axes -- half-open on the high side, a
//! `2*spread x 2*spread` window whose center of mass sits half a pixel
//! up-left of the pixel. The asymmetry is kept deliberately for parity
//! with the established output of this operator.
//!
//! Result: `clamp01((center - window_average) * 4 + 0.9)`, so a flat
//! field reads 0.9 (mostly unoccluded) and pits darken toward 0.

use crate::types::GrayBuffer;

/// Baseline occlusion value for a perfectly flat field.
pub const FLAT_FIELD_VALUE: f32 = 0.9;

/// Estimate ambient occlusion for every pixel of a height buffer.
///
/// `spread` is the window half-size; a `spread` of 0 yields an empty
/// window and falls back to the center height (reading as flat).
#[must_use = "returns the occlusion buffer"]
pub fn occlusion(height: &GrayBuffer, spread: u32) -> GrayBuffer {
    let s = i64::from(spread);
    GrayBuffer::from_fn(height.width(), height.height(), |x, y| {
        let center = height.get(x, y);

        let mut sum = 0.0f32;
        let mut count = 0u32;
        // Half-open bounds: the high edge is excluded on both axes.
        for dx in -s..s {
            for dy in -s..s {
                sum += height.get_wrapped(i64::from(x) + dx, i64::from(y) + dy);
                count += 1;
            }
        }

        let average = if count == 0 { center } else { sum / count as f32 };
        ((center - average) * 4.0 + FLAT_FIELD_VALUE).clamp(0.0, 1.0)
    })
}
