//! Global contrast operators: autocontrast and inversion.

use crate::types::GrayBuffer;

/// Fallback value when autocontrast receives a constant buffer.
pub const CONSTANT_INPUT_FALLBACK: f32 = 0.5;

/// Linearly rescale a scalar buffer so its global minimum maps to 0
/// and its global maximum maps to 1.
///
/// A constant buffer has no range to stretch; rather than divide by
/// zero, every pixel maps to [`CONSTANT_INPUT_FALLBACK`].
#[must_use = "returns the rescaled buffer"]
pub fn autocontrast(buffer: &GrayBuffer) -> GrayBuffer {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for &v in buffer.as_slice() {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    let range = max - min;
    if range == 0.0 {
        return GrayBuffer::filled(buffer.width(), buffer.height(), CONSTANT_INPUT_FALLBACK);
    }

    GrayBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        (buffer.get(x, y) - min) / range
    })
}

/// Invert a scalar buffer: `1 - v` per pixel.
#[must_use = "returns the inverted buffer"]
pub fn invert(buffer: &GrayBuffer) -> GrayBuffer {
    GrayBuffer::from_fn(buffer.width(), buffer.height(), |x, y| 1.0 - buffer.get(x, y))
}
