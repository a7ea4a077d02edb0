//! Surface-preserving blur.
//!
//! Averages each pixel with only those toroidal-window neighbors whose
//! every channel differs from the center pixel by less than a
//! threshold. Flat regions get smoothed while edges stay sharp, which
//! keeps derived height maps from bleeding across surface boundaries.
//!
//! Degenerate-input policy: if no neighbor qualifies the center pixel
//! is returned unchanged. In practice the center always qualifies
//! against itself, so the fallback only matters for pathological
//! thresholds (zero or negative).

use crate::types::{GrayBuffer, RgbBuffer};

/// Channel difference below which a neighbor qualifies for averaging.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Surface-blur a scalar buffer.
///
/// `radius` sets the square window side to `2 * radius + 1`;
/// `threshold` is the per-channel similarity gate.
#[must_use = "returns the blurred buffer"]
pub fn surface_blur(buffer: &GrayBuffer, radius: u32, threshold: f32) -> GrayBuffer {
    let r = i64::from(radius);
    GrayBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        let center = buffer.get(x, y);
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for dy in -r..=r {
            for dx in -r..=r {
                let sample = buffer.get_wrapped(i64::from(x) + dx, i64::from(y) + dy);
                if (sample - center).abs() < threshold {
                    sum += sample;
                    count += 1;
                }
            }
        }
        if count == 0 {
            center
        } else {
            sum / count as f32
        }
    })
}

/// Surface-blur an RGB buffer. A neighbor qualifies only when all
/// three channels are within `threshold` of the center pixel.
#[must_use = "returns the blurred buffer"]
pub fn surface_blur_rgb(buffer: &RgbBuffer, radius: u32, threshold: f32) -> RgbBuffer {
    let r = i64::from(radius);
    RgbBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        let center = buffer.get(x, y);
        let mut sum = [0.0f32; 3];
        let mut count = 0u32;
        for dy in -r..=r {
            for dx in -r..=r {
                let sample = buffer.get_wrapped(i64::from(x) + dx, i64::from(y) + dy);
                if (sample[0] - center[0]).abs() < threshold
                    && (sample[1] - center[1]).abs() < threshold
                    && (sample[2] - center[2]).abs() < threshold
                {
                    sum[0] += sample[0];
                    sum[1] += sample[1];
                    sum[2] += sample[2];
                    count += 1;
                }
            }
        }
        if count == 0 {
            center
        } else {
            let n = count as f32;
            [sum[0] / n, sum[1] / n, sum[2] / n]
        }
    })
}
