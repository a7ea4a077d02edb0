//! Toroidal median filter for noise removal.
//!
//! For every pixel, the 5x5 toroidal neighborhood (25 samples, the
//! pixel itself included) is ranked -- by value for scalar buffers, by
//! RGB channel sum for color buffers -- and the middle element (rank
//! 13, index 12) is taken. The output is a linear interpolation between
//! the original pixel and that median by `strength`, so `strength = 0`
//! is the exact identity and `strength = 1` is full median replacement.

use crate::blend::{lerp, lerp_rgb};
use crate::types::{GrayBuffer, Rgb, RgbBuffer};

/// Filter window radius. The window is `2 * RADIUS + 1` pixels square.
const RADIUS: i64 = 2;

/// Index of the median in the sorted 25-sample window.
const MEDIAN_INDEX: usize = 12;

/// Median-filter a scalar buffer, interpolated by `strength`.
#[must_use = "returns the filtered buffer"]
pub fn median_filter(buffer: &GrayBuffer, strength: f32) -> GrayBuffer {
    let mut neighbors = [0.0f32; 25];
    GrayBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        let mut i = 0;
        for dy in -RADIUS..=RADIUS {
            for dx in -RADIUS..=RADIUS {
                neighbors[i] = buffer.get_wrapped(i64::from(x) + dx, i64::from(y) + dy);
                i += 1;
            }
        }
        neighbors.sort_unstable_by(f32::total_cmp);
        lerp(buffer.get(x, y), neighbors[MEDIAN_INDEX], strength)
    })
}

/// Median-filter an RGB buffer, ranking pixels by channel sum.
#[must_use = "returns the filtered buffer"]
pub fn median_filter_rgb(buffer: &RgbBuffer, strength: f32) -> RgbBuffer {
    let mut neighbors = [[0.0f32; 3]; 25];
    RgbBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        let mut i = 0;
        for dy in -RADIUS..=RADIUS {
            for dx in -RADIUS..=RADIUS {
                neighbors[i] = buffer.get_wrapped(i64::from(x) + dx, i64::from(y) + dy);
                i += 1;
            }
        }
        neighbors.sort_unstable_by(|a, b| channel_sum(*a).total_cmp(&channel_sum(*b)));
        lerp_rgb(buffer.get(x, y), neighbors[MEDIAN_INDEX], strength)
    })
}

#[inline]
fn channel_sum(pixel: Rgb) -> f32 {
    pixel[0] + pixel[1] + pixel[2]
}
