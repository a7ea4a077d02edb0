//! Normal-map extraction from a height field.
//!
//! Two stages. Stage 1 runs a Sobel-like gradient over the 3x3
//! toroidal neighborhood of every pixel and normalizes the resulting
//! vector, with the Z component controlled by `flatness` (larger
//! values tilt normals toward straight-up, flattening the relief).
//! Stage 2 smooths the stage-1 normals with a surface blur that is
//! *guided by the height field*: neighbors qualify by height
//! similarity (threshold 0.2) but it is their normals that get
//! averaged, so smoothing never crosses a height discontinuity.
//!
//! Normals are stored in the usual tangent-space encoding
//! `(n + 1) / 2` per component.

use crate::types::{GrayBuffer, Rgb, RgbBuffer};

/// Height-similarity gate for the guided smoothing pass.
const SMOOTH_THRESHOLD: f32 = 0.2;

/// Extract an encoded normal map from a height buffer.
///
/// `smooth_radius` sets the guided-smoothing window (`0` disables
/// smoothing in effect: the window degenerates to the center pixel);
/// `flatness` biases gradients toward the surface normal.
#[must_use = "returns the encoded normal map"]
pub fn normal_map(height: &GrayBuffer, smooth_radius: u32, flatness: f32) -> RgbBuffer {
    let initial = gradient_normals(height, flatness);
    smooth_by_height(&initial, height, smooth_radius)
}

/// Stage 1: per-pixel Sobel-like gradient, normalized and encoded.
fn gradient_normals(height: &GrayBuffer, flatness: f32) -> RgbBuffer {
    let mut n = [0.0f32; 9];
    RgbBuffer::from_fn(height.width(), height.height(), |x, y| {
        let mut i = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                n[i] = height.get_wrapped(i64::from(x) + dx, i64::from(y) + dy);
                i += 1;
            }
        }

        let gx = -5.0 * (n[2] - n[0] + 2.0 * (n[5] - n[3]) + n[8] - n[6]);
        let gy = -5.0 * (n[6] - n[0] + 2.0 * (n[7] - n[1]) + n[8] - n[2]);
        let gz = flatness - height.get(x, y);

        encode(normalize([gx, gy, gz]))
    })
}

/// Stage 2: average stage-1 normals over neighbors whose *height* is
/// within [`SMOOTH_THRESHOLD`] of the center height.
///
/// Matches the surface-blur qualifying rule, but the compare channel
/// (height) and the averaged channel (normal) differ, so this is
/// implemented independently of `surface_blur`.
fn smooth_by_height(normals: &RgbBuffer, height: &GrayBuffer, radius: u32) -> RgbBuffer {
    let r = i64::from(radius);
    RgbBuffer::from_fn(normals.width(), normals.height(), |x, y| {
        let center_height = height.get(x, y);
        let mut sum = [0.0f32; 3];
        let mut count = 0u32;
        for dy in -r..=r {
            for dx in -r..=r {
                let sx = i64::from(x) + dx;
                let sy = i64::from(y) + dy;
                if (height.get_wrapped(sx, sy) - center_height).abs() < SMOOTH_THRESHOLD {
                    let normal = normals.get_wrapped(sx, sy);
                    sum[0] += normal[0];
                    sum[1] += normal[1];
                    sum[2] += normal[2];
                    count += 1;
                }
            }
        }
        if count == 0 {
            normals.get(x, y)
        } else {
            let n = count as f32;
            [sum[0] / n, sum[1] / n, sum[2] / n]
        }
    })
}

/// Normalize a vector to unit length; a zero vector becomes straight-up
/// `(0, 0, 1)` rather than NaN.
fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length == 0.0 {
        [0.0, 0.0, 1.0]
    } else {
        [v[0] / length, v[1] / length, v[2] / length]
    }
}

/// Map a unit-vector component from [-1, 1] to the [0, 1] encoding.
#[inline]
fn encode(n: [f32; 3]) -> Rgb {
    [(n[0] + 1.0) / 2.0, (n[1] + 1.0) / 2.0, (n[2] + 1.0) / 2.0]
}
