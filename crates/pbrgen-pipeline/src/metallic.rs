//! Metallic estimation from height and normals.
//!
//! Heuristic: bright, flat-facing areas of a surface tend to read as
//! metal. Per pixel the angle between straight-up `(0, 0, 1)` and the
//! half-decoded normal `(r - 0.5, g - 0.5, b)` is taken in degrees;
//! `90 - angle` scaled by the height value rewards elevated flat
//! pixels. The whole buffer is then autocontrast-stretched and shaped
//! with `lerp(v^2, 0, strength)`: `strength = 1` forces everything to
//! zero (a fully non-metal material), `strength = 0` keeps the
//! squared, contrast-stretched estimate.

use crate::blend::lerp;
use crate::contrast::autocontrast;
use crate::types::{GrayBuffer, PipelineError, RgbBuffer, check_same_dimensions};

/// Estimate a metallic map from a height buffer and an encoded normal
/// buffer.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the two buffers
/// differ in size.
pub fn metallic(
    height: &GrayBuffer,
    normal: &RgbBuffer,
    strength: f32,
) -> Result<GrayBuffer, PipelineError> {
    check_same_dimensions(height.dimensions(), normal.dimensions())?;

    let raw = GrayBuffer::from_fn(height.width(), height.height(), |x, y| {
        let [r, g, b] = normal.get(x, y);
        let angle = angle_from_up([r - 0.5, g - 0.5, b]);
        (90.0 - angle) * height.get(x, y)
    });

    let stretched = autocontrast(&raw);
    Ok(GrayBuffer::from_fn(height.width(), height.height(), |x, y| {
        let v = stretched.get(x, y);
        lerp(v * v, 0.0, strength)
    }))
}

/// Angle in degrees between `(0, 0, 1)` and `v`.
///
/// A zero-length vector has no direction; it reads as angle 0
/// (straight up) rather than NaN.
fn angle_from_up(v: [f32; 3]) -> f32 {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length == 0.0 {
        return 0.0;
    }
    (v[2] / length).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn angle_of_straight_up_is_zero() {
        assert!(angle_from_up([0.0, 0.0, 1.0]).abs() < 1e-4);
    }

    #[test]
    fn angle_of_horizontal_vector_is_ninety() {
        assert!((angle_from_up([1.0, 0.0, 0.0]) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn angle_of_zero_vector_falls_back_to_zero() {
        assert!(angle_from_up([0.0, 0.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn angle_is_length_invariant() {
        let a = angle_from_up([0.3, 0.4, 0.5]);
        let b = angle_from_up([0.6, 0.8, 1.0]);
        assert!((a - b).abs() < 1e-4);
    }

    #[test]
    fn full_strength_forces_zero() {
        let height = GrayBuffer::from_fn(4, 4, |x, y| (x + y) as f32 * 0.1);
        let normal = RgbBuffer::filled(4, 4, [0.5, 0.5, 1.0]);
        let result = metallic(&height, &normal, 1.0).unwrap();
        for &v in result.as_slice() {
            assert!(v.abs() < f32::EPSILON, "strength 1 must zero the buffer, got {v}");
        }
    }

    #[test]
    fn flat_normals_rank_by_height() {
        // All normals straight up: the estimate reduces to
        // autocontrast(90 * height) squared, so ordering follows height
        // and the extremes hit exactly 0 and 1.
        let height = GrayBuffer::from_fn(3, 1, |x, _| [0.2, 0.5, 0.8][x as usize]);
        let normal = RgbBuffer::filled(3, 1, [0.5, 0.5, 1.0]);
        let result = metallic(&height, &normal, 0.0).unwrap();
        let v = result.as_slice();
        assert!(v[0].abs() < 1e-6, "lowest height maps to 0, got {}", v[0]);
        assert!((v[2] - 1.0).abs() < 1e-6, "highest height maps to 1, got {}", v[2]);
        assert!(v[0] < v[1] && v[1] < v[2]);
    }

    #[test]
    fn tilted_normals_read_less_metallic() {
        // Same height, one tilted normal: the tilted pixel's angle term
        // shrinks its pre-contrast value, so after stretching it ends
        // below the flat pixels.
        let normal = RgbBuffer::from_fn(3, 1, |x, _| {
            if x == 1 {
                [0.9, 0.5, 0.6] // tilted
            } else {
                [0.5, 0.5, 1.0] // straight up
            }
        });
        let height = GrayBuffer::filled(3, 1, 0.8);
        let result = metallic(&height, &normal, 0.0).unwrap();
        let v = result.as_slice();
        assert!(v[1] < v[0], "tilted pixel should rank below flat ones");
        assert!((v[0] - v[2]).abs() < 1e-6, "identical pixels must agree");
    }

    #[test]
    fn constant_input_uses_autocontrast_fallback() {
        // Uniform height and normals: the internal autocontrast sees a
        // constant buffer and falls back to 0.5, so the result is
        // lerp(0.25, 0, strength).
        let height = GrayBuffer::filled(2, 2, 0.5);
        let normal = RgbBuffer::filled(2, 2, [0.5, 0.5, 1.0]);
        let half = metallic(&height, &normal, 0.5).unwrap();
        for &v in half.as_slice() {
            assert!((v - 0.125).abs() < 1e-6, "expected 0.125, got {v}");
        }
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let height = GrayBuffer::filled(2, 2, 0.5);
        let normal = RgbBuffer::filled(3, 2, [0.5, 0.5, 1.0]);
        assert!(matches!(
            metallic(&height, &normal, 0.0),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }
}
