//! Linear blending between buffers.
//!
//! [`blend`] / [`blend_rgb`] are the single source of truth for linear
//! interpolation: the scheduler uses them mid-pipeline and the variant
//! cache uses them for every post-hoc slider recombination, so a
//! blended channel is always `a * (1 - t) + b * t` per component.

use crate::types::{GrayBuffer, PipelineError, Rgb, RgbBuffer, check_same_dimensions};

/// Scalar linear interpolation: `a * (1 - t) + b * t`.
///
/// Exact at the endpoints: `t = 0` returns `a` and `t = 1` returns `b`
/// bit-for-bit.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Component-wise linear interpolation of two RGB pixels.
#[inline]
#[must_use]
pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
    ]
}

/// Per-pixel linear blend of two scalar buffers.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the buffers differ
/// in size.
pub fn blend(a: &GrayBuffer, b: &GrayBuffer, t: f32) -> Result<GrayBuffer, PipelineError> {
    check_same_dimensions(a.dimensions(), b.dimensions())?;
    Ok(GrayBuffer::from_fn(a.width(), a.height(), |x, y| {
        lerp(a.get(x, y), b.get(x, y), t)
    }))
}

/// Per-pixel, per-channel linear blend of two RGB buffers.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the buffers differ
/// in size.
pub fn blend_rgb(a: &RgbBuffer, b: &RgbBuffer, t: f32) -> Result<RgbBuffer, PipelineError> {
    check_same_dimensions(a.dimensions(), b.dimensions())?;
    Ok(RgbBuffer::from_fn(a.width(), a.height(), |x, y| {
        lerp_rgb(a.get(x, y), b.get(x, y), t)
    }))
}

/// Per-pixel minimum of two scalar buffers.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if the buffers differ
/// in size.
pub fn pick_lowest(a: &GrayBuffer, b: &GrayBuffer) -> Result<GrayBuffer, PipelineError> {
    check_same_dimensions(a.dimensions(), b.dimensions())?;
    Ok(GrayBuffer::from_fn(a.width(), a.height(), |x, y| {
        a.get(x, y).min(b.get(x, y))
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, scale: f32) -> GrayBuffer {
        GrayBuffer::from_fn(width, height, |x, y| (y * width + x) as f32 * scale)
    }

    #[test]
    fn blend_at_zero_returns_first_exactly() {
        let a = gradient(4, 4, 0.05);
        let b = gradient(4, 4, 0.11);
        let blended = blend(&a, &b, 0.0).unwrap();
        assert_eq!(blended, a);
    }

    #[test]
    fn blend_at_one_returns_second_exactly() {
        let a = gradient(4, 4, 0.05);
        let b = gradient(4, 4, 0.11);
        let blended = blend(&a, &b, 1.0).unwrap();
        assert_eq!(blended, b);
    }

    #[test]
    fn blend_is_convex_combination() {
        let a = gradient(5, 5, 0.03);
        let b = gradient(5, 5, -0.07);
        for t in [0.1, 0.25, 0.5, 0.75, 0.9] {
            let blended = blend(&a, &b, t).unwrap();
            for ((&av, &bv), &v) in a
                .as_slice()
                .iter()
                .zip(b.as_slice())
                .zip(blended.as_slice())
            {
                let lo = av.min(bv);
                let hi = av.max(bv);
                assert!(
                    v >= lo - 1e-6 && v <= hi + 1e-6,
                    "blend({av}, {bv}, {t}) = {v} escapes [{lo}, {hi}]",
                );
            }
        }
    }

    #[test]
    fn blend_rgb_endpoints_are_exact() {
        let a = RgbBuffer::filled(3, 3, [0.1, 0.4, 0.9]);
        let b = RgbBuffer::filled(3, 3, [0.8, 0.2, 0.3]);
        assert_eq!(blend_rgb(&a, &b, 0.0).unwrap(), a);
        assert_eq!(blend_rgb(&a, &b, 1.0).unwrap(), b);
    }

    #[test]
    fn blend_rgb_is_componentwise_convex() {
        let a = RgbBuffer::filled(2, 2, [0.0, 1.0, 0.5]);
        let b = RgbBuffer::filled(2, 2, [1.0, 0.0, 0.5]);
        let mid = blend_rgb(&a, &b, 0.5).unwrap();
        for &[r, g, blue] in mid.as_slice() {
            assert!((r - 0.5).abs() < 1e-6);
            assert!((g - 0.5).abs() < 1e-6);
            assert!((blue - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn blend_rejects_mismatched_dimensions() {
        let a = GrayBuffer::filled(2, 2, 0.0);
        let b = GrayBuffer::filled(3, 2, 0.0);
        assert!(matches!(
            blend(&a, &b, 0.5),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn pick_lowest_takes_per_pixel_minimum() {
        let a = GrayBuffer::from_fn(2, 1, |x, _| if x == 0 { 0.2 } else { 0.9 });
        let b = GrayBuffer::from_fn(2, 1, |x, _| if x == 0 { 0.5 } else { 0.1 });
        let lowest = pick_lowest(&a, &b).unwrap();
        assert_eq!(lowest.as_slice(), &[0.2, 0.1]);
    }
}
