//! Grayscale conversion.
//!
//! Uses the per-pixel channel mean `(r + g + b) / 3` rather than
//! perceptual luma weights: the result feeds height and normal
//! extraction, where equal channel weighting keeps hue variations from
//! biasing the derived surface relief.

use crate::types::{GrayBuffer, RgbBuffer};

/// Convert an RGB buffer to grayscale by per-pixel channel mean.
#[must_use = "returns the grayscale buffer"]
pub fn grayscale(rgb: &RgbBuffer) -> GrayBuffer {
    GrayBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get(x, y);
        (r + g + b) / 3.0
    })
}

/// Expand a scalar buffer into an RGB buffer with equal channels.
///
/// Used at the export boundary when a scalar channel (height,
/// occlusion, metallic) needs to be written as a color image.
#[must_use = "returns the expanded RGB buffer"]
pub fn gray_to_rgb(gray: &GrayBuffer) -> RgbBuffer {
    RgbBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get(x, y);
        [v, v, v]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_is_channel_mean() {
        let rgb = RgbBuffer::filled(2, 2, [0.3, 0.6, 0.9]);
        let gray = grayscale(&rgb);
        for &v in gray.as_slice() {
            assert!((v - 0.6).abs() < 1e-6, "expected mean 0.6, got {v}");
        }
    }

    #[test]
    fn grayscale_preserves_dimensions() {
        let rgb = RgbBuffer::filled(7, 3, [0.0, 0.0, 0.0]);
        let gray = grayscale(&rgb);
        assert_eq!(gray.dimensions(), (7, 3));
    }

    #[test]
    fn gray_to_rgb_duplicates_channels() {
        let gray = GrayBuffer::filled(2, 2, 0.25);
        let rgb = gray_to_rgb(&gray);
        for &pixel in rgb.as_slice() {
            assert_eq!(pixel, [0.25, 0.25, 0.25]);
        }
    }

    #[test]
    fn round_trip_through_rgb_is_identity() {
        let gray = GrayBuffer::from_fn(3, 3, |x, y| (x + y) as f32 * 0.1);
        let back = grayscale(&gray_to_rgb(&gray));
        for (a, b) in gray.as_slice().iter().zip(back.as_slice()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
