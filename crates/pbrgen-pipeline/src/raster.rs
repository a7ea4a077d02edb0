//! Raster boundary: decoding input images into working buffers and
//! quantizing finished buffers back into 8-bit images.
//!
//! This is the only module that touches the `image` crate's pixel
//! types. Everything between decode and encode works on unclamped
//! `f32` buffers; clamping to `[0, 1]` happens here, once, on the way
//! out.

use image::{GrayImage, RgbImage};

use crate::types::{GrayBuffer, PipelineError, RgbBuffer};

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) into an [`RgbBuffer`]
/// with channels scaled to `[0, 1]`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the format is
/// unrecognized or the data is corrupt.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbBuffer, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let decoded = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = decoded.dimensions();
    Ok(RgbBuffer::from_fn(width, height, |x, y| {
        let pixel = decoded.get_pixel(x, y).0;
        [
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
        ]
    }))
}

/// Quantize a scalar buffer to an 8-bit grayscale image, clamping to
/// `[0, 1]`.
#[must_use = "returns the quantized image"]
pub fn gray_to_image(buffer: &GrayBuffer) -> GrayImage {
    GrayImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        image::Luma([quantize(buffer.get(x, y))])
    })
}

/// Quantize an RGB buffer to an 8-bit color image, clamping each
/// channel to `[0, 1]`.
#[must_use = "returns the quantized image"]
pub fn rgb_to_image(buffer: &RgbBuffer) -> RgbImage {
    RgbImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        let [r, g, b] = buffer.get(x, y);
        image::Rgb([quantize(r), quantize(g), quantize(b)])
    })
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
