//! Shared buffer types for the pbrgen operator pipeline.
//!
//! All operators exchange data as row-major `f32` planes: [`GrayBuffer`]
//! for single-channel data (height, occlusion, metallic) and [`RgbBuffer`]
//! for three-channel data (albedo, normals). Values are deliberately
//! **not** clamped to `[0, 1]` between operators -- only autocontrast and
//! normal-map extraction normalize, and downstream consumers (metallic
//! estimation) rely on the unclamped intermediate magnitudes. Clamping
//! happens once, at the raster export boundary.
//!
//! Buffers are immutable once produced: every operator returns a fresh
//! buffer rather than mutating its input.

use crate::wrap::wrap;

/// A single RGB pixel as three `f32` channels.
pub type Rgb = [f32; 3];

/// Errors that can occur constructing buffers or crossing the raster
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pixel data length does not match the claimed dimensions.
    #[error("pixel data has {actual} elements but {width}x{height} requires {expected}")]
    InvalidDimensions {
        /// Claimed width in pixels.
        width: u32,
        /// Claimed height in pixels.
        height: u32,
        /// `width * height`.
        expected: usize,
        /// Actual element count supplied.
        actual: usize,
    },

    /// Two buffers that must share dimensions do not.
    #[error("buffer dimensions {a_width}x{a_height} and {b_width}x{b_height} do not match")]
    DimensionMismatch {
        /// First buffer width.
        a_width: u32,
        /// First buffer height.
        a_height: u32,
        /// Second buffer width.
        b_width: u32,
        /// Second buffer height.
        b_height: u32,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Check that two same-shaped buffers actually share dimensions.
pub(crate) const fn check_same_dimensions(
    a: (u32, u32),
    b: (u32, u32),
) -> Result<(), PipelineError> {
    if a.0 == b.0 && a.1 == b.1 {
        Ok(())
    } else {
        Err(PipelineError::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        })
    }
}

/// A single-channel `f32` image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl GrayBuffer {
    /// Build a buffer from raw row-major pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if
    /// `data.len() != width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Result<Self, PipelineError> {
        let expected = width as usize * height as usize;
        if data.len() == expected {
            Ok(Self {
                width,
                height,
                data,
            })
        } else {
            Err(PipelineError::InvalidDimensions {
                width,
                height,
                expected,
                actual: data.len(),
            })
        }
    }

    /// Build a buffer by evaluating `f` at every `(x, y)` coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a buffer filled with a constant value.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` pair.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total pixel count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds zero pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at in-bounds coordinates `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Value at possibly out-of-bounds coordinates, wrapped toroidally.
    ///
    /// Uses floor-mod wrapping, so negative offsets index from the far
    /// edge: `(-1, 0)` reads the last pixel of row 0.
    #[must_use]
    pub fn get_wrapped(&self, x: i64, y: i64) -> f32 {
        self.get(wrap(x, self.width), wrap(y, self.height))
    }

    /// Raw row-major pixel data.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume the buffer, returning the raw pixel data.
    #[must_use]
    pub fn into_raw(self) -> Vec<f32> {
        self.data
    }
}

/// A three-channel `f32` image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbBuffer {
    width: u32,
    height: u32,
    data: Vec<Rgb>,
}

impl RgbBuffer {
    /// Build a buffer from raw row-major pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if
    /// `data.len() != width * height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<Rgb>) -> Result<Self, PipelineError> {
        let expected = width as usize * height as usize;
        if data.len() == expected {
            Ok(Self {
                width,
                height,
                data,
            })
        } else {
            Err(PipelineError::InvalidDimensions {
                width,
                height,
                expected,
                actual: data.len(),
            })
        }
    }

    /// Build a buffer by evaluating `f` at every `(x, y)` coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgb) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a buffer filled with a constant pixel.
    #[must_use]
    pub fn filled(width: u32, height: u32, pixel: Rgb) -> Self {
        Self {
            width,
            height,
            data: vec![pixel; width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` pair.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total pixel count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds zero pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pixel at in-bounds coordinates `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Pixel at possibly out-of-bounds coordinates, wrapped toroidally.
    #[must_use]
    pub fn get_wrapped(&self, x: i64, y: i64) -> Rgb {
        self.get(wrap(x, self.width), wrap(y, self.height))
    }

    /// Raw row-major pixel data.
    #[must_use]
    pub fn as_slice(&self) -> &[Rgb] {
        &self.data
    }

    /// Consume the buffer, returning the raw pixel data.
    #[must_use]
    pub fn into_raw(self) -> Vec<Rgb> {
        self.data
    }
}

/// A finished texture channel handed back to external callers: either a
/// scalar plane or an RGB plane.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    /// Single-channel data (height, occlusion, metallic).
    Gray(GrayBuffer),
    /// Three-channel data (albedo, normal).
    Rgb(RgbBuffer),
}

impl PixelBuffer {
    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        match self {
            Self::Gray(buffer) => buffer.width(),
            Self::Rgb(buffer) => buffer.width(),
        }
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        match self {
            Self::Gray(buffer) => buffer.height(),
            Self::Rgb(buffer) => buffer.height(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_accepts_matching_length() {
        let buffer = GrayBuffer::from_raw(2, 3, vec![0.0; 6]).unwrap();
        assert_eq!(buffer.dimensions(), (2, 3));
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        let result = GrayBuffer::from_raw(2, 3, vec![0.0; 5]);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidDimensions {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn rgb_from_raw_rejects_wrong_length() {
        let result = RgbBuffer::from_raw(4, 4, vec![[0.0; 3]; 15]);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn from_fn_is_row_major() {
        let buffer = GrayBuffer::from_fn(3, 2, |x, y| (y * 3 + x) as f32);
        assert_eq!(buffer.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((buffer.get(2, 1) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn wrapped_access_is_identity_in_bounds() {
        let buffer = GrayBuffer::from_fn(4, 4, |x, y| (y * 4 + x) as f32);
        for y in 0..4u32 {
            for x in 0..4u32 {
                assert!(
                    (buffer.get(x, y) - buffer.get_wrapped(i64::from(x), i64::from(y))).abs()
                        < f32::EPSILON,
                );
            }
        }
    }

    #[test]
    fn wrapped_access_wraps_negative_offsets() {
        let buffer = GrayBuffer::from_fn(4, 3, |x, y| (y * 4 + x) as f32);
        // (-1, -1) should read the bottom-right pixel.
        assert!((buffer.get_wrapped(-1, -1) - buffer.get(3, 2)).abs() < f32::EPSILON);
    }

    #[test]
    fn wrapped_access_at_length_equals_zero_offset() {
        // Wrap identity: sampling at offset `length` matches offset 0,
        // on both axes, for positive and negative multiples.
        let buffer = GrayBuffer::from_fn(5, 3, |x, y| (y * 5 + x) as f32);
        for y in 0..3u32 {
            for x in 0..5u32 {
                let base = buffer.get(x, y);
                assert!((buffer.get_wrapped(i64::from(x) + 5, i64::from(y)) - base).abs()
                    < f32::EPSILON);
                assert!((buffer.get_wrapped(i64::from(x), i64::from(y) + 3) - base).abs()
                    < f32::EPSILON);
                assert!((buffer.get_wrapped(i64::from(x) - 5, i64::from(y) - 3) - base).abs()
                    < f32::EPSILON);
            }
        }
    }

    #[test]
    fn pixel_buffer_reports_dimensions() {
        let gray = PixelBuffer::Gray(GrayBuffer::filled(7, 5, 0.5));
        assert_eq!(gray.width(), 7);
        assert_eq!(gray.height(), 5);

        let rgb = PixelBuffer::Rgb(RgbBuffer::filled(3, 9, [0.1, 0.2, 0.3]));
        assert_eq!(rgb.width(), 3);
        assert_eq!(rgb.height(), 9);
    }

    #[test]
    fn dimension_mismatch_error_reports_both_shapes() {
        let err = check_same_dimensions((2, 2), (3, 2)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "buffer dimensions 2x2 and 3x2 do not match"
        );
    }
}
