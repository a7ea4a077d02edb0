//! Fixed-kernel Gaussian blur.
//!
//! Convolution with a 5x5 binomial-approximation kernel (sum 273) over
//! the toroidal image. The kernel is fixed: the pipeline always blurs
//! at this one scale and blends between blurred and unblurred variants
//! instead of re-running at other sigmas.

use crate::types::GrayBuffer;

/// The 5x5 Gaussian kernel, row-major.
const KERNEL: [f32; 25] = [
    1.0, 4.0, 7.0, 4.0, 1.0, //
    4.0, 16.0, 26.0, 16.0, 4.0, //
    7.0, 26.0, 41.0, 26.0, 7.0, //
    4.0, 16.0, 26.0, 16.0, 4.0, //
    1.0, 4.0, 7.0, 4.0, 1.0,
];

/// Sum of all kernel weights.
const KERNEL_SUM: f32 = 273.0;

/// Convolve a scalar buffer with the fixed 5x5 Gaussian kernel,
/// wrapping toroidally at the edges.
#[must_use = "returns the blurred buffer"]
pub fn gaussian_blur(buffer: &GrayBuffer) -> GrayBuffer {
    GrayBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
        let mut acc = 0.0f32;
        for ky in 0..5i64 {
            for kx in 0..5i64 {
                let sample = buffer.get_wrapped(i64::from(x) + kx - 2, i64::from(y) + ky - 2);
                #[allow(clippy::cast_sign_loss)]
                let weight = KERNEL[(ky * 5 + kx) as usize];
                acc += sample * weight;
            }
        }
        acc / KERNEL_SUM
    })
}
