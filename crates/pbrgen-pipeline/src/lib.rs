//! pbrgen-pipeline: Pure PBR texture derivation operators (sans-IO).
//!
//! Derives the raw material for a physically-based-rendering texture
//! set from a single color image using classical per-pixel and
//! neighborhood operators: grayscale -> median filter -> shadow
//! suppression -> autocontrast -> surface/Gaussian blur -> normal
//! extraction -> occlusion and metallic estimation -> blend.
//!
//! Everything in this crate is a deterministic, stateless function
//! from input buffers to a new output buffer. Spatial operators treat
//! the image as a torus (floor-mod wrap on both axes), which keeps the
//! derived textures tileable when the input is. Scheduling, caching,
//! and concurrency live in `pbrgen-generator`; decode/encode of image
//! files is confined to [`raster`].

pub mod blend;
pub mod blur;
pub mod contrast;
pub mod grayscale;
pub mod median;
pub mod metallic;
pub mod normal;
pub mod occlusion;
pub mod raster;
pub mod shadows;
pub mod surface_blur;
pub mod types;
pub mod wrap;

pub use types::{GrayBuffer, PipelineError, PixelBuffer, Rgb, RgbBuffer};
