//! Variant cache and slider re-blending.
//!
//! A finished run leaves behind pairs of pre-computed extremes for
//! each output channel. Moving a slider never re-runs the heavy
//! operators; it linearly blends the cached pair, which costs one
//! pass over the pixels.

use std::sync::Arc;

use pbrgen_pipeline::{GrayBuffer, PixelBuffer, RgbBuffer, blend};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::graph::GraphOutputs;

/// Slider neutral point. Every setting defaults to the midpoint of
/// its cached pair.
pub const DEFAULT_SLIDER: f32 = 0.5;

/// The detail slider spans only part of the blend range; at full
/// detail the smooth normals still contribute a fifth of the result,
/// which keeps the fine extraction from overwhelming the large shapes.
pub const NORMAL_DETAIL_SCALE: f32 = 0.8;

/// One derivable output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Albedo,
    Height,
    Normal,
    Occlusion,
    Metallic,
}

impl Channel {
    /// All channels, in the order a full export writes them.
    pub const ALL: [Self; 5] = [
        Self::Albedo,
        Self::Height,
        Self::Normal,
        Self::Occlusion,
        Self::Metallic,
    ];

    /// Stable lowercase name, used for log lines and output file stems.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Albedo => "albedo",
            Self::Height => "height",
            Self::Normal => "normal",
            Self::Occlusion => "occlusion",
            Self::Metallic => "metallic",
        }
    }
}

/// Slider positions controlling how each channel's cached extremes
/// are blended. All values are expected in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub noise_removal: f32,
    pub shadow_removal: f32,
    pub height_smoothness: f32,
    pub normal_detail: f32,
    pub occlusion_spread: f32,
    pub metallicness: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            noise_removal: DEFAULT_SLIDER,
            shadow_removal: DEFAULT_SLIDER,
            height_smoothness: DEFAULT_SLIDER,
            normal_detail: DEFAULT_SLIDER,
            occlusion_spread: DEFAULT_SLIDER,
            metallicness: DEFAULT_SLIDER,
        }
    }
}

/// Immutable pre-computed variants from one completed run.
///
/// Handed out behind an `Arc`, so a consumer blending a channel keeps
/// a consistent snapshot even if a newer run swaps the cache out from
/// under it.
pub struct VariantCache {
    albedo_low_noise_low_shadow: Arc<RgbBuffer>,
    albedo_high_noise_low_shadow: Arc<RgbBuffer>,
    albedo_low_noise_high_shadow: Arc<RgbBuffer>,
    albedo_high_noise_high_shadow: Arc<RgbBuffer>,
    height_sharp: Arc<GrayBuffer>,
    height_smooth: Arc<GrayBuffer>,
    normal_no_details: Arc<RgbBuffer>,
    normal_high_details: Arc<RgbBuffer>,
    occlusion_low: Arc<GrayBuffer>,
    occlusion_high: Arc<GrayBuffer>,
    metallic_low: Arc<GrayBuffer>,
    metallic_high: Arc<GrayBuffer>,
}

impl VariantCache {
    /// Collect all published outputs into a cache.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Internal`] if any slot is still
    /// unpublished; the scheduler only calls this after every task
    /// has reported done.
    pub(crate) fn from_outputs(outputs: &GraphOutputs) -> Result<Self, GenerateError> {
        Ok(Self {
            albedo_low_noise_low_shadow: outputs.albedo_low_noise_low_shadow.get()?,
            albedo_high_noise_low_shadow: outputs.albedo_high_noise_low_shadow.get()?,
            albedo_low_noise_high_shadow: outputs.albedo_low_noise_high_shadow.get()?,
            albedo_high_noise_high_shadow: outputs.albedo_high_noise_high_shadow.get()?,
            height_sharp: outputs.height_sharp.get()?,
            height_smooth: outputs.height_smooth.get()?,
            normal_no_details: outputs.normal_no_details.get()?,
            normal_high_details: outputs.normal_high_details.get()?,
            occlusion_low: outputs.occlusion_low.get()?,
            occlusion_high: outputs.occlusion_high.get()?,
            metallic_low: outputs.metallic_low.get()?,
            metallic_high: outputs.metallic_high.get()?,
        })
    }

    /// Output dimensions, shared by every cached variant.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.height_sharp.dimensions()
    }

    /// Blend one channel at the given slider positions.
    ///
    /// Albedo blends bilinearly across its four corner variants;
    /// every other channel lerps a single low/high pair.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Pipeline`] if the cached variants
    /// disagree on dimensions, which would indicate a wiring bug in
    /// the task graph.
    pub fn get_channel(
        &self,
        channel: Channel,
        settings: &GenerationSettings,
    ) -> Result<PixelBuffer, GenerateError> {
        let buffer = match channel {
            Channel::Albedo => {
                let low_shadow = blend::blend_rgb(
                    &self.albedo_low_noise_low_shadow,
                    &self.albedo_high_noise_low_shadow,
                    settings.noise_removal,
                )?;
                let high_shadow = blend::blend_rgb(
                    &self.albedo_low_noise_high_shadow,
                    &self.albedo_high_noise_high_shadow,
                    settings.noise_removal,
                )?;
                PixelBuffer::Rgb(blend::blend_rgb(
                    &low_shadow,
                    &high_shadow,
                    settings.shadow_removal,
                )?)
            }
            Channel::Height => PixelBuffer::Gray(blend::blend(
                &self.height_sharp,
                &self.height_smooth,
                settings.height_smoothness,
            )?),
            Channel::Normal => PixelBuffer::Rgb(blend::blend_rgb(
                &self.normal_no_details,
                &self.normal_high_details,
                settings.normal_detail * NORMAL_DETAIL_SCALE,
            )?),
            Channel::Occlusion => PixelBuffer::Gray(blend::blend(
                &self.occlusion_low,
                &self.occlusion_high,
                settings.occlusion_spread,
            )?),
            Channel::Metallic => PixelBuffer::Gray(blend::blend(
                &self.metallic_low,
                &self.metallic_high,
                settings.metallicness,
            )?),
        };
        Ok(buffer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use pbrgen_pipeline::RgbBuffer;

    use super::*;
    use crate::graph::{self, TASK_COUNT};
    use crate::task::TaskBoard;

    fn run_graph_inline() -> VariantCache {
        let raw = Arc::new(RgbBuffer::from_fn(4, 4, |x, y| {
            let v = (x + y * 4) as f32 / 16.0;
            [v, v, v]
        }));
        let board = Arc::new(TaskBoard::new(TASK_COUNT));
        let built = graph::build(&raw, &board);
        // Tasks are already in dependency order, so running them
        // sequentially satisfies every wait.
        for task in built.tasks {
            (task.job)().unwrap_or_else(|err| panic!("task failed: {err}"));
        }
        VariantCache::from_outputs(&built.outputs)
            .unwrap_or_else(|err| panic!("cache assembly failed: {err}"))
    }

    #[test]
    fn default_settings_sit_at_midpoint() {
        let settings = GenerationSettings::default();
        assert!((settings.noise_removal - DEFAULT_SLIDER).abs() < f32::EPSILON);
        assert!((settings.metallicness - DEFAULT_SLIDER).abs() < f32::EPSILON);
    }

    #[test]
    fn settings_deserialize_with_missing_fields() {
        let settings: GenerationSettings =
            serde_json::from_str(r#"{"normal_detail": 1.0}"#)
                .unwrap_or_else(|err| panic!("deserialize failed: {err}"));
        assert!((settings.normal_detail - 1.0).abs() < f32::EPSILON);
        assert!((settings.noise_removal - DEFAULT_SLIDER).abs() < f32::EPSILON);
    }

    #[test]
    fn channel_names_are_stable() {
        let names: Vec<_> = Channel::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["albedo", "height", "normal", "occlusion", "metallic"]);
    }

    #[test]
    fn zero_sliders_return_low_variants() {
        let cache = run_graph_inline();
        let settings = GenerationSettings {
            height_smoothness: 0.0,
            ..GenerationSettings::default()
        };
        let PixelBuffer::Gray(height) = cache
            .get_channel(Channel::Height, &settings)
            .unwrap_or_else(|err| panic!("blend failed: {err}"))
        else {
            panic!("height channel should be grayscale");
        };
        for (blended, sharp) in height.as_slice().iter().zip(cache.height_sharp.as_slice()) {
            assert!(
                (blended - sharp).abs() < 1e-6,
                "slider at zero should reproduce the sharp variant",
            );
        }
    }

    #[test]
    fn full_detail_keeps_smooth_contribution() {
        let cache = run_graph_inline();
        let settings = GenerationSettings {
            normal_detail: 1.0,
            ..GenerationSettings::default()
        };
        let PixelBuffer::Rgb(normal) = cache
            .get_channel(Channel::Normal, &settings)
            .unwrap_or_else(|err| panic!("blend failed: {err}"))
        else {
            panic!("normal channel should be rgb");
        };
        // At full detail the result is an 0.2/0.8 mix, never the raw
        // high-detail variant alone.
        for ((out, no), high) in normal
            .as_slice()
            .iter()
            .zip(cache.normal_no_details.as_slice())
            .zip(cache.normal_high_details.as_slice())
        {
            for ch in 0..3 {
                let expected = no[ch] + (high[ch] - no[ch]) * NORMAL_DETAIL_SCALE;
                assert!((out[ch] - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn every_channel_matches_input_dimensions() {
        let cache = run_graph_inline();
        let settings = GenerationSettings::default();
        for channel in Channel::ALL {
            let buffer = cache
                .get_channel(channel, &settings)
                .unwrap_or_else(|err| panic!("{} blend failed: {err}", channel.name()));
            assert_eq!(buffer.width(), 4, "{} width", channel.name());
            assert_eq!(buffer.height(), 4, "{} height", channel.name());
        }
    }
}
