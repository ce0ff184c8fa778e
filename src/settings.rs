//! Pipeline Configuration
//!
//! Two kinds of configuration feed the pipeline:
//!
//! - [`PipelineConfig`] — the externally persisted feature toggles and the
//!   requested multisample level. The caller owns this value (it typically
//!   mirrors user-facing console variables) and passes it mutably every
//!   frame; the pipeline re-reads it at frame entry and **writes back**
//!   a clamped or disabled value when the hardware cannot honor it.
//! - [`PipelineTuning`] — construction-time parameters that shape the
//!   resource layout (pyramid depth, kernel weights, blur radii). Changing
//!   these requires rebuilding the pipeline.

use crate::blur::KERNEL_TAPS;

/// Externally owned feature toggles, re-read at the start of every frame.
///
/// The pipeline only reads current values each frame and may write back a
/// clamped or disabled value on capability failure:
///
/// - capability checks that fail set `framebuffer_enabled = false`
/// - an unsupported `msaa_level` is silently clamped down
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PipelineConfig {
    /// Master toggle for the whole post-process pipeline.
    pub framebuffer_enabled: bool,
    /// Toggle for the bloom effect. When off, the scene is composited
    /// directly without the glow combine.
    pub bloom_enabled: bool,
    /// Requested multisample level as log2 of the sample count
    /// (0 = off, 1 = 2×, 2 = 4×, …). Clamped each frame to the hardware
    /// maximum.
    pub msaa_level: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            framebuffer_enabled: true,
            bloom_enabled: true,
            msaa_level: 2,
        }
    }
}

/// Construction-time pipeline parameters.
///
/// These are fixed for the lifetime of a [`PostPipeline`](crate::PostPipeline);
/// a display resize or parameter change is a full teardown-then-rebuild.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PipelineTuning {
    /// Number of bloom pyramid levels, at least 1. Level 0 is half the
    /// display resolution; each subsequent level halves again.
    pub pyramid_depth: usize,
    /// Raw blur kernel weights, normalized to sum to 1 at construction.
    pub kernel_weights: [f32; KERNEL_TAPS],
    /// Texel offset scale for the bloom pyramid blur.
    pub bloom_blur_scale: f32,
    /// Texel offset scale for the whole-scene underwater blur. Larger than
    /// the bloom scale to produce a heavier blur.
    pub underwater_blur_scale: f32,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            pyramid_depth: 3,
            kernel_weights: [5.0, 6.0, 5.0],
            bloom_blur_scale: 1.0,
            underwater_blur_scale: 1.5,
        }
    }
}
