//! Separable Blur Filter
//!
//! Applies a normalized 1-D kernel along one axis to a run of paired
//! (source, destination) surfaces. Calling it once per axis — horizontal
//! into the intermediate pyramid, then vertical back — approximates a 2-D
//! blur at far lower cost.
//!
//! The texel step is derived per surface from that surface's own resolution
//! (`offset_scale / width` or `/ height`), so every pyramid level receives a
//! perceptually similar blur radius in screen space despite differing pixel
//! counts.

use crate::device::{ProgramId, QuadMapping, RenderDevice};
use crate::errors::{AfterglowError, Result};
use crate::surface::Surface;

/// Number of filter taps. The filter program receives one offset value and
/// internally derives the symmetric tap pattern `{-step, 0, +step}`.
pub const KERNEL_TAPS: usize = 3;

/// Blur axis. The same kernel weights are reused for both; only the
/// sampling offset axis changes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Uniform name carrying the texel step for this axis.
    #[inline]
    #[must_use]
    pub fn offset_uniform(self) -> &'static str {
        match self {
            Axis::Horizontal => "offsetx",
            Axis::Vertical => "offsety",
        }
    }
}

/// Fixed-size blur kernel, normalized so its weights sum to 1.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BlurKernel {
    weights: [f32; KERNEL_TAPS],
}

impl BlurKernel {
    /// Normalizes `weights` (divides each by their sum).
    ///
    /// Fails with [`AfterglowError::InvalidKernel`] when the sum is not a
    /// positive finite value.
    pub fn normalized(weights: [f32; KERNEL_TAPS]) -> Result<Self> {
        let sum: f32 = weights.iter().sum();
        if !(sum.is_finite() && sum > 0.0) {
            return Err(AfterglowError::InvalidKernel { sum });
        }
        Ok(Self {
            weights: weights.map(|w| w / sum),
        })
    }

    /// The normalized weights.
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &[f32; KERNEL_TAPS] {
        &self.weights
    }
}

/// Blurs the first `count` (source, destination) surface pairs along `axis`.
///
/// For each pair, in index order: the destination is bound as the render
/// target (never its multisample variant), the source's color texture feeds
/// unit 0, and one full-screen quad samples three taps at
/// `{-step, 0, +step}` weighted by the kernel. Destinations are fully
/// overwritten; given identical inputs the result is deterministic.
///
/// `count` may be shorter than the pyramids (the underwater whole-scene
/// blur passes a single level).
pub fn blur<D: RenderDevice>(
    device: &mut D,
    filter: ProgramId,
    kernel: &BlurKernel,
    sources: &[Surface],
    dests: &[Surface],
    count: usize,
    offset_scale: f32,
    axis: Axis,
) {
    debug_assert!(count <= sources.len() && count <= dests.len());

    device.use_program(Some(filter));
    device.set_uniform_i32(filter, "source", 0);
    device.set_uniform_f32_slice(filter, "coefficients", kernel.weights());
    device.set_uniform_f32(filter, "offsetx", 0.0);
    device.set_uniform_f32(filter, "offsety", 0.0);

    for (source, dest) in sources.iter().zip(dests).take(count) {
        let step = match axis {
            Axis::Horizontal => offset_scale / source.width() as f32,
            Axis::Vertical => offset_scale / source.height() as f32,
        };
        device.set_uniform_f32(filter, axis.offset_uniform(), step);

        dest.bind(device, false);
        device.bind_texture(0, source.texture());
        device.draw_fullscreen_quad(QuadMapping::Normalized);
    }

    device.use_program(None);
}
