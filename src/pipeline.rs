//! Post-Process Pipeline Context
//!
//! [`PostPipeline`] is the single owned context for the whole compositing
//! pipeline: it holds the surface registry, both stages, and the blur
//! kernel, and exposes the two calls the embedder makes per frame:
//!
//! ```rust,ignore
//! let mut pipeline = PostPipeline::new(1920, 1080, PipelineTuning::default())?;
//!
//! // per frame
//! pipeline.begin(&mut device, &mut config)?;
//! // ... issue 3D scene draw calls (they render into scene_base) ...
//! pipeline.end(&mut device, &config, &FrameContext { underwater: false });
//! // present — the window surface now holds the composited frame
//!
//! // on shutdown or display resize
//! pipeline.shutdown(&mut device);
//! ```
//!
//! Construction allocates nothing on the device; GPU resources are built
//! lazily on the first `begin` and torn down explicitly by `shutdown`
//! (surfaces and programs hold device handles, so `Drop` cannot release
//! them).

use crate::bloom::BloomStage;
use crate::blur::BlurKernel;
use crate::device::RenderDevice;
use crate::errors::{AfterglowError, Result};
use crate::framebuffer::FramebufferStage;
use crate::settings::{PipelineConfig, PipelineTuning};
use crate::surfaces::SurfaceSet;

/// Per-frame external state consumed by the pipeline.
///
/// The world/view query itself (is the viewpoint inside a water-equivalent
/// volume) is owned by the embedder; the pipeline only consumes the answer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FrameContext {
    /// The viewpoint is at or below a water-equivalent volume; selects the
    /// whole-scene blur and the blurred composite source.
    pub underwater: bool,
}

/// The owned post-process pipeline context.
#[derive(Debug)]
pub struct PostPipeline {
    display_width: u32,
    display_height: u32,
    tuning: PipelineTuning,
    kernel: BlurKernel,
    surfaces: Option<SurfaceSet>,
    framebuffer: FramebufferStage,
    bloom: BloomStage,
}

impl PostPipeline {
    /// Creates a pipeline for the given display resolution.
    ///
    /// Normalizes the kernel weights from `tuning`; fails when they cannot
    /// be normalized or when `pyramid_depth` is zero. No device resources
    /// are allocated here.
    pub fn new(display_width: u32, display_height: u32, tuning: PipelineTuning) -> Result<Self> {
        if tuning.pyramid_depth == 0 {
            return Err(AfterglowError::EmptyPyramid);
        }
        let kernel = BlurKernel::normalized(tuning.kernel_weights)?;
        Ok(Self {
            display_width,
            display_height,
            tuning,
            kernel,
            surfaces: None,
            framebuffer: FramebufferStage::new(),
            bloom: BloomStage::new(),
        })
    }

    /// Call once per frame before issuing 3D scene draw calls.
    ///
    /// Re-reads `config`, lazily initializes, clamps the multisample level
    /// (writing the clamped value back), and leaves `scene_base` bound and
    /// cleared as the active render target. No-op while the feature is
    /// disabled.
    pub fn begin<D: RenderDevice>(
        &mut self,
        device: &mut D,
        config: &mut PipelineConfig,
    ) -> Result<()> {
        self.framebuffer.begin(
            device,
            &mut self.surfaces,
            &mut self.bloom,
            config,
            &self.tuning,
            self.display_width,
            self.display_height,
        )
    }

    /// Call once per frame after all 3D scene draw calls, before presenting.
    ///
    /// Resolves, blurs, blooms, and composites onto the window surface;
    /// afterwards the display-bound target holds the finished frame and
    /// render-to-display is restored.
    pub fn end<D: RenderDevice>(
        &mut self,
        device: &mut D,
        config: &PipelineConfig,
        frame: &FrameContext,
    ) {
        self.framebuffer.end(
            device,
            &self.surfaces,
            &mut self.bloom,
            config,
            &self.kernel,
            &self.tuning,
            frame.underwater,
        );
    }

    /// Tears down every device resource and returns both stages to
    /// `Uninitialized`. The next `begin` rebuilds from scratch.
    pub fn shutdown<D: RenderDevice>(&mut self, device: &mut D) {
        self.bloom.shutdown(device);
        self.framebuffer.shutdown(device);
        if let Some(mut set) = self.surfaces.take() {
            set.destroy(device);
        }
    }

    /// Handles a display resize: full teardown now, rebuild at the next
    /// `begin` with the new resolution.
    pub fn resize<D: RenderDevice>(&mut self, device: &mut D, width: u32, height: u32) {
        self.shutdown(device);
        self.display_width = width;
        self.display_height = height;
    }

    /// Whether the pipeline currently owns device resources.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.framebuffer.is_initialized()
    }

    /// The surface registry, once initialized.
    #[inline]
    #[must_use]
    pub fn surfaces(&self) -> Option<&SurfaceSet> {
        self.surfaces.as_ref()
    }

    /// The normalized blur kernel.
    #[inline]
    #[must_use]
    pub fn kernel(&self) -> &BlurKernel {
        &self.kernel
    }
}
