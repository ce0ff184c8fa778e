//! Framebuffer Stage
//!
//! Owns the top-level frame protocol around the external 3D scene
//! rendering:
//!
//! - [`begin`](FramebufferStage::begin) — lazily initializes, re-validates
//!   the multisample level, and binds + clears `scene_base` so all
//!   subsequent scene draw calls land off-screen.
//! - [`end`](FramebufferStage::end) — resolves multisampling, applies the
//!   optional whole-scene underwater blur, runs the bloom stage, composites
//!   onto the window surface, and restores neutral GPU state.
//!
//! Every capability failure degrades to off: the stage writes
//! `framebuffer_enabled = false` back into the caller's config and all
//! subsequent per-frame calls become no-ops until the caller re-enables
//! the feature.

use crate::bloom::BloomStage;
use crate::blur::{Axis, BlurKernel, blur};
use crate::device::{
    DeviceCaps, DeviceFeatures, ProgramDesc, ProgramId, ProgramKind, QuadMapping, RenderDevice,
};
use crate::errors::Result;
use crate::settings::{PipelineConfig, PipelineTuning};
use crate::surfaces::SurfaceSet;

/// Top-level begin/process/end protocol.
#[derive(Debug, Default)]
pub struct FramebufferStage {
    initialized: bool,
    pass_program: Option<ProgramId>,
    /// Whether `scene_base` was bound through its multisampled framebuffer
    /// this frame; gates the resolve blit in `process`.
    msaa_active: bool,
}

impl FramebufferStage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`init`](Self::init) has completed.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The pass/copy program, once initialized.
    #[inline]
    #[must_use]
    pub fn pass_program(&self) -> Option<ProgramId> {
        self.pass_program
    }

    /// Creates the core surfaces and the pass program.
    ///
    /// Idempotent once complete. A failed capability check disables the
    /// feature in `config` and returns `Ok`; a resource-creation failure
    /// rolls back, disables the feature, and returns the error.
    pub fn init<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &mut Option<SurfaceSet>,
        config: &mut PipelineConfig,
        display_width: u32,
        display_height: u32,
    ) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let caps = device.caps();

        if !caps.supports(DeviceFeatures::RENDER_TARGETS) {
            if config.framebuffer_enabled {
                log::warn!("off-screen render targets are unavailable; disabling post-process");
                config.framebuffer_enabled = false;
            }
            return Ok(());
        }
        if !caps.supports(DeviceFeatures::SHADER_COMPILER) {
            if config.framebuffer_enabled {
                log::warn!("shader compilation support is required; disabling post-process");
                config.framebuffer_enabled = false;
            }
            return Ok(());
        }
        if !config.framebuffer_enabled {
            return Ok(());
        }

        clamp_msaa_level(&caps, config);
        let samples = if config.msaa_level > 0 {
            1 << config.msaa_level
        } else {
            0
        };

        let set = match SurfaceSet::create_core(device, display_width, display_height, samples) {
            Ok(set) => set,
            Err(e) => {
                log::warn!("surface creation failed ({e}); disabling post-process");
                config.framebuffer_enabled = false;
                return Err(e);
            }
        };

        let pass = match device.compile_program(&ProgramDesc {
            label: "pass",
            kind: ProgramKind::Blit,
        }) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("pass program creation failed ({e}); disabling post-process");
                let mut set = set;
                set.destroy(device);
                config.framebuffer_enabled = false;
                return Err(e);
            }
        };

        *surfaces = Some(set);
        self.pass_program = Some(pass);
        self.initialized = true;
        log::debug!("framebuffer stage initialized at {display_width}x{display_height}");
        Ok(())
    }

    /// Per-frame entry: lazy init, multisample re-validation, and binding
    /// `scene_base` as the cleared active target for scene rendering.
    ///
    /// No-op while the feature is disabled.
    pub fn begin<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &mut Option<SurfaceSet>,
        bloom: &mut BloomStage,
        config: &mut PipelineConfig,
        tuning: &PipelineTuning,
        display_width: u32,
        display_height: u32,
    ) -> Result<()> {
        if !config.framebuffer_enabled {
            return Ok(());
        }

        self.init(device, surfaces, config, display_width, display_height)?;
        if let Some(set) = surfaces
            && let Err(e) = bloom.init(
                device,
                set,
                display_width,
                display_height,
                tuning,
                self.initialized,
            )
        {
            log::warn!("bloom initialization failed ({e}); disabling post-process");
            config.framebuffer_enabled = false;
            bloom.shutdown(device);
            self.shutdown(device);
            if let Some(mut set) = surfaces.take() {
                set.destroy(device);
            }
            return Err(e);
        }
        if !self.initialized {
            return Ok(());
        }

        let caps = device.caps();
        if !caps.supports(DeviceFeatures::SHADER_COMPILER) {
            log::warn!("shader compilation support is required; disabling post-process");
            config.framebuffer_enabled = false;
            return Ok(());
        }
        clamp_msaa_level(&caps, config);

        let Some(set) = surfaces else {
            return Ok(());
        };
        self.msaa_active = config.msaa_level > 0 && set.scene_base.msaa_framebuffer().is_some();

        set.scene_base.bind(device, self.msaa_active);
        set.scene_base.clear(device);
        Ok(())
    }

    /// Multisample resolve, scene copy, and the optional underwater blur.
    ///
    /// After this runs, `scene_pass[0]` holds a half-resolution copy of the
    /// scene (blurred when `underwater`). When bloom is disabled the
    /// appropriate composite source is left bound on unit 0 for the direct
    /// window draw.
    pub fn process<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &SurfaceSet,
        kernel: &BlurKernel,
        filter_program: Option<ProgramId>,
        bloom_enabled: bool,
        underwater: bool,
        underwater_blur_scale: f32,
    ) {
        let Some(pass) = self.pass_program else {
            return;
        };

        if self.msaa_active
            && let (Some(read), Some(draw)) = (
                surfaces.scene_base.msaa_framebuffer(),
                surfaces.scene_base.framebuffer(),
            )
        {
            device.blit_framebuffer(
                read,
                draw,
                surfaces.scene_base.width(),
                surfaces.scene_base.height(),
            );
            device.bind_framebuffer(None);
        }

        // Copy the scene into the first ping-pong target.
        device.use_program(Some(pass));
        device.set_uniform_i32(pass, "source", 0);
        device.bind_texture(0, surfaces.scene_base.texture());
        surfaces.scene_pass[0].bind(device, false);
        device.draw_fullscreen_quad(QuadMapping::Normalized);
        device.use_program(None);

        if underwater && let Some(filter) = filter_program {
            blur(
                device,
                filter,
                kernel,
                &surfaces.scene_pass[..1],
                &surfaces.scene_pass[1..],
                1,
                underwater_blur_scale,
                Axis::Horizontal,
            );
            blur(
                device,
                filter,
                kernel,
                &surfaces.scene_pass[1..],
                &surfaces.scene_pass[..1],
                1,
                underwater_blur_scale,
                Axis::Vertical,
            );
        }

        if !bloom_enabled {
            let source = if underwater {
                surfaces.scene_pass[0].texture()
            } else {
                surfaces.scene_base.texture()
            };
            device.bind_texture(0, source);
        }
    }

    /// Per-frame exit: runs `process`, the bloom stage, and the final
    /// composite onto the window surface, then restores neutral render and
    /// texture state.
    pub fn end<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &Option<SurfaceSet>,
        bloom: &mut BloomStage,
        config: &PipelineConfig,
        kernel: &BlurKernel,
        tuning: &PipelineTuning,
        underwater: bool,
    ) {
        if !config.framebuffer_enabled || !self.initialized {
            return;
        }
        let Some(set) = surfaces else {
            return;
        };
        let Some(pass) = self.pass_program else {
            return;
        };

        self.process(
            device,
            set,
            kernel,
            bloom.filter_program(),
            config.bloom_enabled,
            underwater,
            tuning.underwater_blur_scale,
        );
        bloom.process(
            device,
            set,
            kernel,
            pass,
            config.bloom_enabled,
            underwater,
            tuning.bloom_blur_scale,
        );

        // Composite onto the real window surface, sampling whatever the
        // previous stage left active (combine program, or the direct source
        // when bloom is off).
        set.window.bind(device, false);
        device.draw_fullscreen_quad(QuadMapping::WindowFlipped);
        device.use_program(None);

        bloom.clear(device, set, config.bloom_enabled);

        // Render-to-display resumes.
        device.bind_framebuffer(None);
        device.reset_texture_state();
    }

    /// Releases the pass program and returns to `Uninitialized`.
    pub fn shutdown<D: RenderDevice>(&mut self, device: &mut D) {
        if let Some(p) = self.pass_program.take() {
            device.destroy_program(p);
        }
        self.initialized = false;
        self.msaa_active = false;
    }
}

/// Clamps the requested multisample level to what the hardware reports:
/// down to `floor(log2(max_samples) + 0.5)` when the request exceeds it,
/// or to 0 when multisampling is unsupported. Clamping is silent apart
/// from a debug log.
fn clamp_msaa_level(caps: &DeviceCaps, config: &mut PipelineConfig) {
    if caps.supports(DeviceFeatures::MULTISAMPLE) && caps.max_samples > 0 {
        let max_level = ((caps.max_samples as f32).log2() + 0.5).floor() as u32;
        if config.msaa_level > max_level {
            log::debug!(
                "multisample level {} unsupported, clamping to {max_level}",
                config.msaa_level
            );
            config.msaa_level = max_level;
        }
    } else if config.msaa_level > 0 {
        log::debug!("multisampling unsupported, disabling");
        config.msaa_level = 0;
    }
}
