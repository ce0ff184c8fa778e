//! Bloom Stage
//!
//! Owns the bloom resolution pyramids and the per-frame glow passes:
//!
//! 1. **Downsample** — the base scene is copied into pyramid level 0, then
//!    every deeper level is redrawn from level 0's texture. Levels are
//!    deliberately *not* chained level-to-level; resampling from level 0 is
//!    cheaper and the coarser result is part of the intended look.
//! 2. **Horizontal blur** — `bloom_pass0` → `bloom_pass1`.
//! 3. **Vertical blur** — `bloom_pass1` → `bloom_pass0`.
//! 4. **Combine** — the blurred levels and the base scene are bound as
//!    named inputs of the combine program; the blend math lives in the
//!    program itself. The combine program stays current so the final
//!    window composite samples through it.
//!
//! [`BloomStage::clear`] runs after the composite and disables every
//! texture unit the combine pass touched, so bound-texture state cannot
//! leak into unrelated rendering.

use crate::blur::{Axis, BlurKernel, blur};
use crate::device::{ProgramDesc, ProgramId, ProgramKind, QuadMapping, RenderDevice};
use crate::errors::Result;
use crate::settings::PipelineTuning;
use crate::surfaces::SurfaceSet;

/// Bloom extraction, blur, and combine.
#[derive(Debug, Default)]
pub struct BloomStage {
    initialized: bool,
    combine_program: Option<ProgramId>,
    filter_program: Option<ProgramId>,
}

impl BloomStage {
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

    /// The separable-blur program, once initialized.
    ///
    /// Also used by the framebuffer stage for the underwater whole-scene
    /// blur, which runs even when the bloom combine is disabled.
    #[inline]
    #[must_use]
    pub fn filter_program(&self) -> Option<ProgramId> {
        self.filter_program
    }

    /// Builds the bloom pyramids and programs.
    ///
    /// No-op until the framebuffer stage is initialized, and idempotent
    /// afterwards. On a resource failure everything created so far is
    /// released and the error is returned for the caller to degrade on.
    pub fn init<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &mut SurfaceSet,
        display_width: u32,
        display_height: u32,
        tuning: &PipelineTuning,
        framebuffer_initialized: bool,
    ) -> Result<()> {
        if !framebuffer_initialized || self.initialized {
            return Ok(());
        }

        surfaces.create_bloom_pyramids(
            device,
            display_width,
            display_height,
            tuning.pyramid_depth,
        )?;

        let combine = match device.compile_program(&ProgramDesc {
            label: "bloom combine",
            kind: ProgramKind::BloomCombine {
                levels: tuning.pyramid_depth as u32,
            },
        }) {
            Ok(p) => p,
            Err(e) => {
                self.release_surfaces(device, surfaces);
                return Err(e);
            }
        };

        let filter = match device.compile_program(&ProgramDesc {
            label: "bloom filter",
            kind: ProgramKind::SeparableBlur {
                taps: crate::blur::KERNEL_TAPS as u32,
            },
        }) {
            Ok(p) => p,
            Err(e) => {
                device.destroy_program(combine);
                self.release_surfaces(device, surfaces);
                return Err(e);
            }
        };

        self.combine_program = Some(combine);
        self.filter_program = Some(filter);
        self.initialized = true;
        Ok(())
    }

    /// Runs the per-frame bloom passes.
    ///
    /// No-op unless initialized and `bloom_enabled`; a disabled bloom stage
    /// touches no surface and binds no texture unit.
    ///
    /// `pass_program` is the framebuffer stage's copy program, reused for
    /// the initial scene → level-0 extraction. `underwater` selects
    /// `scene_pass[0]` (the already-blurred scene) instead of `scene_base`
    /// as the combine's `Scene` input.
    pub fn process<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &SurfaceSet,
        kernel: &BlurKernel,
        pass_program: ProgramId,
        bloom_enabled: bool,
        underwater: bool,
        blur_scale: f32,
    ) {
        if !self.initialized || !bloom_enabled {
            return;
        }
        let (Some(combine), Some(filter)) = (self.combine_program, self.filter_program) else {
            return;
        };
        let depth = surfaces.bloom_depth();

        // Extract the scene into pyramid level 0.
        device.use_program(Some(pass_program));
        device.set_uniform_i32(pass_program, "source", 0);
        device.bind_texture(0, surfaces.scene_base.texture());
        surfaces.bloom_pass0[0].bind(device, false);
        device.draw_fullscreen_quad(QuadMapping::Normalized);
        device.use_program(None);

        // Downsample the remaining levels, all sampled from level 0.
        device.bind_texture(0, surfaces.bloom_pass0[0].texture());
        for level in surfaces.bloom_pass0.iter().skip(1) {
            level.bind(device, false);
            device.draw_fullscreen_quad(QuadMapping::Normalized);
        }

        blur(
            device,
            filter,
            kernel,
            &surfaces.bloom_pass0,
            &surfaces.bloom_pass1,
            depth,
            blur_scale,
            Axis::Horizontal,
        );
        blur(
            device,
            filter,
            kernel,
            &surfaces.bloom_pass1,
            &surfaces.bloom_pass0,
            depth,
            blur_scale,
            Axis::Vertical,
        );

        // Bind the blurred levels and the scene as the combine inputs. The
        // program stays current for the window composite that follows.
        device.use_program(Some(combine));
        for (p, level) in surfaces.bloom_pass0.iter().enumerate() {
            device.bind_texture(p as u32, level.texture());
            device.set_uniform_i32(combine, &format!("Pass{p}"), p as i32);
        }

        let scene = if underwater {
            surfaces.scene_pass[0].texture()
        } else {
            surfaces.scene_base.texture()
        };
        device.bind_texture(depth as u32, scene);
        device.set_uniform_i32(combine, "Scene", depth as i32);
    }

    /// Disables every texture unit used by the combine pass
    /// (units `0..=depth`).
    pub fn clear<D: RenderDevice>(
        &mut self,
        device: &mut D,
        surfaces: &SurfaceSet,
        bloom_enabled: bool,
    ) {
        if !self.initialized || !bloom_enabled {
            return;
        }
        for unit in 0..=surfaces.bloom_depth() as u32 {
            device.bind_texture(unit, None);
        }
    }

    /// Releases the stage's programs and returns to `Uninitialized`.
    ///
    /// Pyramid surfaces are owned by the [`SurfaceSet`] and torn down with
    /// it.
    pub fn shutdown<D: RenderDevice>(&mut self, device: &mut D) {
        if let Some(p) = self.filter_program.take() {
            device.destroy_program(p);
        }
        if let Some(p) = self.combine_program.take() {
            device.destroy_program(p);
        }
        self.initialized = false;
    }

    fn release_surfaces<D: RenderDevice>(&self, device: &mut D, surfaces: &mut SurfaceSet) {
        for level in surfaces.bloom_pass1.iter_mut().rev() {
            level.destroy(device);
        }
        surfaces.bloom_pass1.clear();
        for level in surfaces.bloom_pass0.iter_mut().rev() {
            level.destroy(device);
        }
        surfaces.bloom_pass0.clear();
    }
}
