//! Surface Registry
//!
//! [`SurfaceSet`] owns the fixed set of named surfaces the pipeline renders
//! through, in their creation order:
//!
//! 1. `window` — the real on-screen target at display resolution
//! 2. `scene_base` — full-resolution off-screen scene target, optionally
//!    multisampled, with a depth buffer
//! 3. `scene_pass[0..2]` — half-resolution ping-pong targets for the
//!    optional whole-scene underwater blur
//! 4. `bloom_pass0` — pyramid starting at **half** display resolution
//! 5. `bloom_pass1` — pyramid starting at **full** display resolution
//!
//! The two bloom pyramids are deliberately sized differently: `bloom_pass1`
//! mirrors the display-resolution progression and serves as the
//! horizontal-blur intermediate, which softens the result at combine time.
//!
//! The core group (1–3) is created by the framebuffer stage; the pyramids
//! (4–5) by the bloom stage. Teardown releases everything in reverse order.

use smallvec::SmallVec;

use crate::device::RenderDevice;
use crate::errors::{AfterglowError, Result};
use crate::surface::{Surface, SurfaceDesc, build_pyramid};

/// The fixed collection of pipeline render targets.
#[derive(Debug)]
pub struct SurfaceSet {
    /// The on-screen target.
    pub window: Surface,
    /// Full-resolution scene target all 3D rendering draws into.
    pub scene_base: Surface,
    /// Half-resolution ping-pong pair for the underwater blur.
    pub scene_pass: [Surface; 2],
    /// Bloom pyramid, half display resolution downward. Holds the final
    /// blurred levels consumed by the combine pass.
    pub bloom_pass0: SmallVec<[Surface; 4]>,
    /// Bloom pyramid, full display resolution downward. Horizontal-blur
    /// intermediate.
    pub bloom_pass1: SmallVec<[Surface; 4]>,
}

impl SurfaceSet {
    /// Creates the core surfaces (window, scene base, ping-pong pair) for a
    /// `display_width`×`display_height` display.
    ///
    /// `msaa_samples` > 0 gives `scene_base` an additional multisampled
    /// framebuffer. On failure every partially-created surface is released.
    pub fn create_core<D: RenderDevice>(
        device: &mut D,
        display_width: u32,
        display_height: u32,
        msaa_samples: u32,
    ) -> Result<Self> {
        let window = Surface::window(display_width, display_height);

        let mut scene_base = Surface::create(
            device,
            "scenebase",
            display_width,
            display_height,
            SurfaceDesc {
                wants_depth: true,
                floating_point: false,
                linear_filter: true,
                msaa_samples,
            },
        )?;

        let half_desc = SurfaceDesc {
            wants_depth: false,
            floating_point: false,
            linear_filter: true,
            msaa_samples: 0,
        };
        let half_width = (display_width / 2).max(1);
        let half_height = (display_height / 2).max(1);

        let mut scene_pass0 =
            match Surface::create(device, "scenepass0", half_width, half_height, half_desc) {
                Ok(s) => s,
                Err(e) => {
                    scene_base.destroy(device);
                    return Err(e);
                }
            };

        let scene_pass1 =
            match Surface::create(device, "scenepass1", half_width, half_height, half_desc) {
                Ok(s) => s,
                Err(e) => {
                    scene_pass0.destroy(device);
                    scene_base.destroy(device);
                    return Err(e);
                }
            };

        Ok(Self {
            window,
            scene_base,
            scene_pass: [scene_pass0, scene_pass1],
            bloom_pass0: SmallVec::new(),
            bloom_pass1: SmallVec::new(),
        })
    }

    /// Creates the two bloom pyramids with `depth` levels each.
    ///
    /// `bloom_pass0` starts at half display resolution, `bloom_pass1` at
    /// full display resolution; both halve per level. Fails with
    /// [`AfterglowError::EmptyPyramid`] when `depth` is zero — the bloom
    /// stage indexes level 0 unconditionally.
    pub fn create_bloom_pyramids<D: RenderDevice>(
        &mut self,
        device: &mut D,
        display_width: u32,
        display_height: u32,
        depth: usize,
    ) -> Result<()> {
        if depth == 0 {
            return Err(AfterglowError::EmptyPyramid);
        }
        let desc = SurfaceDesc {
            wants_depth: false,
            floating_point: false,
            linear_filter: true,
            msaa_samples: 0,
        };

        let pass0 = build_pyramid(
            device,
            "bloompass0_",
            (display_width / 2).max(1),
            (display_height / 2).max(1),
            depth,
            desc,
        )?;

        let pass1 = match build_pyramid(
            device,
            "bloompass1_",
            display_width,
            display_height,
            depth,
            desc,
        ) {
            Ok(p) => p,
            Err(e) => {
                for mut level in pass0 {
                    level.destroy(device);
                }
                return Err(e);
            }
        };

        self.bloom_pass0 = pass0;
        self.bloom_pass1 = pass1;
        log::debug!(
            "bloom pyramids created: {} levels from {}x{} and {}x{}",
            depth,
            (display_width / 2).max(1),
            (display_height / 2).max(1),
            display_width,
            display_height,
        );
        Ok(())
    }

    /// Number of bloom pyramid levels (0 until the pyramids are created).
    #[inline]
    #[must_use]
    pub fn bloom_depth(&self) -> usize {
        self.bloom_pass0.len()
    }

    /// Releases every surface, newest first.
    pub fn destroy<D: RenderDevice>(&mut self, device: &mut D) {
        for level in self.bloom_pass1.iter_mut().rev() {
            level.destroy(device);
        }
        self.bloom_pass1.clear();
        for level in self.bloom_pass0.iter_mut().rev() {
            level.destroy(device);
        }
        self.bloom_pass0.clear();
        for surface in self.scene_pass.iter_mut().rev() {
            surface.destroy(device);
        }
        self.scene_base.destroy(device);
        self.window.destroy(device);
    }
}
