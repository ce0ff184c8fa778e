//! Render Surface
//!
//! A [`Surface`] bundles one renderable target: its color texture, optional
//! depth buffer, optional multisampled variant, the framebuffer object
//! binding them, and the draw state restored whenever the surface becomes
//! the active target (viewport plus cached modelview/projection matrices).
//!
//! Surfaces are created once during pipeline initialization from the current
//! display resolution and never resized; a display resize is a full
//! teardown-then-rebuild of the owning pipeline.

use glam::Mat4;
use smallvec::SmallVec;

use crate::device::{
    DepthBufferId, FramebufferId, RenderDevice, TextureId, TextureOptions, Viewport,
};
use crate::errors::{AfterglowError, Result};

/// Every surface clears to the same color; the per-surface `clear_color`
/// field is stored for completeness but not consulted by [`Surface::clear`].
const UNIFORM_CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Creation options for an off-screen surface.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SurfaceDesc {
    /// Attach a depth buffer.
    pub wants_depth: bool,
    /// Use a floating-point color format.
    pub floating_point: bool,
    /// Use linear texture filtering.
    pub linear_filter: bool,
    /// Sample count for an additional multisampled framebuffer
    /// (0 = no multisample variant).
    pub msaa_samples: u32,
}

/// One renderable target plus the draw state it restores on bind.
#[derive(Debug)]
pub struct Surface {
    label: String,
    width: u32,
    height: u32,
    viewport: Viewport,
    clear_color: [f32; 4],
    modelview: Mat4,
    projection: Mat4,
    /// Color texture; `None` only for the window surface, whose storage is
    /// owned by the window system.
    color: Option<TextureId>,
    depth: Option<DepthBufferId>,
    /// `None` binds the window-system back buffer.
    framebuffer: Option<FramebufferId>,
    msaa_framebuffer: Option<FramebufferId>,
}

impl Surface {
    /// Creates an off-screen surface of `width`×`height` pixels.
    ///
    /// Fails with [`AfterglowError::DegenerateSurface`] when either
    /// dimension is zero. On a device failure partway through, every
    /// already-created resource is released before the error is returned.
    pub fn create<D: RenderDevice>(
        device: &mut D,
        label: &str,
        width: u32,
        height: u32,
        desc: SurfaceDesc,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AfterglowError::DegenerateSurface {
                label: label.to_owned(),
                width,
                height,
            });
        }

        let color = device.create_texture(
            label,
            width,
            height,
            TextureOptions {
                linear_filter: desc.linear_filter,
                floating_point: desc.floating_point,
            },
        )?;

        let depth = if desc.wants_depth {
            match device.create_depth_buffer(width, height) {
                Ok(d) => Some(d),
                Err(e) => {
                    device.destroy_texture(color);
                    return Err(e);
                }
            }
        } else {
            None
        };

        let framebuffer = match device.create_framebuffer(color, depth) {
            Ok(f) => f,
            Err(e) => {
                if let Some(d) = depth {
                    device.destroy_depth_buffer(d);
                }
                device.destroy_texture(color);
                return Err(e);
            }
        };

        let msaa_framebuffer = if desc.msaa_samples > 0 {
            match device.create_multisample_framebuffer(
                width,
                height,
                desc.msaa_samples,
                desc.wants_depth,
            ) {
                Ok(f) => Some(f),
                Err(e) => {
                    device.destroy_framebuffer(framebuffer);
                    if let Some(d) = depth {
                        device.destroy_depth_buffer(d);
                    }
                    device.destroy_texture(color);
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::trace!("surface '{label}' created ({width}x{height})");

        Ok(Self {
            label: label.to_owned(),
            width,
            height,
            viewport: Viewport {
                x: 0,
                y: 0,
                width,
                height,
            },
            clear_color: UNIFORM_CLEAR,
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            color: Some(color),
            depth,
            framebuffer: Some(framebuffer),
            msaa_framebuffer,
        })
    }

    /// Creates the window surface: the real on-screen target at display
    /// resolution, with an orthographic projection spanning the full display.
    #[must_use]
    pub fn window(width: u32, height: u32) -> Self {
        Self {
            label: "window".to_owned(),
            width,
            height,
            viewport: Viewport {
                x: 0,
                y: 0,
                width,
                height,
            },
            clear_color: UNIFORM_CLEAR,
            modelview: Mat4::IDENTITY,
            projection: Mat4::orthographic_rh_gl(
                0.0,
                width as f32,
                height as f32,
                0.0,
                -99_999.0,
                99_999.0,
            ),
            color: None,
            depth: None,
            framebuffer: None,
            msaa_framebuffer: None,
        }
    }

    /// Makes this surface the active render target, sets the GPU viewport
    /// to the surface's viewport, and restores its cached matrices.
    ///
    /// When `use_msaa` is set and a multisampled framebuffer exists, the
    /// multisampled target is bound instead of the plain one. The GPU matrix
    /// stack stays in this surface's coordinate frame until the next bind.
    pub fn bind<D: RenderDevice>(&self, device: &mut D, use_msaa: bool) {
        let target = if use_msaa && self.msaa_framebuffer.is_some() {
            self.msaa_framebuffer
        } else {
            self.framebuffer
        };
        device.bind_framebuffer(target);
        device.set_viewport(self.viewport);
        device.set_matrices(&self.modelview, &self.projection);
    }

    /// Clears the currently bound target.
    ///
    /// Uses one uniform clear color for every surface; the stored
    /// `clear_color` is intentionally not consulted.
    pub fn clear<D: RenderDevice>(&self, device: &mut D) {
        device.clear(UNIFORM_CLEAR);
    }

    /// Releases every device resource owned by this surface.
    pub fn destroy<D: RenderDevice>(&mut self, device: &mut D) {
        if let Some(f) = self.msaa_framebuffer.take() {
            device.destroy_framebuffer(f);
        }
        if let Some(f) = self.framebuffer.take() {
            device.destroy_framebuffer(f);
        }
        if let Some(d) = self.depth.take() {
            device.destroy_depth_buffer(d);
        }
        if let Some(t) = self.color.take() {
            device.destroy_texture(t);
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    #[must_use]
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// The surface's color texture; `None` for the window surface.
    #[inline]
    #[must_use]
    pub fn texture(&self) -> Option<TextureId> {
        self.color
    }

    /// The plain (resolve-target) framebuffer; `None` for the window surface.
    #[inline]
    #[must_use]
    pub fn framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    /// The multisampled framebuffer, when one was created.
    #[inline]
    #[must_use]
    pub fn msaa_framebuffer(&self) -> Option<FramebufferId> {
        self.msaa_framebuffer
    }
}

/// Builds an ordered pyramid of `depth` surfaces, halving width and height
/// at each level (floor division, clamped to 1×1).
///
/// Level labels are `{label_prefix}{index}`. On a creation failure the
/// already-built levels are destroyed before the error is returned.
pub fn build_pyramid<D: RenderDevice>(
    device: &mut D,
    label_prefix: &str,
    base_width: u32,
    base_height: u32,
    depth: usize,
    desc: SurfaceDesc,
) -> Result<SmallVec<[Surface; 4]>> {
    let mut levels: SmallVec<[Surface; 4]> = SmallVec::new();
    let mut width = base_width.max(1);
    let mut height = base_height.max(1);

    for index in 0..depth {
        let label = format!("{label_prefix}{index}");
        match Surface::create(device, &label, width, height, desc) {
            Ok(surface) => levels.push(surface),
            Err(e) => {
                for mut level in levels {
                    level.destroy(device);
                }
                return Err(e);
            }
        }
        width = (width / 2).max(1);
        height = (height / 2).max(1);
    }

    Ok(levels)
}
