//! Render Device Interface
//!
//! The pipeline never talks to a graphics API directly. Everything it needs
//! from the GPU — texture and framebuffer creation, program compilation,
//! uniform uploads, texture-unit binding, full-screen quad submission,
//! viewport and matrix state — is expressed through the [`RenderDevice`]
//! trait and implemented by a backend.
//!
//! # Design
//!
//! - Handles ([`TextureId`], [`FramebufferId`], …) are opaque backend tokens.
//!   The pipeline owns them for its lifetime and releases every one during
//!   [`PostPipeline::shutdown`](crate::PostPipeline::shutdown).
//! - Shader **source text is a backend concern**: the pipeline requests
//!   programs by role through [`ProgramDesc`] and addresses their inputs by
//!   the uniform names documented on [`ProgramKind`].
//! - Capability discovery goes through [`RenderDevice::caps`]; a missing
//!   capability disables the pipeline instead of failing the frame.

use crate::errors::Result;
use glam::Mat4;

// ─── Handles ──────────────────────────────────────────────────────────────────

/// Opaque handle to a backend color texture.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TextureId(pub u32);

/// Opaque handle to a backend depth buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DepthBufferId(pub u32);

/// Opaque handle to a backend framebuffer object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FramebufferId(pub u32);

/// Opaque handle to a linked shader program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProgramId(pub u32);

// ─── Capabilities ─────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Feature bits reported by the device.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct DeviceFeatures: u32 {
        /// Off-screen render targets (framebuffer objects) are available.
        const RENDER_TARGETS  = 1 << 0;
        /// A runtime shader compiler is available.
        const SHADER_COMPILER = 1 << 1;
        /// Multisampled render targets and resolve blits are available.
        const MULTISAMPLE     = 1 << 2;
    }
}

/// Capability report queried once per frame at pipeline entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DeviceCaps {
    /// Supported feature set.
    pub features: DeviceFeatures,
    /// Maximum hardware sample count (0 when multisampling is unavailable).
    pub max_samples: u32,
}

impl DeviceCaps {
    /// Returns `true` when `feature` is supported.
    #[inline]
    #[must_use]
    pub fn supports(&self, feature: DeviceFeatures) -> bool {
        self.features.contains(feature)
    }
}

// ─── Resource Descriptors ─────────────────────────────────────────────────────

/// Creation options for a color texture.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TextureOptions {
    /// Use linear minification/magnification filtering (nearest otherwise).
    pub linear_filter: bool,
    /// Use a floating-point color format (fixed-point otherwise).
    pub floating_point: bool,
}

/// The role a shader program plays in the pipeline.
///
/// The backend supplies whatever source text realizes the role; the pipeline
/// only relies on the uniform names listed per variant.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ProgramKind {
    /// Straight textured copy of the bound source.
    ///
    /// Uniforms: `source` (sampler unit index).
    Blit,
    /// Symmetric 1-D blur along one axis.
    ///
    /// Uniforms: `source` (sampler unit index), `coefficients`
    /// (`taps` normalized weights), `offsetx`/`offsety` (texel step along
    /// the active axis; the inactive axis stays 0).
    SeparableBlur {
        /// Number of filter taps (kernel size).
        taps: u32,
    },
    /// Weighted combine of the blurred pyramid with the base scene.
    ///
    /// Uniforms: `Pass0`..`Pass{levels-1}` (pyramid sampler unit indices)
    /// and `Scene` (base scene sampler unit index).
    BloomCombine {
        /// Number of pyramid levels blended with the scene.
        levels: u32,
    },
}

/// Descriptor for requesting a shader program from the backend.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProgramDesc {
    /// Debug label for the program.
    pub label: &'static str,
    /// Role the program fulfills.
    pub kind: ProgramKind,
}

// ─── Draw State ───────────────────────────────────────────────────────────────

/// GPU viewport rectangle in pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Texture-coordinate mapping for the full-screen quad.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QuadMapping {
    /// NDC quad with upright texture coordinates; used by every off-screen
    /// pass.
    Normalized,
    /// Pixel-space quad with vertically flipped texture coordinates; used
    /// only for the final composite onto the window surface.
    WindowFlipped,
}

// ─── RenderDevice ─────────────────────────────────────────────────────────────

/// The graphics-API boundary consumed by the pipeline.
///
/// All calls execute in strict program order on a single render thread; the
/// pipeline issues no parallel submissions (each pass reads the texture the
/// previous pass wrote).
pub trait RenderDevice {
    /// Reports device capabilities. Queried at initialization and re-checked
    /// every frame.
    fn caps(&self) -> DeviceCaps;

    // ── Resource lifecycle ──────────────────────────────────────────────

    /// Allocates a color texture of the given size.
    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        options: TextureOptions,
    ) -> Result<TextureId>;

    /// Allocates a depth buffer of the given size.
    fn create_depth_buffer(&mut self, width: u32, height: u32) -> Result<DepthBufferId>;

    /// Creates a framebuffer object binding `color` and optionally `depth`.
    fn create_framebuffer(
        &mut self,
        color: TextureId,
        depth: Option<DepthBufferId>,
    ) -> Result<FramebufferId>;

    /// Creates a multisampled framebuffer with `samples` samples per pixel.
    fn create_multisample_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        samples: u32,
        with_depth: bool,
    ) -> Result<FramebufferId>;

    fn destroy_texture(&mut self, texture: TextureId);
    fn destroy_depth_buffer(&mut self, depth: DepthBufferId);
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    // ── Programs ────────────────────────────────────────────────────────

    /// Compiles and links the program realizing `desc`.
    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId>;

    fn destroy_program(&mut self, program: ProgramId);

    /// Makes `program` current; `None` restores the fixed default.
    fn use_program(&mut self, program: Option<ProgramId>);

    fn set_uniform_i32(&mut self, program: ProgramId, name: &str, value: i32);
    fn set_uniform_f32(&mut self, program: ProgramId, name: &str, value: f32);
    fn set_uniform_f32_slice(&mut self, program: ProgramId, name: &str, values: &[f32]);

    // ── Render-target state ─────────────────────────────────────────────

    /// Binds `framebuffer` as the render target; `None` binds the
    /// window-system-provided back buffer.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Resolves `read` into `draw` over a `width`×`height` rectangle.
    fn blit_framebuffer(
        &mut self,
        read: FramebufferId,
        draw: FramebufferId,
        width: u32,
        height: u32,
    );

    fn set_viewport(&mut self, viewport: Viewport);

    /// Loads the modelview and projection matrices.
    fn set_matrices(&mut self, modelview: &Mat4, projection: &Mat4);

    /// Clears the currently bound render target to `color`.
    fn clear(&mut self, color: [f32; 4]);

    // ── Texturing and submission ────────────────────────────────────────

    /// Binds `texture` to the numbered unit; `None` disables the unit.
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);

    /// Submits one full-screen quad sampling the bound source.
    fn draw_fullscreen_quad(&mut self, mapping: QuadMapping);

    /// Restores neutral texture-unit state: unit 0 active and enabled.
    fn reset_texture_state(&mut self);
}
