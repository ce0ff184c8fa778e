//! Shared test fixture: a recording render device.
//!
//! [`TraceDevice`] implements [`RenderDevice`] by recording every call into
//! a [`Call`] log, so tests can assert the exact pass sequence the pipeline
//! issues. Capabilities are configurable per test, and resource creation can
//! be made to fail to exercise the degrade-to-off paths.

use afterglow::device::{
    DepthBufferId, DeviceCaps, DeviceFeatures, FramebufferId, ProgramDesc, ProgramId, QuadMapping,
    RenderDevice, TextureId, TextureOptions, Viewport,
};
use afterglow::errors::{AfterglowError, Result};
use glam::Mat4;

/// One recorded device call.
#[derive(Clone, PartialEq, Debug)]
pub enum Call {
    CreateTexture {
        label: String,
        width: u32,
        height: u32,
        options: TextureOptions,
    },
    CreateDepthBuffer {
        width: u32,
        height: u32,
    },
    CreateFramebuffer {
        color: TextureId,
        depth: Option<DepthBufferId>,
    },
    CreateMultisampleFramebuffer {
        width: u32,
        height: u32,
        samples: u32,
        with_depth: bool,
    },
    DestroyTexture(TextureId),
    DestroyDepthBuffer(DepthBufferId),
    DestroyFramebuffer(FramebufferId),
    CompileProgram(ProgramDesc),
    DestroyProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniformI32 {
        program: ProgramId,
        name: String,
        value: i32,
    },
    SetUniformF32 {
        program: ProgramId,
        name: String,
        value: f32,
    },
    SetUniformF32Slice {
        program: ProgramId,
        name: String,
        values: Vec<f32>,
    },
    BindFramebuffer(Option<FramebufferId>),
    Blit {
        read: FramebufferId,
        draw: FramebufferId,
        width: u32,
        height: u32,
    },
    SetViewport(Viewport),
    SetMatrices,
    Clear([f32; 4]),
    BindTexture {
        unit: u32,
        texture: Option<TextureId>,
    },
    DrawQuad(QuadMapping),
    ResetTextureState,
}

/// Recording fake device.
pub struct TraceDevice {
    pub caps: DeviceCaps,
    pub calls: Vec<Call>,
    /// (texture, label) in creation order.
    textures: Vec<(TextureId, String)>,
    /// (framebuffer, color attachment) in creation order.
    framebuffers: Vec<(FramebufferId, TextureId)>,
    /// Multisampled framebuffers in creation order.
    msaa_framebuffers: Vec<FramebufferId>,
    /// Fail texture creation after this many successes (`Some(0)` fails
    /// immediately, `None` never fails).
    pub fail_textures_after: Option<u32>,
    /// Force program compilation to fail.
    pub fail_programs: bool,
    next_id: u32,
}

// Each test binary uses its own subset of these helpers.
#[allow(dead_code)]
impl TraceDevice {
    pub fn new(caps: DeviceCaps) -> Self {
        init_logging();
        Self {
            caps,
            calls: Vec::new(),
            textures: Vec::new(),
            framebuffers: Vec::new(),
            msaa_framebuffers: Vec::new(),
            fail_textures_after: None,
            fail_programs: false,
            next_id: 1,
        }
    }

    /// Every feature available, 8× maximum multisampling.
    pub fn full_caps() -> DeviceCaps {
        DeviceCaps {
            features: DeviceFeatures::RENDER_TARGETS
                | DeviceFeatures::SHADER_COMPILER
                | DeviceFeatures::MULTISAMPLE,
            max_samples: 8,
        }
    }

    /// Render targets and shader compiler, no multisampling.
    pub fn no_msaa_caps() -> DeviceCaps {
        DeviceCaps {
            features: DeviceFeatures::RENDER_TARGETS | DeviceFeatures::SHADER_COMPILER,
            max_samples: 0,
        }
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Texture created with `label`. Panics when absent.
    pub fn texture(&self, label: &str) -> TextureId {
        self.textures
            .iter()
            .find(|(_, l)| l == label)
            .map(|(id, _)| *id)
            .unwrap_or_else(|| panic!("no texture labeled '{label}'"))
    }

    /// Plain framebuffer whose color attachment is the texture labeled
    /// `label`. Panics when absent.
    pub fn framebuffer_of(&self, label: &str) -> FramebufferId {
        let texture = self.texture(label);
        self.framebuffers
            .iter()
            .find(|(_, color)| *color == texture)
            .map(|(id, _)| *id)
            .unwrap_or_else(|| panic!("no framebuffer for texture '{label}'"))
    }

    /// The `index`-th multisampled framebuffer, in creation order.
    pub fn msaa_framebuffer(&self, index: usize) -> FramebufferId {
        self.msaa_framebuffers[index]
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::DrawQuad(_)))
            .count()
    }

    pub fn count<F: Fn(&Call) -> bool>(&self, pred: F) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

/// Routes `log` output through the test harness. Safe to call repeatedly;
/// only the first call installs the logger.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

impl RenderDevice for TraceDevice {
    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        options: TextureOptions,
    ) -> Result<TextureId> {
        if let Some(remaining) = &mut self.fail_textures_after {
            if *remaining == 0 {
                return Err(AfterglowError::Device("texture allocation failed".into()));
            }
            *remaining -= 1;
        }
        self.calls.push(Call::CreateTexture {
            label: label.to_owned(),
            width,
            height,
            options,
        });
        let id = TextureId(self.next());
        self.textures.push((id, label.to_owned()));
        Ok(id)
    }

    fn create_depth_buffer(&mut self, width: u32, height: u32) -> Result<DepthBufferId> {
        self.calls.push(Call::CreateDepthBuffer { width, height });
        Ok(DepthBufferId(self.next()))
    }

    fn create_framebuffer(
        &mut self,
        color: TextureId,
        depth: Option<DepthBufferId>,
    ) -> Result<FramebufferId> {
        self.calls.push(Call::CreateFramebuffer { color, depth });
        let id = FramebufferId(self.next());
        self.framebuffers.push((id, color));
        Ok(id)
    }

    fn create_multisample_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        samples: u32,
        with_depth: bool,
    ) -> Result<FramebufferId> {
        self.calls.push(Call::CreateMultisampleFramebuffer {
            width,
            height,
            samples,
            with_depth,
        });
        let id = FramebufferId(self.next());
        self.msaa_framebuffers.push(id);
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.calls.push(Call::DestroyTexture(texture));
    }

    fn destroy_depth_buffer(&mut self, depth: DepthBufferId) {
        self.calls.push(Call::DestroyDepthBuffer(depth));
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.calls.push(Call::DestroyFramebuffer(framebuffer));
    }

    fn compile_program(&mut self, desc: &ProgramDesc) -> Result<ProgramId> {
        if self.fail_programs {
            return Err(AfterglowError::Device("program link failed".into()));
        }
        self.calls.push(Call::CompileProgram(desc.clone()));
        Ok(ProgramId(self.next()))
    }

    fn destroy_program(&mut self, program: ProgramId) {
        self.calls.push(Call::DestroyProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(Call::UseProgram(program));
    }

    fn set_uniform_i32(&mut self, program: ProgramId, name: &str, value: i32) {
        self.calls.push(Call::SetUniformI32 {
            program,
            name: name.to_owned(),
            value,
        });
    }

    fn set_uniform_f32(&mut self, program: ProgramId, name: &str, value: f32) {
        self.calls.push(Call::SetUniformF32 {
            program,
            name: name.to_owned(),
            value,
        });
    }

    fn set_uniform_f32_slice(&mut self, program: ProgramId, name: &str, values: &[f32]) {
        self.calls.push(Call::SetUniformF32Slice {
            program,
            name: name.to_owned(),
            values: values.to_vec(),
        });
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.calls.push(Call::BindFramebuffer(framebuffer));
    }

    fn blit_framebuffer(
        &mut self,
        read: FramebufferId,
        draw: FramebufferId,
        width: u32,
        height: u32,
    ) {
        self.calls.push(Call::Blit {
            read,
            draw,
            width,
            height,
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::SetViewport(viewport));
    }

    fn set_matrices(&mut self, _modelview: &Mat4, _projection: &Mat4) {
        self.calls.push(Call::SetMatrices);
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(Call::Clear(color));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        self.calls.push(Call::BindTexture { unit, texture });
    }

    fn draw_fullscreen_quad(&mut self, mapping: QuadMapping) {
        self.calls.push(Call::DrawQuad(mapping));
    }

    fn reset_texture_state(&mut self) {
        self.calls.push(Call::ResetTextureState);
    }
}
