//! Afterglow — an off-screen, multi-pass bloom compositing pipeline.
//!
//! The pipeline renders the 3D scene into an off-screen surface, optionally
//! resolves multisampling, optionally blurs the whole scene when the
//! viewpoint is underwater, builds and blurs a bloom resolution pyramid,
//! and composites the glow-augmented result onto the window surface.
//!
//! The graphics API itself is a collaborator: implement
//! [`RenderDevice`](device::RenderDevice) for your backend, then drive
//! [`PostPipeline::begin`] / [`PostPipeline::end`] around your scene
//! rendering each frame.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod bloom;
pub mod blur;
pub mod device;
pub mod errors;
pub mod framebuffer;
pub mod pipeline;
pub mod settings;
pub mod surface;
pub mod surfaces;

pub use bloom::BloomStage;
pub use blur::{Axis, BlurKernel, KERNEL_TAPS};
pub use device::{
    DeviceCaps, DeviceFeatures, ProgramDesc, ProgramKind, QuadMapping, RenderDevice,
    TextureOptions, Viewport,
};
pub use errors::{AfterglowError, Result};
pub use framebuffer::FramebufferStage;
pub use pipeline::{FrameContext, PostPipeline};
pub use settings::{PipelineConfig, PipelineTuning};
pub use surface::{Surface, SurfaceDesc};
pub use surfaces::SurfaceSet;
