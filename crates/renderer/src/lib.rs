//! Renderer: device acquisition, shader validation, pipeline building and the frame loop.
//! wgpu = 26.x

pub mod error;
pub mod frame;
pub mod gpu;
pub mod pipeline;
pub mod shader;
pub mod surface;
pub mod target;
pub mod uniform;
pub mod vertex;

pub use error::{RenderError, RenderResult};
pub use frame::{DriverState, FrameDriver, StopToken, Tick};
pub use gpu::{DeviceLostSignal, GpuContext};
pub use pipeline::{DEPTH_FORMAT, FrameResources, PipelineDesc, PipelineState, build};
pub use shader::ShaderDesc;
pub use surface::{SurfaceFrame, SurfaceProvider, check_surface_format, preferred_format};
pub use target::OffscreenTarget;
pub use uniform::{MVP_UNIFORM_SIZE, MvpUniform, UniformWrite};
