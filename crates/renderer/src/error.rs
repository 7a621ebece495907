use asset::MeshError;
use corelib::CoreError;
use thiserror::Error;
use wgpu::TextureFormat;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Shader '{shader}' does not compile against the pipeline layout: {message}")]
    ShaderCompilation { shader: String, message: String },

    #[error("Surface format {requested:?} is not supported by the output surface (supported: {supported:?})")]
    UnsupportedSurfaceFormat {
        requested: TextureFormat,
        supported: Vec<TextureFormat>,
    },

    #[error("GPU device lost: {0}")]
    DeviceLost(String),

    #[error("Surface texture unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("No capable GPU adapter/device: {0}")]
    AdapterUnavailable(String),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        RenderError::SurfaceUnavailable(err.to_string())
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
