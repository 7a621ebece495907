//! Errors raised by the camera/transform layer.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Camera or projection parameters that would yield a singular or
    /// depth-inverted matrix. `inputs` echoes the offending values.
    #[error("Invalid camera configuration: {reason} ({inputs})")]
    InvalidCameraConfiguration { reason: &'static str, inputs: String },
}

impl CoreError {
    pub(crate) fn camera(reason: &'static str, inputs: impl Into<String>) -> Self {
        Self::InvalidCameraConfiguration {
            reason,
            inputs: inputs.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
