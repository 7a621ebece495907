//! Core types: math re-exports, camera parameters, transform math, errors.

pub use glam::{Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod error;
pub mod transform;

pub use camera::CameraParams;
pub use error::{CoreError, CoreResult};
