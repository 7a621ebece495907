use crate::{Mat4, Quat, Vec3, transform};
use crate::error::CoreResult;

/// Perspective camera parameters (right-handed, looks down -Z in view space).
///
/// Field of view is vertical and stored in degrees; conversion to radians
/// happens inside [`transform::projection_matrix`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl CameraParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_deg: f32,
        z_near: f32,
        z_far: f32,
        aspect: f32,
    ) -> Self {
        Self {
            eye,
            target,
            up,
            aspect,
            fov_y_deg,
            z_near,
            z_far,
        }
    }

    /// Clip-from-world matrix. Fails for degenerate camera parameters, so it
    /// doubles as a configuration check before any GPU work.
    pub fn proj_view(&self) -> CoreResult<Mat4> {
        let proj = transform::projection_matrix(self.aspect, self.fov_y_deg, self.z_near, self.z_far)?;
        Ok(proj * transform::view_matrix(self)?)
    }

    #[inline]
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Aspect ratio from physical pixel dimensions (zero sizes clamp to 1).
    #[inline]
    pub fn with_viewport(self, width: u32, height: u32) -> Self {
        self.with_aspect(width.max(1) as f32 / height.max(1) as f32)
    }

    /// Rotate the eye about `target` around the `up` axis.
    /// Distance to the target and height along `up` are preserved.
    pub fn orbited(mut self, angle_rad: f32) -> Self {
        let axis = self.up.normalize_or_zero();
        if axis == Vec3::ZERO || angle_rad == 0.0 {
            return self;
        }
        let offset = self.eye - self.target;
        self.eye = self.target + Quat::from_axis_angle(axis, angle_rad) * offset;
        self
    }
}

impl Default for CameraParams {
    /// Fixed camera: at (10, 10, 10) looking at the origin, 120° vertical fov.
    fn default() -> Self {
        Self::new_perspective(
            Vec3::new(10.0, 10.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            120.0,
            0.1,
            100.0,
            4.0 / 3.0,
        )
    }
}
