//! Model/view/projection matrices.
//!
//! Convention: right-handed world and view space (camera looks down -Z),
//! perspective projection into clip space with depth in `[0, 1]`
//! (`Mat4::perspective_rh`), which is what wgpu/WebGPU expect. Depth testing
//! uses `Less` with a clear value of 1.0, so nearer fragments win.
//!
//! All functions return a fresh matrix and never touch their inputs.

use crate::camera::CameraParams;
use crate::error::{CoreError, CoreResult};
use crate::Mat4;

const EPSILON: f32 = 1e-6;

/// Model transform of the single mesh. Static identity pose.
#[inline]
pub fn model_matrix() -> Mat4 {
    Mat4::IDENTITY
}

/// Right-handed look-at matrix for `camera`.
pub fn view_matrix(camera: &CameraParams) -> CoreResult<Mat4> {
    let inputs = || {
        format!(
            "eye={:?}, target={:?}, up={:?}",
            camera.eye, camera.target, camera.up
        )
    };

    if !(camera.eye.is_finite() && camera.target.is_finite() && camera.up.is_finite()) {
        return Err(CoreError::camera("non-finite camera vector", inputs()));
    }

    let forward = camera.target - camera.eye;
    if forward.length_squared() < EPSILON * EPSILON {
        return Err(CoreError::camera("zero-length look direction", inputs()));
    }
    if camera.up.length_squared() < EPSILON * EPSILON {
        return Err(CoreError::camera("zero-length up vector", inputs()));
    }
    if forward.normalize().cross(camera.up.normalize()).length() < EPSILON {
        return Err(CoreError::camera(
            "up vector is parallel to the look direction",
            inputs(),
        ));
    }

    Ok(Mat4::look_at_rh(camera.eye, camera.target, camera.up))
}

/// Right-handed perspective projection, depth mapped to `[0, 1]`.
/// `fov_y_deg` is the vertical field of view in degrees.
pub fn projection_matrix(aspect: f32, fov_y_deg: f32, z_near: f32, z_far: f32) -> CoreResult<Mat4> {
    let inputs = || {
        format!(
            "aspect={aspect}, fov={fov_y_deg}deg, near={z_near}, far={z_far}"
        )
    };

    if !(aspect.is_finite() && fov_y_deg.is_finite() && z_near.is_finite() && z_far.is_finite()) {
        return Err(CoreError::camera("non-finite projection parameter", inputs()));
    }
    if z_near <= 0.0 {
        return Err(CoreError::camera("near plane must be positive", inputs()));
    }
    if z_near >= z_far {
        return Err(CoreError::camera("near plane must be closer than far plane", inputs()));
    }
    if fov_y_deg <= 0.0 || fov_y_deg >= 180.0 {
        return Err(CoreError::camera("field of view must be within (0, 180) degrees", inputs()));
    }
    if aspect <= 0.0 {
        return Err(CoreError::camera("aspect ratio must be positive", inputs()));
    }

    Ok(Mat4::perspective_rh(
        fov_y_deg.to_radians(),
        aspect,
        z_near,
        z_far,
    ))
}

/// Clip-from-model matrix: `projection * view * model`.
pub fn mvp(camera: &CameraParams, model: Mat4) -> CoreResult<Mat4> {
    let projection = projection_matrix(camera.aspect, camera.fov_y_deg, camera.z_near, camera.z_far)?;
    let view = view_matrix(camera)?;
    Ok(projection * view * model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Vec3, vec3};
    use approx::assert_relative_eq;

    fn reference_camera() -> CameraParams {
        CameraParams::default()
    }

    #[test]
    fn model_is_identity() {
        assert_eq!(model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn target_lands_on_negative_z_in_view_space() {
        let cam = reference_camera();
        let view = view_matrix(&cam).unwrap();
        let p = view.transform_point3(cam.target);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-4);
        assert!(p.z < 0.0);
        assert_relative_eq!(p.z, -cam.eye.distance(cam.target), epsilon = 1e-4);
    }

    #[test]
    fn mvp_projects_target_to_screen_center() {
        let cam = reference_camera();
        let m = mvp(&cam, model_matrix()).unwrap();
        let clip = m * cam.target.extend(1.0);
        assert!(clip.w > 0.0);
        let ndc = clip.truncate() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "ndc z = {}", ndc.z);
    }

    #[test]
    fn mvp_composes_projection_view_model() {
        let cam = reference_camera();
        let model = Mat4::from_translation(vec3(1.0, -2.0, 0.5));
        let expected = projection_matrix(cam.aspect, cam.fov_y_deg, cam.z_near, cam.z_far).unwrap()
            * view_matrix(&cam).unwrap()
            * model;
        assert_eq!(mvp(&cam, model).unwrap(), expected);
    }

    #[test]
    fn depth_range_is_zero_to_one() {
        let proj = projection_matrix(1.0, 90.0, 0.5, 50.0).unwrap();
        let near = proj.project_point3(vec3(0.0, 0.0, -0.5));
        let far = proj.project_point3(vec3(0.0, 0.0, -50.0));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn fov_is_taken_in_degrees() {
        let proj = projection_matrix(1.0, 90.0, 0.1, 10.0).unwrap();
        // cot(45deg) == 1
        assert_relative_eq!(proj.col(1).y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn near_not_less_than_far_is_rejected() {
        for (near, far) in [(1.0, 1.0), (10.0, 1.0)] {
            let err = projection_matrix(4.0 / 3.0, 120.0, near, far).unwrap_err();
            assert!(matches!(err, CoreError::InvalidCameraConfiguration { .. }));
        }
    }

    #[test]
    fn bad_projection_inputs_are_rejected() {
        assert!(projection_matrix(1.0, 0.0, 0.1, 10.0).is_err());
        assert!(projection_matrix(1.0, 180.0, 0.1, 10.0).is_err());
        assert!(projection_matrix(0.0, 60.0, 0.1, 10.0).is_err());
        assert!(projection_matrix(1.0, 60.0, 0.0, 10.0).is_err());
        assert!(projection_matrix(1.0, f32::NAN, 0.1, 10.0).is_err());
    }

    #[test]
    fn zero_length_look_direction_is_rejected() {
        let mut cam = reference_camera();
        cam.target = cam.eye;
        let err = view_matrix(&cam).unwrap_err();
        let CoreError::InvalidCameraConfiguration { reason, .. } = err;
        assert_eq!(reason, "zero-length look direction");
        assert!(mvp(&cam, Mat4::IDENTITY).is_err());
    }

    #[test]
    fn up_parallel_to_look_is_rejected() {
        let cam = CameraParams {
            eye: vec3(0.0, 5.0, 0.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            ..reference_camera()
        };
        assert!(view_matrix(&cam).is_err());
    }

    #[test]
    fn error_reports_inputs() {
        let err = projection_matrix(1.0, 60.0, 5.0, 1.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("near=5"), "{msg}");
        assert!(msg.contains("far=1"), "{msg}");
    }
}
