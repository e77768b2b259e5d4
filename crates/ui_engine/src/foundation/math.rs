//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the handful of projection and
//! orientation helpers the layout code needs. All 2-D layout math uses a
//! bottom-left origin with +Y pointing up.

pub use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (also used for RGBA colors)
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Orthographic projection mapping `[left, right] x [bottom, top]` to clip space
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Pixel-space overlay projection: `(0, 0)` bottom-left, `(width, height)` top-right
    fn screen_ortho(width: f32, height: f32) -> Mat4;

    /// Perspective projection, `fov_y` in radians
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed view matrix looking from `eye` towards `target`
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Model matrix whose +Z axis points along `forward` and +Y roughly along `up`
    ///
    /// The basis is re-orthogonalised: `right = normalize(up x forward)`,
    /// `up' = forward x right`. The result is `T * R * S`.
    fn billboard(position: Vec3, forward: Vec3, up: Vec3, scale: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn screen_ortho(width: f32, height: f32) -> Mat4 {
        Self::orthographic(0.0, width, 0.0, height, -1.0, 1.0)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn billboard(position: Vec3, forward: Vec3, up: Vec3, scale: Vec3) -> Mat4 {
        let forward = forward.normalize();
        let right = up.cross(&forward).normalize();
        let actual_up = forward.cross(&right);

        let right = right * scale.x;
        let actual_up = actual_up * scale.y;
        let forward = forward * scale.z;

        // Columns are [right | up | forward | position]
        Mat4::new(
            right.x, actual_up.x, forward.x, position.x,
            right.y, actual_up.y, forward.y, position.y,
            right.z, actual_up.z, forward.z, position.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Forward/up pair for an orientation given as pitch and yaw in radians
///
/// Yaw rotates about +Y starting from +Z; positive pitch tips the forward
/// vector downwards.
pub fn facing_from_pitch_yaw(pitch: f32, yaw: f32) -> (Vec3, Vec3) {
    let (sin_p, cos_p) = pitch.sin_cos();
    let (sin_y, cos_y) = yaw.sin_cos();

    let forward = Vec3::new(cos_p * sin_y, -sin_p, cos_p * cos_y).normalize();
    let up = Vec3::new(sin_p * sin_y, cos_p, sin_p * cos_y).normalize();
    (forward, up)
}

/// Project a local-space point to window pixels (bottom-left origin)
///
/// Returns `None` when the point lies behind the camera.
pub fn project_to_window(mvp: &Mat4, point: Vec3, width: f32, height: f32) -> Option<Vec2> {
    let clip = mvp * Vec4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    Some(Vec2::new(
        (ndc_x + 1.0) * 0.5 * width,
        (ndc_y + 1.0) * 0.5 * height,
    ))
}

/// Convert a matrix into the column-major array layout shader uniforms expect
pub fn to_cols_array(matrix: &Mat4) -> [[f32; 4]; 4] {
    (*matrix).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_screen_ortho_maps_corners_to_window_pixels() {
        let ortho = Mat4::screen_ortho(800.0, 600.0);

        let origin = project_to_window(&ortho, Vec3::zeros(), 800.0, 600.0).unwrap();
        assert_relative_eq!(origin.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(origin.y, 0.0, epsilon = 1e-4);

        let corner = project_to_window(&ortho, Vec3::new(800.0, 600.0, 0.0), 800.0, 600.0).unwrap();
        assert_relative_eq!(corner.x, 800.0, epsilon = 1e-3);
        assert_relative_eq!(corner.y, 600.0, epsilon = 1e-3);
    }

    #[test]
    fn test_billboard_basis_is_orthonormal_when_unscaled() {
        let m = Mat4::billboard(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        // +X maps to right = up x forward = +X
        let x = m * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(x.x, 1.0, epsilon = 1e-6);
        // Translation column
        assert_relative_eq!(m[(0, 3)], 1.0);
        assert_relative_eq!(m[(1, 3)], 2.0);
        assert_relative_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn test_facing_at_rest_looks_down_positive_z() {
        let (forward, up) = facing_from_pitch_yaw(0.0, 0.0);
        assert_relative_eq!(forward, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(up, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(forward.dot(&up), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_point_behind_camera_is_not_projected() {
        let proj = Mat4::perspective(1.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        let behind = project_to_window(&(proj * view), Vec3::new(0.0, 0.0, 5.0), 100.0, 100.0);
        assert!(behind.is_none());
    }
}
