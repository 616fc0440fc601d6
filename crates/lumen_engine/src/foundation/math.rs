//! Math utilities and types
//!
//! Provides the fundamental math types shared by the renderer and the scene.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and scale
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with renderer-specific helpers
pub trait Mat4Ext {
    /// Right-handed perspective projection with depth mapped to [-1, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Orthographic projection from explicit clip planes
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Copy of the matrix with the translation column cleared.
    ///
    /// Used for skybox rendering where only the camera rotation matters.
    fn without_translation(&self) -> Mat4;

    /// Transform a point given as a homogeneous `w = 1` vector
    fn transform_vec4(&self, point: Vec4) -> Vec3;

    /// Translation column of an affine transform
    fn translation_part(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn without_translation(&self) -> Mat4 {
        let rotation: Mat3 = self.fixed_view::<3, 3>(0, 0).into_owned();
        rotation.to_homogeneous()
    }

    fn transform_vec4(&self, point: Vec4) -> Vec3 {
        let p = self * point;
        Vec3::new(p.x, p.y, p.z)
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_matrix_applies_scale_then_translation() {
        let transform = Transform::from_position_scale(Vec3::new(1.0, 2.0, 0.0), Vec3::new(2.0, 2.0, 1.0));
        let corner = transform.to_matrix().transform_vec4(Vec4::new(0.5, 0.5, 0.0, 1.0));

        assert_relative_eq!(corner.x, 2.0);
        assert_relative_eq!(corner.y, 3.0);
    }

    #[test]
    fn test_without_translation_keeps_rotation() {
        let view = Mat4::new_translation(&Vec3::new(5.0, -3.0, 2.0)) * Mat4::from_axis_angle(&Vec3::y_axis(), 0.5);
        let stripped = view.without_translation();

        assert_relative_eq!(stripped[(0, 3)], 0.0);
        assert_relative_eq!(stripped[(1, 3)], 0.0);
        assert_relative_eq!(stripped[(2, 3)], 0.0);
        assert_relative_eq!(stripped[(0, 0)], view[(0, 0)]);
        assert_relative_eq!(stripped[(2, 0)], view[(2, 0)]);
    }

    #[test]
    fn test_degree_conversion_round_trips() {
        assert_relative_eq!(utils::rad_to_deg(utils::deg_to_rad(45.0)), 45.0, epsilon = 1e-4);
    }
}
