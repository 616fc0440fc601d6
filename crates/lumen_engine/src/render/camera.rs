//! # Cameras
//!
//! [`SceneCamera`] is the projection half of a runtime camera entity; its
//! view comes from the entity transform. [`EditorCamera`] carries its own
//! view and orbits a focal point.
//!
//! Both use right-handed, Y-up view space with depth mapped to [-1, 1].

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Vec2, Vec3};

/// Projection used by a [`SceneCamera`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProjectionType {
    /// Perspective projection
    #[default]
    Perspective,
    /// Orthographic projection
    Orthographic,
}

/// Camera projection for runtime cameras
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneCamera {
    projection_type: ProjectionType,
    perspective_fov: f32,
    perspective_near: f32,
    perspective_far: f32,
    orthographic_size: f32,
    orthographic_near: f32,
    orthographic_far: f32,
    aspect_ratio: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            perspective_fov: utils::deg_to_rad(45.0),
            perspective_near: 0.01,
            perspective_far: 1000.0,
            orthographic_size: 10.0,
            orthographic_near: -1.0,
            orthographic_far: 1.0,
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl SceneCamera {
    /// Perspective camera; `fov_degrees` is the vertical field of view
    pub fn perspective(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Perspective,
            perspective_fov: utils::deg_to_rad(fov_degrees),
            perspective_near: near,
            perspective_far: far,
            ..Default::default()
        }
    }

    /// Orthographic camera showing `size` world units vertically
    pub fn orthographic(size: f32, near: f32, far: f32) -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            orthographic_size: size,
            orthographic_near: near,
            orthographic_far: far,
            ..Default::default()
        }
    }

    /// Match the aspect ratio to a viewport; zero sizes are ignored
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
    }

    /// Projection matrix
    pub fn projection(&self) -> Mat4 {
        match self.projection_type {
            ProjectionType::Perspective => Mat4::perspective(
                self.perspective_fov,
                self.aspect_ratio,
                self.perspective_near,
                self.perspective_far,
            ),
            ProjectionType::Orthographic => {
                let half_height = self.orthographic_size * 0.5;
                let half_width = half_height * self.aspect_ratio;
                Mat4::orthographic(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.orthographic_near,
                    self.orthographic_far,
                )
            }
        }
    }

    /// Projection kind
    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    /// Switch projection kind
    pub fn set_projection_type(&mut self, projection_type: ProjectionType) {
        self.projection_type = projection_type;
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Vertical extent of the orthographic view
    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }
}

/// Orbiting editor camera
///
/// The camera sits `distance` units from `focal_point`, rotated by yaw and
/// pitch. All angles are in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorCamera {
    fov: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    focal_point: Vec3,
    distance: f32,
    pitch: f32,
    yaw: f32,
    viewport: (u32, u32),
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self::new(45.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl EditorCamera {
    /// Camera ten units in front of the origin
    pub fn new(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            fov: utils::deg_to_rad(fov_degrees),
            aspect_ratio,
            near,
            far,
            focal_point: Vec3::zeros(),
            distance: 10.0,
            pitch: 0.0,
            yaw: 0.0,
            viewport: (1280, 720),
        }
    }

    /// Match the aspect ratio to a viewport; zero sizes are ignored
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.aspect_ratio = width as f32 / height as f32;
    }

    /// Rotation of the camera
    pub fn orientation(&self) -> Quat {
        Quat::from_euler_angles(-self.pitch, -self.yaw, 0.0)
    }

    /// Viewing direction
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Camera right vector
    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::new(1.0, 0.0, 0.0)
    }

    /// Camera up vector
    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::new(0.0, 1.0, 0.0)
    }

    /// World position of the eye
    pub fn position(&self) -> Vec3 {
        self.focal_point - self.forward() * self.distance
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position(), self.focal_point, self.up())
    }

    /// Projection matrix
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Projection times view
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view_matrix()
    }

    /// Rotate around the focal point by a mouse delta
    pub fn orbit(&mut self, delta: Vec2) {
        const ROTATION_SPEED: f32 = 0.8;
        let yaw_sign = if self.up().y < 0.0 { -1.0 } else { 1.0 };
        self.yaw += yaw_sign * delta.x * ROTATION_SPEED;
        self.pitch += delta.y * ROTATION_SPEED;
    }

    /// Move the focal point in the view plane by a mouse delta
    pub fn pan(&mut self, delta: Vec2) {
        let (x_speed, y_speed) = self.pan_speed();
        self.focal_point += -self.right() * delta.x * x_speed * self.distance;
        self.focal_point += self.up() * delta.y * y_speed * self.distance;
    }

    /// Move toward the focal point; pushing past it moves the focal point
    pub fn zoom(&mut self, delta: f32) {
        self.distance -= delta * self.zoom_speed();
        if self.distance < 1.0 {
            self.focal_point += self.forward();
            self.distance = 1.0;
        }
    }

    /// Point the camera orbits
    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    /// Set the point the camera orbits
    pub fn set_focal_point(&mut self, focal_point: Vec3) {
        self.focal_point = focal_point;
    }

    /// Eye distance from the focal point
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Set the eye distance from the focal point
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(0.0);
    }

    /// Rotation about the camera X axis
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Rotation about the world Y axis
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    // Quadratic fit so panning feels uniform across viewport sizes.
    fn pan_speed(&self) -> (f32, f32) {
        let fit = |extent: u32| {
            let x = (extent as f32 / 1000.0).min(2.4);
            0.0366 * (x * x) - 0.1778 * x + 0.3021
        };
        (fit(self.viewport.0), fit(self.viewport.1))
    }

    fn zoom_speed(&self) -> f32 {
        let distance = (self.distance * 0.2).max(0.0);
        (distance * distance).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scene_camera_tracks_viewport_aspect() {
        let mut camera = SceneCamera::orthographic(10.0, -1.0, 1.0);
        camera.set_viewport_size(1600, 800);
        assert_relative_eq!(camera.aspect_ratio(), 2.0);

        camera.set_viewport_size(0, 800);
        assert_relative_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_orthographic_projection_maps_extent_to_clip_space() {
        let mut camera = SceneCamera::orthographic(4.0, -1.0, 1.0);
        camera.set_viewport_size(100, 100);
        let corner = camera.projection().transform_point(&crate::foundation::math::Point3::new(2.0, 2.0, 0.0));
        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_editor_camera_default_looks_down_negative_z() {
        let camera = EditorCamera::default();
        assert_relative_eq!(camera.forward(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-6);
    }

    #[test]
    fn test_zoom_clamps_at_focal_point() {
        let mut camera = EditorCamera::default();
        camera.set_distance(1.5);
        camera.zoom(100.0);
        assert_relative_eq!(camera.distance(), 1.0);
        assert_relative_eq!(camera.focal_point().z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orbit_changes_yaw_and_pitch() {
        let mut camera = EditorCamera::default();
        camera.orbit(Vec2::new(0.5, 0.25));
        assert_relative_eq!(camera.yaw(), 0.4);
        assert_relative_eq!(camera.pitch(), 0.2);
    }
}
