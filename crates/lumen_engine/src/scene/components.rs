//! Scene components
//!
//! Plain data read by the renderers; none of these types touch the GPU.

use std::rc::Rc;

use crate::foundation::math::{Mat4, Quat, Transform, Vec3, Vec4};
use crate::render::camera::SceneCamera;
use crate::render::renderer2d::{Font, TextParams};
use crate::render::renderer3d::{LightSource, Material, Mesh};
use crate::render::resources::Texture2D;

/// Spatial placement of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// World space position
    pub translation: Vec3,
    /// World space rotation
    pub rotation: Quat,
    /// Scale factors
    pub scale: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl TransformComponent {
    /// Create from position only
    pub fn from_position(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Set the rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Transform {
            position: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
        .to_matrix()
    }
}

/// Flat or textured quad
#[derive(Debug, Clone)]
pub struct SpriteRendererComponent {
    /// Tint, or the fill color when there is no texture
    pub color: Vec4,
    /// Optional texture
    pub texture: Option<Rc<Texture2D>>,
    /// Texture repeat count across the quad
    pub tiling_factor: f32,
}

impl Default for SpriteRendererComponent {
    fn default() -> Self {
        Self::new(Vec4::new(1.0, 1.0, 1.0, 1.0))
    }
}

impl SpriteRendererComponent {
    /// Untextured sprite
    pub fn new(color: Vec4) -> Self {
        Self {
            color,
            texture: None,
            tiling_factor: 1.0,
        }
    }

    /// Set the texture
    pub fn with_texture(mut self, texture: Rc<Texture2D>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Set the tiling factor
    pub fn with_tiling(mut self, tiling_factor: f32) -> Self {
        self.tiling_factor = tiling_factor;
        self
    }
}

/// Disc or ring inscribed in the entity quad
#[derive(Debug, Clone, PartialEq)]
pub struct CircleRendererComponent {
    /// Fill color
    pub color: Vec4,
    /// 1.0 fills the disc, smaller values draw a ring
    pub thickness: f32,
    /// Edge softness
    pub fade: f32,
}

impl Default for CircleRendererComponent {
    fn default() -> Self {
        Self {
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            thickness: 1.0,
            fade: 0.005,
        }
    }
}

/// MSDF text
#[derive(Debug, Clone)]
pub struct TextComponent {
    /// String to draw
    pub text: String,
    /// Font with its atlas
    pub font: Rc<Font>,
    /// Color and spacing
    pub params: TextParams,
}

impl TextComponent {
    /// Text with default parameters
    pub fn new(text: impl Into<String>, font: Rc<Font>) -> Self {
        Self {
            text: text.into(),
            font,
            params: TextParams::default(),
        }
    }
}

/// Light placed by the entity transform
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightSourceComponent {
    /// Photometric data
    pub light: LightSource,
}

impl From<LightSource> for LightSourceComponent {
    fn from(light: LightSource) -> Self {
        Self { light }
    }
}

/// Lit mesh
#[derive(Debug, Clone)]
pub struct MeshRendererComponent {
    /// Uploaded geometry
    pub mesh: Rc<Mesh>,
    /// Surface description
    pub material: Material,
    /// Rendered into the shadow map
    pub cast_shadows: bool,
}

impl MeshRendererComponent {
    /// Shadow-casting mesh
    pub fn new(mesh: Rc<Mesh>, material: Material) -> Self {
        Self {
            mesh,
            material,
            cast_shadows: true,
        }
    }
}

/// Runtime camera
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraComponent {
    /// Projection
    pub camera: SceneCamera,
    /// Used by `on_render_runtime`; the first primary camera wins
    pub primary: bool,
    /// Keep the aspect ratio on viewport resize
    pub fixed_aspect_ratio: bool,
}

impl CameraComponent {
    /// Primary camera with `camera` projection
    pub fn primary(camera: SceneCamera) -> Self {
        Self {
            camera,
            primary: true,
            fixed_aspect_ratio: false,
        }
    }
}

/// Environment cube map
#[derive(Debug, Clone)]
pub struct SkyboxComponent {
    /// Cube map texture
    pub cubemap: Rc<Texture2D>,
}
