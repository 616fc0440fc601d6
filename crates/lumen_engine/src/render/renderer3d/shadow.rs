//! Directional shadow map

use crate::config::ShadowConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::api::{SharedBackend, TextureFormat};
use crate::render::resources::{Framebuffer, FramebufferSpecification};
use crate::render::RenderResult;

/// Sampler slot the shadow map is bound to for lit shaders
pub const SHADOW_MAP_SLOT: u32 = 31;

/// Depth-only render target for one directional light
#[derive(Debug)]
pub struct ShadowMap {
    framebuffer: Framebuffer,
    config: ShadowConfig,
    light_space: Mat4,
}

impl ShadowMap {
    /// Allocate the depth target
    pub fn new(backend: &SharedBackend, config: &ShadowConfig, max_size: u32) -> RenderResult<Self> {
        let specification = FramebufferSpecification::new(config.map_size, config.map_size, vec![TextureFormat::Depth32F]);
        let framebuffer = Framebuffer::new(backend, specification, max_size)?;
        log::debug!("Shadow map allocated at {0}x{0}", config.map_size);
        Ok(Self {
            framebuffer,
            config: config.clone(),
            light_space: Mat4::identity(),
        })
    }

    /// Orthographic light-space matrix looking along `direction` at the origin
    pub fn light_space_matrix(direction: Vec3, config: &ShadowConfig) -> Mat4 {
        let extent = config.frustum_extent;
        let projection = Mat4::orthographic(-extent, extent, -extent, extent, config.near, config.far);

        let eye = -direction * (config.far * 0.5);
        let up = if direction.cross(&Vec3::y()).norm_squared() < 1e-6 {
            Vec3::z()
        } else {
            Vec3::y()
        };
        projection * Mat4::look_at(eye, Vec3::zeros(), up)
    }

    /// Aim the map along `direction`
    pub fn update(&mut self, direction: Vec3) {
        self.light_space = Self::light_space_matrix(direction, &self.config);
    }

    /// Matrix from world space into the map
    pub fn light_space(&self) -> &Mat4 {
        &self.light_space
    }

    /// Depth target
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Bind the depth texture to [`SHADOW_MAP_SLOT`]
    pub fn bind_map(&self, backend: &SharedBackend) -> RenderResult<()> {
        if let Some(depth) = self.framebuffer.depth_attachment() {
            backend.bind_texture(depth, SHADOW_MAP_SLOT)?;
        }
        Ok(())
    }
}
