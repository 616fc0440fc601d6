//! Texture wrapper
//!
//! Textures arrive already decoded from the asset layer; this type only owns
//! the GPU copy. Identity is the backend handle: two `Texture2D` values are
//! equal exactly when they name the same GPU texture.

use std::rc::Rc;

use crate::render::api::{SharedBackend, TextureDescriptor, TextureFormat, TextureId, TextureKind};
use crate::render::{RenderError, RenderResult};

/// GPU texture (2D or cube map)
#[derive(Debug)]
pub struct Texture2D {
    backend: SharedBackend,
    id: TextureId,
    descriptor: TextureDescriptor,
}

impl Texture2D {
    /// Create a texture with undefined contents
    pub fn new(backend: &SharedBackend, descriptor: TextureDescriptor) -> RenderResult<Self> {
        let id = backend.create_texture(&descriptor)?;
        log::debug!(
            "Created {:?} texture {id:?} {}x{} {:?}",
            descriptor.kind,
            descriptor.width,
            descriptor.height,
            descriptor.format
        );
        Ok(Self {
            backend: Rc::clone(backend),
            id,
            descriptor,
        })
    }

    /// Create an RGBA8 texture from decoded pixels
    pub fn from_rgba8(backend: &SharedBackend, width: u32, height: u32, pixels: &[u8]) -> RenderResult<Self> {
        let texture = Self::new(backend, TextureDescriptor::texture_2d(TextureFormat::Rgba8, width, height))?;
        texture.set_data(pixels)?;
        Ok(texture)
    }

    /// 1x1 opaque white texture used for untextured draws
    pub fn white(backend: &SharedBackend) -> RenderResult<Self> {
        Self::from_rgba8(backend, 1, 1, &[0xff, 0xff, 0xff, 0xff])
    }

    /// Cube map from six RGBA8 faces in +X, -X, +Y, -Y, +Z, -Z order
    pub fn cube_from_faces(backend: &SharedBackend, size: u32, faces: &[&[u8]; 6]) -> RenderResult<Self> {
        let texture = Self::new(backend, TextureDescriptor::cube(TextureFormat::Rgba8, size))?;
        let pixels: Vec<u8> = faces.iter().flat_map(|face| face.iter().copied()).collect();
        texture.set_data(&pixels)?;
        Ok(texture)
    }

    /// Replace the full texel contents
    pub fn set_data(&self, data: &[u8]) -> RenderResult<()> {
        let expected = self.byte_size();
        if data.len() != expected {
            return Err(RenderError::InvalidTextureData {
                expected,
                actual: data.len(),
            });
        }
        self.backend.upload_texture(self.id, data)?;
        Ok(())
    }

    /// Bind to a sampler slot
    pub fn bind(&self, slot: u32) -> RenderResult<()> {
        self.backend.bind_texture(self.id, slot)?;
        Ok(())
    }

    /// Backend handle
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Whether this is a cube map
    pub fn is_cube(&self) -> bool {
        self.descriptor.kind == TextureKind::Cube
    }

    /// Creation parameters
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    fn byte_size(&self) -> usize {
        self.descriptor.width as usize
            * self.descriptor.height as usize
            * self.descriptor.format.bytes_per_texel()
            * self.descriptor.layer_count()
    }
}

impl PartialEq for Texture2D {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Texture2D {}

impl Drop for Texture2D {
    fn drop(&mut self) {
        self.backend.delete_texture(self.id);
    }
}
