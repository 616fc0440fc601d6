//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that graphics backends must implement. The
//! renderer core never talks to a graphics API directly; every buffer upload,
//! texture bind and draw goes through [`GraphicsBackend`]. The backend is
//! chosen once at startup by [`create_backend`] and shared as
//! [`SharedBackend`] with every resource that needs to release GPU memory.

use std::fmt::Debug;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::headless::HeadlessBackend;
use super::types::{
    AttachmentPoint, BlendMode, BufferDescriptor, BufferId, ClearFlags, CullMode, FramebufferId,
    FramebufferStatus, PrimitiveTopology, ShaderDescriptor, ShaderId, StencilOp, TextureDescriptor,
    TextureId, UniformValue, VertexArrayId,
};
use crate::foundation::math::Vec4;
use crate::render::resources::layout::BufferLayout;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Shared handle to the active backend
pub type SharedBackend = Rc<dyn GraphicsBackend>;

/// Graphics API selection, resolved once when the renderer context is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsApi {
    /// No backend; creating a context with this value fails
    None,
    /// In-process recording backend without a GPU
    #[default]
    Headless,
}

/// Errors reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The handle does not name a live resource
    #[error("Unknown {kind} handle")]
    UnknownResource {
        /// Resource category, for diagnostics
        kind: &'static str,
    },

    /// A write or read fell outside the resource
    #[error("Access out of bounds: {offset} + {len} > {capacity}")]
    OutOfBounds {
        /// Start of the access
        offset: usize,
        /// Length of the access
        len: usize,
        /// Size of the resource
        capacity: usize,
    },

    /// A draw or bind was issued without the state it needs
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The operation is not available for this resource or format
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Primitive GPU operations the renderer core is built on
///
/// All methods take `&self`: the backend is shared through [`SharedBackend`]
/// by every resource wrapper, and implementations keep whatever mutable
/// state they need behind interior mutability. Calls are only ever made from
/// the thread that owns the graphics context.
pub trait GraphicsBackend: Debug {
    /// API this backend implements
    fn api(&self) -> GraphicsApi;

    // === Buffers ===

    /// Create a buffer, optionally filled with initial data
    fn create_buffer(&self, descriptor: &BufferDescriptor, data: Option<&[u8]>) -> BackendResult<BufferId>;

    /// Release a buffer; unknown ids are ignored
    fn delete_buffer(&self, id: BufferId);

    /// Overwrite `data.len()` bytes starting at `offset`
    fn upload_sub_data(&self, id: BufferId, offset: usize, data: &[u8]) -> BackendResult<()>;

    // === Vertex arrays ===

    /// Create an empty vertex array
    fn create_vertex_array(&self) -> BackendResult<VertexArrayId>;

    /// Release a vertex array; unknown ids are ignored
    fn delete_vertex_array(&self, id: VertexArrayId);

    /// Attach a vertex buffer whose attributes start at `first_location`
    fn attach_vertex_buffer(
        &self,
        vertex_array: VertexArrayId,
        buffer: BufferId,
        layout: &BufferLayout,
        first_location: u32,
    ) -> BackendResult<()>;

    /// Attach the index buffer used by indexed draws
    fn set_index_buffer(&self, vertex_array: VertexArrayId, buffer: BufferId) -> BackendResult<()>;

    /// Make a vertex array current
    fn bind_vertex_array(&self, vertex_array: VertexArrayId) -> BackendResult<()>;

    // === Textures ===

    /// Create a texture with undefined contents
    fn create_texture(&self, descriptor: &TextureDescriptor) -> BackendResult<TextureId>;

    /// Replace the full texel contents of a texture
    fn upload_texture(&self, id: TextureId, data: &[u8]) -> BackendResult<()>;

    /// Bind a texture to a sampler slot
    fn bind_texture(&self, id: TextureId, slot: u32) -> BackendResult<()>;

    /// Release a texture; unknown ids are ignored
    fn delete_texture(&self, id: TextureId);

    // === Framebuffers ===

    /// Create a framebuffer with no attachments
    fn create_framebuffer(&self) -> BackendResult<FramebufferId>;

    /// Attach a texture at the given attachment point
    fn attach_texture(&self, framebuffer: FramebufferId, point: AttachmentPoint, texture: TextureId) -> BackendResult<()>;

    /// Select how many color attachments are written by fragment shaders
    fn set_draw_buffers(&self, framebuffer: FramebufferId, count: u32) -> BackendResult<()>;

    /// Check completeness
    fn framebuffer_status(&self, framebuffer: FramebufferId) -> BackendResult<FramebufferStatus>;

    /// Bind a framebuffer, or the default target for `None`
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) -> BackendResult<()>;

    /// Release a framebuffer object; attachments are released separately
    fn delete_framebuffer(&self, id: FramebufferId);

    /// Read one texel from an integer color attachment
    fn read_pixel(&self, framebuffer: FramebufferId, attachment_index: u32, x: u32, y: u32) -> BackendResult<i32>;

    /// Fill an integer texture with a single value
    fn clear_texture(&self, texture: TextureId, value: i32) -> BackendResult<()>;

    // === Shaders ===

    /// Create a shader program
    fn create_shader(&self, descriptor: &ShaderDescriptor) -> BackendResult<ShaderId>;

    /// Make a shader program current
    fn enable_shader(&self, id: ShaderId) -> BackendResult<()>;

    /// Set a uniform on a program by name
    fn set_uniform(&self, id: ShaderId, name: &str, value: &UniformValue) -> BackendResult<()>;

    /// Release a shader program; unknown ids are ignored
    fn delete_shader(&self, id: ShaderId);

    // === Fixed-function state and draws ===

    /// Set the viewport rectangle
    fn set_viewport(&self, x: u32, y: u32, width: u32, height: u32);

    /// Set the color used by `clear`
    fn set_clear_color(&self, color: Vec4);

    /// Clear the selected buffers of the bound target
    fn clear(&self, flags: ClearFlags);

    /// Draw `index_count` indices from the bound vertex array
    fn draw_indexed(&self, index_count: u32) -> BackendResult<()>;

    /// Draw `vertex_count` vertices from the bound vertex array
    fn draw_arrays(&self, topology: PrimitiveTopology, vertex_count: u32) -> BackendResult<()>;

    /// Set rasterized line width
    fn set_line_width(&self, width: f32);

    /// Set blending
    fn set_blend(&self, mode: BlendMode);

    /// Set face culling
    fn set_cull_face(&self, mode: CullMode);

    /// Enable or disable depth testing
    fn set_depth_test(&self, enabled: bool);

    /// Enable or disable depth writes
    fn set_depth_mask(&self, enabled: bool);

    /// Set the stencil pass operation and reference value
    fn set_stencil_op(&self, op: StencilOp, reference: i32);
}

/// Create the backend for `api`
///
/// This is the single place where the graphics API is inspected; everything
/// downstream only sees the trait object.
pub fn create_backend(api: GraphicsApi) -> BackendResult<SharedBackend> {
    match api {
        GraphicsApi::Headless => {
            log::info!("Creating headless graphics backend");
            Ok(Rc::new(HeadlessBackend::new()))
        }
        GraphicsApi::None => {
            log::error!("Graphics API 'none' selected; no backend can be created");
            Err(BackendError::Unsupported("graphics API 'none'".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_resolves_headless() {
        let backend = create_backend(GraphicsApi::Headless).unwrap();
        assert_eq!(backend.api(), GraphicsApi::Headless);
    }

    #[test]
    fn test_factory_rejects_none() {
        assert!(matches!(create_backend(GraphicsApi::None), Err(BackendError::Unsupported(_))));
    }

    #[test]
    fn test_api_names_in_config_files() {
        #[derive(Deserialize)]
        struct Selection {
            api: GraphicsApi,
        }

        let selection: Selection = toml::from_str("api = \"headless\"").unwrap();
        assert_eq!(selection.api, GraphicsApi::Headless);
        assert!(toml::from_str::<Selection>("api = \"vulkan\"").is_err());
    }
}
