//! Graphics API abstraction
//!
//! The renderer core is written against [`GraphicsBackend`] only. Concrete
//! backends are created once through [`create_backend`].

pub mod backend;
pub mod headless;
pub mod types;

pub use backend::{create_backend, BackendError, BackendResult, GraphicsApi, GraphicsBackend, SharedBackend};
pub use headless::{BackendCommand, HeadlessBackend};
pub use types::{
    AttachmentPoint, BlendMode, BufferDescriptor, BufferId, BufferKind, BufferUsage, ClearFlags, CullMode,
    FramebufferId, FramebufferStatus, PrimitiveTopology, ShaderDescriptor, ShaderId, StencilOp,
    TextureDescriptor, TextureFilter, TextureFormat, TextureId, TextureKind, UniformValue, VertexArrayId,
};
