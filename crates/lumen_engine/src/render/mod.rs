//! Rendering system
//!
//! The renderer core turns scene components into backend draw calls:
//!
//! - [`renderer2d::Renderer2D`]: batched quads, circles, lines and MSDF text
//! - [`renderer3d::SceneRenderer`]: forward-lit meshes, skybox and shadow pass
//! - [`command::RenderCommand`]: fixed-function state and draw dispatch
//! - [`context::RendererContext`]: owns all of the above for one graphics context
//!
//! Every GPU call goes through [`api::GraphicsBackend`]; nothing in this
//! module knows which graphics API sits underneath.

pub mod api;
pub mod camera;
pub mod command;
pub mod context;
pub mod renderer2d;
pub mod renderer3d;
pub mod resources;
pub mod stats;

pub use api::{create_backend, BackendError, GraphicsApi, GraphicsBackend, HeadlessBackend, SharedBackend};
pub use camera::{EditorCamera, ProjectionType, SceneCamera};
pub use command::RenderCommand;
pub use context::{RendererContext, SceneView};
pub use renderer2d::{BatchError, Font, Renderer2D, TextParams};
pub use renderer3d::{LightKind, LightSource, Material, Mesh, SceneRenderer};
pub use resources::{Framebuffer, FramebufferSpecification, Shader, ShaderLibrary, Texture2D};
pub use stats::RenderStats;

use crate::config::ConfigError;
use crate::render::api::FramebufferStatus;

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the renderer core
///
/// Conditions a debug build would assert on (incomplete framebuffers,
/// attachment indices out of range, an unusable graphics API) are reported
/// here and logged at error level where they are detected.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Renderer could not be brought up
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Batch buffer misuse
    #[error("Batch error: {0}")]
    Batch(#[from] renderer2d::BatchError),

    /// Framebuffer failed its completeness check
    #[error("Framebuffer incomplete: {0:?}")]
    IncompleteFramebuffer(FramebufferStatus),

    /// Framebuffer was used after its GPU objects were released
    #[error("Framebuffer has no live GPU object")]
    FramebufferReleased,

    /// Color attachment index past the attachment list
    #[error("Color attachment {index} out of range ({count} attachments)")]
    AttachmentOutOfRange {
        /// Requested index
        index: usize,
        /// Number of color attachments
        count: usize,
    },

    /// No shader with this name in the library
    #[error("Unknown shader: {0}")]
    UnknownShader(String),

    /// Texel data does not match the texture size
    #[error("Texture data size mismatch: expected {expected} bytes, got {actual}")]
    InvalidTextureData {
        /// Bytes the texture holds
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Mesh data cannot be drawn
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}
