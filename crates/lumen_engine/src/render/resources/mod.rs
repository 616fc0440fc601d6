//! GPU resource wrappers
//!
//! Each wrapper owns one backend handle and releases it on drop.

pub mod buffer;
pub mod framebuffer;
pub mod layout;
pub mod shader;
pub mod texture;

pub use buffer::{IndexBuffer, VertexArray, VertexBuffer};
pub use framebuffer::{Framebuffer, FramebufferSpecification};
pub use layout::{BufferElement, BufferLayout, ShaderDataType};
pub use shader::{Shader, ShaderLibrary};
pub use texture::Texture2D;
