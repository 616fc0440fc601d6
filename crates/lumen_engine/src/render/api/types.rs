//! Backend-agnostic resource identifiers and pipeline state enums

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::foundation::math::{Mat4, Vec3, Vec4};

new_key_type! {
    /// Handle to a GPU buffer (vertex or index data)
    pub struct BufferId;
    /// Handle to a vertex array object
    pub struct VertexArrayId;
    /// Handle to a texture object
    pub struct TextureId;
    /// Handle to a framebuffer object
    pub struct FramebufferId;
    /// Handle to a linked shader program
    pub struct ShaderId;
}

/// Which binding point a buffer is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex attribute data
    Vertex,
    /// 32-bit element indices
    Index,
}

/// How often a buffer's contents are expected to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Uploaded once at creation
    Static,
    /// Rewritten every batch
    Dynamic,
}

/// Creation parameters for a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Binding point
    pub kind: BufferKind,
    /// Update frequency hint
    pub usage: BufferUsage,
    /// Size in bytes
    pub size: usize,
}

/// Texel formats understood by the renderer core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGB
    Rgb8,
    /// 8-bit RGBA
    Rgba8,
    /// Single-channel signed integer, used for entity picking
    RedInteger,
    /// Combined 24-bit depth and 8-bit stencil
    Depth24Stencil8,
    /// 32-bit float depth, used for shadow maps
    Depth32F,
}

impl TextureFormat {
    /// Whether the format is a depth (or depth-stencil) format
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth24Stencil8 | Self::Depth32F)
    }

    /// Bytes per texel when uploading pixel data
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::RedInteger | Self::Depth24Stencil8 | Self::Depth32F => 4,
        }
    }
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Regular 2D texture
    Texture2D,
    /// Six-faced cube map
    Cube,
}

/// Minification / magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    /// Bilinear filtering
    #[default]
    Linear,
    /// Point sampling
    Nearest,
}

/// Creation parameters for a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Dimensionality
    pub kind: TextureKind,
    /// Texel format
    pub format: TextureFormat,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Sample count, 1 for non-multisampled
    pub samples: u32,
    /// Sampling filter
    pub filter: TextureFilter,
}

impl TextureDescriptor {
    /// Single-sampled 2D texture with linear filtering
    pub fn texture_2d(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            kind: TextureKind::Texture2D,
            format,
            width,
            height,
            samples: 1,
            filter: TextureFilter::Linear,
        }
    }

    /// Cube map whose faces are `size` x `size`
    pub fn cube(format: TextureFormat, size: u32) -> Self {
        Self {
            kind: TextureKind::Cube,
            format,
            width: size,
            height: size,
            samples: 1,
            filter: TextureFilter::Linear,
        }
    }

    /// Number of faces the texture stores
    pub fn layer_count(&self) -> usize {
        match self.kind {
            TextureKind::Texture2D => 1,
            TextureKind::Cube => 6,
        }
    }
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    /// Color attachment N
    Color(u32),
    /// Depth attachment
    Depth,
    /// Packed depth-stencil attachment
    DepthStencil,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Usable as a render target
    Complete,
    /// No attachments at all
    MissingAttachment,
    /// Attachments disagree in size or sample count
    IncompleteDimensions,
    /// Backend-specific failure
    Unsupported,
}

/// Primitive assembly mode for non-indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Independent triangles
    Triangles,
    /// Independent line segments
    Lines,
}

/// Color blending configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Blending disabled
    Disabled,
    /// Standard `src_alpha, 1 - src_alpha` blending
    Alpha,
    /// Additive blending
    Additive,
}

/// Face culling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull back faces
    Back,
    /// Cull front faces (used by the shadow pass)
    Front,
}

/// Stencil operation applied when the stencil test passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Leave the stencil buffer untouched
    Keep,
    /// Write the reference value
    Replace,
    /// Clear to zero
    Zero,
}

bitflags! {
    /// Buffers cleared by `clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachments
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
        /// Stencil attachment
        const STENCIL = 1 << 2;
    }
}

/// A uniform value addressed by name
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Single integer (also used for sampler bindings)
    Int(i32),
    /// Integer array, typically a sampler array
    IntArray(Vec<i32>),
    /// Single float
    Float(f32),
    /// Three-component vector
    Vec3(Vec3),
    /// Four-component vector
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(Mat4),
}

/// Source bundle handed to the backend when a shader program is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    /// Library name, also used in diagnostics
    pub name: String,
    /// Opaque vertex stage source
    pub vertex_source: String,
    /// Opaque fragment stage source
    pub fragment_source: String,
}

impl ShaderDescriptor {
    /// Descriptor with empty stage sources, enough for backends that ship
    /// their own built-in programs
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex_source: String::new(),
            fragment_source: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_formats() {
        assert!(TextureFormat::Depth24Stencil8.is_depth());
        assert!(TextureFormat::Depth32F.is_depth());
        assert!(!TextureFormat::RedInteger.is_depth());
    }

    #[test]
    fn test_cube_layer_count() {
        assert_eq!(TextureDescriptor::cube(TextureFormat::Rgba8, 16).layer_count(), 6);
        assert_eq!(TextureDescriptor::texture_2d(TextureFormat::Rgba8, 16, 16).layer_count(), 1);
    }

    #[test]
    fn test_clear_flags_combine() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!flags.contains(ClearFlags::STENCIL));
    }
}
