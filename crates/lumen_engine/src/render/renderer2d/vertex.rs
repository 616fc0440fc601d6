//! Batch vertex formats
//!
//! One plain vertex struct per primitive kind. Field order must match the
//! element order of the layout returned by [`BatchVertex::layout`].

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec3, Vec4};
use crate::render::api::PrimitiveTopology;
use crate::render::resources::{BufferElement, BufferLayout, ShaderDataType};

/// Vertex type that can be accumulated in a [`super::BatchBuffer`]
pub trait BatchVertex: Pod {
    /// Vertices written per submitted primitive
    const VERTICES_PER_PRIMITIVE: usize;
    /// Indices consumed per primitive; 0 for non-indexed kinds
    const INDICES_PER_PRIMITIVE: usize;
    /// How the vertices are assembled
    const TOPOLOGY: PrimitiveTopology;
    /// Shader library name of the program drawing this kind
    const SHADER: &'static str;

    /// Attribute layout matching the struct fields
    fn layout() -> BufferLayout;
}

/// Quad vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// World position
    pub position: [f32; 3],
    /// RGBA color
    pub color: [f32; 4],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
    /// Sampler slot
    pub tex_index: f32,
    /// UV multiplier
    pub tiling_factor: f32,
    /// Owning entity, -1 for none
    pub entity_id: i32,
}

impl BatchVertex for QuadVertex {
    const VERTICES_PER_PRIMITIVE: usize = 4;
    const INDICES_PER_PRIMITIVE: usize = 6;
    const TOPOLOGY: PrimitiveTopology = PrimitiveTopology::Triangles;
    const SHADER: &'static str = "Renderer2D_Quad";

    fn layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            BufferElement::new(ShaderDataType::Float, "a_TexIndex"),
            BufferElement::new(ShaderDataType::Float, "a_TilingFactor"),
            BufferElement::new(ShaderDataType::Int, "a_EntityID"),
        ])
    }
}

/// Circle vertex; the fragment shader cuts the circle out of a quad
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CircleVertex {
    /// World position
    pub world_position: [f32; 3],
    /// Position inside the unit quad, in [-1, 1]
    pub local_position: [f32; 3],
    /// RGBA color
    pub color: [f32; 4],
    /// Ring thickness, 1 for a filled disc
    pub thickness: f32,
    /// Edge softness
    pub fade: f32,
    /// Owning entity, -1 for none
    pub entity_id: i32,
}

impl BatchVertex for CircleVertex {
    const VERTICES_PER_PRIMITIVE: usize = 4;
    const INDICES_PER_PRIMITIVE: usize = 6;
    const TOPOLOGY: PrimitiveTopology = PrimitiveTopology::Triangles;
    const SHADER: &'static str = "Renderer2D_Circle";

    fn layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_WorldPosition"),
            BufferElement::new(ShaderDataType::Float3, "a_LocalPosition"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float, "a_Thickness"),
            BufferElement::new(ShaderDataType::Float, "a_Fade"),
            BufferElement::new(ShaderDataType::Int, "a_EntityID"),
        ])
    }
}

/// Line vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// World position
    pub position: [f32; 3],
    /// RGBA color
    pub color: [f32; 4],
    /// Owning entity, -1 for none
    pub entity_id: i32,
}

impl BatchVertex for LineVertex {
    const VERTICES_PER_PRIMITIVE: usize = 2;
    const INDICES_PER_PRIMITIVE: usize = 0;
    const TOPOLOGY: PrimitiveTopology = PrimitiveTopology::Lines;
    const SHADER: &'static str = "Renderer2D_Line";

    fn layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Int, "a_EntityID"),
        ])
    }
}

/// MSDF glyph vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    /// World position
    pub position: [f32; 3],
    /// RGBA color
    pub color: [f32; 4],
    /// Atlas texture coordinate
    pub tex_coord: [f32; 2],
    /// Font atlas sampler slot
    pub atlas_index: f32,
    /// Owning entity, -1 for none
    pub entity_id: i32,
}

impl BatchVertex for TextVertex {
    const VERTICES_PER_PRIMITIVE: usize = 4;
    const INDICES_PER_PRIMITIVE: usize = 6;
    const TOPOLOGY: PrimitiveTopology = PrimitiveTopology::Triangles;
    const SHADER: &'static str = "Renderer2D_Text";

    fn layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            BufferElement::new(ShaderDataType::Float, "a_AtlasIndex"),
            BufferElement::new(ShaderDataType::Int, "a_EntityID"),
        ])
    }
}

/// Quad corners in local space, counter-clockwise from bottom-left
pub(crate) const QUAD_CORNERS: [[f32; 4]; 4] = [
    [-0.5, -0.5, 0.0, 1.0],
    [0.5, -0.5, 0.0, 1.0],
    [0.5, 0.5, 0.0, 1.0],
    [-0.5, 0.5, 0.0, 1.0],
];

/// Texture coordinates matching [`QUAD_CORNERS`]
pub(crate) const QUAD_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

pub(crate) fn to_array3(v: Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

pub(crate) fn to_array4(v: Vec4) -> [f32; 4] {
    [v.x, v.y, v.z, v.w]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_match_struct_sizes() {
        assert_eq!(QuadVertex::layout().stride() as usize, std::mem::size_of::<QuadVertex>());
        assert_eq!(CircleVertex::layout().stride() as usize, std::mem::size_of::<CircleVertex>());
        assert_eq!(LineVertex::layout().stride() as usize, std::mem::size_of::<LineVertex>());
        assert_eq!(TextVertex::layout().stride() as usize, std::mem::size_of::<TextVertex>());
    }

    #[test]
    fn test_quad_vertex_has_no_padding() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 12 * 4);
    }
}
