//! Vertex buffer layout descriptions
//!
//! A [`BufferLayout`] tells the backend how the bytes of one interleaved
//! vertex are split into shader attributes. Offsets and stride are derived
//! from the element list, so the element order must match the field order of
//! the `#[repr(C)]` vertex struct it describes.

/// Scalar/vector/matrix type of a single vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    /// `float`
    Float,
    /// `vec2`
    Float2,
    /// `vec3`
    Float3,
    /// `vec4`
    Float4,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `int`
    Int,
    /// `ivec2`
    Int2,
    /// `ivec3`
    Int3,
    /// `ivec4`
    Int4,
    /// `bool`
    Bool,
}

impl ShaderDataType {
    /// Size in bytes
    pub const fn size(self) -> u32 {
        match self {
            Self::Float | Self::Int => 4,
            Self::Float2 | Self::Int2 => 4 * 2,
            Self::Float3 | Self::Int3 => 4 * 3,
            Self::Float4 | Self::Int4 => 4 * 4,
            Self::Mat3 => 4 * 3 * 3,
            Self::Mat4 => 4 * 4 * 4,
            Self::Bool => 1,
        }
    }

    /// Components per attribute location
    pub const fn component_count(self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::Bool => 1,
            Self::Float2 | Self::Int2 => 2,
            Self::Float3 | Self::Int3 | Self::Mat3 => 3,
            Self::Float4 | Self::Int4 | Self::Mat4 => 4,
        }
    }

    /// Attribute locations consumed; matrices take one per column
    pub const fn location_count(self) -> u32 {
        match self {
            Self::Mat3 => 3,
            Self::Mat4 => 4,
            _ => 1,
        }
    }

    /// Whether the attribute is fed through the integer attribute path
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int | Self::Int2 | Self::Int3 | Self::Int4 | Self::Bool)
    }
}

/// One named attribute inside a vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferElement {
    /// Attribute name as written in the shader
    pub name: String,
    /// Attribute type
    pub data_type: ShaderDataType,
    /// Size in bytes
    pub size: u32,
    /// Byte offset from the start of the vertex
    pub offset: u32,
    /// Normalize integer data into [0, 1] when converted to float
    pub normalized: bool,
}

impl BufferElement {
    /// Create a non-normalized element; the offset is filled in by the layout
    pub fn new(data_type: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            size: data_type.size(),
            offset: 0,
            normalized: false,
        }
    }

    /// Mark the element as normalized
    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

/// Ordered attribute list with computed offsets and stride
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    /// Build a layout, computing each element's offset and the total stride
    pub fn new(mut elements: Vec<BufferElement>) -> Self {
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size;
        }
        Self { elements, stride: offset }
    }

    /// Elements in declaration order
    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    /// Bytes between consecutive vertices
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Total attribute locations consumed by the layout
    pub fn location_count(&self) -> u32 {
        self.elements.iter().map(|e| e.data_type.location_count()).sum()
    }

    /// Whether the layout has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_and_stride() {
        let layout = BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float4, "a_Color"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
            BufferElement::new(ShaderDataType::Int, "a_EntityID"),
        ]);

        let offsets: Vec<u32> = layout.elements().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0, 12, 28, 36]);
        assert_eq!(layout.stride(), 40);
    }

    #[test]
    fn test_matrix_attributes_span_locations() {
        let layout = BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Mat4, "a_Model"),
            BufferElement::new(ShaderDataType::Float, "a_Fade"),
        ]);
        assert_eq!(layout.location_count(), 5);
        assert_eq!(layout.stride(), 68);
    }

    #[test]
    fn test_empty_layout() {
        let layout = BufferLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }
}
