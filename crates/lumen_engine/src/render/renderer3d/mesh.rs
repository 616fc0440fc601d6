//! Meshes and PBR materials
//!
//! [`MeshData`] is CPU geometry as handed over by the asset layer; [`Mesh`]
//! is the uploaded, drawable version.

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec3, Vec4};
use crate::render::api::SharedBackend;
use crate::render::resources::{BufferElement, BufferLayout, IndexBuffer, Shader, ShaderDataType, Texture2D, VertexArray, VertexBuffer};
use crate::render::{RenderError, RenderResult};

/// Vertex of a lit mesh
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

impl MeshVertex {
    /// Create a vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Attribute layout matching the struct fields
    pub fn layout() -> BufferLayout {
        BufferLayout::new(vec![
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float3, "a_Normal"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ])
    }
}

/// CPU-side triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Cube spanning [-1, 1] on every axis: 8 vertices, 36 indices
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            MeshVertex::new([-1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            MeshVertex::new([1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            MeshVertex::new([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            MeshVertex::new([-1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            // Back face
            MeshVertex::new([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
            MeshVertex::new([-1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
            MeshVertex::new([1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
            MeshVertex::new([1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
        ];

        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 2, 3, 0, // front
            4, 5, 6, 6, 7, 4, // back
            4, 0, 3, 3, 5, 4, // left
            1, 7, 6, 6, 2, 1, // right
            3, 2, 6, 6, 5, 3, // top
            4, 7, 1, 1, 0, 4, // bottom
        ];

        Self::new(vertices, indices)
    }

    /// Check that the data forms a drawable triangle list
    pub fn validate(&self) -> RenderResult<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(RenderError::InvalidMesh("mesh has no geometry".into()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "{} indices do not form whole triangles",
                self.indices.len()
            )));
        }
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            return Err(RenderError::InvalidMesh(format!(
                "index {index} past {} vertices",
                self.vertices.len()
            )));
        }
        Ok(())
    }
}

/// Uploaded mesh
#[derive(Debug)]
pub struct Mesh {
    vertex_array: VertexArray,
    vertex_count: usize,
}

impl Mesh {
    /// Upload validated mesh data
    pub fn new(backend: &SharedBackend, data: &MeshData) -> RenderResult<Self> {
        data.validate()?;

        let vertex_buffer = VertexBuffer::from_data(backend, bytemuck::cast_slice(&data.vertices), MeshVertex::layout())?;
        let index_buffer = IndexBuffer::new(backend, &data.indices)?;

        let mut vertex_array = VertexArray::new(backend)?;
        vertex_array.add_vertex_buffer(Rc::new(vertex_buffer))?;
        vertex_array.set_index_buffer(Rc::new(index_buffer))?;

        log::debug!(
            "Uploaded mesh: {} vertices, {} indices",
            data.vertices.len(),
            data.indices.len()
        );
        Ok(Self {
            vertex_array,
            vertex_count: data.vertices.len(),
        })
    }

    /// Vertex array carrying the mesh buffers
    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    /// Indices drawn per submission
    pub fn index_count(&self) -> u32 {
        self.vertex_array.index_count()
    }

    /// Vertices uploaded
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Sampler slot of the albedo map in lit shaders
pub const ALBEDO_MAP_SLOT: u32 = 0;

/// Metallic-roughness PBR material
#[derive(Debug, Clone)]
pub struct Material {
    /// Base color (RGBA)
    pub albedo: Vec4,
    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,
    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,
    /// Ambient occlusion multiplier
    pub ambient_occlusion: f32,
    /// Emitted color
    pub emission: Vec3,
    /// Optional albedo texture
    pub albedo_map: Option<Rc<Texture2D>>,
    /// Drawn in the blended pass after opaque geometry
    pub transparent: bool,
}

impl Material {
    /// Create a new material with default properties
    pub fn new() -> Self {
        Self {
            albedo: Vec4::new(1.0, 1.0, 1.0, 1.0),
            metallic: 0.0,
            roughness: 0.5,
            ambient_occlusion: 1.0,
            emission: Vec3::zeros(),
            albedo_map: None,
            transparent: false,
        }
    }

    /// Set the base color
    pub fn with_albedo(mut self, albedo: Vec4) -> Self {
        self.albedo = albedo;
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Set the albedo texture
    pub fn with_albedo_map(mut self, texture: Rc<Texture2D>) -> Self {
        self.albedo_map = Some(texture);
        self
    }

    /// Mark as transparent
    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Write the material uniforms and bind its textures
    pub fn apply(&self, shader: &Shader) -> RenderResult<()> {
        shader.set_float4("u_Material.Albedo", self.albedo)?;
        shader.set_float("u_Material.Metallic", self.metallic)?;
        shader.set_float("u_Material.Roughness", self.roughness)?;
        shader.set_float("u_Material.AO", self.ambient_occlusion)?;
        shader.set_float3("u_Material.Emission", self.emission)?;
        match &self.albedo_map {
            Some(texture) => {
                texture.bind(ALBEDO_MAP_SLOT)?;
                shader.set_int("u_AlbedoMap", ALBEDO_MAP_SLOT as i32)?;
                shader.set_int("u_Material.HasAlbedoMap", 1)?;
            }
            None => shader.set_int("u_Material.HasAlbedoMap", 0)?,
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::HeadlessBackend;

    #[test]
    fn test_cube_is_valid() {
        let cube = MeshData::cube();
        assert!(cube.validate().is_ok());
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut data = MeshData::cube();
        data.indices[5] = 8;
        assert!(matches!(data.validate(), Err(RenderError::InvalidMesh(_))));

        data.indices.truncate(4);
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_upload_exposes_index_count() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let mesh = Mesh::new(&backend, &MeshData::cube()).unwrap();
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_material_builders_clamp() {
        let material = Material::new().with_metallic(3.0).with_roughness(-1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
        assert!(!material.transparent);
    }
}
