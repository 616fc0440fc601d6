//! GPU buffer wrappers
//!
//! Each wrapper owns exactly one backend handle and releases it when dropped.
//! Wrappers that other objects need to keep alive (the shared quad index
//! buffer, vertex buffers inside a vertex array) are handed around as `Rc`.

use std::rc::Rc;

use crate::render::api::{BufferDescriptor, BufferId, BufferKind, BufferUsage, SharedBackend, VertexArrayId};
use crate::render::resources::layout::BufferLayout;
use crate::render::RenderResult;

/// Vertex buffer with an attribute layout
#[derive(Debug)]
pub struct VertexBuffer {
    backend: SharedBackend,
    id: BufferId,
    size: usize,
    layout: BufferLayout,
}

impl VertexBuffer {
    /// Allocate an uninitialized dynamic buffer of `size` bytes
    pub fn new_dynamic(backend: &SharedBackend, size: usize, layout: BufferLayout) -> RenderResult<Self> {
        let id = backend.create_buffer(
            &BufferDescriptor {
                kind: BufferKind::Vertex,
                usage: BufferUsage::Dynamic,
                size,
            },
            None,
        )?;
        log::debug!("Created dynamic vertex buffer {id:?} ({size} bytes)");
        Ok(Self {
            backend: Rc::clone(backend),
            id,
            size,
            layout,
        })
    }

    /// Create a static buffer holding `data`
    pub fn from_data(backend: &SharedBackend, data: &[u8], layout: BufferLayout) -> RenderResult<Self> {
        let id = backend.create_buffer(
            &BufferDescriptor {
                kind: BufferKind::Vertex,
                usage: BufferUsage::Static,
                size: data.len(),
            },
            Some(data),
        )?;
        Ok(Self {
            backend: Rc::clone(backend),
            id,
            size: data.len(),
            layout,
        })
    }

    /// Upload `data` to the start of the buffer
    pub fn set_data(&self, data: &[u8]) -> RenderResult<()> {
        self.backend.upload_sub_data(self.id, 0, data)?;
        Ok(())
    }

    /// Backend handle
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Capacity in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Attribute layout
    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        self.backend.delete_buffer(self.id);
    }
}

/// Static 32-bit index buffer
#[derive(Debug)]
pub struct IndexBuffer {
    backend: SharedBackend,
    id: BufferId,
    count: u32,
}

impl IndexBuffer {
    /// Upload `indices` into a new buffer
    pub fn new(backend: &SharedBackend, indices: &[u32]) -> RenderResult<Self> {
        let id = backend.create_buffer(
            &BufferDescriptor {
                kind: BufferKind::Index,
                usage: BufferUsage::Static,
                size: std::mem::size_of_val(indices),
            },
            Some(bytemuck::cast_slice(indices)),
        )?;
        Ok(Self {
            backend: Rc::clone(backend),
            id,
            count: indices.len() as u32,
        })
    }

    /// Backend handle
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Number of indices stored
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        self.backend.delete_buffer(self.id);
    }
}

/// Vertex array binding vertex buffers and an optional index buffer
#[derive(Debug)]
pub struct VertexArray {
    backend: SharedBackend,
    id: VertexArrayId,
    vertex_buffers: Vec<Rc<VertexBuffer>>,
    index_buffer: Option<Rc<IndexBuffer>>,
    next_location: u32,
}

impl VertexArray {
    /// Create an empty vertex array
    pub fn new(backend: &SharedBackend) -> RenderResult<Self> {
        let id = backend.create_vertex_array()?;
        Ok(Self {
            backend: Rc::clone(backend),
            id,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            next_location: 0,
        })
    }

    /// Attach a vertex buffer; its attributes follow those already attached
    pub fn add_vertex_buffer(&mut self, buffer: Rc<VertexBuffer>) -> RenderResult<()> {
        self.backend
            .attach_vertex_buffer(self.id, buffer.id(), buffer.layout(), self.next_location)?;
        self.next_location += buffer.layout().location_count();
        self.vertex_buffers.push(buffer);
        Ok(())
    }

    /// Attach the index buffer; it may be shared with other vertex arrays
    pub fn set_index_buffer(&mut self, buffer: Rc<IndexBuffer>) -> RenderResult<()> {
        self.backend.set_index_buffer(self.id, buffer.id())?;
        self.index_buffer = Some(buffer);
        Ok(())
    }

    /// Make this vertex array current
    pub fn bind(&self) -> RenderResult<()> {
        self.backend.bind_vertex_array(self.id)?;
        Ok(())
    }

    /// Backend handle
    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    /// Attached vertex buffers
    pub fn vertex_buffers(&self) -> &[Rc<VertexBuffer>] {
        &self.vertex_buffers
    }

    /// Attached index buffer
    pub fn index_buffer(&self) -> Option<&Rc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }

    /// Index count of the attached index buffer, 0 without one
    pub fn index_count(&self) -> u32 {
        self.index_buffer.as_ref().map_or(0, |ib| ib.count())
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.backend.delete_vertex_array(self.id);
    }
}
