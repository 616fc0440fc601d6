//! Generic batch buffer
//!
//! A `BatchBuffer<V>` accumulates the vertices of one primitive kind on the
//! CPU and hands the written range to its GPU vertex buffer on upload. The
//! CPU storage is allocated once at the full batch capacity and never grows.

use std::rc::Rc;

use super::vertex::BatchVertex;
use crate::render::api::SharedBackend;
use crate::render::resources::{IndexBuffer, VertexArray, VertexBuffer};
use crate::render::RenderResult;

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors raised by batch buffers and slot tables
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// The batch already holds its maximum number of primitives
    #[error("Batch capacity exceeded: {max} primitives")]
    CapacityExceeded {
        /// Primitive capacity
        max: usize,
    },

    /// A primitive was pushed with the wrong number of vertices
    #[error("Expected {expected} vertices per primitive, got {actual}")]
    VertexCount {
        /// Vertices per primitive for this kind
        expected: usize,
        /// Vertices supplied
        actual: usize,
    },

    /// Every texture slot of the batch is occupied
    #[error("All {max} texture slots are in use")]
    SlotsExhausted {
        /// Slot count
        max: usize,
    },
}

/// Build the shared index pattern `0,1,2, 2,3,0` repeated for `max_quads`
/// quads, each repetition offset by 4 vertices
pub fn quad_indices(max_quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(max_quads * 6);
    for quad in 0..max_quads as u32 {
        let offset = quad * 4;
        indices.extend_from_slice(&[offset, offset + 1, offset + 2, offset + 2, offset + 3, offset]);
    }
    indices
}

/// CPU accumulation buffer plus the GPU objects it feeds
#[derive(Debug)]
pub struct BatchBuffer<V: BatchVertex> {
    vertices: Vec<V>,
    max_primitives: usize,
    vertex_buffer: Rc<VertexBuffer>,
    vertex_array: VertexArray,
}

impl<V: BatchVertex> BatchBuffer<V> {
    /// Allocate CPU and GPU storage for `max_primitives` primitives
    ///
    /// Indexed kinds need `index_buffer`; it is shared between kinds with the
    /// same topology.
    pub fn new(
        backend: &SharedBackend,
        max_primitives: usize,
        index_buffer: Option<Rc<IndexBuffer>>,
    ) -> RenderResult<Self> {
        let max_vertices = max_primitives * V::VERTICES_PER_PRIMITIVE;
        let vertex_buffer = Rc::new(VertexBuffer::new_dynamic(
            backend,
            max_vertices * std::mem::size_of::<V>(),
            V::layout(),
        )?);

        let mut vertex_array = VertexArray::new(backend)?;
        vertex_array.add_vertex_buffer(Rc::clone(&vertex_buffer))?;
        if let Some(index_buffer) = index_buffer {
            vertex_array.set_index_buffer(index_buffer)?;
        }

        Ok(Self {
            vertices: Vec::with_capacity(max_vertices),
            max_primitives,
            vertex_buffer,
            vertex_array,
        })
    }

    /// Whether one more primitive fits
    pub fn has_room(&self) -> bool {
        self.primitive_count() < self.max_primitives
    }

    /// Append one primitive's vertices
    pub fn push(&mut self, vertices: &[V]) -> BatchResult<()> {
        if vertices.len() != V::VERTICES_PER_PRIMITIVE {
            return Err(BatchError::VertexCount {
                expected: V::VERTICES_PER_PRIMITIVE,
                actual: vertices.len(),
            });
        }
        if !self.has_room() {
            return Err(BatchError::CapacityExceeded {
                max: self.max_primitives,
            });
        }
        self.vertices.extend_from_slice(vertices);
        Ok(())
    }

    /// Upload the written range; returns the byte count sent
    pub fn upload(&self) -> RenderResult<usize> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        self.vertex_buffer.set_data(bytes)?;
        Ok(bytes.len())
    }

    /// Forget every written primitive
    pub fn reset(&mut self) {
        self.vertices.clear();
    }

    /// Primitives written since the last reset
    pub fn primitive_count(&self) -> usize {
        self.vertices.len() / V::VERTICES_PER_PRIMITIVE
    }

    /// Vertices written since the last reset
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Indices consumed by the written primitives, or the vertex count for
    /// non-indexed kinds
    pub fn element_count(&self) -> u32 {
        if V::INDICES_PER_PRIMITIVE == 0 {
            self.vertex_count()
        } else {
            (self.primitive_count() * V::INDICES_PER_PRIMITIVE) as u32
        }
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Primitive capacity
    pub fn max_primitives(&self) -> usize {
        self.max_primitives
    }

    /// Written vertices
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    /// Vertex array to draw from
    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;
    use crate::render::api::{BackendCommand, HeadlessBackend};
    use crate::render::renderer2d::vertex::{LineVertex, QuadVertex};

    fn line(x: f32) -> [LineVertex; 2] {
        let vertex = LineVertex {
            position: [x, 0.0, 0.0],
            color: [1.0; 4],
            entity_id: -1,
        };
        [vertex, vertex]
    }

    #[test]
    fn test_quad_index_pattern() {
        assert_eq!(quad_indices(2), vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn test_push_past_capacity_is_an_error() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let mut lines = BatchBuffer::<LineVertex>::new(&backend, 2, None).unwrap();

        lines.push(&line(0.0)).unwrap();
        lines.push(&line(1.0)).unwrap();
        assert!(!lines.has_room());
        assert_eq!(lines.push(&line(2.0)), Err(BatchError::CapacityExceeded { max: 2 }));
        assert_eq!(lines.vertex_count(), 4);
    }

    #[test]
    fn test_wrong_vertex_count_is_rejected() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let mut lines = BatchBuffer::<LineVertex>::new(&backend, 2, None).unwrap();
        let [first, _] = line(0.0);
        assert!(matches!(lines.push(&[first]), Err(BatchError::VertexCount { expected: 2, actual: 1 })));
    }

    #[test]
    fn test_upload_sends_only_written_bytes() {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        let indices = Rc::new(IndexBuffer::new(&backend, &quad_indices(8)).unwrap());
        let mut quads = BatchBuffer::<QuadVertex>::new(&backend, 8, Some(indices)).unwrap();

        quads.push(&[QuadVertex::zeroed(); 4]).unwrap();
        headless.clear_commands();
        let uploaded = quads.upload().unwrap();

        assert_eq!(uploaded, 4 * std::mem::size_of::<QuadVertex>());
        assert!(matches!(
            headless.commands().as_slice(),
            [BackendCommand::UploadSubData { offset: 0, size, .. }] if *size == uploaded
        ));
        assert_eq!(quads.element_count(), 6);
    }

    #[test]
    fn test_reset_clears_counts() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let mut lines = BatchBuffer::<LineVertex>::new(&backend, 4, None).unwrap();
        lines.push(&line(0.0)).unwrap();
        assert_eq!(lines.element_count(), 2);

        lines.reset();
        assert!(lines.is_empty());
        assert_eq!(lines.element_count(), 0);
    }
}
