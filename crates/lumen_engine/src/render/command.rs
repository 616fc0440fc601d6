//! Render command dispatch
//!
//! Thin engine-level entry points for fixed-function state and draws. The
//! renderers never call the backend for state changes directly; they go
//! through a `RenderCommand`, which keeps the list of state the core touches
//! in one place.

use std::rc::Rc;

use crate::foundation::math::Vec4;
use crate::render::api::{BlendMode, ClearFlags, CullMode, GraphicsApi, PrimitiveTopology, SharedBackend, StencilOp};
use crate::render::resources::VertexArray;
use crate::render::RenderResult;

/// Dispatcher bound to one backend
///
/// Cloning is cheap; every clone talks to the same backend.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    backend: SharedBackend,
}

impl RenderCommand {
    /// Create a dispatcher for `backend`
    pub fn new(backend: &SharedBackend) -> Self {
        Self {
            backend: Rc::clone(backend),
        }
    }

    /// Default state for a freshly created context
    pub fn init(&self) {
        self.backend.set_blend(BlendMode::Alpha);
        self.backend.set_depth_test(true);
        self.backend.set_depth_mask(true);
        self.backend.set_cull_face(CullMode::Back);
    }

    /// API of the underlying backend
    pub fn api(&self) -> GraphicsApi {
        self.backend.api()
    }

    /// Backend handle, for creating resources
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Set the viewport rectangle
    pub fn set_viewport(&self, x: u32, y: u32, width: u32, height: u32) {
        self.backend.set_viewport(x, y, width, height);
    }

    /// Set the clear color
    pub fn set_clear_color(&self, color: Vec4) {
        self.backend.set_clear_color(color);
    }

    /// Clear color, depth and stencil of the bound target
    pub fn clear(&self) {
        self.backend
            .clear(ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL);
    }

    /// Clear only the selected buffers
    pub fn clear_with(&self, flags: ClearFlags) {
        self.backend.clear(flags);
    }

    /// Indexed draw; `index_count` of 0 draws the full index buffer
    pub fn draw_indexed(&self, vertex_array: &VertexArray, index_count: u32) -> RenderResult<()> {
        let count = if index_count == 0 {
            vertex_array.index_count()
        } else {
            index_count
        };
        vertex_array.bind()?;
        self.backend.draw_indexed(count)?;
        Ok(())
    }

    /// Draw `vertex_count` vertices as independent line segments
    pub fn draw_lines(&self, vertex_array: &VertexArray, vertex_count: u32) -> RenderResult<()> {
        vertex_array.bind()?;
        self.backend.draw_arrays(PrimitiveTopology::Lines, vertex_count)?;
        Ok(())
    }

    /// Set rasterized line width
    pub fn set_line_width(&self, width: f32) {
        self.backend.set_line_width(width);
    }

    /// Set face culling
    pub fn set_cull_mode(&self, mode: CullMode) {
        self.backend.set_cull_face(mode);
    }

    /// Set blending
    pub fn set_blend(&self, mode: BlendMode) {
        self.backend.set_blend(mode);
    }

    /// Enable or disable depth writes
    pub fn set_depth_mask(&self, enabled: bool) {
        self.backend.set_depth_mask(enabled);
    }

    /// Enable or disable depth testing
    pub fn set_depth_test(&self, enabled: bool) {
        self.backend.set_depth_test(enabled);
    }

    /// Set the stencil pass operation
    pub fn set_stencil_op(&self, op: StencilOp, reference: i32) {
        self.backend.set_stencil_op(op, reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{BackendCommand, HeadlessBackend};

    #[test]
    fn test_clear_covers_all_buffers() {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        let command = RenderCommand::new(&backend);

        command.clear();
        assert_eq!(
            headless.commands(),
            vec![BackendCommand::Clear(ClearFlags::all())]
        );
    }

    #[test]
    fn test_draw_without_shader_fails() {
        let backend: SharedBackend = Rc::new(HeadlessBackend::new());
        let command = RenderCommand::new(&backend);
        let vertex_array = VertexArray::new(&backend).unwrap();
        assert!(command.draw_indexed(&vertex_array, 6).is_err());
    }

    #[test]
    fn test_init_sets_default_state() {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        RenderCommand::new(&backend).init();

        let commands = headless.commands();
        assert!(commands.contains(&BackendCommand::SetBlend(BlendMode::Alpha)));
        assert!(commands.contains(&BackendCommand::SetDepthTest(true)));
    }
}
