//! Per-frame render statistics

use std::ops::AddAssign;

/// Counters accumulated by every submission and draw call
///
/// Zeroed by `reset`, read by tooling, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Draw calls issued
    pub draw_calls: u32,
    /// Quads submitted (sprites and colored quads)
    pub quad_count: u32,
    /// Circles submitted
    pub circle_count: u32,
    /// Line segments submitted
    pub line_count: u32,
    /// Text glyphs submitted
    pub glyph_count: u32,
    /// Meshes submitted by the scene renderer, skybox included
    pub mesh_count: u32,
}

impl RenderStats {
    /// Zero every counter
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Vertices written into 2D batch buffers
    pub fn total_vertex_count(&self) -> u32 {
        (self.quad_count + self.circle_count + self.glyph_count) * 4 + self.line_count * 2
    }

    /// Indices consumed by indexed batches
    pub fn total_index_count(&self) -> u32 {
        (self.quad_count + self.circle_count + self.glyph_count) * 6
    }
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, other: Self) {
        self.draw_calls += other.draw_calls;
        self.quad_count += other.quad_count;
        self.circle_count += other.circle_count;
        self.line_count += other.line_count;
        self.glyph_count += other.glyph_count;
        self.mesh_count += other.mesh_count;
    }
}
