//! # Batched 2D renderer
//!
//! Quads, circles, lines and MSDF glyphs are accumulated in one
//! [`BatchBuffer`] per kind and sent to the GPU in as few draw calls as
//! possible.
//!
//! ## Batch lifecycle
//!
//! - `begin_scene` uploads the camera and starts a batch
//! - every `draw_*` call checks capacity first and starts a new batch itself
//!   when the kind's buffer or the texture slots are exhausted
//! - `flush` draws each non-empty kind once, in the order quads, circles,
//!   lines, text
//! - `end_scene` performs the final flush
//!
//! Textured quads and glyphs use separate slot tables: regular textures
//! share slots with the white texture in slot 0, font atlases start at 0.

pub mod batch;
pub mod font;
pub mod texture_slots;
pub mod vertex;

use std::rc::Rc;

pub use batch::{quad_indices, BatchBuffer, BatchError, BatchResult};
pub use font::{layout_text, Font, FontMetrics, Glyph, GlyphBounds, GlyphQuad, TextParams};
pub use texture_slots::{TextureSlotTable, MAX_TEXTURE_SLOTS};
pub use vertex::{BatchVertex, CircleVertex, LineVertex, QuadVertex, TextVertex};

use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::command::RenderCommand;
use crate::render::resources::{IndexBuffer, Shader, ShaderLibrary, Texture2D};
use crate::render::stats::RenderStats;
use crate::render::RenderResult;
use crate::scene::SpriteRendererComponent;
use vertex::{to_array3, to_array4, QUAD_CORNERS, QUAD_TEX_COORDS};

/// Entity id written for primitives that belong to no entity
pub const NO_ENTITY: i32 = -1;

/// Batched 2D renderer
#[derive(Debug)]
pub struct Renderer2D {
    command: RenderCommand,
    quads: BatchBuffer<QuadVertex>,
    circles: BatchBuffer<CircleVertex>,
    lines: BatchBuffer<LineVertex>,
    glyphs: BatchBuffer<TextVertex>,
    texture_slots: TextureSlotTable,
    font_slots: TextureSlotTable,
    white_texture: Rc<Texture2D>,
    quad_shader: Rc<Shader>,
    circle_shader: Rc<Shader>,
    line_shader: Rc<Shader>,
    text_shader: Rc<Shader>,
    line_width: f32,
    stats: RenderStats,
}

impl Renderer2D {
    /// Allocate batch storage and look up the 2D shaders in `shaders`
    pub fn new(command: &RenderCommand, shaders: &ShaderLibrary, config: &RendererConfig) -> RenderResult<Self> {
        let backend = command.backend();
        let max_quads = config.max_quads as usize;

        // Quads, circles and glyphs draw the same two triangles per primitive.
        let quad_index_buffer = Rc::new(IndexBuffer::new(backend, &quad_indices(max_quads))?);
        let quads = BatchBuffer::new(backend, max_quads, Some(Rc::clone(&quad_index_buffer)))?;
        let circles = BatchBuffer::new(backend, max_quads, Some(Rc::clone(&quad_index_buffer)))?;
        let glyphs = BatchBuffer::new(backend, max_quads, Some(quad_index_buffer))?;
        let lines = BatchBuffer::new(backend, config.max_lines as usize, None)?;

        let white_texture = Rc::new(Texture2D::white(backend)?);

        let quad_shader = shaders.get(QuadVertex::SHADER)?;
        let circle_shader = shaders.get(CircleVertex::SHADER)?;
        let line_shader = shaders.get(LineVertex::SHADER)?;
        let text_shader = shaders.get(TextVertex::SHADER)?;

        let samplers: Vec<i32> = (0..MAX_TEXTURE_SLOTS as i32).collect();
        for shader in [&quad_shader, &text_shader] {
            shader.enable()?;
            shader.set_int_array("u_Textures", &samplers)?;
        }

        log::info!(
            "Renderer2D ready: {max_quads} quads / {} lines per batch, {MAX_TEXTURE_SLOTS} texture slots",
            config.max_lines
        );

        Ok(Self {
            command: command.clone(),
            quads,
            circles,
            lines,
            glyphs,
            texture_slots: TextureSlotTable::with_reserved(Rc::clone(&white_texture)),
            font_slots: TextureSlotTable::new(),
            white_texture,
            quad_shader,
            circle_shader,
            line_shader,
            text_shader,
            line_width: config.line_width,
            stats: RenderStats::default(),
        })
    }

    // === Batch lifecycle ===

    /// Upload the camera to every 2D shader and start a batch
    pub fn begin_scene(&mut self, view_projection: &Mat4) -> RenderResult<()> {
        for shader in [&self.quad_shader, &self.circle_shader, &self.line_shader, &self.text_shader] {
            shader.enable()?;
            shader.set_mat4("u_ViewProjection", view_projection)?;
        }
        self.start_batch();
        Ok(())
    }

    /// Final flush of the scene
    pub fn end_scene(&mut self) -> RenderResult<()> {
        self.flush()
    }

    /// Reset every kind's buffer and both slot tables; issues no GPU calls
    pub fn start_batch(&mut self) {
        self.quads.reset();
        self.circles.reset();
        self.lines.reset();
        self.glyphs.reset();
        self.texture_slots.reset();
        self.font_slots.reset();
    }

    /// Draw everything accumulated since the last batch start
    ///
    /// Kinds with nothing written are skipped entirely.
    pub fn flush(&mut self) -> RenderResult<()> {
        if !self.quads.is_empty() {
            let bytes = self.quads.upload()?;
            self.texture_slots.bind_all()?;
            self.quad_shader.enable()?;
            self.command
                .draw_indexed(self.quads.vertex_array(), self.quads.element_count())?;
            self.stats.draw_calls += 1;
            log::trace!(
                "Flushed {} quads ({bytes} bytes, {} textures)",
                self.quads.primitive_count(),
                self.texture_slots.next_index()
            );
        }

        if !self.circles.is_empty() {
            let bytes = self.circles.upload()?;
            self.circle_shader.enable()?;
            self.command
                .draw_indexed(self.circles.vertex_array(), self.circles.element_count())?;
            self.stats.draw_calls += 1;
            log::trace!("Flushed {} circles ({bytes} bytes)", self.circles.primitive_count());
        }

        if !self.lines.is_empty() {
            let bytes = self.lines.upload()?;
            self.line_shader.enable()?;
            self.command.set_line_width(self.line_width);
            self.command
                .draw_lines(self.lines.vertex_array(), self.lines.vertex_count())?;
            self.stats.draw_calls += 1;
            log::trace!("Flushed {} lines ({bytes} bytes)", self.lines.primitive_count());
        }

        if !self.glyphs.is_empty() {
            let bytes = self.glyphs.upload()?;
            self.font_slots.bind_all()?;
            self.text_shader.enable()?;
            self.command
                .draw_indexed(self.glyphs.vertex_array(), self.glyphs.element_count())?;
            self.stats.draw_calls += 1;
            log::trace!("Flushed {} glyphs ({bytes} bytes)", self.glyphs.primitive_count());
        }

        Ok(())
    }

    /// Flush, then start a fresh batch
    pub fn next_batch(&mut self) -> RenderResult<()> {
        self.flush()?;
        self.start_batch();
        Ok(())
    }

    // === Quads ===

    /// Flat-colored quad
    pub fn draw_quad(&mut self, transform: &Mat4, color: Vec4, entity_id: i32) -> RenderResult<()> {
        if !self.quads.has_room() {
            self.next_batch()?;
        }
        self.write_quad(transform, color, 0.0, 1.0, entity_id)
    }

    /// Flat-colored, axis-aligned quad centered at `position`
    pub fn draw_quad_at(&mut self, position: Vec3, size: Vec2, color: Vec4) -> RenderResult<()> {
        let transform = Mat4::new_translation(&position) * Mat4::new_nonuniform_scaling(&Vec3::new(size.x, size.y, 1.0));
        self.draw_quad(&transform, color, NO_ENTITY)
    }

    /// Textured quad tinted by `tint`
    pub fn draw_textured_quad(
        &mut self,
        transform: &Mat4,
        texture: &Rc<Texture2D>,
        tiling_factor: f32,
        tint: Vec4,
        entity_id: i32,
    ) -> RenderResult<()> {
        if !self.quads.has_room() {
            self.next_batch()?;
        }
        let tex_index = self.quad_texture_slot(texture)?;
        self.write_quad(transform, tint, tex_index, tiling_factor, entity_id)
    }

    /// Quad from a sprite component
    pub fn draw_sprite(&mut self, transform: &Mat4, sprite: &SpriteRendererComponent, entity_id: i32) -> RenderResult<()> {
        match &sprite.texture {
            Some(texture) => self.draw_textured_quad(transform, texture, sprite.tiling_factor, sprite.color, entity_id),
            None => self.draw_quad(transform, sprite.color, entity_id),
        }
    }

    // === Circles ===

    /// Circle inscribed in the transformed unit quad
    ///
    /// `thickness` of 1 fills the disc; smaller values draw a ring. `fade`
    /// softens the edge.
    pub fn draw_circle(
        &mut self,
        transform: &Mat4,
        color: Vec4,
        thickness: f32,
        fade: f32,
        entity_id: i32,
    ) -> RenderResult<()> {
        if !self.circles.has_room() {
            self.next_batch()?;
        }

        let color = to_array4(color);
        let vertices = QUAD_CORNERS.map(|corner| {
            let local = Vec4::from(corner);
            CircleVertex {
                world_position: to_array3((transform * local).xyz()),
                local_position: [corner[0] * 2.0, corner[1] * 2.0, 0.0],
                color,
                thickness,
                fade,
                entity_id,
            }
        });
        self.circles.push(&vertices)?;
        self.stats.circle_count += 1;
        Ok(())
    }

    // === Lines ===

    /// Line segment from `p0` to `p1`
    pub fn draw_line(&mut self, p0: Vec3, p1: Vec3, color: Vec4, entity_id: i32) -> RenderResult<()> {
        if !self.lines.has_room() {
            self.next_batch()?;
        }

        let color = to_array4(color);
        let vertices = [p0, p1].map(|p| LineVertex {
            position: to_array3(p),
            color,
            entity_id,
        });
        self.lines.push(&vertices)?;
        self.stats.line_count += 1;
        Ok(())
    }

    /// Axis-aligned rectangle outline centered at `position`
    pub fn draw_rect(&mut self, position: Vec3, size: Vec2, color: Vec4, entity_id: i32) -> RenderResult<()> {
        let half = Vec3::new(size.x * 0.5, size.y * 0.5, 0.0);
        let corners = [
            Vec3::new(position.x - half.x, position.y - half.y, position.z),
            Vec3::new(position.x + half.x, position.y - half.y, position.z),
            Vec3::new(position.x + half.x, position.y + half.y, position.z),
            Vec3::new(position.x - half.x, position.y + half.y, position.z),
        ];
        self.draw_outline(corners, color, entity_id)
    }

    /// Outline of the transformed unit quad
    pub fn draw_rect_transform(&mut self, transform: &Mat4, color: Vec4, entity_id: i32) -> RenderResult<()> {
        let corners = QUAD_CORNERS.map(|corner| (transform * Vec4::from(corner)).xyz());
        self.draw_outline(corners, color, entity_id)
    }

    /// Width used for line batches
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Change the width used for line batches
    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    // === Text ===

    /// MSDF text; the transform places text space (one unit per line of
    /// ascender-to-descender height) in the world
    pub fn draw_string(
        &mut self,
        text: &str,
        font: &Font,
        transform: &Mat4,
        params: &TextParams,
        entity_id: i32,
    ) -> RenderResult<()> {
        for quad in layout_text(font, text, params) {
            if !self.glyphs.has_room() {
                self.next_batch()?;
            }
            let atlas_index = self.font_slot(font.atlas())?;

            let corners = [
                ([quad.plane.left, quad.plane.bottom], [quad.tex.left, quad.tex.bottom]),
                ([quad.plane.left, quad.plane.top], [quad.tex.left, quad.tex.top]),
                ([quad.plane.right, quad.plane.top], [quad.tex.right, quad.tex.top]),
                ([quad.plane.right, quad.plane.bottom], [quad.tex.right, quad.tex.bottom]),
            ];
            let vertices = corners.map(|([x, y], tex_coord)| TextVertex {
                position: to_array3((transform * Vec4::new(x, y, 0.0, 1.0)).xyz()),
                color: params.color,
                tex_coord,
                atlas_index,
                entity_id,
            });
            self.glyphs.push(&vertices)?;
            self.stats.glyph_count += 1;
        }
        Ok(())
    }

    // === Statistics ===

    /// Counters since the last reset
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Zero the counters
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    // === Inspection ===

    /// Next free regular texture slot
    pub fn texture_slot_index(&self) -> u32 {
        self.texture_slots.next_index()
    }

    /// Next free font atlas slot
    pub fn font_slot_index(&self) -> u32 {
        self.font_slots.next_index()
    }

    /// Quad vertices written in the current batch
    pub fn quad_vertices(&self) -> &[QuadVertex] {
        self.quads.vertices()
    }

    /// Texture bound to slot 0 of every quad batch
    pub fn white_texture(&self) -> &Rc<Texture2D> {
        &self.white_texture
    }

    fn write_quad(
        &mut self,
        transform: &Mat4,
        color: Vec4,
        tex_index: f32,
        tiling_factor: f32,
        entity_id: i32,
    ) -> RenderResult<()> {
        let color = to_array4(color);
        let vertices: [QuadVertex; 4] = std::array::from_fn(|i| QuadVertex {
            position: to_array3((transform * Vec4::from(QUAD_CORNERS[i])).xyz()),
            color,
            tex_coord: QUAD_TEX_COORDS[i],
            tex_index,
            tiling_factor,
            entity_id,
        });
        self.quads.push(&vertices)?;
        self.stats.quad_count += 1;
        Ok(())
    }

    fn draw_outline(&mut self, corners: [Vec3; 4], color: Vec4, entity_id: i32) -> RenderResult<()> {
        for (i, &start) in corners.iter().enumerate() {
            self.draw_line(start, corners[(i + 1) % corners.len()], color, entity_id)?;
        }
        Ok(())
    }

    fn quad_texture_slot(&mut self, texture: &Rc<Texture2D>) -> RenderResult<f32> {
        if let Some(slot) = self.texture_slots.find(texture) {
            return Ok(slot as f32);
        }
        if self.texture_slots.is_full() {
            self.next_batch()?;
        }
        Ok(self.texture_slots.assign(Rc::clone(texture))? as f32)
    }

    fn font_slot(&mut self, atlas: &Rc<Texture2D>) -> RenderResult<f32> {
        if let Some(slot) = self.font_slots.find(atlas) {
            return Ok(slot as f32);
        }
        if self.font_slots.is_full() {
            self.next_batch()?;
        }
        Ok(self.font_slots.assign(Rc::clone(atlas))? as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{BackendCommand, HeadlessBackend, ShaderDescriptor, SharedBackend};

    struct Fixture {
        headless: Rc<HeadlessBackend>,
        backend: SharedBackend,
        renderer: Renderer2D,
    }

    fn fixture(config: &RendererConfig) -> Fixture {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        let mut shaders = ShaderLibrary::new();
        for name in [QuadVertex::SHADER, CircleVertex::SHADER, LineVertex::SHADER, TextVertex::SHADER] {
            shaders.load(&backend, &ShaderDescriptor::named(name)).unwrap();
        }
        let renderer = Renderer2D::new(&RenderCommand::new(&backend), &shaders, config).unwrap();
        Fixture {
            headless,
            backend,
            renderer,
        }
    }

    fn draws(headless: &HeadlessBackend) -> Vec<BackendCommand> {
        headless
            .commands()
            .into_iter()
            .filter(|c| matches!(c, BackendCommand::DrawIndexed { .. } | BackendCommand::DrawArrays { .. }))
            .collect()
    }

    #[test]
    fn test_empty_flush_draws_nothing() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        f.headless.clear_commands();

        f.renderer.start_batch();
        f.renderer.flush().unwrap();
        assert_eq!(f.headless.draw_call_count(), 0);
        assert_eq!(f.renderer.stats().draw_calls, 0);
    }

    #[test]
    fn test_capacity_overflow_flushes_inside_draw() {
        let mut f = fixture(&RendererConfig::default().with_max_quads(4));
        f.renderer.begin_scene(&Mat4::identity()).unwrap();

        for i in 0..5 {
            let transform = Mat4::new_translation(&Vec3::new(i as f32, 0.0, 0.0));
            f.renderer.draw_quad(&transform, Vec4::new(1.0, 0.0, 0.0, 1.0), NO_ENTITY).unwrap();
        }
        assert_eq!(f.renderer.stats().draw_calls, 1);
        assert_eq!(f.renderer.quad_vertices().len(), 4);

        f.renderer.end_scene().unwrap();
        assert_eq!(
            draws(&f.headless)
                .iter()
                .map(|c| match c {
                    BackendCommand::DrawIndexed { index_count, .. } => *index_count,
                    _ => 0,
                })
                .collect::<Vec<_>>(),
            vec![24, 6]
        );
    }

    #[test]
    fn test_untextured_quads_use_white_slot() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        f.renderer.draw_quad(&Mat4::identity(), Vec4::new(0.0, 1.0, 0.0, 1.0), 7).unwrap();

        let vertices = f.renderer.quad_vertices();
        assert!(vertices.iter().all(|v| v.tex_index == 0.0 && v.tiling_factor == 1.0));
        assert!(vertices.iter().all(|v| v.entity_id == 7));
        assert_eq!(f.renderer.texture_slot_index(), 1);
    }

    #[test]
    fn test_quad_corners_are_transformed() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        f.renderer
            .draw_quad_at(Vec3::new(10.0, 0.0, 0.0), Vec2::new(2.0, 4.0), Vec4::repeat(1.0))
            .unwrap();

        let positions: Vec<[f32; 3]> = f.renderer.quad_vertices().iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[9.0, -2.0, 0.0], [11.0, -2.0, 0.0], [11.0, 2.0, 0.0], [9.0, 2.0, 0.0]]
        );
    }

    #[test]
    fn test_kinds_flush_in_fixed_order() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        f.headless.clear_commands();

        // Submitted in reverse of the flush order.
        f.renderer
            .draw_line(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec4::repeat(1.0), NO_ENTITY)
            .unwrap();
        f.renderer
            .draw_circle(&Mat4::identity(), Vec4::repeat(1.0), 1.0, 0.005, NO_ENTITY)
            .unwrap();
        f.renderer.draw_quad(&Mat4::identity(), Vec4::repeat(1.0), NO_ENTITY).unwrap();
        f.renderer.end_scene().unwrap();

        let shaders: Vec<_> = f
            .headless
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                BackendCommand::EnableShader(id) => Some(id),
                _ => None,
            })
            .collect();
        let expected: Vec<_> = [QuadVertex::SHADER, CircleVertex::SHADER, LineVertex::SHADER]
            .iter()
            .map(|name| f.headless.shader_by_name(name).unwrap())
            .collect();
        assert_eq!(shaders, expected);
        assert!(matches!(
            draws(&f.headless).last(),
            Some(BackendCommand::DrawArrays { vertex_count: 2, .. })
        ));
    }

    #[test]
    fn test_rect_is_four_lines() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        f.renderer
            .draw_rect(Vec3::zeros(), Vec2::new(2.0, 2.0), Vec4::repeat(1.0), NO_ENTITY)
            .unwrap();
        assert_eq!(f.renderer.stats().line_count, 4);
    }

    #[test]
    fn test_line_width_applied_on_flush() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.set_line_width(3.5);
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        f.renderer
            .draw_line(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0), Vec4::repeat(1.0), NO_ENTITY)
            .unwrap();
        f.renderer.end_scene().unwrap();
        assert!(f.headless.commands().contains(&BackendCommand::SetLineWidth(3.5)));
    }

    #[test]
    fn test_sprite_without_texture_is_flat_quad() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        let sprite = SpriteRendererComponent::new(Vec4::new(0.2, 0.4, 0.6, 1.0));
        f.renderer.draw_sprite(&Mat4::identity(), &sprite, 3).unwrap();

        assert_eq!(f.renderer.quad_vertices()[0].color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(f.renderer.quad_vertices()[0].tex_index, 0.0);
    }

    #[test]
    fn test_textured_sprite_takes_slot_one() {
        let mut f = fixture(&RendererConfig::default());
        f.renderer.begin_scene(&Mat4::identity()).unwrap();
        let texture = Rc::new(Texture2D::white(&f.backend).unwrap());
        let sprite = SpriteRendererComponent::new(Vec4::repeat(1.0))
            .with_texture(Rc::clone(&texture))
            .with_tiling(4.0);
        f.renderer.draw_sprite(&Mat4::identity(), &sprite, 0).unwrap();

        let vertex = f.renderer.quad_vertices()[0];
        assert_eq!(vertex.tex_index, 1.0);
        assert_eq!(vertex.tiling_factor, 4.0);
    }
}
