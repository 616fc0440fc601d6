//! Batch behavior of the 2D renderer observed through the headless backend

use std::mem::size_of;
use std::rc::Rc;

use lumen_engine::config::RendererConfig;
use lumen_engine::foundation::math::{Mat4, Vec3, Vec4};
use lumen_engine::render::api::{BackendCommand, HeadlessBackend, SharedBackend, TextureFormat};
use lumen_engine::render::renderer2d::{Font, FontMetrics, Glyph, GlyphBounds, QuadVertex, TextParams, NO_ENTITY};
use lumen_engine::render::{Framebuffer, FramebufferSpecification, RendererContext, Texture2D};

fn context(config: RendererConfig) -> (Rc<HeadlessBackend>, RendererContext) {
    lumen_engine::foundation::logging::init_for_tests();
    let headless = Rc::new(HeadlessBackend::new());
    let backend: SharedBackend = headless.clone();
    let context = RendererContext::with_backend(backend, config).unwrap();
    headless.clear_commands();
    (headless, context)
}

fn indexed_draws(headless: &HeadlessBackend) -> Vec<u32> {
    headless
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            BackendCommand::DrawIndexed { index_count, .. } => Some(index_count),
            _ => None,
        })
        .collect()
}

fn upload_sizes(headless: &HeadlessBackend) -> Vec<usize> {
    headless
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            BackendCommand::UploadSubData { size, .. } => Some(size),
            _ => None,
        })
        .collect()
}

fn red() -> Vec4 {
    Vec4::new(1.0, 0.0, 0.0, 1.0)
}

#[test]
fn quad_past_capacity_flushes_exactly_once() {
    let (headless, mut context) = context(RendererConfig::default());
    let renderer = context.renderer2d();

    renderer.begin_scene(&Mat4::identity()).unwrap();
    for i in 0..20_001 {
        let transform = Mat4::new_translation(&Vec3::new(i as f32, 0.0, 0.0));
        renderer.draw_quad(&transform, red(), NO_ENTITY).unwrap();
    }
    renderer.end_scene().unwrap();

    assert_eq!(indexed_draws(&headless), vec![20_000 * 6, 6]);
    assert_eq!(
        upload_sizes(&headless),
        vec![20_000 * 4 * size_of::<QuadVertex>(), 4 * size_of::<QuadVertex>()]
    );

    let stats = renderer.stats();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.quad_count, 20_001);
}

#[test]
fn upload_covers_only_written_vertices() {
    let (headless, mut context) = context(RendererConfig::default());
    let renderer = context.renderer2d();

    renderer.begin_scene(&Mat4::identity()).unwrap();
    for _ in 0..3 {
        renderer.draw_quad(&Mat4::identity(), red(), NO_ENTITY).unwrap();
    }
    renderer.end_scene().unwrap();

    assert_eq!(upload_sizes(&headless), vec![3 * 4 * size_of::<QuadVertex>()]);
    assert_eq!(indexed_draws(&headless), vec![18]);
}

#[test]
fn empty_batch_issues_no_draws() {
    let (headless, mut context) = context(RendererConfig::default());
    let renderer = context.renderer2d();

    renderer.start_batch();
    renderer.flush().unwrap();

    assert_eq!(headless.draw_call_count(), 0);
    assert!(upload_sizes(&headless).is_empty());
    assert_eq!(renderer.stats().draw_calls, 0);
}

#[test]
fn repeated_texture_shares_one_slot() {
    let (headless, mut context) = context(RendererConfig::default());
    let texture = Rc::new(Texture2D::white(context.backend()).unwrap());
    let renderer = context.renderer2d();

    renderer.begin_scene(&Mat4::identity()).unwrap();
    for _ in 0..10 {
        renderer
            .draw_textured_quad(&Mat4::identity(), &texture, 1.0, red(), NO_ENTITY)
            .unwrap();
    }
    assert_eq!(renderer.texture_slot_index(), 2);
    assert!(renderer.quad_vertices().iter().all(|v| v.tex_index == 1.0));

    renderer.end_scene().unwrap();
    assert_eq!(indexed_draws(&headless), vec![60]);
}

#[test]
fn thirty_third_texture_forces_flush() {
    let (headless, mut context) = context(RendererConfig::default());
    let textures: Vec<Rc<Texture2D>> = (0..32)
        .map(|_| Rc::new(Texture2D::white(context.backend()).unwrap()))
        .collect();
    let renderer = context.renderer2d();

    renderer.begin_scene(&Mat4::identity()).unwrap();
    // White plus 31 user textures fill all 32 slots.
    for texture in &textures[..31] {
        renderer
            .draw_textured_quad(&Mat4::identity(), texture, 1.0, red(), NO_ENTITY)
            .unwrap();
    }
    assert_eq!(renderer.texture_slot_index(), 32);
    assert_eq!(headless.draw_call_count(), 0);

    renderer
        .draw_textured_quad(&Mat4::identity(), &textures[31], 1.0, red(), NO_ENTITY)
        .unwrap();
    assert_eq!(indexed_draws(&headless), vec![31 * 6]);
    assert_eq!(renderer.texture_slot_index(), 2);
    assert_eq!(renderer.quad_vertices().len(), 4);
    assert_eq!(renderer.quad_vertices()[0].tex_index, 1.0);
}

fn font_over_new_atlas(context: &RendererContext) -> Font {
    let atlas = Rc::new(Texture2D::white(context.backend()).unwrap());
    let mut font = Font::new(atlas, FontMetrics::default());
    font.add_glyph(
        'A',
        Glyph {
            advance: 0.5,
            plane_bounds: Some(GlyphBounds::new(0.0, 0.0, 0.5, 0.75)),
            atlas_bounds: Some(GlyphBounds::new(0.0, 0.0, 1.0, 1.0)),
        },
    );
    font
}

#[test]
fn font_atlases_use_their_own_slot_table() {
    let (headless, mut context) = context(RendererConfig::default());
    let texture = Rc::new(Texture2D::white(context.backend()).unwrap());
    let fonts: Vec<Font> = (0..33).map(|_| font_over_new_atlas(&context)).collect();
    let params = TextParams::default();
    let renderer = context.renderer2d();

    renderer.begin_scene(&Mat4::identity()).unwrap();
    renderer
        .draw_textured_quad(&Mat4::identity(), &texture, 1.0, red(), NO_ENTITY)
        .unwrap();
    renderer
        .draw_string("AA", &fonts[0], &Mat4::identity(), &params, NO_ENTITY)
        .unwrap();
    // The atlas takes font slot 0; the quad table keeps white at 0.
    assert_eq!(renderer.font_slot_index(), 1);
    assert_eq!(renderer.texture_slot_index(), 2);

    for font in &fonts[1..32] {
        renderer
            .draw_string("A", font, &Mat4::identity(), &params, NO_ENTITY)
            .unwrap();
    }
    assert_eq!(renderer.font_slot_index(), 32);
    assert_eq!(headless.draw_call_count(), 0);

    // A 33rd atlas flushes both kinds and restarts each table.
    renderer
        .draw_string("A", &fonts[32], &Mat4::identity(), &params, NO_ENTITY)
        .unwrap();
    assert_eq!(indexed_draws(&headless), vec![6, 33 * 6]);
    assert_eq!(renderer.font_slot_index(), 1);
    assert_eq!(renderer.texture_slot_index(), 1);
    assert_eq!(headless.bound_texture(0), Some(fonts[0].atlas().id()));
    assert_eq!(headless.bound_texture(31), Some(fonts[31].atlas().id()));

    renderer.end_scene().unwrap();
    assert_eq!(indexed_draws(&headless), vec![6, 33 * 6, 6]);
    assert_eq!(headless.bound_texture(0), Some(fonts[32].atlas().id()));
    assert_eq!(renderer.stats().glyph_count, 34);
}

#[test]
fn small_line_capacity_splits_rect_outline() {
    let (headless, mut context) = context(RendererConfig::default().with_max_lines(3));
    let renderer = context.renderer2d();

    renderer.begin_scene(&Mat4::identity()).unwrap();
    renderer
        .draw_rect(Vec3::zeros(), lumen_engine::foundation::math::Vec2::new(2.0, 1.0), red(), NO_ENTITY)
        .unwrap();
    renderer.end_scene().unwrap();

    let line_draws: Vec<u32> = headless
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            BackendCommand::DrawArrays { vertex_count, .. } => Some(vertex_count),
            _ => None,
        })
        .collect();
    assert_eq!(line_draws, vec![6, 2]);
}

#[test]
fn framebuffer_resize_twice_does_not_leak() {
    let headless = Rc::new(HeadlessBackend::new());
    let backend: SharedBackend = headless.clone();
    let specification = FramebufferSpecification::new(
        640,
        480,
        vec![TextureFormat::Rgba8, TextureFormat::RedInteger, TextureFormat::Depth24Stencil8],
    );
    let mut framebuffer = Framebuffer::new(&backend, specification, 8192).unwrap();
    let textures = headless.live_texture_count();

    framebuffer.resize(1024, 768).unwrap();
    framebuffer.resize(1024, 768).unwrap();

    assert_eq!(headless.live_texture_count(), textures);
    assert_eq!(headless.live_framebuffer_count(), 1);
    assert_eq!(framebuffer.specification().width, 1024);

    drop(framebuffer);
    assert_eq!(headless.live_texture_count(), 0);
    assert_eq!(headless.live_framebuffer_count(), 0);
}
