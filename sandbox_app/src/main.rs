//! Sandbox demo application
//!
//! Builds a small mixed 2D/3D scene, renders a few frames on the headless
//! backend while orbiting the editor camera, and logs the statistics of
//! every frame. Pass a `.toml` or `.ron` renderer config as the first
//! argument to override the defaults.

use std::rc::Rc;

use lumen_engine::foundation::logging;
use lumen_engine::prelude::*;

const FRAMES: u32 = 4;

#[derive(Debug, thiserror::Error)]
enum SandboxError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

fn load_config() -> Result<RendererConfig, SandboxError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading renderer config from {path}");
            Ok(RendererConfig::load_from_file(&path)?)
        }
        None => Ok(RendererConfig::default()),
    }
}

fn demo_font(context: &RendererContext) -> Result<Rc<Font>, SandboxError> {
    let atlas = Rc::new(Texture2D::from_rgba8(context.backend(), 2, 2, &[255; 16])?);
    let mut font = Font::new(atlas, FontMetrics::default());
    let glyph = Glyph {
        advance: 0.6,
        plane_bounds: Some(GlyphBounds::new(0.0, -0.1, 0.55, 0.8)),
        atlas_bounds: Some(GlyphBounds::new(0.0, 0.0, 2.0, 2.0)),
    };
    for c in ('A'..='Z').chain('a'..='z').chain(['?', '!']) {
        font.add_glyph(c, glyph);
    }
    font.add_glyph(
        ' ',
        Glyph {
            advance: 0.3,
            ..Default::default()
        },
    );
    Ok(Rc::new(font))
}

fn build_scene(context: &RendererContext) -> Result<Scene, SandboxError> {
    let mut scene = Scene::new();
    let backend = context.backend();

    let checker = Rc::new(Texture2D::from_rgba8(
        backend,
        2,
        2,
        &[255, 255, 255, 255, 40, 40, 40, 255, 40, 40, 40, 255, 255, 255, 255, 255],
    )?);
    for y in 0..10 {
        for x in 0..10 {
            let tile = scene.create_entity(format!("Tile {x},{y}"));
            let mut sprite = SpriteRendererComponent::new(Vec4::new(x as f32 / 10.0, 0.4, y as f32 / 10.0, 1.0));
            if (x + y) % 2 == 0 {
                sprite = sprite.with_texture(Rc::clone(&checker)).with_tiling(4.0);
            }
            scene.add_component(tile, sprite);
            if let Some(transform) = scene.get_mut::<TransformComponent>(tile) {
                transform.translation = Vec3::new(x as f32 - 5.0, y as f32 - 5.0, -2.0);
                transform.scale = Vec3::new(0.9, 0.9, 1.0);
            }
        }
    }

    let ring = scene.create_entity("Ring");
    scene.add_component(
        ring,
        CircleRendererComponent {
            color: Vec4::new(1.0, 0.8, 0.1, 1.0),
            thickness: 0.2,
            fade: 0.01,
        },
    );

    let title = scene.create_entity("Title");
    scene.add_component(title, TextComponent::new("Lumen sandbox!", demo_font(context)?));
    if let Some(transform) = scene.get_mut::<TransformComponent>(title) {
        transform.translation = Vec3::new(-4.0, 4.0, 0.0);
    }

    let cube = Rc::new(Mesh::new(backend, &MeshData::cube())?);
    let crate_entity = scene.create_entity("Crate");
    scene.add_component(
        crate_entity,
        MeshRendererComponent::new(
            Rc::clone(&cube),
            Material::new().with_albedo(Vec4::new(0.7, 0.5, 0.3, 1.0)).with_roughness(0.8),
        ),
    );
    let window = scene.create_entity("Window");
    scene.add_component(
        window,
        MeshRendererComponent::new(
            cube,
            Material::new()
                .with_albedo(Vec4::new(0.6, 0.8, 1.0, 0.3))
                .with_transparency(true),
        ),
    );
    if let Some(transform) = scene.get_mut::<TransformComponent>(window) {
        transform.translation = Vec3::new(3.0, 0.0, 0.0);
    }

    let sun = scene.create_entity("Sun");
    scene.add_component(
        sun,
        LightSourceComponent::from(LightSource::directional(Vec3::new(1.0, 0.95, 0.8), 2.0).with_shadows(true)),
    );
    if let Some(transform) = scene.get_mut::<TransformComponent>(sun) {
        transform.rotation = Quat::from_euler_angles(-0.9, 0.4, 0.0);
    }
    for i in 0..4 {
        let lamp = scene.create_entity(format!("Lamp {i}"));
        scene.add_component(
            lamp,
            LightSourceComponent::from(LightSource::point(Vec3::new(1.0, 0.6, 0.3), 4.0, 8.0)),
        );
        if let Some(transform) = scene.get_mut::<TransformComponent>(lamp) {
            transform.translation = Vec3::new(i as f32 * 2.0 - 3.0, 2.0, 1.0);
        }
    }

    let face = [90u8, 120, 200, 255];
    let faces: [&[u8]; 6] = [&face[..]; 6];
    let sky = scene.create_entity("Sky");
    scene.add_component(
        sky,
        SkyboxComponent {
            cubemap: Rc::new(Texture2D::cube_from_faces(backend, 1, &faces)?),
        },
    );

    Ok(scene)
}

fn run() -> Result<(), SandboxError> {
    let config = load_config()?;
    let mut context = RendererContext::init(config)?;
    context.on_window_resize(1280, 720);

    let mut scene = build_scene(&context)?;
    scene.on_viewport_resize(1280, 720);
    log::info!("Scene built with {} entities", scene.entity_count());

    let mut camera = EditorCamera::default();
    camera.set_viewport_size(1280, 720);
    for frame in 0..FRAMES {
        camera.orbit(Vec2::new(0.1, 0.02));
        scene.on_render_editor(&mut context, &camera)?;
        let stats = context.stats();
        log::info!(
            "Frame {frame}: {} draw calls, {} quads, {} circles, {} glyphs, {} meshes, {} vertices",
            stats.draw_calls,
            stats.quad_count,
            stats.circle_count,
            stats.glyph_count,
            stats.mesh_count,
            stats.total_vertex_count()
        );
    }

    // A minimized window skips the frame entirely.
    context.on_window_resize(0, 0);
    let rendered = scene.on_render_editor(&mut context, &camera)?;
    log::info!("Frame while minimized rendered: {rendered}");

    context.shutdown();
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        log::error!("Sandbox failed: {e}");
        std::process::exit(1);
    }
}
