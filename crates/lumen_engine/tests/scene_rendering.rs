//! Full frames rendered from a scene through the headless backend

use std::collections::HashMap;
use std::rc::Rc;

use lumen_engine::prelude::*;
use lumen_engine::render::api::{BackendCommand, HeadlessBackend, SharedBackend, ShaderId, UniformValue};

fn context(config: RendererConfig) -> (Rc<HeadlessBackend>, RendererContext) {
    lumen_engine::foundation::logging::init_for_tests();
    let headless = Rc::new(HeadlessBackend::new());
    let backend: SharedBackend = headless.clone();
    let mut context = RendererContext::with_backend(backend, config).unwrap();
    context.on_window_resize(1280, 720);
    headless.clear_commands();
    (headless, context)
}

/// Name of the shader enabled at each draw call, in submission order
fn draw_shaders(headless: &HeadlessBackend, names: &[&str]) -> Vec<String> {
    let by_id: HashMap<ShaderId, &str> = names
        .iter()
        .filter_map(|name| headless.shader_by_name(name).map(|id| (id, *name)))
        .collect();

    let mut current = None;
    let mut order = Vec::new();
    for command in headless.commands() {
        match command {
            BackendCommand::EnableShader(id) => current = Some(id),
            BackendCommand::DrawIndexed { .. } | BackendCommand::DrawArrays { .. } => {
                let name = current.and_then(|id| by_id.get(&id)).copied().unwrap_or("?");
                order.push(name.to_string());
            }
            _ => {}
        }
    }
    order
}

fn cube(context: &RendererContext) -> Rc<Mesh> {
    Rc::new(Mesh::new(context.backend(), &MeshData::cube()).unwrap())
}

fn label_font(context: &RendererContext) -> Rc<Font> {
    let atlas = Rc::new(Texture2D::white(context.backend()).unwrap());
    let mut font = Font::new(atlas, FontMetrics::default());
    let glyph = Glyph {
        advance: 0.5,
        plane_bounds: Some(GlyphBounds::new(0.0, 0.0, 0.5, 0.75)),
        atlas_bounds: Some(GlyphBounds::new(0.0, 0.0, 1.0, 1.0)),
    };
    font.add_glyph('H', glyph);
    font.add_glyph('i', glyph);
    Rc::new(font)
}

#[test]
fn twenty_six_point_lights_bind_twenty_five() {
    let (headless, mut context) = context(RendererConfig::default());
    let mut scene = Scene::new();
    for i in 0..26 {
        let light = scene.create_entity(format!("Light {i}"));
        scene.add_component(light, LightSourceComponent::from(LightSource::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0)));
    }

    assert!(scene.on_render_editor(&mut context, &EditorCamera::default()).unwrap());

    assert!(headless.uniform("PBR", "u_PointLights[24].Position").is_some());
    assert_eq!(headless.uniform("PBR", "u_PointLights[25].Position"), None);
    assert_eq!(headless.uniform("PBR", "u_PointLightCount"), Some(UniformValue::Int(25)));
    assert!(!headless.commands().iter().any(|c| matches!(
        c,
        BackendCommand::SetUniform { name, .. } if name.starts_with("u_PointLights[25]")
    )));
}

#[test]
fn light_counts_reset_each_frame() {
    let (headless, mut context) = context(RendererConfig::default());
    let mut scene = Scene::new();
    let light = scene.create_entity("Lamp");
    scene.add_component(light, LightSourceComponent::from(LightSource::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0)));

    let camera = EditorCamera::default();
    scene.on_render_editor(&mut context, &camera).unwrap();
    scene.on_render_editor(&mut context, &camera).unwrap();

    assert_eq!(headless.uniform("PBR", "u_PointLightCount"), Some(UniformValue::Int(1)));
    assert_eq!(headless.uniform("PBR", "u_PointLights[1].Position"), None);
}

#[test]
fn passes_run_in_fixed_order() {
    let (headless, mut context) = context(RendererConfig::default());
    let mesh = cube(&context);
    let face = [255u8; 4];
    let faces: [&[u8]; 6] = [&face[..]; 6];
    let cubemap = Rc::new(Texture2D::cube_from_faces(context.backend(), 1, &faces).unwrap());

    let mut scene = Scene::new();
    // 2D content is submitted first on purpose; it still draws last.
    let sprite = scene.create_entity("Sprite");
    scene.add_component(sprite, SpriteRendererComponent::new(Vec4::new(0.0, 1.0, 0.0, 1.0)));

    let glass = scene.create_entity("Glass");
    scene.add_component(
        glass,
        MeshRendererComponent::new(Rc::clone(&mesh), Material::new().with_transparency(true)),
    );
    let rock = scene.create_entity("Rock");
    scene.add_component(rock, MeshRendererComponent::new(mesh, Material::new()));

    let sky = scene.create_entity("Sky");
    scene.add_component(sky, SkyboxComponent { cubemap });

    let sun = scene.create_entity("Sun");
    scene.add_component(
        sun,
        LightSourceComponent::from(LightSource::directional(Vec3::new(1.0, 1.0, 1.0), 3.0).with_shadows(true)),
    );

    let label = scene.create_entity("Label");
    scene.add_component(label, TextComponent::new("Hi", label_font(&context)));

    assert!(scene.on_render_editor(&mut context, &EditorCamera::default()).unwrap());

    let order = draw_shaders(
        &headless,
        &["Shadow", "PBR", "Skybox", "Renderer2D_Quad", "Renderer2D_Circle", "Renderer2D_Line", "Renderer2D_Text"],
    );
    assert_eq!(order, vec!["Shadow", "PBR", "Skybox", "PBR", "Renderer2D_Quad", "Renderer2D_Text"]);

    let stats = context.stats();
    assert_eq!(stats.draw_calls, 6);
    assert_eq!(stats.mesh_count, 4);
    assert_eq!(stats.quad_count, 1);
    assert_eq!(stats.glyph_count, 2);
    assert!(headless.depth_mask());
}

#[test]
fn runtime_render_needs_primary_camera() {
    let (headless, mut context) = context(RendererConfig::default().with_shadows(false));
    let mut scene = Scene::new();
    let quad = scene.create_entity("Quad");
    scene.add_component(quad, CircleRendererComponent::default());

    assert!(!scene.on_render_runtime(&mut context).unwrap());
    assert_eq!(headless.draw_call_count(), 0);

    let camera = scene.create_entity("Camera");
    scene.add_component(camera, CameraComponent::primary(SceneCamera::orthographic(10.0, -1.0, 1.0)));
    scene.get_mut::<TransformComponent>(camera).unwrap().translation = Vec3::new(0.0, 0.0, 0.5);

    assert!(scene.on_render_runtime(&mut context).unwrap());
    assert_eq!(
        draw_shaders(&headless, &["Renderer2D_Circle"]),
        vec!["Renderer2D_Circle"]
    );
    assert_eq!(context.stats().circle_count, 1);
}

#[test]
fn minimized_window_renders_nothing() {
    let (headless, mut context) = context(RendererConfig::default());
    let mut scene = Scene::new();
    let quad = scene.create_entity("Quad");
    scene.add_component(quad, SpriteRendererComponent::default());

    context.on_window_resize(0, 0);
    assert!(!scene.on_render_editor(&mut context, &EditorCamera::default()).unwrap());
    assert!(headless.commands().is_empty());

    context.on_window_resize(640, 480);
    assert!(scene.on_render_editor(&mut context, &EditorCamera::default()).unwrap());
    assert_eq!(headless.draw_call_count(), 1);
}

#[test]
fn stats_cover_only_the_last_frame() {
    let (_headless, mut context) = context(RendererConfig::default());
    let mut scene = Scene::new();
    for i in 0..3 {
        let quad = scene.create_entity(format!("Quad {i}"));
        scene.add_component(quad, SpriteRendererComponent::default());
    }

    let camera = EditorCamera::default();
    scene.on_render_editor(&mut context, &camera).unwrap();
    scene.on_render_editor(&mut context, &camera).unwrap();

    let stats = context.stats();
    assert_eq!(stats.quad_count, 3);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.total_vertex_count(), 12);
    assert_eq!(context.frame_count(), 2);
}
