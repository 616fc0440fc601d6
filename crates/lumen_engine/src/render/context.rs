//! Renderer context
//!
//! One [`RendererContext`] owns everything that belongs to a graphics
//! context: the backend, the shader library and both renderers. It is
//! created by `init` and torn down by `shutdown`; there is no global
//! renderer state.

use std::rc::Rc;

use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Vec4};
use crate::render::api::{create_backend, ShaderDescriptor, SharedBackend};
use crate::render::camera::{EditorCamera, SceneCamera};
use crate::render::command::RenderCommand;
use crate::render::renderer2d::{BatchVertex, CircleVertex, LineVertex, QuadVertex, Renderer2D, TextVertex};
use crate::render::renderer3d::{SceneRenderer, PBR_SHADER, SHADOW_SHADER, SKYBOX_SHADER};
use crate::render::resources::{Shader, ShaderLibrary};
use crate::render::stats::RenderStats;
use crate::render::{RenderError, RenderResult};
use crate::scene::{
    CircleRendererComponent, LightSourceComponent, MeshRendererComponent, Scene, SkyboxComponent,
    SpriteRendererComponent, TextComponent,
};

/// Camera a frame is rendered through
#[derive(Debug, Clone, Copy)]
pub enum SceneView<'a> {
    /// Runtime camera placed by an entity transform
    Runtime {
        /// Projection
        camera: &'a SceneCamera,
        /// Camera entity world transform
        transform: Mat4,
    },
    /// Free editor camera
    Editor(&'a EditorCamera),
}

impl SceneView<'_> {
    /// Projection times view
    pub fn view_projection(&self) -> Mat4 {
        match self {
            SceneView::Runtime { camera, transform } => {
                let view = transform.try_inverse().unwrap_or_else(Mat4::identity);
                camera.projection() * view
            }
            SceneView::Editor(camera) => camera.view_projection(),
        }
    }
}

/// Everything rendering needs for one graphics context
#[derive(Debug)]
pub struct RendererContext {
    config: RendererConfig,
    command: RenderCommand,
    shaders: ShaderLibrary,
    renderer2d: Renderer2D,
    scene_renderer: SceneRenderer,
    viewport: (u32, u32),
    minimized: bool,
    frame_count: u64,
}

impl RendererContext {
    /// Create the backend named by `config` and bring the renderers up
    pub fn init(config: RendererConfig) -> RenderResult<Self> {
        config.validate()?;
        let backend = create_backend(config.graphics_api).map_err(|e| {
            log::error!("Cannot create {:?} backend: {e}", config.graphics_api);
            RenderError::InitializationFailed(format!("no backend for {:?}: {e}", config.graphics_api))
        })?;
        Self::with_backend(backend, config)
    }

    /// Bring the renderers up on an existing backend
    pub fn with_backend(backend: SharedBackend, config: RendererConfig) -> RenderResult<Self> {
        config.validate()?;
        log::info!(
            "Initializing renderer on {:?} backend ({} quads, {} lines per batch)",
            backend.api(),
            config.max_quads,
            config.max_lines
        );

        let command = RenderCommand::new(&backend);
        command.init();
        command.set_line_width(config.line_width);

        let shaders = Self::load_builtin_shaders(&backend, &config)?;
        let mut renderer2d = Renderer2D::new(&command, &shaders, &config)?;
        renderer2d.set_line_width(config.line_width);
        let scene_renderer = SceneRenderer::new(&command, &shaders, &config)?;

        log::info!("Renderer initialized with {} shader(s)", shaders.len());
        Ok(Self {
            config,
            command,
            shaders,
            renderer2d,
            scene_renderer,
            viewport: (0, 0),
            minimized: false,
            frame_count: 0,
        })
    }

    fn load_builtin_shaders(backend: &SharedBackend, config: &RendererConfig) -> RenderResult<ShaderLibrary> {
        let mut shaders = ShaderLibrary::new();
        for name in [
            QuadVertex::SHADER,
            CircleVertex::SHADER,
            LineVertex::SHADER,
            TextVertex::SHADER,
            SKYBOX_SHADER,
        ] {
            shaders.load(backend, &ShaderDescriptor::named(name))?;
        }
        shaders.add(Shader::new(backend, &ShaderDescriptor::named(PBR_SHADER))?.lit());
        if config.shadows.enabled {
            shaders.load(backend, &ShaderDescriptor::named(SHADOW_SHADER))?;
        }
        Ok(shaders)
    }

    /// Release every GPU object owned by the context
    pub fn shutdown(self) {
        log::info!("Renderer shutting down after {} frame(s)", self.frame_count);
    }

    /// Add a program; lit programs start receiving camera and light uniforms
    pub fn load_shader(&mut self, descriptor: &ShaderDescriptor, lit: bool) -> RenderResult<Rc<Shader>> {
        let mut shader = Shader::new(self.command.backend(), descriptor)?;
        if lit {
            shader = shader.lit();
        }
        let shader = self.shaders.add(shader);
        if lit {
            self.scene_renderer.register_shader(Rc::clone(&shader));
        }
        Ok(shader)
    }

    // === Window events ===

    /// Track the window size; a zero extent marks the window minimized
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Window minimized");
            self.minimized = true;
            return;
        }
        self.minimized = false;
        self.viewport = (width, height);
        self.command.set_viewport(0, 0, width, height);
        self.scene_renderer.set_viewport(width, height);
    }

    /// Whether frames are currently skipped
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Last non-zero window size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    // === Frame ===

    /// Render one frame of `scene` through `view`
    ///
    /// Statistics are reset first. Passes run in the order shadow, opaque
    /// meshes, skybox, transparent meshes, then the 2D batches. Returns
    /// `false` without touching the backend while minimized.
    pub fn render_frame(&mut self, scene: &Scene, view: &SceneView<'_>) -> RenderResult<bool> {
        if self.minimized {
            return Ok(false);
        }
        self.reset_stats();

        self.shadow_pass(scene)?;

        let [r, g, b, a] = self.config.clear_color;
        self.command.set_clear_color(Vec4::new(r, g, b, a));
        self.command.clear();

        match view {
            SceneView::Runtime { camera, transform } => self.scene_renderer.begin_scene(camera, transform)?,
            SceneView::Editor(camera) => self.scene_renderer.begin_scene_editor(camera)?,
        }
        for (_, transform, light) in scene.view::<LightSourceComponent>() {
            self.scene_renderer
                .render_light_source(&transform.to_matrix(), &light.light)?;
        }
        for (entity, transform, mesh) in scene.view::<MeshRendererComponent>() {
            self.scene_renderer
                .draw_mesh(&mesh.mesh, &mesh.material, &transform.to_matrix(), Scene::entity_id(entity))?;
        }
        if let Some((_, _, skybox)) = scene.view::<SkyboxComponent>().next() {
            self.scene_renderer.draw_skybox(&skybox.cubemap)?;
        }
        self.scene_renderer.render_transparent()?;
        self.scene_renderer.end_scene();

        self.renderer2d.begin_scene(&view.view_projection())?;
        for (entity, transform, sprite) in scene.view::<SpriteRendererComponent>() {
            self.renderer2d
                .draw_sprite(&transform.to_matrix(), sprite, Scene::entity_id(entity))?;
        }
        for (entity, transform, circle) in scene.view::<CircleRendererComponent>() {
            self.renderer2d.draw_circle(
                &transform.to_matrix(),
                circle.color,
                circle.thickness,
                circle.fade,
                Scene::entity_id(entity),
            )?;
        }
        for (entity, transform, text) in scene.view::<TextComponent>() {
            self.renderer2d.draw_string(
                &text.text,
                &text.font,
                &transform.to_matrix(),
                &text.params,
                Scene::entity_id(entity),
            )?;
        }
        self.renderer2d.end_scene()?;

        self.frame_count += 1;
        Ok(true)
    }

    fn shadow_pass(&mut self, scene: &Scene) -> RenderResult<()> {
        let Some((_, light_transform, _)) = scene.shadow_light() else {
            return Ok(());
        };
        if !self.scene_renderer.begin_shadow_pass(&light_transform.to_matrix())? {
            return Ok(());
        }
        for (_, transform, mesh) in scene.view::<MeshRendererComponent>() {
            if mesh.cast_shadows && !mesh.material.transparent {
                self.scene_renderer
                    .submit_shadow_caster(mesh.mesh.vertex_array(), &transform.to_matrix())?;
            }
        }
        self.scene_renderer.end_shadow_pass()
    }

    // === Accessors ===

    /// Combined counters of both renderers
    pub fn stats(&self) -> RenderStats {
        let mut stats = self.renderer2d.stats();
        stats += self.scene_renderer.stats();
        stats
    }

    /// Zero the counters of both renderers
    pub fn reset_stats(&mut self) {
        self.renderer2d.reset_stats();
        self.scene_renderer.reset_stats();
    }

    /// Frames rendered since init
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Configuration the context was built with
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Fixed-function dispatch
    pub fn command(&self) -> &RenderCommand {
        &self.command
    }

    /// Backend handle, for creating resources
    pub fn backend(&self) -> &SharedBackend {
        self.command.backend()
    }

    /// Shader library
    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// 2D batch renderer
    pub fn renderer2d(&mut self) -> &mut Renderer2D {
        &mut self.renderer2d
    }

    /// 3D forward renderer
    pub fn scene_renderer(&mut self) -> &mut SceneRenderer {
        &mut self.scene_renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{BackendCommand, GraphicsApi, HeadlessBackend};

    fn headless_context(config: RendererConfig) -> (Rc<HeadlessBackend>, RendererContext) {
        let headless = Rc::new(HeadlessBackend::new());
        let backend: SharedBackend = headless.clone();
        let context = RendererContext::with_backend(backend, config).unwrap();
        (headless, context)
    }

    #[test]
    fn test_init_loads_builtin_shaders() {
        let context = RendererContext::init(RendererConfig::default()).unwrap();
        for name in ["Renderer2D_Quad", "Renderer2D_Text", SKYBOX_SHADER, PBR_SHADER, SHADOW_SHADER] {
            assert!(context.shaders().exists(name), "missing {name}");
        }
        assert!(context.shaders().get(PBR_SHADER).unwrap().is_lit());
    }

    #[test]
    fn test_init_rejects_missing_api() {
        let config = RendererConfig {
            graphics_api: GraphicsApi::None,
            ..Default::default()
        };
        assert!(matches!(
            RendererContext::init(config),
            Err(RenderError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_minimized_window_skips_frame() {
        let (headless, mut context) = headless_context(RendererConfig::default());
        context.on_window_resize(0, 600);
        headless.clear_commands();

        let rendered = context
            .render_frame(&Scene::new(), &SceneView::Editor(&EditorCamera::default()))
            .unwrap();
        assert!(!rendered);
        assert!(headless.commands().is_empty());

        context.on_window_resize(800, 600);
        assert!(!context.is_minimized());
        assert_eq!(context.viewport(), (800, 600));
    }

    #[test]
    fn test_empty_scene_issues_no_draws() {
        let (headless, mut context) = headless_context(RendererConfig::default());
        let rendered = context
            .render_frame(&Scene::new(), &SceneView::Editor(&EditorCamera::default()))
            .unwrap();
        assert!(rendered);
        assert_eq!(headless.draw_call_count(), 0);
        assert_eq!(context.stats(), RenderStats::default());
        assert_eq!(context.frame_count(), 1);
    }

    #[test]
    fn test_lit_user_shader_receives_camera() {
        let (headless, mut context) = headless_context(RendererConfig::default());
        context.load_shader(&ShaderDescriptor::named("Toon"), true).unwrap();
        context
            .render_frame(&Scene::new(), &SceneView::Editor(&EditorCamera::default()))
            .unwrap();
        assert!(headless.uniform("Toon", "u_ViewProjection").is_some());
        assert!(headless
            .commands()
            .iter()
            .any(|c| matches!(c, BackendCommand::Clear(_))));
    }
}
