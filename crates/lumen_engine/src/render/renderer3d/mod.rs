//! # Forward scene renderer
//!
//! Draws lit meshes one submission at a time. Per frame the calls go:
//!
//! 1. optional shadow pass (`begin_shadow_pass`, `submit_shadow_caster`,
//!    `end_shadow_pass`) from the first shadow-casting directional light
//! 2. `begin_scene`, which uploads the camera and zeroes the light counters
//! 3. `render_light_source` for every light
//! 4. `draw_mesh` / `submit` for opaque geometry, then `draw_skybox`
//! 5. `render_transparent` for the meshes `draw_mesh` queued because their
//!    material is transparent, farthest first
//! 6. `end_scene`
//!
//! Lights past the per-kind cap are dropped without touching any uniform.

pub mod lights;
pub mod mesh;
pub mod shadow;

use std::rc::Rc;

pub use lights::{light_direction, LightKind, LightSource, SceneLightDescription};
pub use mesh::{Material, Mesh, MeshData, MeshVertex, ALBEDO_MAP_SLOT};
pub use shadow::{ShadowMap, SHADOW_MAP_SLOT};

use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::api::{BlendMode, ClearFlags, CullMode};
use crate::render::camera::{EditorCamera, SceneCamera};
use crate::render::command::RenderCommand;
use crate::render::resources::{Shader, ShaderLibrary, Texture2D, VertexArray};
use crate::render::stats::RenderStats;
use crate::render::RenderResult;

/// Library name of the skybox program
pub const SKYBOX_SHADER: &str = "Skybox";
/// Library name of the lit PBR program
pub const PBR_SHADER: &str = "PBR";
/// Library name of the depth-only shadow program
pub const SHADOW_SHADER: &str = "Shadow";

/// Where the renderer is in its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// Between frames
    Idle,
    /// Rendering into the shadow map
    ShadowPass,
    /// Between `begin_scene` and `end_scene`
    SceneActive,
}

#[derive(Debug)]
struct TransparentDraw {
    mesh: Rc<Mesh>,
    material: Material,
    transform: Mat4,
    entity_id: i32,
    distance_squared: f32,
}

/// Forward renderer for lit 3D geometry
#[derive(Debug)]
pub struct SceneRenderer {
    command: RenderCommand,
    scene_shaders: Vec<Rc<Shader>>,
    pbr_shader: Rc<Shader>,
    skybox_shader: Rc<Shader>,
    shadow_shader: Option<Rc<Shader>>,
    skybox_cube: Mesh,
    shadow_map: Option<ShadowMap>,
    shadows_ready: bool,
    lights: SceneLightDescription,
    transparent: Vec<TransparentDraw>,
    view: Mat4,
    projection: Mat4,
    camera_position: Vec3,
    viewport: (u32, u32),
    state: SceneState,
    stats: RenderStats,
}

impl SceneRenderer {
    /// Look up the 3D programs and allocate the skybox cube and shadow map
    ///
    /// Every lit program in `shaders` is registered for camera and light
    /// uploads. The shadow program is only required when shadows are on.
    pub fn new(command: &RenderCommand, shaders: &ShaderLibrary, config: &RendererConfig) -> RenderResult<Self> {
        let backend = command.backend();

        let pbr_shader = shaders.get(PBR_SHADER)?;
        let skybox_shader = shaders.get(SKYBOX_SHADER)?;

        let mut scene_shaders: Vec<Rc<Shader>> = shaders.lit_shaders().cloned().collect();
        if !scene_shaders.iter().any(|s| Rc::ptr_eq(s, &pbr_shader)) {
            scene_shaders.push(Rc::clone(&pbr_shader));
        }

        let (shadow_shader, shadow_map) = if config.shadows.enabled {
            (
                Some(shaders.get(SHADOW_SHADER)?),
                Some(ShadowMap::new(backend, &config.shadows, config.max_framebuffer_size)?),
            )
        } else {
            (None, None)
        };

        let skybox_cube = Mesh::new(backend, &MeshData::cube())?;

        log::debug!("Scene renderer registered {} lit shader(s)", scene_shaders.len());
        Ok(Self {
            command: command.clone(),
            scene_shaders,
            pbr_shader,
            skybox_shader,
            shadow_shader,
            skybox_cube,
            shadow_map,
            shadows_ready: false,
            lights: SceneLightDescription::new(config),
            transparent: Vec::new(),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            camera_position: Vec3::zeros(),
            viewport: (1280, 720),
            state: SceneState::Idle,
            stats: RenderStats::default(),
        })
    }

    /// Viewport restored after the shadow pass
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Add a program that receives camera and light uniforms
    pub fn register_shader(&mut self, shader: Rc<Shader>) {
        if !self.scene_shaders.iter().any(|s| Rc::ptr_eq(s, &shader)) {
            self.scene_shaders.push(shader);
        }
    }

    // === Scene lifecycle ===

    /// Start a scene seen by a runtime camera placed at `transform`
    pub fn begin_scene(&mut self, camera: &SceneCamera, transform: &Mat4) -> RenderResult<()> {
        let view = transform.try_inverse().unwrap_or_else(|| {
            log::warn!("Camera transform is not invertible; using identity view");
            Mat4::identity()
        });
        self.begin(view, camera.projection(), transform.translation_part())
    }

    /// Start a scene seen by the editor camera
    pub fn begin_scene_editor(&mut self, camera: &EditorCamera) -> RenderResult<()> {
        self.begin(camera.view_matrix(), camera.projection(), camera.position())
    }

    fn begin(&mut self, view: Mat4, projection: Mat4, camera_position: Vec3) -> RenderResult<()> {
        if self.state == SceneState::SceneActive {
            log::warn!("begin_scene called twice without end_scene");
        }
        self.view = view;
        self.projection = projection;
        self.camera_position = camera_position;
        self.lights.reset();
        self.transparent.clear();

        let view_projection = projection * view;
        for shader in &self.scene_shaders {
            shader.enable()?;
            shader.set_mat4("u_ViewProjection", &view_projection)?;
            shader.set_float3("u_CameraPosition", camera_position)?;
            for kind in LightKind::ALL {
                shader.set_int(kind.count_name(), 0)?;
            }
            shader.set_int("u_ShadowsEnabled", i32::from(self.shadows_ready))?;
        }

        self.state = SceneState::SceneActive;
        Ok(())
    }

    /// Return to idle
    ///
    /// Transparent draws that were never rendered are dropped.
    pub fn end_scene(&mut self) {
        if !self.transparent.is_empty() {
            log::warn!(
                "Dropping {} transparent draw(s) queued after the last render_transparent",
                self.transparent.len()
            );
            self.transparent.clear();
        }
        self.shadows_ready = false;
        self.state = SceneState::Idle;
    }

    // === Lights ===

    /// Bind a light at the next free slot of its kind
    ///
    /// Returns the slot, or `None` when the kind is already at its cap.
    pub fn render_light_source(&mut self, transform: &Mat4, light: &LightSource) -> RenderResult<Option<u32>> {
        let Some(index) = self.lights.try_claim(light.kind) else {
            log::trace!("{:?} light dropped at cap {}", light.kind, self.lights.max(light.kind));
            return Ok(None);
        };

        let base = format!("{}[{index}]", light.kind.array_name());
        let count = self.lights.count(light.kind) as i32;
        let position = transform.translation_part();
        let direction = light_direction(transform);

        for shader in &self.scene_shaders {
            shader.enable()?;
            match light.kind {
                LightKind::Directional => {
                    shader.set_float3(&format!("{base}.Direction"), direction)?;
                    shader.set_float3(&format!("{base}.Color"), light.color)?;
                    shader.set_float(&format!("{base}.Intensity"), light.intensity)?;
                }
                LightKind::Point => {
                    shader.set_float3(&format!("{base}.Position"), position)?;
                    shader.set_float3(&format!("{base}.Color"), light.color)?;
                    shader.set_float(&format!("{base}.Intensity"), light.intensity)?;
                    shader.set_float(&format!("{base}.Range"), light.range)?;
                }
                LightKind::Spot => {
                    shader.set_float3(&format!("{base}.Position"), position)?;
                    shader.set_float3(&format!("{base}.Direction"), direction)?;
                    shader.set_float3(&format!("{base}.Color"), light.color)?;
                    shader.set_float(&format!("{base}.Intensity"), light.intensity)?;
                    shader.set_float(&format!("{base}.Range"), light.range)?;
                    let outer = light.outer_cone_angle.max(light.inner_cone_angle);
                    shader.set_float(&format!("{base}.CutOff"), light.inner_cone_angle.cos())?;
                    shader.set_float(&format!("{base}.OuterCutOff"), outer.cos())?;
                }
            }
            shader.set_int(light.kind.count_name(), count)?;
        }
        Ok(Some(index))
    }

    /// Lights bound so far this scene
    pub fn light_counts(&self) -> &SceneLightDescription {
        &self.lights
    }

    // === Geometry ===

    /// Draw `vertex_array` with `shader` at `transform`
    pub fn submit(&mut self, shader: &Shader, vertex_array: &VertexArray, transform: &Mat4) -> RenderResult<()> {
        shader.enable()?;
        shader.set_mat4("u_Transform", transform)?;
        self.command.draw_indexed(vertex_array, 0)?;
        self.stats.draw_calls += 1;
        self.stats.mesh_count += 1;
        Ok(())
    }

    /// Draw a mesh with the PBR program
    ///
    /// Transparent materials are queued for [`render_transparent`](Self::render_transparent).
    pub fn draw_mesh(&mut self, mesh: &Rc<Mesh>, material: &Material, transform: &Mat4, entity_id: i32) -> RenderResult<()> {
        if material.transparent {
            let distance_squared = (transform.translation_part() - self.camera_position).norm_squared();
            self.transparent.push(TransparentDraw {
                mesh: Rc::clone(mesh),
                material: material.clone(),
                transform: *transform,
                entity_id,
                distance_squared,
            });
            return Ok(());
        }
        let shader = Rc::clone(&self.pbr_shader);
        self.draw_lit(&shader, mesh, material, transform, entity_id)
    }

    /// Draw queued transparent meshes back to front with blending and
    /// without depth writes
    pub fn render_transparent(&mut self) -> RenderResult<()> {
        if self.transparent.is_empty() {
            return Ok(());
        }
        let mut queue = std::mem::take(&mut self.transparent);
        queue.sort_by(|a, b| b.distance_squared.total_cmp(&a.distance_squared));

        self.command.set_blend(BlendMode::Alpha);
        self.command.set_depth_mask(false);
        let shader = Rc::clone(&self.pbr_shader);
        let result = queue
            .iter()
            .try_for_each(|draw| self.draw_lit(&shader, &draw.mesh, &draw.material, &draw.transform, draw.entity_id));
        self.command.set_depth_mask(true);
        log::trace!("Rendered {} transparent mesh(es)", queue.len());
        result
    }

    /// Transparent draws waiting for [`render_transparent`](Self::render_transparent)
    pub fn pending_transparent(&self) -> usize {
        self.transparent.len()
    }

    fn draw_lit(&mut self, shader: &Shader, mesh: &Mesh, material: &Material, transform: &Mat4, entity_id: i32) -> RenderResult<()> {
        shader.enable()?;
        material.apply(shader)?;
        shader.set_int("u_EntityID", entity_id)?;
        self.submit(shader, mesh.vertex_array(), transform)
    }

    /// Draw the environment cube behind everything else
    pub fn draw_skybox(&mut self, cubemap: &Texture2D) -> RenderResult<()> {
        if !cubemap.is_cube() {
            log::warn!("Skybox texture {:?} is not a cube map", cubemap.id());
        }

        self.command.set_depth_mask(false);
        self.command.set_cull_mode(CullMode::None);

        let view_projection = self.projection * self.view.without_translation();
        let result = (|| -> RenderResult<()> {
            self.skybox_shader.enable()?;
            self.skybox_shader.set_mat4("u_ViewProjection", &view_projection)?;
            cubemap.bind(0)?;
            self.skybox_shader.set_int("u_Skybox", 0)?;
            self.command.draw_indexed(self.skybox_cube.vertex_array(), 0)
        })();

        self.command.set_cull_mode(CullMode::Back);
        self.command.set_depth_mask(true);
        result?;

        self.stats.draw_calls += 1;
        self.stats.mesh_count += 1;
        Ok(())
    }

    // === Shadow pass ===

    /// Start rendering depth from a directional light at `light_transform`
    ///
    /// Returns `false` when shadows are disabled; no state is touched then.
    pub fn begin_shadow_pass(&mut self, light_transform: &Mat4) -> RenderResult<bool> {
        let (Some(map), Some(shader)) = (self.shadow_map.as_mut(), self.shadow_shader.as_ref()) else {
            return Ok(false);
        };

        map.update(light_direction(light_transform));
        map.framebuffer().bind()?;
        self.command.clear_with(ClearFlags::DEPTH);
        self.command.set_cull_mode(CullMode::Front);

        shader.enable()?;
        shader.set_mat4("u_LightSpaceMatrix", map.light_space())?;
        self.state = SceneState::ShadowPass;
        Ok(true)
    }

    /// Render one caster into the shadow map
    pub fn submit_shadow_caster(&mut self, vertex_array: &VertexArray, transform: &Mat4) -> RenderResult<()> {
        if self.state != SceneState::ShadowPass {
            return Ok(());
        }
        let Some(shader) = self.shadow_shader.clone() else {
            return Ok(());
        };
        self.submit(&shader, vertex_array, transform)
    }

    /// Restore the default target and hand the map to the lit programs
    pub fn end_shadow_pass(&mut self) -> RenderResult<()> {
        if self.state != SceneState::ShadowPass {
            return Ok(());
        }
        let Some(map) = self.shadow_map.as_ref() else {
            return Ok(());
        };

        map.framebuffer().unbind()?;
        self.command.set_viewport(0, 0, self.viewport.0, self.viewport.1);
        self.command.set_cull_mode(CullMode::Back);

        map.bind_map(self.command.backend())?;
        for shader in &self.scene_shaders {
            shader.enable()?;
            shader.set_mat4("u_LightSpaceMatrix", map.light_space())?;
            shader.set_int("u_ShadowMap", SHADOW_MAP_SLOT as i32)?;
        }

        self.shadows_ready = true;
        self.state = SceneState::Idle;
        Ok(())
    }

    /// Shadow map, if shadows are enabled
    pub fn shadow_map(&self) -> Option<&ShadowMap> {
        self.shadow_map.as_ref()
    }

    // === Queries ===

    /// Current frame state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Counters since the last reset
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Zero the counters
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}
