//! Scene management
//!
//! Entities are slotmap keys. Every component type lives in its own
//! [`SecondaryMap`], so removing an entity invalidates its key everywhere
//! at once. The renderers only read the scene; drawing is driven by
//! `on_render_runtime` and `on_render_editor`.

pub mod components;

use slotmap::{new_key_type, Key, SecondaryMap, SlotMap};

pub use components::{
    CameraComponent, CircleRendererComponent, LightSourceComponent, MeshRendererComponent, SkyboxComponent,
    SpriteRendererComponent, TextComponent, TransformComponent,
};

use crate::foundation::math::Mat4;
use crate::render::camera::{EditorCamera, SceneCamera};
use crate::render::context::{RendererContext, SceneView};
use crate::render::renderer3d::LightKind;
use crate::render::RenderResult;

new_key_type! {
    /// Entity handle
    pub struct Entity;
}

/// Component type stored in a [`Scene`]
pub trait Component: Sized + 'static {
    /// Storage for this component type
    fn storage(scene: &Scene) -> &SecondaryMap<Entity, Self>;

    /// Mutable storage for this component type
    fn storage_mut(scene: &mut Scene) -> &mut SecondaryMap<Entity, Self>;
}

macro_rules! impl_component {
    ($($component:ty => $field:ident),* $(,)?) => {
        $(
            impl Component for $component {
                fn storage(scene: &Scene) -> &SecondaryMap<Entity, Self> {
                    &scene.$field
                }

                fn storage_mut(scene: &mut Scene) -> &mut SecondaryMap<Entity, Self> {
                    &mut scene.$field
                }
            }
        )*
    };
}

impl_component! {
    TransformComponent => transforms,
    SpriteRendererComponent => sprites,
    CircleRendererComponent => circles,
    TextComponent => texts,
    LightSourceComponent => lights,
    MeshRendererComponent => meshes,
    CameraComponent => cameras,
    SkyboxComponent => skyboxes,
}

/// Entities and their components
#[derive(Debug, Default)]
pub struct Scene {
    entities: SlotMap<Entity, String>,
    transforms: SecondaryMap<Entity, TransformComponent>,
    sprites: SecondaryMap<Entity, SpriteRendererComponent>,
    circles: SecondaryMap<Entity, CircleRendererComponent>,
    texts: SecondaryMap<Entity, TextComponent>,
    lights: SecondaryMap<Entity, LightSourceComponent>,
    meshes: SecondaryMap<Entity, MeshRendererComponent>,
    cameras: SecondaryMap<Entity, CameraComponent>,
    skyboxes: SecondaryMap<Entity, SkyboxComponent>,
    viewport: (u32, u32),
}

impl Scene {
    /// Empty scene
    pub fn new() -> Self {
        Self::default()
    }

    // === Entities ===

    /// Create a named entity with an identity transform
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        let entity = self.entities.insert(name.into());
        self.transforms.insert(entity, TransformComponent::default());
        entity
    }

    /// Remove an entity and all its components
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        self.transforms.remove(entity);
        self.sprites.remove(entity);
        self.circles.remove(entity);
        self.texts.remove(entity);
        self.lights.remove(entity);
        self.meshes.remove(entity);
        self.cameras.remove(entity);
        self.skyboxes.remove(entity);
        true
    }

    /// Whether `entity` is alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Name given at creation
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.entities.get(entity).map(String::as_str)
    }

    /// Live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Integer id written into vertex data for picking
    pub fn entity_id(entity: Entity) -> i32 {
        // Lower 32 bits of the ffi form are the slot index.
        (entity.data().as_ffi() & 0xffff_ffff) as i32
    }

    // === Components ===

    /// Attach or replace a component; returns `None` for a dead entity
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> Option<&mut C> {
        if !self.contains(entity) {
            return None;
        }
        let storage = C::storage_mut(self);
        storage.insert(entity, component);
        storage.get_mut(entity)
    }

    /// Detach a component
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> Option<C> {
        C::storage_mut(self).remove(entity)
    }

    /// Component of `entity`
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        C::storage(self).get(entity)
    }

    /// Mutable component of `entity`
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        C::storage_mut(self).get_mut(entity)
    }

    /// Whether `entity` has a `C`
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        C::storage(self).contains_key(entity)
    }

    /// Entities with both a transform and a `C`, in slot order
    pub fn view<C: Component>(&self) -> impl Iterator<Item = (Entity, &TransformComponent, &C)> {
        C::storage(self)
            .iter()
            .filter_map(move |(entity, component)| self.transforms.get(entity).map(|t| (entity, t, component)))
    }

    /// First shadow-casting directional light
    pub fn shadow_light(&self) -> Option<(Entity, &TransformComponent, &LightSourceComponent)> {
        self.view::<LightSourceComponent>()
            .find(|(_, _, l)| l.light.kind == LightKind::Directional && l.light.cast_shadows)
    }

    /// First primary camera with a transform
    pub fn primary_camera(&self) -> Option<(Entity, &TransformComponent, &CameraComponent)> {
        self.view::<CameraComponent>().find(|(_, _, c)| c.primary)
    }

    // === Frame entry points ===

    /// Render through the primary camera
    ///
    /// Returns `false` when nothing was drawn, either because the scene has
    /// no primary camera or because the window is minimized.
    pub fn on_render_runtime(&self, context: &mut RendererContext) -> RenderResult<bool> {
        let Some((_, transform, camera)) = self.primary_camera() else {
            log::trace!("No primary camera; skipping runtime render");
            return Ok(false);
        };
        let camera: &SceneCamera = &camera.camera;
        let transform: Mat4 = transform.to_matrix();
        context.render_frame(self, &SceneView::Runtime { camera, transform })
    }

    /// Render through an editor camera
    pub fn on_render_editor(&self, context: &mut RendererContext, camera: &EditorCamera) -> RenderResult<bool> {
        context.render_frame(self, &SceneView::Editor(camera))
    }

    /// Resize every camera that follows the viewport
    pub fn on_viewport_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        for camera in self.cameras.values_mut() {
            if !camera.fixed_aspect_ratio {
                camera.camera.set_viewport_size(width, height);
            }
        }
    }

    /// Last non-zero viewport size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec3, Vec4};
    use crate::render::renderer3d::LightSource;
    use approx::assert_relative_eq;

    #[test]
    fn test_destroy_removes_components() {
        let mut scene = Scene::new();
        let entity = scene.create_entity("Player");
        scene.add_component(entity, SpriteRendererComponent::new(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert!(scene.has::<TransformComponent>(entity));
        assert_eq!(scene.name(entity), Some("Player"));

        assert!(scene.destroy_entity(entity));
        assert!(!scene.has::<SpriteRendererComponent>(entity));
        assert!(scene.add_component(entity, CircleRendererComponent::default()).is_none());
        assert!(!scene.destroy_entity(entity));
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn test_view_requires_transform() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.add_component(a, CircleRendererComponent::default());
        scene.add_component(b, CircleRendererComponent::default());
        scene.remove_component::<TransformComponent>(b);

        let seen: Vec<Entity> = scene.view::<CircleRendererComponent>().map(|(e, _, _)| e).collect();
        assert_eq!(seen, vec![a]);
    }

    #[test]
    fn test_shadow_light_skips_non_casters() {
        let mut scene = Scene::new();
        let plain = scene.create_entity("sun");
        scene.add_component(plain, LightSourceComponent::from(LightSource::directional(Vec3::new(1.0, 1.0, 1.0), 1.0)));
        assert!(scene.shadow_light().is_none());

        let caster = scene.create_entity("caster");
        scene.add_component(
            caster,
            LightSourceComponent::from(LightSource::directional(Vec3::new(1.0, 1.0, 1.0), 1.0).with_shadows(true)),
        );
        assert_eq!(scene.shadow_light().map(|(e, _, _)| e), Some(caster));
    }

    #[test]
    fn test_viewport_resize_respects_fixed_aspect() {
        let mut scene = Scene::new();
        let free = scene.create_entity("free");
        let fixed = scene.create_entity("fixed");
        scene.add_component(free, CameraComponent::primary(SceneCamera::default()));
        scene.add_component(
            fixed,
            CameraComponent {
                fixed_aspect_ratio: true,
                ..Default::default()
            },
        );

        scene.on_viewport_resize(1000, 500);
        assert_relative_eq!(scene.get::<CameraComponent>(free).unwrap().camera.aspect_ratio(), 2.0);
        assert_relative_eq!(
            scene.get::<CameraComponent>(fixed).unwrap().camera.aspect_ratio(),
            16.0 / 9.0
        );
    }

    #[test]
    fn test_entity_ids_are_slot_indices() {
        let mut scene = Scene::new();
        let first = scene.create_entity("first");
        let second = scene.create_entity("second");
        assert_ne!(Scene::entity_id(first), Scene::entity_id(second));
        assert!(Scene::entity_id(first) >= 0);
    }
}
