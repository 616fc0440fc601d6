//! # Lumen Engine
//!
//! Renderer core of a real-time game engine: a batched 2D renderer and a
//! forward-lit 3D scene renderer behind an abstract graphics backend.
//!
//! ## Features
//!
//! - **2D batching**: quads, circles, lines and MSDF text in a handful of
//!   draw calls per frame, with automatic flushes on full buffers or
//!   exhausted texture slots
//! - **3D forward rendering**: PBR meshes, per-kind light arrays with caps,
//!   skybox, transparency and a directional shadow pass
//! - **Backend abstraction**: every GPU call goes through
//!   [`render::GraphicsBackend`]; a recording headless backend ships with
//!   the crate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let mut context = RendererContext::init(RendererConfig::default())?;
//!     context.on_window_resize(1280, 720);
//!
//!     let mut scene = Scene::new();
//!     let quad = scene.create_entity("Quad");
//!     scene.add_component(quad, SpriteRendererComponent::new(Vec4::new(0.8, 0.2, 0.3, 1.0)));
//!
//!     scene.on_render_editor(&mut context, &EditorCamera::default())?;
//!     log::info!("{:?}", context.stats());
//!     context.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, RendererConfig, ShadowConfig},
        foundation::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4},
        render::{
            renderer2d::{FontMetrics, Glyph, GlyphBounds},
            renderer3d::MeshData,
            EditorCamera, Font, GraphicsApi, LightKind, LightSource, Material, Mesh, RenderError, RenderResult,
            RenderStats, RendererContext, SceneCamera, SceneRenderer, SceneView, Texture2D, TextParams,
        },
        scene::{
            CameraComponent, CircleRendererComponent, Entity, LightSourceComponent, MeshRendererComponent, Scene,
            SkyboxComponent, SpriteRendererComponent, TextComponent, TransformComponent,
        },
    };
}
