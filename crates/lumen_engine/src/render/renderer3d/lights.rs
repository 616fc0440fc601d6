//! Scene lights
//!
//! A [`LightSource`] only carries the photometric part of a light. Where the
//! light sits and where it points come from the entity transform handed to
//! `SceneRenderer::render_light_source`.

use serde::{Deserialize, Serialize};

use crate::config::RendererConfig;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LightKind {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    #[default]
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

impl LightKind {
    /// Uniform array holding lights of this kind
    pub fn array_name(self) -> &'static str {
        match self {
            LightKind::Directional => "u_DirectionalLights",
            LightKind::Point => "u_PointLights",
            LightKind::Spot => "u_SpotLights",
        }
    }

    /// Uniform holding the number of bound lights of this kind
    pub fn count_name(self) -> &'static str {
        match self {
            LightKind::Directional => "u_DirectionalLightCount",
            LightKind::Point => "u_PointLightCount",
            LightKind::Spot => "u_SpotLightCount",
        }
    }

    /// All kinds in binding order
    pub const ALL: [LightKind; 3] = [LightKind::Directional, LightKind::Point, LightKind::Spot];
}

/// Light source component data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    /// Light type
    pub kind: LightKind,
    /// Linear RGB color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range (for point/spot lights)
    pub range: f32,
    /// Inner cone angle for spot lights (in radians)
    pub inner_cone_angle: f32,
    /// Outer cone angle for spot lights (in radians)
    pub outer_cone_angle: f32,
    /// Renders into the shadow map (directional lights only)
    pub cast_shadows: bool,
}

impl Default for LightSource {
    fn default() -> Self {
        Self::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0)
    }
}

impl LightSource {
    /// Create a directional light
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            range: 0.0,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
            cast_shadows: false,
        }
    }

    /// Create a point light
    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            intensity,
            range,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
            cast_shadows: false,
        }
    }

    /// Create a spot light
    pub fn spot(color: Vec3, intensity: f32, range: f32, inner_cone_angle: f32, outer_cone_angle: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            color,
            intensity,
            range,
            inner_cone_angle,
            outer_cone_angle: outer_cone_angle.max(inner_cone_angle),
            cast_shadows: false,
        }
    }

    /// Mark the light as shadow casting
    pub fn with_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }
}

/// Direction a transform points along, its local -Z axis
pub fn light_direction(transform: &Mat4) -> Vec3 {
    let forward = transform * Vec4::new(0.0, 0.0, -1.0, 0.0);
    forward.xyz().try_normalize(f32::EPSILON).unwrap_or_else(|| Vec3::new(0.0, 0.0, -1.0))
}

/// Per-scene light counters
///
/// Each kind gets slots `0..cap`; lights past the cap are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLightDescription {
    directional: u32,
    point: u32,
    spot: u32,
    max_directional: u32,
    max_point: u32,
    max_spot: u32,
}

impl SceneLightDescription {
    /// Counters with the caps from `config`
    pub fn new(config: &RendererConfig) -> Self {
        Self::with_caps(
            config.max_directional_lights,
            config.max_point_lights,
            config.max_spot_lights,
        )
    }

    /// Counters with explicit caps
    pub fn with_caps(max_directional: u32, max_point: u32, max_spot: u32) -> Self {
        Self {
            directional: 0,
            point: 0,
            spot: 0,
            max_directional,
            max_point,
            max_spot,
        }
    }

    /// Zero every counter
    pub fn reset(&mut self) {
        self.directional = 0;
        self.point = 0;
        self.spot = 0;
    }

    /// Take the next slot for `kind`, or `None` at the cap
    pub fn try_claim(&mut self, kind: LightKind) -> Option<u32> {
        let (count, max) = match kind {
            LightKind::Directional => (&mut self.directional, self.max_directional),
            LightKind::Point => (&mut self.point, self.max_point),
            LightKind::Spot => (&mut self.spot, self.max_spot),
        };
        if *count >= max {
            return None;
        }
        let slot = *count;
        *count += 1;
        Some(slot)
    }

    /// Lights of `kind` bound so far
    pub fn count(&self, kind: LightKind) -> u32 {
        match kind {
            LightKind::Directional => self.directional,
            LightKind::Point => self.point,
            LightKind::Spot => self.spot,
        }
    }

    /// Cap for `kind`
    pub fn max(&self, kind: LightKind) -> u32 {
        match kind {
            LightKind::Directional => self.max_directional,
            LightKind::Point => self.max_point,
            LightKind::Spot => self.max_spot,
        }
    }
}
