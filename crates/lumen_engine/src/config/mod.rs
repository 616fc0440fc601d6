//! Configuration system
//!
//! Renderer limits and feature switches, loadable from TOML or RON.

pub use serde::{Deserialize, Serialize};

use crate::render::api::GraphicsApi;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside the range the renderer can work with
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Directional shadow map settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Whether the shadow pass runs at all
    pub enabled: bool,
    /// Edge length of the square depth map in texels
    pub map_size: u32,
    /// Half extent of the orthographic light frustum in world units
    pub frustum_extent: f32,
    /// Near plane of the light frustum
    pub near: f32,
    /// Far plane of the light frustum
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            map_size: 2048,
            frustum_extent: 20.0,
            near: 0.1,
            far: 50.0,
        }
    }
}

/// Renderer configuration
///
/// Every limit here is read once by `RendererContext::init`; changing the
/// struct afterwards has no effect on a running context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Backend to create at startup
    pub graphics_api: GraphicsApi,
    /// Quads (and circles, glyphs) per batch before a forced flush
    pub max_quads: u32,
    /// Lines per batch before a forced flush
    pub max_lines: u32,
    /// Directional lights bound per scene
    pub max_directional_lights: u32,
    /// Point lights bound per scene
    pub max_point_lights: u32,
    /// Spot lights bound per scene
    pub max_spot_lights: u32,
    /// Largest accepted framebuffer edge in pixels
    pub max_framebuffer_size: u32,
    /// Rasterized line width used for line batches
    pub line_width: f32,
    /// Background clear color [R, G, B, A]
    pub clear_color: [f32; 4],
    /// Shadow pass settings
    pub shadows: ShadowConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            graphics_api: GraphicsApi::Headless,
            max_quads: 20_000,
            max_lines: 20_000,
            max_directional_lights: 1,
            max_point_lights: 25,
            max_spot_lights: 25,
            max_framebuffer_size: 8192,
            line_width: 2.0,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            shadows: ShadowConfig::default(),
        }
    }
}

impl Config for RendererConfig {}

impl RendererConfig {
    /// Set the quad batch capacity
    pub fn with_max_quads(mut self, max_quads: u32) -> Self {
        self.max_quads = max_quads;
        self
    }

    /// Set the line batch capacity
    pub fn with_max_lines(mut self, max_lines: u32) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Enable or disable the shadow pass
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows.enabled = enabled;
        self
    }

    /// Check limits the renderer depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_quads == 0 || self.max_lines == 0 {
            return Err(ConfigError::Invalid("batch capacities must be non-zero".into()));
        }
        // Quad indices are u32 and each quad consumes four vertices.
        if u64::from(self.max_quads) * 4 > u64::from(u32::MAX) {
            return Err(ConfigError::Invalid(format!(
                "max_quads {} overflows the 32-bit index range",
                self.max_quads
            )));
        }
        if self.max_framebuffer_size == 0 {
            return Err(ConfigError::Invalid("max_framebuffer_size must be non-zero".into()));
        }
        if self.shadows.enabled && self.shadows.map_size == 0 {
            return Err(ConfigError::Invalid("shadow map size must be non-zero".into()));
        }
        if self.shadows.enabled && self.shadows.map_size > self.max_framebuffer_size {
            return Err(ConfigError::Invalid(format!(
                "shadow map size {} exceeds max_framebuffer_size {}",
                self.shadows.map_size, self.max_framebuffer_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_renderer_limits() {
        let config = RendererConfig::default();
        assert_eq!(config.max_quads, 20_000);
        assert_eq!(config.max_directional_lights, 1);
        assert_eq!(config.max_point_lights, 25);
        assert_eq!(config.max_spot_lights, 25);
        assert_eq!(config.max_framebuffer_size, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shadow_map_bounded_by_framebuffer_cap() {
        let mut config = RendererConfig::default();
        config.shadows.map_size = 16_384;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.shadows.enabled = false;
        assert!(config.validate().is_ok());

        config.shadows.enabled = true;
        config.shadows.map_size = config.max_framebuffer_size;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: RendererConfig = toml::from_str(
            r#"
            max_quads = 100

            [shadows]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.max_quads, 100);
        assert!(!config.shadows.enabled);
        assert_eq!(config.shadows.map_size, 2048);
        assert_eq!(config.max_point_lights, 25);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = RendererConfig::default().with_max_quads(64);
        let text = ron::ser::to_string(&config).unwrap();
        let parsed: RendererConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = RendererConfig::default().with_max_quads(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let result = RendererConfig::load_from_file("renderer.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
    }
}
