//! Configuration system
//!
//! Serializable configuration for the toolkit. Configs can be loaded from
//! and saved to TOML or RON files; the format is picked from the file
//! extension.

use serde::de::DeserializeOwned;
pub use serde::{Deserialize, Serialize};

use crate::foundation::FrameId;

/// Configuration trait
///
/// Blanket-implemented load/save for any serializable, defaultable config
/// type.
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

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
}

/// Shader configuration
///
/// Paths to the compiled SPIR-V stages a graphics pipeline is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::new("shaders/scene.vert.spv", "shaders/scene.frag.spv")
    }
}

/// Resource updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Number of frames whose GPU work may still be executing while the
    /// CPU records a new one. Used as the fallback time-to-live for
    /// updatees whose trigger events carry no frame dependency of their
    /// own, and as the deferral for retired resource state.
    pub frames_in_flight: FrameId,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
        }
    }
}

/// Top-level toolkit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Resource updater settings
    pub updater: UpdaterConfig,
    /// Default shader stage paths
    pub shaders: ShaderConfig,
}

impl Config for UpdaterConfig {}
impl Config for ToolkitConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updater_config_default() {
        let config = UpdaterConfig::default();
        assert_eq!(config.frames_in_flight, 2);
    }

    #[test]
    fn test_toolkit_config_toml_round_trip() {
        let config = ToolkitConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ToolkitConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.updater.frames_in_flight, config.updater.frames_in_flight);
        assert_eq!(parsed.shaders.vertex_shader_path, config.shaders.vertex_shader_path);
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let err = ToolkitConfig::default().save_to_file("config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
