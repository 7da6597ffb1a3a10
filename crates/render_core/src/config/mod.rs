//! Configuration system
//!
//! Configuration files are TOML or RON, picked by file extension. The only
//! configurable surface of the core is how shader sources are located and how
//! uniform buffers are laid out; whether graphics-API errors are checked is a
//! build-time decision (see [`crate::gpu::check`]).

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        Self::from_str_with_format(&contents, path)
    }

    /// Parse configuration text, using `path` only to pick the format
    fn from_str_with_format(contents: &str, path: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
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

/// # Graphics Configuration
///
/// Shader lookup and uniform buffer layout parameters for the GPU resource layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Directories searched, in order, for `{name}.{extension}` shader files
    pub shader_search_paths: Vec<String>,
    /// File extension of vertex shader sources
    pub vertex_extension: String,
    /// File extension of fragment shader sources
    pub fragment_extension: String,
    /// Number of consecutive block instances allocated per uniform buffer
    pub blocks_per_uniform_buffer: usize,
    /// First uniform binding point handed out to new uniform buffers
    pub first_uniform_binding: u32,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            shader_search_paths: vec![
                "shaders".to_string(),
                "resources/shaders".to_string(),
                "../shaders".to_string(),
            ],
            vertex_extension: "vert".to_string(),
            fragment_extension: "frag".to_string(),
            blocks_per_uniform_buffer: 1,
            first_uniform_binding: 0,
        }
    }
}

impl Config for GraphicsConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(file: &str) -> String {
        let dir = std::env::temp_dir().join(format!("render_core_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(file).to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults() {
        let config = GraphicsConfig::default();
        assert_eq!(config.vertex_extension, "vert");
        assert_eq!(config.fragment_extension, "frag");
        assert_eq!(config.blocks_per_uniform_buffer, 1);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GraphicsConfig::from_str_with_format(
            "vertex_extension = \"vsh\"\nfragment_extension = \"fsh\"\n",
            "graphics.toml",
        ).unwrap();

        assert_eq!(config.vertex_extension, "vsh");
        assert_eq!(config.fragment_extension, "fsh");
        assert_eq!(config.shader_search_paths, GraphicsConfig::default().shader_search_paths);
    }

    #[test]
    fn test_toml_save_and_load() {
        let path = temp_path("graphics.toml");
        let mut config = GraphicsConfig::default();
        config.shader_search_paths = vec!["assets/glsl".to_string()];
        config.first_uniform_binding = 3;

        config.save_to_file(&path).unwrap();
        let loaded = GraphicsConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_save_and_load() {
        let path = temp_path("graphics.ron");
        let mut config = GraphicsConfig::default();
        config.blocks_per_uniform_buffer = 4;

        config.save_to_file(&path).unwrap();
        let loaded = GraphicsConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_format() {
        let result = GraphicsConfig::from_str_with_format("{}", "graphics.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = GraphicsConfig::load_from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
