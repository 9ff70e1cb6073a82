//! Configuration system
//!
//! Configuration files are TOML or RON, picked by file extension. The
//! [`AssetSearchConfig`] controls where scene media is looked up and how
//! much nesting the loader accepts from a scene file.

use std::path::{Path, PathBuf};

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        match extension_of(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension_of(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
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

/// Default cap on frame nesting accepted from a scene file
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Default folder appended to the media root
pub const DEFAULT_MEDIA_SUBFOLDER: &str = "Media";

/// # Asset Search Configuration
///
/// Settings for scene loading: the media directory used as the last entry of
/// the media search path, the nesting limit applied to untrusted scene files,
/// and whether loaded meshes bind their own materials when rendered.
///
/// ```toml
/// media_root = "/opt/scenes"
/// media_subfolder = "Media"
/// max_nesting_depth = 64
/// use_materials = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSearchConfig {
    /// Media root directory. When unset, the process-wide
    /// `SCENE_ASSET_MEDIA_ROOT` environment key is consulted instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_root: Option<PathBuf>,
    /// Folder under the media root that holds the media files
    pub media_subfolder: String,
    /// Maximum frame nesting depth accepted by the loader. Only frame nodes
    /// count; the RON reader sizes its own recursion limit from this value.
    pub max_nesting_depth: usize,
    /// Whether loaded meshes render with their own materials and textures
    pub use_materials: bool,
}

impl Default for AssetSearchConfig {
    fn default() -> Self {
        Self {
            media_root: None,
            media_subfolder: DEFAULT_MEDIA_SUBFOLDER.to_string(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            use_materials: true,
        }
    }
}

impl Config for AssetSearchConfig {}
