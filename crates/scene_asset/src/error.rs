//! Error types for scene loading, device resources and rendering

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::geometry::GeometryError;
use crate::render::DeviceError;

/// Errors produced while loading, restoring or rendering a scene
///
/// Structural errors (`FormatCorrupt`, `DuplicateMesh`, `MissingParent`,
/// `GeometryLoad`, `NestingTooDeep`) abort a load and discard everything built
/// by it. Lifecycle errors (`NoSourceGeometry`, `NotRestored`, `DeviceLost`)
/// are handed back to the caller, who decides when to retry.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The scene source could not be decoded into nodes
    #[error("Scene data is corrupt: {0}")]
    FormatCorrupt(String),

    /// A frame received a second mesh node
    #[error("Frame '{frame}' already owns a mesh, rejected mesh '{mesh}'")]
    DuplicateMesh {
        /// Frame that already owns a mesh
        frame: String,
        /// Name of the rejected mesh node
        mesh: String,
    },

    /// A node that must attach to a frame was loaded without one
    #[error("Node '{0}' requires a parent frame")]
    MissingParent(String),

    /// Geometry for a mesh could not be built or optimized
    #[error("Failed to load geometry for mesh '{mesh}': {source}")]
    GeometryLoad {
        /// Mesh being built
        mesh: String,
        /// Underlying geometry failure
        #[source]
        source: GeometryError,
    },

    /// An allocation requested from the device could not be satisfied
    #[error("Out of memory")]
    OutOfMemory,

    /// Restore was requested for a mesh without host-resident geometry
    #[error("Mesh '{0}' has no host-resident geometry")]
    NoSourceGeometry(String),

    /// Render was requested for a mesh without a device-resident copy
    #[error("Mesh '{0}' has not been restored to the device")]
    NotRestored(String),

    /// The graphics device was lost and must be reset
    #[error("Graphics device lost")]
    DeviceLost,

    /// Frame nesting in the source exceeds the configured limit
    #[error("Node '{node}' exceeds the nesting limit of {limit} levels")]
    NestingTooDeep {
        /// Node at which the limit was crossed
        node: String,
        /// Configured limit
        limit: usize,
    },

    /// No entry of the media search path holds the requested file
    #[error("Media file not found: {0}")]
    MediaNotFound(String),

    /// A texture file exists but could not be decoded
    #[error("Texture error: {0}")]
    Texture(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Any other device failure
    #[error("Device error: {0}")]
    Device(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DeviceError> for SceneError {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::DeviceLost => Self::DeviceLost,
            DeviceError::OutOfMemory => Self::OutOfMemory,
            other => Self::Device(other.to_string()),
        }
    }
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Non-fatal diagnostic for a subset whose texture could not be loaded
///
/// The subset keeps an empty texture slot and the load carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureResolutionWarning {
    /// Mesh owning the subset
    pub mesh: String,
    /// Subset index
    pub subset: usize,
    /// Texture filename as written in the scene
    pub filename: String,
    /// Why the texture was dropped
    pub reason: String,
}

impl fmt::Display for TextureResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Texture '{}' for subset {} of mesh '{}' was not loaded: {}",
            self.filename, self.subset, self.mesh, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_conversion() {
        assert!(matches!(SceneError::from(DeviceError::DeviceLost), SceneError::DeviceLost));
        assert!(matches!(SceneError::from(DeviceError::OutOfMemory), SceneError::OutOfMemory));
        assert!(matches!(
            SceneError::from(DeviceError::InvalidCall("bad subset".to_string())),
            SceneError::Device(message) if message.contains("bad subset")
        ));
    }

    #[test]
    fn test_warning_display() {
        let warning = TextureResolutionWarning {
            mesh: "hull".to_string(),
            subset: 2,
            filename: "panel.png".to_string(),
            reason: "Media file not found: panel.png".to_string(),
        };
        let text = warning.to_string();
        assert!(text.contains("panel.png"));
        assert!(text.contains("subset 2"));
        assert!(text.contains("hull"));
    }
}
