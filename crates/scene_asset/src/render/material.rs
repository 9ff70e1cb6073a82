//! Surface material bound per mesh subset

use serde::{Deserialize, Serialize};

/// Fixed-function material of a mesh subset
///
/// Only the diffuse alpha takes part in render ordering: a subset whose
/// diffuse alpha is below 1.0 is translucent and is drawn in the alpha pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Diffuse color, RGBA
    pub diffuse: [f32; 4],
    /// Specular color, RGB
    pub specular: [f32; 3],
    /// Emissive color, RGB
    pub emissive: [f32; 3],
    /// Specular exponent
    pub power: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [0.0; 3],
            emissive: [0.0; 3],
            power: 0.0,
        }
    }
}

impl Material {
    /// Create a material with the given diffuse color
    pub fn with_diffuse(diffuse: [f32; 4]) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }

    /// Diffuse alpha
    pub fn alpha(&self) -> f32 {
        self.diffuse[3]
    }

    /// Whether the subset belongs to the alpha pass
    pub fn is_translucent(&self) -> bool {
        self.alpha() < 1.0
    }
}
