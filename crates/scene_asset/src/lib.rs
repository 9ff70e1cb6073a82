//! # Scene Asset
//!
//! Hierarchical scene-file importer and renderer for real-time 3D.
//!
//! ## Features
//!
//! - **Frame Hierarchy**: Scene files become a forest of transform frames owning their meshes
//! - **Device Lifecycle**: Host geometry survives device resets; device copies are invalidated and restored explicitly
//! - **Two-Pass Rendering**: All opaque subsets are drawn before any alpha-blended subset
//! - **Backend Agnostic**: Rendering goes through the [`render::GraphicsDevice`] trait
//! - **Media Search**: Textures and scene files are looked up along an ordered search path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_asset::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let config = AssetSearchConfig::default();
//!     let resolver = MediaResolver::from_environment(&config)?;
//!     let mut device = RecordingDevice::new();
//!
//!     let mut scene = Scene::load_file(&mut device, "ship.ron", &resolver, &config)?;
//!     scene.restore_device_objects(&mut device)?;
//!     scene.render(&mut device, None)?;
//!
//!     // Around a device reset
//!     scene.invalidate_device_objects();
//!     scene.restore_device_objects(&mut device)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod error;
pub mod format;
pub mod foundation;
pub mod geometry;
pub mod render;
pub mod scene;

pub use error::{SceneError, SceneResult, TextureResolutionWarning};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        assets::{ImageData, MediaResolver},
        config::{AssetSearchConfig, Config},
        error::{SceneError, SceneResult, TextureResolutionWarning},
        format::{ron_reader, FileNode, FormatReader, MemoryReader, MeshPayload, NodeData},
        foundation::math::{Mat4, Vec3},
        geometry::{MeshGeometry, VertexFormat},
        render::{BlendState, GraphicsDevice, Material, RecordingDevice, TransformState},
        scene::{Frame, Mesh, Scene, SceneLoader},
    };
}
