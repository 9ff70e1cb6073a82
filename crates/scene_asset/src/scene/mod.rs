//! Scene graph: frames, meshes and the loader that builds them
//!
//! A loaded [`Scene`] is a forest of [`Frame`]s under a synthetic root. Frames
//! own their meshes and children outright, so dropping the scene releases
//! every host and device resource it holds.

pub mod forest;
pub mod frame;
pub mod loader;
pub mod mesh;

#[cfg(test)]
pub(crate) mod test_support;

pub use forest::{Scene, ROOT_FRAME_NAME};
pub use frame::{names_match, Frame};
pub use loader::SceneLoader;
pub use mesh::{Mesh, Subset};
