//! Scene root and two-pass rendering

use crate::assets::MediaResolver;
use crate::config::AssetSearchConfig;
use crate::error::SceneResult;
use crate::format::{ron_reader, FormatReader};
use crate::foundation::math::Mat4;
use crate::geometry::VertexFormat;
use crate::render::{BlendState, GraphicsDevice, TransformState};
use crate::scene::{Frame, Mesh, SceneLoader};

/// Name of the synthetic frame holding a scene's top-level frames
pub const ROOT_FRAME_NAME: &str = "scene_root";

/// Result of one load: a forest of frames under a synthetic root
///
/// A transform node at the top level of the scene file sets the root's local
/// transform, which applies to the whole forest.
#[derive(Debug)]
pub struct Scene {
    root: Frame,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene
    pub fn new() -> Self {
        Self::from_root(Frame::new(ROOT_FRAME_NAME))
    }

    /// Scene over an existing root frame
    pub fn from_root(root: Frame) -> Self {
        Self { root }
    }

    /// Load a scene from a node reader
    pub fn load(
        device: &mut dyn GraphicsDevice,
        reader: &mut dyn FormatReader,
        resolver: &MediaResolver,
        config: &AssetSearchConfig,
    ) -> SceneResult<Self> {
        SceneLoader::new(device, resolver).with_config(config).load_scene(reader)
    }

    /// Find a RON scene file on the media search path and load it
    pub fn load_file(
        device: &mut dyn GraphicsDevice,
        filename: &str,
        resolver: &MediaResolver,
        config: &AssetSearchConfig,
    ) -> SceneResult<Self> {
        let path = resolver.find(filename)?;
        log::info!("Loading scene file {:?}", path);
        let mut reader = ron_reader::read_file(&path, config)?;
        Self::load(device, &mut reader, resolver, config)
    }

    /// Synthetic root frame
    pub fn root(&self) -> &Frame {
        &self.root
    }

    /// Mutable access to the synthetic root
    pub fn root_mut(&mut self) -> &mut Frame {
        &mut self.root
    }

    /// Top-level frames
    pub fn frames(&self) -> &[Frame] {
        self.root.children()
    }

    /// Frames in the forest, the synthetic root excluded
    pub fn frame_count(&self) -> usize {
        self.root.frame_count() - 1
    }

    /// Meshes in the forest
    pub fn mesh_count(&self) -> usize {
        self.root.mesh_count()
    }

    /// Visit every mesh in the forest
    pub fn for_each_mesh<F: FnMut(&Mesh)>(&self, visitor: F) {
        self.root.for_each_mesh(visitor);
    }

    /// Find a frame by name, ignoring case
    pub fn find_frame(&self, name: &str) -> Option<&Frame> {
        self.root.find_frame(name)
    }

    /// Mutable form of [`find_frame`](Self::find_frame)
    pub fn find_frame_mut(&mut self, name: &str) -> Option<&mut Frame> {
        self.root.find_frame_mut(name)
    }

    /// Find a mesh by name, ignoring case
    pub fn find_mesh(&self, name: &str) -> Option<&Mesh> {
        self.root.find_mesh(name)
    }

    /// Mutable form of [`find_mesh`](Self::find_mesh)
    pub fn find_mesh_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.root.find_mesh_mut(name)
    }

    /// Restore device copies of every mesh
    pub fn restore_device_objects(&mut self, device: &mut dyn GraphicsDevice) -> SceneResult<()> {
        self.root.restore_device_objects(device)?;
        log::info!("Restored {} meshes", self.mesh_count());
        Ok(())
    }

    /// Release device copies of every mesh
    pub fn invalidate_device_objects(&mut self) {
        self.root.invalidate_device_objects();
        log::info!("Invalidated {} meshes", self.mesh_count());
    }

    /// Convert every mesh to another vertex layout
    pub fn set_vertex_format(&mut self, device: &mut dyn GraphicsDevice, format: VertexFormat) -> SceneResult<()> {
        self.root.set_vertex_format(device, format)
    }

    /// Enable or disable material binding on every mesh
    pub fn set_use_materials(&mut self, use_materials: bool) {
        self.root.set_use_materials(use_materials);
    }

    /// Release the whole forest
    pub fn destroy(&mut self) {
        self.root.destroy();
    }

    /// Render the scene in two passes
    ///
    /// All opaque subsets are drawn with blending disabled, then all
    /// translucent subsets with source-alpha blending. `world` is composed
    /// with the root transform; it defaults to the device's current world
    /// transform. Blending is disabled and the world transform put back
    /// before returning, also when a mesh fails to render.
    pub fn render(&self, device: &mut dyn GraphicsDevice, world: Option<&Mat4>) -> SceneResult<()> {
        let saved = device.transform(TransformState::World);
        let base = world.copied().unwrap_or(saved);

        let result = self.render_passes(device, &base);

        device.set_blend_state(BlendState::Disabled);
        device.set_transform(TransformState::World, &saved);
        result
    }

    fn render_passes(&self, device: &mut dyn GraphicsDevice, base: &Mat4) -> SceneResult<()> {
        device.set_blend_state(BlendState::Disabled);
        self.root.render(device, true, false, Some(base))?;

        device.set_blend_state(BlendState::ALPHA);
        self.root.render(device, false, true, Some(base))
    }
}
