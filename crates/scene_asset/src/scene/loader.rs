//! Builds a frame forest from scene-file nodes

use crate::assets::MediaResolver;
use crate::config::{AssetSearchConfig, DEFAULT_MAX_NESTING_DEPTH};
use crate::error::{SceneError, SceneResult};
use crate::format::{FileNode, FormatReader, NodeData};
use crate::foundation::math::{is_finite, mat4_from_file_layout};
use crate::render::GraphicsDevice;
use crate::scene::{Frame, Mesh, Scene, ROOT_FRAME_NAME};

/// Scene loader
///
/// Dispatches each node on its tag:
///
/// - a mesh node builds a [`Mesh`] for the enclosing frame
/// - a transform node overwrites the enclosing frame's local transform
/// - a frame node builds a child frame from its nested nodes and then places
///   it first among the enclosing frame's children
/// - any other node is skipped
///
/// Loading is all-or-nothing: the first error drops everything built so far.
pub struct SceneLoader<'a> {
    device: &'a mut dyn GraphicsDevice,
    resolver: &'a MediaResolver,
    max_nesting_depth: usize,
    use_materials: bool,
}

impl<'a> SceneLoader<'a> {
    /// Create a loader with default limits
    pub fn new(device: &'a mut dyn GraphicsDevice, resolver: &'a MediaResolver) -> Self {
        Self {
            device,
            resolver,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            use_materials: true,
        }
    }

    /// Apply the nesting limit and material setting from a config
    pub fn with_config(mut self, config: &AssetSearchConfig) -> Self {
        self.max_nesting_depth = config.max_nesting_depth;
        self.use_materials = config.use_materials;
        self
    }

    /// Override the nesting limit
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Read every top-level node into a new scene
    pub fn load_scene(&mut self, reader: &mut dyn FormatReader) -> SceneResult<Scene> {
        let mut root = Frame::new(ROOT_FRAME_NAME);
        while let Some(node) = reader.next_node()? {
            self.load_frame(&node, Some(&mut root), 1)?;
        }

        let scene = Scene::from_root(root);
        log::info!(
            "Loaded scene: {} frames, {} meshes",
            scene.frame_count(),
            scene.mesh_count()
        );
        Ok(scene)
    }

    /// Load one node and its nested nodes into `parent`
    ///
    /// `depth` is the nesting level of `node`, 1 for top-level nodes. A frame
    /// node deeper than the configured limit fails with `NestingTooDeep`; the
    /// mesh and transform of a frame at the limit still load.
    pub fn load_frame(&mut self, node: &FileNode, parent: Option<&mut Frame>, depth: usize) -> SceneResult<()> {
        log::trace!("Loading {:?} node '{}' at depth {}", node.kind(), node.name, depth);

        match &node.data {
            NodeData::Mesh(payload) => {
                let parent = require_parent(parent, node)?;
                if parent.mesh().is_some() {
                    return Err(SceneError::DuplicateMesh {
                        frame: parent.name().to_string(),
                        mesh: node.name.clone(),
                    });
                }

                let mut mesh = Mesh::create(&mut *self.device, &node.name, payload, self.resolver)?;
                mesh.set_use_materials(self.use_materials);
                parent.set_mesh(mesh)?;
            }
            NodeData::TransformMatrix(values) => {
                let parent = require_parent(parent, node)?;
                let transform = mat4_from_file_layout(values);
                if !is_finite(&transform) {
                    return Err(SceneError::FormatCorrupt(format!(
                        "transform of frame '{}' has non-finite elements",
                        parent.name()
                    )));
                }
                parent.set_local_transform(transform);
            }
            NodeData::Frame => {
                if depth > self.max_nesting_depth {
                    return Err(SceneError::NestingTooDeep {
                        node: node.name.clone(),
                        limit: self.max_nesting_depth,
                    });
                }
                let parent = require_parent(parent, node)?;
                let mut frame = Frame::new(node.name.as_str());
                for child in &node.children {
                    self.load_frame(child, Some(&mut frame), depth + 1)?;
                }
                parent.add_child(frame);
            }
            NodeData::Other { template } => {
                log::trace!("Skipping unsupported node '{}' of type '{}'", node.name, template);
            }
        }

        Ok(())
    }
}

fn require_parent<'f>(parent: Option<&'f mut Frame>, node: &FileNode) -> SceneResult<&'f mut Frame> {
    parent.ok_or_else(|| SceneError::MissingParent(node.name.clone()))
}
