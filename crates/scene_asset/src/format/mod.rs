//! Scene-file node model and the reader contract
//!
//! A scene source is consumed as a sequence of top-level [`FileNode`]s. Each
//! node carries a tag from a closed set ([`NodeData`]), a name and the nested
//! child nodes. Decoding the concrete file format is the job of a
//! [`FormatReader`] implementation; the loader only sees nodes.

pub mod ron_reader;

use std::collections::VecDeque;

use crate::error::SceneResult;
use crate::foundation::math::MATRIX_FLOAT_COUNT;
use crate::render::Material;

/// Tag of a scene-file node, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Geometry attached to the enclosing frame
    Mesh,
    /// Local transform of the enclosing frame
    TransformMatrix,
    /// A transform frame with nested nodes
    Frame,
    /// Any node type the loader does not understand
    Other,
}

/// Tag-specific payload of a scene-file node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Geometry buffers and materials
    Mesh(MeshPayload),
    /// Sixteen floats, row-major, row-vector convention
    TransformMatrix([f32; MATRIX_FLOAT_COUNT]),
    /// Frame; its contents are the node's children
    Frame,
    /// Unrecognized node, skipped by the loader
    Other {
        /// Template or type name reported by the reader
        template: String,
    },
}

/// One node of a scene file
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    /// Node name, possibly empty
    pub name: String,
    /// Tag and payload
    pub data: NodeData,
    /// Nested nodes, in file order
    pub children: Vec<FileNode>,
}

impl FileNode {
    /// Create a frame node with the given children
    pub fn frame(name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            name: name.into(),
            data: NodeData::Frame,
            children,
        }
    }

    /// Create a transform-matrix node
    pub fn transform_matrix(values: [f32; MATRIX_FLOAT_COUNT]) -> Self {
        Self {
            name: String::new(),
            data: NodeData::TransformMatrix(values),
            children: Vec::new(),
        }
    }

    /// Create a mesh node
    pub fn mesh(name: impl Into<String>, payload: MeshPayload) -> Self {
        Self {
            name: name.into(),
            data: NodeData::Mesh(payload),
            children: Vec::new(),
        }
    }

    /// Create a node of a type the loader ignores
    pub fn other(template: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            data: NodeData::Other { template: template.into() },
            children: Vec::new(),
        }
    }

    /// Tag of this node
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Mesh(_) => NodeKind::Mesh,
            NodeData::TransformMatrix(_) => NodeKind::TransformMatrix,
            NodeData::Frame => NodeKind::Frame,
            NodeData::Other { .. } => NodeKind::Other,
        }
    }
}

/// Material entry of a mesh node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDesc {
    /// Surface parameters
    pub material: Material,
    /// Texture referenced by the material, resolved through the media search path
    pub texture_filename: Option<String>,
}

/// Geometry payload of a mesh node
///
/// Faces are triangles: `indices` holds three vertex indices per face and
/// `face_materials` one material index per face. An empty `face_materials`
/// assigns every face to material 0. `adjacency`, when present, holds three
/// neighbour face indices per face (one per edge, [`NO_NEIGHBOR`] for open
/// edges).
///
/// [`NO_NEIGHBOR`]: crate::geometry::NO_NEIGHBOR
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshPayload {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals
    pub normals: Option<Vec<[f32; 3]>>,
    /// Per-vertex texture coordinates
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// Triangle list indices
    pub indices: Vec<u32>,
    /// Material index of each face
    pub face_materials: Vec<u32>,
    /// Materials referenced by `face_materials`
    pub materials: Vec<MaterialDesc>,
    /// Face adjacency, three entries per face
    pub adjacency: Option<Vec<u32>>,
}

impl MeshPayload {
    /// Number of triangles described by the index buffer
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Materials the mesh will use; a mesh without materials gets one default material
    pub fn effective_materials(&self) -> Vec<MaterialDesc> {
        if self.materials.is_empty() {
            vec![MaterialDesc::default()]
        } else {
            self.materials.clone()
        }
    }
}

/// Source of scene-file nodes
///
/// Implementations decode a concrete file format and yield top-level nodes one
/// at a time. A reader returns `Ok(None)` once the source is exhausted and
/// [`SceneError::FormatCorrupt`](crate::SceneError::FormatCorrupt) when the
/// source cannot be decoded.
pub trait FormatReader {
    /// Next top-level node, or `None` at the end of the source
    fn next_node(&mut self) -> SceneResult<Option<FileNode>>;
}

/// Reader over nodes that are already in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    nodes: VecDeque<FileNode>,
}

impl MemoryReader {
    /// Create a reader yielding the given top-level nodes in order
    pub fn new(nodes: Vec<FileNode>) -> Self {
        Self { nodes: nodes.into() }
    }

    /// Number of nodes not yet read
    pub fn remaining(&self) -> usize {
        self.nodes.len()
    }
}

impl From<Vec<FileNode>> for MemoryReader {
    fn from(nodes: Vec<FileNode>) -> Self {
        Self::new(nodes)
    }
}

impl FormatReader for MemoryReader {
    fn next_node(&mut self) -> SceneResult<Option<FileNode>> {
        Ok(self.nodes.pop_front())
    }
}
