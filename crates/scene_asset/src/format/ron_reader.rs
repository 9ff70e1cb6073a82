//! RON scene description reader
//!
//! A text form of the node tree, used by tests and the viewer. A scene is a
//! list of nodes:
//!
//! ```ron
//! Scene(nodes: [
//!     Frame(name: "ship", children: [
//!         Matrix([1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  0.0, 2.0, 0.0, 1.0]),
//!         Mesh((
//!             name: "hull",
//!             positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
//!             indices: [0, 1, 2],
//!             materials: [(material: (diffuse: (1.0, 1.0, 1.0, 0.5)), texture: Some("hull.png"))],
//!             generate_adjacency: true,
//!         )),
//!     ]),
//! ])
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{FileNode, MaterialDesc, MemoryReader, MeshPayload, NodeData};
use crate::config::AssetSearchConfig;
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::MATRIX_FLOAT_COUNT;
use crate::geometry::generate_adjacency;
use crate::render::Material;

#[derive(Debug, Deserialize)]
#[serde(rename = "Scene")]
struct SceneDesc {
    #[serde(default)]
    nodes: Vec<NodeDesc>,
}

#[derive(Debug, Deserialize)]
enum NodeDesc {
    Frame {
        #[serde(default)]
        name: String,
        #[serde(default)]
        children: Vec<NodeDesc>,
    },
    Matrix(Vec<f32>),
    Mesh(MeshDesc),
    Other {
        template: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        children: Vec<NodeDesc>,
    },
}

#[derive(Debug, Deserialize)]
struct MeshDesc {
    #[serde(default)]
    name: String,
    positions: Vec<[f32; 3]>,
    #[serde(default)]
    normals: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    tex_coords: Option<Vec<[f32; 2]>>,
    indices: Vec<u32>,
    #[serde(default)]
    face_materials: Vec<u32>,
    #[serde(default)]
    materials: Vec<MaterialEntry>,
    #[serde(default)]
    adjacency: Option<Vec<u32>>,
    #[serde(default)]
    generate_adjacency: bool,
}

#[derive(Debug, Deserialize)]
struct MaterialEntry {
    #[serde(default)]
    material: Material,
    #[serde(default)]
    texture: Option<String>,
}

/// Upper bound on the RON nesting levels of one frame node: the enum variant,
/// its fields and the child list
const RON_LEVELS_PER_FRAME: usize = 8;

/// Extra RON levels below the deepest frame, enough for a mesh with materials
const RON_LEVELS_BELOW_FRAMES: usize = 32;

/// RON recursion limit that lets the loader's frame limit be the one to trip
fn recursion_limit(max_nesting_depth: usize) -> usize {
    max_nesting_depth
        .saturating_mul(RON_LEVELS_PER_FRAME)
        .saturating_add(RON_LEVELS_BELOW_FRAMES)
}

/// Parse a RON scene description into a node reader
///
/// The parser accepts nesting a little past `config.max_nesting_depth`, so
/// over-deep scenes fail in the loader with `NestingTooDeep`. Documents far
/// deeper than that are rejected here as `FormatCorrupt`.
pub fn parse_str(source: &str, config: &AssetSearchConfig) -> SceneResult<MemoryReader> {
    let options = ron::Options::default().with_recursion_limit(recursion_limit(config.max_nesting_depth));
    let scene: SceneDesc = options
        .from_str(source)
        .map_err(|e| SceneError::FormatCorrupt(format!("RON scene: {}", e)))?;

    let nodes = scene
        .nodes
        .into_iter()
        .map(convert_node)
        .collect::<SceneResult<Vec<_>>>()?;
    Ok(MemoryReader::new(nodes))
}

/// Read and parse a RON scene file
pub fn read_file(path: impl AsRef<Path>, config: &AssetSearchConfig) -> SceneResult<MemoryReader> {
    let path = path.as_ref();
    log::debug!("Reading scene description {:?}", path);
    let source = std::fs::read_to_string(path)?;
    parse_str(&source, config)
}

fn convert_node(node: NodeDesc) -> SceneResult<FileNode> {
    match node {
        NodeDesc::Frame { name, children } => Ok(FileNode::frame(name, convert_children(children)?)),
        NodeDesc::Matrix(values) => {
            let values: [f32; MATRIX_FLOAT_COUNT] = values.try_into().map_err(|values: Vec<f32>| {
                SceneError::FormatCorrupt(format!(
                    "matrix has {} values, expected {}",
                    values.len(),
                    MATRIX_FLOAT_COUNT
                ))
            })?;
            Ok(FileNode::transform_matrix(values))
        }
        NodeDesc::Mesh(mesh) => Ok(convert_mesh(mesh)),
        NodeDesc::Other { template, name, children } => Ok(FileNode {
            name,
            data: NodeData::Other { template },
            children: convert_children(children)?,
        }),
    }
}

fn convert_children(children: Vec<NodeDesc>) -> SceneResult<Vec<FileNode>> {
    children.into_iter().map(convert_node).collect()
}

fn convert_mesh(mesh: MeshDesc) -> FileNode {
    let adjacency = match mesh.adjacency {
        Some(adjacency) => Some(adjacency),
        None if mesh.generate_adjacency => Some(generate_adjacency(&mesh.indices)),
        None => None,
    };

    let payload = MeshPayload {
        positions: mesh.positions,
        normals: mesh.normals,
        tex_coords: mesh.tex_coords,
        indices: mesh.indices,
        face_materials: mesh.face_materials,
        materials: mesh
            .materials
            .into_iter()
            .map(|entry| MaterialDesc {
                material: entry.material,
                texture_filename: entry.texture,
            })
            .collect(),
        adjacency,
    };
    FileNode::mesh(mesh.name, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatReader, NodeKind};

    const NESTED_SCENE: &str = r#"
        Scene(nodes: [
            Frame(name: "ship", children: [
                Matrix([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 1.0]),
                Mesh((
                    name: "hull",
                    positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (1.0, 1.0, 0.0)],
                    indices: [0, 1, 2, 2, 1, 3],
                    face_materials: [0, 1],
                    materials: [
                        (material: (diffuse: (1.0, 1.0, 1.0, 1.0))),
                        (material: (diffuse: (0.2, 0.4, 1.0, 0.5)), texture: Some("glass.png")),
                    ],
                    generate_adjacency: true,
                )),
                Frame(name: "turret"),
            ]),
            Other(template: "AnimationSet"),
        ])
    "#;

    #[test]
    fn test_parse_nested_scene() {
        let mut reader = parse_str(NESTED_SCENE, &AssetSearchConfig::default()).unwrap();
        assert_eq!(reader.remaining(), 2);

        let ship = reader.next_node().unwrap().unwrap();
        assert_eq!(ship.name, "ship");
        let kinds: Vec<NodeKind> = ship.children.iter().map(FileNode::kind).collect();
        assert_eq!(kinds, vec![NodeKind::TransformMatrix, NodeKind::Mesh, NodeKind::Frame]);

        let NodeData::Mesh(payload) = &ship.children[1].data else {
            panic!("expected a mesh node");
        };
        assert_eq!(payload.face_count(), 2);
        assert_eq!(payload.materials[1].texture_filename.as_deref(), Some("glass.png"));
        assert!(payload.materials[1].material.is_translucent());
        // Faces share the edge (1, 2)
        assert_eq!(payload.adjacency.as_ref().unwrap()[1], 1);

        let other = reader.next_node().unwrap().unwrap();
        assert_eq!(other.kind(), NodeKind::Other);
        assert!(reader.next_node().unwrap().is_none());
    }

    #[test]
    fn test_short_matrix_is_corrupt() {
        let result = parse_str("Scene(nodes: [Matrix([1.0, 0.0])])", &AssetSearchConfig::default());
        assert!(matches!(result, Err(SceneError::FormatCorrupt(message)) if message.contains("2 values")));
    }

    #[test]
    fn test_malformed_ron_is_corrupt() {
        let result = parse_str("Scene(nodes: [Frame(name: ", &AssetSearchConfig::default());
        assert!(matches!(result, Err(SceneError::FormatCorrupt(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_file("definitely/not/here.ron", &AssetSearchConfig::default());
        assert!(matches!(result, Err(SceneError::Io(_))));
    }

    fn nested_frames(depth: usize) -> String {
        let mut source = String::from("Scene(nodes: [");
        for level in 0..depth {
            source.push_str(&format!("Frame(name: \"f{}\", children: [", level));
        }
        source.push_str(concat!(
            "Matrix([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]),",
            "Mesh((name: \"leaf\", positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)], ",
            "indices: [0, 1, 2], materials: [(material: (diffuse: (1.0, 1.0, 1.0, 1.0)))])),",
        ));
        for _ in 0..depth {
            source.push_str("]),");
        }
        source.push_str("])");
        source
    }

    fn frame_depth(node: &FileNode) -> usize {
        let below = node
            .children
            .iter()
            .filter(|child| child.kind() == NodeKind::Frame)
            .map(frame_depth)
            .max()
            .unwrap_or(0);
        1 + below
    }

    #[test]
    fn test_parses_scene_at_configured_depth() {
        let config = AssetSearchConfig {
            max_nesting_depth: 40,
            ..Default::default()
        };
        let mut reader = parse_str(&nested_frames(40), &config).unwrap();
        let top = reader.next_node().unwrap().unwrap();
        assert_eq!(frame_depth(&top), 40);
    }

    #[test]
    fn test_far_too_deep_scene_is_corrupt() {
        let config = AssetSearchConfig {
            max_nesting_depth: 2,
            ..Default::default()
        };
        let result = parse_str(&nested_frames(30), &config);
        assert!(matches!(result, Err(SceneError::FormatCorrupt(message)) if message.contains("recursion")));
    }
}
