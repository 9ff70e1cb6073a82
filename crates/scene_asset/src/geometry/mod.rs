//! Host-resident mesh geometry
//!
//! [`MeshGeometry`] is the system-memory copy of a mesh: an interleaved vertex
//! list, a triangle index buffer and one subset id per face. It persists across
//! device resets and is the source every device-resident copy is cloned from.
//!
//! The operations a D3D-style mesh API would run on the device (optimize in
//! place, clone into another vertex layout, recompute normals) all run here on
//! the host, so a backend only needs to upload finished buffers.

mod optimize;

pub use optimize::{generate_adjacency, NO_NEIGHBOR};

use bitflags::bitflags;
use thiserror::Error;

use crate::format::MeshPayload;
use crate::foundation::math::Vec3;

bitflags! {
    /// Vertex attributes present in a vertex layout
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexFormat: u32 {
        /// Object-space position, three floats
        const POSITION = 1 << 0;
        /// Vertex normal, three floats
        const NORMAL = 1 << 1;
        /// Diffuse color, four floats
        const DIFFUSE = 1 << 2;
        /// One set of texture coordinates, two floats
        const TEX0 = 1 << 3;
    }
}

impl VertexFormat {
    /// Number of floats one packed vertex occupies
    pub fn float_count(self) -> usize {
        let mut count = 0;
        if self.contains(Self::POSITION) {
            count += 3;
        }
        if self.contains(Self::NORMAL) {
            count += 3;
        }
        if self.contains(Self::DIFFUSE) {
            count += 4;
        }
        if self.contains(Self::TEX0) {
            count += 2;
        }
        count
    }

    /// Size of one packed vertex in bytes
    pub fn stride(self) -> usize {
        self.float_count() * std::mem::size_of::<f32>()
    }
}

/// Geometry failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Optimization needs face adjacency and none was supplied
    #[error("Face adjacency is required for optimization")]
    MissingAdjacency,

    /// Adjacency length does not match three entries per face
    #[error("Adjacency has {actual} entries, expected {expected}")]
    AdjacencyLength {
        /// Entries supplied
        actual: usize,
        /// Three per face
        expected: usize,
    },

    /// Adjacency names a face that does not exist
    #[error("Adjacency entry {entry} references face {face} of {face_count}")]
    AdjacencyIndex {
        /// Position in the adjacency buffer
        entry: usize,
        /// Referenced face
        face: u32,
        /// Number of faces in the mesh
        face_count: usize,
    },

    /// Index buffer length is not a multiple of three
    #[error("Index count {0} is not a multiple of three")]
    IndexCount(usize),

    /// Index references a vertex that does not exist
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index value
        index: u32,
        /// Number of vertices
        vertex_count: usize,
    },

    /// A per-vertex attribute array has the wrong length
    #[error("Attribute '{attribute}' has {actual} entries for {expected} vertices")]
    AttributeCount {
        /// Attribute name
        attribute: &'static str,
        /// Entries supplied
        actual: usize,
        /// Vertex count
        expected: usize,
    },

    /// Face-material list length differs from the face count
    #[error("{actual} face materials for {expected} faces")]
    FaceMaterialCount {
        /// Entries supplied
        actual: usize,
        /// Face count
        expected: usize,
    },

    /// A face references a material that does not exist
    #[error("Face {face} uses material {material} of {material_count}")]
    MaterialIndex {
        /// Offending face
        face: usize,
        /// Referenced material
        material: u32,
        /// Number of materials
        material_count: usize,
    },

    /// The mesh has no positions, or a clone would drop them
    #[error("Geometry has no vertex positions")]
    MissingPositions,
}

/// Single vertex with every attribute a layout may carry
///
/// Attributes outside the owning geometry's [`VertexFormat`] are ignored when
/// packing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Vertex normal
    pub normal: [f32; 3],
    /// Diffuse color, RGBA
    pub diffuse: [f32; 4],
    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            diffuse: [1.0; 4],
            tex_coord: [0.0; 2],
        }
    }
}

/// Face and vertex range of one subset, produced by optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetRange {
    /// Subset id
    pub subset: u32,
    /// First face of the subset
    pub face_start: usize,
    /// Number of faces
    pub face_count: usize,
    /// Lowest vertex referenced by the subset
    pub vertex_start: usize,
    /// Number of vertices spanned, from `vertex_start`
    pub vertex_count: usize,
}

/// System-memory mesh geometry
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    format: VertexFormat,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    face_subsets: Vec<u32>,
    attribute_table: Vec<SubsetRange>,
    subset_count: usize,
}

impl MeshGeometry {
    /// Build geometry from a scene-file payload
    ///
    /// `subset_count` is the number of materials the mesh carries. Every face
    /// must reference one of them; an empty face-material list assigns every
    /// face to subset 0.
    pub fn from_payload(payload: &MeshPayload, subset_count: usize) -> Result<Self, GeometryError> {
        let vertex_count = payload.positions.len();
        if vertex_count == 0 {
            return Err(GeometryError::MissingPositions);
        }
        if payload.indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCount(payload.indices.len()));
        }
        if let Some(&index) = payload.indices.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange { index, vertex_count });
        }

        let mut format = VertexFormat::POSITION;
        if let Some(normals) = &payload.normals {
            check_attribute("normals", normals.len(), vertex_count)?;
            format |= VertexFormat::NORMAL;
        }
        if let Some(tex_coords) = &payload.tex_coords {
            check_attribute("tex_coords", tex_coords.len(), vertex_count)?;
            format |= VertexFormat::TEX0;
        }

        let face_count = payload.face_count();
        let face_subsets = if payload.face_materials.is_empty() {
            vec![0; face_count]
        } else {
            if payload.face_materials.len() != face_count {
                return Err(GeometryError::FaceMaterialCount {
                    actual: payload.face_materials.len(),
                    expected: face_count,
                });
            }
            payload.face_materials.clone()
        };
        let subset_count = subset_count.max(1);
        if let Some((face, &material)) = face_subsets
            .iter()
            .enumerate()
            .find(|(_, &material)| material as usize >= subset_count)
        {
            return Err(GeometryError::MaterialIndex {
                face,
                material,
                material_count: subset_count,
            });
        }

        let vertices = (0..vertex_count)
            .map(|i| Vertex {
                position: payload.positions[i],
                normal: payload.normals.as_ref().map_or([0.0; 3], |normals| normals[i]),
                tex_coord: payload.tex_coords.as_ref().map_or([0.0; 2], |coords| coords[i]),
                ..Default::default()
            })
            .collect();

        Ok(Self {
            format,
            vertices,
            indices: payload.indices.clone(),
            face_subsets,
            attribute_table: Vec::new(),
            subset_count,
        })
    }

    /// Vertex layout
    pub fn format(&self) -> VertexFormat {
        self.format
    }

    /// Vertices in buffer order
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle list indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Subset id of each face
    pub fn face_subsets(&self) -> &[u32] {
        &self.face_subsets
    }

    /// Per-subset ranges; empty until the geometry has been optimized
    pub fn attribute_table(&self) -> &[SubsetRange] {
        &self.attribute_table
    }

    /// Number of subsets
    pub fn subset_count(&self) -> usize {
        self.subset_count
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Copy this geometry into another vertex layout
    ///
    /// Attributes that the new layout adds start out zeroed, except diffuse
    /// which starts white. Normals are not recomputed here; call
    /// [`compute_normals`](Self::compute_normals) on the clone.
    pub fn clone_with_format(&self, format: VertexFormat) -> Result<Self, GeometryError> {
        if !format.contains(VertexFormat::POSITION) {
            return Err(GeometryError::MissingPositions);
        }

        let defaults = Vertex::default();
        let vertices = self
            .vertices
            .iter()
            .map(|vertex| Vertex {
                position: vertex.position,
                normal: self.kept(format, VertexFormat::NORMAL, vertex.normal, defaults.normal),
                diffuse: self.kept(format, VertexFormat::DIFFUSE, vertex.diffuse, defaults.diffuse),
                tex_coord: self.kept(format, VertexFormat::TEX0, vertex.tex_coord, defaults.tex_coord),
            })
            .collect();

        Ok(Self {
            format,
            vertices,
            indices: self.indices.clone(),
            face_subsets: self.face_subsets.clone(),
            attribute_table: self.attribute_table.clone(),
            subset_count: self.subset_count,
        })
    }

    fn kept<T>(&self, target: VertexFormat, flag: VertexFormat, value: T, default: T) -> T {
        if self.format.contains(flag) && target.contains(flag) {
            value
        } else {
            default
        }
    }

    /// Recompute area-weighted vertex normals from the faces
    ///
    /// Does nothing when the layout has no normals. Vertices used by no face,
    /// or only by degenerate faces, get a zero normal.
    pub fn compute_normals(&mut self) {
        if !self.format.contains(VertexFormat::NORMAL) {
            return;
        }

        let mut accumulated = vec![Vec3::zeros(); self.vertices.len()];
        for face in self.indices.chunks_exact(3) {
            let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
            let p0 = Vec3::from(self.vertices[a].position);
            let p1 = Vec3::from(self.vertices[b].position);
            let p2 = Vec3::from(self.vertices[c].position);
            // Cross product length is twice the face area
            let face_normal = (p1 - p0).cross(&(p2 - p0));
            for &vertex in &[a, b, c] {
                accumulated[vertex] += face_normal;
            }
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            let normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
            vertex.normal = [normal.x, normal.y, normal.z];
        }
    }

    /// Interleaved vertex data in layout order: position, normal, diffuse, tex0
    pub fn packed_vertices(&self) -> Vec<f32> {
        let mut packed = Vec::with_capacity(self.vertices.len() * self.format.float_count());
        for vertex in &self.vertices {
            if self.format.contains(VertexFormat::POSITION) {
                packed.extend_from_slice(&vertex.position);
            }
            if self.format.contains(VertexFormat::NORMAL) {
                packed.extend_from_slice(&vertex.normal);
            }
            if self.format.contains(VertexFormat::DIFFUSE) {
                packed.extend_from_slice(&vertex.diffuse);
            }
            if self.format.contains(VertexFormat::TEX0) {
                packed.extend_from_slice(&vertex.tex_coord);
            }
        }
        packed
    }

    /// Packed vertex data as raw bytes for buffer upload
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.packed_vertices()).to_vec()
    }

    /// Index buffer as raw bytes for buffer upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn check_attribute(attribute: &'static str, actual: usize, expected: usize) -> Result<(), GeometryError> {
    if actual == expected {
        Ok(())
    } else {
        Err(GeometryError::AttributeCount { attribute, actual, expected })
    }
}
