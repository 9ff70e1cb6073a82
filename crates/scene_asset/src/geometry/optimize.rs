//! In-place mesh optimization and face adjacency

use std::collections::{HashMap, VecDeque};

use super::{GeometryError, MeshGeometry, SubsetRange};

/// Adjacency entry for an edge with no neighbouring face
pub const NO_NEIGHBOR: u32 = u32::MAX;

/// Build face adjacency from a triangle index buffer
///
/// Returns three entries per face, one per edge in the order
/// `(v0, v1)`, `(v1, v2)`, `(v2, v0)`. Two faces are neighbours when they share
/// both vertex indices of an edge. When more than two faces share an edge, each
/// face links to the first other face that uses it.
pub fn generate_adjacency(indices: &[u32]) -> Vec<u32> {
    let face_count = indices.len() / 3;
    let mut edge_faces: HashMap<(u32, u32), Vec<u32>> = HashMap::new();

    for (face, corners) in indices.chunks_exact(3).enumerate() {
        for edge in 0..3 {
            let key = edge_key(corners[edge], corners[(edge + 1) % 3]);
            edge_faces.entry(key).or_default().push(face as u32);
        }
    }

    let mut adjacency = Vec::with_capacity(face_count * 3);
    for (face, corners) in indices.chunks_exact(3).enumerate() {
        for edge in 0..3 {
            let key = edge_key(corners[edge], corners[(edge + 1) % 3]);
            let neighbor = edge_faces
                .get(&key)
                .and_then(|faces| faces.iter().copied().find(|&other| other != face as u32))
                .unwrap_or(NO_NEIGHBOR);
            adjacency.push(neighbor);
        }
    }

    adjacency
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

impl MeshGeometry {
    /// Optimize the geometry in place
    ///
    /// Faces are grouped by subset (stable), then reordered within each subset
    /// by breadth-first walks over `adjacency` so that neighbouring triangles
    /// are emitted together. Finally unreferenced vertices are dropped and the
    /// rest renumbered in first-use order, and the attribute table is rebuilt.
    pub fn optimize_in_place(&mut self, adjacency: Option<&[u32]>) -> Result<(), GeometryError> {
        let adjacency = adjacency.ok_or(GeometryError::MissingAdjacency)?;
        let face_count = self.face_count();
        validate_adjacency(adjacency, face_count)?;

        let order = self.cache_order(adjacency);
        self.apply_face_order(&order);
        self.compact_vertices();
        self.rebuild_attribute_table();

        log::debug!(
            "Optimized geometry: {} faces, {} vertices, {} subsets",
            self.face_count(),
            self.vertex_count(),
            self.subset_count
        );
        Ok(())
    }

    fn cache_order(&self, adjacency: &[u32]) -> Vec<usize> {
        let face_count = self.face_count();

        // Attribute sort; sort_by_key is stable so file order survives within a subset
        let mut by_subset: Vec<usize> = (0..face_count).collect();
        by_subset.sort_by_key(|&face| self.face_subsets[face]);

        let mut visited = vec![false; face_count];
        let mut order = Vec::with_capacity(face_count);
        let mut queue = VecDeque::new();

        for &seed in &by_subset {
            if visited[seed] {
                continue;
            }
            let subset = self.face_subsets[seed];
            visited[seed] = true;
            queue.push_back(seed);

            while let Some(face) = queue.pop_front() {
                order.push(face);
                for &neighbor in &adjacency[face * 3..face * 3 + 3] {
                    if neighbor == NO_NEIGHBOR {
                        continue;
                    }
                    let neighbor = neighbor as usize;
                    if !visited[neighbor] && self.face_subsets[neighbor] == subset {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        order
    }

    fn apply_face_order(&mut self, order: &[usize]) {
        let mut indices = Vec::with_capacity(self.indices.len());
        let mut face_subsets = Vec::with_capacity(order.len());
        for &face in order {
            indices.extend_from_slice(&self.indices[face * 3..face * 3 + 3]);
            face_subsets.push(self.face_subsets[face]);
        }
        self.indices = indices;
        self.face_subsets = face_subsets;
    }

    fn compact_vertices(&mut self) {
        let mut remap = vec![NO_NEIGHBOR; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());

        for index in &mut self.indices {
            let old = *index as usize;
            if remap[old] == NO_NEIGHBOR {
                remap[old] = vertices.len() as u32;
                vertices.push(self.vertices[old]);
            }
            *index = remap[old];
        }

        let dropped = self.vertices.len() - vertices.len();
        if dropped > 0 {
            log::debug!("Dropped {} unreferenced vertices", dropped);
        }
        self.vertices = vertices;
    }

    fn rebuild_attribute_table(&mut self) {
        let mut table = Vec::with_capacity(self.subset_count);
        let mut face = 0;

        for subset in 0..self.subset_count as u32 {
            let face_start = face;
            let mut min_vertex = usize::MAX;
            let mut max_vertex = 0;
            while face < self.face_subsets.len() && self.face_subsets[face] == subset {
                for &index in &self.indices[face * 3..face * 3 + 3] {
                    min_vertex = min_vertex.min(index as usize);
                    max_vertex = max_vertex.max(index as usize);
                }
                face += 1;
            }

            let face_count = face - face_start;
            let (vertex_start, vertex_count) = if face_count == 0 {
                (0, 0)
            } else {
                (min_vertex, max_vertex - min_vertex + 1)
            };
            table.push(SubsetRange {
                subset,
                face_start,
                face_count,
                vertex_start,
                vertex_count,
            });
        }

        self.attribute_table = table;
    }
}

fn validate_adjacency(adjacency: &[u32], face_count: usize) -> Result<(), GeometryError> {
    if adjacency.len() != face_count * 3 {
        return Err(GeometryError::AdjacencyLength {
            actual: adjacency.len(),
            expected: face_count * 3,
        });
    }
    if let Some((entry, &face)) = adjacency
        .iter()
        .enumerate()
        .find(|(_, &face)| face != NO_NEIGHBOR && face as usize >= face_count)
    {
        return Err(GeometryError::AdjacencyIndex { entry, face, face_count });
    }
    Ok(())
}
