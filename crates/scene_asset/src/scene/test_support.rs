//! Shared fixtures for scene tests

use crate::assets::MediaResolver;
use crate::foundation::math::MATRIX_FLOAT_COUNT;
use crate::format::{FileNode, MaterialDesc, MeshPayload};
use crate::geometry::generate_adjacency;
use crate::render::Material;

/// Mesh payload with one quad (two faces) per material, one material per alpha
pub(crate) fn quads(alphas: &[f32]) -> MeshPayload {
    let mut payload = MeshPayload::default();
    for (quad, &alpha) in alphas.iter().enumerate() {
        let x = quad as f32 * 2.0;
        let base = payload.positions.len() as u32;
        payload.positions.extend_from_slice(&[
            [x, 0.0, 0.0],
            [x + 1.0, 0.0, 0.0],
            [x + 1.0, 1.0, 0.0],
            [x, 1.0, 0.0],
        ]);
        payload
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        payload.face_materials.extend_from_slice(&[quad as u32, quad as u32]);
        payload.materials.push(MaterialDesc {
            material: Material::with_diffuse([1.0, 1.0, 1.0, alpha]),
            texture_filename: None,
        });
    }
    payload.adjacency = Some(generate_adjacency(&payload.indices));
    payload
}

/// Mesh node holding a single opaque quad
pub(crate) fn quad_node(name: &str) -> FileNode {
    FileNode::mesh(name, quads(&[1.0]))
}

/// Scene-file matrix translating by `(x, y, z)`
pub(crate) fn translation(x: f32, y: f32, z: f32) -> [f32; MATRIX_FLOAT_COUNT] {
    let mut values = [0.0; MATRIX_FLOAT_COUNT];
    values[0] = 1.0;
    values[5] = 1.0;
    values[10] = 1.0;
    values[15] = 1.0;
    values[12] = x;
    values[13] = y;
    values[14] = z;
    values
}

/// Resolver whose search path holds no files
pub(crate) fn empty_resolver() -> MediaResolver {
    MediaResolver::new(std::env::temp_dir().join("scene_asset_no_media").join("a").join("b"))
}
