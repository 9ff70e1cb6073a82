//! Math utilities and types
//!
//! Provides the matrix and vector types used by frames and geometry.
//!
//! All matrices in this crate use nalgebra's column-vector convention: a point
//! is transformed as `m * p` and a child's world matrix is `parent * local`.
//! Scene files store matrices in the row-vector convention (row-major, with the
//! translation in elements 12..14). The two layouts share the same sixteen
//! floats in memory, so converting is a column-major read of the file data.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Number of floats in a scene-file matrix payload
pub const MATRIX_FLOAT_COUNT: usize = 16;

/// Convert a scene-file matrix (row-major, row-vector convention) into a [`Mat4`].
///
/// A file matrix whose last row is `(tx, ty, tz, 1)` becomes a matrix that
/// translates by `(tx, ty, tz)`.
pub fn mat4_from_file_layout(values: &[f32; MATRIX_FLOAT_COUNT]) -> Mat4 {
    Mat4::from_column_slice(values)
}

/// Convert a [`Mat4`] back into the scene-file layout.
pub fn mat4_to_file_layout(matrix: &Mat4) -> [f32; MATRIX_FLOAT_COUNT] {
    let mut values = [0.0; MATRIX_FLOAT_COUNT];
    values.copy_from_slice(matrix.as_slice());
    values
}

/// Translation component of an affine transform
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Whether every element of the matrix is finite
pub fn is_finite(matrix: &Mat4) -> bool {
    matrix.iter().all(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_file_layout_translation() {
        let mut values = [0.0; MATRIX_FLOAT_COUNT];
        values[0] = 1.0;
        values[5] = 1.0;
        values[10] = 1.0;
        values[15] = 1.0;
        values[12] = 3.0;
        values[13] = -2.0;
        values[14] = 0.5;

        let matrix = mat4_from_file_layout(&values);
        assert_relative_eq!(translation_of(&matrix), Vec3::new(3.0, -2.0, 0.5));

        let point = matrix.transform_point(&nalgebra::Point3::origin());
        assert_relative_eq!(point.coords, Vec3::new(3.0, -2.0, 0.5));

        assert_eq!(mat4_to_file_layout(&matrix), values);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut matrix = Mat4::identity();
        assert!(is_finite(&matrix));
        matrix.m23 = f32::NAN;
        assert!(!is_finite(&matrix));
    }
}
