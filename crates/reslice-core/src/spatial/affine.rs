//! 4×4 homogeneous affine matrix.
//!
//! The bottom row is always `[0, 0, 0, 1]`, so the matrix is fully described
//! by its upper 3×4 block: a 3×3 linear part `R` and a translation `t`.
//! The inverse is computed once at construction with the cofactor method:
//!
//! ```text
//! R⁻¹ = adj(R) / det(R)        t⁻¹ = −R⁻¹ · t
//! ```
//!
//! Matrices whose linear part has `|det| <= 1e-16` have no inverse; the
//! inverse queries return `None` for them.

use super::Vector3;
use nalgebra::{Matrix3, Matrix4};
use serde::{Deserialize, Serialize};

/// Determinant magnitude at or below which a matrix is treated as singular.
pub const SINGULAR_DETERMINANT: f64 = 1e-16;

/// How a matrix was built. Kept for introspection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixType {
    Identity,
    Scale,
    Translation,
    Rotation,
    Composite,
}

/// Principal axis for [`AffineMatrix::build_axis_rotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Immutable affine transform with a precomputed inverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "AffineRecord", into = "AffineRecord")]
pub struct AffineMatrix {
    matrix: Matrix4<f64>,
    inverse: Option<Matrix4<f64>>,
    matrix_type: MatrixType,
}

/// Serialized form: the type tag and the top three rows.
#[derive(Serialize, Deserialize)]
struct AffineRecord {
    matrix_type: MatrixType,
    rows: [[f64; 4]; 3],
}

impl From<AffineRecord> for AffineMatrix {
    fn from(record: AffineRecord) -> Self {
        Self::from_rows(record.rows, record.matrix_type)
    }
}

impl From<AffineMatrix> for AffineRecord {
    fn from(matrix: AffineMatrix) -> Self {
        Self {
            matrix_type: matrix.matrix_type,
            rows: matrix.rows(),
        }
    }
}

impl AffineMatrix {
    /// Build from the upper 3×4 block given row by row.
    pub fn from_rows(rows: [[f64; 4]; 3], matrix_type: MatrixType) -> Self {
        let mut matrix = Matrix4::identity();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                matrix[(r, c)] = *value;
            }
        }
        Self::from_matrix(matrix, matrix_type)
    }

    /// Build from up to twelve row-major values of the upper 3×4 block.
    ///
    /// Entries not supplied keep their identity value.
    pub fn from_values(values: &[f64]) -> Self {
        let mut matrix = Matrix4::identity();
        for (i, value) in values.iter().take(12).enumerate() {
            matrix[(i / 4, i % 4)] = *value;
        }
        Self::from_matrix(matrix, MatrixType::Composite)
    }

    /// Build from a linear part and a translation.
    pub fn from_parts(linear: Matrix3<f64>, translation: Vector3, matrix_type: MatrixType) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&linear);
        for r in 0..3 {
            matrix[(r, 3)] = translation[r];
        }
        Self::from_matrix(matrix, matrix_type)
    }

    fn from_matrix(mut matrix: Matrix4<f64>, matrix_type: MatrixType) -> Self {
        // Enforce the homogeneous bottom row whatever the caller handed in.
        matrix[(3, 0)] = 0.0;
        matrix[(3, 1)] = 0.0;
        matrix[(3, 2)] = 0.0;
        matrix[(3, 3)] = 1.0;
        let inverse = invert_affine(&matrix);
        Self {
            matrix,
            inverse,
            matrix_type,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::from_matrix(Matrix4::identity(), MatrixType::Identity)
    }

    /// Per-axis scaling.
    pub fn build_scale(sx: f64, sy: f64, sz: f64) -> Self {
        let linear = Matrix3::from_diagonal(&nalgebra::Vector3::new(sx, sy, sz));
        Self::from_parts(linear, Vector3::zeros(), MatrixType::Scale)
    }

    /// Pure translation.
    pub fn build_translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self::from_parts(Matrix3::identity(), Vector3::new(tx, ty, tz), MatrixType::Translation)
    }

    /// Rotation of `angle` radians about an arbitrary axis (Rodrigues).
    ///
    /// `R = cos θ · I + sin θ · [k]× + (1 − cos θ) · k kᵀ` with `k` the
    /// normalised axis. A zero-length axis yields the identity.
    pub fn build_rotation(axis: &Vector3, angle: f64) -> Self {
        let length = axis.norm();
        if length == 0.0 {
            return Self::identity();
        }
        let k = axis.0 / length;
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let linear = Matrix3::new(
            c + k.x * k.x * t,
            k.x * k.y * t - k.z * s,
            k.x * k.z * t + k.y * s,
            k.y * k.x * t + k.z * s,
            c + k.y * k.y * t,
            k.y * k.z * t - k.x * s,
            k.z * k.x * t - k.y * s,
            k.z * k.y * t + k.x * s,
            c + k.z * k.z * t,
        );
        Self::from_parts(linear, Vector3::zeros(), MatrixType::Rotation)
    }

    /// Right-handed rotation of `angle` radians about one principal axis.
    pub fn build_axis_rotation(axis: Axis, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let linear = match axis {
            Axis::X => Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
            Axis::Y => Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
            Axis::Z => Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
        };
        Self::from_parts(linear, Vector3::zeros(), MatrixType::Rotation)
    }

    /// `self · other`: applies `other` first, then `self`.
    pub fn multiply(&self, other: &AffineMatrix) -> AffineMatrix {
        Self::from_matrix(self.matrix * other.matrix, MatrixType::Composite)
    }

    pub fn matrix_type(&self) -> MatrixType {
        self.matrix_type
    }

    /// Element at `(row, col)`; rows 0..4, cols 0..4.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    /// The upper 3×4 block, row by row.
    pub fn rows(&self) -> [[f64; 4]; 3] {
        let mut rows = [[0.0; 4]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.matrix[(r, c)];
            }
        }
        rows
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// The 3×3 linear part.
    pub fn linear(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    pub fn translation(&self) -> Vector3 {
        Vector3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        determinant3(&self.linear())
    }

    pub fn has_inverse(&self) -> bool {
        self.inverse.is_some()
    }

    /// The inverse transform, if the linear part is not singular.
    pub fn inverse(&self) -> Option<AffineMatrix> {
        self.inverse.map(|inv| AffineMatrix {
            matrix: inv,
            inverse: Some(self.matrix),
            matrix_type: self.matrix_type,
        })
    }

    /// Transform a point (`R · p + t`).
    pub fn product(&self, point: &Vector3) -> Vector3 {
        Vector3(apply_point(&self.matrix, &point.0))
    }

    /// Transform a displacement (`R · v`, translation ignored).
    pub fn product_vector(&self, vector: &Vector3) -> Vector3 {
        Vector3(self.linear() * vector.0)
    }

    /// Inverse-transform a point; `None` when the matrix is singular.
    pub fn inverse_product(&self, point: &Vector3) -> Option<Vector3> {
        self.inverse.as_ref().map(|inv| Vector3(apply_point(inv, &point.0)))
    }

    /// Inverse-transform a displacement; `None` when the matrix is singular.
    pub fn inverse_product_vector(&self, vector: &Vector3) -> Option<Vector3> {
        self.inverse
            .as_ref()
            .map(|inv| Vector3(inv.fixed_view::<3, 3>(0, 0) * vector.0))
    }

    /// Check closeness of all sixteen entries.
    pub fn approx_eq(&self, other: &AffineMatrix, tolerance: f64) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for AffineMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.matrix == other.matrix
    }
}

impl std::fmt::Display for AffineMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            writeln!(f, "[{:>12.6} {:>12.6} {:>12.6} {:>12.6}]", row[0], row[1], row[2], row[3])?;
        }
        write!(f, "[{:>12.6} {:>12.6} {:>12.6} {:>12.6}]", 0.0, 0.0, 0.0, 1.0)
    }
}

/// Compose matrices in application order.
///
/// The result is `Mₙ · … · M₂ · M₁`: `matrices[0]` is applied first. An
/// empty slice yields the identity and a single matrix is returned as is.
pub fn combine_affine_matrices(matrices: &[AffineMatrix]) -> AffineMatrix {
    match matrices {
        [] => AffineMatrix::identity(),
        [single] => single.clone(),
        [first, rest @ ..] => {
            let product = rest
                .iter()
                .fold(first.matrix, |acc, next| next.matrix * acc);
            AffineMatrix::from_matrix(product, MatrixType::Composite)
        }
    }
}

fn apply_point(matrix: &Matrix4<f64>, p: &nalgebra::Vector3<f64>) -> nalgebra::Vector3<f64> {
    let linear = matrix.fixed_view::<3, 3>(0, 0);
    let t = nalgebra::Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    linear * p + t
}

fn determinant3(m: &Matrix3<f64>) -> f64 {
    m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
}

/// Invert via the adjugate of the 3×3 block.
fn invert_affine(matrix: &Matrix4<f64>) -> Option<Matrix4<f64>> {
    let m: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let det = determinant3(&m);
    if !(det.is_finite() && det.abs() > SINGULAR_DETERMINANT) {
        return None;
    }

    let cofactor = |r: usize, c: usize| -> f64 {
        let rows: Vec<usize> = (0..3).filter(|&i| i != r).collect();
        let cols: Vec<usize> = (0..3).filter(|&j| j != c).collect();
        let minor = m[(rows[0], cols[0])] * m[(rows[1], cols[1])]
            - m[(rows[0], cols[1])] * m[(rows[1], cols[0])];
        if (r + c) % 2 == 0 {
            minor
        } else {
            -minor
        }
    };

    // adj(m)[i][j] = cofactor(j, i)
    let mut inv_linear = Matrix3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            inv_linear[(i, j)] = cofactor(j, i) / det;
        }
    }

    let t = nalgebra::Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
    let inv_t = -(inv_linear * t);

    let mut inverse = Matrix4::identity();
    inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&inv_linear);
    for r in 0..3 {
        inverse[(r, 3)] = inv_t[r];
    }
    Some(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_product() {
        let m = AffineMatrix::identity();
        let p = Vector3::new(10.0, 20.0, 30.0);
        assert_eq!(m.product(&p), p);
        assert_eq!(m.matrix_type(), MatrixType::Identity);
    }

    #[test]
    fn test_translation_round_trip() {
        let m = AffineMatrix::build_translation(1.0, 2.0, 3.0);
        let moved = m.product(&Vector3::zeros());
        assert_eq!(moved, Vector3::new(1.0, 2.0, 3.0));
        let back = m.inverse_product(&moved).unwrap();
        assert!(back.approx_eq(&Vector3::zeros(), 1e-12));
    }

    #[test]
    fn test_from_values_fills_identity() {
        let m = AffineMatrix::from_values(&[2.0, 0.0, 0.0, 5.0]);
        assert_eq!(m.get(0, 0), 2.0);
        assert_eq!(m.get(0, 3), 5.0);
        assert_eq!(m.get(1, 1), 1.0);
        assert_eq!(m.get(2, 2), 1.0);
        assert_eq!(m.get(3, 3), 1.0);
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = AffineMatrix::build_scale(1.0, 0.0, 1.0);
        assert!(!m.has_inverse());
        assert!(m.inverse_product(&Vector3::zeros()).is_none());
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_non_finite_matrix_has_no_inverse() {
        assert!(!AffineMatrix::from_values(&[f64::NAN]).has_inverse());
        assert!(!AffineMatrix::build_scale(f64::INFINITY, 1.0, 1.0).has_inverse());
    }

    #[test]
    fn test_axis_rotation_sign_convention() {
        let rz = AffineMatrix::build_axis_rotation(Axis::Z, FRAC_PI_2);
        let p = rz.product(&Vector3::new(1.0, 0.0, 0.0));
        assert!(p.approx_eq(&Vector3::new(0.0, 1.0, 0.0), 1e-12));

        let rx = AffineMatrix::build_axis_rotation(Axis::X, FRAC_PI_2);
        let p = rx.product(&Vector3::new(0.0, 1.0, 0.0));
        assert!(p.approx_eq(&Vector3::new(0.0, 0.0, 1.0), 1e-12));

        let ry = AffineMatrix::build_axis_rotation(Axis::Y, FRAC_PI_2);
        let p = ry.product(&Vector3::new(0.0, 0.0, 1.0));
        assert!(p.approx_eq(&Vector3::new(1.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_rodrigues_matches_axis_rotation() {
        let axis = Vector3::new(0.0, 0.0, 5.0);
        let a = AffineMatrix::build_rotation(&axis, 0.7);
        let b = AffineMatrix::build_axis_rotation(Axis::Z, 0.7);
        assert!(a.approx_eq(&b, 1e-12));
    }

    #[test]
    fn test_rodrigues_zero_axis_is_identity() {
        let m = AffineMatrix::build_rotation(&Vector3::zeros(), 1.0);
        assert_eq!(m, AffineMatrix::identity());
    }

    #[test]
    fn test_combine_applies_first_matrix_first() {
        let scale = AffineMatrix::build_scale(2.0, 2.0, 2.0);
        let shift = AffineMatrix::build_translation(1.0, 0.0, 0.0);
        let combined = combine_affine_matrices(&[scale, shift]);
        let p = combined.product(&Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vector3::new(3.0, 2.0, 2.0));
        assert_eq!(combined.matrix_type(), MatrixType::Composite);
    }

    #[test]
    fn test_combine_empty_is_identity() {
        assert_eq!(combine_affine_matrices(&[]), AffineMatrix::identity());
    }

    #[test]
    fn test_inverse_of_general_matrix() {
        let m = AffineMatrix::from_values(&[
            2.0, 1.0, 0.0, 3.0, //
            0.0, 1.0, 4.0, -1.0, //
            1.0, 0.0, 1.0, 2.0,
        ]);
        let inv = m.inverse().unwrap();
        let product = m.multiply(&inv);
        assert!(product.approx_eq(&AffineMatrix::identity(), 1e-12));
    }

    #[test]
    fn test_serde_recomputes_inverse() {
        let m = AffineMatrix::build_scale(2.0, 4.0, 8.0);
        let json = serde_json::to_string(&m).unwrap();
        let back: AffineMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert!(back.has_inverse());
        assert_eq!(back.matrix_type(), MatrixType::Scale);
    }
}
