//! NIfTI-1 header conventions for voxel-to-world matrices.
//!
//! The quaternion form stores a rotation as `(b, c, d)` with
//! `a = √(1 − b² − c² − d²)`, per-axis pixel sizes, a `qfac` sign for the
//! third axis and an offset. The row form stores the top three rows of the
//! matrix directly.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::spatial::{AffineMatrix, MatrixType, Vector3};

/// `a²` below which the quaternion is treated as a 180° rotation.
const DEGENERATE_QUATERNION: f64 = 1e-7;

/// `qform` parameters of a NIfTI header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NiftiQForm {
    pub quaternion: [f64; 3],
    pub qfac: f64,
    pub pixdims: [f64; 3],
    pub qoffsets: [f64; 3],
}

impl NiftiQForm {
    pub fn new(quaternion: [f64; 3], qfac: f64, pixdims: [f64; 3], qoffsets: [f64; 3]) -> Self {
        Self {
            quaternion,
            qfac,
            pixdims,
            qoffsets,
        }
    }

    pub fn matrix(&self) -> AffineMatrix {
        let [mut b, mut c, mut d] = self.quaternion;
        let mut a = 1.0 - (b * b + c * c + d * d);
        if a < DEGENERATE_QUATERNION {
            let norm = (b * b + c * c + d * d).sqrt();
            if norm > 0.0 {
                b /= norm;
                c /= norm;
                d /= norm;
            }
            a = 0.0;
        } else {
            a = a.sqrt();
        }

        let positive = |v: f64| if v > 0.0 { v } else { 1.0 };
        let xd = positive(self.pixdims[0]);
        let yd = positive(self.pixdims[1]);
        let mut zd = positive(self.pixdims[2]);
        if self.qfac < 0.0 {
            zd = -zd;
        }

        let linear = Matrix3::new(
            (a * a + b * b - c * c - d * d) * xd,
            2.0 * (b * c - a * d) * yd,
            2.0 * (b * d + a * c) * zd,
            2.0 * (b * c + a * d) * xd,
            (a * a + c * c - b * b - d * d) * yd,
            2.0 * (c * d - a * b) * zd,
            2.0 * (b * d - a * c) * xd,
            2.0 * (c * d + a * b) * yd,
            (a * a + d * d - c * c - b * b) * zd,
        );
        AffineMatrix::from_parts(linear, Vector3::from(self.qoffsets), MatrixType::Composite)
    }
}

/// `sform` parameters of a NIfTI header.
///
/// The stored rows already include voxel size; dividing column `j` by
/// `resolutions[j]` leaves a map that expects physical input coordinates.
/// The translation column is multiplied by `unit_factor` (e.g. 1000 for a
/// header in metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NiftiSForm {
    pub srow_x: [f64; 4],
    pub srow_y: [f64; 4],
    pub srow_z: [f64; 4],
    pub resolutions: [f64; 3],
    pub unit_factor: f64,
}

impl NiftiSForm {
    pub fn new(
        srow_x: [f64; 4],
        srow_y: [f64; 4],
        srow_z: [f64; 4],
        resolutions: [f64; 3],
        unit_factor: f64,
    ) -> Self {
        Self {
            srow_x,
            srow_y,
            srow_z,
            resolutions,
            unit_factor,
        }
    }

    pub fn matrix(&self) -> AffineMatrix {
        let mut rows = [self.srow_x, self.srow_y, self.srow_z];
        for row in rows.iter_mut() {
            for (j, value) in row.iter_mut().take(3).enumerate() {
                let res = self.resolutions[j];
                if res != 0.0 {
                    *value /= res;
                }
            }
            row[3] *= self.unit_factor;
        }
        AffineMatrix::from_rows(rows, MatrixType::Composite)
    }
}
