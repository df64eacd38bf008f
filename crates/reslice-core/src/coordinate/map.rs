//! Voxel-index ↔ physical-space conversion.
//!
//! Every map compiles to one [`AffineMatrix`] and shares the same
//! [`CoordinateMap::to_space`] / [`CoordinateMap::from_space`]. The kinds
//! differ only in how that matrix is built.

use serde::{Deserialize, Serialize};

use super::linear::LinearCoordinateMap;
use super::nifti::{NiftiQForm, NiftiSForm};
use crate::error::Result;
use crate::spatial::{AffineMatrix, Vector3};

/// How the translation column relates to a resolution vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftUnits {
    /// The shift is in pixels and is scaled by the resolutions.
    #[default]
    Pixels,
    /// The shift is already physical.
    Physical,
}

/// Parameters a map was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateMapKind {
    Identity,
    Affine(AffineMatrix),
    Linear(LinearCoordinateMap),
    NiftiQForm(NiftiQForm),
    NiftiSForm(NiftiSForm),
}

impl CoordinateMapKind {
    fn matrix(&self) -> AffineMatrix {
        match self {
            CoordinateMapKind::Identity => AffineMatrix::identity(),
            CoordinateMapKind::Affine(matrix) => matrix.clone(),
            CoordinateMapKind::Linear(linear) => linear.matrix(),
            CoordinateMapKind::NiftiQForm(q) => q.matrix(),
            CoordinateMapKind::NiftiSForm(s) => s.matrix(),
        }
    }
}

/// A coordinate map: its parameters, the compiled matrix and shift units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MapRecord", into = "MapRecord")]
pub struct CoordinateMap {
    kind: CoordinateMapKind,
    matrix: AffineMatrix,
    shift_units: ShiftUnits,
}

/// Serialized form: only the construction parameters.
#[derive(Serialize, Deserialize)]
struct MapRecord {
    kind: CoordinateMapKind,
    shift_units: ShiftUnits,
}

impl From<MapRecord> for CoordinateMap {
    fn from(record: MapRecord) -> Self {
        Self::new(record.kind, record.shift_units)
    }
}

impl From<CoordinateMap> for MapRecord {
    fn from(map: CoordinateMap) -> Self {
        Self {
            kind: map.kind,
            shift_units: map.shift_units,
        }
    }
}

impl Default for CoordinateMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl CoordinateMap {
    pub fn new(kind: CoordinateMapKind, shift_units: ShiftUnits) -> Self {
        let matrix = kind.matrix();
        Self {
            kind,
            matrix,
            shift_units,
        }
    }

    pub fn identity() -> Self {
        Self::new(CoordinateMapKind::Identity, ShiftUnits::default())
    }

    pub fn affine(matrix: AffineMatrix, shift_units: ShiftUnits) -> Self {
        Self::new(CoordinateMapKind::Affine(matrix), shift_units)
    }

    /// Shift units follow the origin units.
    pub fn linear(linear: LinearCoordinateMap) -> Self {
        let shift_units = linear.shift_units();
        Self::new(CoordinateMapKind::Linear(linear), shift_units)
    }

    pub fn nifti_qform(qform: NiftiQForm) -> Self {
        Self::new(CoordinateMapKind::NiftiQForm(qform), ShiftUnits::Physical)
    }

    pub fn nifti_sform(sform: NiftiSForm) -> Self {
        Self::new(CoordinateMapKind::NiftiSForm(sform), ShiftUnits::Physical)
    }

    pub fn with_shift_units(mut self, shift_units: ShiftUnits) -> Self {
        self.shift_units = shift_units;
        self
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            CoordinateMapKind::Identity => "identity",
            CoordinateMapKind::Affine(_) => "affine",
            CoordinateMapKind::Linear(_) => "linear",
            CoordinateMapKind::NiftiQForm(_) => "nifti_qform",
            CoordinateMapKind::NiftiSForm(_) => "nifti_sform",
        }
    }

    pub fn kind(&self) -> &CoordinateMapKind {
        &self.kind
    }

    pub fn matrix(&self) -> &AffineMatrix {
        &self.matrix
    }

    pub fn shift_units(&self) -> ShiftUnits {
        self.shift_units
    }

    pub fn has_inverse(&self) -> bool {
        self.matrix.has_inverse()
    }

    /// The translation column, scaled by `resolutions` for pixel shifts.
    fn shift(&self, resolutions: Option<&Vector3>) -> Vector3 {
        let mut shift = self.matrix.translation();
        if let (ShiftUnits::Pixels, Some(res)) = (self.shift_units, resolutions) {
            shift.multiply_each(res);
        }
        shift
    }

    /// Map a location into space.
    ///
    /// With `resolutions`, `location` is in voxel indices and is first
    /// multiplied by them; without, it is used as is.
    pub fn to_space(&self, location: &Vector3, resolutions: Option<&Vector3>) -> Vector3 {
        let mut p = *location;
        if let Some(res) = resolutions {
            p.multiply_each(res);
        }
        let mut out = self.matrix.product_vector(&p);
        out.add_in_place(&self.shift(resolutions));
        out
    }

    /// Inverse of [`to_space`](Self::to_space).
    ///
    /// A singular map returns `location` unchanged.
    pub fn from_space(&self, location: &Vector3, resolutions: Option<&Vector3>) -> Vector3 {
        let shifted = *location - self.shift(resolutions);
        match self.matrix.inverse_product_vector(&shifted) {
            Some(mut p) => {
                if let Some(res) = resolutions {
                    p.divide_each(res);
                }
                p
            }
            None => {
                tracing::debug!(map = self.name(), "singular coordinate map, location left unchanged");
                *location
            }
        }
    }

    /// Textual reconstruction of the construction parameters.
    pub fn to_script(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_script(script: &str) -> Result<Self> {
        Ok(serde_json::from_str(script)?)
    }
}
