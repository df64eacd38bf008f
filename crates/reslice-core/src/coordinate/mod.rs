//! Coordinate maps between voxel indices and physical space.

pub mod linear;
pub mod map;
pub mod nifti;

pub use linear::{LinearCoordinateMap, OriginUnits};
pub use map::{CoordinateMap, CoordinateMapKind, ShiftUnits};
pub use nifti::{NiftiQForm, NiftiSForm};
