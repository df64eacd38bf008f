//! Affine coordinate mapping and volume reslicing.
//!
//! Voxel indices are mapped to and from physical space through
//! [`CoordinateMap`]s, and 2-D slices are cut from 3-D/4-D volumes by
//! [`DataSlicer`]s with nearest-neighbour sampling and type-aware value
//! scaling.

pub mod coordinate;
pub mod error;
pub mod image;
pub mod session;
pub mod slicer;
pub mod spatial;
pub mod voxel;

pub use coordinate::{CoordinateMap, LinearCoordinateMap, NiftiQForm, NiftiSForm, ShiftUnits};
pub use error::{ResliceError, Result};
pub use image::{Dimensions, Orientation, VoxelBuffer};
pub use session::{SessionConfig, ViewerSession};
pub use slicer::{AffineDataSlicer, DataSlicer, PrimaryOrthoDataSlicer};
pub use spatial::{AffineMatrix, Vector3};
pub use voxel::{ValueScale, VoxelType};
