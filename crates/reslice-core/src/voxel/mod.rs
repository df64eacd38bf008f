//! Voxel storage types, value scaling and the typed copy routine.

pub mod array;
pub mod element;
pub mod scale;
pub mod types;

pub use array::{copy_voxels, VoxelArray};
pub use element::Voxel;
pub use scale::{Threshold, ValueScale};
pub use types::VoxelType;
