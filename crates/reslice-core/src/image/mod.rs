//! Volume description and voxel storage.
//!
//! [`Dimensions`] describes shape, layout and physical metadata;
//! [`VoxelBuffer`] pairs it with typed data. Orientation handling lives in
//! [`orientation`].

pub mod buffer;
pub mod dimensions;
pub mod orientation;
pub mod tensor;

pub use buffer::VoxelBuffer;
pub use dimensions::{default_increments, Dimensions};
pub use orientation::{slice_axes, Orientation, OrientationOrder, SliceAxes};
