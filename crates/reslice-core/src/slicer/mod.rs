//! Slice extraction from 3-D and 4-D volumes.
//!
//! [`PrimaryOrthoDataSlicer`] permutes axes only; [`AffineDataSlicer`]
//! reslices through an arbitrary affine transform with nearest-neighbour
//! sampling.

pub mod affine;
pub mod ortho;
pub mod trait_;

pub use affine::{calc_min_bounding_dimensions, AffineDataSlicer, BoundingBox};
pub use ortho::PrimaryOrthoDataSlicer;
pub use trait_::DataSlicer;
