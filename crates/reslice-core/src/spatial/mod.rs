//! Spatial types: the mutable three-vector and the homogeneous affine matrix.
//!
//! Both are built on nalgebra; every coordinate conversion and resampling
//! step in the crate goes through these two types.

pub mod affine;
pub mod vector;

pub use affine::{combine_affine_matrices, AffineMatrix, Axis, MatrixType};
pub use vector::Vector3;
