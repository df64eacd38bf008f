//! N-axis shape with strides, storage type and physical metadata.
//!
//! A `Dimensions` is a strided view description: `index(p) = offset +
//! Σ p[i] · increments[i]`. Default increments are monotonic
//! (`increments[0] = 1`, `increments[i] = increments[i-1] · sizes[i-1]`),
//! which makes [`Dimensions::point`] a cheap integer division. Custom
//! increments (flipped or transposed layouts) fall back to an exhaustive
//! search that is bounded to at most four axes.

use serde::{Deserialize, Serialize};

use super::orientation::{self, Orientation, OrientationOrder, SliceAxes};
use crate::error::{ResliceError, Result};
use crate::spatial::Vector3;
use crate::voxel::VoxelType;

/// Largest axis count the exhaustive `point` search will attempt.
pub const MAX_SEARCH_AXES: usize = 4;

/// Shape, layout and physical description of a voxel array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    sizes: Vec<usize>,
    increments: Vec<i64>,
    default_increments: bool,
    voxel_type: VoxelType,
    offset: i64,
    resolutions: Option<Vec<f64>>,
    orientation: Orientation,
    orientation_order: OrientationOrder,
}

/// Monotonic increments for `sizes` (axis 0 fastest).
///
/// Fails when the point count does not fit an `i64` index.
pub fn default_increments(sizes: &[usize]) -> Result<Vec<i64>> {
    let mut increments = Vec::with_capacity(sizes.len());
    let mut stride = 1i64;
    for &size in sizes {
        increments.push(stride);
        stride = i64::try_from(size)
            .ok()
            .and_then(|size| stride.checked_mul(size))
            .ok_or_else(|| {
                ResliceError::invalid_dimensions(format!("{:?} voxels overflow the index range", sizes))
            })?;
    }
    Ok(increments)
}

impl Dimensions {
    /// Create dimensions with default increments and zero offset.
    pub fn new(sizes: &[usize], voxel_type: VoxelType) -> Result<Self> {
        if sizes.is_empty() {
            return Err(ResliceError::invalid_dimensions("at least one axis is required"));
        }
        if let Some(axis) = sizes.iter().position(|&s| s == 0) {
            return Err(ResliceError::invalid_dimensions(format!(
                "axis {} has zero size",
                axis
            )));
        }
        let increments = default_increments(sizes)?;
        Ok(Self::build(sizes.to_vec(), increments, voxel_type))
    }

    /// Sizes are non-empty and positive, increments are their defaults.
    fn build(sizes: Vec<usize>, increments: Vec<i64>, voxel_type: VoxelType) -> Self {
        Self {
            sizes,
            increments,
            default_increments: true,
            voxel_type,
            offset: 0,
            resolutions: None,
            orientation: Orientation::default(),
            orientation_order: OrientationOrder::default(),
        }
    }

    /// Shift every index by `offset` words.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset as i64;
        self
    }

    /// Replace the increments with a custom layout.
    ///
    /// The lowest reachable index must not fall below zero.
    pub fn with_increments(mut self, increments: &[i64]) -> Result<Self> {
        if increments.len() != self.sizes.len() {
            return Err(ResliceError::dimension_mismatch(format!(
                "{} increments for {} axes",
                increments.len(),
                self.sizes.len()
            )));
        }
        let lowest: i64 = self.offset
            + self
                .sizes
                .iter()
                .zip(increments)
                .map(|(&s, &inc)| ((s as i64 - 1) * inc).min(0))
                .sum::<i64>();
        if lowest < 0 {
            return Err(ResliceError::invalid_dimensions(format!(
                "increments reach index {} below zero",
                lowest
            )));
        }
        self.default_increments =
            default_increments(&self.sizes).is_ok_and(|defaults| defaults == increments);
        self.increments = increments.to_vec();
        Ok(self)
    }

    pub fn with_resolutions(mut self, resolutions: &[f64]) -> Result<Self> {
        self.set_resolutions(resolutions)?;
        Ok(self)
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_orientation_order(mut self, order: OrientationOrder) -> Self {
        self.orientation_order = order;
        self
    }

    pub fn with_voxel_type(mut self, voxel_type: VoxelType) -> Self {
        self.voxel_type = voxel_type;
        self
    }

    /// Set one positive, finite resolution per axis.
    pub fn set_resolutions(&mut self, resolutions: &[f64]) -> Result<()> {
        if resolutions.len() != self.sizes.len() {
            return Err(ResliceError::dimension_mismatch(format!(
                "{} resolutions for {} axes",
                resolutions.len(),
                self.sizes.len()
            )));
        }
        if let Some(bad) = resolutions.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            return Err(ResliceError::invalid_dimensions(format!(
                "resolution {} is not positive",
                bad
            )));
        }
        self.resolutions = Some(resolutions.to_vec());
        Ok(())
    }

    pub fn clear_resolutions(&mut self) {
        self.resolutions = None;
    }

    pub fn set_voxel_type(&mut self, voxel_type: VoxelType) {
        self.voxel_type = voxel_type;
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn set_orientation_order(&mut self, order: OrientationOrder) {
        self.orientation_order = order;
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.sizes.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Size of `axis`, or 1 for axes beyond `ndim`.
    pub fn size(&self, axis: usize) -> usize {
        self.sizes.get(axis).copied().unwrap_or(1)
    }

    pub fn increments(&self) -> &[i64] {
        &self.increments
    }

    /// Increment of `axis`, or 0 for axes beyond `ndim`.
    pub fn increment(&self, axis: usize) -> i64 {
        self.increments.get(axis).copied().unwrap_or(0)
    }

    pub fn has_default_increments(&self) -> bool {
        self.default_increments
    }

    pub fn voxel_type(&self) -> VoxelType {
        self.voxel_type
    }

    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    pub fn resolutions(&self) -> Option<&[f64]> {
        self.resolutions.as_deref()
    }

    /// Resolution of `axis`, 1.0 when unset or beyond `ndim`.
    pub fn resolution(&self, axis: usize) -> f64 {
        self.resolutions
            .as_ref()
            .and_then(|r| r.get(axis).copied())
            .unwrap_or(1.0)
    }

    /// The first three resolutions, when resolutions are set.
    pub fn resolution_vector(&self) -> Option<Vector3> {
        self.resolutions
            .as_ref()
            .map(|r| Vector3::from_slice_or(r, 1.0))
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn orientation_order(&self) -> OrientationOrder {
        self.orientation_order
    }

    /// Product of all sizes; checked against overflow at construction.
    pub fn number_of_points(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Words an array needs to hold every addressable voxel (offset included).
    pub fn length_in_words(&self) -> usize {
        if self.default_increments {
            return self.offset as usize + self.number_of_points();
        }
        let highest: i64 = self.offset
            + self
                .sizes
                .iter()
                .zip(&self.increments)
                .map(|(&s, &inc)| ((s as i64 - 1) * inc).max(0))
                .sum::<i64>();
        highest as usize + 1
    }

    /// True when every coordinate is inside the shape.
    ///
    /// Coordinates beyond `ndim` must be 0; missing coordinates count as 0.
    pub fn in_bounds(&self, point: &[i64]) -> bool {
        let axes = point.len().max(self.ndim());
        (0..axes).all(|axis| {
            let p = point.get(axis).copied().unwrap_or(0);
            p >= 0 && (p as usize) < self.size(axis)
        })
    }

    /// Flat array index of `point`, or `None` when it is out of bounds.
    pub fn index(&self, point: &[i64]) -> Option<usize> {
        if !self.in_bounds(point) {
            return None;
        }
        let index = self.offset
            + self
                .increments
                .iter()
                .enumerate()
                .map(|(axis, inc)| point.get(axis).copied().unwrap_or(0) * inc)
                .sum::<i64>();
        Some(index as usize)
    }

    /// Point addressed by a flat index, or `None` if no point maps to it.
    ///
    /// Custom increments use an O(volume) search over at most
    /// [`MAX_SEARCH_AXES`] axes; this is the rare, slow path.
    pub fn point(&self, index: usize) -> Option<Vec<i64>> {
        let index = index as i64;
        if self.default_increments {
            let mut remainder = index - self.offset;
            if remainder < 0 || remainder >= self.number_of_points() as i64 {
                return None;
            }
            let mut point = vec![0i64; self.ndim()];
            for axis in (0..self.ndim()).rev() {
                let inc = self.increments[axis];
                point[axis] = remainder / inc;
                remainder %= inc;
            }
            return Some(point);
        }

        if self.ndim() > MAX_SEARCH_AXES {
            tracing::debug!(
                ndim = self.ndim(),
                "point lookup with custom increments is limited to {} axes",
                MAX_SEARCH_AXES
            );
            return None;
        }
        tracing::debug!(index, sizes = ?self.sizes, "exhaustive point search for custom increments");
        let mut point = vec![0i64; self.ndim()];
        loop {
            let candidate = self.offset
                + point
                    .iter()
                    .zip(&self.increments)
                    .map(|(p, inc)| p * inc)
                    .sum::<i64>();
            if candidate == index {
                return Some(point);
            }
            // Odometer step, axis 0 fastest.
            let mut axis = 0;
            loop {
                if axis == self.ndim() {
                    return None;
                }
                point[axis] += 1;
                if (point[axis] as usize) < self.sizes[axis] {
                    break;
                }
                point[axis] = 0;
                axis += 1;
            }
        }
    }

    /// Same sizes on every axis.
    pub fn same_shape(&self, other: &Dimensions) -> bool {
        self.sizes == other.sizes
    }

    /// Same sizes, increments, offset and type.
    pub fn same_layout(&self, other: &Dimensions) -> bool {
        self.sizes == other.sizes
            && self.increments == other.increments
            && self.offset == other.offset
            && self.voxel_type == other.voxel_type
    }

    /// Axes shown for `view` on this volume.
    pub fn slice_axes(&self, view: Orientation) -> SliceAxes {
        orientation::slice_axes(view, self.orientation)
    }

    /// The axis stepped through by slice number for `view`.
    pub fn slice_number_dimension(&self, view: Orientation) -> usize {
        self.slice_axes(view).slice
    }

    /// Number of slices available for `view`.
    pub fn number_of_slices(&self, view: Orientation) -> usize {
        self.size(self.slice_number_dimension(view))
    }

    /// Size of the fourth axis, or 1.
    pub fn i_dim_size(&self) -> usize {
        self.size(3)
    }

    /// Two-axis dimensions of a slice displayed in `view`.
    pub fn slice_dimensions(&self, view: Orientation, out_type: VoxelType) -> Dimensions {
        let axes = self.slice_axes(view);
        let (nx, ny) = (self.size(axes.x), self.size(axes.y));
        let mut slice = Self::build(vec![nx, ny], vec![1, nx as i64], out_type);
        if self.resolutions.is_some() {
            slice.resolutions = Some(vec![self.resolution(axes.x), self.resolution(axes.y)]);
        }
        slice.orientation = view;
        slice.orientation_order = self.orientation_order;
        slice
    }

    /// Input increments along display x, display y and the slice axis.
    pub fn input_to_slice_increments(&self, view: Orientation) -> [i64; 3] {
        let axes = self.slice_axes(view);
        [
            self.increment(axes.x),
            self.increment(axes.y),
            self.increment(axes.slice),
        ]
    }
}
