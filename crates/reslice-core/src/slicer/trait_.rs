//! DataSlicer trait for extracting 2-D slices from volumes.
//!
//! A slicer is built for one input shape, view mode and output type and is
//! immutable afterwards. A different input shape gets a different slicer
//! through [`DataSlicer::equivalent_data_slicer`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::image::{Dimensions, VoxelBuffer};
use crate::voxel::ValueScale;

/// Extracts displayable 2-D slices from a 3-D or 4-D volume.
pub trait DataSlicer: Debug + Send + Sync {
    /// Short name of the slicing scheme.
    fn name(&self) -> &'static str;

    /// Input shape this slicer was built for.
    fn input_dimensions(&self) -> &Dimensions;

    /// Two-axis dimensions of every slice this slicer produces.
    fn slice_dimensions(&self) -> &Dimensions;

    fn number_of_slices(&self) -> usize;

    /// Input data indices shown at `point` of slice `slice`.
    ///
    /// The result has one entry per input axis, and at least three. For a
    /// resampling slicer the indices may fall outside the input.
    fn data_indices_from_slice_point(&self, point: [i64; 2], slice: usize, i_value: usize) -> Vec<i64>;

    /// Slice point at which the input voxel `indices` is displayed.
    fn slice_point_from_data_indices(&self, indices: &[i64]) -> [i64; 2];

    /// Slice in which the input voxel `indices` is displayed.
    fn slice_number_from_data_indices(&self, indices: &[i64]) -> i64;

    /// True when the input voxel `indices` is displayed in slice `slice`.
    fn in_slice(&self, indices: &[i64], slice: usize) -> bool {
        self.slice_number_from_data_indices(indices) == slice as i64
    }

    /// Extract one slice.
    ///
    /// # Arguments
    /// * `input` - Volume whose shape matches [`input_dimensions`](Self::input_dimensions)
    /// * `slice` - Slice number, below [`number_of_slices`](Self::number_of_slices)
    /// * `i_value` - Index along the fourth axis (0 for 3-D volumes)
    /// * `scale` - Value transform applied to every copied voxel
    /// * `target` - Buffer to reuse; it must match the slice dimensions
    ///
    /// # Returns
    /// The filled slice, or `None` when shapes, types or indices do not fit.
    fn grab_slice_data(
        &self,
        input: &VoxelBuffer,
        slice: usize,
        i_value: usize,
        scale: &ValueScale,
        target: Option<VoxelBuffer>,
    ) -> Option<VoxelBuffer>;

    /// A slicer for `dimensions` with every other parameter kept.
    ///
    /// Returns `self` when the shape and orientation are unchanged. Fails
    /// when the new shape cannot be resliced.
    fn equivalent_data_slicer(self: Arc<Self>, dimensions: &Dimensions) -> Result<Arc<dyn DataSlicer>>;
}

/// Shared checks and allocation of the output buffer.
///
/// Returns the buffer to fill, or `None` when `input` or `target` does not
/// fit the slicer.
pub(crate) fn prepare_target(
    slicer: &dyn DataSlicer,
    input: &VoxelBuffer,
    slice: usize,
    i_value: usize,
    target: Option<VoxelBuffer>,
) -> Option<VoxelBuffer> {
    let expected = slicer.input_dimensions();
    if !input.dimensions().same_shape(expected) || !input.is_allocated() {
        tracing::debug!(
            slicer = slicer.name(),
            expected = ?expected.sizes(),
            actual = ?input.dimensions().sizes(),
            "input does not match slicer"
        );
        return None;
    }
    if slice >= slicer.number_of_slices() || i_value >= expected.i_dim_size() {
        return None;
    }

    let slice_dims = slicer.slice_dimensions();
    let mut out = match target {
        Some(t) => {
            let dims = t.dimensions();
            if !dims.same_shape(slice_dims) || dims.voxel_type() != slice_dims.voxel_type() {
                tracing::debug!(
                    expected = ?slice_dims.sizes(),
                    actual = ?dims.sizes(),
                    "target buffer does not match slice dimensions"
                );
                return None;
            }
            t
        }
        None => VoxelBuffer::new(slice_dims.clone()),
    };
    if !out.is_allocated() {
        out.init_data_array();
    }
    Some(out)
}
