//! Axis-permutation slicing.
//!
//! The slice is a strided block of the input: each output row is one
//! [`copy_voxels`] run along the input axis shown as display x. No voxel is
//! resampled.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::trait_::{prepare_target, DataSlicer};
use crate::error::Result;
use crate::image::{Dimensions, Orientation, SliceAxes, VoxelBuffer};
use crate::voxel::{copy_voxels, ValueScale, VoxelType};

/// Lossless slicer along the principal planes of a volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "OrthoRecord", into = "OrthoRecord")]
pub struct PrimaryOrthoDataSlicer {
    input: Dimensions,
    view: Orientation,
    out_type: Option<VoxelType>,
    axes: SliceAxes,
    slice_dims: Dimensions,
}

#[derive(Serialize, Deserialize)]
struct OrthoRecord {
    input: Dimensions,
    view: Orientation,
    out_type: Option<VoxelType>,
}

impl From<OrthoRecord> for PrimaryOrthoDataSlicer {
    fn from(record: OrthoRecord) -> Self {
        Self::new(&record.input, record.view, record.out_type)
    }
}

impl From<PrimaryOrthoDataSlicer> for OrthoRecord {
    fn from(slicer: PrimaryOrthoDataSlicer) -> Self {
        Self {
            input: slicer.input,
            view: slicer.view,
            out_type: slicer.out_type,
        }
    }
}

impl PrimaryOrthoDataSlicer {
    /// Slicer for `input` shown in `view`.
    ///
    /// `out_type` of `None` keeps the input's voxel type.
    pub fn new(input: &Dimensions, view: Orientation, out_type: Option<VoxelType>) -> Self {
        let axes = input.slice_axes(view);
        let slice_dims = input.slice_dimensions(view, out_type.unwrap_or(input.voxel_type()));
        tracing::debug!(
            view = %view,
            volume = %input.orientation(),
            axes = ?axes.as_array(),
            "ortho slicer"
        );
        Self {
            input: input.clone(),
            view,
            out_type,
            axes,
            slice_dims,
        }
    }

    pub fn view(&self) -> Orientation {
        self.view
    }

    pub fn axes(&self) -> SliceAxes {
        self.axes
    }

    pub fn to_script(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_script(script: &str) -> Result<Self> {
        Ok(serde_json::from_str(script)?)
    }
}

impl DataSlicer for PrimaryOrthoDataSlicer {
    fn name(&self) -> &'static str {
        "primary_ortho"
    }

    fn input_dimensions(&self) -> &Dimensions {
        &self.input
    }

    fn slice_dimensions(&self) -> &Dimensions {
        &self.slice_dims
    }

    fn number_of_slices(&self) -> usize {
        self.input.size(self.axes.slice)
    }

    fn data_indices_from_slice_point(&self, point: [i64; 2], slice: usize, i_value: usize) -> Vec<i64> {
        let mut indices = vec![0i64; self.input.ndim().max(3)];
        indices[self.axes.x] = point[0];
        indices[self.axes.y] = point[1];
        indices[self.axes.slice] = slice as i64;
        if indices.len() > 3 {
            indices[3] = i_value as i64;
        }
        indices
    }

    fn slice_point_from_data_indices(&self, indices: &[i64]) -> [i64; 2] {
        let at = |axis: usize| indices.get(axis).copied().unwrap_or(0);
        [at(self.axes.x), at(self.axes.y)]
    }

    fn slice_number_from_data_indices(&self, indices: &[i64]) -> i64 {
        indices.get(self.axes.slice).copied().unwrap_or(0)
    }

    fn grab_slice_data(
        &self,
        input: &VoxelBuffer,
        slice: usize,
        i_value: usize,
        scale: &ValueScale,
        target: Option<VoxelBuffer>,
    ) -> Option<VoxelBuffer> {
        let mut out = prepare_target(self, input, slice, i_value, target)?;
        let src = input.data()?;
        let in_dims = input.dimensions();

        let src_x = in_dims.increment(self.axes.x);
        let src_y = in_dims.increment(self.axes.y);
        let src_start = in_dims.offset() as i64
            + slice as i64 * in_dims.increment(self.axes.slice)
            + i_value as i64 * in_dims.increment(3);

        let out_dims = out.dimensions();
        let (nx, ny) = (out_dims.size(0), out_dims.size(1));
        let (dst_x, dst_y) = (out_dims.increment(0), out_dims.increment(1));
        let dst_start = out_dims.offset() as i64;

        let dst = out.data_mut()?;
        for y in 0..ny as i64 {
            if let Err(err) = copy_voxels(
                src,
                src_start + y * src_y,
                src_x,
                dst,
                dst_start + y * dst_y,
                dst_x,
                nx,
                scale,
            ) {
                tracing::debug!(%err, row = y, "ortho slice copy failed");
                return None;
            }
        }
        out.set_quantification(input.quantification() * scale.quantification());
        Some(out)
    }

    fn equivalent_data_slicer(self: Arc<Self>, dimensions: &Dimensions) -> Result<Arc<dyn DataSlicer>> {
        if dimensions.same_shape(&self.input) && dimensions.orientation() == self.input.orientation() {
            return Ok(self);
        }
        Ok(Arc::new(Self::new(dimensions, self.view, self.out_type)))
    }
}
