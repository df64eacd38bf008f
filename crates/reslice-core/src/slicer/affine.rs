//! Arbitrary affine reslicing with nearest-neighbour sampling.
//!
//! The transform maps input voxel indices to output voxel indices. The
//! output volume is, unless given explicitly, the smallest box holding all
//! eight transformed input corners; its minimum corner becomes the output
//! origin. Slices are cut from that output volume with the same view-mode
//! table the ortho slicer uses.
//!
//! Materialising a slice walks the output grid while accumulating the
//! inverse-transformed unit steps onto a running input location. Each
//! location is rounded to the nearest voxel; locations outside the input
//! produce zero.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::trait_::{prepare_target, DataSlicer};
use crate::error::{ResliceError, Result};
use crate::image::{Dimensions, Orientation, SliceAxes, VoxelBuffer};
use crate::spatial::{AffineMatrix, Vector3};
use crate::voxel::{copy_voxels, ValueScale, VoxelType};

/// Output volume extent in output index space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sizes: [usize; 3],
    pub origin: Vector3,
}

/// Smallest box covering the eight transformed corners of an input of `sizes`.
///
/// Per axis the size is `ceil(max − min) + 1` and the origin is `min`.
/// Axes beyond `sizes.len()` have extent 1. Fails when an extent is not
/// finite or too large to index.
pub fn calc_min_bounding_dimensions(transform: &AffineMatrix, sizes: &[usize]) -> Result<BoundingBox> {
    let last = |axis: usize| sizes.get(axis).copied().unwrap_or(1).saturating_sub(1) as f64;
    let mut min = Vector3::uniform(f64::INFINITY);
    let mut max = Vector3::uniform(f64::NEG_INFINITY);

    for corner in 0..8 {
        let p = Vector3::new(
            if corner & 1 != 0 { last(0) } else { 0.0 },
            if corner & 2 != 0 { last(1) } else { 0.0 },
            if corner & 4 != 0 { last(2) } else { 0.0 },
        );
        let q = transform.product(&p);
        for axis in 0..3 {
            min[axis] = min[axis].min(q[axis]);
            max[axis] = max[axis].max(q[axis]);
        }
    }

    let mut out = [1usize; 3];
    for axis in 0..3 {
        let extent = (max[axis] - min[axis]).ceil();
        if !(extent.is_finite() && min[axis].is_finite() && extent < MAX_AXIS_EXTENT) {
            return Err(ResliceError::invalid_dimensions(format!(
                "transformed extent {} on axis {} cannot be indexed",
                extent, axis
            )));
        }
        out[axis] = extent as usize + 1;
    }

    Ok(BoundingBox {
        sizes: out,
        origin: min,
    })
}

/// Upper bound on a transformed axis extent; beyond it `f64` steps are coarser than a voxel.
const MAX_AXIS_EXTENT: f64 = (1u64 << 52) as f64;

/// Slicer through an affinely transformed volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AffineRecord", into = "AffineRecord")]
pub struct AffineDataSlicer {
    input: Dimensions,
    transform: AffineMatrix,
    inverse: AffineMatrix,
    view: Orientation,
    out_type: Option<VoxelType>,
    requested_box: Option<BoundingBox>,
    bounds: BoundingBox,
    output: Dimensions,
    axes: SliceAxes,
    slice_dims: Dimensions,
    /// Input-space displacement of a unit step along each output axis.
    steps: [Vector3; 3],
}

#[derive(Serialize, Deserialize)]
struct AffineRecord {
    input: Dimensions,
    transform: AffineMatrix,
    view: Orientation,
    out_type: Option<VoxelType>,
    output_box: Option<BoundingBox>,
}

impl TryFrom<AffineRecord> for AffineDataSlicer {
    type Error = ResliceError;

    fn try_from(record: AffineRecord) -> Result<Self> {
        Self::create(
            &record.input,
            record.transform,
            record.view,
            record.out_type,
            record.output_box,
        )
    }
}

impl From<AffineDataSlicer> for AffineRecord {
    fn from(slicer: AffineDataSlicer) -> Self {
        Self {
            input: slicer.input,
            transform: slicer.transform,
            view: slicer.view,
            out_type: slicer.out_type,
            output_box: slicer.requested_box,
        }
    }
}

impl AffineDataSlicer {
    /// Slicer over the minimum bounding box of the transformed input.
    ///
    /// Fails when `transform` is singular.
    pub fn new(
        input: &Dimensions,
        transform: AffineMatrix,
        view: Orientation,
        out_type: Option<VoxelType>,
    ) -> Result<Self> {
        Self::create(input, transform, view, out_type, None)
    }

    /// Slicer over a caller-chosen output box.
    pub fn with_output_box(
        input: &Dimensions,
        transform: AffineMatrix,
        view: Orientation,
        out_type: Option<VoxelType>,
        output_box: BoundingBox,
    ) -> Result<Self> {
        if output_box.sizes.contains(&0) {
            return Err(ResliceError::invalid_dimensions(format!(
                "output box {:?} has a zero size",
                output_box.sizes
            )));
        }
        Self::create(input, transform, view, out_type, Some(output_box))
    }

    fn create(
        input: &Dimensions,
        transform: AffineMatrix,
        view: Orientation,
        out_type: Option<VoxelType>,
        requested_box: Option<BoundingBox>,
    ) -> Result<Self> {
        let inverse = transform
            .inverse()
            .ok_or_else(|| ResliceError::singular_matrix("reslicing transform has no inverse"))?;
        Self::build(input, transform, inverse, view, out_type, requested_box)
    }

    fn build(
        input: &Dimensions,
        transform: AffineMatrix,
        inverse: AffineMatrix,
        view: Orientation,
        out_type: Option<VoxelType>,
        requested_box: Option<BoundingBox>,
    ) -> Result<Self> {
        let bounds = match requested_box {
            Some(requested) => requested,
            None => calc_min_bounding_dimensions(&transform, input.sizes())?,
        };
        let voxel_type = out_type.unwrap_or(input.voxel_type());

        let steps = [0, 1, 2].map(|axis| {
            let mut unit = Vector3::zeros();
            unit[axis] = 1.0;
            inverse.product_vector(&unit)
        });

        let mut output = Dimensions::new(&bounds.sizes, voxel_type)?
            .with_orientation(input.orientation())
            .with_orientation_order(input.orientation_order());
        if let Some(in_res) = input.resolution_vector() {
            let resolutions = steps.map(|step| {
                let mut physical = step;
                physical.multiply_each(&in_res);
                physical.norm()
            });
            if let Err(err) = output.set_resolutions(&resolutions) {
                tracing::warn!(%err, "output resolutions left unset");
            }
        }

        let axes = output.slice_axes(view);
        let slice_dims = output.slice_dimensions(view, voxel_type);

        tracing::debug!(
            sizes = ?bounds.sizes,
            origin = %bounds.origin,
            resolutions = ?output.resolutions(),
            view = %view,
            "affine slicer bounds"
        );

        Ok(Self {
            input: input.clone(),
            transform,
            inverse,
            view,
            out_type,
            requested_box,
            bounds,
            output,
            axes,
            slice_dims,
            steps,
        })
    }

    pub fn transform(&self) -> &AffineMatrix {
        &self.transform
    }

    pub fn inverse(&self) -> &AffineMatrix {
        &self.inverse
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// The full 3-D output volume slices are cut from.
    pub fn output_dimensions(&self) -> &Dimensions {
        &self.output
    }

    pub fn view(&self) -> Orientation {
        self.view
    }

    pub fn axes(&self) -> SliceAxes {
        self.axes
    }

    pub fn steps(&self) -> &[Vector3; 3] {
        &self.steps
    }

    pub fn to_script(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_script(script: &str) -> Result<Self> {
        Ok(serde_json::from_str(script)?)
    }

    /// Continuous input location of an output volume point.
    fn input_location(&self, output_point: &Vector3) -> Vector3 {
        self.inverse.product(&(*output_point + self.bounds.origin))
    }

    /// Output volume point of an input voxel.
    fn output_location(&self, indices: &[i64]) -> Vector3 {
        self.transform.product(&Vector3::from_indices(indices)) - self.bounds.origin
    }
}

impl DataSlicer for AffineDataSlicer {
    fn name(&self) -> &'static str {
        "affine"
    }

    fn input_dimensions(&self) -> &Dimensions {
        &self.input
    }

    fn slice_dimensions(&self) -> &Dimensions {
        &self.slice_dims
    }

    fn number_of_slices(&self) -> usize {
        self.bounds.sizes[self.axes.slice]
    }

    fn data_indices_from_slice_point(&self, point: [i64; 2], slice: usize, i_value: usize) -> Vec<i64> {
        let mut o = Vector3::zeros();
        o[self.axes.x] = point[0] as f64;
        o[self.axes.y] = point[1] as f64;
        o[self.axes.slice] = slice as f64;
        let mut indices = self.input_location(&o).round_to_indices().to_vec();
        if self.input.ndim() > 3 {
            indices.resize(self.input.ndim(), 0);
            indices[3] = i_value as i64;
        }
        indices
    }

    fn slice_point_from_data_indices(&self, indices: &[i64]) -> [i64; 2] {
        let o = self.output_location(indices).round_to_indices();
        [o[self.axes.x], o[self.axes.y]]
    }

    fn slice_number_from_data_indices(&self, indices: &[i64]) -> i64 {
        self.output_location(indices).round_to_indices()[self.axes.slice]
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

        let out_dims = out.dimensions();
        let (nx, ny) = (out_dims.size(0), out_dims.size(1));
        let (dst_x, dst_y) = (out_dims.increment(0), out_dims.increment(1));
        let dst_start = out_dims.offset() as i64;

        let mut start = Vector3::zeros();
        start[self.axes.slice] = slice as f64;
        let mut row = self.input_location(&start);
        let step_x = self.steps[self.axes.x];
        let step_y = self.steps[self.axes.y];

        let mut point = vec![0i64; in_dims.ndim().max(3)];
        if point.len() > 3 {
            point[3] = i_value as i64;
        }

        let dst = out.data_mut()?;
        for y in 0..ny as i64 {
            let mut location = row;
            for x in 0..nx as i64 {
                point[..3].copy_from_slice(&location.round_to_indices());
                let di = dst_start + y * dst_y + x * dst_x;
                match in_dims.index(&point) {
                    Some(si) => {
                        if let Err(err) = copy_voxels(src, si as i64, 1, dst, di, 1, 1, scale) {
                            tracing::debug!(%err, x, y, "affine slice copy failed");
                            return None;
                        }
                    }
                    None => dst.set(di as usize, 0.0).ok()?,
                }
                location.add_in_place(&step_x);
            }
            row.add_in_place(&step_y);
        }
        out.set_quantification(input.quantification() * scale.quantification());
        Some(out)
    }

    fn equivalent_data_slicer(self: Arc<Self>, dimensions: &Dimensions) -> Result<Arc<dyn DataSlicer>> {
        if dimensions.same_shape(&self.input) && dimensions.orientation() == self.input.orientation() {
            return Ok(self);
        }
        Ok(Arc::new(Self::build(
            dimensions,
            self.transform.clone(),
            self.inverse.clone(),
            self.view,
            self.out_type,
            self.requested_box,
        )?))
    }
}
