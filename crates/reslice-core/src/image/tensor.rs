//! Conversion between voxel buffers and burn tensors.
//!
//! Tensors use the `[.., Z, Y, X]` convention: the last tensor dimension is
//! the contiguous one. Buffer axis 0 is the fastest-varying axis, so the
//! tensor shape is the buffer's sizes reversed.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use super::buffer::VoxelBuffer;
use super::dimensions::Dimensions;
use crate::error::{ResliceError, Result};
use crate::voxel::{VoxelArray, VoxelType};

impl Dimensions {
    /// Flat indices of every point, axis 0 fastest.
    pub fn indices_in_order(&self) -> Vec<usize> {
        if self.has_default_increments() {
            return (self.offset()..self.offset() + self.number_of_points()).collect();
        }
        let mut indices = Vec::with_capacity(self.number_of_points());
        let mut point = vec![0i64; self.ndim()];
        'outer: loop {
            if let Some(index) = self.index(&point) {
                indices.push(index);
            }
            for axis in 0..self.ndim() {
                point[axis] += 1;
                if (point[axis] as usize) < self.sizes()[axis] {
                    continue 'outer;
                }
                point[axis] = 0;
            }
            break;
        }
        indices
    }
}

impl VoxelBuffer {
    /// Copy the voxels into a `D`-rank float tensor.
    pub fn to_tensor<B: Backend, const D: usize>(&self, device: &B::Device) -> Result<Tensor<B, D>> {
        let dims = self.dimensions();
        if dims.ndim() != D {
            return Err(ResliceError::dimension_mismatch(format!(
                "{}-axis buffer cannot become a rank-{} tensor",
                dims.ndim(),
                D
            )));
        }
        let data = self
            .data()
            .ok_or_else(|| ResliceError::unallocated("to_tensor before init_data_array"))?;

        let values: Vec<f32> = dims
            .indices_in_order()
            .into_iter()
            .map(|i| data.get(i).unwrap_or(0.0) as f32)
            .collect();
        let shape: Vec<usize> = dims.sizes().iter().rev().copied().collect();

        Ok(Tensor::<B, D>::from_data(TensorData::new(values, shape), device))
    }

    /// Build a buffer of `voxel_type` from a tensor, saturating each value.
    pub fn from_tensor<B: Backend, const D: usize>(
        tensor: Tensor<B, D>,
        voxel_type: VoxelType,
    ) -> Result<Self> {
        let sizes: Vec<usize> = tensor.dims().iter().rev().copied().collect();
        let dims = Dimensions::new(&sizes, voxel_type)?;
        let values = tensor
            .into_data()
            .convert::<f64>()
            .to_vec::<f64>()
            .map_err(|e| ResliceError::tensor(format!("{:?}", e)))?;
        VoxelBuffer::from_array(dims, VoxelArray::from_f64_values(voxel_type, &values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn ramp(sizes: &[usize]) -> VoxelBuffer {
        let dims = Dimensions::new(sizes, VoxelType::Short).unwrap();
        let n = dims.number_of_points();
        let values: Vec<i16> = (0..n as i16).collect();
        VoxelBuffer::from_array(dims, VoxelArray::from(values)).unwrap()
    }

    #[test]
    fn test_to_tensor_reverses_axes() {
        let device = Default::default();
        let buffer = ramp(&[4, 3, 2]);
        let tensor = buffer.to_tensor::<TestBackend, 3>(&device).unwrap();
        assert_eq!(tensor.dims(), [2, 3, 4]);

        let data = tensor.into_data();
        let slice = data.as_slice::<f32>().unwrap();
        assert_eq!(slice[0], 0.0);
        assert_eq!(slice[23], 23.0);
    }

    #[test]
    fn test_rank_mismatch() {
        let device = Default::default();
        let buffer = ramp(&[4, 3]);
        assert!(buffer.to_tensor::<TestBackend, 3>(&device).is_err());
    }

    #[test]
    fn test_from_tensor_saturates() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 2>::from_floats([[-1.0, 2.4], [300.0, 7.6]], &device);
        let buffer = VoxelBuffer::from_tensor(tensor, VoxelType::UnsignedByte).unwrap();
        assert_eq!(buffer.dimensions().sizes(), &[2, 2]);
        assert_eq!(buffer.get_pixel(&[0, 0]), Some(0.0));
        assert_eq!(buffer.get_pixel(&[1, 0]), Some(2.0));
        assert_eq!(buffer.get_pixel(&[0, 1]), Some(255.0));
        assert_eq!(buffer.get_pixel(&[1, 1]), Some(8.0));
    }

    #[test]
    fn test_indices_in_order_custom_layout() {
        let dims = Dimensions::new(&[2, 2], VoxelType::Byte)
            .unwrap()
            .with_increments(&[2, 1])
            .unwrap();
        assert_eq!(dims.indices_in_order(), vec![0, 2, 1, 3]);
    }
}
