//! Typed voxel buffer: an owned [`Dimensions`] plus a flat [`VoxelArray`].
//!
//! The array is never allocated implicitly. A buffer created with
//! [`VoxelBuffer::new`] has no data until [`VoxelBuffer::init_data_array`]
//! is called.

use super::dimensions::Dimensions;
use crate::error::{ResliceError, Result};
use crate::voxel::{VoxelArray, VoxelType};

/// Voxel data with its shape and a quantification factor.
///
/// The quantification factor relates stored counts to a physical unit; it
/// is carried along and never applied to the values.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelBuffer {
    dimensions: Dimensions,
    data: Option<VoxelArray>,
    quantification: f64,
}

impl VoxelBuffer {
    /// A buffer with no data allocated yet.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            data: None,
            quantification: 1.0,
        }
    }

    /// A buffer over existing data.
    ///
    /// The array type must match the dimensions and hold at least
    /// `length_in_words()` elements.
    pub fn from_array(dimensions: Dimensions, data: VoxelArray) -> Result<Self> {
        if data.voxel_type() != dimensions.voxel_type() {
            return Err(ResliceError::TypeMismatch {
                expected: dimensions.voxel_type(),
                actual: data.voxel_type(),
            });
        }
        if data.len() < dimensions.length_in_words() {
            return Err(ResliceError::dimension_mismatch(format!(
                "array of {} words is shorter than the {} the dimensions address",
                data.len(),
                dimensions.length_in_words()
            )));
        }
        Ok(Self {
            dimensions,
            data: Some(data),
            quantification: 1.0,
        })
    }

    /// Allocate a zeroed array sized to the dimensions, replacing any data.
    pub fn init_data_array(&mut self) -> &mut VoxelArray {
        let array = VoxelArray::zeros(
            self.dimensions.voxel_type(),
            self.dimensions.length_in_words(),
        );
        self.data.insert(array)
    }

    pub fn with_quantification(mut self, quantification: f64) -> Self {
        self.quantification = quantification;
        self
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn voxel_type(&self) -> VoxelType {
        self.dimensions.voxel_type()
    }

    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&VoxelArray> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut VoxelArray> {
        self.data.as_mut()
    }

    /// Release the array, leaving the buffer unallocated.
    pub fn take_data(&mut self) -> Option<VoxelArray> {
        self.data.take()
    }

    pub fn quantification(&self) -> f64 {
        self.quantification
    }

    pub fn set_quantification(&mut self, quantification: f64) {
        self.quantification = quantification;
    }

    /// Value at `point`, or `None` when out of bounds or unallocated.
    pub fn get_pixel(&self, point: &[i64]) -> Option<f64> {
        let index = self.dimensions.index(point)?;
        self.data.as_ref()?.get(index)
    }

    /// Store `value` at `point`, saturating into the buffer's type.
    pub fn set_pixel(&mut self, point: &[i64], value: f64) -> Result<()> {
        let index = self.dimensions.index(point).ok_or_else(|| {
            ResliceError::dimension_mismatch(format!(
                "point {:?} outside {:?}",
                point,
                self.dimensions.sizes()
            ))
        })?;
        let data = self
            .data
            .as_mut()
            .ok_or_else(|| ResliceError::unallocated("set_pixel before init_data_array"))?;
        data.set(index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_allocated_until_init() {
        let dims = Dimensions::new(&[2, 2], VoxelType::UnsignedByte).unwrap();
        let mut buffer = VoxelBuffer::new(dims);
        assert!(!buffer.is_allocated());
        assert_eq!(buffer.get_pixel(&[0, 0]), None);
        assert!(matches!(
            buffer.set_pixel(&[0, 0], 1.0),
            Err(ResliceError::Unallocated(_))
        ));

        buffer.init_data_array();
        assert_eq!(buffer.data().map(|d| d.len()), Some(4));
        buffer.set_pixel(&[1, 1], 400.0).unwrap();
        assert_eq!(buffer.get_pixel(&[1, 1]), Some(255.0));
    }

    #[test]
    fn test_from_array_checks_type_and_length() {
        let dims = Dimensions::new(&[3], VoxelType::Short).unwrap();
        assert!(matches!(
            VoxelBuffer::from_array(dims.clone(), VoxelArray::from(vec![1u8, 2, 3])),
            Err(ResliceError::TypeMismatch { .. })
        ));
        assert!(VoxelBuffer::from_array(dims.clone(), VoxelArray::from(vec![1i16, 2])).is_err());
        let buffer = VoxelBuffer::from_array(dims, VoxelArray::from(vec![1i16, 2, 3])).unwrap();
        assert_eq!(buffer.get_pixel(&[2]), Some(3.0));
    }

    #[test]
    fn test_set_pixel_out_of_bounds() {
        let dims = Dimensions::new(&[2, 2], VoxelType::Float).unwrap();
        let mut buffer = VoxelBuffer::new(dims);
        buffer.init_data_array();
        assert!(buffer.set_pixel(&[2, 0], 1.0).is_err());
    }

    #[test]
    fn test_quantification_is_bookkeeping_only() {
        let dims = Dimensions::new(&[1], VoxelType::Double).unwrap();
        let buffer = VoxelBuffer::from_array(dims, VoxelArray::from(vec![4.0f64]))
            .unwrap()
            .with_quantification(0.5);
        assert_eq!(buffer.quantification(), 0.5);
        assert_eq!(buffer.get_pixel(&[0]), Some(4.0));
    }
}
