//! Element trait tying Rust primitives to [`VoxelType`] and [`VoxelArray`].

use super::array::VoxelArray;
use super::types::{self, VoxelType};

/// A primitive that can be stored in a voxel array.
pub trait Voxel: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// The storage tag for this primitive.
    const TYPE: VoxelType;

    fn to_f64(self) -> f64;

    /// Convert with rounding (integer types) and saturation.
    fn from_f64(value: f64) -> Self;

    /// Borrow the array's storage if it holds this primitive.
    fn view(array: &VoxelArray) -> Option<&[Self]>;

    fn view_mut(array: &mut VoxelArray) -> Option<&mut [Self]>;

    fn wrap(values: Vec<Self>) -> VoxelArray;
}

macro_rules! impl_voxel {
    ($t:ty, $tag:ident, $from:expr) => {
        impl Voxel for $t {
            const TYPE: VoxelType = VoxelType::$tag;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                $from(value)
            }

            fn view(array: &VoxelArray) -> Option<&[Self]> {
                match array {
                    VoxelArray::$tag(values) => Some(values.as_slice()),
                    _ => None,
                }
            }

            fn view_mut(array: &mut VoxelArray) -> Option<&mut [Self]> {
                match array {
                    VoxelArray::$tag(values) => Some(values.as_mut_slice()),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> VoxelArray {
                VoxelArray::$tag(values)
            }
        }
    };
}

impl_voxel!(u8, UnsignedByte, types::double_to_unsigned_byte);
impl_voxel!(i8, Byte, types::double_to_byte);
impl_voxel!(u16, UnsignedShort, types::double_to_unsigned_short);
impl_voxel!(i16, Short, types::double_to_short);
impl_voxel!(u32, UnsignedInteger, types::double_to_unsigned_int);
impl_voxel!(i32, Integer, types::double_to_int);
impl_voxel!(f32, Float, types::double_to_float);
impl_voxel!(f64, Double, |v: f64| v);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_saturates() {
        assert_eq!(<u8 as Voxel>::from_f64(-12.0), 0);
        assert_eq!(<i16 as Voxel>::from_f64(1e6), i16::MAX);
        assert_eq!(<f64 as Voxel>::from_f64(1.5), 1.5);
    }

    #[test]
    fn test_view_matches_variant() {
        let array = <i16 as Voxel>::wrap(vec![1, 2, 3]);
        assert_eq!(<i16 as Voxel>::view(&array), Some(&[1i16, 2, 3][..]));
        assert!(<u8 as Voxel>::view(&array).is_none());
    }
}
