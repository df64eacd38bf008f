//! Typed flat voxel storage and the shared scaling copy routine.
//!
//! [`copy_voxels`] is the single path through which slicers move voxel
//! values: it walks a strided source run, applies a [`ValueScale`], and
//! saturates into the destination type.

use super::element::Voxel;
use super::scale::ValueScale;
use super::types::VoxelType;
use crate::error::{ResliceError, Result};

/// Flat voxel storage tagged with its element type.
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelArray {
    UnsignedByte(Vec<u8>),
    Byte(Vec<i8>),
    UnsignedShort(Vec<u16>),
    Short(Vec<i16>),
    UnsignedInteger(Vec<u32>),
    Integer(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

/// Evaluate `$body` with `$v` bound to the inner vector, whatever its type.
macro_rules! with_values {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            VoxelArray::UnsignedByte($v) => $body,
            VoxelArray::Byte($v) => $body,
            VoxelArray::UnsignedShort($v) => $body,
            VoxelArray::Short($v) => $body,
            VoxelArray::UnsignedInteger($v) => $body,
            VoxelArray::Integer($v) => $body,
            VoxelArray::Float($v) => $body,
            VoxelArray::Double($v) => $body,
        }
    };
}

impl VoxelArray {
    /// Allocate `len` zeroed voxels of the given type.
    pub fn zeros(voxel_type: VoxelType, len: usize) -> Self {
        match voxel_type {
            VoxelType::UnsignedByte => VoxelArray::UnsignedByte(vec![0; len]),
            VoxelType::Byte => VoxelArray::Byte(vec![0; len]),
            VoxelType::UnsignedShort => VoxelArray::UnsignedShort(vec![0; len]),
            VoxelType::Short => VoxelArray::Short(vec![0; len]),
            VoxelType::UnsignedInteger => VoxelArray::UnsignedInteger(vec![0; len]),
            VoxelType::Integer => VoxelArray::Integer(vec![0; len]),
            VoxelType::Float => VoxelArray::Float(vec![0.0; len]),
            VoxelType::Double => VoxelArray::Double(vec![0.0; len]),
        }
    }

    /// Build an array of the given type from `f64` values, saturating.
    pub fn from_f64_values(voxel_type: VoxelType, values: &[f64]) -> Self {
        let mut array = Self::zeros(voxel_type, values.len());
        with_values!(&mut array, v => {
            for (dst, src) in v.iter_mut().zip(values) {
                *dst = Voxel::from_f64(*src);
            }
        });
        array
    }

    pub fn voxel_type(&self) -> VoxelType {
        match self {
            VoxelArray::UnsignedByte(_) => VoxelType::UnsignedByte,
            VoxelArray::Byte(_) => VoxelType::Byte,
            VoxelArray::UnsignedShort(_) => VoxelType::UnsignedShort,
            VoxelArray::Short(_) => VoxelType::Short,
            VoxelArray::UnsignedInteger(_) => VoxelType::UnsignedInteger,
            VoxelArray::Integer(_) => VoxelType::Integer,
            VoxelArray::Float(_) => VoxelType::Float,
            VoxelArray::Double(_) => VoxelType::Double,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` widened to `f64`.
    pub fn get(&self, index: usize) -> Option<f64> {
        with_values!(self, v => v.get(index).map(|x| x.to_f64()))
    }

    /// Store `value` at `index`, rounding and saturating into the element type.
    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let len = self.len();
        with_values!(self, v => match v.get_mut(index) {
            Some(slot) => {
                *slot = Voxel::from_f64(value);
                Ok(())
            }
            None => Err(ResliceError::dimension_mismatch(format!(
                "index {} outside array of length {}",
                index, len
            ))),
        })
    }

    /// Set every element to `value` (saturating).
    pub fn fill(&mut self, value: f64) {
        with_values!(self, v => {
            let x = Voxel::from_f64(value);
            v.iter_mut().for_each(|slot| *slot = x);
        })
    }

    /// Widen every element to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_values!(self, v => v.iter().map(|x| x.to_f64()).collect())
    }

    /// Borrow the storage as a typed slice.
    pub fn as_slice<T: Voxel>(&self) -> Option<&[T]> {
        T::view(self)
    }

    pub fn as_mut_slice<T: Voxel>(&mut self) -> Option<&mut [T]> {
        T::view_mut(self)
    }

    /// Smallest and largest element, or `None` for an empty array.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        with_values!(self, v => v.iter().map(|x| x.to_f64()).fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        }))
    }
}

impl<T: Voxel> From<Vec<T>> for VoxelArray {
    fn from(values: Vec<T>) -> Self {
        T::wrap(values)
    }
}

/// Check that `count` elements starting at `start` stepping by `inc` stay in `[0, len)`.
fn check_run(start: i64, inc: i64, count: usize, len: usize, side: &str) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let last = start + inc * (count as i64 - 1);
    let (lo, hi) = (start.min(last), start.max(last));
    if lo < 0 || hi >= len as i64 {
        return Err(ResliceError::dimension_mismatch(format!(
            "{} run [{}, {}] outside array of length {}",
            side, lo, hi, len
        )));
    }
    Ok(())
}

fn copy_scaled<S: Voxel, D: Voxel>(
    src: &[S],
    src_start: i64,
    src_inc: i64,
    dst: &mut [D],
    dst_start: i64,
    dst_inc: i64,
    count: usize,
    scale: &ValueScale,
) {
    let mut si = src_start;
    let mut di = dst_start;
    for _ in 0..count {
        let value = scale.convert(src[si as usize].to_f64());
        dst[di as usize] = D::from_f64(value);
        si += src_inc;
        di += dst_inc;
    }
}

fn copy_same<T: Voxel>(
    src: &[T],
    src_start: i64,
    src_inc: i64,
    dst: &mut [T],
    dst_start: i64,
    dst_inc: i64,
    count: usize,
) {
    if src_inc == 1 && dst_inc == 1 {
        let (s, d) = (src_start as usize, dst_start as usize);
        dst[d..d + count].copy_from_slice(&src[s..s + count]);
        return;
    }
    let mut si = src_start;
    let mut di = dst_start;
    for _ in 0..count {
        dst[di as usize] = src[si as usize];
        si += src_inc;
        di += dst_inc;
    }
}

/// Copy a strided run of `count` voxels from `src` into `dst`.
///
/// Each value passes through `scale.convert` and is saturated into the
/// destination type. Same-type copies with an identity scale are raw copies.
#[allow(clippy::too_many_arguments)]
pub fn copy_voxels(
    src: &VoxelArray,
    src_start: i64,
    src_inc: i64,
    dst: &mut VoxelArray,
    dst_start: i64,
    dst_inc: i64,
    count: usize,
    scale: &ValueScale,
) -> Result<()> {
    check_run(src_start, src_inc, count, src.len(), "source")?;
    check_run(dst_start, dst_inc, count, dst.len(), "destination")?;

    if scale.is_identity() {
        macro_rules! same_type {
            ($($tag:ident),*) => {
                match (src, &mut *dst) {
                    $(
                        (VoxelArray::$tag(s), VoxelArray::$tag(d)) => {
                            copy_same(s, src_start, src_inc, d, dst_start, dst_inc, count);
                            return Ok(());
                        }
                    )*
                    _ => {}
                }
            };
        }
        same_type!(
            UnsignedByte,
            Byte,
            UnsignedShort,
            Short,
            UnsignedInteger,
            Integer,
            Float,
            Double
        );
    }

    with_values!(src, s => with_values!(&mut *dst, d => {
        copy_scaled(s, src_start, src_inc, d, dst_start, dst_inc, count, scale)
    }));
    Ok(())
}
