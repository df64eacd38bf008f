//! Voxel storage types and saturating conversions between them.
//!
//! Every narrowing conversion in this module clamps to the destination
//! range. Integer results never wrap.

use crate::error::ResliceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage type of a voxel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoxelType {
    UnsignedByte,
    Byte,
    UnsignedShort,
    Short,
    UnsignedInteger,
    Integer,
    Float,
    Double,
}

impl VoxelType {
    /// All supported types, narrowest first.
    pub const ALL: [VoxelType; 8] = [
        VoxelType::UnsignedByte,
        VoxelType::Byte,
        VoxelType::UnsignedShort,
        VoxelType::Short,
        VoxelType::UnsignedInteger,
        VoxelType::Integer,
        VoxelType::Float,
        VoxelType::Double,
    ];

    /// Size of one voxel in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            VoxelType::UnsignedByte | VoxelType::Byte => 1,
            VoxelType::UnsignedShort | VoxelType::Short => 2,
            VoxelType::UnsignedInteger | VoxelType::Integer | VoxelType::Float => 4,
            VoxelType::Double => 8,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, VoxelType::Float | VoxelType::Double)
    }

    pub const fn is_signed(self) -> bool {
        !matches!(
            self,
            VoxelType::UnsignedByte | VoxelType::UnsignedShort | VoxelType::UnsignedInteger
        )
    }

    /// Smallest representable value.
    pub fn min_value(self) -> f64 {
        match self {
            VoxelType::UnsignedByte => u8::MIN as f64,
            VoxelType::Byte => i8::MIN as f64,
            VoxelType::UnsignedShort => u16::MIN as f64,
            VoxelType::Short => i16::MIN as f64,
            VoxelType::UnsignedInteger => u32::MIN as f64,
            VoxelType::Integer => i32::MIN as f64,
            VoxelType::Float => -(f32::MAX as f64),
            VoxelType::Double => -f64::MAX,
        }
    }

    /// Largest representable value.
    pub fn max_value(self) -> f64 {
        match self {
            VoxelType::UnsignedByte => u8::MAX as f64,
            VoxelType::Byte => i8::MAX as f64,
            VoxelType::UnsignedShort => u16::MAX as f64,
            VoxelType::Short => i16::MAX as f64,
            VoxelType::UnsignedInteger => u32::MAX as f64,
            VoxelType::Integer => i32::MAX as f64,
            VoxelType::Float => f32::MAX as f64,
            VoxelType::Double => f64::MAX,
        }
    }

    /// Canonical lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            VoxelType::UnsignedByte => "unsigned_byte",
            VoxelType::Byte => "byte",
            VoxelType::UnsignedShort => "unsigned_short",
            VoxelType::Short => "short",
            VoxelType::UnsignedInteger => "unsigned_integer",
            VoxelType::Integer => "integer",
            VoxelType::Float => "float",
            VoxelType::Double => "double",
        }
    }

    /// Clamp (and for integer types round) `value` into this type's range.
    ///
    /// The result is still an `f64`, but is exactly representable in the
    /// storage type.
    pub fn saturate(self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        let v = if self.is_integer() { value.round() } else { value };
        v.clamp(self.min_value(), self.max_value())
    }
}

impl fmt::Display for VoxelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VoxelType {
    type Err = ResliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let found = match lowered.as_str() {
            "unsigned_byte" | "ubyte" | "u8" => VoxelType::UnsignedByte,
            "byte" | "i8" => VoxelType::Byte,
            "unsigned_short" | "ushort" | "u16" => VoxelType::UnsignedShort,
            "short" | "i16" => VoxelType::Short,
            "unsigned_integer" | "uint" | "u32" => VoxelType::UnsignedInteger,
            "integer" | "int" | "i32" => VoxelType::Integer,
            "float" | "f32" => VoxelType::Float,
            "double" | "f64" => VoxelType::Double,
            _ => {
                return Err(ResliceError::format(0, s, "unknown voxel type"));
            }
        };
        Ok(found)
    }
}

pub fn int_to_unsigned_byte(value: i32) -> u8 {
    value.clamp(u8::MIN as i32, u8::MAX as i32) as u8
}

pub fn int_to_byte(value: i32) -> i8 {
    value.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

pub fn int_to_unsigned_short(value: i32) -> u16 {
    value.clamp(u16::MIN as i32, u16::MAX as i32) as u16
}

pub fn int_to_short(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

pub fn long_to_int(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

pub fn long_to_unsigned_int(value: i64) -> u32 {
    value.clamp(u32::MIN as i64, u32::MAX as i64) as u32
}

/// Round half away from zero, then clamp into `[min, max]`. NaN maps to 0.
fn round_clamped(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.round().clamp(min, max)
    }
}

pub fn double_to_unsigned_byte(value: f64) -> u8 {
    round_clamped(value, u8::MIN as f64, u8::MAX as f64) as u8
}

pub fn double_to_byte(value: f64) -> i8 {
    round_clamped(value, i8::MIN as f64, i8::MAX as f64) as i8
}

pub fn double_to_unsigned_short(value: f64) -> u16 {
    round_clamped(value, u16::MIN as f64, u16::MAX as f64) as u16
}

pub fn double_to_short(value: f64) -> i16 {
    round_clamped(value, i16::MIN as f64, i16::MAX as f64) as i16
}

pub fn double_to_unsigned_int(value: f64) -> u32 {
    round_clamped(value, u32::MIN as f64, u32::MAX as f64) as u32
}

pub fn double_to_int(value: f64) -> i32 {
    round_clamped(value, i32::MIN as f64, i32::MAX as f64) as i32
}

/// Narrow to `f32`, saturating at `±f32::MAX` instead of overflowing to infinity.
pub fn double_to_float(value: f64) -> f32 {
    if value.is_nan() {
        f32::NAN
    } else if value.is_infinite() {
        value as f32
    } else {
        value.clamp(-(f32::MAX as f64), f32::MAX as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_narrowing_saturates() {
        assert_eq!(int_to_unsigned_byte(-5), 0);
        assert_eq!(int_to_unsigned_byte(300), 255);
        assert_eq!(int_to_byte(200), 127);
        assert_eq!(int_to_byte(-200), -128);
        assert_eq!(int_to_short(40000), i16::MAX);
        assert_eq!(int_to_unsigned_short(-1), 0);
        assert_eq!(long_to_int(i64::MAX), i32::MAX);
        assert_eq!(long_to_unsigned_int(-7), 0);
    }

    #[test]
    fn test_double_narrowing_rounds_and_saturates() {
        assert_eq!(double_to_unsigned_byte(254.6), 255);
        assert_eq!(double_to_unsigned_byte(1e9), 255);
        assert_eq!(double_to_byte(-0.5), -1);
        assert_eq!(double_to_short(f64::NAN), 0);
        assert_eq!(double_to_int(-1e20), i32::MIN);
        assert_eq!(double_to_unsigned_int(4.4), 4);
        assert_eq!(double_to_float(1e300), f32::MAX);
    }

    #[test]
    fn test_type_ranges() {
        assert_eq!(VoxelType::Short.min_value(), -32768.0);
        assert_eq!(VoxelType::UnsignedShort.max_value(), 65535.0);
        assert_eq!(VoxelType::Double.bytes(), 8);
        assert!(VoxelType::Integer.is_integer());
        assert!(!VoxelType::Float.is_integer());
        assert!(!VoxelType::UnsignedInteger.is_signed());
    }

    #[test]
    fn test_saturate() {
        assert_eq!(VoxelType::UnsignedByte.saturate(-3.0), 0.0);
        assert_eq!(VoxelType::Byte.saturate(99.7), 100.0);
        assert_eq!(VoxelType::Double.saturate(0.25), 0.25);
    }

    #[test]
    fn test_name_round_trip() {
        for t in VoxelType::ALL {
            assert_eq!(t.to_string().parse::<VoxelType>().unwrap(), t);
        }
        assert!("complex".parse::<VoxelType>().is_err());
    }
}
