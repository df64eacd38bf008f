//! Orientation tags and the view-mode lookup table.
//!
//! A volume's orientation says which anatomical plane its first two axes
//! span. A requested view mode says which plane to display. Together they
//! pick the slice axis and the two input axes shown as display x and y.
//!
//! Anatomical axis storage per volume orientation:
//!
//! | orientation | axis 0 | axis 1 | axis 2 |
//! |-------------|--------|--------|--------|
//! | transverse  | R-L    | A-P    | S-I    |
//! | coronal     | R-L    | S-I    | A-P    |
//! | sagittal    | A-P    | S-I    | R-L    |
//!
//! The raw axis-pair modes ignore the volume's orientation entirely.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResliceError;

/// Orientation tag of a volume, or requested view mode of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Transverse,
    Coronal,
    Sagittal,
    XySlice,
    XzSlice,
    YxSlice,
    YzSlice,
    ZxSlice,
    ZySlice,
}

impl Orientation {
    pub const ALL: [Orientation; 9] = [
        Orientation::Transverse,
        Orientation::Coronal,
        Orientation::Sagittal,
        Orientation::XySlice,
        Orientation::XzSlice,
        Orientation::YxSlice,
        Orientation::YzSlice,
        Orientation::ZxSlice,
        Orientation::ZySlice,
    ];

    /// True for transverse, coronal and sagittal.
    pub fn is_anatomical(self) -> bool {
        matches!(
            self,
            Orientation::Transverse | Orientation::Coronal | Orientation::Sagittal
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Transverse => "transverse",
            Orientation::Coronal => "coronal",
            Orientation::Sagittal => "sagittal",
            Orientation::XySlice => "xy",
            Orientation::XzSlice => "xz",
            Orientation::YxSlice => "yx",
            Orientation::YzSlice => "yz",
            Orientation::ZxSlice => "zx",
            Orientation::ZySlice => "zy",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = ResliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Orientation::ALL
            .into_iter()
            .find(|o| o.name() == lowered)
            .ok_or_else(|| ResliceError::format(0, s, "unknown orientation"))
    }
}

/// Which anatomical direction each axis increases towards.
///
/// Stored as bit flags; carried as metadata through reslicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrientationOrder(u8);

impl OrientationOrder {
    pub const LEFT_POSITIVE: u8 = 0b001;
    pub const POSTERIOR_POSITIVE: u8 = 0b010;
    pub const INFERIOR_POSITIVE: u8 = 0b100;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn with(self, flag: u8) -> Self {
        Self::from_bits(self.0 | flag)
    }
}

/// Input axes chosen for a view: display x, display y, and the slice axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceAxes {
    pub x: usize,
    pub y: usize,
    pub slice: usize,
}

impl SliceAxes {
    const fn new(x: usize, y: usize, slice: usize) -> Self {
        Self { x, y, slice }
    }

    /// The axes as `[x, y, slice]`.
    pub fn as_array(self) -> [usize; 3] {
        [self.x, self.y, self.slice]
    }
}

/// Look up the axes shown for `view` on a volume tagged `volume`.
pub fn slice_axes(view: Orientation, volume: Orientation) -> SliceAxes {
    use Orientation::*;
    match view {
        XySlice => SliceAxes::new(0, 1, 2),
        YxSlice => SliceAxes::new(1, 0, 2),
        XzSlice => SliceAxes::new(0, 2, 1),
        ZxSlice => SliceAxes::new(2, 0, 1),
        YzSlice => SliceAxes::new(1, 2, 0),
        ZySlice => SliceAxes::new(2, 1, 0),
        Transverse => match volume {
            Coronal => SliceAxes::new(0, 2, 1),
            Sagittal => SliceAxes::new(2, 0, 1),
            _ => SliceAxes::new(0, 1, 2),
        },
        Coronal => match volume {
            Coronal => SliceAxes::new(0, 1, 2),
            Sagittal => SliceAxes::new(2, 1, 0),
            _ => SliceAxes::new(0, 2, 1),
        },
        Sagittal => match volume {
            Coronal => SliceAxes::new(2, 1, 0),
            Sagittal => SliceAxes::new(0, 1, 2),
            _ => SliceAxes::new(1, 2, 0),
        },
    }
}
