//! Session defaults shared by the components of one viewer.
//!
//! A [`ViewerSession`] holds the current default [`ValueScale`] and
//! [`CoordinateMap`]. Each default lives behind `RwLock<Arc<T>>`: readers
//! take an `Arc` snapshot and writers swap in a whole new value, so a
//! reader never sees a half-updated default.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

use crate::coordinate::{CoordinateMap, ShiftUnits};
use crate::error::Result;
use crate::image::{Dimensions, Orientation, VoxelBuffer};
use crate::slicer::{AffineDataSlicer, DataSlicer, PrimaryOrthoDataSlicer};
use crate::spatial::AffineMatrix;
use crate::voxel::{ValueScale, VoxelType};

/// Persistent session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// View mode for new slicers.
    pub view_mode: Orientation,
    /// Output voxel type for new slicers; `None` keeps the input type.
    pub output_type: Option<VoxelType>,
    /// Shift units for new affine coordinate maps.
    pub shift_units: ShiftUnits,
    /// Initial default value scale; `None` is the identity.
    pub value_scale: Option<ValueScale>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            view_mode: Orientation::Transverse,
            output_type: None,
            shift_units: ShiftUnits::Pixels,
            value_scale: None,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view_mode(mut self, view_mode: Orientation) -> Self {
        self.view_mode = view_mode;
        self
    }

    pub fn with_output_type(mut self, output_type: VoxelType) -> Self {
        self.output_type = Some(output_type);
        self
    }

    pub fn with_shift_units(mut self, shift_units: ShiftUnits) -> Self {
        self.shift_units = shift_units;
        self
    }

    pub fn with_value_scale(mut self, value_scale: ValueScale) -> Self {
        self.value_scale = Some(value_scale);
        self
    }
}

/// Current defaults of one viewer, passed explicitly to whoever needs them.
#[derive(Debug)]
pub struct ViewerSession {
    config: SessionConfig,
    value_scale: RwLock<Arc<ValueScale>>,
    coordinate_map: RwLock<Arc<CoordinateMap>>,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl ViewerSession {
    pub fn new(config: SessionConfig) -> Self {
        let value_scale = config.value_scale.clone().unwrap_or_default();
        let coordinate_map = CoordinateMap::identity().with_shift_units(config.shift_units);
        tracing::debug!(
            view_mode = %config.view_mode,
            output_type = ?config.output_type,
            "viewer session"
        );
        Self {
            config,
            value_scale: RwLock::new(Arc::new(value_scale)),
            coordinate_map: RwLock::new(Arc::new(coordinate_map)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot of the current default value scale.
    pub fn value_scale(&self) -> Arc<ValueScale> {
        self.value_scale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_value_scale(&self, value_scale: ValueScale) {
        *self.value_scale.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(value_scale);
    }

    /// Replace the default value scale with an edited copy.
    pub fn update_value_scale(&self, edit: impl FnOnce(&mut ValueScale)) {
        let mut guard = self.value_scale.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = ValueScale::clone(&guard);
        edit(&mut next);
        *guard = Arc::new(next);
    }

    /// Snapshot of the current default coordinate map.
    pub fn coordinate_map(&self) -> Arc<CoordinateMap> {
        self.coordinate_map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_coordinate_map(&self, map: CoordinateMap) {
        tracing::debug!(map = map.name(), "default coordinate map replaced");
        *self.coordinate_map.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(map);
    }

    /// An affine map using the session's shift units.
    pub fn affine_map(&self, matrix: AffineMatrix) -> CoordinateMap {
        CoordinateMap::affine(matrix, self.config.shift_units)
    }

    /// Ortho slicer for `input` in the session's view mode and output type.
    pub fn ortho_slicer(&self, input: &Dimensions) -> PrimaryOrthoDataSlicer {
        PrimaryOrthoDataSlicer::new(input, self.config.view_mode, self.config.output_type)
    }

    /// Affine slicer for `input` in the session's view mode and output type.
    pub fn affine_slicer(&self, input: &Dimensions, transform: AffineMatrix) -> Result<AffineDataSlicer> {
        AffineDataSlicer::new(input, transform, self.config.view_mode, self.config.output_type)
    }

    /// Grab a slice using the current default value scale.
    pub fn grab_slice(
        &self,
        slicer: &dyn DataSlicer,
        input: &VoxelBuffer,
        slice: usize,
        i_value: usize,
    ) -> Option<VoxelBuffer> {
        let scale = self.value_scale();
        slicer.grab_slice_data(input, slice, i_value, &scale, None)
    }
}
