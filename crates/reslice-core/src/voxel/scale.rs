//! Affine value scaling with independent clamping thresholds.
//!
//! `convert(v)` evaluates, in order:
//! 1. identity ⇒ `v`
//! 2. `v < min.level` ⇒ `min.value`
//! 3. `v > max.level` ⇒ `max.value`
//! 4. otherwise `(v + translate) * scale`
//!
//! Thresholds are tested against the raw input value and substitute a
//! configured output value; they are not undone by `apply_inverse`.

use super::types::VoxelType;
use serde::{Deserialize, Serialize};

/// Input ranges narrower than this are treated as empty when fitting.
const MIN_RANGE: f64 = 1e-30;

/// A threshold: inputs beyond `level` are replaced by `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub level: f64,
    pub value: f64,
}

impl Threshold {
    pub fn new(level: f64, value: f64) -> Self {
        Self { level, value }
    }
}

/// Value transform applied while copying voxels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ValueScaleRecord", into = "ValueScaleRecord")]
pub struct ValueScale {
    scale: f64,
    translate: f64,
    min_threshold: Option<Threshold>,
    max_threshold: Option<Threshold>,
    quantification: f64,
    identity: bool,
}

#[derive(Serialize, Deserialize)]
struct ValueScaleRecord {
    scale: f64,
    translate: f64,
    #[serde(default)]
    min_threshold: Option<Threshold>,
    #[serde(default)]
    max_threshold: Option<Threshold>,
    quantification: f64,
}

impl From<ValueScaleRecord> for ValueScale {
    fn from(r: ValueScaleRecord) -> Self {
        let mut scale = ValueScale {
            scale: r.scale,
            translate: r.translate,
            min_threshold: r.min_threshold,
            max_threshold: r.max_threshold,
            quantification: r.quantification,
            identity: false,
        };
        scale.update_identity();
        scale
    }
}

impl From<ValueScale> for ValueScaleRecord {
    fn from(s: ValueScale) -> Self {
        Self {
            scale: s.scale,
            translate: s.translate,
            min_threshold: s.min_threshold,
            max_threshold: s.max_threshold,
            quantification: s.quantification,
        }
    }
}

impl Default for ValueScale {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: 0.0,
            min_threshold: None,
            max_threshold: None,
            quantification: 1.0,
            identity: true,
        }
    }
}

impl ValueScale {
    /// The identity scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// `(v + translate) * scale` with no thresholds.
    pub fn with_scale(scale: f64, translate: f64) -> Self {
        let mut s = Self::default();
        s.set_scale_factor(scale);
        s.set_translation(translate);
        s
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale
    }

    pub fn translation(&self) -> f64 {
        self.translate
    }

    pub fn min_threshold(&self) -> Option<Threshold> {
        self.min_threshold
    }

    pub fn max_threshold(&self) -> Option<Threshold> {
        self.max_threshold
    }

    /// Factor relating output counts to input counts, for bookkeeping only.
    pub fn quantification(&self) -> f64 {
        self.quantification
    }

    /// Set the multiplicative factor; also resets quantification to `1/scale`.
    pub fn set_scale_factor(&mut self, scale: f64) {
        self.scale = scale;
        self.quantification = if scale != 0.0 { 1.0 / scale } else { 1.0 };
        self.update_identity();
    }

    pub fn set_translation(&mut self, translate: f64) {
        self.translate = translate;
        self.update_identity();
    }

    pub fn set_min_threshold(&mut self, level: f64, value: f64) {
        self.min_threshold = Some(Threshold::new(level, value));
        self.update_identity();
    }

    pub fn set_max_threshold(&mut self, level: f64, value: f64) {
        self.max_threshold = Some(Threshold::new(level, value));
        self.update_identity();
    }

    pub fn clear_min_threshold(&mut self) {
        self.min_threshold = None;
        self.update_identity();
    }

    pub fn clear_max_threshold(&mut self) {
        self.max_threshold = None;
        self.update_identity();
    }

    pub fn clear_thresholds(&mut self) {
        self.min_threshold = None;
        self.max_threshold = None;
        self.update_identity();
    }

    pub fn set_quantification(&mut self, quantification: f64) {
        self.quantification = quantification;
    }

    fn update_identity(&mut self) {
        self.identity = self.scale == 1.0
            && self.translate == 0.0
            && self.min_threshold.is_none()
            && self.max_threshold.is_none();
    }

    /// Apply thresholds then the affine value transform.
    #[inline]
    pub fn convert(&self, value: f64) -> f64 {
        if self.identity {
            return value;
        }
        if let Some(t) = self.min_threshold {
            if value < t.level {
                return t.value;
            }
        }
        if let Some(t) = self.max_threshold {
            if value > t.level {
                return t.value;
            }
        }
        (value + self.translate) * self.scale
    }

    /// Undo the affine part only: `value / scale - translate`.
    ///
    /// A zero scale factor is treated as 1.
    pub fn apply_inverse(&self, value: f64) -> f64 {
        if self.identity {
            return value;
        }
        let scale = if self.scale == 0.0 { 1.0 } else { self.scale };
        value / scale - self.translate
    }

    /// Compose `self` followed by `next`, ignoring `next`'s thresholds.
    pub fn concatenate(&self, next: &ValueScale) -> ValueScale {
        let translate = if self.scale != 0.0 {
            self.translate + next.translate / self.scale
        } else {
            self.translate
        };
        let mut combined = ValueScale {
            scale: self.scale * next.scale,
            translate,
            min_threshold: self.min_threshold,
            max_threshold: self.max_threshold,
            quantification: self.quantification * next.quantification,
            identity: false,
        };
        combined.update_identity();
        combined
    }

    /// Map `[in_min, in_max]` linearly onto `[out_min, out_max]`.
    ///
    /// Reversed input ranges are normalised by swapping both ends of both
    /// ranges. With `apply_thresholds`, inputs outside the range clamp to the
    /// corresponding output end.
    pub fn set_to_fit_data_in_range(
        &mut self,
        in_min: f64,
        in_max: f64,
        out_min: f64,
        out_max: f64,
        apply_thresholds: bool,
    ) {
        let (mut lo, mut hi, mut out_lo, mut out_hi) = (in_min, in_max, out_min, out_max);
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
            std::mem::swap(&mut out_lo, &mut out_hi);
        }

        let range = hi - lo;
        let mut scale = if range.abs() < MIN_RANGE {
            1.0
        } else {
            (out_hi - out_lo) / range
        };
        if scale.abs() < MIN_RANGE {
            scale = 1.0;
        }
        let translate = out_lo / scale - lo;

        self.set_scale_factor(scale);
        self.set_translation(translate);
        if apply_thresholds {
            self.set_min_threshold(lo, out_lo);
            self.set_max_threshold(hi, out_hi);
        } else {
            self.clear_thresholds();
        }
    }

    /// Spread `[in_min, in_max]` over the full range of an integer output type.
    ///
    /// Floating output types need no rescaling and reset the scale to identity.
    pub fn set_scale_factor_for_max_res(&mut self, in_min: f64, in_max: f64, out_type: VoxelType) {
        if out_type.is_integer() {
            self.set_to_fit_data_in_range(
                in_min,
                in_max,
                out_type.min_value(),
                out_type.max_value(),
                true,
            );
        } else {
            *self = ValueScale::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let s = ValueScale::new();
        assert!(s.is_identity());
        assert_eq!(s.convert(-7.25), -7.25);
        assert_eq!(s.apply_inverse(3.0), 3.0);
    }

    #[test]
    fn test_thresholds_precede_scaling() {
        let mut s = ValueScale::with_scale(2.0, 0.0);
        s.set_min_threshold(0.0, 0.0);
        s.set_max_threshold(100.0, 100.0);
        assert!(!s.is_identity());
        assert_eq!(s.convert(-5.0), 0.0);
        assert_eq!(s.convert(50.0), 100.0);
        assert_eq!(s.convert(200.0), 100.0);
    }

    #[test]
    fn test_identity_flag_recomputed() {
        let mut s = ValueScale::new();
        s.set_translation(1.0);
        assert!(!s.is_identity());
        s.set_translation(0.0);
        assert!(s.is_identity());
        s.set_min_threshold(0.0, 0.0);
        assert!(!s.is_identity());
        s.clear_thresholds();
        assert!(s.is_identity());
    }

    #[test]
    fn test_apply_inverse_ignores_thresholds() {
        let mut s = ValueScale::with_scale(4.0, 1.0);
        s.set_max_threshold(10.0, 0.0);
        assert_eq!(s.apply_inverse(s.convert(2.0)), 2.0);
        assert_eq!(s.apply_inverse(0.0), -1.0);
    }

    #[test]
    fn test_fit_data_in_range() {
        let mut s = ValueScale::new();
        s.set_to_fit_data_in_range(-100.0, 100.0, 0.0, 255.0, true);
        assert!((s.convert(-100.0) - 0.0).abs() < 1e-9);
        assert!((s.convert(100.0) - 255.0).abs() < 1e-9);
        assert_eq!(s.convert(-500.0), 0.0);
        assert_eq!(s.convert(500.0), 255.0);
    }

    #[test]
    fn test_fit_reversed_range() {
        let mut s = ValueScale::new();
        s.set_to_fit_data_in_range(10.0, 0.0, 0.0, 100.0, true);
        assert!((s.convert(10.0) - 0.0).abs() < 1e-9);
        assert!((s.convert(0.0) - 100.0).abs() < 1e-9);
        assert_eq!(s.convert(20.0), 0.0);
        assert_eq!(s.convert(-1.0), 100.0);
    }

    #[test]
    fn test_fit_degenerate_range_clamps_scale() {
        let mut s = ValueScale::new();
        s.set_to_fit_data_in_range(5.0, 5.0, 0.0, 255.0, false);
        assert_eq!(s.scale_factor(), 1.0);
        assert_eq!(s.convert(5.0), 0.0);
    }

    #[test]
    fn test_max_res_for_integer_and_float() {
        let mut s = ValueScale::new();
        s.set_scale_factor_for_max_res(0.0, 1.0, VoxelType::UnsignedByte);
        assert!((s.convert(1.0) - 255.0).abs() < 1e-9);
        assert!((s.quantification() - 1.0 / 255.0).abs() < 1e-12);

        s.set_scale_factor_for_max_res(0.0, 1.0, VoxelType::Float);
        assert!(s.is_identity());
    }

    #[test]
    fn test_concatenate() {
        let a = ValueScale::with_scale(2.0, 1.0);
        let b = ValueScale::with_scale(3.0, -4.0);
        let c = a.concatenate(&b);
        for v in [-3.0, 0.0, 2.5, 10.0] {
            assert!((c.convert(v) - b.convert(a.convert(v))).abs() < 1e-9);
        }
    }

    #[test]
    fn test_serde_restores_identity_flag() {
        let mut s = ValueScale::with_scale(2.0, 0.5);
        s.set_min_threshold(0.0, 0.0);
        let json = serde_json::to_string(&s).unwrap();
        let back: ValueScale = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);

        let identity: ValueScale =
            serde_json::from_str(&serde_json::to_string(&ValueScale::new()).unwrap()).unwrap();
        assert!(identity.is_identity());
    }
}
