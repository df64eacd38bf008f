//! Three-component vector used for both locations and displacements.
//!
//! Voxel indices, physical points, resolutions and step vectors all travel
//! through the engine as `Vector3`. Mutation happens in place so the
//! resampling loops can accumulate steps without allocating.

use nalgebra::Vector3 as NaVector3;
use serde::{Deserialize, Serialize};

/// A mutable 3-component double vector.
///
/// Thin wrapper around nalgebra's `Vector3<f64>`; the inner value is public
/// so matrix code can use nalgebra operations directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3(pub NaVector3<f64>);

impl Vector3 {
    /// Create a new vector from components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(NaVector3::new(x, y, z))
    }

    /// Create a zero vector.
    pub fn zeros() -> Self {
        Self(NaVector3::zeros())
    }

    /// Create a vector with every component set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Create a vector from the first three entries of a slice.
    ///
    /// Missing entries are filled with `fill`, so 2-D resolutions can be
    /// lifted into 3-D.
    pub fn from_slice_or(components: &[f64], fill: f64) -> Self {
        let mut v = Self::uniform(fill);
        for (i, c) in components.iter().take(3).enumerate() {
            v.0[i] = *c;
        }
        v
    }

    /// Create a vector from integer voxel indices.
    pub fn from_indices(indices: &[i64]) -> Self {
        let mut v = Self::zeros();
        for (i, c) in indices.iter().take(3).enumerate() {
            v.0[i] = *c as f64;
        }
        v
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Add `other` to this vector in place.
    pub fn add_in_place(&mut self, other: &Vector3) {
        self.0 += other.0;
    }

    /// Multiply every component by `factor` in place.
    pub fn scale_in_place(&mut self, factor: f64) {
        self.0 *= factor;
    }

    /// Component-wise multiply in place.
    pub fn multiply_each(&mut self, other: &Vector3) {
        self.0.component_mul_assign(&other.0);
    }

    /// Component-wise divide in place. Zero divisors leave the component alone.
    pub fn divide_each(&mut self, other: &Vector3) {
        for i in 0..3 {
            if other.0[i] != 0.0 {
                self.0[i] /= other.0[i];
            }
        }
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// Round each component to the nearest voxel index (half away from zero).
    pub fn round_to_indices(&self) -> [i64; 3] {
        [
            self.0.x.round() as i64,
            self.0.y.round() as i64,
            self.0.z.round() as i64,
        ]
    }

    /// Convert to a plain array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    /// Check closeness within an absolute tolerance per component.
    pub fn approx_eq(&self, other: &Vector3, tolerance: f64) -> bool {
        (0..3).all(|i| (self.0[i] - other.0[i]).abs() <= tolerance)
    }

    pub fn inner(&self) -> &NaVector3<f64> {
        &self.0
    }
}

impl Default for Vector3 {
    fn default() -> Self {
        Self::zeros()
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl std::ops::Index<usize> for Vector3 {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for Vector3 {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl std::ops::Add for Vector3 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl std::ops::Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl std::ops::Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl std::fmt::Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}
