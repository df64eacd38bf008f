//! Error types for coordinate mapping and reslicing operations.
//!
//! Most geometric queries in this crate are lenient and report failure
//! through `Option`; the variants here cover the cases where a caller
//! handed in something that cannot be used at all.

use crate::voxel::VoxelType;
use thiserror::Error;

/// Main error type for the reslicing engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResliceError {
    /// Malformed coordinate-map text.
    #[error("Format error at line {line} near `{token}`: {message}")]
    Format {
        line: usize,
        token: String,
        message: String,
    },

    /// Dimensions that cannot describe a volume.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Axis count or element range mismatch.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Voxel storage type mismatch.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: VoxelType,
        actual: VoxelType,
    },

    /// A transform that must be inverted has a singular linear part.
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// Voxel data accessed before `init_data_array`.
    #[error("Unallocated data: {0}")]
    Unallocated(String),

    /// Textual reconstruction failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Tensor data could not be read back.
    #[error("Tensor error: {0}")]
    Tensor(String),
}

/// Result type for reslicing operations.
pub type Result<T> = std::result::Result<T, ResliceError>;

impl ResliceError {
    /// Create a format error for the given line and token.
    pub fn format(line: usize, token: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Format {
            line,
            token: token.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid dimensions error.
    pub fn invalid_dimensions(msg: impl Into<String>) -> Self {
        Self::InvalidDimensions(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create a singular matrix error.
    pub fn singular_matrix(msg: impl Into<String>) -> Self {
        Self::SingularMatrix(msg.into())
    }

    /// Create an unallocated data error.
    pub fn unallocated(msg: impl Into<String>) -> Self {
        Self::Unallocated(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a tensor conversion error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }
}

impl From<serde_json::Error> for ResliceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = ResliceError::format(3, "Scal", "unknown directive");
        assert_eq!(
            err.to_string(),
            "Format error at line 3 near `Scal`: unknown directive"
        );
    }

    #[test]
    fn test_tensor_error_display() {
        let err = ResliceError::tensor("rank 2 for 3 axes");
        assert_eq!(err.to_string(), "Tensor error: rank 2 for 3 axes");
    }

    #[test]
    fn test_shape_mismatch() {
        let err = ResliceError::ShapeMismatch {
            expected: vec![10, 10],
            actual: vec![5, 5],
        };
        let err_str = err.to_string();
        assert!(err_str.contains("expected"));
        assert!(err_str.contains("got"));
    }

    #[test]
    fn test_type_mismatch_names_types() {
        let err = ResliceError::TypeMismatch {
            expected: VoxelType::Short,
            actual: VoxelType::Float,
        };
        assert_eq!(err.to_string(), "Type mismatch: expected short, got float");
    }
}
