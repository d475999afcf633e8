//! Error types for the lazy-adam crate.
//!
//! All fallible operations return [`Result`], with structured error variants
//! carrying enough context to identify the offending parameter or value.

use thiserror::Error;

use crate::shape::Shape;

/// The error type for optimizer operations.
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// A hyperparameter is outside its valid range.
    #[error("Invalid hyperparameter {name}={value}: {constraint}")]
    InvalidHyperparameter {
        /// Name of the hyperparameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// The constraint that was violated.
        constraint: &'static str,
    },

    /// The parameter is already registered with a different optimizer
    /// instance, so its accumulator state would alias.
    #[error("Parameter {param} is already registered with a different optimizer")]
    AlreadyRegistered {
        /// Name of the parameter.
        param: String,
    },

    /// An operation referenced a parameter that was never registered.
    #[error("Parameter {param} is not registered with this optimizer")]
    UnregisteredParameter {
        /// Name of the parameter.
        param: String,
    },

    /// A gradient's shape is incompatible with its parameter.
    #[error("Shape mismatch for {param}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the parameter.
        param: String,
        /// The parameter's shape.
        expected: Shape,
        /// The gradient's shape.
        actual: Shape,
    },

    /// A sparse gradient's value buffer does not cover its indices.
    #[error("Sparse gradient has {actual} values, expected {expected}")]
    SparseRowMismatch {
        /// `indices.len() * row_len` of the dense shape.
        expected: usize,
        /// Length of the value buffer provided.
        actual: usize,
    },

    /// A sparse index addresses a row outside the parameter.
    #[error("Index {index} out of range for {param} with {rows} rows")]
    IndexOutOfRange {
        /// Name of the parameter.
        param: String,
        /// The offending index.
        index: usize,
        /// Number of rows in the parameter.
        rows: usize,
    },

    /// A slot accessor was given a name other than `"m"` or `"v"`.
    #[error("Unknown slot {name:?}: expected \"m\" or \"v\"")]
    UnknownSlot {
        /// The rejected slot name.
        name: String,
    },

    /// `apply` was called with no parameter/gradient pairs.
    #[error("No parameter updates provided")]
    EmptyStep,
}

/// A specialized Result type for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OptimizerError::InvalidHyperparameter {
            name: "beta1",
            value: 1.5,
            constraint: "must be in [0, 1)",
        };
        assert_eq!(
            err.to_string(),
            "Invalid hyperparameter beta1=1.5: must be in [0, 1)"
        );

        let err = OptimizerError::ShapeMismatch {
            param: "embedding".to_string(),
            expected: Shape::matrix(4, 2),
            actual: Shape::vector(8),
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch for embedding: expected (4, 2), got (8)"
        );

        let err = OptimizerError::IndexOutOfRange {
            param: "embedding".to_string(),
            index: 7,
            rows: 4,
        };
        assert_eq!(
            err.to_string(),
            "Index 7 out of range for embedding with 4 rows"
        );

        let err = OptimizerError::UnknownSlot {
            name: "momentum".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown slot \"momentum\": expected \"m\" or \"v\""
        );
    }
}
