//! Floating-point element types supported by the optimizer.
//!
//! Parameters, gradients, and accumulators are stored in one of three
//! precisions: half ([`half::f16`]), single (`f32`), or double (`f64`).
//! The [`Element`] trait abstracts the arithmetic the update kernels need so
//! they run in the parameter's own precision, rounding at every operation
//! exactly as the storage type would.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use half::f16;

/// Floating-point data types supported by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 16-bit (IEEE 754 half-precision) floating point.
    F16,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl DType {
    /// Returns the size of this data type in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F16 => 2,
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Returns a human-readable name for this data type.
    pub fn name(&self) -> &'static str {
        match self {
            DType::F16 => "float16",
            DType::F32 => "float32",
            DType::F64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A floating-point element the update kernels can operate on.
///
/// Implemented for [`half::f16`], `f32`, and `f64`. Scalar hyperparameters
/// are carried as `f64` and converted once per step via [`Element::from_f64`];
/// everything element-wise stays in `Self`.
pub trait Element:
    Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// The [`DType`] tag for this element type.
    const DTYPE: DType;

    /// Additive identity.
    const ZERO: Self;

    /// Converts from an `f64` scalar, rounding to this precision.
    fn from_f64(value: f64) -> Self;

    /// Widens to `f64`.
    fn to_f64(self) -> f64;

    /// Square root in this precision.
    fn sqrt(self) -> Self;
}

impl Element for f16 {
    const DTYPE: DType = DType::F16;
    const ZERO: Self = f16::ZERO;

    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn sqrt(self) -> Self {
        // f16 has no hardware sqrt; round-trip through f32 rounds once.
        f16::from_f32(self.to_f32().sqrt())
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
    const ZERO: Self = 0.0;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
    const ZERO: Self = 0.0;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size_and_name() {
        assert_eq!(DType::F16.size_in_bytes(), 2);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F16.name(), "float16");
        assert_eq!(format!("{}", DType::F64), "float64");
    }

    #[test]
    fn test_element_round_trip() {
        assert_eq!(f32::from_f64(0.5).to_f64(), 0.5);
        assert_eq!(f64::from_f64(0.001).to_f64(), 0.001);
        // Half rounds: 0.1 is not representable exactly.
        let h = f16::from_f64(0.1);
        assert!((h.to_f64() - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_element_sqrt() {
        assert_eq!(f64::sqrt(4.0), 2.0);
        assert_eq!(Element::sqrt(4.0f32), 2.0f32);
        assert_eq!(Element::sqrt(f16::from_f64(4.0)).to_f64(), 2.0);
    }

    #[test]
    fn test_element_dtype_tags() {
        assert_eq!(f16::DTYPE, DType::F16);
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(f64::DTYPE, DType::F64);
    }
}
