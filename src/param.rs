//! Parameters and their per-parameter optimizer state.
//!
//! A [`Parameter`] is a named, fixed-shape array of floating-point values.
//! It is owned by the caller; the optimizer mutates its values in place
//! during `apply` but never owns its lifetime. Identity is a process-unique
//! id assigned at construction, not the name string, so two parameters may
//! share a name without sharing accumulator state.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dtype::{DType, Element};
use crate::error::{OptimizerError, Result};
use crate::shape::Shape;

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

/// A named, fixed-shape, mutable array of floating-point values.
///
/// # Examples
///
/// ```
/// use lazy_adam::{DType, Parameter, Shape};
///
/// let param = Parameter::new("embedding", [3, 2], vec![0.0f32; 6]).unwrap();
/// assert_eq!(param.shape(), &Shape::matrix(3, 2));
/// assert_eq!(param.dtype(), DType::F32);
/// assert_eq!(param.rows(), 3);
/// ```
#[derive(Debug)]
pub struct Parameter<E: Element> {
    name: String,
    uid: u64,
    shape: Shape,
    values: Vec<E>,
    /// Instance id of the optimizer this parameter is registered with;
    /// 0 while unbound.
    bound_to: AtomicU64,
}

impl<E: Element> Parameter<E> {
    /// Creates a parameter with the given name, shape, and initial values.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::ShapeMismatch`] if `values.len()` does not
    /// equal the shape's element count.
    pub fn new(name: impl Into<String>, shape: impl Into<Shape>, values: Vec<E>) -> Result<Self> {
        let name = name.into();
        let shape = shape.into();
        if values.len() != shape.numel() {
            return Err(OptimizerError::ShapeMismatch {
                param: name,
                expected: shape,
                actual: Shape::vector(values.len()),
            });
        }
        Ok(Self {
            name,
            uid: NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed),
            shape,
            values,
            bound_to: AtomicU64::new(0),
        })
    }

    /// Creates a 1D parameter from a flat value vector.
    pub fn vector(name: impl Into<String>, values: Vec<E>) -> Self {
        let shape = Shape::vector(values.len());
        // Length always matches the shape built from it.
        Self::new(name, shape, values).expect("vector shape matches values")
    }

    /// Returns the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the element data type.
    pub fn dtype(&self) -> DType {
        E::DTYPE
    }

    /// Returns the number of rows in the leading dimension.
    pub fn rows(&self) -> usize {
        self.shape.rows()
    }

    /// Returns the flattened length of one row.
    pub fn row_len(&self) -> usize {
        self.shape.row_len()
    }

    /// Returns the current values.
    pub fn values(&self) -> &[E] {
        &self.values
    }

    /// Returns the values for in-place mutation.
    pub fn values_mut(&mut self) -> &mut [E] {
        &mut self.values
    }

    /// The process-unique identity of this parameter.
    pub(crate) fn uid(&self) -> u64 {
        self.uid
    }

    /// Binds this parameter to the given optimizer instance.
    ///
    /// Binding is first-writer-wins: a second bind from the same instance is
    /// an idempotent no-op, while one from a different instance fails so
    /// accumulator state never silently aliases across optimizers.
    pub(crate) fn bind(&self, instance_id: u64) -> Result<()> {
        match self.bound_to.compare_exchange(
            0,
            instance_id,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(()),
            Err(current) if current == instance_id => Ok(()),
            Err(_) => Err(OptimizerError::AlreadyRegistered {
                param: self.name.clone(),
            }),
        }
    }
}

/// First- and second-moment accumulators for one registered parameter.
///
/// Created zero-initialized the first time a parameter is registered, with
/// the same length and precision as the parameter, and destroyed with the
/// owning optimizer.
#[derive(Debug, Clone)]
pub(crate) struct MomentEntry<E: Element> {
    /// First moment estimate (mean of gradients).
    pub m: Vec<E>,
    /// Second moment estimate (mean of squared gradients).
    pub v: Vec<E>,
}

impl<E: Element> MomentEntry<E> {
    pub fn zeros(len: usize) -> Self {
        Self {
            m: vec![E::ZERO; len],
            v: vec![E::ZERO; len],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_shape_validation() {
        let err = Parameter::new("p", [2, 2], vec![1.0f32, 2.0, 3.0]).unwrap_err();
        assert_eq!(err.to_string(), "Shape mismatch for p: expected (2, 2), got (3)");
    }

    #[test]
    fn test_parameter_uids_are_unique() {
        let a = Parameter::vector("same_name", vec![1.0f32]);
        let b = Parameter::vector("same_name", vec![1.0f32]);
        assert_ne!(a.uid(), b.uid());
    }

    #[test]
    fn test_bind_is_idempotent_per_instance() {
        let param = Parameter::vector("p", vec![1.0f64, 2.0]);
        param.bind(7).unwrap();
        param.bind(7).unwrap();
        let err = param.bind(8).unwrap_err();
        assert!(matches!(err, OptimizerError::AlreadyRegistered { .. }));
    }

    #[test]
    fn test_moment_entry_zeros() {
        let entry = MomentEntry::<f32>::zeros(4);
        assert_eq!(entry.m, vec![0.0; 4]);
        assert_eq!(entry.v, vec![0.0; 4]);
    }
}
