//! Shape descriptors for parameters and gradients.
//!
//! A [`Shape`] is an ordered sequence of dimension sizes. Sparse gradients
//! address the leading dimension, so the shape also exposes the row count and
//! the flattened length of one row.

use std::fmt;
use std::ops::Index;

/// The shape (dimensions) of a parameter or gradient.
///
/// # Examples
///
/// ```
/// use lazy_adam::Shape;
///
/// let shape = Shape::matrix(3, 4);
/// assert_eq!(shape.ndim(), 2);
/// assert_eq!(shape.numel(), 12);
/// assert_eq!(shape.rows(), 3);
/// assert_eq!(shape.row_len(), 4);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1D shape (vector).
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank) of the shape.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of the leading dimension, or 1 for a scalar shape.
    ///
    /// Sparse gradient indices address rows of this dimension.
    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(1)
    }

    /// Returns the flattened length of one row (the product of all trailing
    /// dimensions; 1 for vectors and scalars).
    pub fn row_len(&self) -> usize {
        if self.dims.len() <= 1 {
            1
        } else {
            self.dims[1..].iter().product()
        }
    }

    /// Returns the dimensions as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.dims
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, ")")
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_accessors() {
        let shape = Shape::new(vec![2, 3, 4]);
        assert_eq!(shape.ndim(), 3);
        assert_eq!(shape.numel(), 24);
        assert_eq!(shape.rows(), 2);
        assert_eq!(shape.row_len(), 12);
        assert_eq!(shape[1], 3);
    }

    #[test]
    fn test_shape_vector_rows() {
        let shape = Shape::vector(5);
        assert_eq!(shape.rows(), 5);
        assert_eq!(shape.row_len(), 1);
        assert_eq!(shape.numel(), 5);
    }

    #[test]
    fn test_shape_scalar_rows() {
        let shape = Shape::new(vec![]);
        assert_eq!(shape.numel(), 1);
        assert_eq!(shape.rows(), 1);
        assert_eq!(shape.row_len(), 1);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(format!("{}", Shape::matrix(2, 1)), "(2, 1)");
        assert_eq!(format!("{}", Shape::vector(3)), "(3)");
    }

    #[test]
    fn test_shape_from_conversions() {
        let a: Shape = vec![2, 3].into();
        let b: Shape = [2, 3].into();
        assert_eq!(a, b);
    }
}
