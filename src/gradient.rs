//! Dense and sparse gradient representations.
//!
//! A [`SparseGradient`] carries (index, value-row) pairs plus the dense shape
//! they address. Indices may repeat within one gradient (the same embedding
//! row receiving several contributions in a batch); [`SparseGradient::aggregate`]
//! folds duplicates into one row per index before the update rule runs.

use std::collections::HashMap;

use crate::dtype::Element;
use crate::error::{OptimizerError, Result};
use crate::shape::Shape;

/// A gradient for one parameter, tagged by representation.
///
/// The optimizer dispatches on this tag: dense gradients update every
/// element, sparse gradients update only the rows their indices name.
#[derive(Debug, Clone)]
pub enum Gradient<E: Element> {
    /// A gradient covering the full parameter shape.
    Dense(DenseGradient<E>),
    /// A gradient covering only the rows listed in its indices.
    Sparse(SparseGradient<E>),
}

impl<E: Element> Gradient<E> {
    /// Convenience constructor for a dense gradient.
    pub fn dense(values: Vec<E>) -> Self {
        Gradient::Dense(DenseGradient::new(values))
    }

    /// Convenience constructor for a sparse gradient.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::SparseRowMismatch`] if `values` does not
    /// hold exactly one row per index.
    pub fn sparse(
        indices: Vec<usize>,
        values: Vec<E>,
        dense_shape: impl Into<Shape>,
    ) -> Result<Self> {
        Ok(Gradient::Sparse(SparseGradient::new(
            indices,
            values,
            dense_shape,
        )?))
    }
}

/// A gradient matching its parameter's shape exactly.
#[derive(Debug, Clone)]
pub struct DenseGradient<E: Element> {
    values: Vec<E>,
}

impl<E: Element> DenseGradient<E> {
    /// Creates a dense gradient from flat row-major values.
    pub fn new(values: Vec<E>) -> Self {
        Self { values }
    }

    /// Returns the gradient values.
    pub fn values(&self) -> &[E] {
        &self.values
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the gradient has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<E: Element> From<Vec<E>> for DenseGradient<E> {
    fn from(values: Vec<E>) -> Self {
        Self::new(values)
    }
}

/// A sparse gradient: row indices into the leading dimension of a parameter,
/// one flat row of values per index, and the dense shape being addressed.
///
/// # Examples
///
/// ```
/// use lazy_adam::SparseGradient;
///
/// // Row 1 contributes twice; aggregation sums the rows.
/// let grad = SparseGradient::new(vec![1, 1], vec![0.1f32, 0.1], [2, 1]).unwrap();
/// let agg = grad.aggregate();
/// assert_eq!(agg.indices(), &[1]);
/// assert_eq!(agg.values(), &[0.2f32]);
/// ```
#[derive(Debug, Clone)]
pub struct SparseGradient<E: Element> {
    indices: Vec<usize>,
    values: Vec<E>,
    dense_shape: Shape,
}

impl<E: Element> SparseGradient<E> {
    /// Creates a sparse gradient.
    ///
    /// `values` is row-major: `indices.len()` rows of `dense_shape.row_len()`
    /// elements each.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::SparseRowMismatch`] if the value buffer
    /// length is not `indices.len() * dense_shape.row_len()`.
    pub fn new(indices: Vec<usize>, values: Vec<E>, dense_shape: impl Into<Shape>) -> Result<Self> {
        let dense_shape = dense_shape.into();
        let expected = indices.len() * dense_shape.row_len();
        if values.len() != expected {
            return Err(OptimizerError::SparseRowMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            indices,
            values,
            dense_shape,
        })
    }

    /// Returns the row indices (possibly with duplicates).
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the flat row-major values.
    pub fn values(&self) -> &[E] {
        &self.values
    }

    /// Returns the dense shape this gradient addresses.
    pub fn dense_shape(&self) -> &Shape {
        &self.dense_shape
    }

    /// Returns the flattened length of one value row.
    pub fn row_len(&self) -> usize {
        self.dense_shape.row_len()
    }

    /// Returns the value row for the `k`-th index entry.
    pub fn row(&self, k: usize) -> &[E] {
        let row_len = self.row_len();
        &self.values[k * row_len..(k + 1) * row_len]
    }

    /// Folds duplicate indices into a gradient with strictly unique indices,
    /// summing the value rows of each duplicate. First-occurrence order is
    /// preserved. Aggregating an already-unique gradient returns an equal
    /// gradient.
    ///
    /// Duplicates must be combined before the update rule runs: applying
    /// them as separate sequential updates would decay the moment
    /// accumulators once per duplicate instead of once per step.
    pub fn aggregate(&self) -> SparseGradient<E> {
        let row_len = self.row_len();
        let mut unique_indices = Vec::new();
        let mut index_to_slot: HashMap<usize, usize> = HashMap::new();
        let mut aggregated: Vec<E> = Vec::new();

        for (k, &index) in self.indices.iter().enumerate() {
            let row = self.row(k);
            if let Some(&slot) = index_to_slot.get(&index) {
                let start = slot * row_len;
                for (j, &g) in row.iter().enumerate() {
                    aggregated[start + j] = aggregated[start + j] + g;
                }
            } else {
                index_to_slot.insert(index, unique_indices.len());
                unique_indices.push(index);
                aggregated.extend_from_slice(row);
            }
        }

        debug_assert_eq!(aggregated.len(), unique_indices.len() * row_len);
        SparseGradient {
            indices: unique_indices,
            values: aggregated,
            dense_shape: self.dense_shape.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_row_mismatch() {
        let err = SparseGradient::new(vec![0, 1], vec![1.0f32, 2.0, 3.0], [4, 2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sparse gradient has 3 values, expected 4"
        );
    }

    #[test]
    fn test_aggregate_sums_duplicates() {
        let grad = SparseGradient::new(
            vec![1, 2, 1],
            vec![
                1.0f32, 2.0, // row for index 1 (first)
                3.0, 4.0, // row for index 2
                0.5, 0.5, // row for index 1 (second)
            ],
            [4, 2],
        )
        .unwrap();

        let agg = grad.aggregate();
        assert_eq!(agg.indices(), &[1, 2]);
        assert_eq!(agg.values(), &[1.5, 2.5, 3.0, 4.0]);
        assert_eq!(agg.dense_shape(), &Shape::matrix(4, 2));
    }

    #[test]
    fn test_aggregate_is_idempotent_on_unique_indices() {
        let grad =
            SparseGradient::new(vec![3, 0, 2], vec![1.0f32, 2.0, 3.0], [4]).unwrap();
        let agg = grad.aggregate();
        assert_eq!(agg.indices(), grad.indices());
        assert_eq!(agg.values(), grad.values());
    }

    #[test]
    fn test_aggregate_preserves_first_occurrence_order() {
        let grad = SparseGradient::new(
            vec![5, 1, 5, 3, 1],
            vec![1.0f32, 1.0, 1.0, 1.0, 1.0],
            [8],
        )
        .unwrap();
        let agg = grad.aggregate();
        assert_eq!(agg.indices(), &[5, 1, 3]);
        assert_eq!(agg.values(), &[2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_row_accessor() {
        let grad = SparseGradient::new(vec![0, 2], vec![1.0f32, 2.0, 3.0, 4.0], [3, 2]).unwrap();
        assert_eq!(grad.row(0), &[1.0, 2.0]);
        assert_eq!(grad.row(1), &[3.0, 4.0]);
        assert_eq!(grad.row_len(), 2);
    }
}
