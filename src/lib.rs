//! Adam optimizer with lazy updates for sparse gradients.
//!
//! Standard Adam decays its first and second moment accumulators for every
//! element of a parameter on every step. For embedding-style parameters where
//! only a handful of rows receive gradients per step that is wasteful and
//! changes the semantics: rows that were never part of the batch still have
//! their momentum pulled toward zero. [`LazyAdam`] instead applies the update
//! only at the rows present in a [`SparseGradient`], leaving every other
//! row's parameter values and accumulators bit-for-bit untouched, while
//! remaining identical to dense Adam whenever the gradient covers every row.
//!
//! Duplicate indices inside one sparse gradient (the same row contributing
//! several times in one batch) are summed before the update runs, so the
//! accumulators decay exactly once per logical step.
//!
//! Parameters may be stored in half ([`half::f16`]), single, or double
//! precision; the update arithmetic runs in the parameter's own precision.
//!
//! # Example
//!
//! ```
//! use lazy_adam::{AdamConfig, Gradient, LazyAdam, Parameter};
//!
//! let optimizer = LazyAdam::<f32>::new(AdamConfig::default()).unwrap();
//!
//! // A 4-row embedding table; only rows 0 and 2 appear in this batch.
//! let mut table = Parameter::new("table", [4, 2], vec![1.0f32; 8]).unwrap();
//! optimizer.register(&table).unwrap();
//!
//! let grad = Gradient::sparse(vec![0, 2], vec![0.1f32, 0.1, 0.1, 0.1], [4, 2]).unwrap();
//! optimizer.apply(&mut [(&mut table, grad)]).unwrap();
//!
//! // Rows 1 and 3 are untouched, accumulators included.
//! assert_eq!(&table.values()[2..4], &[1.0, 1.0]);
//! assert!(table.values()[0] < 1.0);
//! assert_eq!(optimizer.current_step(), 1);
//! ```

mod dtype;
mod error;
mod gradient;
mod optimizer;
mod param;
mod schedule;
mod shape;
mod step;
mod update;

pub use dtype::{DType, Element};
pub use error::{OptimizerError, Result};
pub use gradient::{DenseGradient, Gradient, SparseGradient};
pub use optimizer::LazyAdam;
pub use param::Parameter;
pub use schedule::{AdamConfig, HyperParam};
pub use shape::Shape;
pub use step::{beta_power, StepCounter};
