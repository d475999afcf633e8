//! The lazy Adam optimizer façade.
//!
//! [`LazyAdam`] binds registered parameters to their moment accumulators,
//! owns one shared step counter, and routes each incoming gradient to the
//! dense or lazy-sparse update kernel based on its representation.
//!
//! # Example
//!
//! ```
//! use lazy_adam::{AdamConfig, Gradient, LazyAdam, Parameter};
//!
//! let optimizer = LazyAdam::<f32>::new(AdamConfig::default()).unwrap();
//! let mut var = Parameter::vector("var", vec![1.0f32, 2.0]);
//! optimizer.register(&var).unwrap();
//!
//! let grad = Gradient::dense(vec![0.1f32, 0.1]);
//! optimizer.apply(&mut [(&mut var, grad)]).unwrap();
//!
//! assert_eq!(optimizer.current_step(), 1);
//! assert!(var.values()[0] < 1.0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::dtype::Element;
use crate::error::{OptimizerError, Result};
use crate::gradient::Gradient;
use crate::param::{MomentEntry, Parameter};
use crate::schedule::{AdamConfig, HyperParam, HyperSet};
use crate::step::{beta_power, StepCounter};
use crate::update::{apply_dense, apply_lazy, AdamCoefficients};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Adam optimizer that updates sparse gradients lazily.
///
/// Dense gradients receive the standard Adam update over the full parameter.
/// Sparse gradients update the moment accumulators and parameter values only
/// at the rows their indices name; all other rows stay bit-for-bit untouched
/// rather than having their accumulators decayed as a zero gradient would.
/// When a sparse gradient happens to cover every row, the result is identical
/// to the dense path.
///
/// All parameters registered with one instance share one step counter: each
/// [`apply`](LazyAdam::apply) call is one logical step regardless of how many
/// parameters it updates.
#[derive(Debug)]
pub struct LazyAdam<E: Element> {
    instance_id: u64,
    hyper: HyperSet,
    slots: RwLock<HashMap<u64, Mutex<MomentEntry<E>>>>,
    steps: StepCounter,
}

impl<E: Element> Default for LazyAdam<E> {
    fn default() -> Self {
        // Defaults are always in range.
        Self::new(AdamConfig::default()).expect("default config is valid")
    }
}

impl<E: Element> LazyAdam<E> {
    /// Creates an optimizer from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvalidHyperparameter`] if any value is out
    /// of range (`learning_rate` finite, `beta1`/`beta2` in `[0, 1)`,
    /// `epsilon` positive and finite).
    pub fn new(config: AdamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            hyper: HyperSet::from_config(&config),
            slots: RwLock::new(HashMap::new()),
            steps: StepCounter::new(),
        })
    }

    /// Replaces the learning rate with a fixed value or schedule.
    pub fn with_learning_rate(mut self, learning_rate: impl Into<HyperParam>) -> Self {
        self.hyper.learning_rate = learning_rate.into();
        self
    }

    /// Replaces `beta1` with a fixed value or schedule.
    pub fn with_beta1(mut self, beta1: impl Into<HyperParam>) -> Self {
        self.hyper.beta1 = beta1.into();
        self
    }

    /// Replaces `beta2` with a fixed value or schedule.
    pub fn with_beta2(mut self, beta2: impl Into<HyperParam>) -> Self {
        self.hyper.beta2 = beta2.into();
        self
    }

    /// Replaces `epsilon` with a fixed value or schedule.
    pub fn with_epsilon(mut self, epsilon: impl Into<HyperParam>) -> Self {
        self.hyper.epsilon = epsilon.into();
        self
    }

    /// Registers a parameter, creating its zero-initialized moment
    /// accumulators the first time it is seen.
    ///
    /// Repeated registration of the same parameter is idempotent and keeps
    /// the existing accumulators.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::AlreadyRegistered`] if the parameter is
    /// registered with a different optimizer instance.
    pub fn register(&self, param: &Parameter<E>) -> Result<()> {
        param.bind(self.instance_id)?;
        let mut slots = self.slots.write();
        slots
            .entry(param.uid())
            .or_insert_with(|| Mutex::new(MomentEntry::zeros(param.shape().numel())));
        Ok(())
    }

    /// Applies one logical optimization step to a batch of
    /// (parameter, gradient) pairs.
    ///
    /// Every pair is validated before anything is mutated; if any pair fails,
    /// no parameter is touched and the step counter does not advance, so no
    /// parameter can end up a step ahead of the others on the shared
    /// bias-correction schedule. The step value is read once and used for
    /// every pair; the counter advances exactly once after all pairs are
    /// applied. Pairs touch disjoint state and are applied in parallel.
    ///
    /// # Errors
    ///
    /// * [`OptimizerError::EmptyStep`] - no pairs were provided
    /// * [`OptimizerError::UnregisteredParameter`] - a parameter was never
    ///   registered with this instance
    /// * [`OptimizerError::ShapeMismatch`] - a gradient does not match its
    ///   parameter's shape
    /// * [`OptimizerError::SparseRowMismatch`] /
    ///   [`OptimizerError::IndexOutOfRange`] - malformed sparse gradient
    /// * [`OptimizerError::InvalidHyperparameter`] - a schedule produced an
    ///   out-of-range value
    pub fn apply(&self, updates: &mut [(&mut Parameter<E>, Gradient<E>)]) -> Result<()> {
        if updates.is_empty() {
            return Err(OptimizerError::EmptyStep);
        }

        let hyper = self.hyper.resolve()?;
        let slots = self.slots.read();
        for (param, gradient) in updates.iter() {
            self.validate_pair(&slots, param, gradient)?;
        }

        let step = self.steps.current();
        let coefficients = AdamCoefficients::<E>::new(&hyper, step);

        updates.par_iter_mut().for_each(|(param, gradient)| {
            let entry = slots
                .get(&param.uid())
                .expect("pair validated as registered");
            let mut entry = entry.lock();
            let entry = &mut *entry;
            match gradient {
                Gradient::Dense(dense) => apply_dense(
                    param.values_mut(),
                    &mut entry.m,
                    &mut entry.v,
                    dense.values(),
                    &coefficients,
                ),
                Gradient::Sparse(sparse) => {
                    let aggregated = sparse.aggregate();
                    apply_lazy(
                        param.values_mut(),
                        &mut entry.m,
                        &mut entry.v,
                        &aggregated,
                        &coefficients,
                    );
                }
            }
        });

        let completed = self.steps.advance();
        tracing::debug!(
            step = completed,
            params = updates.len(),
            "applied optimization step"
        );
        Ok(())
    }

    fn validate_pair(
        &self,
        slots: &HashMap<u64, Mutex<MomentEntry<E>>>,
        param: &Parameter<E>,
        gradient: &Gradient<E>,
    ) -> Result<()> {
        if !slots.contains_key(&param.uid()) {
            return Err(OptimizerError::UnregisteredParameter {
                param: param.name().to_string(),
            });
        }
        match gradient {
            Gradient::Dense(dense) => {
                if dense.len() != param.shape().numel() {
                    return Err(OptimizerError::ShapeMismatch {
                        param: param.name().to_string(),
                        expected: param.shape().clone(),
                        actual: crate::shape::Shape::vector(dense.len()),
                    });
                }
            }
            Gradient::Sparse(sparse) => {
                if sparse.dense_shape() != param.shape() {
                    return Err(OptimizerError::ShapeMismatch {
                        param: param.name().to_string(),
                        expected: param.shape().clone(),
                        actual: sparse.dense_shape().clone(),
                    });
                }
                let rows = param.rows();
                if let Some(&index) = sparse.indices().iter().find(|&&index| index >= rows) {
                    return Err(OptimizerError::IndexOutOfRange {
                        param: param.name().to_string(),
                        index,
                        rows,
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns a snapshot of a parameter's `"m"` or `"v"` accumulator.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::UnregisteredParameter`] if the parameter is
    /// not registered here, or [`OptimizerError::UnknownSlot`] for any name
    /// other than `"m"` or `"v"`.
    pub fn slot(&self, param: &Parameter<E>, name: &str) -> Result<Vec<E>> {
        let slots = self.slots.read();
        let entry = slots
            .get(&param.uid())
            .ok_or_else(|| OptimizerError::UnregisteredParameter {
                param: param.name().to_string(),
            })?
            .lock();
        match name {
            "m" => Ok(entry.m.clone()),
            "v" => Ok(entry.v.clone()),
            _ => Err(OptimizerError::UnknownSlot {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the number of completed optimization steps.
    pub fn current_step(&self) -> u64 {
        self.steps.current()
    }

    /// Returns the number of registered parameters.
    pub fn num_parameters(&self) -> usize {
        self.slots.read().len()
    }

    /// Returns the current learning rate (schedules are evaluated).
    pub fn learning_rate(&self) -> f64 {
        self.hyper.learning_rate.value()
    }

    /// Returns the current `beta1` (schedules are evaluated).
    pub fn beta1(&self) -> f64 {
        self.hyper.beta1.value()
    }

    /// Returns the current `beta2` (schedules are evaluated).
    pub fn beta2(&self) -> f64 {
        self.hyper.beta2.value()
    }

    /// Returns the current `epsilon` (schedules are evaluated).
    pub fn epsilon(&self) -> f64 {
        self.hyper.epsilon.value()
    }

    /// Returns `beta1^(step + 1)` for the step about to complete.
    pub fn beta1_power(&self) -> f64 {
        beta_power(self.beta1(), self.current_step())
    }

    /// Returns `beta2^(step + 1)` for the step about to complete.
    pub fn beta2_power(&self) -> f64 {
        beta_power(self.beta2(), self.current_step())
    }
}
