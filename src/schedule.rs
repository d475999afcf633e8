//! Hyperparameter configuration and schedules.
//!
//! Each Adam hyperparameter is a [`HyperParam`]: either a fixed value or a
//! zero-argument function re-evaluated once per `apply` call, which is how
//! schedules (decaying learning rates and the like) plug in without the
//! optimizer knowing about them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

/// Configuration for a [`LazyAdam`](crate::LazyAdam) optimizer.
///
/// All values are fixed scalars; use the optimizer's `with_*` builders to
/// swap any of them for a schedule after construction.
///
/// # Examples
///
/// ```
/// use lazy_adam::AdamConfig;
///
/// let config = AdamConfig::default();
/// assert_eq!(config.learning_rate, 0.001);
/// assert_eq!(config.beta1, 0.9);
/// assert_eq!(config.beta2, 0.999);
/// assert_eq!(config.epsilon, 1e-7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Learning rate for gradient updates.
    pub learning_rate: f64,
    /// Exponential decay rate for first moment estimates.
    pub beta1: f64,
    /// Exponential decay rate for second moment estimates.
    pub beta2: f64,
    /// Small constant for numerical stability.
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

impl AdamConfig {
    /// Creates a config with the given learning rate and default decay rates.
    pub fn with_learning_rate(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..Self::default()
        }
    }

    /// Validates all hyperparameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvalidHyperparameter`] naming the first
    /// value outside its range.
    pub fn validate(&self) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        check_beta("beta1", self.beta1)?;
        check_beta("beta2", self.beta2)?;
        check_epsilon(self.epsilon)
    }
}

fn check_learning_rate(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(OptimizerError::InvalidHyperparameter {
            name: "learning_rate",
            value,
            constraint: "must be finite",
        });
    }
    Ok(())
}

fn check_beta(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..1.0).contains(&value) {
        return Err(OptimizerError::InvalidHyperparameter {
            name,
            value,
            constraint: "must be in [0, 1)",
        });
    }
    Ok(())
}

fn check_epsilon(value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(OptimizerError::InvalidHyperparameter {
            name: "epsilon",
            value,
            constraint: "must be positive and finite",
        });
    }
    Ok(())
}

/// A hyperparameter value: fixed, or produced by a schedule.
///
/// Schedules are zero-argument closures evaluated once per `apply` call (and
/// by the optimizer's read accessors), so a stateful schedule observes every
/// step.
///
/// # Examples
///
/// ```
/// use lazy_adam::HyperParam;
///
/// let fixed: HyperParam = 0.01.into();
/// assert_eq!(fixed.value(), 0.01);
///
/// let scheduled = HyperParam::schedule(|| 0.5);
/// assert_eq!(scheduled.value(), 0.5);
/// ```
#[derive(Clone)]
pub enum HyperParam {
    /// A fixed scalar value.
    Fixed(f64),
    /// A schedule evaluated at each use.
    Schedule(Arc<dyn Fn() -> f64 + Send + Sync>),
}

impl HyperParam {
    /// Wraps a zero-argument schedule function.
    pub fn schedule<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        HyperParam::Schedule(Arc::new(f))
    }

    /// Returns the current value.
    pub fn value(&self) -> f64 {
        match self {
            HyperParam::Fixed(v) => *v,
            HyperParam::Schedule(f) => f(),
        }
    }
}

impl fmt::Debug for HyperParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperParam::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            HyperParam::Schedule(_) => f.write_str("Schedule(..)"),
        }
    }
}

impl From<f64> for HyperParam {
    fn from(value: f64) -> Self {
        HyperParam::Fixed(value)
    }
}

/// The four hyperparameters of one optimizer instance.
#[derive(Debug, Clone)]
pub(crate) struct HyperSet {
    pub learning_rate: HyperParam,
    pub beta1: HyperParam,
    pub beta2: HyperParam,
    pub epsilon: HyperParam,
}

impl HyperSet {
    pub fn from_config(config: &AdamConfig) -> Self {
        Self {
            learning_rate: HyperParam::Fixed(config.learning_rate),
            beta1: HyperParam::Fixed(config.beta1),
            beta2: HyperParam::Fixed(config.beta2),
            epsilon: HyperParam::Fixed(config.epsilon),
        }
    }

    /// Evaluates every hyperparameter once and re-checks its range; schedule
    /// outputs can only be validated here.
    pub fn resolve(&self) -> Result<ResolvedHyper> {
        let resolved = ResolvedHyper {
            learning_rate: self.learning_rate.value(),
            beta1: self.beta1.value(),
            beta2: self.beta2.value(),
            epsilon: self.epsilon.value(),
        };
        check_learning_rate(resolved.learning_rate)?;
        check_beta("beta1", resolved.beta1)?;
        check_beta("beta2", resolved.beta2)?;
        check_epsilon(resolved.epsilon)?;
        Ok(resolved)
    }
}

/// Hyperparameter values captured for one optimization step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedHyper {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_validate() {
        AdamConfig::default().validate().unwrap();
        AdamConfig::with_learning_rate(3.0).validate().unwrap();
    }

    #[test]
    fn test_config_rejects_out_of_range_beta() {
        let config = AdamConfig {
            beta1: 1.0,
            ..AdamConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid hyperparameter beta1=1: must be in [0, 1)"
        );

        let config = AdamConfig {
            beta2: -0.1,
            ..AdamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_bad_epsilon_and_lr() {
        let config = AdamConfig {
            epsilon: 0.0,
            ..AdamConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AdamConfig {
            learning_rate: f64::NAN,
            ..AdamConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schedule_reevaluated_per_call() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let calls = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&calls);
        let hyper = HyperParam::schedule(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            0.001
        });

        assert_eq!(hyper.value(), 0.001);
        assert_eq!(hyper.value(), 0.001);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolve_rejects_bad_schedule_output() {
        let set = HyperSet {
            learning_rate: HyperParam::Fixed(0.001),
            beta1: HyperParam::schedule(|| 2.0),
            beta2: HyperParam::Fixed(0.999),
            epsilon: HyperParam::Fixed(1e-8),
        };
        assert!(set.resolve().is_err());
    }
}
