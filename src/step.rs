//! Step counting and decay-power bookkeeping.
//!
//! One [`StepCounter`] is shared by every parameter registered with an
//! optimizer instance: it advances once per logical step, no matter how many
//! parameters that step updates. Decay powers are derived from the counter on
//! demand and never stored.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts completed optimization steps.
#[derive(Debug, Default)]
pub struct StepCounter {
    steps: AtomicU64,
}

impl StepCounter {
    /// Creates a counter at step 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of completed steps.
    pub fn current(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }

    /// Records one completed step and returns the new count.
    pub fn advance(&self) -> u64 {
        self.steps.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Returns `beta^(step + 1)`.
///
/// Bias-correction exponents are evaluated as of the step about to complete:
/// before any update the exponent is 1, not 0.
///
/// # Examples
///
/// ```
/// use lazy_adam::beta_power;
///
/// assert!((beta_power(0.9, 0) - 0.9).abs() < 1e-12);
/// assert!((beta_power(0.9, 1) - 0.81).abs() < 1e-12);
/// ```
pub fn beta_power(beta: f64, step: u64) -> f64 {
    beta.powf((step + 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_zero_and_advances_by_one() {
        let counter = StepCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_beta_power_schedule() {
        for (t, expected) in [(0u64, 0.9), (1, 0.81), (2, 0.729)] {
            assert!((beta_power(0.9, t) - expected).abs() < 1e-12);
        }
        assert!((beta_power(0.999, 1) - 0.998001).abs() < 1e-12);
        assert!((beta_power(0.999, 2) - 0.997002999).abs() < 1e-12);
    }

    #[test]
    fn test_concurrent_advances_are_counted_once_each() {
        use std::sync::Arc;

        let counter = Arc::new(StepCounter::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    counter.advance();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.current(), 800);
    }
}
