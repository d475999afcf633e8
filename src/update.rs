//! Dense and lazy-sparse Adam update kernels.
//!
//! Both kernels share one per-element formula:
//!
//! ```text
//! lr_t = learning_rate * sqrt(1 - beta2^(t+1)) / (1 - beta1^(t+1))
//! m' = beta1 * m + (1 - beta1) * g
//! v' = beta2 * v + (1 - beta2) * g^2
//! p' = p - lr_t * m' / (sqrt(v') + epsilon)
//! ```
//!
//! The dense kernel applies it to every element. The lazy kernel applies it
//! only to the rows named by an aggregated sparse gradient and leaves every
//! other element of `p`, `m`, `v` unread and unwritten, so rows absent from
//! the gradient keep their accumulators frozen instead of decaying toward
//! zero. A row that is present with a zero-valued gradient still decays.
//!
//! Non-finite gradients are not trapped; NaN and Inf propagate through the
//! arithmetic unchanged.

use crate::dtype::Element;
use crate::gradient::SparseGradient;
use crate::schedule::ResolvedHyper;
use crate::step::beta_power;

/// Scalar coefficients for one step, pre-cast to the element type.
///
/// The bias-corrected learning rate and the decay constants depend only on
/// the hyperparameters and the step, so they are computed once per
/// (step, parameter-dtype) and shared by every element updated in that step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AdamCoefficients<E: Element> {
    beta1: E,
    one_minus_beta1: E,
    beta2: E,
    one_minus_beta2: E,
    lr_t: E,
    epsilon: E,
}

impl<E: Element> AdamCoefficients<E> {
    /// Builds the coefficients for the step about to complete.
    pub fn new(hyper: &ResolvedHyper, step: u64) -> Self {
        let beta1_power = beta_power(hyper.beta1, step);
        let beta2_power = beta_power(hyper.beta2, step);
        let lr_t = hyper.learning_rate * (1.0 - beta2_power).sqrt() / (1.0 - beta1_power);
        Self {
            beta1: E::from_f64(hyper.beta1),
            one_minus_beta1: E::from_f64(1.0 - hyper.beta1),
            beta2: E::from_f64(hyper.beta2),
            one_minus_beta2: E::from_f64(1.0 - hyper.beta2),
            lr_t: E::from_f64(lr_t),
            epsilon: E::from_f64(hyper.epsilon),
        }
    }
}

#[inline]
fn update_element<E: Element>(p: &mut E, m: &mut E, v: &mut E, g: E, c: &AdamCoefficients<E>) {
    let m_t = c.beta1 * *m + c.one_minus_beta1 * g;
    let v_t = c.beta2 * *v + c.one_minus_beta2 * g * g;
    *m = m_t;
    *v = v_t;
    *p = *p - c.lr_t * m_t / (v_t.sqrt() + c.epsilon);
}

/// Applies the Adam formula to every element of the parameter.
///
/// `param`, `m`, `v`, and `grad` must all have the same length.
pub(crate) fn apply_dense<E: Element>(
    param: &mut [E],
    m: &mut [E],
    v: &mut [E],
    grad: &[E],
    coefficients: &AdamCoefficients<E>,
) {
    debug_assert_eq!(param.len(), grad.len());
    debug_assert_eq!(param.len(), m.len());
    debug_assert_eq!(param.len(), v.len());

    for (i, &g) in grad.iter().enumerate() {
        update_element(&mut param[i], &mut m[i], &mut v[i], g, coefficients);
    }
}

/// Applies the Adam formula only at the rows named by `grad`.
///
/// `grad` must already be aggregated (unique indices) and its indices must be
/// in range; the optimizer validates both before dispatching here. Rows not
/// named by the gradient are neither read nor written.
pub(crate) fn apply_lazy<E: Element>(
    param: &mut [E],
    m: &mut [E],
    v: &mut [E],
    grad: &SparseGradient<E>,
    coefficients: &AdamCoefficients<E>,
) {
    let row_len = grad.row_len();
    for (k, &index) in grad.indices().iter().enumerate() {
        let row = grad.row(k);
        let start = index * row_len;
        for (j, &g) in row.iter().enumerate() {
            update_element(
                &mut param[start + j],
                &mut m[start + j],
                &mut v[start + j],
                g,
                coefficients,
            );
        }
    }
}
