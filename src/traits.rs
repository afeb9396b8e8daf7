use crate::common::{Evaluation, Progress};
use ndarray::{Array1, ArrayView1};

/// Objective and inequality constraint functions of a minimization problem.
///
/// The number of constraints is discovered from the evaluation at the
/// initial point and must not change during a run.
pub trait Evaluator {
    /// Evaluates the objective value, the constraint values, the objective
    /// gradient and the constraint Jacobian at `x`.
    fn evaluate(&self, x: ArrayView1<f64>) -> anyhow::Result<Evaluation>;

    /// Evaluates only the objective value at `x`.
    fn value(&self, x: ArrayView1<f64>) -> anyhow::Result<f64> {
        Ok(self.evaluate(x)?.value)
    }
}

/// Called on each iteration of the solver with the progress snapshot,
/// the updated point and the updated multipliers.
pub trait ProgressMonitor {
    fn update(&self, progress: &Progress, x: ArrayView1<f64>, multipliers: ArrayView1<f64>);
}

pub(crate) trait AllFinite {
    /// Returns true if no element is infinite or NaN.
    fn all_finite(&self) -> bool;
}

impl AllFinite for Array1<f64> {
    fn all_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}
