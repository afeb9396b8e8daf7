use std::time::Duration;

use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

/// Output of a full evaluation of the problem functions at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Objective function value.
    pub value: f64,
    /// Inequality constraint values, feasible when all entries are `<= 0`.
    pub constraints: Array1<f64>,
    /// Gradient of the objective function.
    pub gradient: Array1<f64>,
    /// Constraint Jacobian (`m x n`, row `i` is the gradient of constraint `i`).
    pub jacobian: Array2<f64>,
}

/// Approximate optimality measures for the current iterate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KktDiagnostics {
    /// 2-norm of the Lagrangian gradient stacked on the constraint values.
    pub gradient_norm: f64,
    /// Sum of the positive (violated) constraint values.
    pub primal_infeasibility: f64,
    /// Magnitude of the negative multipliers.
    pub dual_infeasibility: f64,
    /// Inner product of the multipliers and the constraint values.
    pub complementary_slackness: f64,
}

impl KktDiagnostics {
    /// Computes the diagnostics from the Lagrangian gradient `l_x` and the
    /// constraint values `g` of the pre-update point, together with the
    /// multipliers `lam` after their update.
    pub fn new(l_x: ArrayView1<f64>, g: ArrayView1<f64>, lam: ArrayView1<f64>) -> Self {
        let stacked = concatenate![Axis(0), l_x, g];
        Self {
            gradient_norm: stacked.dot(&stacked).sqrt(),
            primal_infeasibility: g.mapv(|gi| gi.max(0.0)).sum(),
            dual_infeasibility: -lam.mapv(|li| li.min(0.0)).sum(),
            complementary_slackness: lam.dot(&g),
        }
    }
}

/// Snapshot of the solver's progress, handed to the termination policy once
/// per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Number of completed iterations.
    pub iterations: usize,
    /// Wall-clock time since the start of the loop, in seconds.
    pub elapsed_time: f64,
    /// Objective value at the updated point.
    pub value: f64,
    /// Number of evaluator calls made by the loop.
    pub evaluations: usize,
    /// Optimality diagnostics, if they were computed.
    pub kkt: Option<KktDiagnostics>,
}

pub struct Options {
    /// Fixed step size used for both the primal and the dual update.
    pub step_size: f64,
    /// Abort with `NumericalDivergence` when the point, the multipliers or
    /// the objective value become non-finite.
    pub divergence_check: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            step_size: 0.005,
            divergence_check: false,
        }
    }
}

/// Result of a solver run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final point.
    pub x: Array1<f64>,
    /// Objective value at the final point.
    pub value: f64,
    /// Final multipliers on the inequality constraints.
    pub multipliers: Array1<f64>,
    pub iterations: usize,
    /// Evaluations made inside the loop (the final value is not counted).
    pub evaluations: usize,
    pub elapsed: Duration,
    /// Reason reported by the termination policy.
    pub reason: String,
    /// Diagnostics of the last iteration.
    pub kkt: KktDiagnostics,
}
