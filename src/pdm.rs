use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1};

use crate::common::*;
use crate::error::{Error, Result};
use crate::termination::TerminationPolicy;
use crate::traits::*;

/// First-order primal-dual method for inequality constrained NLP.
/// Minimize a function F(x) beginning from a starting point x0, subject
/// to nonlinear inequality constraints.
///
/// ```txt
///       min F(x)
///        x
/// ```
///
/// subject to
///
/// ```txt
///       g(x) <= 0           (nonlinear inequalities)
/// ```
///
/// Each iteration takes a fixed-size gradient step on the Lagrangian in x
/// and a fixed-size ascent step on the multipliers:
///
/// ```txt
///       x   <- x - alpha * (df + J' * lam)
///       lam <- lam + alpha * g
/// ```
///
/// where `g` and `J` are evaluated at the point before the update. The loop
/// runs until `policy` decides to stop.
pub fn solve(
    evaluator: &dyn Evaluator,
    x0: ArrayView1<f64>,
    policy: &mut TerminationPolicy,
    opt: Option<Options>,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<Solution> {
    let opt = opt.unwrap_or_default();
    let alpha = opt.step_size;
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(Error::InvalidOption(format!(
            "step_size ({}) must be positive and finite",
            alpha
        )));
    }
    let nx = x0.len();
    if nx == 0 {
        return Err(Error::InvalidOption(
            "initial point must not be empty".to_string(),
        ));
    }
    if policy.has_fired() {
        return Err(Error::InvalidState(format!(
            "termination policy already fired: {}",
            policy.status()
        )));
    }

    let mut x = x0.to_owned();
    let mut lam = Array1::<f64>::zeros(0);
    let mut n_constraints: Option<usize> = None; // fixed by the evaluation at x0

    let mut iterations = 0;
    let mut evaluations = 0;
    let mut kkt;
    let start = Instant::now();

    loop {
        // Evaluate cost, constraints and derivatives at the current point.
        let Evaluation {
            constraints: g,
            gradient: df,
            jacobian: dg,
            ..
        } = evaluator.evaluate(x.view())?;
        let ng = *n_constraints.get_or_insert_with(|| {
            lam = Array1::zeros(g.len());
            g.len()
        });
        check_dimensions(nx, ng, &g, &df, &dg)?;

        // Lagrangian gradient.
        let l_x = &df + &dg.t().dot(&lam);

        // Primal descent, then dual ascent with the constraints of the old point.
        x.scaled_add(-alpha, &l_x);
        lam.scaled_add(alpha, &g);

        let new_fun_val = evaluator.value(x.view())?;

        iterations += 1;
        evaluations += 2;
        let elapsed_time = start.elapsed().as_secs_f64();

        if opt.divergence_check && !(new_fun_val.is_finite() && x.all_finite() && lam.all_finite())
        {
            return Err(Error::NumericalDivergence {
                iteration: iterations,
            });
        }

        kkt = KktDiagnostics::new(l_x.view(), g.view(), lam.view());
        let snapshot = Progress {
            iterations,
            elapsed_time,
            value: new_fun_val,
            evaluations,
            kkt: Some(kkt),
        };
        log::debug!(
            "it {:5}: f = {:.6e}, |grad| = {:.3e}, primal = {:.3e}, dual = {:.3e}, slack = {:.3e}",
            iterations,
            new_fun_val,
            kkt.gradient_norm,
            kkt.primal_infeasibility,
            kkt.dual_infeasibility,
            kkt.complementary_slackness
        );
        log::trace!("x = {}, lam = {}", x, lam);

        if let Some(progress) = progress.as_ref() {
            progress.update(&snapshot, x.view(), lam.view());
        }
        if policy.should_terminate(&snapshot)? {
            break;
        }
    }

    let elapsed = start.elapsed();
    let value = evaluator.value(x.view())?;
    log::info!(
        "stopped after {} iterations ({:.3}s): {}",
        iterations,
        elapsed.as_secs_f64(),
        policy.status()
    );

    Ok(Solution {
        x,
        value,
        multipliers: lam,
        iterations,
        evaluations,
        elapsed,
        reason: policy.status().to_string(),
        kkt,
    })
}

fn check_dimensions(
    nx: usize,
    ng: usize,
    g: &Array1<f64>,
    df: &Array1<f64>,
    dg: &Array2<f64>,
) -> Result<()> {
    if g.len() != ng {
        return Err(Error::DimensionMismatch {
            what: "constraint vector",
            expected: ng,
            found: g.len(),
        });
    }
    if df.len() != nx {
        return Err(Error::DimensionMismatch {
            what: "objective gradient",
            expected: nx,
            found: df.len(),
        });
    }
    let (rows, cols) = dg.dim();
    if rows != ng {
        return Err(Error::DimensionMismatch {
            what: "constraint Jacobian rows",
            expected: ng,
            found: rows,
        });
    }
    if cols != nx {
        return Err(Error::DimensionMismatch {
            what: "constraint Jacobian columns",
            expected: nx,
            found: cols,
        });
    }
    Ok(())
}
