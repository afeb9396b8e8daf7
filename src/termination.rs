use std::fmt;

use crate::common::{KktDiagnostics, Progress};
use crate::error::{Error, Result};

/// Tolerances on the optimality diagnostics. Each tolerance is optional;
/// only the configured ones take part in the optimality test.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KktTolerances {
    /// Tolerance on the stationarity measure.
    pub gradient_tolerance: Option<f64>,
    /// Tolerance on the sum of constraint violations.
    pub primal_feasibility_tolerance: Option<f64>,
    /// Tolerance on the magnitude of negative multipliers.
    pub dual_feasibility_tolerance: Option<f64>,
    /// Tolerance on the complementary slackness product.
    pub slackness_tolerance: Option<f64>,
}

impl KktTolerances {
    /// Number of configured tolerances.
    pub fn count(&self) -> usize {
        self.pairs().iter().filter(|(tol, _)| tol.is_some()).count()
    }

    /// Combines two sets of tolerances, taking each tolerance from `other`
    /// when it is set there and from `self` otherwise.
    pub fn overridden_by(self, other: KktTolerances) -> KktTolerances {
        KktTolerances {
            gradient_tolerance: other.gradient_tolerance.or(self.gradient_tolerance),
            primal_feasibility_tolerance: other
                .primal_feasibility_tolerance
                .or(self.primal_feasibility_tolerance),
            dual_feasibility_tolerance: other
                .dual_feasibility_tolerance
                .or(self.dual_feasibility_tolerance),
            slackness_tolerance: other.slackness_tolerance.or(self.slackness_tolerance),
        }
    }

    /// Returns true if at least one tolerance is configured and every
    /// configured tolerance is met by `kkt`. Missing diagnostics never pass.
    pub fn is_met(&self, kkt: Option<&KktDiagnostics>) -> bool {
        let kkt = match kkt {
            Some(kkt) => kkt,
            None => return false,
        };
        if self.count() == 0 {
            return false;
        }
        [
            (self.gradient_tolerance, kkt.gradient_norm),
            (self.primal_feasibility_tolerance, kkt.primal_infeasibility),
            (self.dual_feasibility_tolerance, kkt.dual_infeasibility),
            (self.slackness_tolerance, kkt.complementary_slackness),
        ]
        .iter()
        .all(|&(tol, value)| tol.map_or(true, |tol| value <= tol))
    }

    fn pairs(&self) -> [(Option<f64>, &'static str); 4] {
        [
            (self.gradient_tolerance, "gradient"),
            (self.primal_feasibility_tolerance, "primal feasibility"),
            (self.dual_feasibility_tolerance, "dual feasibility"),
            (self.slackness_tolerance, "slackness"),
        ]
    }
}

/// User-facing termination settings. Every criterion is inactive unless set.
///
/// Optimality tolerances may be given either nested under `kkt` or through
/// the flattened `*_tolerance` fields; both are merged when the settings are
/// turned into [`TerminationCriteria`], the flattened fields winning where
/// both forms set the same tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationConfig {
    pub max_iterations: Option<usize>,
    /// Wall-clock limit in seconds.
    pub max_elapsed_time: Option<f64>,
    pub benchmark_value: Option<f64>,
    /// Direction of the benchmark comparison.
    pub minimize: bool,
    pub max_evaluations: Option<usize>,

    pub kkt: Option<KktTolerances>,
    pub gradient_tolerance: Option<f64>,
    pub primal_feasibility_tolerance: Option<f64>,
    pub dual_feasibility_tolerance: Option<f64>,
    pub slackness_tolerance: Option<f64>,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            max_elapsed_time: None,
            benchmark_value: None,
            minimize: true,
            max_evaluations: None,

            kkt: None,
            gradient_tolerance: None,
            primal_feasibility_tolerance: None,
            dual_feasibility_tolerance: None,
            slackness_tolerance: None,
        }
    }
}

impl TerminationConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_max_elapsed_time(mut self, seconds: f64) -> Self {
        self.max_elapsed_time = Some(seconds);
        self
    }

    pub fn with_benchmark(mut self, value: f64, minimize: bool) -> Self {
        self.benchmark_value = Some(value);
        self.minimize = minimize;
        self
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = Some(max_evaluations);
        self
    }

    pub fn with_kkt(mut self, kkt: KktTolerances) -> Self {
        self.kkt = Some(kkt);
        self
    }

    fn flattened_kkt(&self) -> KktTolerances {
        KktTolerances {
            gradient_tolerance: self.gradient_tolerance,
            primal_feasibility_tolerance: self.primal_feasibility_tolerance,
            dual_feasibility_tolerance: self.dual_feasibility_tolerance,
            slackness_tolerance: self.slackness_tolerance,
        }
    }
}

/// Benchmark objective value and the direction in which it is approached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Benchmark {
    pub value: f64,
    pub minimize: bool,
}

impl Benchmark {
    fn is_reached(&self, value: f64) -> bool {
        if self.minimize {
            value <= self.value
        } else {
            value >= self.value
        }
    }
}

/// Normalized, validated stopping criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerminationCriteria {
    pub max_iterations: Option<usize>,
    pub max_elapsed_time: Option<f64>,
    pub benchmark: Option<Benchmark>,
    pub max_evaluations: Option<usize>,
    /// Present when the optimality criterion was requested, even if no
    /// tolerance was supplied.
    pub kkt: Option<KktTolerances>,
}

impl TryFrom<TerminationConfig> for TerminationCriteria {
    type Error = Error;

    fn try_from(config: TerminationConfig) -> Result<Self> {
        if let Some(t) = config.max_elapsed_time {
            if t.is_nan() || t < 0.0 {
                return Err(Error::InvalidOption(format!(
                    "max_elapsed_time ({}) must be non-negative",
                    t
                )));
            }
        }
        if let Some(v) = config.benchmark_value {
            if v.is_nan() {
                return Err(Error::InvalidOption(
                    "benchmark_value must not be NaN".to_string(),
                ));
            }
        }

        let flattened = config.flattened_kkt();
        let kkt = match config.kkt {
            Some(nested) => Some(nested.overridden_by(flattened)),
            None if flattened.count() > 0 => Some(flattened),
            None => None,
        };
        if let Some(kkt) = kkt.as_ref() {
            for (tol, name) in kkt.pairs() {
                if tol.map_or(false, f64::is_nan) {
                    return Err(Error::InvalidOption(format!(
                        "{} tolerance must not be NaN",
                        name
                    )));
                }
            }
        }

        Ok(Self {
            max_iterations: config.max_iterations,
            max_elapsed_time: config.max_elapsed_time,
            benchmark: config.benchmark_value.map(|value| Benchmark {
                value,
                minimize: config.minimize,
            }),
            max_evaluations: config.max_evaluations,
            kkt,
        })
    }
}

/// Why a run was stopped. Variants are listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    MaxIterations,
    MaxElapsedTime,
    Benchmark,
    MaxEvaluations,
    Optimality,
}

impl TerminationReason {
    /// Order in which the criteria are checked; the first one met wins.
    pub const PRIORITY: [TerminationReason; 5] = [
        TerminationReason::MaxIterations,
        TerminationReason::MaxElapsedTime,
        TerminationReason::Benchmark,
        TerminationReason::MaxEvaluations,
        TerminationReason::Optimality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::MaxIterations => "reached maximum number of iterations",
            TerminationReason::MaxElapsedTime => "reached maximum allowed elapsed time",
            TerminationReason::Benchmark => "reached benchmark value",
            TerminationReason::MaxEvaluations => "reached maximum number of function evaluations",
            TerminationReason::Optimality => {
                "current point meets all configured optimality-tolerance conditions"
            }
        }
    }

    /// Returns true if this criterion is active in `criteria` and met by
    /// `progress`.
    pub fn is_met(&self, criteria: &TerminationCriteria, progress: &Progress) -> bool {
        match self {
            TerminationReason::MaxIterations => criteria
                .max_iterations
                .map_or(false, |max| progress.iterations >= max),
            TerminationReason::MaxElapsedTime => criteria
                .max_elapsed_time
                .map_or(false, |max| progress.elapsed_time >= max),
            TerminationReason::Benchmark => criteria
                .benchmark
                .map_or(false, |b| b.is_reached(progress.value)),
            TerminationReason::MaxEvaluations => criteria
                .max_evaluations
                .map_or(false, |max| progress.evaluations >= max),
            TerminationReason::Optimality => criteria
                .kkt
                .map_or(false, |kkt| kkt.is_met(progress.kkt.as_ref())),
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides, once per iteration, whether a run should stop.
///
/// A policy starts armed and fires at most once: after it has returned
/// `true` the reason is kept for [`status`](TerminationPolicy::status) and
/// any further decision request is an error.
#[derive(Debug, Clone)]
pub struct TerminationPolicy {
    criteria: TerminationCriteria,
    fired: Option<TerminationReason>,
}

impl TerminationPolicy {
    pub fn new(criteria: TerminationCriteria) -> Self {
        Self {
            criteria,
            fired: None,
        }
    }

    /// Validates and normalizes `config` into a new policy.
    pub fn from_config(config: TerminationConfig) -> Result<Self> {
        Ok(Self::new(TerminationCriteria::try_from(config)?))
    }

    pub fn criteria(&self) -> &TerminationCriteria {
        &self.criteria
    }

    /// Checks the criteria against `progress` in priority order. Returns
    /// `true` and records the reason when one of them is met.
    pub fn should_terminate(&mut self, progress: &Progress) -> Result<bool> {
        if let Some(reason) = self.fired {
            return Err(Error::InvalidState(format!(
                "termination policy already fired: {}",
                reason
            )));
        }
        if progress.iterations == 0 {
            return Err(Error::InvalidState(
                "termination requested before any iteration".to_string(),
            ));
        }

        let reason = TerminationReason::PRIORITY
            .into_iter()
            .find(|reason| reason.is_met(&self.criteria, progress));
        match reason {
            Some(reason) => {
                log::debug!("termination criterion met: {}", reason);
                self.fired = Some(reason);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.fired
    }

    /// Reason recorded by the last stop decision, or an empty string while
    /// the policy is still armed.
    pub fn status(&self) -> &'static str {
        self.fired.map_or("", |reason| reason.as_str())
    }

    pub fn has_fired(&self) -> bool {
        self.fired.is_some()
    }
}
