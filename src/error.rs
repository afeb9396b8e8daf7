/// Errors raised by the solver and the termination policy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An evaluator returned a vector or matrix of unexpected size.
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// An operation was called in a state where it is not defined.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The point, the multipliers or the objective value became non-finite.
    #[error("numerical divergence at iteration {iteration}")]
    NumericalDivergence { iteration: usize },

    /// A solver option or termination setting is out of range.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Error raised by the evaluator, passed through untouched.
    #[error(transparent)]
    Evaluation(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
