//! Error types for root-finding operations.

use thiserror::Error;

/// Errors that can occur while solving a bracketed scalar equation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error(
        "Bracket [{lower}, {upper}] does not straddle a sign change \
         (f(lower)={f_lower}, f(upper)={f_upper})"
    )]
    NoSignChange {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("No convergence after {iterations} iterations (best x={best}, residual={residual})")]
    MaxIterations {
        iterations: usize,
        best: f64,
        residual: f64,
    },

    #[error("Invalid bracket [{lower}, {upper}]: {what}")]
    InvalidBracket {
        lower: f64,
        upper: f64,
        what: &'static str,
    },
}

pub type SolverResult<T> = Result<T, SolverError>;
