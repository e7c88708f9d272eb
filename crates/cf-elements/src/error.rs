//! Error types for element construction and stepping.

use cf_core::Real;
use cf_solver::SolverError;
use thiserror::Error;

/// Errors that can occur while building or stepping an element.
///
/// Construction variants are raised once at model-assembly time; the
/// simulation loop can only produce `Convergence`, `NegativeStorage`,
/// `ArityMismatch`, or `NonFinite`, each carrying the offending element id
/// and timestep index.
#[derive(Error, Debug)]
pub enum ElementError {
    #[error("Element '{element}': invalid configuration: {what}")]
    Configuration { element: String, what: String },

    #[error("Element '{element}': missing parameter '{name}'")]
    MissingParameter { element: String, name: String },

    #[error("Element '{element}': unknown parameter '{name}'")]
    UnknownParameter { element: String, name: String },

    #[error("Element '{element}' at timestep {timestep}: water balance did not converge: {source}")]
    Convergence {
        element: String,
        timestep: usize,
        source: SolverError,
    },

    #[error("Element '{element}' at timestep {timestep}: storage became negative ({storage})")]
    NegativeStorage {
        element: String,
        timestep: usize,
        storage: Real,
    },

    #[error("Element '{element}': expected {expected} input fluxes, got {got}")]
    ArityMismatch {
        element: String,
        expected: usize,
        got: usize,
    },

    #[error("Element '{element}' at timestep {timestep}: non-finite {what}")]
    NonFinite {
        element: String,
        timestep: usize,
        what: &'static str,
    },
}

pub type ElementResult<T> = Result<T, ElementError>;
