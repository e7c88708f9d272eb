//! Error types for model composition and simulation runs.

use cf_core::Real;
use cf_elements::ElementError;
use thiserror::Error;

/// Errors raised while assembling units, nodes, and networks, or while
/// running a simulation.
///
/// Configuration variants can only occur at construction time; a running
/// simulation fails only through `Element` (convergence or state defects,
/// carrying the offending element id and timestep) or `Forcing`.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unit '{unit}': layer {layer} produces {produced} fluxes but the next layer consumes {consumed}")]
    LayerArity {
        unit: String,
        layer: usize,
        produced: usize,
        consumed: usize,
    },

    #[error("Unit '{unit}': {what}")]
    UnitConfiguration { unit: String, what: String },

    #[error("Node '{node}': unit weights sum to {sum}, expected 1.0")]
    WeightSum { node: String, sum: Real },

    #[error("Node '{node}': {what}")]
    NodeConfiguration { node: String, what: String },

    #[error("Network topography references unknown node '{receiver}' (downstream of '{node}')")]
    UnknownReceiver { node: String, receiver: String },

    #[error("Network topography has no entry for node '{node}'")]
    MissingTopography { node: String },

    #[error("Duplicate node id '{node}' in network")]
    DuplicateNode { node: String },

    #[error("Network topography contains a cycle through node '{node}'")]
    CycleDetected { node: String },

    #[error("Forcing error: {what}")]
    Forcing { what: String },

    #[error(transparent)]
    Element(#[from] ElementError),
}

pub type ModelResult<T> = Result<T, ModelError>;
