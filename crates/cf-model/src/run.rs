//! Run interface: forcing series, options, and recorded output.

use std::collections::BTreeMap;

use cf_core::{Real, ensure_finite};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// One timestep of forcing for a node: precipitation, temperature, and
/// potential evapotranspiration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForcingStep {
    pub precipitation: Real,
    pub temperature: Real,
    pub pet: Real,
}

/// Ordered forcing series for one node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Forcing {
    pub steps: Vec<ForcingStep>,
}

impl Forcing {
    /// Build from `(P, T, PET)` triples.
    pub fn from_triples(triples: impl IntoIterator<Item = [Real; 3]>) -> Self {
        Self {
            steps: triples
                .into_iter()
                .map(|[precipitation, temperature, pet]| ForcingStep {
                    precipitation,
                    temperature,
                    pet,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reject NaN or infinite forcing values before they enter the solver.
    pub(crate) fn validate(&self, node: &str) -> ModelResult<()> {
        for step in &self.steps {
            ensure_finite(step.precipitation, "precipitation")
                .and_then(|_| ensure_finite(step.temperature, "temperature"))
                .and_then(|_| ensure_finite(step.pet, "potential evapotranspiration"))
                .map_err(|source| ModelError::Forcing {
                    what: format!("node '{node}': {source}"),
                })?;
        }
        Ok(())
    }
}

/// Options for simulation runs.
#[derive(Clone, Copy, Debug)]
pub struct RunOptions {
    /// Timestep length in the time unit of the forcing series
    pub dt: Real,
    /// Record the storage trajectory of every stateful element
    pub record_states: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dt: 1.0,
            record_states: false,
        }
    }
}

impl RunOptions {
    pub(crate) fn validate(&self) -> ModelResult<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ModelError::Forcing {
                what: format!("dt must be positive, got {}", self.dt),
            });
        }
        Ok(())
    }
}

/// Result of a network run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunOutput {
    /// Accumulated discharge series per outlet node
    pub outlets: BTreeMap<String, Vec<Real>>,
    /// Storage trajectories keyed `node/unit/element`, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<BTreeMap<String, Vec<Real>>>,
}
