//! Model file schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete declarative model: solver settings, element definitions,
/// unit layering, node composition, and network topography.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub elements: Vec<ElementDef>,
    #[serde(default)]
    pub units: Vec<UnitDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    pub network: NetworkDef,
}

/// Pegasus solver settings shared by every reservoir.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> usize {
    100
}

/// One element definition. Parameters are `name -> value` maps validated
/// against the exact key set the element kind requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ElementDef {
    /// Snow reservoir; parameters `t0`, `k`, `m`.
    Snow {
        id: String,
        parameters: BTreeMap<String, f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_storage: Option<f64>,
    },
    /// Unsaturated soil reservoir; parameters `Smax`, `k`, `beta`.
    Unsaturated {
        id: String,
        parameters: BTreeMap<String, f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_storage: Option<f64>,
    },
    /// Power-law reservoir (fast or slow); parameters `k`, `alpha`.
    PowerLaw {
        id: String,
        parameters: BTreeMap<String, f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_storage: Option<f64>,
    },
    /// Half-triangular lag; parameter `lag-time`.
    Lag {
        id: String,
        parameters: BTreeMap<String, f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_buffer: Option<Vec<f64>>,
    },
    /// Weighted flux distribution.
    Splitter {
        id: String,
        direction: Vec<Vec<Option<usize>>>,
        weight: Vec<Vec<f64>>,
    },
    /// Flux summation.
    Junction {
        id: String,
        direction: Vec<Vec<Option<usize>>>,
    },
    /// Identity pass-through.
    Transparent {
        id: String,
        #[serde(default = "default_width")]
        width: usize,
    },
}

fn default_width() -> usize {
    1
}

impl ElementDef {
    pub fn id(&self) -> &str {
        match self {
            ElementDef::Snow { id, .. }
            | ElementDef::Unsaturated { id, .. }
            | ElementDef::PowerLaw { id, .. }
            | ElementDef::Lag { id, .. }
            | ElementDef::Splitter { id, .. }
            | ElementDef::Junction { id, .. }
            | ElementDef::Transparent { id, .. } => id,
        }
    }
}

/// A unit: ordered layers of element ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitDef {
    pub id: String,
    pub layers: Vec<Vec<String>>,
}

/// A node: unit coverage fractions and catchment area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub units: Vec<String>,
    pub weights: Vec<f64>,
    pub area: f64,
}

/// Network topography: each node's downstream receiver, `null` for outlets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    pub topography: BTreeMap<String, Option<String>>,
}
