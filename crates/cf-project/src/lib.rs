//! Declarative model files for catchflow.
//!
//! A model file is a static description of elements, units, nodes, and the
//! network topography; this crate parses it (YAML or JSON), validates every
//! cross-reference, and assembles the immutable `cf_model::Network` the
//! simulation runs on. Parsing happens exactly once at startup; simulation
//! code never re-validates or mutates configuration.

pub mod assemble;
pub mod error;
pub mod schema;

pub use assemble::assemble;
pub use error::{ProjectError, ProjectResult};
pub use schema::{ElementDef, ModelDef, NetworkDef, NodeDef, SolverDef, UnitDef};

use std::path::Path;

/// Load a model definition from YAML or JSON, by file extension.
pub fn load_model(path: &Path) -> ProjectResult<ModelDef> {
    let text = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&text)?),
        _ => Ok(serde_yaml::from_str(&text)?),
    }
}
