//! Error types for model-file loading and assembly.

use cf_elements::ElementError;
use cf_model::ModelError;
use thiserror::Error;

/// Errors raised while loading or assembling a declarative model file.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Unit '{unit}' references unknown element '{element}'")]
    UnknownElement { unit: String, element: String },

    #[error("Node '{node}' references unknown unit '{unit}'")]
    UnknownUnit { node: String, unit: String },

    #[error(transparent)]
    Element(#[from] ElementError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type ProjectResult<T> = Result<T, ProjectError>;
