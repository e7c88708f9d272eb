//! Assembly of a runnable network from a model definition.
//!
//! Elements are built once as prototypes, cloned into each unit layer that
//! references them, and units are cloned into each node, so every node
//! advances private element state even when definitions are shared.

use std::collections::BTreeMap;

use cf_elements::{
    Element, HalfTriangularLag, Junction, PowerLawReservoir, SnowReservoir, Splitter, Transparent,
    UnsaturatedReservoir,
};
use cf_model::{Network, Node, Unit};
use cf_solver::Pegasus;

use crate::error::{ProjectError, ProjectResult};
use crate::schema::{ElementDef, ModelDef};

/// Build the network a model definition describes.
pub fn assemble(model: &ModelDef) -> ProjectResult<Network> {
    let solver = Pegasus {
        tolerance: model.solver.tolerance,
        max_iterations: model.solver.max_iterations,
    };

    let elements = build_elements(model, solver)?;
    let units = build_units(model, &elements)?;

    let mut nodes = Vec::with_capacity(model.nodes.len());
    let mut seen_nodes = BTreeMap::new();
    for def in &model.nodes {
        if seen_nodes.insert(def.id.as_str(), ()).is_some() {
            return Err(ProjectError::DuplicateId {
                kind: "node",
                id: def.id.clone(),
            });
        }
        let mut node_units = Vec::with_capacity(def.units.len());
        for unit_id in &def.units {
            let unit = units
                .get(unit_id.as_str())
                .ok_or_else(|| ProjectError::UnknownUnit {
                    node: def.id.clone(),
                    unit: unit_id.clone(),
                })?;
            node_units.push(unit.clone());
        }
        nodes.push(Node::new(
            def.id.clone(),
            node_units,
            def.weights.clone(),
            def.area,
        )?);
    }

    Ok(Network::new(nodes, &model.network.topography)?)
}

fn build_elements(
    model: &ModelDef,
    solver: Pegasus,
) -> ProjectResult<BTreeMap<&str, Box<dyn Element>>> {
    let mut elements: BTreeMap<&str, Box<dyn Element>> = BTreeMap::new();
    for def in &model.elements {
        let element = build_element(def, solver)?;
        if elements.insert(def.id(), element).is_some() {
            return Err(ProjectError::DuplicateId {
                kind: "element",
                id: def.id().to_string(),
            });
        }
    }
    Ok(elements)
}

fn build_element(def: &ElementDef, solver: Pegasus) -> ProjectResult<Box<dyn Element>> {
    let element: Box<dyn Element> = match def {
        ElementDef::Snow {
            id,
            parameters,
            initial_storage,
        } => Box::new(SnowReservoir::from_parameters(
            id,
            parameters,
            initial_storage.unwrap_or(0.0),
            solver,
        )?),
        ElementDef::Unsaturated {
            id,
            parameters,
            initial_storage,
        } => Box::new(UnsaturatedReservoir::from_parameters(
            id,
            parameters,
            initial_storage.unwrap_or(0.0),
            solver,
        )?),
        ElementDef::PowerLaw {
            id,
            parameters,
            initial_storage,
        } => Box::new(PowerLawReservoir::from_parameters(
            id,
            parameters,
            initial_storage.unwrap_or(0.0),
            solver,
        )?),
        ElementDef::Lag {
            id,
            parameters,
            initial_buffer,
        } => Box::new(HalfTriangularLag::from_parameters(
            id,
            parameters,
            initial_buffer.clone(),
        )?),
        ElementDef::Splitter {
            id,
            direction,
            weight,
        } => Box::new(Splitter::new(id, direction, weight)?),
        ElementDef::Junction { id, direction } => Box::new(Junction::new(id, direction)?),
        ElementDef::Transparent { id, width } => Box::new(Transparent::with_width(id, *width)),
    };
    Ok(element)
}

fn build_units<'a>(
    model: &'a ModelDef,
    elements: &BTreeMap<&str, Box<dyn Element>>,
) -> ProjectResult<BTreeMap<&'a str, Unit>> {
    let mut units = BTreeMap::new();
    for def in &model.units {
        let mut layers = Vec::with_capacity(def.layers.len());
        for layer in &def.layers {
            let mut row: Vec<Box<dyn Element>> = Vec::with_capacity(layer.len());
            for element_id in layer {
                let element = elements.get(element_id.as_str()).ok_or_else(|| {
                    ProjectError::UnknownElement {
                        unit: def.id.clone(),
                        element: element_id.clone(),
                    }
                })?;
                row.push(element.clone());
            }
            layers.push(row);
        }
        let unit = Unit::new(def.id.clone(), layers)?;
        if units.insert(def.id.as_str(), unit).is_some() {
            return Err(ProjectError::DuplicateId {
                kind: "unit",
                id: def.id.clone(),
            });
        }
    }
    Ok(units)
}
