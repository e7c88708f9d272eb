//! Catchment nodes: area-weighted mixtures of units.

use cf_core::{ElementPath, Real, sums_to_one};
use cf_elements::StepContext;

use crate::error::{ModelError, ModelResult};
use crate::run::ForcingStep;
use crate::unit::Unit;

/// Number of external forcing fluxes every unit consumes (P, T, PET).
pub const FORCING_FLUXES: usize = 3;

/// One sub-catchment: fractional unit coverage and a catchment area.
///
/// Local discharge per timestep is `area * sum_i weight_i * unit_output_i`.
/// Nodes own their units (cloned at assembly) and know nothing about the
/// network around them.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    units: Vec<Unit>,
    weights: Vec<Real>,
    area: Real,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        units: Vec<Unit>,
        weights: Vec<Real>,
        area: Real,
    ) -> ModelResult<Self> {
        let id = id.into();
        if units.is_empty() || units.len() != weights.len() {
            return Err(ModelError::NodeConfiguration {
                node: id,
                what: format!(
                    "{} units with {} weights; need one weight per unit",
                    units.len(),
                    weights.len()
                ),
            });
        }
        if !sums_to_one(&weights) {
            return Err(ModelError::WeightSum {
                node: id,
                sum: weights.iter().sum(),
            });
        }
        if !area.is_finite() || area <= 0.0 {
            return Err(ModelError::NodeConfiguration {
                node: id,
                what: format!("area must be positive, got {area}"),
            });
        }
        for unit in &units {
            if unit.inputs() != FORCING_FLUXES {
                return Err(ModelError::NodeConfiguration {
                    node: id,
                    what: format!(
                        "unit '{}' takes {} input fluxes, expected {FORCING_FLUXES} (P, T, PET)",
                        unit.id(),
                        unit.inputs()
                    ),
                });
            }
            if unit.outputs() != 1 {
                return Err(ModelError::NodeConfiguration {
                    node: id,
                    what: format!(
                        "unit '{}' produces {} output fluxes, expected 1",
                        unit.id(),
                        unit.outputs()
                    ),
                });
            }
        }
        Ok(Self {
            id,
            units,
            weights,
            area,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn area(&self) -> Real {
        self.area
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Advance every unit one timestep and mix their outputs.
    pub fn step(&mut self, forcing: &ForcingStep, ctx: StepContext) -> ModelResult<Real> {
        let external = [forcing.precipitation, forcing.temperature, forcing.pet];
        let mut mixed = 0.0;
        for (unit, weight) in self.units.iter_mut().zip(&self.weights) {
            let out = unit.step(&external, ctx)?;
            mixed += weight * out[0];
        }
        Ok(self.area * mixed)
    }

    /// Storages of every stateful element, with fully qualified paths.
    pub fn storages(&self) -> Vec<(ElementPath, Real)> {
        self.units
            .iter()
            .flat_map(|unit| {
                unit.storages()
                    .into_iter()
                    .map(|(element, s)| (ElementPath::new(&self.id, unit.id(), element), s))
            })
            .collect()
    }

    pub fn reset(&mut self) {
        for unit in &mut self.units {
            unit.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_elements::{Splitter, Transparent};

    fn ctx(step: usize) -> StepContext {
        StepContext { dt: 1.0, step }
    }

    /// A unit that forwards precipitation unchanged.
    fn pass_through_unit(id: &str) -> Unit {
        let splitter = Splitter::new(
            format!("{id}-take-p"),
            &[vec![Some(0), Some(1), Some(2)]],
            &[vec![1.0, 1.0, 1.0]],
        )
        .unwrap();
        let transparent = Transparent::new(format!("{id}-pass"));
        Unit::new(
            id,
            vec![vec![Box::new(splitter)], vec![Box::new(transparent)]],
        )
        .unwrap()
    }

    fn forcing(p: Real) -> ForcingStep {
        ForcingStep {
            precipitation: p,
            temperature: 0.0,
            pet: 0.0,
        }
    }

    #[test]
    fn discharge_is_area_weighted_mixture() {
        // Both units output 10; weights 0.3/0.7, area 100 -> 1000.
        let units = vec![pass_through_unit("a"), pass_through_unit("b")];
        let mut node = Node::new("catchment", units, vec![0.3, 0.7], 100.0).unwrap();
        for step in 0..5 {
            let q = node.step(&forcing(10.0), ctx(step)).unwrap();
            assert!((q - 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn weights_must_sum_to_one() {
        let units = vec![pass_through_unit("a"), pass_through_unit("b")];
        let err = Node::new("catchment", units, vec![0.3, 0.6], 100.0).unwrap_err();
        assert!(matches!(err, ModelError::WeightSum { .. }));
    }

    #[test]
    fn area_must_be_positive() {
        let err = Node::new("catchment", vec![pass_through_unit("a")], vec![1.0], 0.0).unwrap_err();
        assert!(matches!(err, ModelError::NodeConfiguration { .. }));
    }

    #[test]
    fn storages_empty_without_stateful_elements() {
        let node = Node::new("catchment", vec![pass_through_unit("a")], vec![1.0], 1.0).unwrap();
        // Pass-through unit has no stateful element.
        assert!(node.storages().is_empty());
    }
}
