//! Layered unit composition engine.

use cf_core::Real;
use cf_elements::{Element, ElementError, ElementResult, StepContext};

use crate::error::{ModelError, ModelResult};

/// One hydrological response unit: an ordered sequence of element layers.
///
/// Layers execute strictly in declared order. Within a layer, each element
/// consumes a contiguous slice of the previous layer's concatenated outputs,
/// assembled in element declaration order; the first layer consumes the
/// unit's external inputs and the final layer's outputs are the unit output.
/// There is no implicit routing: the wiring is a pure function of layer
/// structure and declaration order, so the graph is acyclic by construction.
#[derive(Clone)]
pub struct Unit {
    id: String,
    layers: Vec<Vec<Box<dyn Element>>>,
    inputs: usize,
    outputs: usize,
}

impl Unit {
    /// Build a unit from its layers, validating the flux arity chain between
    /// consecutive layers.
    pub fn new(id: impl Into<String>, layers: Vec<Vec<Box<dyn Element>>>) -> ModelResult<Self> {
        let id = id.into();
        if layers.is_empty() || layers.iter().any(Vec::is_empty) {
            return Err(ModelError::UnitConfiguration {
                unit: id,
                what: "unit must have at least one non-empty layer".to_string(),
            });
        }

        let arity = |layer: &[Box<dyn Element>], f: fn(&dyn Element) -> usize| {
            layer.iter().map(|e| f(e.as_ref())).sum::<usize>()
        };

        for (index, pair) in layers.windows(2).enumerate() {
            let produced = arity(&pair[0], |e| e.outputs());
            let consumed = arity(&pair[1], |e| e.inputs());
            if produced != consumed {
                return Err(ModelError::LayerArity {
                    unit: id,
                    layer: index,
                    produced,
                    consumed,
                });
            }
        }

        let inputs = arity(&layers[0], |e| e.inputs());
        let outputs = arity(layers.last().expect("layers is non-empty"), |e| e.outputs());
        Ok(Self {
            id,
            layers,
            inputs,
            outputs,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of external input fluxes (first-layer arity).
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Number of output fluxes (final-layer arity).
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Advance every element one timestep, handing fluxes layer to layer.
    pub fn step(&mut self, external: &[Real], ctx: StepContext) -> ElementResult<Vec<Real>> {
        if external.len() != self.inputs {
            return Err(ElementError::ArityMismatch {
                element: self.id.clone(),
                expected: self.inputs,
                got: external.len(),
            });
        }
        let mut flux = external.to_vec();
        for layer in &mut self.layers {
            let mut next = Vec::with_capacity(flux.len());
            let mut offset = 0;
            for element in layer {
                let take = element.inputs();
                let out = element.step(&flux[offset..offset + take], ctx)?;
                next.extend(out);
                offset += take;
            }
            flux = next;
        }
        Ok(flux)
    }

    /// Current storages of all stateful elements, in layer order.
    pub fn storages(&self) -> Vec<(String, Real)> {
        self.layers
            .iter()
            .flatten()
            .filter_map(|e| e.storage().map(|s| (e.id().to_string(), s)))
            .collect()
    }

    /// Restore every element to its initial state.
    pub fn reset(&mut self) {
        for element in self.layers.iter_mut().flatten() {
            element.reset();
        }
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("layers", &self.layers.iter().map(Vec::len).collect::<Vec<_>>())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_elements::{Junction, PowerLawReservoir, Splitter, Transparent};
    use cf_solver::Pegasus;

    fn ctx(step: usize) -> StepContext {
        StepContext { dt: 1.0, step }
    }

    /// Forcing (P, T, PET) reduced to P and routed through one reservoir.
    fn precipitation_unit(k: Real) -> Unit {
        let splitter = Splitter::new(
            "take-p",
            &[vec![Some(0), Some(1), Some(2)]],
            &[vec![1.0, 1.0, 1.0]],
        )
        .unwrap();
        // T and PET are zero in these tests, so summing them into the single
        // output row leaves P untouched.
        let reservoir = PowerLawReservoir::new("store", k, 1.0, 0.0, Pegasus::default()).unwrap();
        Unit::new(
            "unit",
            vec![vec![Box::new(splitter)], vec![Box::new(reservoir)]],
        )
        .unwrap()
    }

    #[test]
    fn fluxes_flow_layer_by_layer() {
        let mut unit = precipitation_unit(0.5);
        let out = unit.step(&[6.0, 0.0, 0.0], ctx(0)).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0] > 0.0 && out[0] < 6.0);
    }

    #[test]
    fn arity_mismatch_between_layers_rejected() {
        // Transparent(1) cannot consume the 2 outputs of the splitter.
        let splitter =
            Splitter::new("split", &[vec![Some(0)], vec![Some(0)]], &[vec![0.5], vec![0.5]])
                .unwrap();
        let transparent = Transparent::new("pass");
        let err = Unit::new(
            "bad",
            vec![vec![Box::new(splitter)], vec![Box::new(transparent)]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ModelError::LayerArity {
                produced: 2,
                consumed: 1,
                ..
            }
        ));
    }

    #[test]
    fn external_input_arity_is_checked() {
        let mut unit = precipitation_unit(0.5);
        let err = unit.step(&[1.0, 2.0], ctx(0)).unwrap_err();
        assert!(matches!(
            err,
            ElementError::ArityMismatch {
                expected: 3,
                got: 2,
                ..
            }
        ));
        // Extra fluxes are rejected too, not silently dropped.
        assert!(unit.step(&[1.0, 0.0, 0.0, 4.0], ctx(0)).is_err());
    }

    #[test]
    fn concatenation_respects_declaration_order() {
        // Layer 1 splits into two; layer 2 passes both; layer 3 merges.
        let splitter =
            Splitter::new("split", &[vec![Some(0)], vec![Some(0)]], &[vec![0.25], vec![0.75]])
                .unwrap();
        let left = Transparent::new("left");
        let right = Transparent::new("right");
        let junction = Junction::new("merge", &[vec![Some(0), Some(1)]]).unwrap();
        let mut unit = Unit::new(
            "routing",
            vec![
                vec![Box::new(splitter)],
                vec![Box::new(left), Box::new(right)],
                vec![Box::new(junction)],
            ],
        )
        .unwrap();
        let out = unit.step(&[8.0], ctx(0)).unwrap();
        assert!((out[0] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn storages_and_reset() {
        let mut unit = precipitation_unit(0.1);
        unit.step(&[10.0, 0.0, 0.0], ctx(0)).unwrap();
        let storages = unit.storages();
        assert_eq!(storages.len(), 1);
        assert_eq!(storages[0].0, "store");
        assert!(storages[0].1 > 0.0);

        unit.reset();
        assert_eq!(unit.storages()[0].1, 0.0);
    }

    #[test]
    fn cloned_units_have_independent_state() {
        let mut original = precipitation_unit(0.1);
        let mut copy = original.clone();
        original.step(&[10.0, 0.0, 0.0], ctx(0)).unwrap();
        copy.step(&[0.0, 0.0, 0.0], ctx(0)).unwrap();
        assert!(original.storages()[0].1 > 0.0);
        assert_eq!(copy.storages()[0].1, 0.0);
    }
}
