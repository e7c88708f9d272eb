//! Stateless structural elements: splitter, junction, transparent.
//!
//! Splitters and junctions are configured with a `direction` matrix whose
//! rows are output fluxes and whose entries name the input flux feeding that
//! output (or `None`). The matrices are validated once at construction and
//! compiled into a single `nalgebra` distribution matrix, so the per-timestep
//! step is one matrix-vector product that can never fail.

use nalgebra::{DMatrix, DVector};

use crate::element::{Element, StepContext, check_arity};
use crate::error::{ElementError, ElementResult};
use cf_core::{Real, WEIGHT_TOLERANCE};

fn configuration(element: &str, what: impl Into<String>) -> ElementError {
    ElementError::Configuration {
        element: element.to_string(),
        what: what.into(),
    }
}

/// Validate matrix shape and index range; returns the number of input fluxes.
fn check_direction(element: &str, direction: &[Vec<Option<usize>>]) -> ElementResult<usize> {
    if direction.is_empty() {
        return Err(configuration(element, "direction matrix has no rows"));
    }
    let width = direction[0].len();
    let mut max_input = None;
    for (r, row) in direction.iter().enumerate() {
        if row.len() != width {
            return Err(configuration(
                element,
                format!("direction row {r} has {} entries, expected {width}", row.len()),
            ));
        }
        for &entry in row {
            if let Some(input) = entry {
                max_input = Some(max_input.map_or(input, |m: usize| m.max(input)));
            }
        }
    }
    match max_input {
        Some(m) => Ok(m + 1),
        None => Err(configuration(element, "direction matrix references no input flux")),
    }
}

/// Distributes input fluxes to output fluxes by fractional weights.
///
/// Output row r is `sum_k weight[r][k] * input[direction[r][k]]`. For every
/// input flux the weights applied to it across all rows must sum to 1.0,
/// so mass is neither created nor destroyed.
#[derive(Debug, Clone)]
pub struct Splitter {
    id: String,
    distribution: DMatrix<Real>,
}

impl Splitter {
    pub fn new(
        id: impl Into<String>,
        direction: &[Vec<Option<usize>>],
        weight: &[Vec<Real>],
    ) -> ElementResult<Self> {
        let id = id.into();
        let num_inputs = check_direction(&id, direction)?;

        if weight.len() != direction.len()
            || weight
                .iter()
                .zip(direction)
                .any(|(w, d)| w.len() != d.len())
        {
            return Err(configuration(
                &id,
                "weight matrix shape does not match direction matrix",
            ));
        }

        let mut distribution = DMatrix::zeros(direction.len(), num_inputs);
        for (r, (d_row, w_row)) in direction.iter().zip(weight).enumerate() {
            for (d, &w) in d_row.iter().zip(w_row) {
                if !w.is_finite() || w < 0.0 {
                    return Err(configuration(&id, format!("weight {w} in row {r} is invalid")));
                }
                if let Some(input) = *d {
                    distribution[(r, input)] += w;
                }
            }
        }

        // Column sums of 1.0 are the mass-conservation invariant. An input
        // flux no row references would silently destroy water, so full
        // coverage is required as well.
        for input in 0..num_inputs {
            let total: Real = distribution.column(input).sum();
            if (total - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(configuration(
                    &id,
                    format!("weights for input flux {input} sum to {total}, expected 1.0"),
                ));
            }
        }

        Ok(Self { id, distribution })
    }
}

impl Element for Splitter {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> usize {
        self.distribution.ncols()
    }

    fn outputs(&self) -> usize {
        self.distribution.nrows()
    }

    fn step(&mut self, inputs: &[Real], _ctx: StepContext) -> ElementResult<Vec<Real>> {
        check_arity(&self.id, self.distribution.ncols(), inputs)?;
        let out = &self.distribution * DVector::from_column_slice(inputs);
        Ok(out.iter().copied().collect())
    }

    fn clone_box(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }
}

/// Sums input fluxes into output fluxes.
///
/// Each output row sums the input fluxes its direction entries name; every
/// input flux must be consumed by exactly one output aggregation.
#[derive(Debug, Clone)]
pub struct Junction {
    id: String,
    distribution: DMatrix<Real>,
}

impl Junction {
    pub fn new(id: impl Into<String>, direction: &[Vec<Option<usize>>]) -> ElementResult<Self> {
        let id = id.into();
        let num_inputs = check_direction(&id, direction)?;

        let mut distribution = DMatrix::zeros(direction.len(), num_inputs);
        for (r, row) in direction.iter().enumerate() {
            for entry in row.iter().flatten() {
                distribution[(r, *entry)] += 1.0;
            }
        }

        for input in 0..num_inputs {
            let consumers: Real = distribution.column(input).sum();
            if consumers != 1.0 {
                return Err(configuration(
                    &id,
                    format!("input flux {input} is consumed {consumers} times, expected exactly 1"),
                ));
            }
        }

        Ok(Self { id, distribution })
    }
}

impl Element for Junction {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> usize {
        self.distribution.ncols()
    }

    fn outputs(&self) -> usize {
        self.distribution.nrows()
    }

    fn step(&mut self, inputs: &[Real], _ctx: StepContext) -> ElementResult<Vec<Real>> {
        check_arity(&self.id, self.distribution.ncols(), inputs)?;
        let out = &self.distribution * DVector::from_column_slice(inputs);
        Ok(out.iter().copied().collect())
    }

    fn clone_box(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }
}

/// Identity element: copies its inputs to its outputs unchanged.
///
/// Used to carry a flux past a layer whose other elements transform theirs.
#[derive(Debug, Clone)]
pub struct Transparent {
    id: String,
    width: usize,
}

impl Transparent {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_width(id, 1)
    }

    pub fn with_width(id: impl Into<String>, width: usize) -> Self {
        Self {
            id: id.into(),
            width: width.max(1),
        }
    }
}

impl Element for Transparent {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> usize {
        self.width
    }

    fn outputs(&self) -> usize {
        self.width
    }

    fn step(&mut self, inputs: &[Real], _ctx: StepContext) -> ElementResult<Vec<Real>> {
        check_arity(&self.id, self.width, inputs)?;
        Ok(inputs.to_vec())
    }

    fn clone_box(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }
}
