//! Core trait for model elements.

use crate::error::{ElementError, ElementResult};
use cf_core::Real;

/// Per-timestep context handed to every element.
#[derive(Clone, Copy, Debug)]
pub struct StepContext {
    /// Timestep length (the time unit of the forcing series)
    pub dt: Real,
    /// 0-based timestep index, used for error reporting
    pub step: usize,
}

/// A unit of computation over fluxes.
///
/// Elements consume a fixed number of input fluxes, produce a fixed number of
/// output fluxes, and may hold internal state that advances once per
/// timestep. Wiring between elements is decided entirely by the enclosing
/// unit's layer structure; an element never sees another element's state,
/// only published fluxes.
pub trait Element: Send {
    /// Element id for diagnostics and state recording.
    fn id(&self) -> &str;

    /// Number of input flux slots (fixed at construction).
    fn inputs(&self) -> usize;

    /// Number of output flux slots (fixed at construction).
    fn outputs(&self) -> usize;

    /// Advance one timestep: consume `inputs` and produce the output fluxes.
    ///
    /// `inputs.len()` must equal [`Element::inputs`]; the returned vector has
    /// length [`Element::outputs`].
    fn step(&mut self, inputs: &[Real], ctx: StepContext) -> ElementResult<Vec<Real>>;

    /// Current storage for stateful elements (reservoirs, lag buffers).
    ///
    /// Stateless elements return `None` and are skipped when recording
    /// state trajectories.
    fn storage(&self) -> Option<Real> {
        None
    }

    /// Restore the state the element was constructed with.
    fn reset(&mut self) {}

    /// Clone into a boxed trait object.
    ///
    /// Units are cloned into every node that references them, so each node
    /// advances a private copy of the element states.
    fn clone_box(&self) -> Box<dyn Element>;
}

impl Clone for Box<dyn Element> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Check the input slice length against the element's declared arity.
pub(crate) fn check_arity(element: &str, expected: usize, inputs: &[Real]) -> ElementResult<()> {
    if inputs.len() == expected {
        Ok(())
    } else {
        Err(ElementError::ArityMismatch {
            element: element.to_string(),
            expected,
            got: inputs.len(),
        })
    }
}
