//! Half-triangular lag function.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use crate::element::{Element, StepContext, check_arity};
use crate::error::{ElementError, ElementResult};
use crate::params::take_exact;
use cf_core::Real;

/// Spreads each input pulse across future timesteps with a half-triangular
/// kernel of base `lag-time`.
///
/// The kernel weight of slot i is the area of the triangle between i and i+1
/// timesteps: `w_i = A(i+1) - A(i)` with `A(t) = min(1, (t/tau)^2)`, so the
/// weights sum to exactly 1 and the buffer length is the kernel support
/// rounded up to whole timesteps.
#[derive(Debug, Clone)]
pub struct HalfTriangularLag {
    id: String,
    weights: Vec<Real>,
    buffer: VecDeque<Real>,
    initial_buffer: Vec<Real>,
}

impl HalfTriangularLag {
    pub fn new(
        id: impl Into<String>,
        lag_time: Real,
        initial_buffer: Option<Vec<Real>>,
    ) -> ElementResult<Self> {
        let id = id.into();
        if !lag_time.is_finite() || lag_time <= 0.0 {
            return Err(ElementError::Configuration {
                element: id,
                what: format!("lag-time must be finite and positive, got {lag_time}"),
            });
        }

        let support = lag_time.ceil() as usize;
        let area = |t: Real| (t / lag_time).powi(2).min(1.0);
        let weights: Vec<Real> = (0..support)
            .map(|i| area((i + 1) as Real) - area(i as Real))
            .collect();

        let initial = match initial_buffer {
            Some(buffer) => {
                if buffer.len() != support {
                    return Err(ElementError::Configuration {
                        element: id,
                        what: format!(
                            "initial lag buffer has {} slots, kernel support is {support}",
                            buffer.len()
                        ),
                    });
                }
                buffer
            }
            None => vec![0.0; support],
        };

        Ok(Self {
            id,
            weights,
            buffer: initial.iter().copied().collect(),
            initial_buffer: initial,
        })
    }

    /// Construct from a `name -> value` parameter map with exactly the key
    /// `lag-time`.
    pub fn from_parameters(
        id: impl Into<String>,
        parameters: &BTreeMap<String, Real>,
        initial_buffer: Option<Vec<Real>>,
    ) -> ElementResult<Self> {
        let id = id.into();
        let values = take_exact(&id, parameters, &["lag-time"])?;
        Self::new(id, values[0], initial_buffer)
    }

    /// Kernel weights, in future-timestep order.
    pub fn kernel(&self) -> &[Real] {
        &self.weights
    }
}

impl Element for HalfTriangularLag {
    fn id(&self) -> &str {
        &self.id
    }

    fn inputs(&self) -> usize {
        1
    }

    fn outputs(&self) -> usize {
        1
    }

    fn step(&mut self, inputs: &[Real], _ctx: StepContext) -> ElementResult<Vec<Real>> {
        check_arity(&self.id, 1, inputs)?;
        let pulse = inputs[0];

        for (slot, &w) in self.buffer.iter_mut().zip(&self.weights) {
            *slot += pulse * w;
        }

        // The front slot is this timestep's contribution; everything else
        // moves one step closer.
        let out = self.buffer.pop_front().unwrap_or(0.0);
        self.buffer.push_back(0.0);
        Ok(vec![out])
    }

    fn storage(&self) -> Option<Real> {
        // Pending water still held by the kernel.
        Some(self.buffer.iter().sum())
    }

    fn reset(&mut self) {
        self.buffer = self.initial_buffer.iter().copied().collect();
    }

    fn clone_box(&self) -> Box<dyn Element> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(step: usize) -> StepContext {
        StepContext { dt: 1.0, step }
    }

    #[test]
    fn kernel_weights_sum_to_one() {
        for lag_time in [0.5, 1.0, 2.0, 2.5, 7.3] {
            let lag = HalfTriangularLag::new("lag", lag_time, None).unwrap();
            let total: Real = lag.kernel().iter().sum();
            assert!(
                (total - 1.0).abs() < 1e-12,
                "kernel for lag-time {lag_time} sums to {total}"
            );
        }
    }

    #[test]
    fn unit_lag_is_identity() {
        let mut lag = HalfTriangularLag::new("lag", 1.0, None).unwrap();
        for (step, pulse) in [3.0, 0.0, 7.5].into_iter().enumerate() {
            let out = lag.step(&[pulse], ctx(step)).unwrap();
            assert_eq!(out, vec![pulse]);
        }
    }

    #[test]
    fn pulse_is_spread_quadratically() {
        // lag-time 2: A(1) = 0.25, A(2) = 1.0 -> weights [0.25, 0.75].
        let mut lag = HalfTriangularLag::new("lag", 2.0, None).unwrap();
        let first = lag.step(&[8.0], ctx(0)).unwrap();
        let second = lag.step(&[0.0], ctx(1)).unwrap();
        let third = lag.step(&[0.0], ctx(2)).unwrap();
        assert!((first[0] - 2.0).abs() < 1e-12);
        assert!((second[0] - 6.0).abs() < 1e-12);
        assert_eq!(third, vec![0.0]);
    }

    #[test]
    fn initial_buffer_drains_first() {
        let mut lag = HalfTriangularLag::new("lag", 2.0, Some(vec![1.5, 0.5])).unwrap();
        assert_eq!(lag.storage(), Some(2.0));
        let out = lag.step(&[0.0], ctx(0)).unwrap();
        assert_eq!(out, vec![1.5]);
    }

    #[test]
    fn wrong_initial_buffer_length_rejected() {
        let err = HalfTriangularLag::new("lag", 3.0, Some(vec![0.0])).unwrap_err();
        assert!(matches!(err, ElementError::Configuration { .. }));
    }

    #[test]
    fn non_positive_lag_time_rejected() {
        assert!(HalfTriangularLag::new("lag", 0.0, None).is_err());
        assert!(HalfTriangularLag::new("lag", -2.0, None).is_err());
    }
}
