//! Integration test: a single linear reservoir against the analytic
//! solution `q(t) = S0 * k * e^(-k*t)`.
//!
//! The implicit update is first-order in dt, so the comparison runs at a
//! small timestep where the discretization error stays well inside the
//! asserted tolerance.

use cf_core::{Tolerances, nearly_equal};
use cf_elements::{Element, PowerLawReservoir, StepContext};
use cf_solver::Pegasus;

#[test]
fn linear_reservoir_matches_analytic_decay() {
    let k = 0.1;
    let s0 = 100.0;
    let dt = 0.01;
    let mut reservoir = PowerLawReservoir::new("linear", k, 1.0, s0, Pegasus::default()).unwrap();

    // 50 time units, sampled every whole unit.
    let substeps = (1.0 / dt) as usize;
    for time_unit in 1..=50 {
        let mut discharge = 0.0;
        for sub in 0..substeps {
            let ctx = StepContext {
                dt,
                step: (time_unit - 1) * substeps + sub,
            };
            discharge = reservoir.step(&[0.0], ctx).unwrap()[0];
        }
        let t = time_unit as f64;
        let expected = s0 * k * (-k * t).exp();
        let relative = (discharge - expected).abs() / expected;
        assert!(
            relative < 0.01,
            "at t={t}: discharge {discharge}, analytic {expected}, relative error {relative}"
        );
    }
}

#[test]
fn coarse_timestep_still_decays_monotonically() {
    // At dt = 1 the discrete solution is S_n = S0 / (1 + k)^n; check the
    // closed form and monotone decay over 50 timesteps.
    let k = 0.1;
    let s0 = 100.0;
    let mut reservoir = PowerLawReservoir::new("linear", k, 1.0, s0, Pegasus::default()).unwrap();

    let mut previous = f64::INFINITY;
    for step in 0..50 {
        let ctx = StepContext { dt: 1.0, step };
        let q = reservoir.step(&[0.0], ctx).unwrap()[0];
        assert!(q < previous, "discharge must decay monotonically");
        let expected_storage = s0 / (1.0 + k).powi(step as i32 + 1);
        let tol = Tolerances {
            abs: 1e-6,
            rel: 1e-6,
        };
        assert!(nearly_equal(reservoir.storage().unwrap(), expected_storage, tol));
        previous = q;
    }
}
