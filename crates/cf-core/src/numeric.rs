use crate::CfError;

/// Floating point type used throughout the engine.
pub type Real = f64;

/// Tolerance below which a reservoir storage is considered non-negative.
///
/// Storage more negative than this after an implicit update is a solver or
/// modeling defect and is reported as a fatal error.
pub const STORAGE_TOLERANCE: Real = 1e-9;

/// Tolerance for weight-conservation checks (splitter columns, node weights).
pub const WEIGHT_TOLERANCE: Real = 1e-9;

/// One tolerance pair for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CfError::NonFinite { what, value: v })
    }
}

/// True when the values sum to 1.0 within [`WEIGHT_TOLERANCE`].
pub fn sums_to_one(values: &[Real]) -> bool {
    (values.iter().sum::<Real>() - 1.0).abs() <= WEIGHT_TOLERANCE
}
