//! Exact-key-set validation for parameter maps.

use crate::error::{ElementError, ElementResult};
use cf_core::Real;
use std::collections::BTreeMap;

/// Extract exactly the named keys from a parameter map, in order.
///
/// The key set must match the element's constitutive equation exactly:
/// a missing key and an unknown key are both construction-time errors.
pub(crate) fn take_exact(
    element: &str,
    parameters: &BTreeMap<String, Real>,
    keys: &[&str],
) -> ElementResult<Vec<Real>> {
    for name in parameters.keys() {
        if !keys.contains(&name.as_str()) {
            return Err(ElementError::UnknownParameter {
                element: element.to_string(),
                name: name.clone(),
            });
        }
    }

    keys.iter()
        .map(|&name| {
            parameters
                .get(name)
                .copied()
                .ok_or_else(|| ElementError::MissingParameter {
                    element: element.to_string(),
                    name: name.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, Real)]) -> BTreeMap<String, Real> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn takes_values_in_key_order() {
        let params = map(&[("alpha", 3.0), ("k", 0.01)]);
        let values = take_exact("fast", &params, &["k", "alpha"]).unwrap();
        assert_eq!(values, vec![0.01, 3.0]);
    }

    #[test]
    fn missing_key_is_an_error() {
        let params = map(&[("k", 0.01)]);
        let err = take_exact("fast", &params, &["k", "alpha"]).unwrap_err();
        assert!(matches!(err, ElementError::MissingParameter { .. }));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let params = map(&[("k", 0.01), ("alpha", 1.0), ("gamma", 2.0)]);
        let err = take_exact("fast", &params, &["k", "alpha"]).unwrap_err();
        assert!(matches!(err, ElementError::UnknownParameter { .. }));
    }
}
