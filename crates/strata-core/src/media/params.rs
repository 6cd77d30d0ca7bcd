use std::collections::BTreeMap;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Relative tolerance used when an over-determined parameter set is checked
/// for consistency.
pub const CONSISTENCY_TOLERANCE: f64 = 1e-6;

/// A single named parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Real(f64),
    Complex { re: f64, im: f64 },
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Real(value)
    }
}

impl From<Complex64> for ParamValue {
    fn from(value: Complex64) -> Self {
        if value.im == 0.0 {
            ParamValue::Real(value.re)
        } else {
            ParamValue::Complex { re: value.re, im: value.im }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Named parameter mapping of a medium definition.
pub type Parameters = BTreeMap<String, ParamValue>;

/// Consumes a [`Parameters`] map key by key and rejects whatever is left.
pub(crate) struct ParamReader {
    model: &'static str,
    remaining: Parameters,
}

impl ParamReader {
    pub(crate) fn new(model: &'static str, params: &Parameters) -> Self {
        Self {
            model,
            remaining: params.clone(),
        }
    }

    pub(crate) fn real(&mut self, key: &str) -> Result<Option<f64>, ConfigurationError> {
        match self.remaining.remove(key) {
            None => Ok(None),
            Some(ParamValue::Real(v)) => Ok(Some(v)),
            Some(ParamValue::Complex { re, im }) if im == 0.0 => Ok(Some(re)),
            Some(_) => Err(ConfigurationError::InvalidType {
                key: key.to_string(),
                expected: "real number",
            }),
        }
    }

    pub(crate) fn complex(&mut self, key: &str) -> Result<Option<Complex64>, ConfigurationError> {
        match self.remaining.remove(key) {
            None => Ok(None),
            Some(ParamValue::Real(v)) => Ok(Some(Complex64::new(v, 0.0))),
            Some(ParamValue::Complex { re, im }) => Ok(Some(Complex64::new(re, im))),
            Some(ParamValue::Text(_)) => Err(ConfigurationError::InvalidType {
                key: key.to_string(),
                expected: "number",
            }),
        }
    }

    pub(crate) fn text(&mut self, key: &str) -> Result<Option<String>, ConfigurationError> {
        match self.remaining.remove(key) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s)),
            Some(_) => Err(ConfigurationError::InvalidType {
                key: key.to_string(),
                expected: "text",
            }),
        }
    }

    /// Fails on the first key nobody asked for.
    pub(crate) fn finish(self) -> Result<(), ConfigurationError> {
        match self.remaining.into_keys().next() {
            None => Ok(()),
            Some(key) => Err(ConfigurationError::UnknownParameter {
                model: self.model,
                key,
            }),
        }
    }
}

/// Rejects a definition that sets one key of each exclusive group.
pub(crate) fn exclusive<A, B>(
    first: (&str, &Option<A>),
    second: (&str, &Option<B>),
) -> Result<(), ConfigurationError> {
    if first.1.is_some() && second.1.is_some() {
        return Err(ConfigurationError::MutuallyExclusive {
            first: first.0.to_string(),
            second: second.0.to_string(),
        });
    }
    Ok(())
}

/// Returns the given value, or fails when it is set but outside `ok`.
pub(crate) fn check_range(
    key: &'static str,
    value: f64,
    valid: &'static str,
    ok: impl Fn(f64) -> bool,
) -> Result<f64, ConfigurationError> {
    if value.is_finite() && ok(value) {
        Ok(value)
    } else {
        Err(ConfigurationError::OutOfRange { key, value, valid })
    }
}

/// Compares a user-given value with the one derived from other parameters.
pub(crate) fn check_consistent(
    key: &'static str,
    given: f64,
    derived: f64,
) -> Result<(), ConfigurationError> {
    let scale = given.abs().max(derived.abs()).max(f64::MIN_POSITIVE);
    if (given - derived).abs() / scale > CONSISTENCY_TOLERANCE {
        return Err(ConfigurationError::Inconsistent { key, given, derived });
    }
    Ok(())
}

/// Complex counterpart of [`check_consistent`]; reports the magnitudes.
pub(crate) fn check_consistent_complex(
    key: &'static str,
    given: Complex64,
    derived: Complex64,
) -> Result<(), ConfigurationError> {
    let scale = given.norm().max(derived.norm()).max(f64::MIN_POSITIVE);
    if (given - derived).norm() / scale > CONSISTENCY_TOLERANCE {
        return Err(ConfigurationError::Inconsistent {
            key,
            given: given.norm(),
            derived: derived.norm(),
        });
    }
    Ok(())
}

pub(crate) fn require<T: Copy>(
    model: &'static str,
    missing: &'static str,
    value: Option<T>,
) -> Result<T, ConfigurationError> {
    value.ok_or(ConfigurationError::UnderDetermined { model, missing })
}
