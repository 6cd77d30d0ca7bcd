use num_complex::Complex64;

use super::params::{check_consistent_complex, check_range, require, ParamReader, Parameters};
use super::state::FluidState;
use crate::error::ConfigurationError;

pub const MODEL: &str = "fluid";

/// Fluid definition as given: density plus sound speed and/or bulk modulus.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FluidInputs {
    pub rho: Option<f64>,
    pub c: Option<Complex64>,
    pub bulk_modulus: Option<Complex64>,
}

/// Resolved fluid. A complex sound speed models a lossy fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidParams {
    pub rho: f64,
    pub c: Complex64,
    pub bulk_modulus: Complex64,
}

pub(crate) fn parse(params: &Parameters) -> Result<FluidInputs, ConfigurationError> {
    let mut reader = ParamReader::new(MODEL, params);
    let inputs = FluidInputs {
        rho: reader.real("rho")?,
        c: reader.complex("c")?,
        bulk_modulus: reader.complex("K")?,
    };
    reader.finish()?;
    Ok(inputs)
}

pub(crate) fn resolve(inputs: &FluidInputs) -> Result<FluidParams, ConfigurationError> {
    let rho = require(MODEL, "rho", inputs.rho)?;
    check_range("rho", rho, "> 0", |v| v > 0.0)?;

    let (c, bulk_modulus) = match (inputs.c, inputs.bulk_modulus) {
        (Some(c), Some(k)) => {
            check_consistent_complex("K", k, rho * c * c)?;
            (c, k)
        }
        (Some(c), None) => (c, rho * c * c),
        (None, Some(k)) => ((k / rho).sqrt(), k),
        (None, None) => {
            return Err(ConfigurationError::UnderDetermined {
                model: MODEL,
                missing: "c",
            })
        }
    };
    check_range("c", c.re, "real part > 0", |v| v > 0.0)?;
    check_range("K", bulk_modulus.re, "real part > 0", |v| v > 0.0)?;

    Ok(FluidParams { rho, c, bulk_modulus })
}

pub(crate) fn canonical(params: &FluidParams) -> Parameters {
    Parameters::from([
        ("rho".to_string(), params.rho.into()),
        ("c".to_string(), params.c.into()),
    ])
}

/// Fluid properties do not depend on frequency.
pub(crate) fn evaluate(params: &FluidParams) -> FluidState {
    FluidState {
        density: Complex64::new(params.rho, 0.0),
        bulk_modulus: params.bulk_modulus,
    }
}
