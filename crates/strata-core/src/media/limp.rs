//! Limp-frame porous medium (Panneton, JASA 122, 2007).
//!
//! The frame has mass but no stiffness, so the material reduces to an
//! equivalent fluid with a frame-inertia corrected density.

use tracing::debug;

use super::eqf::{self, JcaParams};
use super::params::Parameters;
use super::pem::{resolve_frame_density, PemInputs};
use super::state::LimpState;
use crate::constants::Air;
use crate::error::{ConfigurationError, ModelError};

pub const MODEL: &str = "limp";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimpParams {
    pub fluid: JcaParams,
    pub rho_1: f64,
}

/// Frame stiffness keys are accepted, so a PEM definition can be recast as
/// limp, but dropped here.
pub(crate) fn resolve(inputs: &PemInputs, air: Air) -> Result<LimpParams, ConfigurationError> {
    if inputs.young.is_some() || inputs.poisson.is_some() || inputs.eta.is_some() {
        debug!("limp medium: frame stiffness parameters ignored");
    }
    Ok(LimpParams {
        fluid: eqf::resolve(MODEL, &inputs.fluid, air)?,
        rho_1: resolve_frame_density(MODEL, inputs)?,
    })
}

pub(crate) fn canonical(params: &LimpParams) -> Parameters {
    let mut out = eqf::canonical(&params.fluid);
    out.insert("rho_1".to_string(), params.rho_1.into());
    out
}

pub(crate) fn evaluate(params: &LimpParams, omega: f64) -> Result<LimpState, ModelError> {
    let fluid = eqf::evaluate(&params.fluid, omega)?;
    let rho_0 = params.fluid.air.density;
    let rho_eq = fluid.bulk_density();
    // ρ_limp = (ρ_t ρ̃_eq − ρ0²) / (ρ_t + ρ̃_eq − 2ρ0)
    let rho_t = params.rho_1 + params.fluid.phi * rho_0;
    let density = (rho_t * rho_eq - rho_0 * rho_0) / (rho_t + rho_eq - 2.0 * rho_0);

    if !(density.re.is_finite() && density.im.is_finite()) || density.re <= 0.0 {
        return Err(ModelError::NonPhysical {
            quantity: "limp density",
            frequency: omega / (2.0 * std::f64::consts::PI),
        });
    }
    Ok(LimpState { fluid, density })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::eqf::JcaInputs;
    use std::f64::consts::PI;

    fn inputs(rho_1: f64) -> PemInputs {
        PemInputs {
            fluid: JcaInputs {
                phi: Some(0.98),
                sigma: Some(21000.0),
                ..Default::default()
            },
            rho_1: Some(rho_1),
            ..Default::default()
        }
    }

    #[test]
    fn test_heavy_frame_tends_to_rigid() {
        let params = resolve(&inputs(1e9), Air::default()).unwrap();
        let s = evaluate(&params, 2.0 * PI * 800.0).unwrap();
        let rigid = s.fluid.bulk_density();
        assert!((s.density - rigid).norm() / rigid.norm() < 1e-6);
    }

    #[test]
    fn test_light_frame_lowers_density() {
        let params = resolve(&inputs(10.0), Air::default()).unwrap();
        let s = evaluate(&params, 2.0 * PI * 100.0).unwrap();
        assert!(s.density.norm() < s.fluid.bulk_density().norm());
    }

    #[test]
    fn test_frame_density_required() {
        let mut i = inputs(10.0);
        i.rho_1 = None;
        assert_eq!(
            resolve(&i, Air::default()).unwrap_err(),
            ConfigurationError::UnderDetermined {
                model: MODEL,
                missing: "rho_1"
            }
        );
    }
}
