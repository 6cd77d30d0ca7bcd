//! Biot poroelastic medium with a JCA fluid phase.
//!
//! Notation follows Allard & Atalla (2009), chapter 6: solid displacement u,
//! fluid displacement U, dynamic densities ρ̃11, ρ̃12, ρ̃22 and elastic
//! coefficients P̃, Q̃, R̃ (Biot 1956, with incompressible grains).

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::elastic::check_engineering_constants;
use super::eqf::{self, JcaInputs, JcaParams};
use super::params::{check_range, require, ParamReader, Parameters};
use super::state::BiotState;
use crate::constants::Air;
use crate::error::{ConfigurationError, ModelError};

pub const MODEL: &str = "pem";

/// Damping model of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameLoss {
    /// Frequency-independent loss factor: moduli scaled by (1 + jη).
    #[default]
    Structural,
    None,
}

impl FrameLoss {
    fn parse(value: &str) -> Result<Self, ConfigurationError> {
        match value {
            "structural" => Ok(Self::Structural),
            "none" => Ok(Self::None),
            "anelastic" => Err(ConfigurationError::Unsupported {
                details: "anelastic frame losses are not implemented".to_string(),
            }),
            other => Err(ConfigurationError::Unsupported {
                details: format!("unknown loss_type `{other}`"),
            }),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::None => "none",
        }
    }

    fn factor(self, eta: f64) -> Complex64 {
        match self {
            Self::Structural => Complex64::new(1.0, eta),
            Self::None => Complex64::new(1.0, 0.0),
        }
    }
}

/// Poroelastic definition as given. Shared with the limp model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PemInputs {
    pub fluid: JcaInputs,
    /// Frame density ρ1 (mass of solid per unit volume of aggregate).
    pub rho_1: Option<f64>,
    pub young: Option<f64>,
    pub poisson: Option<f64>,
    pub eta: Option<f64>,
    pub loss_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PemParams {
    pub fluid: JcaParams,
    pub rho_1: f64,
    pub young: f64,
    pub poisson: f64,
    pub eta: f64,
    pub loss: FrameLoss,
    /// Static inertial coupling ρ12 = −φρ0(α∞ − 1).
    pub rho_12: f64,
    /// ρ11 = ρ1 − ρ12.
    pub rho_11: f64,
    /// ρ22 = φρ0 − ρ12.
    pub rho_22: f64,
}

pub(crate) fn parse(model: &'static str, params: &Parameters) -> Result<PemInputs, ConfigurationError> {
    let mut reader = ParamReader::new(model, params);
    let inputs = PemInputs {
        fluid: eqf::read(&mut reader)?,
        rho_1: reader.real("rho_1")?,
        young: reader.real("E")?,
        poisson: reader.real("nu")?,
        eta: reader.real("eta")?,
        loss_type: reader.text("loss_type")?,
    };
    reader.finish()?;
    Ok(inputs)
}

pub(crate) fn resolve_frame_density(model: &'static str, inputs: &PemInputs) -> Result<f64, ConfigurationError> {
    let rho_1 = require(model, "rho_1", inputs.rho_1)?;
    check_range("rho_1", rho_1, "> 0", |v| v > 0.0)
}

pub(crate) fn resolve(inputs: &PemInputs, air: Air) -> Result<PemParams, ConfigurationError> {
    let fluid = eqf::resolve(MODEL, &inputs.fluid, air)?;
    let rho_1 = resolve_frame_density(MODEL, inputs)?;
    let young = require(MODEL, "E", inputs.young)?;
    let poisson = require(MODEL, "nu", inputs.poisson)?;
    check_engineering_constants(young, poisson)?;
    let eta = check_range("eta", inputs.eta.unwrap_or(0.0), ">= 0", |v| v >= 0.0)?;
    let loss = match inputs.loss_type.as_deref() {
        Some(value) => FrameLoss::parse(value)?,
        None => FrameLoss::default(),
    };

    let rho_12 = -fluid.phi * air.density * (fluid.alpha - 1.0);
    Ok(PemParams {
        fluid,
        rho_1,
        young,
        poisson,
        eta,
        loss,
        rho_12,
        rho_11: rho_1 - rho_12,
        rho_22: fluid.phi * air.density - rho_12,
    })
}

pub(crate) fn canonical(params: &PemParams) -> Parameters {
    let mut out = eqf::canonical(&params.fluid);
    out.insert("rho_1".to_string(), params.rho_1.into());
    out.insert("E".to_string(), params.young.into());
    out.insert("nu".to_string(), params.poisson.into());
    out.insert("eta".to_string(), params.eta.into());
    out.insert("loss_type".to_string(), params.loss.as_str().into());
    out
}

pub(crate) fn evaluate(params: &PemParams, omega: f64) -> Result<BiotState, ModelError> {
    let fluid = eqf::evaluate(&params.fluid, omega)?;
    let phi = params.fluid.phi;
    let rho_0 = params.fluid.air.density;

    let loss = params.loss.factor(params.eta);
    let (e, nu) = (params.young, params.poisson);
    let shear_modulus = e / (2.0 * (1.0 + nu)) * loss;
    let lambda_hat = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu)) * loss;
    let p_hat = lambda_hat + 2.0 * shear_modulus;

    // viscous drag b/(jω) on top of the static inertial couplings
    let drag = phi * (fluid.density - params.fluid.alpha * rho_0);
    let rho_11 = params.rho_11 + drag;
    let rho_12 = params.rho_12 - drag;
    let rho_22 = params.rho_22 + drag;
    let rho_til = rho_11 - rho_12 * rho_12 / rho_22;

    let r = phi * fluid.bulk_modulus;
    let q = (1.0 - phi) * fluid.bulk_modulus;
    let p = p_hat + q * q / r;
    let gamma_til = phi * (rho_12 / rho_22 - q / r);

    let w2 = omega * omega;
    let sum = p * rho_22 + r * rho_11 - 2.0 * q * rho_12;
    let stiffness_det = p * r - q * q;
    let inertia_det = rho_11 * rho_22 - rho_12 * rho_12;
    let discriminant = (sum * sum - 4.0 * stiffness_det * inertia_det).sqrt();
    let delta_1_sq = w2 / (2.0 * stiffness_det) * (sum - discriminant);
    let delta_2_sq = w2 / (2.0 * stiffness_det) * (sum + discriminant);
    let delta_3_sq = w2 * rho_til / shear_modulus;

    let ratio = |delta_sq: Complex64| (p * delta_sq - w2 * rho_11) / (w2 * rho_12 - q * delta_sq);
    let mu = [ratio(delta_1_sq), ratio(delta_2_sq), -rho_12 / rho_22];
    let delta = [delta_1_sq.sqrt(), delta_2_sq.sqrt(), delta_3_sq.sqrt()];

    let frequency = omega / (2.0 * std::f64::consts::PI);
    if rho_11.re <= 0.0 {
        return Err(ModelError::NonPhysical {
            quantity: "frame apparent density",
            frequency,
        });
    }
    let finite = |z: &Complex64| z.re.is_finite() && z.im.is_finite();
    if !(delta.iter().all(finite) && mu.iter().all(finite)) {
        return Err(ModelError::NonPhysical {
            quantity: "Biot wavenumbers",
            frequency,
        });
    }

    Ok(BiotState {
        fluid,
        lambda_hat,
        shear_modulus,
        p_hat,
        rho_11,
        rho_12,
        rho_22,
        rho_til,
        gamma_til,
        p,
        q,
        r,
        delta,
        mu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn foam() -> PemInputs {
        PemInputs {
            fluid: JcaInputs {
                phi: Some(0.99),
                sigma: Some(10900.0),
                alpha: Some(1.02),
                viscous_length: Some(100e-6),
                thermal_length: Some(130e-6),
                thermal_permeability: None,
            },
            rho_1: Some(8.43),
            young: Some(4.4e6),
            poisson: Some(0.3),
            eta: Some(0.1),
            loss_type: None,
        }
    }

    #[test]
    fn test_static_couplings() {
        let p = resolve(&foam(), Air::default()).unwrap();
        let rho_0 = Air::default().density;
        assert!((p.rho_12 + 0.99 * rho_0 * 0.02).abs() < 1e-12);
        assert!((p.rho_11 + p.rho_12 - 8.43).abs() < 1e-12);
        assert!((p.rho_22 + p.rho_12 - 0.99 * rho_0).abs() < 1e-12);
    }

    /// The dynamic densities are the static ones plus the viscous drag, so
    /// ρ̃22 = φρ_eq and ρ̃11 + ρ̃12 = ρ1 at every frequency, and the drag
    /// vanishes at high frequency.
    #[test]
    fn test_dynamic_densities_extend_static_ones() {
        let params = resolve(&foam(), Air::default()).unwrap();
        for f in [50.0, 1000.0, 20_000.0] {
            let s = evaluate(&params, 2.0 * PI * f).unwrap();
            assert!((s.rho_22 - 0.99 * s.fluid.density).norm() < 1e-12 * s.rho_22.norm());
            assert!((s.rho_11 + s.rho_12 - 8.43).norm() < 1e-12);
        }
        let s = evaluate(&params, 1e10).unwrap();
        assert!((s.rho_22 - params.rho_22).norm() < 1e-2 * params.rho_22);
        assert!((s.rho_12 - params.rho_12).norm() < 1e-2 * params.rho_22);
    }

    #[test]
    fn test_wavenumbers_solve_dispersion_relation() {
        let params = resolve(&foam(), Air::default()).unwrap();
        let omega = 2.0 * PI * 500.0;
        let s = evaluate(&params, omega).unwrap();
        let w2 = omega * omega;
        for i in 0..2 {
            let d2 = s.delta[i] * s.delta[i];
            // det [[Pδ² − ω²ρ11, Qδ² − ω²ρ12], [Qδ² − ω²ρ12, Rδ² − ω²ρ22]] = 0
            let a = s.p * d2 - w2 * s.rho_11;
            let b = s.q * d2 - w2 * s.rho_12;
            let c = s.r * d2 - w2 * s.rho_22;
            let det = a * c - b * b;
            let scale = (a * c).norm().max((b * b).norm());
            assert!(det.norm() / scale < 1e-8, "wave {i}: det = {det}");
        }
    }

    #[test]
    fn test_pressure_weight_is_unity() {
        let params = resolve(&foam(), Air::default()).unwrap();
        let s = evaluate(&params, 2.0 * PI * 1000.0).unwrap();
        assert!((s.pressure_weight() - 1.0).norm() < 1e-12);
    }

    #[test]
    fn test_anelastic_loss_unsupported() {
        let mut inputs = foam();
        inputs.loss_type = Some("anelastic".to_string());
        assert!(matches!(
            resolve(&inputs, Air::default()),
            Err(ConfigurationError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_frame_is_required() {
        let mut inputs = foam();
        inputs.young = None;
        assert_eq!(
            resolve(&inputs, Air::default()).unwrap_err(),
            ConfigurationError::UnderDetermined {
                model: MODEL,
                missing: "E"
            }
        );
    }
}
