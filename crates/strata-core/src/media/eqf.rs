//! Johnson–Champoux–Allard(–Lafarge) equivalent fluid.
//!
//! The rigid-frame porous material is replaced by a fluid whose density and
//! bulk modulus carry the viscous and thermal losses of the pore network:
//!
//! * ρ_eq(ω) = α∞ρ0 [1 + σφ/(jωα∞ρ0) · G(ω)], with Johnson's
//!   G(ω) = √(1 + jω · 4α∞²ηρ0 / (σ²Λ²φ²));
//! * K_eq(ω) = γP0 / (γ − (γ−1)/α'(ω)), with Lafarge's
//!   α'(ω) = 1 + φν'/(jωk0') · √(1 + jω · 4k0'² / (ν'Λ'²φ²)).
//!
//! Without a thermal permeability k0' the Champoux–Allard form is used, which
//! is the Lafarge form at k0' = φΛ'²/8.
//!
//! References: Johnson, Koplik & Dashen (1987); Champoux & Allard (1991);
//! Lafarge et al. (1997); Allard & Atalla, *Propagation of Sound in Porous
//! Media* (2009).

use num_complex::Complex64;

use super::params::{check_range, require, ParamReader, Parameters};
use super::state::EqFluidState;
use crate::constants::Air;
use crate::error::{ConfigurationError, ModelError};

pub const MODEL: &str = "eqf";

/// Microstructural parameters as given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JcaInputs {
    pub phi: Option<f64>,
    pub sigma: Option<f64>,
    pub alpha: Option<f64>,
    pub viscous_length: Option<f64>,
    pub thermal_length: Option<f64>,
    pub thermal_permeability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JcaParams {
    /// Porosity φ.
    pub phi: f64,
    /// Static airflow resistivity σ in N·s/m⁴.
    pub sigma: f64,
    /// High-frequency tortuosity α∞.
    pub alpha: f64,
    /// Viscous characteristic length Λ in m.
    pub viscous_length: f64,
    /// Thermal characteristic length Λ' in m.
    pub thermal_length: f64,
    /// Static thermal permeability k0' in m², when known.
    pub thermal_permeability: Option<f64>,
    pub air: Air,
}

/// Reads the JCA keys and leaves the rest of the map to the caller.
pub(crate) fn read(reader: &mut ParamReader) -> Result<JcaInputs, ConfigurationError> {
    Ok(JcaInputs {
        phi: reader.real("phi")?,
        sigma: reader.real("sigma")?,
        alpha: reader.real("alpha")?,
        viscous_length: reader.real("Lambda")?,
        thermal_length: reader.real("Lambda_prime")?,
        thermal_permeability: reader.real("k0_prime")?,
    })
}

pub(crate) fn parse(params: &Parameters) -> Result<JcaInputs, ConfigurationError> {
    let mut reader = ParamReader::new(MODEL, params);
    let inputs = read(&mut reader)?;
    reader.finish()?;
    Ok(inputs)
}

/// Berryman's tortuosity for a packing of spheres.
pub fn tortuosity_from_porosity(phi: f64) -> f64 {
    1.0 + (1.0 / phi - 1.0) / 2.0
}

/// Johnson's viscous length for cylindrical pores (shape factor 1).
pub fn viscous_length_from_resistivity(phi: f64, sigma: f64, alpha: f64, viscosity: f64) -> f64 {
    (8.0 * alpha * viscosity / (sigma * phi)).sqrt()
}

/// Ratio Λ'/Λ used when the thermal length is not given.
pub const THERMAL_TO_VISCOUS_RATIO: f64 = 2.0;

pub(crate) fn resolve(
    model: &'static str,
    inputs: &JcaInputs,
    air: Air,
) -> Result<JcaParams, ConfigurationError> {
    let phi = require(model, "phi", inputs.phi)?;
    check_range("phi", phi, "in (0, 1]", |v| v > 0.0 && v <= 1.0)?;
    let sigma = require(model, "sigma", inputs.sigma)?;
    check_range("sigma", sigma, ">= 0", |v| v >= 0.0)?;

    let alpha = match inputs.alpha {
        Some(alpha) => alpha,
        None => tortuosity_from_porosity(phi),
    };
    check_range("alpha", alpha, ">= 1", |v| v >= 1.0)?;

    let viscous_length = match inputs.viscous_length {
        Some(length) => length,
        None if sigma > 0.0 => viscous_length_from_resistivity(phi, sigma, alpha, air.viscosity),
        None => {
            return Err(ConfigurationError::UnderDetermined {
                model,
                missing: "Lambda",
            })
        }
    };
    check_range("Lambda", viscous_length, "> 0", |v| v > 0.0)?;

    let thermal_length = inputs
        .thermal_length
        .unwrap_or(THERMAL_TO_VISCOUS_RATIO * viscous_length);
    check_range("Lambda_prime", thermal_length, "> 0", |v| v > 0.0)?;

    if let Some(k0) = inputs.thermal_permeability {
        check_range("k0_prime", k0, "> 0", |v| v > 0.0)?;
    }

    Ok(JcaParams {
        phi,
        sigma,
        alpha,
        viscous_length,
        thermal_length,
        thermal_permeability: inputs.thermal_permeability,
        air,
    })
}

pub(crate) fn write(params: &JcaParams, out: &mut Parameters) {
    out.insert("phi".to_string(), params.phi.into());
    out.insert("sigma".to_string(), params.sigma.into());
    out.insert("alpha".to_string(), params.alpha.into());
    out.insert("Lambda".to_string(), params.viscous_length.into());
    out.insert("Lambda_prime".to_string(), params.thermal_length.into());
    if let Some(k0) = params.thermal_permeability {
        out.insert("k0_prime".to_string(), k0.into());
    }
}

pub(crate) fn canonical(params: &JcaParams) -> Parameters {
    let mut out = Parameters::new();
    write(params, &mut out);
    out
}

/// Fluid-phase density and bulk modulus at angular frequency `omega`.
pub(crate) fn evaluate(params: &JcaParams, omega: f64) -> Result<EqFluidState, ModelError> {
    let j = Complex64::new(0.0, 1.0);
    let air = &params.air;
    let rho_0 = air.density;
    let phi = params.phi;
    let alpha = params.alpha;

    // σφ/(jωα∞ρ0)·G(ω) written as φ/(jωα∞ρ0)·√(σ² + jω·4α∞²ηρ0/(Λ²φ²)),
    // which stays finite when σ vanishes.
    let boundary_layer =
        j * omega * 4.0 * alpha * alpha * air.viscosity * rho_0 / (params.viscous_length * phi).powi(2);
    let viscous = phi / (j * omega * alpha * rho_0) * (boundary_layer + params.sigma * params.sigma).sqrt();
    let dynamic_tortuosity = alpha * (1.0 + viscous);
    let density = rho_0 * dynamic_tortuosity;

    let nu_prime = air.thermal_diffusivity();
    let k0 = params
        .thermal_permeability
        .unwrap_or(phi * params.thermal_length * params.thermal_length / 8.0);
    let thermal_ratio = phi * nu_prime / k0;
    let thermal = (thermal_ratio * thermal_ratio
        + j * omega * 4.0 * nu_prime / (params.thermal_length * params.thermal_length))
        .sqrt()
        / (j * omega);
    let thermal_tortuosity = 1.0 + thermal;
    let gamma = air.gamma;
    let bulk_modulus = gamma * air.pressure / (gamma - (gamma - 1.0) / thermal_tortuosity);

    let frequency = omega / (2.0 * std::f64::consts::PI);
    if !(density.re.is_finite() && density.im.is_finite()) || density.re <= 0.0 {
        return Err(ModelError::NonPhysical {
            quantity: "equivalent density",
            frequency,
        });
    }
    if !(bulk_modulus.re.is_finite() && bulk_modulus.im.is_finite()) || bulk_modulus.re <= 0.0 {
        return Err(ModelError::NonPhysical {
            quantity: "equivalent bulk modulus",
            frequency,
        });
    }

    Ok(EqFluidState {
        porosity: phi,
        density,
        bulk_modulus,
        dynamic_tortuosity,
        thermal_tortuosity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn wool() -> JcaInputs {
        JcaInputs {
            phi: Some(0.98),
            sigma: Some(21000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_parameters() {
        let p = resolve(MODEL, &wool(), Air::default()).unwrap();
        assert!((p.alpha - (1.0 + (1.0 / 0.98 - 1.0) / 2.0)).abs() < 1e-15);
        let lambda = (8.0 * p.alpha * 1.839e-5 / (21000.0 * 0.98)).sqrt();
        assert!((p.viscous_length - lambda).abs() < 1e-15);
        assert!((p.thermal_length - 2.0 * lambda).abs() < 1e-15);
        assert_eq!(p.thermal_permeability, None);
    }

    #[test]
    fn test_low_frequency_density_is_resistive() {
        // At low frequency ρ_eq ≈ α∞ρ0 + σφ/(jω): the imaginary part dominates.
        let p = resolve(MODEL, &wool(), Air::default()).unwrap();
        let omega = 2.0 * PI * 1.0;
        let s = evaluate(&p, omega).unwrap();
        let expected_im = -p.sigma * p.phi / omega;
        assert!((s.density.im - expected_im).abs() / expected_im.abs() < 0.05, "{}", s.density);
        assert!(s.density.im < 0.0);
    }

    #[test]
    fn test_low_frequency_bulk_modulus_is_isothermal() {
        let p = resolve(MODEL, &wool(), Air::default()).unwrap();
        let s = evaluate(&p, 2.0 * PI * 0.01).unwrap();
        let isothermal = p.air.pressure;
        assert!((s.bulk_modulus.re - isothermal).abs() / isothermal < 0.01, "{}", s.bulk_modulus);
    }

    #[test]
    fn test_champoux_allard_matches_lafarge_default() {
        let mut inputs = wool();
        let p = resolve(MODEL, &inputs, Air::default()).unwrap();
        inputs.thermal_permeability = Some(p.phi * p.thermal_length.powi(2) / 8.0);
        let lafarge = resolve(MODEL, &inputs, Air::default()).unwrap();
        let omega = 2.0 * PI * 1000.0;
        let a = evaluate(&p, omega).unwrap();
        let b = evaluate(&lafarge, omega).unwrap();
        assert!((a.bulk_modulus - b.bulk_modulus).norm() < 1e-9 * a.bulk_modulus.norm());
    }

    #[test]
    fn test_zero_resistivity_needs_viscous_length() {
        let inputs = JcaInputs {
            phi: Some(0.99),
            sigma: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            resolve(MODEL, &inputs, Air::default()).unwrap_err(),
            ConfigurationError::UnderDetermined {
                model: MODEL,
                missing: "Lambda"
            }
        );
    }

    #[test]
    fn test_porosity_out_of_range() {
        let mut inputs = wool();
        inputs.phi = Some(0.0);
        assert!(matches!(
            resolve(MODEL, &inputs, Air::default()),
            Err(ConfigurationError::OutOfRange { key: "phi", .. })
        ));
    }
}
