//! Frequency-dependent medium properties.
//!
//! A [`MediumState`] is an immutable value computed from a resolved medium
//! and an angular frequency. The FEM and transfer-matrix adapters both read
//! from it, so the physics lives in one place.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::linalg::decaying_sqrt;

/// Complex properties of a medium at one angular frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumState {
    /// Angular frequency in rad/s.
    pub omega: f64,
    pub effective: Effective,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effective {
    Fluid(FluidState),
    Elastic(ElasticState),
    EqFluid(EqFluidState),
    Biot(BiotState),
    Limp(LimpState),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidState {
    pub density: Complex64,
    pub bulk_modulus: Complex64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElasticState {
    pub density: f64,
    /// First Lamé constant, loss included.
    pub lambda: Complex64,
    /// Shear modulus, loss included.
    pub mu: Complex64,
}

/// Fluid phase of a rigid-frame porous material. `density` and
/// `bulk_modulus` are per unit volume of pore fluid; divide by the porosity
/// for the macroscopic values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqFluidState {
    pub porosity: f64,
    /// ρ_eq(ω) = α̃(ω)·ρ0
    pub density: Complex64,
    /// K_eq(ω)
    pub bulk_modulus: Complex64,
    /// Dynamic tortuosity α̃(ω).
    pub dynamic_tortuosity: Complex64,
    /// Champoux–Allard/Lafarge thermal tortuosity α'(ω).
    pub thermal_tortuosity: Complex64,
}

impl EqFluidState {
    /// Macroscopic density ρ_eq/φ.
    pub fn bulk_density(&self) -> Complex64 {
        self.density / self.porosity
    }

    /// Macroscopic bulk modulus K_eq/φ.
    pub fn bulk_stiffness(&self) -> Complex64 {
        self.bulk_modulus / self.porosity
    }
}

/// Biot poroelastic state in the classical (u, U) notation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiotState {
    pub fluid: EqFluidState,
    /// In-vacuo frame Lamé constant Â.
    pub lambda_hat: Complex64,
    /// Frame shear modulus N.
    pub shear_modulus: Complex64,
    /// Â + 2N.
    pub p_hat: Complex64,
    pub rho_11: Complex64,
    pub rho_12: Complex64,
    pub rho_22: Complex64,
    /// ρ̃11 − ρ̃12²/ρ̃22.
    pub rho_til: Complex64,
    /// Frame/fluid coupling γ̃ = φ(ρ̃12/ρ̃22 − Q̃/R̃).
    pub gamma_til: Complex64,
    pub p: Complex64,
    pub q: Complex64,
    pub r: Complex64,
    /// Wavenumbers of the two compressional waves and the shear wave.
    pub delta: [Complex64; 3],
    /// Fluid/frame displacement ratios of the three waves.
    pub mu: [Complex64; 3],
}

impl BiotState {
    /// φ(1 + Q̃/R̃), the weight of the pore pressure in the total stress.
    pub fn pressure_weight(&self) -> Complex64 {
        self.fluid.porosity * (1.0 + self.q / self.r)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimpState {
    pub fluid: EqFluidState,
    /// Macroscopic limp-frame density.
    pub density: Complex64,
}

/// Macroscopic density and bulk modulus of a medium that behaves like a fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acoustic {
    pub density: Complex64,
    pub bulk_modulus: Complex64,
}

impl Acoustic {
    pub fn wavenumber(&self, omega: f64) -> Complex64 {
        omega * (self.density / self.bulk_modulus).sqrt()
    }

    /// Wavenumber across the layers for a trace wavenumber `kx`.
    pub fn normal_wavenumber(&self, omega: f64, kx: Complex64) -> Complex64 {
        let k = self.wavenumber(omega);
        decaying_sqrt(k * k - kx * kx)
    }

    /// v3/p of a wave travelling towards +z: k3/(ωρ).
    pub fn admittance(&self, omega: f64, kx: Complex64) -> Complex64 {
        self.normal_wavenumber(omega, kx) / (omega * self.density)
    }
}

impl MediumState {
    /// Fluid-like view of the state, if the medium propagates a single
    /// pressure wave.
    pub fn acoustic(&self) -> Option<Acoustic> {
        match &self.effective {
            Effective::Fluid(f) => Some(Acoustic {
                density: f.density,
                bulk_modulus: f.bulk_modulus,
            }),
            Effective::EqFluid(f) => Some(Acoustic {
                density: f.bulk_density(),
                bulk_modulus: f.bulk_stiffness(),
            }),
            Effective::Limp(l) => Some(Acoustic {
                density: l.density,
                bulk_modulus: l.fluid.bulk_stiffness(),
            }),
            Effective::Elastic(_) | Effective::Biot(_) => None,
        }
    }

    /// Effective density ρ(ω): the fluid-phase ρ_eq for porous media.
    pub fn effective_density(&self) -> Complex64 {
        match &self.effective {
            Effective::Fluid(f) => f.density,
            Effective::Elastic(e) => Complex64::new(e.density, 0.0),
            Effective::EqFluid(f) => f.density,
            Effective::Biot(b) => b.fluid.density,
            Effective::Limp(l) => l.fluid.density,
        }
    }

    /// Effective bulk modulus K(ω): the fluid-phase K_eq for porous media.
    pub fn effective_bulk_modulus(&self) -> Complex64 {
        match &self.effective {
            Effective::Fluid(f) => f.bulk_modulus,
            Effective::Elastic(e) => e.lambda + e.mu * (2.0 / 3.0),
            Effective::EqFluid(f) => f.bulk_modulus,
            Effective::Biot(b) => b.fluid.bulk_modulus,
            Effective::Limp(l) => l.fluid.bulk_modulus,
        }
    }

    /// Largest wavenumber magnitude propagating in the medium, used to size
    /// finite elements.
    pub fn max_wavenumber(&self) -> f64 {
        match &self.effective {
            Effective::Elastic(e) => {
                let shear = self.omega * (e.density / e.mu).sqrt();
                let pressure = self.omega * (e.density / (e.lambda + 2.0 * e.mu)).sqrt();
                shear.norm().max(pressure.norm())
            }
            Effective::Biot(b) => b.delta.iter().map(|d| d.norm()).fold(0.0, f64::max),
            _ => self
                .acoustic()
                .map(|a| a.wavenumber(self.omega).norm())
                .unwrap_or(0.0),
        }
    }
}
