//! Coefficients scaling the reference element matrices of each medium.

use num_complex::Complex64;
use serde::Serialize;

use crate::media::state::{Effective, MediumState};

/// Scale factors of the element matrices at one frequency.
///
/// With `Q` the mass matrix and `H` the stiffness matrix of a reference
/// element, an acoustic element is `stiffness·(H + kx²Q) − mass·Q`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PhysicalMultipliers {
    /// Pressure formulation.
    Acoustic {
        /// 1/(ρω²)
        stiffness: Complex64,
        /// 1/K
        mass: Complex64,
    },
    /// Displacement formulation.
    Elastic {
        lambda: Complex64,
        mu: Complex64,
        /// ρω²
        inertia: Complex64,
    },
    /// Mixed (u, p) formulation of Atalla, Panneton & Debergue (1998).
    Poroelastic {
        /// In-vacuo frame Lamé constant Â.
        lambda_hat: Complex64,
        /// Frame shear modulus N.
        shear: Complex64,
        /// ρ̃ω²
        inertia: Complex64,
        /// φ²/(ρ̃22ω²)
        fluid_stiffness: Complex64,
        /// φ²/R̃
        fluid_mass: Complex64,
        /// γ̃
        coupling: Complex64,
        /// φ(1 + Q̃/R̃), weight of the pore pressure in the total stress.
        pressure_weight: Complex64,
    },
}

pub fn multipliers(state: &MediumState) -> PhysicalMultipliers {
    let w2 = state.omega * state.omega;
    match &state.effective {
        Effective::Elastic(e) => PhysicalMultipliers::Elastic {
            lambda: e.lambda,
            mu: e.mu,
            inertia: Complex64::new(e.density * w2, 0.0),
        },
        Effective::Biot(b) => {
            let phi = b.fluid.porosity;
            PhysicalMultipliers::Poroelastic {
                lambda_hat: b.lambda_hat,
                shear: b.shear_modulus,
                inertia: b.rho_til * w2,
                fluid_stiffness: phi * phi / (b.rho_22 * w2),
                fluid_mass: phi * phi / b.r,
                coupling: b.gamma_til,
                pressure_weight: b.pressure_weight(),
            }
        }
        Effective::Fluid(f) => acoustic(f.density, f.bulk_modulus, w2),
        Effective::EqFluid(f) => acoustic(f.bulk_density(), f.bulk_stiffness(), w2),
        Effective::Limp(l) => acoustic(l.density, l.fluid.bulk_stiffness(), w2),
    }
}

fn acoustic(density: Complex64, bulk_modulus: Complex64, w2: f64) -> PhysicalMultipliers {
    PhysicalMultipliers::Acoustic {
        stiffness: 1.0 / (density * w2),
        mass: 1.0 / bulk_modulus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::state::FluidState;

    #[test]
    fn test_acoustic_multipliers() {
        let state = MediumState {
            omega: 10.0,
            effective: Effective::Fluid(FluidState {
                density: Complex64::new(2.0, 0.0),
                bulk_modulus: Complex64::new(4.0, 0.0),
            }),
        };
        let PhysicalMultipliers::Acoustic { stiffness, mass } = multipliers(&state) else {
            panic!("fluid should give acoustic multipliers");
        };
        assert!((stiffness - 1.0 / 200.0).norm() < 1e-15);
        assert!((mass - 0.25).norm() < 1e-15);
    }
}
