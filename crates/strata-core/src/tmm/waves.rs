//! Plane-wave bases of each kind of medium.
//!
//! Every wave varies as e^{−j(kx·x + s·k3·z)} with s = +1 for waves going
//! towards the back of the layer and s = −1 for waves coming back. The state
//! vectors are:
//!
//! * fluid-like: `[p, v3]`;
//! * elastic: `[v1, v3, σ33, σ13]`;
//! * Biot: `[v1ˢ, v3ˢ, v3ᶠ, σ33ˢ, σ13ˢ, σ33ᶠ]`, with partial stresses of the
//!   frame and of the fluid (Allard & Atalla 2009, chapter 11).

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::SolverError;
use crate::linalg::decaying_sqrt;
use crate::media::state::{Acoustic, BiotState, Effective, ElasticState, MediumState};

/// The state-vector flavour of a layer.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Acoustic(Acoustic),
    Elastic(&'a ElasticState),
    Biot(&'a BiotState),
}

impl<'a> Field<'a> {
    pub fn of(state: &'a MediumState) -> Self {
        match &state.effective {
            Effective::Elastic(e) => Field::Elastic(e),
            Effective::Biot(b) => Field::Biot(b),
            Effective::Fluid(f) => Field::Acoustic(Acoustic {
                density: f.density,
                bulk_modulus: f.bulk_modulus,
            }),
            Effective::EqFluid(f) => Field::Acoustic(Acoustic {
                density: f.bulk_density(),
                bulk_modulus: f.bulk_stiffness(),
            }),
            Effective::Limp(l) => Field::Acoustic(Acoustic {
                density: l.density,
                bulk_modulus: l.fluid.bulk_stiffness(),
            }),
        }
    }

    /// Length of the state vector.
    pub fn size(&self) -> usize {
        match self {
            Field::Acoustic(_) => 2,
            Field::Elastic(_) => 4,
            Field::Biot(_) => 6,
        }
    }

    /// Positions of the velocity components in the state vector.
    pub fn velocities(&self) -> &'static [usize] {
        match self {
            Field::Acoustic(_) => &[1],
            Field::Elastic(_) => &[0, 1],
            Field::Biot(_) => &[0, 1, 2],
        }
    }

    /// Wave basis Φ (one column per wave, forward waves first) and the
    /// signed normal wavenumber s·k3 of every column.
    pub fn basis(&self, omega: f64, kx: Complex64) -> (DMatrix<Complex64>, Vec<Complex64>) {
        let j = Complex64::new(0.0, 1.0);
        let jw = j * omega;
        let n = self.size();
        let half = n / 2;
        let mut phi = DMatrix::zeros(n, n);
        let mut exponents = vec![Complex64::new(0.0, 0.0); n];

        match self {
            Field::Acoustic(a) => {
                let k3 = a.normal_wavenumber(omega, kx);
                let y = k3 / (omega * a.density);
                for (col, s) in [(0, 1.0), (1, -1.0)] {
                    phi[(0, col)] = Complex64::new(1.0, 0.0);
                    phi[(1, col)] = s * y;
                    exponents[col] = s * k3;
                }
            }
            Field::Elastic(e) => {
                let (lambda, mu) = (e.lambda, e.mu);
                let w2rho = omega * omega * e.density;
                let delta_p2 = w2rho / (lambda + 2.0 * mu);
                let delta_s2 = w2rho / mu;
                let k3p = decaying_sqrt(delta_p2 - kx * kx);
                let k3s = decaying_sqrt(delta_s2 - kx * kx);
                for (offset, s) in [(0, 1.0), (half, -1.0)] {
                    let col = offset;
                    phi[(0, col)] = jw * kx;
                    phi[(1, col)] = jw * s * k3p;
                    phi[(2, col)] = -j * (lambda * delta_p2 + 2.0 * mu * k3p * k3p);
                    phi[(3, col)] = -2.0 * j * mu * s * kx * k3p;
                    exponents[col] = s * k3p;

                    let col = offset + 1;
                    phi[(0, col)] = -jw * s * k3s;
                    phi[(1, col)] = jw * kx;
                    phi[(2, col)] = -2.0 * j * mu * s * kx * k3s;
                    phi[(3, col)] = j * mu * (k3s * k3s - kx * kx);
                    exponents[col] = s * k3s;
                }
            }
            Field::Biot(b) => {
                let n_mod = b.shear_modulus;
                for (offset, s) in [(0, 1.0), (half, -1.0)] {
                    for i in 0..2 {
                        let delta2 = b.delta[i] * b.delta[i];
                        let k3 = decaying_sqrt(delta2 - kx * kx);
                        let mu_i = b.mu[i];
                        let col = offset + i;
                        phi[(0, col)] = jw * kx;
                        phi[(1, col)] = jw * s * k3;
                        phi[(2, col)] = jw * mu_i * s * k3;
                        phi[(3, col)] = -j * ((b.p - 2.0 * n_mod + b.q * mu_i) * delta2 + 2.0 * n_mod * k3 * k3);
                        phi[(4, col)] = -2.0 * j * n_mod * s * kx * k3;
                        phi[(5, col)] = -j * (b.q + b.r * mu_i) * delta2;
                        exponents[col] = s * k3;
                    }

                    let k3 = decaying_sqrt(b.delta[2] * b.delta[2] - kx * kx);
                    let col = offset + 2;
                    phi[(0, col)] = -jw * s * k3;
                    phi[(1, col)] = jw * kx;
                    phi[(2, col)] = jw * b.mu[2] * kx;
                    phi[(3, col)] = -2.0 * j * n_mod * s * kx * k3;
                    phi[(4, col)] = j * n_mod * (k3 * k3 - kx * kx);
                    exponents[col] = s * k3;
                }
            }
        }
        (phi, exponents)
    }

    /// Matrix T with V(front) = T·V(back) across a layer of thickness `h`:
    /// T = Φ·diag(e^{j·s·k3·h})·Φ⁻¹.
    pub fn layer_matrix(&self, omega: f64, kx: Complex64, h: f64) -> Result<DMatrix<Complex64>, SolverError> {
        let j = Complex64::new(0.0, 1.0);
        let (phi, exponents) = self.basis(omega, kx);
        let n = phi.nrows();
        let inverse = phi.clone().try_inverse().ok_or(SolverError::Singular { size: n })?;
        let mut propagated = phi;
        for (col, k) in exponents.iter().enumerate() {
            let factor = (j * k * h).exp();
            for z in propagated.column_mut(col).iter_mut() {
                *z *= factor;
            }
        }
        Ok(propagated * inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer_matrix::TransferMatrix;

    fn air() -> Acoustic {
        Acoustic {
            density: Complex64::new(1.213, 0.0),
            bulk_modulus: Complex64::new(1.4 * 101325.0, 0.0),
        }
    }

    #[test]
    fn test_acoustic_layer_matches_closed_form() {
        let omega = 2.0 * std::f64::consts::PI * 800.0;
        let kx = Complex64::new(5.0, 0.0);
        let field = Field::Acoustic(air());
        let t = field.layer_matrix(omega, kx, 0.07).unwrap();

        let a = air();
        let k3 = a.normal_wavenumber(omega, kx);
        let reference = TransferMatrix::layer(k3, a.admittance(omega, kx), 0.07);
        assert!((t[(0, 0)] - reference.a).norm() < 1e-10);
        assert!((t[(0, 1)] - reference.b).norm() < 1e-10 * reference.b.norm());
        assert!((t[(1, 0)] - reference.c).norm() < 1e-10);
        assert!((t[(1, 1)] - reference.d).norm() < 1e-10);
    }

    #[test]
    fn test_thin_elastic_layer_is_a_mass() {
        // σ33(0) = σ33(h) − jωρh·v3 to first order in h
        let steel = ElasticState {
            density: 7800.0,
            lambda: Complex64::new(1.15e11, 1e9),
            mu: Complex64::new(7.7e10, 7e8),
        };
        let omega = 2.0 * std::f64::consts::PI * 500.0;
        let h = 1e-6;
        let t = Field::Elastic(&steel)
            .layer_matrix(omega, Complex64::new(0.0, 0.0), h)
            .unwrap();
        let expected = Complex64::new(0.0, -omega * 7800.0 * h);
        assert!((t[(2, 1)] - expected).norm() < 1e-6 * expected.norm(), "T = {}", t[(2, 1)]);
        assert!((t[(1, 1)] - 1.0).norm() < 1e-6);
    }

    #[test]
    fn test_elastic_columns_are_traction_consistent() {
        // In the fluid limit μ → 0 the P-wave column carries σ33 = −p
        let fluid_like = ElasticState {
            density: 1000.0,
            lambda: Complex64::new(2.25e9, 0.0),
            mu: Complex64::new(1e-6, 0.0),
        };
        let omega = 1000.0;
        let (phi, _) = Field::Elastic(&fluid_like).basis(omega, Complex64::new(0.0, 0.0));
        let k = omega * (1000.0_f64 / 2.25e9).sqrt();
        // displacement amplitude 1: v3 = jωk, σ33 = −jλk², and p = jλk²
        let y = phi[(1, 0)] / (-phi[(2, 0)]);
        let expected = k / (omega * 1000.0);
        assert!((y - Complex64::new(expected, 0.0)).norm() < 1e-9 * expected);
    }
}
