//! Interface matrices: I·V_left + J·V_right = 0 across the face between two
//! media, with (n_left + n_right)/2 rows.

use nalgebra::DMatrix;
use num_complex::Complex64;

use super::waves::Field;
use crate::stack::PoreCondition;

type Matrix = DMatrix<Complex64>;

fn rank(field: &Field) -> u8 {
    match field {
        Field::Acoustic(_) => 0,
        Field::Elastic(_) => 1,
        Field::Biot(_) => 2,
    }
}

fn porosity(field: &Field) -> f64 {
    match field {
        Field::Biot(b) => b.fluid.porosity,
        _ => 1.0,
    }
}

/// Interface matrices `(I, J)` for `left` in front of `right`. `pores`
/// applies when a poroelastic medium touches the face.
pub fn conditions(left: &Field, right: &Field, pores: PoreCondition) -> (Matrix, Matrix) {
    if rank(left) <= rank(right) {
        ordered(left, right, pores)
    } else {
        let (b, a) = ordered(right, left, pores);
        (a, b)
    }
}

/// Rows `A·V_a + B·V_b = 0` with `rank(a) <= rank(b)`.
fn ordered(a: &Field, b: &Field, pores: PoreCondition) -> (Matrix, Matrix) {
    let rows = (a.size() + b.size()) / 2;
    let mut ma = Matrix::zeros(rows, a.size());
    let mut mb = Matrix::zeros(rows, b.size());
    let one = Complex64::new(1.0, 0.0);

    match (a, b, pores) {
        (Field::Acoustic(_), Field::Acoustic(_), _) | (Field::Elastic(_), Field::Elastic(_), _) => {
            for i in 0..rows {
                ma[(i, i)] = one;
                mb[(i, i)] = -one;
            }
        }
        (Field::Acoustic(_), Field::Elastic(_), _) => {
            // σ33 = −p
            ma[(0, 0)] = one;
            mb[(0, 2)] = one;
            // σ13 = 0
            mb[(1, 3)] = one;
            // v3 continuous
            ma[(2, 1)] = one;
            mb[(2, 1)] = -one;
        }
        (Field::Acoustic(_), Field::Biot(_), PoreCondition::Open) => {
            let phi = porosity(b);
            // σ33ˢ = −(1−φ)p
            ma[(0, 0)] = (1.0 - phi).into();
            mb[(0, 3)] = one;
            // σ13ˢ = 0
            mb[(1, 4)] = one;
            // σ33ᶠ = −φp
            ma[(2, 0)] = phi.into();
            mb[(2, 5)] = one;
            // v3 = (1−φ)v3ˢ + φv3ᶠ
            ma[(3, 1)] = one;
            mb[(3, 1)] = (phi - 1.0).into();
            mb[(3, 2)] = (-phi).into();
        }
        (Field::Acoustic(_), Field::Biot(_), PoreCondition::Sealed) => {
            // v3ˢ = v3
            ma[(0, 1)] = -one;
            mb[(0, 1)] = one;
            // v3ᶠ = v3
            ma[(1, 1)] = -one;
            mb[(1, 2)] = one;
            // σ33ˢ + σ33ᶠ = −p
            ma[(2, 0)] = one;
            mb[(2, 3)] = one;
            mb[(2, 5)] = one;
            // σ13ˢ = 0
            mb[(3, 4)] = one;
        }
        (Field::Elastic(_), Field::Biot(_), _) => {
            // frame bonded to the solid
            ma[(0, 0)] = -one;
            mb[(0, 0)] = one;
            ma[(1, 1)] = -one;
            mb[(1, 1)] = one;
            // no flow into the solid
            ma[(2, 1)] = -one;
            mb[(2, 2)] = one;
            // total stresses continuous
            ma[(3, 2)] = -one;
            mb[(3, 3)] = one;
            mb[(3, 5)] = one;
            ma[(4, 3)] = -one;
            mb[(4, 4)] = one;
        }
        (Field::Biot(_), Field::Biot(_), pores) => {
            let (phi_a, phi_b) = (porosity(a), porosity(b));
            // frame velocities
            ma[(0, 0)] = one;
            mb[(0, 0)] = -one;
            ma[(1, 1)] = one;
            mb[(1, 1)] = -one;
            match pores {
                PoreCondition::Open => {
                    // relative flux φ(v3ᶠ − v3ˢ)
                    ma[(2, 1)] = (-phi_a).into();
                    ma[(2, 2)] = phi_a.into();
                    mb[(2, 1)] = phi_b.into();
                    mb[(2, 2)] = (-phi_b).into();
                    // pore pressure −σ33ᶠ/φ
                    ma[(5, 5)] = (1.0 / phi_a).into();
                    mb[(5, 5)] = (-1.0 / phi_b).into();
                }
                PoreCondition::Sealed => {
                    ma[(2, 1)] = -one;
                    ma[(2, 2)] = one;
                    mb[(5, 1)] = -one;
                    mb[(5, 2)] = one;
                }
            }
            // total normal stress
            ma[(3, 3)] = one;
            ma[(3, 5)] = one;
            mb[(3, 3)] = -one;
            mb[(3, 5)] = -one;
            // shear stress
            ma[(4, 4)] = one;
            mb[(4, 4)] = -one;
        }
        // `conditions` orders the pair by rank
        (Field::Elastic(_) | Field::Biot(_), _, _) => {}
    }
    (ma, mb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::state::Acoustic;

    fn acoustic() -> Field<'static> {
        Field::Acoustic(Acoustic {
            density: Complex64::new(1.2, 0.0),
            bulk_modulus: Complex64::new(1.4e5, 0.0),
        })
    }

    #[test]
    fn test_fluid_fluid_is_continuity() {
        let (i, j) = conditions(&acoustic(), &acoustic(), PoreCondition::Open);
        let v = nalgebra::DVector::from_vec(vec![Complex64::new(2.0, 1.0), Complex64::new(0.1, 0.0)]);
        assert_eq!(&i * &v + &j * &v, nalgebra::DVector::zeros(2));
    }

    #[test]
    fn test_swapped_order_swaps_matrices() {
        let steel = crate::media::state::ElasticState {
            density: 7800.0,
            lambda: Complex64::new(1.15e11, 0.0),
            mu: Complex64::new(7.7e10, 0.0),
        };
        let solid = Field::Elastic(&steel);
        let (i, j) = conditions(&acoustic(), &solid, PoreCondition::Open);
        let (j2, i2) = conditions(&solid, &acoustic(), PoreCondition::Open);
        assert_eq!(i, i2);
        assert_eq!(j, j2);
        assert_eq!(i.shape(), (3, 2));
        assert_eq!(j.shape(), (3, 4));
    }
}
