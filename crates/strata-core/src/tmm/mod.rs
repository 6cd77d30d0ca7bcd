//! Transfer-matrix method.
//!
//! Stacks made only of fluid-like layers are reduced to a chained 2×2
//! product. Anything else goes through the global system of Allard & Atalla
//! (2009, chapter 11): the unknowns are R, the state vectors on both faces
//! of every layer and, for a fluid termination, the transmitted amplitude.

pub mod interface;
pub mod waves;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::trace;

use crate::error::SolverError;
use crate::solver::System;
use crate::stack::{PoreCondition, StackState};
use crate::transfer_matrix::TransferMatrix;
use waves::Field;

pub(crate) fn assemble(state: &StackState) -> Result<System, SolverError> {
    let fields: Vec<Field> = state.layers.iter().map(|l| Field::of(&l.state)).collect();
    if fields.iter().all(|f| matches!(f, Field::Acoustic(_))) {
        Ok(chain(state, &fields))
    } else {
        global(state, &fields)
    }
}

fn chain(state: &StackState, fields: &[Field]) -> System {
    let (omega, kx) = (state.omega, state.kx);
    let matrix = fields
        .iter()
        .zip(&state.layers)
        .fold(TransferMatrix::identity(), |total, (field, layer)| match field {
            Field::Acoustic(a) => total.chain(&TransferMatrix::layer(
                a.normal_wavenumber(omega, kx),
                a.admittance(omega, kx),
                layer.thickness,
            )),
            _ => total,
        });
    System::Chain(matrix)
}

pub(crate) fn global(state: &StackState, fields: &[Field]) -> Result<System, SolverError> {
    let (omega, kx) = (state.omega, state.kx);
    let one = Complex64::new(1.0, 0.0);

    let mut offsets = Vec::with_capacity(fields.len());
    let mut size = 1;
    for field in fields {
        offsets.push(size);
        size += 2 * field.size();
    }
    let transmission = state.transmitted.map(|_| {
        size += 1;
        size - 1
    });
    let mut matrix = DMatrix::zeros(size, size);
    let mut rhs = DVector::zeros(size);
    let mut row = 0;

    // incident side: V0 = [1, y0] + R·[1, −y0]
    let incident = Field::Acoustic(state.incident);
    let y0 = state.incident.admittance(omega, kx);
    let (i, j) = interface::conditions(&incident, &fields[0], state.layers[0].front);
    for r in 0..i.nrows() {
        matrix[(row, 0)] = i[(r, 0)] - i[(r, 1)] * y0;
        rhs[row] = -(i[(r, 0)] + i[(r, 1)] * y0);
        for c in 0..j.ncols() {
            matrix[(row, offsets[0] + c)] = j[(r, c)];
        }
        row += 1;
    }

    for (index, field) in fields.iter().enumerate() {
        let n = field.size();
        let front = offsets[index];
        let back = front + n;
        let t = field.layer_matrix(omega, kx, state.layers[index].thickness)?;
        for r in 0..n {
            matrix[(row, front + r)] = one;
            for c in 0..n {
                matrix[(row, back + c)] = -t[(r, c)];
            }
            row += 1;
        }

        if let Some(next) = fields.get(index + 1) {
            let (i, j) = interface::conditions(field, next, state.layers[index + 1].front);
            for r in 0..i.nrows() {
                for c in 0..n {
                    matrix[(row, back + c)] = i[(r, c)];
                }
                for c in 0..j.ncols() {
                    matrix[(row, offsets[index + 1] + c)] = j[(r, c)];
                }
                row += 1;
            }
        }
    }

    let last = fields.len() - 1;
    let back = offsets[last] + fields[last].size();
    match (state.transmitted, transmission) {
        (Some(fluid), Some(t_col)) => {
            // V_t = T·[1, yt]
            let yt = fluid.admittance(omega, kx);
            let (i, j) = interface::conditions(&fields[last], &Field::Acoustic(fluid), PoreCondition::Open);
            for r in 0..i.nrows() {
                for c in 0..i.ncols() {
                    matrix[(row, back + c)] = i[(r, c)];
                }
                matrix[(row, t_col)] = j[(r, 0)] + j[(r, 1)] * yt;
                row += 1;
            }
        }
        _ => {
            for &v in fields[last].velocities() {
                matrix[(row, back + v)] = one;
                row += 1;
            }
        }
    }

    if row != size {
        return Err(SolverError::Shape { rows: row, unknowns: size });
    }
    trace!(size, "transfer-matrix system assembled");
    Ok(System::Linear {
        matrix,
        rhs,
        reflection: 0,
        transmission,
    })
}
