//! Dense complex linear algebra shared by both solution methods.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::trace;

use crate::error::SolverError;

/// Largest accepted normwise backward error `‖A·x − b‖ / (‖A‖·‖x‖ + ‖b‖)`
/// of the equilibrated system, in the infinity norm.
pub const BACKWARD_ERROR_LIMIT: f64 = 1e-8;

/// Square root on the branch of waves decaying away from their source:
/// `Im ≤ 0` under the e^{+jωt} convention.
pub fn decaying_sqrt(z: Complex64) -> Complex64 {
    let root = z.sqrt();
    if root.im > 0.0 {
        -root
    } else {
        root
    }
}

/// Solves `a·x = b` by LU with partial pivoting after scaling rows and
/// columns to unit max-norm.
pub fn solve(mut a: DMatrix<Complex64>, mut b: DVector<Complex64>) -> Result<DVector<Complex64>, SolverError> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(SolverError::Shape {
            rows: a.nrows(),
            unknowns: a.ncols(),
        });
    }

    for i in 0..n {
        let scale = a.row(i).iter().fold(0.0_f64, |m, z| m.max(z.norm()));
        if scale == 0.0 {
            return Err(SolverError::Singular { size: n });
        }
        for z in a.row_mut(i).iter_mut() {
            *z /= scale;
        }
        b[i] /= scale;
    }
    let mut column_scale = vec![1.0; n];
    for (j, s) in column_scale.iter_mut().enumerate() {
        let scale = a.column(j).iter().fold(0.0_f64, |m, z| m.max(z.norm()));
        if scale == 0.0 {
            return Err(SolverError::Singular { size: n });
        }
        *s = 1.0 / scale;
        for z in a.column_mut(j).iter_mut() {
            *z *= *s;
        }
    }

    let lu = a.clone().lu();
    if lu.u().diagonal().iter().any(|z| z.norm() == 0.0) {
        return Err(SolverError::Singular { size: n });
    }
    let y = lu.solve(&b).ok_or(SolverError::Singular { size: n })?;
    if y.iter().any(|z| !(z.re.is_finite() && z.im.is_finite())) {
        return Err(SolverError::NonFinite);
    }

    let backward_error = backward_error(&a, &y, &b);
    trace!(size = n, backward_error, "lu solve");
    if !(backward_error <= BACKWARD_ERROR_LIMIT) {
        return Err(SolverError::IllConditioned { backward_error });
    }

    let mut x = y;
    for (xi, s) in x.iter_mut().zip(&column_scale) {
        *xi *= *s;
    }
    if x.iter().any(|z| !(z.re.is_finite() && z.im.is_finite())) {
        return Err(SolverError::NonFinite);
    }
    Ok(x)
}

fn max_norm(v: &DVector<Complex64>) -> f64 {
    v.iter().fold(0.0_f64, |m, z| m.max(z.norm()))
}

fn backward_error(a: &DMatrix<Complex64>, x: &DVector<Complex64>, b: &DVector<Complex64>) -> f64 {
    let residual = max_norm(&(a * x - b));
    if residual == 0.0 {
        return 0.0;
    }
    let a_norm = a
        .row_iter()
        .map(|row| row.iter().map(|z| z.norm()).sum::<f64>())
        .fold(0.0_f64, f64::max);
    residual / (a_norm * max_norm(x) + max_norm(b))
}
