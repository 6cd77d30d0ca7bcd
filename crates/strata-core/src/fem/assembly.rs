//! Coordinate-format accumulation of the global system.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// Global matrix as (row, column, value) triplets, duplicates summed on
/// conversion, plus the right-hand side.
#[derive(Debug, Clone)]
pub struct Triplets {
    size: usize,
    entries: Vec<(usize, usize, Complex64)>,
    rhs: Vec<Complex64>,
    fixed: Vec<usize>,
}

impl Triplets {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            entries: Vec::new(),
            rhs: vec![Complex64::new(0.0, 0.0); size],
            fixed: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, row: usize, col: usize, value: Complex64) {
        if value != Complex64::new(0.0, 0.0) {
            self.entries.push((row, col, value));
        }
    }

    pub fn add_rhs(&mut self, row: usize, value: Complex64) {
        self.rhs[row] += value;
    }

    /// Constrains unknown `dof` to zero.
    pub fn fix(&mut self, dof: usize) {
        self.fixed.push(dof);
    }

    pub fn to_dense(&self) -> (DMatrix<Complex64>, DVector<Complex64>) {
        let mut matrix = DMatrix::zeros(self.size, self.size);
        for &(row, col, value) in &self.entries {
            matrix[(row, col)] += value;
        }
        let mut rhs = DVector::from_column_slice(&self.rhs);
        for &dof in &self.fixed {
            matrix.row_mut(dof).fill(Complex64::new(0.0, 0.0));
            matrix.column_mut(dof).fill(Complex64::new(0.0, 0.0));
            matrix[(dof, dof)] = Complex64::new(1.0, 0.0);
            rhs[dof] = Complex64::new(0.0, 0.0);
        }
        (matrix, rhs)
    }
}
