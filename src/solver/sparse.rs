//! Sparse matrix assembly.
//!
//! FEA stiffness matrices are typically 95-99% sparse. Entries accumulate in
//! COO form element-by-element (duplicates summed on conversion to CSR), then
//! convert once to CSR for the solve phase.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// COO-style incremental sparse matrix builder.
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            entries: Vec::new(),
        }
    }

    /// Accumulates a value at `(row, col)`. Near-zero contributions are
    /// dropped; duplicates at the same position are summed on `to_csr`.
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.entries.push((row, col, value));
        }
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        CsrMatrix::from(&coo)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);
        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }
        mat
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn rows(&self) -> usize {
        self.size
    }
}

/// Sparse matrix-vector product `y = A * x`.
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let start = row_offsets[row];
        let end = row_offsets[row + 1];
        let mut sum = 0.0;
        for idx in start..end {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_duplicates() {
        let mut builder = SparseMatrixBuilder::new(2);
        builder.add(0, 0, 4.0);
        builder.add(0, 0, 1.0);
        let dense = builder.to_dense();
        assert!((dense[(0, 0)] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn matvec_matches_dense() {
        let mut builder = SparseMatrixBuilder::new(3);
        builder.add(0, 0, 4.0);
        builder.add(0, 1, -1.0);
        builder.add(1, 0, -1.0);
        builder.add(1, 1, 4.0);
        builder.add(2, 2, 2.0);
        let csr = builder.to_csr();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let y = sparse_matvec(&csr, &x);
        assert!((y[0] - 2.0).abs() < 1e-12);
        assert!((y[1] - 7.0).abs() < 1e-12);
        assert!((y[2] - 6.0).abs() < 1e-12);
    }
}
