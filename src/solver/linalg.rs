//! Small-matrix closed-form linear algebra and the sparse linear-system /
//! generalized-eigenproblem backend.
//!
//! The reference implementation leans on Intel MKL (`mkl_sparse_d_mv`,
//! PARDISO, the extended eigensolver) for `spmatmul`/`spsolve`/`speigen`.
//! MKL is not a portable Rust dependency, so this backend instead densifies
//! the condensed system (sized by the active-DOF count after static
//! condensation, not the raw mesh) and uses `nalgebra`'s dense LU and
//! symmetric-eigenvalue routines. The closed-form small-matrix determinant
//! and inverse below are ported unchanged, since they operate on element
//! Jacobians (at most 4-by-4) regardless of backend.

use nalgebra_sparse::CsrMatrix;

use crate::error::{Error, NumericalError, Result};
use crate::types::{RealMatrix, RealVector};

use super::sparse::sparse_matvec;

/// Determinant of a square matrix up to 4-by-4, by explicit cofactor expansion.
pub fn determinant(a: &RealMatrix) -> f64 {
    match a.nrows() {
        0 => 1.0,
        1 => a[(0, 0)],
        2 => a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)],
        3 => {
            a[(0, 0)] * a[(1, 1)] * a[(2, 2)] - a[(0, 0)] * a[(1, 2)] * a[(2, 1)]
                - a[(0, 1)] * a[(1, 0)] * a[(2, 2)]
                + a[(0, 1)] * a[(1, 2)] * a[(2, 0)]
                + a[(0, 2)] * a[(1, 0)] * a[(2, 1)]
                - a[(0, 2)] * a[(1, 1)] * a[(2, 0)]
        }
        4 => {
            let d = a;
            d[(0, 0)] * d[(1, 1)] * d[(2, 2)] * d[(3, 3)]
                - d[(0, 0)] * d[(1, 1)] * d[(2, 3)] * d[(3, 2)]
                - d[(0, 0)] * d[(1, 2)] * d[(2, 1)] * d[(3, 3)]
                + d[(0, 0)] * d[(1, 2)] * d[(2, 3)] * d[(3, 1)]
                + d[(0, 0)] * d[(1, 3)] * d[(2, 1)] * d[(3, 2)]
                - d[(0, 0)] * d[(1, 3)] * d[(2, 2)] * d[(3, 1)]
                - d[(0, 1)] * d[(1, 0)] * d[(2, 2)] * d[(3, 3)]
                + d[(0, 1)] * d[(1, 0)] * d[(2, 3)] * d[(3, 2)]
                + d[(0, 1)] * d[(1, 2)] * d[(2, 0)] * d[(3, 3)]
                - d[(0, 1)] * d[(1, 2)] * d[(2, 3)] * d[(3, 0)]
                - d[(0, 1)] * d[(1, 3)] * d[(2, 0)] * d[(3, 2)]
                + d[(0, 1)] * d[(1, 3)] * d[(2, 2)] * d[(3, 0)]
                + d[(0, 2)] * d[(1, 0)] * d[(2, 1)] * d[(3, 3)]
                - d[(0, 2)] * d[(1, 0)] * d[(2, 3)] * d[(3, 1)]
                - d[(0, 2)] * d[(1, 1)] * d[(2, 0)] * d[(3, 3)]
                + d[(0, 2)] * d[(1, 1)] * d[(2, 3)] * d[(3, 0)]
                + d[(0, 2)] * d[(1, 3)] * d[(2, 0)] * d[(3, 1)]
                - d[(0, 2)] * d[(1, 3)] * d[(2, 1)] * d[(3, 0)]
                - d[(0, 3)] * d[(1, 0)] * d[(2, 1)] * d[(3, 2)]
                + d[(0, 3)] * d[(1, 0)] * d[(2, 2)] * d[(3, 1)]
                + d[(0, 3)] * d[(1, 1)] * d[(2, 0)] * d[(3, 2)]
                - d[(0, 3)] * d[(1, 1)] * d[(2, 2)] * d[(3, 0)]
                - d[(0, 3)] * d[(1, 2)] * d[(2, 0)] * d[(3, 1)]
                + d[(0, 3)] * d[(1, 2)] * d[(2, 1)] * d[(3, 0)]
        }
        n => panic!("determinant: unsupported matrix size {n}"),
    }
}

/// Inverse of a square matrix up to 4-by-4. Returns the inverse and the
/// determinant; fails with [`NumericalError::SingularMatrix`] if singular.
pub fn inverse(a: &RealMatrix) -> Result<(RealMatrix, f64)> {
    let det_a = determinant(a);
    if det_a == 0.0 {
        return Err(Error::Numerical(NumericalError::SingularMatrix));
    }
    let n = a.nrows();
    let mut inv = RealMatrix::zeros(n, n);
    match n {
        0 => {}
        1 => inv[(0, 0)] = 1.0 / det_a,
        2 => {
            inv[(0, 0)] = a[(1, 1)] / det_a;
            inv[(0, 1)] = -a[(0, 1)] / det_a;
            inv[(1, 0)] = -a[(1, 0)] / det_a;
            inv[(1, 1)] = a[(0, 0)] / det_a;
        }
        3 => {
            inv[(0, 0)] = (a[(1, 1)] * a[(2, 2)] - a[(1, 2)] * a[(2, 1)]) / det_a;
            inv[(0, 1)] = -(a[(0, 1)] * a[(2, 2)] - a[(0, 2)] * a[(2, 1)]) / det_a;
            inv[(0, 2)] = (a[(0, 1)] * a[(1, 2)] - a[(0, 2)] * a[(1, 1)]) / det_a;
            inv[(1, 0)] = -(a[(1, 0)] * a[(2, 2)] - a[(1, 2)] * a[(2, 0)]) / det_a;
            inv[(1, 1)] = (a[(0, 0)] * a[(2, 2)] - a[(0, 2)] * a[(2, 0)]) / det_a;
            inv[(1, 2)] = -(a[(0, 0)] * a[(1, 2)] - a[(0, 2)] * a[(1, 0)]) / det_a;
            inv[(2, 0)] = (a[(1, 0)] * a[(2, 1)] - a[(1, 1)] * a[(2, 0)]) / det_a;
            inv[(2, 1)] = -(a[(0, 0)] * a[(2, 1)] - a[(0, 1)] * a[(2, 0)]) / det_a;
            inv[(2, 2)] = (a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)]) / det_a;
        }
        4 => {
            let d = a;
            inv[(0, 0)] = (d[(1, 1)] * d[(2, 2)] * d[(3, 3)] - d[(1, 1)] * d[(2, 3)] * d[(3, 2)]
                - d[(1, 2)] * d[(2, 1)] * d[(3, 3)]
                + d[(1, 2)] * d[(2, 3)] * d[(3, 1)]
                + d[(1, 3)] * d[(2, 1)] * d[(3, 2)]
                - d[(1, 3)] * d[(2, 2)] * d[(3, 1)])
                / det_a;
            inv[(0, 1)] = -(d[(0, 1)] * d[(2, 2)] * d[(3, 3)] - d[(0, 1)] * d[(2, 3)] * d[(3, 2)]
                - d[(0, 2)] * d[(2, 1)] * d[(3, 3)]
                + d[(0, 2)] * d[(2, 3)] * d[(3, 1)]
                + d[(0, 3)] * d[(2, 1)] * d[(3, 2)]
                - d[(0, 3)] * d[(2, 2)] * d[(3, 1)])
                / det_a;
            inv[(0, 2)] = (d[(0, 1)] * d[(1, 2)] * d[(3, 3)] - d[(0, 1)] * d[(1, 3)] * d[(3, 2)]
                - d[(0, 2)] * d[(1, 1)] * d[(3, 3)]
                + d[(0, 2)] * d[(1, 3)] * d[(3, 1)]
                + d[(0, 3)] * d[(1, 1)] * d[(3, 2)]
                - d[(0, 3)] * d[(1, 2)] * d[(3, 1)])
                / det_a;
            inv[(0, 3)] = -(d[(0, 1)] * d[(1, 2)] * d[(2, 3)] - d[(0, 1)] * d[(1, 3)] * d[(2, 2)]
                - d[(0, 2)] * d[(1, 1)] * d[(2, 3)]
                + d[(0, 2)] * d[(1, 3)] * d[(2, 1)]
                + d[(0, 3)] * d[(1, 1)] * d[(2, 2)]
                - d[(0, 3)] * d[(1, 2)] * d[(2, 1)])
                / det_a;
            inv[(1, 0)] = -(d[(1, 0)] * d[(2, 2)] * d[(3, 3)] - d[(1, 0)] * d[(2, 3)] * d[(3, 2)]
                - d[(1, 2)] * d[(2, 0)] * d[(3, 3)]
                + d[(1, 2)] * d[(2, 3)] * d[(3, 0)]
                + d[(1, 3)] * d[(2, 0)] * d[(3, 2)]
                - d[(1, 3)] * d[(2, 2)] * d[(3, 0)])
                / det_a;
            inv[(1, 1)] = (d[(0, 0)] * d[(2, 2)] * d[(3, 3)] - d[(0, 0)] * d[(2, 3)] * d[(3, 2)]
                - d[(0, 2)] * d[(2, 0)] * d[(3, 3)]
                + d[(0, 2)] * d[(2, 3)] * d[(3, 0)]
                + d[(0, 3)] * d[(2, 0)] * d[(3, 2)]
                - d[(0, 3)] * d[(2, 2)] * d[(3, 0)])
                / det_a;
            inv[(1, 2)] = -(d[(0, 0)] * d[(1, 2)] * d[(3, 3)] - d[(0, 0)] * d[(1, 3)] * d[(3, 2)]
                - d[(0, 2)] * d[(1, 0)] * d[(3, 3)]
                + d[(0, 2)] * d[(1, 3)] * d[(3, 0)]
                + d[(0, 3)] * d[(1, 0)] * d[(3, 2)]
                - d[(0, 3)] * d[(1, 2)] * d[(3, 0)])
                / det_a;
            inv[(1, 3)] = (d[(0, 0)] * d[(1, 2)] * d[(2, 3)] - d[(0, 0)] * d[(1, 3)] * d[(2, 2)]
                - d[(0, 2)] * d[(1, 0)] * d[(2, 3)]
                + d[(0, 2)] * d[(1, 3)] * d[(2, 0)]
                + d[(0, 3)] * d[(1, 0)] * d[(2, 2)]
                - d[(0, 3)] * d[(1, 2)] * d[(2, 0)])
                / det_a;
            inv[(2, 0)] = (d[(1, 0)] * d[(2, 1)] * d[(3, 3)] - d[(1, 0)] * d[(2, 3)] * d[(3, 1)]
                - d[(1, 1)] * d[(2, 0)] * d[(3, 3)]
                + d[(1, 1)] * d[(2, 3)] * d[(3, 0)]
                + d[(1, 3)] * d[(2, 0)] * d[(3, 1)]
                - d[(1, 3)] * d[(2, 1)] * d[(3, 0)])
                / det_a;
            inv[(2, 1)] = -(d[(0, 0)] * d[(2, 1)] * d[(3, 3)] - d[(0, 0)] * d[(2, 3)] * d[(3, 1)]
                - d[(0, 1)] * d[(2, 0)] * d[(3, 3)]
                + d[(0, 1)] * d[(2, 3)] * d[(3, 0)]
                + d[(0, 3)] * d[(2, 0)] * d[(3, 1)]
                - d[(0, 3)] * d[(2, 1)] * d[(3, 0)])
                / det_a;
            inv[(2, 2)] = (d[(0, 0)] * d[(1, 1)] * d[(3, 3)] - d[(0, 0)] * d[(1, 3)] * d[(3, 1)]
                - d[(0, 1)] * d[(1, 0)] * d[(3, 3)]
                + d[(0, 1)] * d[(1, 3)] * d[(3, 0)]
                + d[(0, 3)] * d[(1, 0)] * d[(3, 1)]
                - d[(0, 3)] * d[(1, 1)] * d[(3, 0)])
                / det_a;
            inv[(2, 3)] = -(d[(0, 0)] * d[(1, 1)] * d[(2, 3)] - d[(0, 0)] * d[(1, 3)] * d[(2, 1)]
                - d[(0, 1)] * d[(1, 0)] * d[(2, 3)]
                + d[(0, 1)] * d[(1, 3)] * d[(2, 0)]
                + d[(0, 3)] * d[(1, 0)] * d[(2, 1)]
                - d[(0, 3)] * d[(1, 1)] * d[(2, 0)])
                / det_a;
            inv[(3, 0)] = -(d[(1, 0)] * d[(2, 1)] * d[(3, 2)] - d[(1, 0)] * d[(2, 2)] * d[(3, 1)]
                - d[(1, 1)] * d[(2, 0)] * d[(3, 2)]
                + d[(1, 1)] * d[(2, 2)] * d[(3, 0)]
                + d[(1, 2)] * d[(2, 0)] * d[(3, 1)]
                - d[(1, 2)] * d[(2, 1)] * d[(3, 0)])
                / det_a;
            inv[(3, 1)] = (d[(0, 0)] * d[(2, 1)] * d[(3, 2)] - d[(0, 0)] * d[(2, 2)] * d[(3, 1)]
                - d[(0, 1)] * d[(2, 0)] * d[(3, 2)]
                + d[(0, 1)] * d[(2, 2)] * d[(3, 0)]
                + d[(0, 2)] * d[(2, 0)] * d[(3, 1)]
                - d[(0, 2)] * d[(2, 1)] * d[(3, 0)])
                / det_a;
            inv[(3, 2)] = -(d[(0, 0)] * d[(1, 1)] * d[(3, 2)] - d[(0, 0)] * d[(1, 2)] * d[(3, 1)]
                - d[(0, 1)] * d[(1, 0)] * d[(3, 2)]
                + d[(0, 1)] * d[(1, 2)] * d[(3, 0)]
                + d[(0, 2)] * d[(1, 0)] * d[(3, 1)]
                - d[(0, 2)] * d[(1, 1)] * d[(3, 0)])
                / det_a;
            inv[(3, 3)] = (d[(0, 0)] * d[(1, 1)] * d[(2, 2)] - d[(0, 0)] * d[(1, 2)] * d[(2, 1)]
                - d[(0, 1)] * d[(1, 0)] * d[(2, 2)]
                + d[(0, 1)] * d[(1, 2)] * d[(2, 0)]
                + d[(0, 2)] * d[(1, 0)] * d[(2, 1)]
                - d[(0, 2)] * d[(1, 1)] * d[(2, 0)])
                / det_a;
        }
        n => panic!("inverse: unsupported matrix size {n}"),
    }
    Ok((inv, det_a))
}

/// Sparse matrix-vector product `y = A x`.
pub fn spmatmul(a: &CsrMatrix<f64>, x: &RealVector) -> RealVector {
    sparse_matvec(a, x)
}

fn csr_to_dense(a: &CsrMatrix<f64>) -> RealMatrix {
    let mut dense = RealMatrix::zeros(a.nrows(), a.ncols());
    for (row, col, &val) in a.triplet_iter() {
        dense[(row, col)] += val;
    }
    dense
}

/// Solves the sparse linear system `A x = b` for `x`.
pub fn spsolve(a: &CsrMatrix<f64>, b: &RealVector) -> Result<RealVector> {
    let dense = csr_to_dense(a);
    let lu = dense.lu();
    lu.solve(b)
        .ok_or(Error::Numerical(NumericalError::SingularMatrix))
}

/// Computes `k0` eigenpairs of the generalized symmetric eigenproblem
/// `A phi = lambda B phi`, with `B` symmetric positive definite.
///
/// `which = "S"` returns the `k0` smallest eigenvalues (ascending); any other
/// value returns the `k0` largest (descending) -- mirroring the reference
/// backend's `which in ("S", "L")` contract.
///
/// Returns `(eigenvalues, eigenvectors)` where column `i` of `eigenvectors`
/// is the mode shape for `eigenvalues[i]`, plus the per-mode residual norm
/// `||A phi - lambda B phi||`.
pub fn speigen(
    a: &CsrMatrix<f64>,
    b: &CsrMatrix<f64>,
    k0: usize,
    which: &str,
) -> Result<(RealVector, RealMatrix, RealVector)> {
    let n = a.nrows();
    if a.ncols() != n || b.nrows() != n || b.ncols() != n {
        return Err(Error::InvalidInput(
            "speigen: 'A' and 'B' must be square matrices of the same size".into(),
        ));
    }
    if k0 < 1 || k0 > n {
        return Err(Error::InvalidInput("speigen: invalid value for 'k0'".into()));
    }

    let a_dense = csr_to_dense(a);
    let b_dense = csr_to_dense(b);

    let chol = nalgebra::Cholesky::new(b_dense.clone())
        .ok_or(Error::Numerical(NumericalError::SolverFailure(
            "'B' is not symmetric positive definite".into(),
        )))?;
    let l = chol.l();
    let l_inv = l
        .clone()
        .try_inverse()
        .ok_or(Error::Numerical(NumericalError::SingularMatrix))?;

    let mut c = &l_inv * &a_dense * l_inv.transpose();
    c = 0.5 * (&c + c.transpose());

    let eigen = c.symmetric_eigen();
    let mut order: Vec<usize> = (0..n).collect();
    if which == "S" {
        order.sort_by(|&i, &j| eigen.eigenvalues[i].partial_cmp(&eigen.eigenvalues[j]).unwrap());
    } else {
        order.sort_by(|&i, &j| eigen.eigenvalues[j].partial_cmp(&eigen.eigenvalues[i]).unwrap());
    }
    order.truncate(k0);

    let mut eigenvalues = RealVector::zeros(k0);
    let mut eigenvectors = RealMatrix::zeros(n, k0);
    let mut residuals = RealVector::zeros(k0);
    let l_inv_t = l_inv.transpose();
    for (col, &i) in order.iter().enumerate() {
        let lambda = eigen.eigenvalues[i];
        let y = eigen.eigenvectors.column(i).into_owned();
        let phi = &l_inv_t * &y;
        let residual = &a_dense * &phi - lambda * (&b_dense * &phi);
        eigenvalues[col] = lambda;
        eigenvectors.set_column(col, &phi);
        residuals[col] = residual.norm();
    }

    Ok((eigenvalues, eigenvectors, residuals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn determinant_matches_known_3x3() {
        let mut a = RealMatrix::zeros(3, 3);
        a[(0, 0)] = 2.0;
        a[(1, 1)] = 3.0;
        a[(2, 2)] = 4.0;
        assert_relative_eq!(determinant(&a), 24.0, max_relative = 1e-12);
    }

    #[test]
    fn inverse_round_trips_2x2() {
        let mut a = RealMatrix::zeros(2, 2);
        a[(0, 0)] = 4.0;
        a[(0, 1)] = 2.0;
        a[(1, 0)] = 1.0;
        a[(1, 1)] = 3.0;
        let (inv, det) = inverse(&a).unwrap();
        assert_relative_eq!(det, 10.0, max_relative = 1e-12);
        let identity = &a * &inv;
        assert_relative_eq!(identity[(0, 0)], 1.0, max_relative = 1e-9);
        assert_relative_eq!(identity[(1, 1)], 1.0, max_relative = 1e-9);
        assert_relative_eq!(identity[(0, 1)], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = RealMatrix::zeros(2, 2);
        assert!(inverse(&a).is_err());
    }
}
