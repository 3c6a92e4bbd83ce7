//! Jacobi eigendecomposition for small symmetric matrices.
//!
//! Classical Jacobi iteration: each sweep annihilates the off-diagonal
//! entry of largest magnitude with a symmetric Givens rotation. Intended
//! for the small, dense, symmetric matrices produced by Hessian analysis
//! (n bounded by [`crate::types::MAX_DIMENSIONS`]); it is not a
//! production-grade solver for large n.

use crate::types::RiskError;
use num_traits::Float;
use std::cmp::Ordering;

/// Maximum number of Jacobi sweeps before the iteration is abandoned.
pub const JACOBI_MAX_SWEEPS: usize = 100;

/// Off-diagonal norm below which the matrix counts as diagonalised.
pub const JACOBI_TOLERANCE: f64 = 1e-12;

/// Off-diagonal magnitude of a symmetric matrix.
///
/// Returns `sqrt(2 * Σ_{i<j} m_ij²)`, the Frobenius norm of the matrix
/// with its diagonal removed.
pub fn off_diagonal_norm<T: Float>(matrix: &[T], n: usize) -> T {
    let mut sum = T::zero();
    for i in 0..n {
        for j in (i + 1)..n {
            let v = matrix[i * n + j];
            sum = sum + v * v;
        }
    }
    (T::from(2.0).unwrap() * sum).sqrt()
}

/// Eigenvalues of a symmetric matrix via classical Jacobi rotations.
///
/// The input matrix is copied; the caller's buffer is left untouched.
/// Returned eigenvalues are sorted in descending order of absolute value,
/// the ordering the condition number `|λ_max| / |λ_min|` depends on.
///
/// # Arguments
///
/// * `matrix` - Row-major `n × n` symmetric matrix
/// * `n` - Matrix order
///
/// # Errors
///
/// * `RiskError::InvalidArgument` - `n == 0` or `matrix.len() != n * n`
/// * `RiskError::NumericalInstability` - No convergence within
///   [`JACOBI_MAX_SWEEPS`] sweeps
///
/// # Examples
///
/// ```
/// use manifold_core::math::eigen::symmetric_eigenvalues;
///
/// let m = [2.0, 1.0, 1.0, 2.0];
/// let eig = symmetric_eigenvalues(&m, 2).unwrap();
/// assert!((eig[0] - 3.0).abs() < 1e-10);
/// assert!((eig[1] - 1.0).abs() < 1e-10);
/// ```
pub fn symmetric_eigenvalues<T: Float>(matrix: &[T], n: usize) -> Result<Vec<T>, RiskError> {
    if n == 0 {
        return Err(RiskError::InvalidArgument(
            "matrix order must be at least 1".to_string(),
        ));
    }
    if matrix.len() != n * n {
        return Err(RiskError::InvalidArgument(format!(
            "matrix buffer holds {} entries, expected {}",
            matrix.len(),
            n * n
        )));
    }

    let mut work = matrix.to_vec();
    let tolerance = T::from(JACOBI_TOLERANCE).unwrap();
    let half = T::from(0.5).unwrap();
    let two = T::from(2.0).unwrap();
    let diag_eps = T::from(1e-15).unwrap();

    for _sweep in 0..JACOBI_MAX_SWEEPS {
        if off_diagonal_norm(&work, n) < tolerance {
            let mut values: Vec<T> = (0..n).map(|i| work[i * n + i]).collect();
            values.sort_by(|a, b| {
                b.abs()
                    .partial_cmp(&a.abs())
                    .unwrap_or(Ordering::Equal)
            });
            return Ok(values);
        }

        let (p, q) = find_pivot(&work, n);

        let app = work[p * n + p];
        let aqq = work[q * n + q];
        let apq = work[p * n + q];

        let theta = if (app - aqq).abs() < diag_eps {
            T::from(std::f64::consts::FRAC_PI_4).unwrap()
        } else {
            half * (two * apq).atan2(aqq - app)
        };

        let c = theta.cos();
        let s = theta.sin();

        for i in 0..n {
            if i != p && i != q {
                let mip = work[i * n + p];
                let miq = work[i * n + q];
                work[i * n + p] = c * mip - s * miq;
                work[p * n + i] = work[i * n + p];
                work[i * n + q] = s * mip + c * miq;
                work[q * n + i] = work[i * n + q];
            }
        }

        work[p * n + p] = c * c * app - two * s * c * apq + s * s * aqq;
        work[q * n + q] = s * s * app + two * s * c * apq + c * c * aqq;
        work[p * n + q] = T::zero();
        work[q * n + p] = T::zero();
    }

    Err(RiskError::NumericalInstability(format!(
        "Jacobi iteration did not converge within {} sweeps",
        JACOBI_MAX_SWEEPS
    )))
}

/// Locate the off-diagonal entry of largest magnitude.
fn find_pivot<T: Float>(matrix: &[T], n: usize) -> (usize, usize) {
    let mut max_val = T::zero();
    let mut pivot = (0, if n > 1 { 1 } else { 0 });

    for i in 0..n {
        for j in (i + 1)..n {
            let v = matrix[i * n + j].abs();
            if v > max_val {
                max_val = v;
                pivot = (i, j);
            }
        }
    }
    pivot
}
