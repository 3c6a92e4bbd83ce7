//! Second-order curvature of the sampled pricing surface.
//!
//! The Hessian is the symmetric matrix of second partial derivatives: the
//! continuous generalisation of gamma, volga and vanna. High curvature is
//! where linear hedges fail; its eigenstructure reveals the principal
//! directions of nonlinearity and the numerical conditioning of the local
//! surface.

use crate::config::DiffConfig;
use crate::state_space::StateSpace;
use manifold_core::math::differentiation::{second_partial_diagonal, second_partial_mixed};
use manifold_core::math::eigen::symmetric_eigenvalues;
use manifold_core::types::{RiskError, MAX_DIMENSIONS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Eigenvalues below this magnitude are treated as numerically zero when
/// forming the condition number.
const EIGEN_FLOOR: f64 = 1e-15;

/// Sentinel condition number for an effectively singular Hessian.
const CONDITION_SENTINEL: f64 = 1e15;

/// Sign structure of a symmetric matrix's spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Definiteness {
    /// Every eigenvalue is strictly positive.
    PositiveDefinite,
    /// Every eigenvalue is strictly negative.
    NegativeDefinite,
    /// Mixed or zero eigenvalues.
    Indefinite,
}

/// Symmetric curvature matrix of a pricing function at a point.
///
/// Computation fills the upper triangle with four-corner mixed stencils,
/// mirrors it down, and invalidates the cached eigenvalues. Eigenvalues
/// are computed lazily by Jacobi rotations on a working copy (the matrix
/// itself is preserved) and sorted in descending order of absolute value.
///
/// # Examples
///
/// ```
/// use manifold_core::types::{Dimension, DimensionKind};
/// use manifold_geometry::{Hessian, StateSpace};
///
/// let mut space = StateSpace::new();
/// for name in ["x", "y"] {
///     space
///         .add_dimension(Dimension::new(DimensionKind::Custom, name, -5.0, 5.0, 21).unwrap())
///         .unwrap();
/// }
/// space.map_prices(|c| c[0] * c[0] + c[1] * c[1]).unwrap();
///
/// let mut hess = Hessian::new(2).unwrap();
/// hess.compute(&space, &[2.0, 3.0]).unwrap();
/// assert!((hess.get(0, 0) - 2.0).abs() < 0.2);
/// assert!((hess.trace() - 4.0).abs() < 0.4);
/// assert!((hess.condition_number() - 1.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct Hessian {
    num_dims: usize,
    data: Vec<f64>,
    point: Vec<f64>,
    eigenvalues: Option<Vec<f64>>,
    valid: bool,
    config: DiffConfig,
}

impl Hessian {
    /// Create a Hessian for `num_dims` dimensions with the default
    /// differentiation configuration.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` unless
    /// `1 <= num_dims <= 16`.
    pub fn new(num_dims: usize) -> Result<Self, RiskError> {
        Self::with_config(num_dims, DiffConfig::default())
    }

    /// Create a Hessian with an explicit differentiation configuration.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` unless
    /// `1 <= num_dims <= 16`.
    pub fn with_config(num_dims: usize, config: DiffConfig) -> Result<Self, RiskError> {
        if num_dims == 0 || num_dims > MAX_DIMENSIONS {
            return Err(RiskError::InvalidArgument(format!(
                "dimension count must be in 1..={}, got {}",
                MAX_DIMENSIONS, num_dims
            )));
        }
        Ok(Self {
            num_dims,
            data: vec![0.0; num_dims * num_dims],
            point: vec![0.0; num_dims],
            eigenvalues: None,
            valid: false,
            config,
        })
    }

    /// Returns the dimension count this Hessian was built for.
    #[inline]
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Returns true when the last computation succeeded.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Compute the curvature matrix at `point` from the sampled state
    /// space.
    ///
    /// The stencil step along each dimension is the grid step itself
    /// whenever that step is finite and non-trivial, falling back to the
    /// configured bump otherwise. Sub-grid steps against an interpolated
    /// surface collapse adjacent stencil nodes into one grid cell and
    /// destroy the second difference; pinning to the grid step avoids
    /// that.
    ///
    /// # Errors
    ///
    /// * `RiskError::DimensionMismatch` - space or point dimension count
    ///   differs from this Hessian's
    /// * `RiskError::NotInitialized` - prices have not been mapped
    pub fn compute(&mut self, space: &StateSpace, point: &[f64]) -> Result<(), RiskError> {
        let n = self.num_dims;
        if space.num_dims() != n {
            return Err(RiskError::DimensionMismatch {
                expected: n,
                actual: space.num_dims(),
            });
        }
        if point.len() != n {
            return Err(RiskError::DimensionMismatch {
                expected: n,
                actual: point.len(),
            });
        }

        let center = space.interpolate_price(point)?;
        let mut surface = |coords: &[f64]| space.interpolate_price(coords).unwrap_or(f64::NAN);
        let mut scratch = point.to_vec();
        let bump = self.config.bump;

        let step_for = |d: usize| {
            let step = space.dims()[d].step();
            if step.is_finite() && step > f64::EPSILON {
                step
            } else {
                bump
            }
        };

        for i in 0..n {
            let h_i = step_for(i);
            self.data[i * n + i] =
                second_partial_diagonal(&mut surface, &mut scratch, i, h_i, center);

            for j in (i + 1)..n {
                let h_j = step_for(j);
                let value =
                    second_partial_mixed(&mut surface, &mut scratch, i, j, h_i, h_j);
                self.data[i * n + j] = value;
                self.data[j * n + i] = value;
            }
        }

        self.point.copy_from_slice(point);
        self.valid = true;
        self.eigenvalues = None;
        Ok(())
    }

    /// Compute the curvature matrix directly from a callable.
    ///
    /// # Arguments
    ///
    /// * `f` - Pricing function
    /// * `point` - Evaluation point
    /// * `h` - Absolute step for every axis; non-positive values fall back
    ///   to the configured bump
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` when `point` disagrees with
    /// this Hessian's dimension count.
    pub fn compute_direct<F>(&mut self, mut f: F, point: &[f64], h: f64) -> Result<(), RiskError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = self.num_dims;
        if point.len() != n {
            return Err(RiskError::DimensionMismatch {
                expected: n,
                actual: point.len(),
            });
        }

        let step = if h > 0.0 { h } else { self.config.bump };
        let center = f(point);
        let mut scratch = point.to_vec();

        for i in 0..n {
            self.data[i * n + i] =
                second_partial_diagonal(&mut f, &mut scratch, i, step, center);
            for j in (i + 1)..n {
                let value = second_partial_mixed(&mut f, &mut scratch, i, j, step, step);
                self.data[i * n + j] = value;
                self.data[j * n + i] = value;
            }
        }

        self.point.copy_from_slice(point);
        self.valid = true;
        self.eigenvalues = None;
        Ok(())
    }

    /// Matrix entry `H[row][col]`.
    ///
    /// Returns 0 when the Hessian is not valid or indices are out of
    /// range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if !self.valid || row >= self.num_dims || col >= self.num_dims {
            return 0.0;
        }
        self.data[row * self.num_dims + col]
    }

    /// Returns the row-major matrix buffer.
    #[inline]
    pub fn matrix(&self) -> &[f64] {
        &self.data
    }

    /// Returns the evaluation point of the last computation.
    #[inline]
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Trace `Σ H_ii`. 0 when not valid.
    pub fn trace(&self) -> f64 {
        if !self.valid {
            return 0.0;
        }
        (0..self.num_dims)
            .map(|i| self.data[i * self.num_dims + i])
            .sum()
    }

    /// Frobenius norm `sqrt(Σ H_ij²)`. 0 when not valid.
    pub fn frobenius_norm(&self) -> f64 {
        if !self.valid {
            return 0.0;
        }
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Eigenvalues sorted in descending order of absolute value.
    ///
    /// Computed lazily by Jacobi rotations on a working copy and cached
    /// until the next `compute` call.
    ///
    /// # Errors
    ///
    /// * `RiskError::NotInitialized` - the Hessian has not been computed
    /// * `RiskError::NumericalInstability` - the Jacobi iteration did not
    ///   converge
    pub fn eigenvalues(&mut self) -> Result<&[f64], RiskError> {
        if !self.valid {
            return Err(RiskError::NotInitialized(
                "Hessian has not been computed".to_string(),
            ));
        }
        if self.eigenvalues.is_none() {
            let values = symmetric_eigenvalues(&self.data, self.num_dims)?;
            self.eigenvalues = Some(values);
        }
        Ok(self.eigenvalues.as_deref().unwrap_or(&[]))
    }

    /// Condition number `|λ_max| / |λ_min|` over the non-negligible
    /// eigenvalues.
    ///
    /// Eigenvalues with `|λ| < 1e-15` are ignored; when none survive the
    /// floor the sentinel 1e15 is returned. Returns 0 when the Hessian is
    /// not valid or the eigendecomposition fails.
    pub fn condition_number(&mut self) -> f64 {
        if !self.valid {
            return 0.0;
        }
        let values = match self.eigenvalues() {
            Ok(values) => values,
            Err(_) => return 0.0,
        };

        let mut max_abs = 0.0_f64;
        let mut min_retained = f64::INFINITY;
        for v in values {
            let a = v.abs();
            max_abs = max_abs.max(a);
            if a >= EIGEN_FLOOR && a < min_retained {
                min_retained = a;
            }
        }

        if min_retained.is_infinite() {
            return CONDITION_SENTINEL;
        }
        max_abs / min_retained
    }

    /// Sign structure of the spectrum (strict inequalities).
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`eigenvalues`](Hessian::eigenvalues).
    pub fn definiteness(&mut self) -> Result<Definiteness, RiskError> {
        let values = self.eigenvalues()?;
        if values.iter().all(|&v| v > 0.0) {
            Ok(Definiteness::PositiveDefinite)
        } else if values.iter().all(|&v| v < 0.0) {
            Ok(Definiteness::NegativeDefinite)
        } else {
            Ok(Definiteness::Indefinite)
        }
    }
}
