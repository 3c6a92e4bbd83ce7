//! First-order sensitivity of the sampled pricing surface.
//!
//! The Jacobian is the gradient of the pricing function at a point of the
//! state space: the continuous generalisation of the first-order Greeks
//! (delta, vega, rho). Its magnitude measures overall sensitivity, its
//! direction the steepest price change.

use crate::config::DiffConfig;
use crate::state_space::StateSpace;
use manifold_core::math::differentiation::partial_central;
use manifold_core::types::{RiskError, MAX_DIMENSIONS};

/// Gradient floor below which the direction is reported as the zero
/// vector.
const DIRECTION_EPSILON: f64 = 1e-15;

/// Gradient of a pricing function at a point of the state space.
///
/// A Jacobian is created for a fixed dimension count and recomputed at
/// will; accessors on an instance whose last computation failed (or that
/// was never computed) return zeros.
///
/// # Examples
///
/// ```
/// use manifold_core::types::{Dimension, DimensionKind};
/// use manifold_geometry::{Jacobian, StateSpace};
///
/// let mut space = StateSpace::new();
/// for name in ["x", "y"] {
///     space
///         .add_dimension(Dimension::new(DimensionKind::Custom, name, -5.0, 5.0, 21).unwrap())
///         .unwrap();
/// }
/// space.map_prices(|c| c[0] * c[0] + c[1] * c[1]).unwrap();
///
/// let mut jac = Jacobian::new(2).unwrap();
/// jac.compute(&space, &[2.0, 3.0]).unwrap();
/// assert!((jac.get(0) - 4.0).abs() < 0.2);
/// assert!((jac.get(1) - 6.0).abs() < 0.2);
/// assert!((jac.norm() - 52.0_f64.sqrt()).abs() < 0.2);
/// ```
#[derive(Debug, Clone)]
pub struct Jacobian {
    partials: Vec<f64>,
    point: Vec<f64>,
    value: f64,
    valid: bool,
    config: DiffConfig,
}

impl Jacobian {
    /// Create a Jacobian for `num_dims` dimensions with the default
    /// differentiation configuration.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` unless
    /// `1 <= num_dims <= 16`.
    pub fn new(num_dims: usize) -> Result<Self, RiskError> {
        Self::with_config(num_dims, DiffConfig::default())
    }

    /// Create a Jacobian with an explicit differentiation configuration.
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
            partials: vec![0.0; num_dims],
            point: vec![0.0; num_dims],
            value: 0.0,
            valid: false,
            config,
        })
    }

    /// Returns the dimension count this Jacobian was built for.
    #[inline]
    pub fn num_dims(&self) -> usize {
        self.partials.len()
    }

    /// Returns the differentiation configuration.
    #[inline]
    pub fn config(&self) -> DiffConfig {
        self.config
    }

    /// Returns true when the last computation succeeded.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Compute the gradient at `point` from the sampled state space.
    ///
    /// Uses central differences on the interpolated surface, with the bump
    /// scaled per dimension by its span (`h_d = bump · (max_d − min_d)`).
    /// The centre value is recorded via interpolation at `point`.
    ///
    /// # Errors
    ///
    /// * `RiskError::DimensionMismatch` - space or point dimension count
    ///   differs from this Jacobian's
    /// * `RiskError::NotInitialized` - prices have not been mapped
    pub fn compute(&mut self, space: &StateSpace, point: &[f64]) -> Result<(), RiskError> {
        let n = self.num_dims();
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

        self.value = space.interpolate_price(point)?;

        // Interpolation cannot fail past the checks above; NaN propagates
        // any surprise rather than panicking.
        let mut surface = |coords: &[f64]| space.interpolate_price(coords).unwrap_or(f64::NAN);
        let mut scratch = point.to_vec();
        let bump = self.config.bump;

        for (d, slot) in self.partials.iter_mut().enumerate() {
            let h = bump * space.dims()[d].span();
            *slot = partial_central(&mut surface, &mut scratch, d, h);
        }

        self.point.copy_from_slice(point);
        self.valid = true;
        Ok(())
    }

    /// Compute the gradient directly from a callable, without a sampled
    /// grid.
    ///
    /// # Arguments
    ///
    /// * `f` - Pricing function
    /// * `point` - Evaluation point
    /// * `h` - Absolute step; non-positive values fall back to the
    ///   configured bump
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` when `point` disagrees with
    /// this Jacobian's dimension count.
    pub fn compute_direct<F>(&mut self, mut f: F, point: &[f64], h: f64) -> Result<(), RiskError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = self.num_dims();
        if point.len() != n {
            return Err(RiskError::DimensionMismatch {
                expected: n,
                actual: point.len(),
            });
        }

        let step = if h > 0.0 { h } else { self.config.bump };
        self.value = f(point);

        let mut scratch = point.to_vec();
        for (d, slot) in self.partials.iter_mut().enumerate() {
            *slot = partial_central(&mut f, &mut scratch, d, step);
        }

        self.point.copy_from_slice(point);
        self.valid = true;
        Ok(())
    }

    /// Partial derivative along dimension `dim`.
    ///
    /// Returns 0 when the Jacobian is not valid or `dim` is out of range.
    #[inline]
    pub fn get(&self, dim: usize) -> f64 {
        if !self.valid {
            return 0.0;
        }
        self.partials.get(dim).copied().unwrap_or(0.0)
    }

    /// Returns the partial-derivative vector.
    #[inline]
    pub fn partials(&self) -> &[f64] {
        &self.partials
    }

    /// Returns the evaluation point of the last computation.
    #[inline]
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Returns `f(point)` recorded by the last computation.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// L2 norm of the gradient. 0 when not valid.
    pub fn norm(&self) -> f64 {
        if !self.valid {
            return 0.0;
        }
        self.partials.iter().map(|p| p * p).sum::<f64>().sqrt()
    }

    /// L-infinity norm (largest absolute partial). 0 when not valid.
    pub fn linf_norm(&self) -> f64 {
        if !self.valid {
            return 0.0;
        }
        self.partials.iter().fold(0.0, |acc, p| acc.max(p.abs()))
    }

    /// Index of the dimension with the largest absolute partial.
    ///
    /// Returns `None` when the Jacobian is not valid.
    pub fn most_sensitive_dim(&self) -> Option<usize> {
        if !self.valid {
            return None;
        }
        let mut best = 0;
        let mut best_abs = self.partials[0].abs();
        for (d, p) in self.partials.iter().enumerate().skip(1) {
            if p.abs() > best_abs {
                best_abs = p.abs();
                best = d;
            }
        }
        Some(best)
    }

    /// Unit vector of steepest ascent.
    ///
    /// Returns the zero vector when the gradient norm is below 1e-15 or
    /// the Jacobian is not valid.
    pub fn direction(&self) -> Vec<f64> {
        let norm = self.norm();
        if norm < DIRECTION_EPSILON {
            return vec![0.0; self.num_dims()];
        }
        self.partials.iter().map(|p| p / norm).collect()
    }

    /// Directional derivative `∇f · v`.
    ///
    /// Returns 0 when the Jacobian is not valid.
    pub fn directional_derivative(&self, direction: &[f64]) -> f64 {
        if !self.valid {
            return 0.0;
        }
        self.partials
            .iter()
            .zip(direction)
            .map(|(p, v)| p * v)
            .sum()
    }
}
