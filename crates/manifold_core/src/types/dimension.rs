//! Risk-factor dimensions and their uniform grids.
//!
//! A [`Dimension`] discretises one axis of the state space into `N >= 2`
//! uniformly spaced nodes. Dimensions are immutable after creation: the
//! grid, the step size and the bounds never change once built.

use crate::types::RiskError;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of dimensions a state space may hold.
pub const MAX_DIMENSIONS: usize = 16;

/// Classification of a risk-factor axis.
///
/// Used to tag state-space dimensions by the market quantity they
/// discretise. The tag carries no behaviour of its own; constraint and
/// reporting layers use it for labelling and defaults.
///
/// # Examples
///
/// ```rust
/// use manifold_core::types::DimensionKind;
///
/// assert_eq!(format!("{}", DimensionKind::Volatility), "volatility");
/// assert!(DimensionKind::Custom.is_custom());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DimensionKind {
    /// Underlying price.
    Spot,
    /// Implied or realised volatility.
    Volatility,
    /// Interest rate.
    Rate,
    /// Time to maturity.
    Time,
    /// Correlation parameter.
    Correlation,
    /// Liquidity score / bid-ask spread.
    Liquidity,
    /// Funding cost.
    Funding,
    /// User-defined dimension.
    Custom,
}

impl DimensionKind {
    /// Returns the lower-case label used in reports.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Volatility => "volatility",
            Self::Rate => "rate",
            Self::Time => "time",
            Self::Correlation => "correlation",
            Self::Liquidity => "liquidity",
            Self::Funding => "funding",
            Self::Custom => "custom",
        }
    }

    /// Returns true if this is a user-defined dimension.
    #[inline]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom)
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One axis of the discretised state space.
///
/// The grid is the arithmetic progression `min + i * (max - min) / (N - 1)`
/// for `i` in `[0, N - 1]`, with the last node forced equal to `max` so
/// that floating-point drift cannot push the boundary node past the stated
/// range.
///
/// # Examples
///
/// ```rust
/// use manifold_core::types::{Dimension, DimensionKind};
///
/// let vol = Dimension::new(DimensionKind::Volatility, "implied_vol", 0.1, 0.5, 5).unwrap();
/// assert_eq!(vol.num_points(), 5);
/// assert_eq!(vol.grid().last(), Some(&0.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    kind: DimensionKind,
    name: String,
    min: f64,
    max: f64,
    step: f64,
    grid: Vec<f64>,
}

impl Dimension {
    /// Construct a dimension with a uniform grid.
    ///
    /// # Arguments
    ///
    /// * `kind` - Risk-factor classification
    /// * `name` - Human-readable axis name
    /// * `min` - Lower bound (must be strictly below `max`)
    /// * `max` - Upper bound
    /// * `num_points` - Node count (must be at least 2)
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` when `num_points < 2` or
    /// `min >= max`.
    pub fn new(
        kind: DimensionKind,
        name: impl Into<String>,
        min: f64,
        max: f64,
        num_points: usize,
    ) -> Result<Self, RiskError> {
        if num_points < 2 {
            return Err(RiskError::InvalidArgument(
                "dimension must have at least 2 points".to_string(),
            ));
        }
        if min >= max {
            return Err(RiskError::InvalidArgument(
                "dimension min must be less than max".to_string(),
            ));
        }

        let step = (max - min) / (num_points - 1) as f64;
        let mut grid: Vec<f64> = (0..num_points).map(|i| min + i as f64 * step).collect();
        // Pin the boundary node exactly; the progression can drift past max.
        grid[num_points - 1] = max;

        Ok(Self {
            kind,
            name: name.into(),
            min,
            max,
            step,
            grid,
        })
    }

    /// Returns the risk-factor classification.
    #[inline]
    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// Returns the axis name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the lower bound.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the upper bound.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Returns `max - min`.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Returns the distance between adjacent grid nodes.
    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Returns the node count.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.grid.len()
    }

    /// Returns the precomputed grid nodes.
    #[inline]
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    /// Locate the grid cell bracketing `value`.
    ///
    /// Returns `(lo, hi, t)` where `grid[lo] <= value <= grid[hi]` and `t`
    /// is the normalised offset of `value` inside the cell (0 when the cell
    /// is degenerate). Values at or beyond a bound collapse onto the
    /// boundary node with `t = 0`, so interpolation never extrapolates.
    pub fn bracket(&self, value: f64) -> (usize, usize, f64) {
        let last = self.grid.len() - 1;
        if value <= self.min {
            return (0, 0, 0.0);
        }
        if value >= self.max {
            return (last, last, 0.0);
        }

        let pos = self.grid.partition_point(|&node| node <= value);
        let lo = pos - 1;
        let hi = pos.min(last);
        let width = self.grid[hi] - self.grid[lo];
        let t = if width > 1e-15 {
            (value - self.grid[lo]) / width
        } else {
            0.0
        };
        (lo, hi, t)
    }

    /// Returns the index of the grid node nearest to `value`.
    ///
    /// The value is clamped to `[min, max]` first; ties between the two
    /// bracketing nodes resolve to the lower index.
    pub fn nearest_index(&self, value: f64) -> usize {
        let (lo, hi, t) = self.bracket(value);
        if t <= 0.5 {
            lo
        } else {
            hi
        }
    }
}
