//! Constraint surfaces: the boundaries of the admissible state space.
//!
//! Constraints represent real-world limits the pricing model itself
//! ignores: liquidity thresholds, position limits, margin floors,
//! regulatory caps. Near a constraint boundary the geometry of risk
//! changes abruptly; the fragility layer consumes the signed distance to
//! the most binding constraint as one of its score components.

use manifold_core::types::RiskError;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of constraints a surface may hold.
pub const MAX_CONSTRAINTS: usize = 64;

/// Default tolerance band for equality constraints.
const EQUALITY_TOLERANCE: f64 = 1e-9;

/// Classification of a constraint by the limit it models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintKind {
    /// Bid-ask spread threshold.
    Liquidity,
    /// Maximum position size.
    PositionLimit,
    /// Margin requirement.
    Margin,
    /// Regulatory limit.
    Regulatory,
    /// User-defined constraint.
    Custom,
}

/// Which side of the threshold is admissible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintDirection {
    /// Value must stay at or below the threshold.
    Upper,
    /// Value must stay at or above the threshold.
    Lower,
    /// Value must stay within a tolerance band of the threshold.
    Equality,
}

/// How a violation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintHardness {
    /// Cannot be crossed; violation is fatal at a higher layer.
    Hard,
    /// Can be crossed at a penalty cost.
    Soft,
    /// Threshold moves with market conditions; treated as soft here.
    Dynamic,
}

/// How the constrained quantity is obtained from a point.
///
/// Simple constraints read one coordinate; custom constraints evaluate an
/// arbitrary function of the whole point.
pub enum ConstraintEvaluator {
    /// Read the coordinate of the given dimension.
    Dimension(usize),
    /// Evaluate a user callback on the full coordinate slice.
    Callback(Box<dyn Fn(&[f64]) -> f64>),
}

impl fmt::Debug for ConstraintEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension(d) => f.debug_tuple("Dimension").field(d).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl ConstraintEvaluator {
    /// The constrained quantity at `coords`.
    ///
    /// A dimension evaluator whose index is out of range yields 0.
    fn value(&self, coords: &[f64]) -> f64 {
        match self {
            Self::Dimension(d) => coords.get(*d).copied().unwrap_or(0.0),
            Self::Callback(f) => f(coords),
        }
    }
}

/// One admissibility limit on the state space.
#[derive(Debug)]
pub struct Constraint {
    kind: ConstraintKind,
    name: String,
    direction: ConstraintDirection,
    hardness: ConstraintHardness,
    threshold: f64,
    tolerance: f64,
    evaluator: ConstraintEvaluator,
    penalty_rate: f64,
    active: bool,
}

impl Constraint {
    /// Returns the constraint classification.
    #[inline]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Returns the constraint name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the admissible side of the threshold.
    #[inline]
    pub fn direction(&self) -> ConstraintDirection {
        self.direction
    }

    /// Returns the violation treatment.
    #[inline]
    pub fn hardness(&self) -> ConstraintHardness {
        self.hardness
    }

    /// Returns the threshold value.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the penalty per unit of violation for soft constraints.
    #[inline]
    pub fn penalty_rate(&self) -> f64 {
        self.penalty_rate
    }

    /// Returns true when the constraint participates in queries.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Signed distance to the constraint boundary at `coords`.
    ///
    /// Positive inside the admissible region, zero on the boundary,
    /// negative when violated. Inactive constraints report `+∞`.
    ///
    /// | Direction | Signed distance      |
    /// |-----------|----------------------|
    /// | Upper     | `threshold − v`      |
    /// | Lower     | `v − threshold`      |
    /// | Equality  | `tol − |v − threshold|` |
    pub fn signed_distance(&self, coords: &[f64]) -> f64 {
        if !self.active {
            return f64::INFINITY;
        }
        let value = self.evaluator.value(coords);
        match self.direction {
            ConstraintDirection::Upper => self.threshold - value,
            ConstraintDirection::Lower => value - self.threshold,
            ConstraintDirection::Equality => self.tolerance - (value - self.threshold).abs(),
        }
    }

    /// Returns true when `coords` violates this constraint.
    ///
    /// Inactive constraints never report a violation.
    pub fn is_violated(&self, coords: &[f64]) -> bool {
        if !self.active {
            return false;
        }
        self.signed_distance(coords) < 0.0
    }

    /// Penalty cost of a violation at `coords`.
    ///
    /// Hard constraints carry no penalty; they are either satisfied or
    /// fatal at a higher layer. Soft and dynamic constraints pay
    /// `penalty_rate · max(0, −signed_distance)`.
    pub fn penalty(&self, coords: &[f64]) -> f64 {
        if !self.active || self.hardness == ConstraintHardness::Hard {
            return 0.0;
        }
        let distance = self.signed_distance(coords);
        if distance >= 0.0 {
            return 0.0;
        }
        self.penalty_rate * (-distance)
    }
}

/// Collection of admissibility limits with aggregate queries.
///
/// # Examples
///
/// ```
/// use manifold_risk::constraints::{
///     ConstraintDirection, ConstraintHardness, ConstraintKind, ConstraintSurface,
/// };
///
/// let mut surface = ConstraintSurface::new();
/// surface
///     .add_full(
///         ConstraintKind::PositionLimit,
///         "spot_cap",
///         0,
///         ConstraintDirection::Upper,
///         100.0,
///         ConstraintHardness::Soft,
///         10.0,
///     )
///     .unwrap();
///
/// assert!((surface.distance(&[98.0, 0.0]) - 2.0).abs() < 1e-12);
/// assert!(surface.check(&[101.0, 0.0]));
/// assert!((surface.total_penalty(&[101.0, 0.0]) - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Default)]
pub struct ConstraintSurface {
    constraints: Vec<Constraint>,
}

impl ConstraintSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of constraints.
    #[inline]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Returns true when the surface holds no constraints.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Returns the constraint at `index`, if present.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Constraint> {
        self.constraints.get(index)
    }

    /// Enable or disable a constraint by index.
    ///
    /// Disabled constraints contribute `+∞` to distance queries and never
    /// report violations. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize, active: bool) {
        if let Some(c) = self.constraints.get_mut(index) {
            c.active = active;
        }
    }

    /// Add a simple threshold constraint with kind-appropriate defaults.
    ///
    /// Defaults: liquidity → upper/soft with penalty 100; position limit →
    /// upper/hard; margin → lower/soft with penalty 50; regulatory →
    /// upper/hard; custom → upper/soft with penalty 1. The constrained
    /// quantity is the coordinate of dimension 0; use
    /// [`add_full`](ConstraintSurface::add_full) to pick another axis.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` when the surface already holds
    /// [`MAX_CONSTRAINTS`] constraints.
    pub fn add(
        &mut self,
        kind: ConstraintKind,
        name: impl Into<String>,
        threshold: f64,
    ) -> Result<(), RiskError> {
        let (direction, hardness, penalty_rate) = match kind {
            ConstraintKind::Liquidity => {
                (ConstraintDirection::Upper, ConstraintHardness::Soft, 100.0)
            }
            ConstraintKind::PositionLimit => {
                (ConstraintDirection::Upper, ConstraintHardness::Hard, 1.0)
            }
            ConstraintKind::Margin => (ConstraintDirection::Lower, ConstraintHardness::Soft, 50.0),
            ConstraintKind::Regulatory => {
                (ConstraintDirection::Upper, ConstraintHardness::Hard, 1.0)
            }
            ConstraintKind::Custom => (ConstraintDirection::Upper, ConstraintHardness::Soft, 1.0),
        };
        self.add_full(kind, name, 0, direction, threshold, hardness, penalty_rate)
    }

    /// Add a threshold constraint with every field explicit.
    ///
    /// # Arguments
    ///
    /// * `dimension` - Index of the constrained coordinate
    /// * `penalty_rate` - Cost per unit of violation (soft kinds only)
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` when the surface already holds
    /// [`MAX_CONSTRAINTS`] constraints.
    #[allow(clippy::too_many_arguments)]
    pub fn add_full(
        &mut self,
        kind: ConstraintKind,
        name: impl Into<String>,
        dimension: usize,
        direction: ConstraintDirection,
        threshold: f64,
        hardness: ConstraintHardness,
        penalty_rate: f64,
    ) -> Result<(), RiskError> {
        self.push(Constraint {
            kind,
            name: name.into(),
            direction,
            hardness,
            threshold,
            tolerance: EQUALITY_TOLERANCE,
            evaluator: ConstraintEvaluator::Dimension(dimension),
            penalty_rate,
            active: true,
        })
    }

    /// Add a constraint evaluated by an arbitrary callback.
    ///
    /// The callback receives the full coordinate slice and returns the
    /// constrained quantity.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` when the surface already holds
    /// [`MAX_CONSTRAINTS`] constraints.
    pub fn add_custom(
        &mut self,
        name: impl Into<String>,
        evaluator: impl Fn(&[f64]) -> f64 + 'static,
        direction: ConstraintDirection,
        threshold: f64,
        hardness: ConstraintHardness,
    ) -> Result<(), RiskError> {
        self.push(Constraint {
            kind: ConstraintKind::Custom,
            name: name.into(),
            direction,
            hardness,
            threshold,
            tolerance: EQUALITY_TOLERANCE,
            evaluator: ConstraintEvaluator::Callback(Box::new(evaluator)),
            penalty_rate: 1.0,
            active: true,
        })
    }

    fn push(&mut self, constraint: Constraint) -> Result<(), RiskError> {
        if self.constraints.len() >= MAX_CONSTRAINTS {
            return Err(RiskError::InvalidArgument(format!(
                "constraint surface is limited to {} constraints",
                MAX_CONSTRAINTS
            )));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Returns true when any active constraint is violated at `coords`.
    pub fn check(&self, coords: &[f64]) -> bool {
        self.constraints.iter().any(|c| c.is_violated(coords))
    }

    /// Minimum signed distance over all active constraints.
    ///
    /// Returns `+∞` when the surface is empty or every constraint is
    /// inactive.
    pub fn distance(&self, coords: &[f64]) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.signed_distance(coords))
            .fold(f64::INFINITY, f64::min)
    }

    /// Index of the most binding constraint (smallest signed distance).
    ///
    /// Returns `None` when the surface is empty or every constraint is
    /// inactive.
    pub fn nearest(&self, coords: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, c) in self.constraints.iter().enumerate() {
            let d = c.signed_distance(coords);
            if d.is_finite() && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Total penalty over all soft constraints at `coords`.
    pub fn total_penalty(&self, coords: &[f64]) -> f64 {
        self.constraints.iter().map(|c| c.penalty(coords)).sum()
    }

    /// Returns true when any active hard constraint is violated.
    pub fn any_hard_violation(&self, coords: &[f64]) -> bool {
        self.constraints
            .iter()
            .filter(|c| c.hardness() == ConstraintHardness::Hard)
            .any(|c| c.is_violated(coords))
    }

    /// Escalate a hard violation into an error.
    ///
    /// The surface itself never aborts on violation; this is the hook for
    /// callers that must.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::ConstraintViolation` naming the first violated
    /// hard constraint.
    pub fn enforce(&self, coords: &[f64]) -> Result<(), RiskError> {
        for c in &self.constraints {
            if c.hardness() == ConstraintHardness::Hard && c.is_violated(coords) {
                return Err(RiskError::ConstraintViolation(c.name().to_string()));
            }
        }
        Ok(())
    }
}
