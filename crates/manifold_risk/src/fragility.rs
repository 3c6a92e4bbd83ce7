//! Fragility mapping: where small perturbations generate large effects.
//!
//! A fragile region is one where small input changes cause large output
//! changes (high gradient), linear approximations fail (high curvature),
//! numerical methods destabilise (high condition number), or the system
//! sits close to a forced state change (near a constraint). The fragility
//! score fuses these four measurements into a single bounded scalar per
//! grid node.

use crate::constraints::ConstraintSurface;
use manifold_core::types::RiskError;
use manifold_geometry::{Hessian, Jacobian, StateSpace};
use std::fmt;
use std::fmt::Write as _;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Initial capacity of the fragile-point list.
const INITIAL_POINT_CAPACITY: usize = 64;

/// Weights, normalisation scales and thresholds for fragility scoring.
///
/// Weights need not sum to one; the combined score is clamped to [0, 1]
/// regardless.
///
/// # Examples
///
/// ```
/// use manifold_risk::FragilityConfig;
///
/// let mut config = FragilityConfig::default();
/// assert!((config.weight_curvature - 0.30).abs() < 1e-12);
/// config.fragility_threshold = 0.4;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FragilityConfig {
    /// Contribution of the gradient-norm component.
    pub weight_gradient: f64,
    /// Contribution of the curvature component.
    pub weight_curvature: f64,
    /// Contribution of the conditioning component.
    pub weight_conditioning: f64,
    /// Contribution of the constraint-proximity component.
    pub weight_constraint: f64,
    /// Gradient norm considered "high".
    pub gradient_scale: f64,
    /// Hessian Frobenius norm considered "high".
    pub curvature_scale: f64,
    /// Condition number considered problematic (must exceed 1).
    pub condition_threshold: f64,
    /// Constraint distance considered "close" (must be positive).
    pub constraint_threshold: f64,
    /// Score at or above which a node is recorded as fragile.
    pub fragility_threshold: f64,
}

impl Default for FragilityConfig {
    fn default() -> Self {
        Self {
            weight_gradient: 0.25,
            weight_curvature: 0.30,
            weight_conditioning: 0.25,
            weight_constraint: 0.20,
            gradient_scale: 1.0,
            curvature_scale: 10.0,
            condition_threshold: 100.0,
            constraint_threshold: 0.05,
            fragility_threshold: 0.5,
        }
    }
}

impl FragilityConfig {
    /// Check the configuration for usable values.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` for negative weights,
    /// non-positive scales, a condition threshold at or below 1, a
    /// non-positive constraint threshold, or a fragility threshold
    /// outside [0, 1].
    pub fn validate(&self) -> Result<(), RiskError> {
        let weights = [
            self.weight_gradient,
            self.weight_curvature,
            self.weight_conditioning,
            self.weight_constraint,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(RiskError::InvalidArgument(
                "fragility weights must be non-negative".to_string(),
            ));
        }
        if self.gradient_scale <= 0.0 || self.curvature_scale <= 0.0 {
            return Err(RiskError::InvalidArgument(
                "fragility scales must be positive".to_string(),
            ));
        }
        if self.condition_threshold <= 1.0 {
            return Err(RiskError::InvalidArgument(
                "condition threshold must exceed 1".to_string(),
            ));
        }
        if self.constraint_threshold <= 0.0 {
            return Err(RiskError::InvalidArgument(
                "constraint threshold must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fragility_threshold) {
            return Err(RiskError::InvalidArgument(
                "fragility threshold must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gradient component: saturating sigmoid of the gradient norm.
///
/// `2 / (1 + e^(-m/scale)) - 1`: zero at zero, monotone, asymptoting to 1.
/// Returns 0 for a non-positive scale.
pub fn gradient_component(gradient_norm: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    let x = gradient_norm / scale;
    2.0 / (1.0 + (-x).exp()) - 1.0
}

/// Curvature component: same sigmoid family over the Hessian Frobenius
/// norm.
pub fn curvature_component(frobenius_norm: f64, scale: f64) -> f64 {
    gradient_component(frobenius_norm, scale)
}

/// Conditioning component: log-scaled condition number.
///
/// `log₁₀ κ / (2 · log₁₀ threshold)` clamped to [0, 1]; zero for κ ≤ 1 or
/// an unusable threshold.
pub fn conditioning_component(condition_number: f64, threshold: f64) -> f64 {
    if threshold <= 1.0 || condition_number <= 1.0 {
        return 0.0;
    }
    let log_cond = condition_number.log10();
    let log_threshold = threshold.log10();
    if log_cond <= 0.0 {
        0.0
    } else if log_cond >= 2.0 * log_threshold {
        1.0
    } else {
        log_cond / (2.0 * log_threshold)
    }
}

/// Constraint component: linear ramp in the signed distance.
///
/// 1 at or beyond the boundary (`d ≤ 0`), 0 at or past the threshold
/// distance, linear in between. Returns 0 for a non-positive threshold.
pub fn constraint_component(distance: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    if distance <= 0.0 {
        return 1.0;
    }
    if distance >= threshold {
        return 0.0;
    }
    1.0 - distance / threshold
}

/// Weighted combination of the four components, clamped to [0, 1].
pub fn combine_components(
    config: &FragilityConfig,
    gradient: f64,
    curvature: f64,
    conditioning: f64,
    constraint: f64,
) -> f64 {
    let score = config.weight_gradient * gradient
        + config.weight_curvature * curvature
        + config.weight_conditioning * conditioning
        + config.weight_constraint * constraint;
    score.clamp(0.0, 1.0)
}

/// Qualitative classification of a fragility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegionClass {
    /// Low fragility; safe to operate.
    Stable,
    /// Moderate fragility; monitor closely.
    Sensitive,
    /// High fragility; reduce exposure.
    Fragile,
    /// Very high fragility; immediate action needed.
    Critical,
}

impl RegionClass {
    /// Classify a score: STABLE below 0.25, SENSITIVE below 0.50, FRAGILE
    /// below 0.75, CRITICAL otherwise.
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            Self::Stable
        } else if score < 0.50 {
            Self::Sensitive
        } else if score < 0.75 {
            Self::Fragile
        } else {
            Self::Critical
        }
    }

    /// Returns the upper-case label used in reports.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stable => "STABLE",
            Self::Sensitive => "SENSITIVE",
            Self::Fragile => "FRAGILE",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One grid node whose fragility score reached the detection threshold.
///
/// The map owns the coordinate buffer; [`FragilityMap::region`] hands out
/// borrowed views.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FragilePoint {
    /// Location in state space (copy of the node coordinates).
    pub coordinates: Vec<f64>,
    /// Combined fragility score in [0, 1].
    pub score: f64,
    /// Hessian Frobenius norm at the node.
    pub curvature: f64,
    /// Gradient norm at the node.
    pub gradient_norm: f64,
    /// True when the node lies within the constraint threshold distance.
    pub near_constraint: bool,
}

/// Summary statistics of a computed fragility map.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FragilityStats {
    /// Largest score across the grid.
    pub max: f64,
    /// Mean score across the grid.
    pub mean: f64,
    /// Fraction of nodes at or above the fragility threshold.
    pub fragile_fraction: f64,
}

/// Grid-wide fragility analysis over a sampled state space.
///
/// Borrows the state space (and optionally a constraint surface) for its
/// whole lifetime, so the parent cannot be remapped or extended while the
/// map is alive.
///
/// # Examples
///
/// ```
/// use manifold_core::types::{Dimension, DimensionKind};
/// use manifold_geometry::StateSpace;
/// use manifold_risk::fragility::FragilityMap;
///
/// let mut space = StateSpace::new();
/// for name in ["x", "y"] {
///     space
///         .add_dimension(Dimension::new(DimensionKind::Custom, name, -5.0, 5.0, 21).unwrap())
///         .unwrap();
/// }
/// space.map_prices(|c| c[0] * c[0] + c[1] * c[1]).unwrap();
///
/// let mut map = FragilityMap::new(&space);
/// map.compute().unwrap();
/// assert_eq!(map.grid_scores().len(), space.total_points());
/// assert!(map.fragility_at(&[0.0, 0.0]) < 0.25);
/// ```
#[derive(Debug)]
pub struct FragilityMap<'a> {
    space: &'a StateSpace,
    constraints: Option<&'a ConstraintSurface>,
    config: FragilityConfig,
    grid_scores: Vec<f64>,
    points: Vec<FragilePoint>,
    computed: bool,
    max_fragility: f64,
    mean_fragility: f64,
    fragile_fraction: f64,
}

impl<'a> FragilityMap<'a> {
    /// Create a map over `space` with the default configuration and no
    /// constraint surface.
    pub fn new(space: &'a StateSpace) -> Self {
        Self {
            space,
            constraints: None,
            config: FragilityConfig::default(),
            grid_scores: Vec::new(),
            points: Vec::with_capacity(INITIAL_POINT_CAPACITY),
            computed: false,
            max_fragility: 0.0,
            mean_fragility: 0.0,
            fragile_fraction: 0.0,
        }
    }

    /// Create a map that also scores proximity to a constraint surface.
    pub fn with_constraints(space: &'a StateSpace, constraints: &'a ConstraintSurface) -> Self {
        let mut map = Self::new(space);
        map.constraints = Some(constraints);
        map
    }

    /// Returns the active configuration.
    #[inline]
    pub fn config(&self) -> FragilityConfig {
        self.config
    }

    /// Replace the configuration.
    ///
    /// Invalidates any previously computed scores.
    pub fn set_config(&mut self, config: FragilityConfig) {
        self.config = config;
        self.computed = false;
    }

    /// Returns true once [`compute`](FragilityMap::compute) has
    /// succeeded with the current configuration.
    #[inline]
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// Sweep every grid node and score it.
    ///
    /// Nodes whose Jacobian or Hessian computation fails (degenerate
    /// finite-difference neighbourhoods, typically at grid edges) are
    /// skipped silently; a skipped node keeps a score of zero. Constraint
    /// proximity participates only when a surface is attached.
    ///
    /// # Errors
    ///
    /// * `RiskError::InvalidArgument` - unusable configuration
    /// * `RiskError::NotInitialized` - state-space prices not computed
    pub fn compute(&mut self) -> Result<(), RiskError> {
        self.config.validate()?;

        let space = self.space;
        if !space.prices_valid() {
            return Err(RiskError::NotInitialized(
                "state space prices not computed".to_string(),
            ));
        }

        let n = space.num_dims();
        let total = space.total_points();

        let mut jacobian = Jacobian::new(n)?;
        let mut hessian = Hessian::new(n)?;

        self.grid_scores = vec![0.0; total];
        self.points.clear();

        let mut coords = vec![0.0; n];
        let mut sum = 0.0;
        let mut max = 0.0_f64;
        let mut fragile_count = 0_usize;
        let mut skipped = 0_usize;

        for flat in 0..total {
            space.coordinates_into(flat, &mut coords);

            if let Err(error) = jacobian.compute(space, &coords) {
                tracing::debug!(flat, %error, "skipping node: Jacobian failed");
                skipped += 1;
                continue;
            }
            if let Err(error) = hessian.compute(space, &coords) {
                tracing::debug!(flat, %error, "skipping node: Hessian failed");
                skipped += 1;
                continue;
            }

            let gradient_norm = jacobian.norm();
            let frobenius = hessian.frobenius_norm();
            let condition = hessian.condition_number();
            let constraint_distance = match self.constraints {
                Some(surface) if !surface.is_empty() => surface.distance(&coords),
                _ => f64::INFINITY,
            };

            let score = combine_components(
                &self.config,
                gradient_component(gradient_norm, self.config.gradient_scale),
                curvature_component(frobenius, self.config.curvature_scale),
                conditioning_component(condition, self.config.condition_threshold),
                constraint_component(constraint_distance, self.config.constraint_threshold),
            );

            self.grid_scores[flat] = score;
            sum += score;
            max = max.max(score);

            if score >= self.config.fragility_threshold {
                fragile_count += 1;
                self.points.push(FragilePoint {
                    coordinates: coords.clone(),
                    score,
                    curvature: frobenius,
                    gradient_norm,
                    near_constraint: constraint_distance < self.config.constraint_threshold,
                });
            }
        }

        self.max_fragility = max;
        self.mean_fragility = if total > 0 { sum / total as f64 } else { 0.0 };
        self.fragile_fraction = if total > 0 {
            fragile_count as f64 / total as f64
        } else {
            0.0
        };
        self.computed = true;

        tracing::info!(
            total_nodes = total,
            skipped,
            fragile_regions = self.points.len(),
            max_fragility = self.max_fragility,
            "fragility sweep complete"
        );
        Ok(())
    }

    /// Returns the per-node scores (empty before the first compute).
    #[inline]
    pub fn grid_scores(&self) -> &[f64] {
        &self.grid_scores
    }

    /// Number of recorded fragile regions.
    #[inline]
    pub fn num_fragile_regions(&self) -> usize {
        self.points.len()
    }

    /// Borrowed view of the `index`-th fragile region.
    ///
    /// The view must not be retained across further writes to the map.
    #[inline]
    pub fn region(&self, index: usize) -> Option<&FragilePoint> {
        self.points.get(index)
    }

    /// All recorded fragile regions, in sweep order.
    #[inline]
    pub fn regions(&self) -> &[FragilePoint] {
        &self.points
    }

    /// Score of the grid node nearest to `coords`.
    ///
    /// Returns 0 when the map has not been computed or the coordinate
    /// count is wrong.
    pub fn fragility_at(&self, coords: &[f64]) -> f64 {
        if !self.computed || coords.len() != self.space.num_dims() {
            return 0.0;
        }
        self.grid_scores[self.space.nearest_index(coords)]
    }

    /// Summary statistics of the last compute.
    pub fn statistics(&self) -> FragilityStats {
        FragilityStats {
            max: self.max_fragility,
            mean: self.mean_fragility,
            fragile_fraction: self.fragile_fraction,
        }
    }

    /// Human-readable summary of the map and its worst regions.
    ///
    /// Regions are listed by descending score, at most `top_n` of them.
    pub fn report(&self, top_n: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Fragility Analysis Report ===");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "State Space: {} dimensions, {} total points",
            self.space.num_dims(),
            self.space.total_points()
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Statistics:");
        let _ = writeln!(out, "  Max Fragility:      {:.4}", self.max_fragility);
        let _ = writeln!(out, "  Mean Fragility:     {:.4}", self.mean_fragility);
        let _ = writeln!(
            out,
            "  Fragile Fraction:   {:.2}%",
            self.fragile_fraction * 100.0
        );
        let _ = writeln!(out, "  Fragile Regions:    {}", self.points.len());

        if !self.points.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Top Fragile Regions:");

            let mut order: Vec<usize> = (0..self.points.len()).collect();
            order.sort_by(|&a, &b| {
                self.points[b]
                    .score
                    .partial_cmp(&self.points[a].score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            for (rank, &i) in order.iter().take(top_n).enumerate() {
                let point = &self.points[i];
                let class = RegionClass::from_score(point.score);
                let _ = writeln!(
                    out,
                    "  [{}] Score: {:.4} ({})",
                    rank + 1,
                    point.score,
                    class
                );
                let _ = writeln!(
                    out,
                    "      Gradient: {:.4}, Curvature: {:.4}",
                    point.gradient_norm, point.curvature
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{
        ConstraintDirection, ConstraintHardness, ConstraintKind,
    };
    use approx::assert_relative_eq;
    use manifold_core::types::{Dimension, DimensionKind};
    use proptest::prelude::*;

    fn quadratic_space() -> StateSpace {
        let mut space = StateSpace::new();
        for name in ["x", "y"] {
            space
                .add_dimension(
                    Dimension::new(DimensionKind::Custom, name, -5.0, 5.0, 21).unwrap(),
                )
                .unwrap();
        }
        space.map_prices(|c| c[0] * c[0] + c[1] * c[1]).unwrap();
        space
    }

    // ========================================
    // Component mappings
    // ========================================

    #[test]
    fn test_gradient_component_zero_at_zero() {
        assert_relative_eq!(gradient_component(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_gradient_component_monotone_and_bounded() {
        let mut previous = -1.0;
        for m in [0.0, 0.1, 0.5, 1.0, 5.0, 50.0, 5000.0] {
            let c = gradient_component(m, 1.0);
            assert!(c > previous);
            assert!((0.0..=1.0).contains(&c));
            previous = c;
        }
        assert!(gradient_component(1e6, 1.0) > 0.999);
    }

    #[test]
    fn test_gradient_component_bad_scale() {
        assert_eq!(gradient_component(10.0, 0.0), 0.0);
        assert_eq!(gradient_component(10.0, -1.0), 0.0);
    }

    #[test]
    fn test_conditioning_component_log_ramp() {
        // Threshold 100: saturation at kappa = 10^4.
        assert_eq!(conditioning_component(1.0, 100.0), 0.0);
        assert_relative_eq!(conditioning_component(100.0, 100.0), 0.5);
        assert_relative_eq!(conditioning_component(1e4, 100.0), 1.0);
        assert_relative_eq!(conditioning_component(1e15, 100.0), 1.0);
    }

    #[test]
    fn test_conditioning_component_bad_threshold() {
        assert_eq!(conditioning_component(50.0, 1.0), 0.0);
        assert_eq!(conditioning_component(50.0, 0.5), 0.0);
    }

    #[test]
    fn test_constraint_component_ramp() {
        assert_eq!(constraint_component(-0.1, 0.05), 1.0);
        assert_eq!(constraint_component(0.0, 0.05), 1.0);
        assert_relative_eq!(constraint_component(0.025, 0.05), 0.5);
        assert_eq!(constraint_component(0.05, 0.05), 0.0);
        assert_eq!(constraint_component(f64::INFINITY, 0.05), 0.0);
    }

    #[test]
    fn test_combine_clamps() {
        let mut config = FragilityConfig::default();
        config.weight_gradient = 5.0;
        let score = combine_components(&config, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(score, 1.0);
    }

    // ========================================
    // Classification
    // ========================================

    #[test]
    fn test_region_class_boundaries() {
        assert_eq!(RegionClass::from_score(0.0), RegionClass::Stable);
        assert_eq!(RegionClass::from_score(0.249), RegionClass::Stable);
        assert_eq!(RegionClass::from_score(0.25), RegionClass::Sensitive);
        assert_eq!(RegionClass::from_score(0.49), RegionClass::Sensitive);
        assert_eq!(RegionClass::from_score(0.50), RegionClass::Fragile);
        assert_eq!(RegionClass::from_score(0.74), RegionClass::Fragile);
        assert_eq!(RegionClass::from_score(0.75), RegionClass::Critical);
        assert_eq!(RegionClass::from_score(1.0), RegionClass::Critical);
    }

    #[test]
    fn test_region_class_labels() {
        assert_eq!(format!("{}", RegionClass::Stable), "STABLE");
        assert_eq!(format!("{}", RegionClass::Critical), "CRITICAL");
    }

    // ========================================
    // Configuration validation
    // ========================================

    #[test]
    fn test_default_config_is_valid() {
        assert!(FragilityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_negative_weight() {
        let mut config = FragilityConfig::default();
        config.weight_constraint = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_bad_scales_and_thresholds() {
        let mut config = FragilityConfig::default();
        config.curvature_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = FragilityConfig::default();
        config.condition_threshold = 1.0;
        assert!(config.validate().is_err());

        let mut config = FragilityConfig::default();
        config.fragility_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    // ========================================
    // Map computation
    // ========================================

    #[test]
    fn test_compute_requires_prices() {
        let mut space = StateSpace::new();
        space
            .add_dimension(Dimension::new(DimensionKind::Spot, "x", 0.0, 1.0, 5).unwrap())
            .unwrap();
        let mut map = FragilityMap::new(&space);
        assert!(matches!(
            map.compute(),
            Err(RiskError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_compute_fills_grid_scores() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        map.compute().unwrap();

        assert!(map.is_computed());
        assert_eq!(map.grid_scores().len(), space.total_points());
        assert!(map.grid_scores().iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_origin_stable_corner_worse() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        map.compute().unwrap();

        let origin = map.fragility_at(&[0.0, 0.0]);
        let corner = map.fragility_at(&[-5.0, -5.0]);
        assert!(origin < 0.25, "origin score {}", origin);
        assert!(corner > origin, "corner {} vs origin {}", corner, origin);
    }

    #[test]
    fn test_statistics_consistent_with_scores() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        map.compute().unwrap();

        let stats = map.statistics();
        let scores = map.grid_scores();
        let max = scores.iter().cloned().fold(0.0_f64, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        assert_relative_eq!(stats.max, max, epsilon = 1e-12);
        assert_relative_eq!(stats.mean, mean, epsilon = 1e-12);
        assert!((0.0..=1.0).contains(&stats.fragile_fraction));
    }

    #[test]
    fn test_fragile_points_hold_coordinate_copies() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        map.compute().unwrap();

        assert!(map.num_fragile_regions() > 0);
        for i in 0..map.num_fragile_regions() {
            let region = map.region(i).unwrap();
            assert_eq!(region.coordinates.len(), 2);
            assert!(region.score >= map.config().fragility_threshold);
            // Recorded scores match the grid at the same node.
            let at_node = map.fragility_at(&region.coordinates);
            assert_relative_eq!(region.score, at_node, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fragility_at_before_compute_is_zero() {
        let space = quadratic_space();
        let map = FragilityMap::new(&space);
        assert_eq!(map.fragility_at(&[0.0, 0.0]), 0.0);
        assert_eq!(map.num_fragile_regions(), 0);
    }

    #[test]
    fn test_set_config_invalidates() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        map.compute().unwrap();
        assert!(map.is_computed());

        map.set_config(FragilityConfig::default());
        assert!(!map.is_computed());
        assert_eq!(map.fragility_at(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected_by_compute() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        let mut config = FragilityConfig::default();
        config.gradient_scale = -1.0;
        map.set_config(config);
        assert!(matches!(
            map.compute(),
            Err(RiskError::InvalidArgument(_))
        ));
    }

    // ========================================
    // Constraint coupling
    // ========================================

    #[test]
    fn test_constraint_proximity_raises_scores() {
        let space = quadratic_space();

        let mut surface = ConstraintSurface::new();
        surface
            .add_full(
                ConstraintKind::PositionLimit,
                "x_cap",
                0,
                ConstraintDirection::Upper,
                5.0,
                ConstraintHardness::Soft,
                1.0,
            )
            .unwrap();

        let mut with = FragilityMap::with_constraints(&space, &surface);
        // Wide proximity band so interior nodes feel the boundary.
        let mut config = FragilityConfig::default();
        config.constraint_threshold = 3.0;
        with.set_config(config);
        with.compute().unwrap();

        let mut without = FragilityMap::new(&space);
        without.set_config(config);
        without.compute().unwrap();

        // On the constraint boundary x = 5 the coupled map scores higher.
        let coupled = with.fragility_at(&[5.0, 0.0]);
        let uncoupled = without.fragility_at(&[5.0, 0.0]);
        assert!(coupled > uncoupled, "{} vs {}", coupled, uncoupled);
    }

    #[test]
    fn test_near_constraint_flag() {
        let space = quadratic_space();

        let mut surface = ConstraintSurface::new();
        surface
            .add_full(
                ConstraintKind::PositionLimit,
                "x_cap",
                0,
                ConstraintDirection::Upper,
                4.9,
                ConstraintHardness::Soft,
                1.0,
            )
            .unwrap();

        let mut map = FragilityMap::with_constraints(&space, &surface);
        let mut config = FragilityConfig::default();
        config.constraint_threshold = 0.5;
        // Record every node so the flag is observable everywhere.
        config.fragility_threshold = 0.0;
        map.set_config(config);
        map.compute().unwrap();

        let mut saw_near = false;
        let mut saw_far = false;
        for region in map.regions() {
            let distance = 4.9 - region.coordinates[0];
            if region.near_constraint {
                saw_near = true;
                assert!(distance < 0.5);
            } else {
                saw_far = true;
                assert!(distance >= 0.5);
            }
        }
        assert!(saw_near && saw_far);
    }

    // ========================================
    // Reporting
    // ========================================

    #[test]
    fn test_report_contains_statistics_and_regions() {
        let space = quadratic_space();
        let mut map = FragilityMap::new(&space);
        map.compute().unwrap();

        let report = map.report(5);
        assert!(report.contains("Fragility Analysis Report"));
        assert!(report.contains("2 dimensions, 441 total points"));
        assert!(report.contains("Max Fragility"));
        assert!(report.contains("Top Fragile Regions"));
        assert!(report.contains("[1] Score:"));
    }

    // ========================================
    // Property tests
    // ========================================

    proptest! {
        #[test]
        fn prop_components_bounded(
            m in 0.0_f64..1e6,
            scale in 0.01_f64..1e3,
            kappa in 1.0_f64..1e16,
            distance in -10.0_f64..10.0,
        ) {
            let g = gradient_component(m, scale);
            prop_assert!((0.0..=1.0).contains(&g));
            let c = conditioning_component(kappa, 100.0);
            prop_assert!((0.0..=1.0).contains(&c));
            let b = constraint_component(distance, 0.05);
            prop_assert!((0.0..=1.0).contains(&b));
        }

        #[test]
        fn prop_combined_score_bounded(
            g in 0.0_f64..1.0,
            c in 0.0_f64..1.0,
            k in 0.0_f64..1.0,
            b in 0.0_f64..1.0,
        ) {
            let config = FragilityConfig::default();
            let score = combine_components(&config, g, c, k, b);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }

    #[cfg(feature = "serde")]
    mod serde_tests {
        use super::*;

        #[test]
        fn test_config_serde_roundtrip() {
            let config = FragilityConfig::default();
            let json = serde_json::to_string(&config).unwrap();
            let deserialized: FragilityConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config, deserialized);
        }

        #[test]
        fn test_fragile_point_serde_roundtrip() {
            let point = FragilePoint {
                coordinates: vec![1.0, -2.5],
                score: 0.62,
                curvature: 12.0,
                gradient_norm: 3.1,
                near_constraint: true,
            };
            let json = serde_json::to_string(&point).unwrap();
            let deserialized: FragilePoint = serde_json::from_str(&json).unwrap();
            assert_eq!(point, deserialized);
        }

        #[test]
        fn test_region_class_serde_roundtrip() {
            for class in [
                RegionClass::Stable,
                RegionClass::Sensitive,
                RegionClass::Fragile,
                RegionClass::Critical,
            ] {
                let json = serde_json::to_string(&class).unwrap();
                let deserialized: RegionClass = serde_json::from_str(&json).unwrap();
                assert_eq!(class, deserialized);
            }
        }
    }
}
