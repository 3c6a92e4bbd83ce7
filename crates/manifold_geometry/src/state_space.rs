//! Gridded state spaces with sampled function values.
//!
//! A [`StateSpace`] is the Cartesian product of up to
//! [`MAX_DIMENSIONS`](manifold_core::types::MAX_DIMENSIONS) risk-factor
//! dimensions. Sampling a pricing function across the grid produces a flat
//! price buffer indexed row-major with the last dimension varying fastest;
//! multilinear interpolation then evaluates the sampled surface anywhere
//! inside the box.

use manifold_core::types::{Dimension, RiskError, MAX_DIMENSIONS};

/// Cartesian product of risk-factor dimensions with an optional sampled
/// price grid.
///
/// The price buffer is only present after a successful
/// [`map_prices`](StateSpace::map_prices) pass; adding a dimension discards
/// it. Derived objects ([`Jacobian`](crate::Jacobian),
/// [`Hessian`](crate::Hessian), fragility maps) borrow the state space
/// immutably, so the borrow checker rules out mutation while a child is
/// alive.
///
/// # Examples
///
/// ```
/// use manifold_core::types::{Dimension, DimensionKind};
/// use manifold_geometry::StateSpace;
///
/// let mut space = StateSpace::new();
/// space
///     .add_dimension(Dimension::new(DimensionKind::Spot, "spot", 0.0, 10.0, 11).unwrap())
///     .unwrap();
/// space
///     .add_dimension(Dimension::new(DimensionKind::Volatility, "vol", 0.1, 0.5, 5).unwrap())
///     .unwrap();
///
/// assert_eq!(space.total_points(), 55);
/// space.map_prices(|coords| coords[0] * coords[1]).unwrap();
/// let price = space.interpolate_price(&[5.0, 0.3]).unwrap();
/// assert!((price - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateSpace {
    dims: Vec<Dimension>,
    strides: Vec<usize>,
    total_points: usize,
    prices: Option<Vec<f64>>,
}

impl StateSpace {
    /// Create an empty state space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension.
    ///
    /// Recomputes strides and total size in O(n) and invalidates any
    /// previously sampled prices.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` when the space already holds
    /// [`MAX_DIMENSIONS`] dimensions.
    pub fn add_dimension(&mut self, dim: Dimension) -> Result<(), RiskError> {
        if self.dims.len() >= MAX_DIMENSIONS {
            return Err(RiskError::InvalidArgument(format!(
                "state space is limited to {} dimensions",
                MAX_DIMENSIONS
            )));
        }

        self.dims.push(dim);
        self.recompute_strides();
        self.prices = None;
        Ok(())
    }

    /// Row-major strides: `stride[last] = 1`, each earlier stride the
    /// product of the following dimensions' node counts.
    fn recompute_strides(&mut self) {
        let n = self.dims.len();
        self.strides = vec![0; n];
        self.strides[n - 1] = 1;
        for d in (0..n.saturating_sub(1)).rev() {
            self.strides[d] = self.strides[d + 1] * self.dims[d + 1].num_points();
        }
        self.total_points = self.strides[0] * self.dims[0].num_points();
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    /// Returns the dimensions in insertion order.
    #[inline]
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Returns the dimension at `index`, if present.
    #[inline]
    pub fn dim(&self, index: usize) -> Option<&Dimension> {
        self.dims.get(index)
    }

    /// Returns the total number of grid nodes (`∏ N_d`; 0 when empty).
    #[inline]
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// Returns the row-major strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns true once prices have been mapped and not invalidated since.
    #[inline]
    pub fn prices_valid(&self) -> bool {
        self.prices.is_some()
    }

    /// Flat index from a multi-index.
    ///
    /// `indices` must hold one entry per dimension, each within its node
    /// count; out-of-range indices produce an out-of-range flat index.
    #[inline]
    pub fn flat_index(&self, indices: &[usize]) -> usize {
        debug_assert_eq!(indices.len(), self.dims.len());
        indices
            .iter()
            .zip(&self.strides)
            .map(|(&i, &s)| i * s)
            .sum()
    }

    /// Multi-index from a flat index, by iterative division in stride
    /// order.
    pub fn multi_index(&self, flat: usize) -> Vec<usize> {
        let mut remainder = flat;
        self.strides
            .iter()
            .map(|&stride| {
                let idx = remainder / stride;
                remainder %= stride;
                idx
            })
            .collect()
    }

    /// Grid-node coordinates for a flat index, written into `out`.
    pub fn coordinates_into(&self, flat: usize, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.dims.len());
        let mut remainder = flat;
        for (d, stride) in self.strides.iter().enumerate() {
            let idx = remainder / stride;
            remainder %= stride;
            out[d] = self.dims[d].grid()[idx];
        }
    }

    /// Grid-node coordinates for a flat index.
    pub fn coordinates(&self, flat: usize) -> Vec<f64> {
        let mut out = vec![0.0; self.dims.len()];
        self.coordinates_into(flat, &mut out);
        out
    }

    /// Flat index of the grid node nearest to `coords`.
    ///
    /// Each coordinate is clamped to its dimension's range; ties resolve
    /// to the lower node.
    pub fn nearest_index(&self, coords: &[f64]) -> usize {
        debug_assert_eq!(coords.len(), self.dims.len());
        self.dims
            .iter()
            .zip(coords)
            .zip(&self.strides)
            .map(|((dim, &v), &stride)| dim.nearest_index(v) * stride)
            .sum()
    }

    /// Sample a pricing function at every grid node.
    ///
    /// Visits flat indices in order, reconstructs the node coordinates and
    /// stores the returned scalar. The function receives a coordinate
    /// slice it cannot mutate or retain. Marks prices valid on completion.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::NotInitialized` when the space has no
    /// dimensions.
    pub fn map_prices<F>(&mut self, mut pricer: F) -> Result<(), RiskError>
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.try_map_prices(|coords| Ok(pricer(coords)))
    }

    /// Sample a fallible pricing function at every grid node.
    ///
    /// Like [`map_prices`](StateSpace::map_prices) but the pricer may
    /// refuse a node. Any failure aborts the pass, discards the partial
    /// buffer and leaves prices invalid.
    ///
    /// # Errors
    ///
    /// * `RiskError::NotInitialized` - the space has no dimensions
    /// * Any error returned by the pricer, typically
    ///   `RiskError::PricingEngineFailed`
    pub fn try_map_prices<F>(&mut self, mut pricer: F) -> Result<(), RiskError>
    where
        F: FnMut(&[f64]) -> Result<f64, RiskError>,
    {
        if self.dims.is_empty() {
            return Err(RiskError::NotInitialized(
                "state space has no dimensions".to_string(),
            ));
        }

        let mut buffer = vec![0.0; self.total_points];
        let mut coords = vec![0.0; self.dims.len()];

        for (flat, slot) in buffer.iter_mut().enumerate() {
            self.coordinates_into(flat, &mut coords);
            *slot = pricer(&coords)?;
        }

        self.prices = Some(buffer);
        Ok(())
    }

    /// Sampled price at a flat index.
    ///
    /// # Errors
    ///
    /// * `RiskError::NotInitialized` - prices have not been mapped
    /// * `RiskError::InvalidArgument` - `flat` is out of range
    pub fn price_at(&self, flat: usize) -> Result<f64, RiskError> {
        let prices = self.prices.as_ref().ok_or_else(|| {
            RiskError::NotInitialized("prices have not been mapped".to_string())
        })?;
        prices.get(flat).copied().ok_or_else(|| {
            RiskError::InvalidArgument(format!(
                "flat index {} out of range ({} grid nodes)",
                flat, self.total_points
            ))
        })
    }

    /// Sampled price at the grid node nearest to `coords`.
    ///
    /// # Errors
    ///
    /// * `RiskError::NotInitialized` - prices have not been mapped
    /// * `RiskError::DimensionMismatch` - wrong coordinate count
    pub fn price_nearest(&self, coords: &[f64]) -> Result<f64, RiskError> {
        self.check_coords(coords)?;
        self.price_at(self.nearest_index(coords))
    }

    /// Multilinear interpolation of the sampled surface at `coords`.
    ///
    /// Each coordinate is clamped to its dimension's range and located in
    /// its bracketing cell; the result is the weighted sum of the `2^n`
    /// cell-corner prices. At or beyond a boundary the interpolation
    /// collapses to the boundary value; there is no extrapolation.
    ///
    /// # Errors
    ///
    /// * `RiskError::NotInitialized` - prices have not been mapped
    /// * `RiskError::DimensionMismatch` - wrong coordinate count
    pub fn interpolate_price(&self, coords: &[f64]) -> Result<f64, RiskError> {
        let prices = self.prices.as_ref().ok_or_else(|| {
            RiskError::NotInitialized("prices have not been mapped".to_string())
        })?;
        self.check_coords(coords)?;

        let n = self.dims.len();
        let brackets: Vec<(usize, usize, f64)> = self
            .dims
            .iter()
            .zip(coords)
            .map(|(dim, &v)| dim.bracket(v))
            .collect();

        let mut result = 0.0;
        for corner in 0..(1_usize << n) {
            let mut weight = 1.0;
            let mut flat = 0;
            for (d, &(lo, hi, t)) in brackets.iter().enumerate() {
                let use_hi = (corner >> d) & 1 == 1;
                flat += if use_hi { hi } else { lo } * self.strides[d];
                weight *= if use_hi { t } else { 1.0 - t };
            }
            result += weight * prices[flat];
        }
        Ok(result)
    }

    fn check_coords(&self, coords: &[f64]) -> Result<(), RiskError> {
        if coords.len() != self.dims.len() {
            return Err(RiskError::DimensionMismatch {
                expected: self.dims.len(),
                actual: coords.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use manifold_core::types::DimensionKind;
    use proptest::prelude::*;

    fn space_2d() -> StateSpace {
        let mut space = StateSpace::new();
        space
            .add_dimension(Dimension::new(DimensionKind::Spot, "x", 0.0, 10.0, 11).unwrap())
            .unwrap();
        space
            .add_dimension(Dimension::new(DimensionKind::Volatility, "y", 0.0, 6.0, 7).unwrap())
            .unwrap();
        space
    }

    // ========================================
    // Construction and strides
    // ========================================

    #[test]
    fn test_empty_space() {
        let space = StateSpace::new();
        assert_eq!(space.num_dims(), 0);
        assert_eq!(space.total_points(), 0);
        assert!(!space.prices_valid());
    }

    #[test]
    fn test_total_points_is_product() {
        let space = space_2d();
        assert_eq!(space.total_points(), 77);
    }

    #[test]
    fn test_strides_row_major_last_fastest() {
        let space = space_2d();
        assert_eq!(space.strides(), &[7, 1]);
    }

    #[test]
    fn test_strides_strictly_decreasing() {
        let mut space = space_2d();
        space
            .add_dimension(Dimension::new(DimensionKind::Rate, "r", 0.0, 1.0, 3).unwrap())
            .unwrap();
        let strides = space.strides();
        for d in 0..strides.len() - 1 {
            assert!(strides[d] > strides[d + 1]);
        }
        assert_eq!(*strides.last().unwrap(), 1);
    }

    #[test]
    fn test_dimension_cap() {
        let mut space = StateSpace::new();
        for i in 0..MAX_DIMENSIONS {
            let name = format!("d{}", i);
            space
                .add_dimension(
                    Dimension::new(DimensionKind::Custom, name, 0.0, 1.0, 2).unwrap(),
                )
                .unwrap();
        }
        let overflow = space.add_dimension(
            Dimension::new(DimensionKind::Custom, "extra", 0.0, 1.0, 2).unwrap(),
        );
        assert!(matches!(overflow, Err(RiskError::InvalidArgument(_))));
    }

    #[test]
    fn test_add_dimension_invalidates_prices() {
        let mut space = space_2d();
        space.map_prices(|c| c[0] + c[1]).unwrap();
        assert!(space.prices_valid());
        space
            .add_dimension(Dimension::new(DimensionKind::Rate, "r", 0.0, 1.0, 2).unwrap())
            .unwrap();
        assert!(!space.prices_valid());
    }

    // ========================================
    // Index round-trips
    // ========================================

    #[test]
    fn test_flat_multi_roundtrip_exhaustive() {
        let space = space_2d();
        for flat in 0..space.total_points() {
            let multi = space.multi_index(flat);
            assert_eq!(space.flat_index(&multi), flat);
        }
    }

    #[test]
    fn test_coordinates_of_flat_index() {
        let space = space_2d();
        // flat = 3 * 7 + 2 -> x node 3, y node 2
        let coords = space.coordinates(23);
        assert_relative_eq!(coords[0], 3.0);
        assert_relative_eq!(coords[1], 2.0);
    }

    #[test]
    fn test_nearest_index_roundtrip_on_nodes() {
        let space = space_2d();
        for flat in 0..space.total_points() {
            let coords = space.coordinates(flat);
            assert_eq!(space.nearest_index(&coords), flat);
        }
    }

    // ========================================
    // Price mapping
    // ========================================

    #[test]
    fn test_map_prices_stores_node_values() {
        let mut space = space_2d();
        space.map_prices(|c| c[0] * 100.0 + c[1]).unwrap();
        for flat in 0..space.total_points() {
            let coords = space.coordinates(flat);
            let expected = coords[0] * 100.0 + coords[1];
            assert_eq!(space.price_at(flat).unwrap(), expected);
        }
    }

    #[test]
    fn test_map_prices_empty_space_fails() {
        let mut space = StateSpace::new();
        let result = space.map_prices(|_| 0.0);
        assert!(matches!(result, Err(RiskError::NotInitialized(_))));
    }

    #[test]
    fn test_try_map_prices_propagates_failure() {
        let mut space = space_2d();
        let result = space.try_map_prices(|c| {
            if c[0] > 5.0 {
                Err(RiskError::PricingEngineFailed("blown up".to_string()))
            } else {
                Ok(c[0])
            }
        });
        assert!(matches!(result, Err(RiskError::PricingEngineFailed(_))));
        assert!(!space.prices_valid());
    }

    #[test]
    fn test_price_at_out_of_range() {
        let mut space = space_2d();
        space.map_prices(|_| 1.0).unwrap();
        let result = space.price_at(space.total_points());
        assert!(matches!(result, Err(RiskError::InvalidArgument(_))));
    }

    #[test]
    fn test_price_nearest_snaps_to_node() {
        let mut space = space_2d();
        space.map_prices(|c| c[0] * 100.0 + c[1]).unwrap();
        // (3.2, 1.9) snaps to node (3, 2)
        assert_eq!(space.price_nearest(&[3.2, 1.9]).unwrap(), 302.0);
    }

    // ========================================
    // Multilinear interpolation
    // ========================================

    #[test]
    fn test_interpolation_requires_prices() {
        let space = space_2d();
        let result = space.interpolate_price(&[1.0, 1.0]);
        assert!(matches!(result, Err(RiskError::NotInitialized(_))));
    }

    #[test]
    fn test_interpolation_dimension_mismatch() {
        let mut space = space_2d();
        space.map_prices(|_| 1.0).unwrap();
        let result = space.interpolate_price(&[1.0]);
        assert!(matches!(
            result,
            Err(RiskError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_interpolation_exact_at_nodes() {
        let mut space = space_2d();
        space.map_prices(|c| c[0] * c[0] + c[1]).unwrap();
        for flat in 0..space.total_points() {
            let coords = space.coordinates(flat);
            let interpolated = space.interpolate_price(&coords).unwrap();
            assert_relative_eq!(
                interpolated,
                space.price_at(flat).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_interpolation_exact_for_multilinear_function() {
        let mut space = space_2d();
        // f(x, y) = 2x + 3y + xy is multilinear, so interpolation is exact.
        space.map_prices(|c| 2.0 * c[0] + 3.0 * c[1] + c[0] * c[1]).unwrap();
        let f = |x: f64, y: f64| 2.0 * x + 3.0 * y + x * y;
        for &(x, y) in &[(0.5, 0.5), (3.7, 2.1), (9.99, 5.99)] {
            let z = space.interpolate_price(&[x, y]).unwrap();
            assert_relative_eq!(z, f(x, y), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_interpolation_collapses_to_boundary() {
        let mut space = space_2d();
        space.map_prices(|c| c[0] + c[1]).unwrap();
        // Beyond both upper bounds: boundary value, no extrapolation.
        let z = space.interpolate_price(&[50.0, 50.0]).unwrap();
        assert_relative_eq!(z, 16.0, epsilon = 1e-12);
        let z = space.interpolate_price(&[-50.0, -50.0]).unwrap();
        assert_relative_eq!(z, 0.0, epsilon = 1e-12);
    }

    // ========================================
    // Property tests
    // ========================================

    proptest! {
        #[test]
        fn prop_flat_multi_roundtrip(
            n0 in 2_usize..6,
            n1 in 2_usize..6,
            n2 in 2_usize..6,
        ) {
            let mut space = StateSpace::new();
            for (i, n) in [n0, n1, n2].into_iter().enumerate() {
                let name = format!("d{}", i);
                space
                    .add_dimension(
                        Dimension::new(DimensionKind::Custom, name, 0.0, 1.0, n).unwrap(),
                    )
                    .unwrap();
            }
            prop_assert_eq!(space.total_points(), n0 * n1 * n2);
            for flat in 0..space.total_points() {
                let multi = space.multi_index(flat);
                prop_assert_eq!(space.flat_index(&multi), flat);
            }
        }

        #[test]
        fn prop_interpolation_within_sampled_range(
            x in 0.0_f64..10.0,
            y in 0.0_f64..6.0,
        ) {
            let mut space = space_2d();
            space.map_prices(|c| c[0] - c[1]).unwrap();
            // f is multilinear, so every interpolated value stays inside
            // the sampled extremes.
            let z = space.interpolate_price(&[x, y]).unwrap();
            prop_assert!((-6.0..=10.0).contains(&z));
        }
    }
}
