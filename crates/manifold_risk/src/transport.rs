//! Transport metrics: the cost of moving between states.
//!
//! A sampled Riemannian metric tensor field defines, at each point of the
//! state space, the inner product `⟨u, v⟩_x = uᵀ G(x) v` whose square root
//! is infinitesimal arc length. Where the tensor differs from the
//! identity, some directions are more expensive to traverse than their
//! Euclidean length suggests: selling into illiquidity, unwinding
//! concentrated positions, moving against funding constraints.

use manifold_core::types::{RiskError, MAX_DIMENSIONS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of tensor samples a metric may hold.
pub const MAX_METRIC_SAMPLES: usize = 1024;

/// Number of midpoint-rule steps used by the geodesic integrator.
pub const GEODESIC_STEPS: usize = 100;

/// Inverse-distance weighting regulariser.
const IDW_EPSILON: f64 = 1e-10;

/// Inverse-distance weighting power.
const IDW_POWER: f64 = 2.0;

/// Endpoint separation below which a path degenerates to a point.
const COINCIDENT_EPSILON: f64 = 1e-15;

/// Symmetric metric tensor at one point of the state space.
///
/// Stored row-major. Positive-definiteness is the producer's
/// responsibility and is not re-verified on read; inverse-distance
/// interpolation preserves linearity but not definiteness.
///
/// # Examples
///
/// ```
/// use manifold_risk::transport::MetricTensor;
///
/// let g = MetricTensor::diagonal(&[4.0, 1.0]);
/// // Length of (1, 0) under g is sqrt(4) = 2.
/// assert!((g.length(&[1.0, 0.0]) - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricTensor {
    num_dims: usize,
    data: Vec<f64>,
}

impl MetricTensor {
    /// The identity (Euclidean) tensor.
    pub fn identity(num_dims: usize) -> Self {
        let mut data = vec![0.0; num_dims * num_dims];
        for i in 0..num_dims {
            data[i * num_dims + i] = 1.0;
        }
        Self { num_dims, data }
    }

    /// Diagonal tensor with the given entries.
    pub fn diagonal(entries: &[f64]) -> Self {
        let n = entries.len();
        let mut tensor = Self::identity(n);
        for (i, &v) in entries.iter().enumerate() {
            tensor.data[i * n + i] = v;
        }
        tensor
    }

    /// Tensor from a full row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` when the buffer is not
    /// `num_dims × num_dims`.
    pub fn from_rows(num_dims: usize, data: &[f64]) -> Result<Self, RiskError> {
        if data.len() != num_dims * num_dims {
            return Err(RiskError::InvalidArgument(format!(
                "tensor buffer holds {} entries, expected {}",
                data.len(),
                num_dims * num_dims
            )));
        }
        Ok(Self {
            num_dims,
            data: data.to_vec(),
        })
    }

    /// Liquidity-adjusted diagonal tensor: `g_ii = 1 / max(liq_i, 0.01)`.
    ///
    /// Illiquid axes are expensive to move along.
    pub fn from_liquidity(liquidity: &[f64]) -> Self {
        let entries: Vec<f64> = liquidity.iter().map(|&l| 1.0 / l.max(0.01)).collect();
        Self::diagonal(&entries)
    }

    /// Market-impact diagonal tensor: `g_ii = 1 + κ_i · |pos_i|`.
    pub fn from_impact(positions: &[f64], impact_coeffs: &[f64]) -> Self {
        let entries: Vec<f64> = positions
            .iter()
            .zip(impact_coeffs)
            .map(|(&p, &k)| 1.0 + k * p.abs())
            .collect();
        Self::diagonal(&entries)
    }

    /// Symmetric average of asymmetric buy/sell costs:
    /// `g_ii = (buy_i + sell_i) / 2`.
    ///
    /// True asymmetry needs Finsler geometry; the average is the
    /// Riemannian approximation.
    pub fn from_asymmetric_costs(buy_costs: &[f64], sell_costs: &[f64]) -> Self {
        let entries: Vec<f64> = buy_costs
            .iter()
            .zip(sell_costs)
            .map(|(&b, &s)| 0.5 * (b + s))
            .collect();
        Self::diagonal(&entries)
    }

    /// Returns the tensor order.
    #[inline]
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Entry `g[i][j]`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.num_dims + j]
    }

    /// Set `g[i][j]` and its mirror `g[j][i]`.
    #[inline]
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.num_dims + j] = value;
        self.data[j * self.num_dims + i] = value;
    }

    /// Returns the row-major buffer.
    #[inline]
    pub fn rows(&self) -> &[f64] {
        &self.data
    }

    /// Scale every entry by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// Quadratic form `vᵀ G v`.
    pub fn quadratic_form(&self, v: &[f64]) -> f64 {
        let n = self.num_dims;
        let mut sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                sum += v[i] * self.data[i * n + j] * v[j];
            }
        }
        sum
    }

    /// Length `sqrt(vᵀ G v)` of a displacement, floored at 0.
    pub fn length(&self, v: &[f64]) -> f64 {
        let q = self.quadratic_form(v);
        if q > 0.0 {
            q.sqrt()
        } else {
            0.0
        }
    }
}

/// One sampled tensor at a location in state space.
#[derive(Debug, Clone)]
struct MetricSample {
    point: Vec<f64>,
    tensor: MetricTensor,
}

/// Sampled Riemannian tensor field with inverse-distance interpolation
/// and midpoint geodesic integration.
///
/// # Examples
///
/// ```
/// use manifold_risk::transport::{MetricTensor, TransportMetric};
///
/// let mut metric = TransportMetric::new(2).unwrap();
/// metric
///     .add_sample(&[0.0, 0.0], MetricTensor::identity(2))
///     .unwrap();
/// metric
///     .add_sample(&[10.0, 0.0], MetricTensor::identity(2))
///     .unwrap();
///
/// let d = metric.distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
/// assert!((d - 5.0).abs() < 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct TransportMetric {
    num_dims: usize,
    samples: Vec<MetricSample>,
    default_tensor: Option<MetricTensor>,
    interpolation_radius: f64,
}

impl TransportMetric {
    /// Create a metric over `num_dims` dimensions with the identity as
    /// default tensor and global interpolation (radius 0).
    ///
    /// # Errors
    ///
    /// Returns `RiskError::InvalidArgument` unless
    /// `1 <= num_dims <= 16`.
    pub fn new(num_dims: usize) -> Result<Self, RiskError> {
        if num_dims == 0 || num_dims > MAX_DIMENSIONS {
            return Err(RiskError::InvalidArgument(format!(
                "dimension count must be in 1..={}, got {}",
                MAX_DIMENSIONS, num_dims
            )));
        }
        Ok(Self {
            num_dims,
            samples: Vec::new(),
            default_tensor: None,
            interpolation_radius: 0.0,
        })
    }

    /// Returns the dimension count.
    #[inline]
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Returns the number of stored samples.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Replace the default tensor used where no samples apply.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` on tensor order mismatch.
    pub fn set_default(&mut self, tensor: MetricTensor) -> Result<(), RiskError> {
        if tensor.num_dims() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: tensor.num_dims(),
            });
        }
        self.default_tensor = Some(tensor);
        Ok(())
    }

    /// Set the interpolation radius.
    ///
    /// Zero means every sample contributes everywhere; a positive radius
    /// restricts interpolation to samples within that Euclidean distance.
    /// Negative values are clamped to zero.
    pub fn set_radius(&mut self, radius: f64) {
        self.interpolation_radius = radius.max(0.0);
    }

    /// Store a tensor sample at `point`.
    ///
    /// # Errors
    ///
    /// * `RiskError::DimensionMismatch` - point or tensor order mismatch
    /// * `RiskError::InvalidArgument` - sample capacity
    ///   ([`MAX_METRIC_SAMPLES`]) exhausted
    pub fn add_sample(&mut self, point: &[f64], tensor: MetricTensor) -> Result<(), RiskError> {
        if point.len() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: point.len(),
            });
        }
        if tensor.num_dims() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: tensor.num_dims(),
            });
        }
        if self.samples.len() >= MAX_METRIC_SAMPLES {
            return Err(RiskError::InvalidArgument(format!(
                "transport metric is limited to {} samples",
                MAX_METRIC_SAMPLES
            )));
        }
        self.samples.push(MetricSample {
            point: point.to_vec(),
            tensor,
        });
        Ok(())
    }

    /// Liquidity convenience: sample `diag(1 / max(liq_i, 0.01))` at
    /// `point`.
    ///
    /// # Errors
    ///
    /// As [`add_sample`](TransportMetric::add_sample).
    pub fn add_liquidity_sample(
        &mut self,
        point: &[f64],
        liquidity: &[f64],
    ) -> Result<(), RiskError> {
        self.add_sample(point, MetricTensor::from_liquidity(liquidity))
    }

    /// Market-impact convenience: sample `diag(1 + κ_i·|pos_i|)` at
    /// `point`.
    ///
    /// # Errors
    ///
    /// As [`add_sample`](TransportMetric::add_sample).
    pub fn add_impact_sample(
        &mut self,
        point: &[f64],
        positions: &[f64],
        impact_coeffs: &[f64],
    ) -> Result<(), RiskError> {
        self.add_sample(point, MetricTensor::from_impact(positions, impact_coeffs))
    }

    /// Interpolated tensor at `coords`.
    ///
    /// Inverse-distance weighting over the samples in range:
    /// `w_k = 1 / (d_k + ε)²`. With no samples in range (or no samples at
    /// all) the default tensor applies; identity when none was set.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` on coordinate count
    /// mismatch.
    pub fn tensor_at(&self, coords: &[f64]) -> Result<MetricTensor, RiskError> {
        if coords.len() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: coords.len(),
            });
        }

        if self.samples.is_empty() {
            return Ok(self.default());
        }

        let n2 = self.num_dims * self.num_dims;
        let mut accumulated = vec![0.0; n2];
        let mut total_weight = 0.0;

        for sample in &self.samples {
            let dist = euclidean_distance(coords, &sample.point);
            if self.interpolation_radius > 0.0 && dist > self.interpolation_radius {
                continue;
            }
            let weight = 1.0 / (dist + IDW_EPSILON).powf(IDW_POWER);
            total_weight += weight;
            for (acc, &v) in accumulated.iter_mut().zip(sample.tensor.rows()) {
                *acc += weight * v;
            }
        }

        if total_weight <= IDW_EPSILON {
            return Ok(self.default());
        }

        for v in &mut accumulated {
            *v /= total_weight;
        }
        MetricTensor::from_rows(self.num_dims, &accumulated)
    }

    fn default(&self) -> MetricTensor {
        self.default_tensor
            .clone()
            .unwrap_or_else(|| MetricTensor::identity(self.num_dims))
    }

    /// Geodesic cost of the straight segment from `from` to `to`.
    ///
    /// The segment is discretised into [`GEODESIC_STEPS`] steps; each
    /// contributes `sqrt(Δᵀ G(x_mid) Δ)` with the tensor interpolated at
    /// the step midpoint. Exact for constant tensors, first-order accurate
    /// for slowly varying ones.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` on coordinate count
    /// mismatch.
    pub fn distance(&self, from: &[f64], to: &[f64]) -> Result<f64, RiskError> {
        if from.len() != self.num_dims || to.len() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: from.len().max(to.len()),
            });
        }

        let n = self.num_dims;
        let direction: Vec<f64> = from.iter().zip(to).map(|(&a, &b)| b - a).collect();
        let dt = 1.0 / GEODESIC_STEPS as f64;

        let mut midpoint = vec![0.0; n];
        let mut total = 0.0;

        for step in 0..GEODESIC_STEPS {
            let t = (step as f64 + 0.5) * dt;
            for (m, (&a, &d)) in midpoint.iter_mut().zip(from.iter().zip(&direction)) {
                *m = a + t * d;
            }
            let tensor = self.tensor_at(&midpoint)?;
            total += tensor.length(&direction) * dt;
        }

        Ok(total)
    }

    /// Local cost `sqrt(dvᵀ G(x) dv)` of a displacement at a point.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` on coordinate count
    /// mismatch.
    pub fn local_cost(&self, coords: &[f64], displacement: &[f64]) -> Result<f64, RiskError> {
        if displacement.len() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: displacement.len(),
            });
        }
        Ok(self.tensor_at(coords)?.length(displacement))
    }

    /// Total geodesic cost along a polyline of waypoints.
    ///
    /// Returns 0 for fewer than two waypoints.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` when any waypoint disagrees
    /// with the metric's dimension count.
    pub fn path_cost(&self, waypoints: &[Vec<f64>]) -> Result<f64, RiskError> {
        let mut total = 0.0;
        for pair in waypoints.windows(2) {
            total += self.distance(&pair[0], &pair[1])?;
        }
        Ok(total)
    }

    /// Ratio of transport distance to Euclidean distance.
    ///
    /// 1 for the identity metric; above 1 signals friction. Coincident
    /// endpoints report 1.
    ///
    /// # Errors
    ///
    /// Returns `RiskError::DimensionMismatch` on coordinate count
    /// mismatch.
    pub fn friction_ratio(&self, from: &[f64], to: &[f64]) -> Result<f64, RiskError> {
        if from.len() != self.num_dims || to.len() != self.num_dims {
            return Err(RiskError::DimensionMismatch {
                expected: self.num_dims,
                actual: from.len().max(to.len()),
            });
        }
        let euclidean = euclidean_distance(from, to);
        if euclidean < COINCIDENT_EPSILON {
            return Ok(1.0);
        }
        Ok(self.distance(from, to)? / euclidean)
    }
}

/// Euclidean distance between two points.
fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
