//! # manifold_risk: Fragility Mapping and Transport Geometry
//!
//! ## Layer 3 (Application) Role
//!
//! manifold_risk turns the differential geometry of `manifold_geometry`
//! into actionable risk measures:
//! - Constraint surfaces bounding the admissible state space
//!   (`constraints`)
//! - Riemannian transport metrics pricing movement between states
//!   (`transport`)
//! - Fragility maps fusing sensitivity, curvature, conditioning and
//!   constraint proximity into a bounded score (`fragility`)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │           manifold_risk (L3)             │
//! ├──────────────────────────────────────────┤
//! │  constraints/ - admissible boundaries    │
//! │  transport/   - metric tensors, geodesics│
//! │  fragility/   - scoring, classification  │
//! └──────────────────────────────────────────┘
//!          ↓
//! ┌──────────────────────────────────────────┐
//! │         manifold_geometry (L2)           │
//! │  state space, Jacobian, Hessian          │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use manifold_core::types::{Dimension, DimensionKind};
//! use manifold_geometry::StateSpace;
//! use manifold_risk::fragility::{FragilityMap, RegionClass};
//!
//! let mut space = StateSpace::new();
//! for name in ["x", "y"] {
//!     space
//!         .add_dimension(Dimension::new(DimensionKind::Custom, name, -5.0, 5.0, 21).unwrap())
//!         .unwrap();
//! }
//! space.map_prices(|c| c[0] * c[0] + c[1] * c[1]).unwrap();
//!
//! let mut map = FragilityMap::new(&space);
//! map.compute().unwrap();
//! let at_origin = map.fragility_at(&[0.0, 0.0]);
//! assert_eq!(RegionClass::from_score(at_origin), RegionClass::Stable);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod constraints;
pub mod fragility;
pub mod transport;

pub use constraints::{
    Constraint, ConstraintDirection, ConstraintHardness, ConstraintKind, ConstraintSurface,
    MAX_CONSTRAINTS,
};
pub use fragility::{FragilePoint, FragilityConfig, FragilityMap, FragilityStats, RegionClass};
pub use transport::{MetricTensor, TransportMetric, GEODESIC_STEPS, MAX_METRIC_SAMPLES};
