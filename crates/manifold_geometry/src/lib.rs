//! # manifold_geometry: Differential Geometry of Sampled Pricing Surfaces
//!
//! ## Layer 2 (Geometry) Role
//!
//! manifold_geometry sits between the mathematical foundation
//! (`manifold_core`) and the risk application layer (`manifold_risk`),
//! providing:
//! - Gridded state spaces with sampled function values and multilinear
//!   interpolation (`state_space`)
//! - First-order sensitivity via central differences (`jacobian`)
//! - Second-order curvature with Jacobi eigendecomposition (`hessian`)
//! - Shared differentiation configuration (`config`)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │         manifold_geometry (L2)           │
//! ├──────────────────────────────────────────┤
//! │  state_space/ - grid, sampling, interp   │
//! │  jacobian/    - gradient analysis        │
//! │  hessian/     - curvature, eigenvalues   │
//! └──────────────────────────────────────────┘
//!          ↓
//! ┌──────────────────────────────────────────┐
//! │          manifold_core (L1)              │
//! │  dimensions, stencils, Jacobi rotations  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use manifold_core::types::{Dimension, DimensionKind};
//! use manifold_geometry::{Jacobian, StateSpace};
//!
//! let mut space = StateSpace::new();
//! space
//!     .add_dimension(Dimension::new(DimensionKind::Spot, "spot", -5.0, 5.0, 21).unwrap())
//!     .unwrap();
//! space.map_prices(|coords| coords[0] * coords[0]).unwrap();
//!
//! let mut jac = Jacobian::new(1).unwrap();
//! jac.compute(&space, &[2.0]).unwrap();
//! assert!((jac.get(0) - 4.0).abs() < 0.2);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod config;
pub mod hessian;
pub mod jacobian;
pub mod state_space;

pub use config::DiffConfig;
pub use hessian::{Definiteness, Hessian};
pub use jacobian::Jacobian;
pub use state_space::StateSpace;
