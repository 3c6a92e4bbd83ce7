//! # manifold_core: Mathematical Foundation for Fragility Analysis
//!
//! ## Layer 1 (Foundation) Role
//!
//! manifold_core serves as the bottom layer of the 3-layer architecture,
//! providing:
//! - Risk-factor dimensions and uniform grids (`types::dimension`)
//! - Finite-difference stencils for numerical differentiation
//!   (`math::differentiation`)
//! - Jacobi eigendecomposition for symmetric matrices (`math::eigen`)
//! - Error types: `RiskError` (`types::error`)
//!
//! ## Minimal Dependency Principle
//!
//! Layer 1 has no dependencies on other manifold_* crates, with minimal
//! external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - thiserror: Structured error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use manifold_core::math::differentiation::partial_central;
//! use manifold_core::types::{Dimension, DimensionKind};
//!
//! // A spot dimension discretised into 21 nodes on [80, 120]
//! let spot = Dimension::new(DimensionKind::Spot, "spot", 80.0, 120.0, 21).unwrap();
//! assert_eq!(spot.step(), 2.0);
//! assert_eq!(spot.nearest_index(100.9), 10);
//!
//! // Central difference of f(x) = x^2 at x = 3
//! let mut f = |coords: &[f64]| coords[0] * coords[0];
//! let mut scratch = [3.0];
//! let slope = partial_central(&mut f, &mut scratch, 0, 1e-6);
//! assert!((slope - 6.0).abs() < 1e-6);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for `DimensionKind`, `RiskError`

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod types;

pub use types::{Dimension, DimensionKind, RiskError, MAX_DIMENSIONS};
