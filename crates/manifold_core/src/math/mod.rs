//! Numerical mathematics: finite-difference stencils and eigendecomposition.

pub mod differentiation;
pub mod eigen;
