//! Core domain types: risk-factor dimensions and error enumeration.

pub mod dimension;
pub mod error;

pub use dimension::{Dimension, DimensionKind, MAX_DIMENSIONS};
pub use error::RiskError;
