//! Error types for structured error handling.
//!
//! This module provides [`RiskError`], the categorised error enumeration
//! shared by every layer of the analysis stack. Errors are returned, never
//! thrown: fallible operations yield `Result<T, RiskError>` and leave the
//! receiver in its prior state on failure.

use thiserror::Error;

/// Categorised errors for manifold analysis operations.
///
/// Provides structured error handling with descriptive context for each
/// failure mode.
///
/// # Variants
/// - `InvalidArgument`: Invalid parameters or out-of-range inputs
/// - `DimensionMismatch`: Collaborating objects disagree on dimension count
/// - `NotInitialized`: Required state (e.g. sampled prices) is missing
/// - `SingularMatrix`: Matrix singular to working precision
/// - `NumericalInstability`: Iterative computation failed to converge
/// - `PricingEngineFailed`: External pricing callback reported failure
/// - `ConstraintViolation`: A hard constraint was escalated by the caller
///
/// # Examples
/// ```
/// use manifold_core::types::RiskError;
///
/// let err = RiskError::InvalidArgument("dimension needs at least 2 points".to_string());
/// assert_eq!(
///     format!("{}", err),
///     "Invalid argument: dimension needs at least 2 points"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskError {
    /// Invalid input data or parameters.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Dimension count does not match the collaborating object.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension count the receiver was built for.
        expected: usize,
        /// Dimension count actually supplied.
        actual: usize,
    },

    /// Operation requires state that has not been computed yet.
    #[error("Not initialised: {0}")]
    NotInitialized(String),

    /// Matrix is singular to working precision.
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// External pricing engine failed to produce a value.
    #[error("Pricing engine failed: {0}")]
    PricingEngineFailed(String),

    /// A hard constraint is violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}
