//! Differentiation configuration types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for numerical differentiation.
///
/// The bump is a relative perturbation: grid-backed gradient computation
/// scales it by each dimension's span, while direct (callable-backed)
/// computation uses it as the absolute step when the caller supplies none.
/// Grid-backed curvature computation prefers the grid step itself and only
/// falls back to the bump when a dimension reports no usable step.
///
/// # Example
///
/// ```
/// use manifold_geometry::DiffConfig;
///
/// let config = DiffConfig::default();
/// assert!((config.bump - 1e-4).abs() < 1e-12);
///
/// let coarse = DiffConfig::new(1e-2);
/// assert!(coarse.bump > config.bump);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiffConfig {
    /// Relative bump size for finite differences.
    ///
    /// Defaults to 1e-4 (one basis point of the dimension span).
    pub bump: f64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self { bump: 1e-4 }
    }
}

impl DiffConfig {
    /// Create a configuration with an explicit bump size.
    ///
    /// # Panics
    ///
    /// Panics if `bump <= 0`.
    pub fn new(bump: f64) -> Self {
        assert!(bump > 0.0, "bump must be positive");
        Self { bump }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bump() {
        let config = DiffConfig::default();
        assert!((config.bump - 1e-4).abs() < 1e-15);
    }

    #[test]
    fn test_new_bump() {
        let config = DiffConfig::new(1e-3);
        assert!((config.bump - 1e-3).abs() < 1e-15);
    }

    #[test]
    #[should_panic(expected = "bump must be positive")]
    fn test_new_zero_bump_panics() {
        let _ = DiffConfig::new(0.0);
    }

    #[test]
    #[should_panic(expected = "bump must be positive")]
    fn test_new_negative_bump_panics() {
        let _ = DiffConfig::new(-1e-4);
    }

    #[test]
    fn test_copy_semantics() {
        let a = DiffConfig::new(2e-4);
        let b = a;
        assert_eq!(a, b);
    }
}
