//! Grid-refinement behaviour of the differential operators.

use approx::assert_relative_eq;
use manifold_core::types::{Dimension, DimensionKind};
use manifold_geometry::{Hessian, Jacobian, StateSpace};

fn sampled_space<F>(nodes: usize, f: F) -> StateSpace
where
    F: FnMut(&[f64]) -> f64,
{
    let mut space = StateSpace::new();
    space
        .add_dimension(Dimension::new(DimensionKind::Custom, "x", -1.0, 1.0, nodes).unwrap())
        .unwrap();
    space
        .add_dimension(Dimension::new(DimensionKind::Custom, "y", -1.0, 1.0, nodes).unwrap())
        .unwrap();
    let mut f = f;
    space.map_prices(|c| f(c)).unwrap();
    space
}

#[test]
fn hessian_of_quadratic_form_recovers_2a_at_interior_nodes() {
    // f = xᵀAx with A = [[2, 1], [1, 3]] has Hessian 2A at every point.
    let f = |c: &[f64]| 2.0 * c[0] * c[0] + 2.0 * c[0] * c[1] + 3.0 * c[1] * c[1];

    for nodes in [11, 21, 41] {
        let space = sampled_space(nodes, f);
        let mut hess = Hessian::new(2).unwrap();
        // (0.2, -0.4) is a grid node at every tested resolution.
        hess.compute(&space, &[0.2, -0.4]).unwrap();

        assert_relative_eq!(hess.get(0, 0), 4.0, epsilon = 1e-8);
        assert_relative_eq!(hess.get(0, 1), 2.0, epsilon = 1e-8);
        assert_relative_eq!(hess.get(1, 1), 6.0, epsilon = 1e-8);
    }
}

#[test]
fn hessian_error_on_quartic_shrinks_quadratically_with_step() {
    // d²/dx² of x⁴ via the three-point stencil carries an exact 2h² error
    // term, so each halving of the step divides the error by four.
    let f = |c: &[f64]| c[0].powi(4);
    let exact = 12.0 * 0.6_f64 * 0.6; // at x = 0.6

    let mut errors = Vec::new();
    for nodes in [11, 21, 41] {
        let space = sampled_space(nodes, f);
        let mut hess = Hessian::new(2).unwrap();
        hess.compute(&space, &[0.6, 0.0]).unwrap();
        errors.push((hess.get(0, 0) - exact).abs());
    }

    assert!(errors[0] > errors[1] && errors[1] > errors[2]);
    let ratio_coarse = errors[0] / errors[1];
    let ratio_fine = errors[1] / errors[2];
    assert_relative_eq!(ratio_coarse, 4.0, epsilon = 0.5);
    assert_relative_eq!(ratio_fine, 4.0, epsilon = 0.5);
}

#[test]
fn jacobian_of_linear_function_is_exact_everywhere() {
    let f = |c: &[f64]| 3.0 * c[0] - 7.0 * c[1] + 2.0;
    let space = sampled_space(21, f);
    let mut jac = Jacobian::new(2).unwrap();

    for point in [[0.0, 0.0], [0.33, -0.48], [0.95, 0.95]] {
        jac.compute(&space, &point).unwrap();
        assert_relative_eq!(jac.get(0), 3.0, epsilon = 1e-9);
        assert_relative_eq!(jac.get(1), -7.0, epsilon = 1e-9);
    }
}

#[test]
fn linear_function_has_negligible_frobenius_norm() {
    let f = |c: &[f64]| 5.0 * c[0] + 4.0 * c[1];
    for nodes in [11, 41] {
        let space = sampled_space(nodes, f);
        let mut hess = Hessian::new(2).unwrap();
        hess.compute(&space, &[0.0, 0.0]).unwrap();
        assert!(hess.frobenius_norm() < 1e-8);
    }
}
