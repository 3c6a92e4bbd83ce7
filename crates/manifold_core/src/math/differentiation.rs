//! Finite-difference stencils over arbitrary callables.
//!
//! All routines evaluate a user function on a mutable scratch point,
//! bumping one or two coordinates at a time, and restore the scratch
//! exactly before returning. The callable is borrowed only for the
//! duration of the call; nothing is retained.
//!
//! The caller owns the choice of step size `h`. For functions backed by an
//! interpolated grid, a step below the grid resolution collapses adjacent
//! stencil nodes onto the same grid cell and destroys second differences;
//! use the grid step there.

use num_traits::Float;

/// Forward-difference first partial, O(h).
///
/// `∂f/∂x_i ≈ (f(x + h·e_i) − f(x)) / h`
///
/// # Arguments
///
/// * `f` - Function under differentiation
/// * `x` - Scratch point; restored before return
/// * `dim` - Index of the coordinate to bump
/// * `h` - Step size
/// * `f_center` - Precomputed `f(x)`, passed in to avoid re-evaluation
pub fn partial_forward<T, F>(f: &mut F, x: &mut [T], dim: usize, h: T, f_center: T) -> T
where
    T: Float,
    F: FnMut(&[T]) -> T,
{
    let original = x[dim];

    x[dim] = original + h;
    let f_plus = f(x);

    x[dim] = original;

    (f_plus - f_center) / h
}

/// Central-difference first partial, O(h²). The default stencil.
///
/// `∂f/∂x_i ≈ (f(x + h·e_i) − f(x − h·e_i)) / (2h)`
pub fn partial_central<T, F>(f: &mut F, x: &mut [T], dim: usize, h: T) -> T
where
    T: Float,
    F: FnMut(&[T]) -> T,
{
    let original = x[dim];

    x[dim] = original + h;
    let f_plus = f(x);

    x[dim] = original - h;
    let f_minus = f(x);

    x[dim] = original;

    (f_plus - f_minus) / (T::from(2.0).unwrap() * h)
}

/// Five-point central first partial, O(h⁴).
///
/// `∂f/∂x_i ≈ (−f(x+2h) + 8f(x+h) − 8f(x−h) + f(x−2h)) / (12h)`
pub fn partial_five_point<T, F>(f: &mut F, x: &mut [T], dim: usize, h: T) -> T
where
    T: Float,
    F: FnMut(&[T]) -> T,
{
    let original = x[dim];
    let two = T::from(2.0).unwrap();
    let eight = T::from(8.0).unwrap();

    x[dim] = original + two * h;
    let f_p2 = f(x);

    x[dim] = original + h;
    let f_p1 = f(x);

    x[dim] = original - h;
    let f_m1 = f(x);

    x[dim] = original - two * h;
    let f_m2 = f(x);

    x[dim] = original;

    (-f_p2 + eight * f_p1 - eight * f_m1 + f_m2) / (T::from(12.0).unwrap() * h)
}

/// Three-point second partial along one axis.
///
/// `∂²f/∂x_i² ≈ (f(x+h) − 2f(x) + f(x−h)) / h²`
///
/// # Arguments
///
/// * `f_center` - Precomputed `f(x)`
pub fn second_partial_diagonal<T, F>(f: &mut F, x: &mut [T], dim: usize, h: T, f_center: T) -> T
where
    T: Float,
    F: FnMut(&[T]) -> T,
{
    let original = x[dim];

    x[dim] = original + h;
    let f_plus = f(x);

    x[dim] = original - h;
    let f_minus = f(x);

    x[dim] = original;

    (f_plus - T::from(2.0).unwrap() * f_center + f_minus) / (h * h)
}

/// Four-corner mixed second partial.
///
/// `∂²f/∂x_i∂x_j ≈ (f_{++} − f_{+−} − f_{−+} + f_{−−}) / (4·h_i·h_j)`
///
/// Steps may differ per axis; on grid-backed functions each should match
/// the corresponding grid resolution.
pub fn second_partial_mixed<T, F>(
    f: &mut F,
    x: &mut [T],
    dim_i: usize,
    dim_j: usize,
    h_i: T,
    h_j: T,
) -> T
where
    T: Float,
    F: FnMut(&[T]) -> T,
{
    let orig_i = x[dim_i];
    let orig_j = x[dim_j];

    x[dim_i] = orig_i + h_i;
    x[dim_j] = orig_j + h_j;
    let f_pp = f(x);

    x[dim_j] = orig_j - h_j;
    let f_pm = f(x);

    x[dim_i] = orig_i - h_i;
    let f_mm = f(x);

    x[dim_j] = orig_j + h_j;
    let f_mp = f(x);

    x[dim_i] = orig_i;
    x[dim_j] = orig_j;

    (f_pp - f_pm - f_mp + f_mm) / (T::from(4.0).unwrap() * h_i * h_j)
}
