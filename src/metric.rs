//! The Minkowski-p distance family and its matching half-space pruning test.
//!
//! `distance` is the `p`-norm of the difference vector, and
//! `intersects_search_space` is a conservative over-approximation of "does
//! the ball of radius `r` around `center` intersect `box_`" computed without
//! taking a root, by summing the `p`-th power of the per-axis shortfall and
//! comparing against `r^p`.

use num_traits::Float;

use crate::hyperbox::Hyperbox;
use crate::point::Point;

/// A compile-time-parameterized distance metric over `Point<T, N>`.
///
/// `distance` and `intersects_search_space` together bound the adaptive
/// radius search in [`crate::classifier::Classifier::predict`]:
/// `intersects_search_space` MUST NOT produce false negatives (it may only
/// over-approximate), or neighbors would be silently dropped.
pub trait Metric<T, const N: usize> {
    /// The Minkowski exponent `p >= 1` this metric implements.
    const P: i32;

    /// The L_p distance between `a` and `b`.
    fn distance(a: &Point<T, N>, b: &Point<T, N>) -> f64;

    /// Returns true iff the closed ball of radius `r` around `center` could
    /// intersect `box_`. Must never return false when the true distance
    /// from `center` to the nearest point in `box_` is `<= r`.
    fn intersects_search_space(box_: &Hyperbox<T, N>, center: &Point<T, N>, r: f64) -> bool;
}

/// A generic Minkowski-`P` metric, used directly for `P >= 3` and as the
/// shared implementation backing [`Manhattan`] and [`Euclidean`].
pub struct Minkowski<const P: i32>;

fn const_abs_pow(x: f64, p: i32) -> f64 {
    match p {
        1 => x.abs(),
        2 => x * x,
        3 => (x * x * x).abs(),
        4 => (x * x) * (x * x),
        _ => x.abs().powi(p),
    }
}

fn const_root(x: f64, p: i32) -> f64 {
    match p {
        1 => x,
        2 => x.sqrt(),
        3 => x.cbrt(),
        4 => x.sqrt().sqrt(),
        _ => x.powf(1.0 / f64::from(p)),
    }
}

impl<const P: i32, T: Float, const N: usize> Metric<T, N> for Minkowski<P> {
    const P: i32 = P;

    fn distance(a: &Point<T, N>, b: &Point<T, N>) -> f64 {
        minkowski_distance::<T, N>(a, b, P)
    }

    fn intersects_search_space(box_: &Hyperbox<T, N>, center: &Point<T, N>, r: f64) -> bool {
        minkowski_intersects::<T, N>(box_, center, r, P)
    }
}

fn minkowski_distance<T: Float, const N: usize>(a: &Point<T, N>, b: &Point<T, N>, p: i32) -> f64 {
    let mut sum = 0.0;
    for i in 0..N {
        let d = (a[i] - b[i]).to_f64().unwrap_or(0.0);
        sum += const_abs_pow(d, p);
    }
    const_root(sum, p)
}

fn minkowski_intersects<T: Float, const N: usize>(box_: &Hyperbox<T, N>, center: &Point<T, N>, r: f64, p: i32) -> bool {
    let mut budget = const_abs_pow(r, p);
    for i in 0..N {
        let c = center[i].to_f64().unwrap_or(0.0);
        let lo = box_.lo()[i].to_f64().unwrap_or(0.0);
        let hi = box_.hi()[i].to_f64().unwrap_or(0.0);
        if c < lo {
            budget -= const_abs_pow(c - lo, p);
        } else if c > hi {
            budget -= const_abs_pow(c - hi, p);
        }
    }
    budget >= 0.0
}

/// Manhattan (L1) distance: `p = 1`.
pub struct Manhattan;

impl<T: Float, const N: usize> Metric<T, N> for Manhattan {
    const P: i32 = 1;

    fn distance(a: &Point<T, N>, b: &Point<T, N>) -> f64 {
        minkowski_distance::<T, N>(a, b, 1)
    }

    fn intersects_search_space(box_: &Hyperbox<T, N>, center: &Point<T, N>, r: f64) -> bool {
        minkowski_intersects::<T, N>(box_, center, r, 1)
    }
}

/// Euclidean (L2) distance: `p = 2`.
pub struct Euclidean;

impl<T: Float, const N: usize> Metric<T, N> for Euclidean {
    const P: i32 = 2;

    fn distance(a: &Point<T, N>, b: &Point<T, N>) -> f64 {
        minkowski_distance::<T, N>(a, b, 2)
    }

    fn intersects_search_space(box_: &Hyperbox<T, N>, center: &Point<T, N>, r: f64) -> bool {
        minkowski_intersects::<T, N>(box_, center, r, 2)
    }
}
