//! One-dimensional quadrature and nodal point sets on the reference interval `[0, 1]`.
//!
//! Tensor-product elements are built from these 1D rules: the kernels only ever see the
//! 1D points through the [basis tables](crate::basis::TensorBasis) and the 2D weights
//! through [`quadrilateral_gauss_weights`].
use crate::Real;
use nalgebra::DMatrix;
use std::f64::consts::PI;

/// A 1D rule given as `(weights, points)`.
pub type Rule1d<T> = (Vec<T>, Vec<T>);

/// Values of the Legendre polynomials $P_n$ and $P_{n-1}$ at a point.
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        for m in 1..=n {
            let m = m as f64;
            let p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }
        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    /// Derivative of $P_n$. Only valid in the open interval (-1, 1).
    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = *self;
        let n = n as f64;
        n * (x * p1 - p2) / (x * x - 1.0)
    }

    /// Second derivative of $P_n$, from the Legendre differential equation
    /// $(1 - x^2) P_n'' = 2 x P_n' - n (n + 1) P_n$. Only valid in (-1, 1).
    fn second_derivative(&self) -> f64 {
        let n = self.n as f64;
        let x = self.x;
        (2.0 * x * self.derivative() - n * (n + 1.0) * self.value()) / (1.0 - x * x)
    }
}

fn newton_refine(mut x: f64, mut step: impl FnMut(f64) -> f64) -> f64 {
    // Converges in a handful of iterations from the initial guesses used below; the cap
    // only guards against oscillation in the last bit.
    for _ in 0..100 {
        let dx = step(x);
        x += dx;
        if dx.abs() <= 1e-15 {
            break;
        }
    }
    x
}

fn to_unit_interval<T: Real>(weights: Vec<f64>, points: Vec<f64>) -> Rule1d<T> {
    let mut pairs: Vec<_> = weights.into_iter().zip(points).collect();
    pairs.sort_by(|(_, a), (_, b)| a.total_cmp(b));
    let convert = |v: f64| T::from_f64(v).expect("Value must fit in T");
    let weights = pairs.iter().map(|&(w, _)| convert(0.5 * w)).collect();
    let points = pairs.iter().map(|&(_, x)| convert(0.5 * (x + 1.0))).collect();
    (weights, points)
}

/// Gauss-Legendre quadrature on `[0, 1]` with points in ascending order.
///
/// With `n` points the rule integrates polynomials of degree up to `2 n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss<T: Real>(num_points: usize) -> Rule1d<T> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    // Roots are symmetric about the origin, so only the first half has to be found
    let m = (n + 1) / 2;
    for i in 0..m {
        let guess = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let x = newton_refine(guess, |x| {
            let p = LegendreRecurrence::evaluate(n, x);
            -p.value() / p.derivative()
        });
        let dp = LegendreRecurrence::evaluate(n, x).derivative();
        points.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    for i in m..n {
        let mirror_idx = n - i - 1;
        points.push(-points[mirror_idx]);
        weights.push(weights[mirror_idx]);
    }

    to_unit_interval(weights, points)
}

/// Gauss-Lobatto rule on `[0, 1]` with points in ascending order.
///
/// For `n >= 2` the points include both end points of the interval, which makes them the
/// natural node set for nodal Lagrange bases. A single point degenerates to the midpoint.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss_lobatto<T: Real>(num_points: usize) -> Rule1d<T> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    if n == 1 {
        return to_unit_interval(vec![2.0], vec![0.0]);
    }

    // Interior points are the roots of P'_{n-1}
    let p = n - 1;
    let endpoint_weight = 2.0 / (n as f64 * p as f64);
    let mut points = vec![-1.0, 1.0];
    let mut weights = vec![endpoint_weight, endpoint_weight];

    for i in 1..p {
        let guess = -(PI * i as f64 / p as f64).cos();
        let x = newton_refine(guess, |x| {
            let legendre = LegendreRecurrence::evaluate(p, x);
            -legendre.derivative() / legendre.second_derivative()
        });
        let p_x = LegendreRecurrence::evaluate(p, x).value();
        points.push(x);
        weights.push(endpoint_weight / (p_x * p_x));
    }

    to_unit_interval(weights, points)
}

/// Tensor-product Gauss weights $W(q_x, q_y) = w_{q_x} w_{q_y}$ for the reference square.
///
/// The returned matrix is indexed as `W[(qx, qy)]`.
pub fn quadrilateral_gauss_weights<T: Real>(num_points_per_dim: usize) -> DMatrix<T> {
    let (weights, _) = gauss::<T>(num_points_per_dim);
    DMatrix::from_fn(num_points_per_dim, num_points_per_dim, |qx, qy| {
        weights[qx] * weights[qy]
    })
}
