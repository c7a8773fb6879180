//! TMOP shape metrics in two dimensions.
//!
//! A metric is a scalar energy density $\mu(\vec T)$ of the local distortion matrix
//! $\vec T = \vec J_{pt}$. Every metric in the catalog is a closed-form function of the
//! invariants provided by [`InvariantsEvaluator2D`], and its derivatives are assembled from
//! the invariant derivatives:
//!
//! | id  | $\mu(\vec T)$                                     |
//! |-----|---------------------------------------------------|
//! | 1   | $I_1 = \|\vec T\|^2$                              |
//! | 2   | $\frac{1}{2} I_{1b} - 1$                          |
//! | 7   | $I_1 (1 + I_2^{-1}) - 4$                          |
//! | 56  | $\frac{1}{2} (I_{2b} + I_{2b}^{-1}) - 1$          |
//! | 77  | $\frac{1}{2} (I_2 + I_2^{-1}) - 1$                |
//!
//! The set of metrics is open: a [`MetricRegistry`] maps identifiers to [`TmopMetric`]s, and
//! additional metrics can be registered at run time.
use crate::error::AssemblyError;
use crate::invariants::InvariantsEvaluator2D;
use crate::tensor::HessianBlock;
use crate::Real;
use log::trace;
use nalgebra::Matrix2;
use numeric_literals::replace_float_literals;
use rustc_hash::FxHashMap;
use std::fmt;

/// Energy density $\mu(\vec T)$.
pub type EnergyDensityFn<T> = fn(&Matrix2<T>) -> T;

/// First derivative $\pd{\mu}{T_{ij}}$, returned as a 2x2 matrix.
pub type FirstDerivativeFn<T> = fn(&Matrix2<T>) -> Matrix2<T>;

/// Weighted second derivative `H(r, c, i, j) = weight * ∂²μ / ∂T_ij ∂T_rc`.
pub type HessianFn<T> = fn(T, &Matrix2<T>) -> HessianBlock<T>;

/// A shape metric identified by an integer id.
#[derive(Copy, Clone)]
pub struct TmopMetric<T> {
    id: u32,
    name: &'static str,
    energy_density: EnergyDensityFn<T>,
    first_derivative: FirstDerivativeFn<T>,
    hessian: HessianFn<T>,
}

impl<T> fmt::Debug for TmopMetric<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmopMetric")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<T: Real> TmopMetric<T> {
    pub fn new(
        id: u32,
        name: &'static str,
        energy_density: EnergyDensityFn<T>,
        first_derivative: FirstDerivativeFn<T>,
        hessian: HessianFn<T>,
    ) -> Self {
        Self {
            id,
            name,
            energy_density,
            first_derivative,
            hessian,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn energy_density(&self, t: &Matrix2<T>) -> T {
        (self.energy_density)(t)
    }

    pub fn first_derivative(&self, t: &Matrix2<T>) -> Matrix2<T> {
        (self.first_derivative)(t)
    }

    /// Computes the weighted Hessian block of the metric at `t`.
    #[inline]
    pub fn hessian(&self, weight: T, t: &Matrix2<T>) -> HessianBlock<T> {
        (self.hessian)(weight, t)
    }

    /// $\mu = |\vec T|^2$.
    pub fn metric_001() -> Self {
        Self::new(1, "|T|^2", energy_001, first_derivative_001, hessian_001)
    }

    /// $\mu = \frac{1}{2} |\vec T|^2 / \tau - 1$.
    pub fn metric_002() -> Self {
        Self::new(2, "0.5 |T|^2 / tau - 1", energy_002, first_derivative_002, hessian_002)
    }

    /// $\mu = |\vec T - \vec T^{-t}|^2$.
    pub fn metric_007() -> Self {
        Self::new(7, "|T - T^-t|^2", energy_007, first_derivative_007, hessian_007)
    }

    /// $\mu = \frac{1}{2} (\sqrt{\tau} - 1 / \sqrt{\tau})^2$.
    pub fn metric_056() -> Self {
        Self::new(56, "0.5 (sqrt(tau) - 1/sqrt(tau))^2", energy_056, first_derivative_056, hessian_056)
    }

    /// $\mu = \frac{1}{2} (\tau - 1 / \tau)^2$.
    pub fn metric_077() -> Self {
        Self::new(77, "0.5 (tau - 1/tau)^2", energy_077, first_derivative_077, hessian_077)
    }
}

fn energy_001<T: Real>(t: &Matrix2<T>) -> T {
    InvariantsEvaluator2D::new(t).i1()
}

fn first_derivative_001<T: Real>(t: &Matrix2<T>) -> Matrix2<T> {
    InvariantsEvaluator2D::new(t).d_i1()
}

// weight * ddI1
fn hessian_001<T: Real>(weight: T, t: &Matrix2<T>) -> HessianBlock<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    HessianBlock::from_invariant_hessian(weight, &ie.dd_i1())
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn energy_002<T: Real>(t: &Matrix2<T>) -> T {
    0.5 * InvariantsEvaluator2D::new(t).i1b() - 1.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn first_derivative_002<T: Real>(t: &Matrix2<T>) -> Matrix2<T> {
    InvariantsEvaluator2D::new(t).d_i1b() * 0.5
}

// 0.5 * weight * ddI1b
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn hessian_002<T: Real>(weight: T, t: &Matrix2<T>) -> HessianBlock<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    HessianBlock::from_invariant_hessian(0.5 * weight, &ie.dd_i1b())
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn energy_007<T: Real>(t: &Matrix2<T>) -> T {
    let mut ie = InvariantsEvaluator2D::new(t);
    ie.i1() * (1.0 + 1.0 / ie.i2()) - 4.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn first_derivative_007<T: Real>(t: &Matrix2<T>) -> Matrix2<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    let i1 = ie.i1();
    let i2 = ie.i2();
    ie.d_i1() * (1.0 + 1.0 / i2) - ie.d_i2() * (i1 / (i2 * i2))
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn hessian_007<T: Real>(weight: T, t: &Matrix2<T>) -> HessianBlock<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    let i1 = ie.i1();
    let i2 = ie.i2();
    let d_i1 = ie.d_i1();
    let d_i2 = ie.d_i2();
    let dd_i1 = ie.dd_i1();
    let dd_i2 = ie.dd_i2();
    let c1 = 1.0 + 1.0 / i2;
    let c2 = 1.0 / (i2 * i2);
    let c3 = 2.0 * i1 / (i2 * i2 * i2);
    HessianBlock::from_fn(|r, c, i, j| {
        let h = c1 * dd_i1[i][j][(r, c)]
            - c2 * (d_i1[(i, j)] * d_i2[(r, c)] + d_i2[(i, j)] * d_i1[(r, c)])
            + c3 * d_i2[(i, j)] * d_i2[(r, c)]
            - i1 * c2 * dd_i2[i][j][(r, c)];
        weight * h
    })
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn energy_056<T: Real>(t: &Matrix2<T>) -> T {
    let tau = InvariantsEvaluator2D::new(t).i2b();
    0.5 * (tau + 1.0 / tau) - 1.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn first_derivative_056<T: Real>(t: &Matrix2<T>) -> Matrix2<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    let tau = ie.i2b();
    ie.d_i2b() * (0.5 * (1.0 - 1.0 / (tau * tau)))
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn hessian_056<T: Real>(weight: T, t: &Matrix2<T>) -> HessianBlock<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    let tau = ie.i2b();
    let d_tau = ie.d_i2b();
    let dd_tau = ie.dd_i2b();
    let c1 = 0.5 * (1.0 - 1.0 / (tau * tau));
    let c2 = 1.0 / (tau * tau * tau);
    HessianBlock::from_fn(|r, c, i, j| weight * (c1 * dd_tau[i][j][(r, c)] + c2 * d_tau[(i, j)] * d_tau[(r, c)]))
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn energy_077<T: Real>(t: &Matrix2<T>) -> T {
    let i2 = InvariantsEvaluator2D::new(t).i2();
    0.5 * (i2 + 1.0 / i2) - 1.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn first_derivative_077<T: Real>(t: &Matrix2<T>) -> Matrix2<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    let i2 = ie.i2();
    ie.d_i2() * (0.5 * (1.0 - 1.0 / (i2 * i2)))
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn hessian_077<T: Real>(weight: T, t: &Matrix2<T>) -> HessianBlock<T> {
    let mut ie = InvariantsEvaluator2D::new(t);
    let i2 = ie.i2();
    let d_i2 = ie.d_i2();
    let dd_i2 = ie.dd_i2();
    let c1 = 0.5 * (1.0 - 1.0 / (i2 * i2));
    let c2 = 1.0 / (i2 * i2 * i2);
    HessianBlock::from_fn(|r, c, i, j| weight * (c1 * dd_i2[i][j][(r, c)] + c2 * d_i2[(i, j)] * d_i2[(r, c)]))
}

/// Maps metric identifiers to metrics.
#[derive(Debug, Clone)]
pub struct MetricRegistry<T> {
    metrics: FxHashMap<u32, TmopMetric<T>>,
}

impl<T: Real> Default for MetricRegistry<T> {
    /// A registry containing the built-in metric catalog.
    fn default() -> Self {
        let mut registry = Self::empty();
        for metric in [
            TmopMetric::metric_001(),
            TmopMetric::metric_002(),
            TmopMetric::metric_007(),
            TmopMetric::metric_056(),
            TmopMetric::metric_077(),
        ] {
            registry.register(metric);
        }
        registry
    }
}

impl<T: Real> MetricRegistry<T> {
    pub fn empty() -> Self {
        Self {
            metrics: FxHashMap::default(),
        }
    }

    /// Registers a metric, returning the metric previously registered with the same id.
    pub fn register(&mut self, metric: TmopMetric<T>) -> Option<TmopMetric<T>> {
        trace!("Registering TMOP metric {} ({})", metric.id(), metric.name());
        self.metrics.insert(metric.id(), metric)
    }

    pub fn get(&self, id: u32) -> Result<&TmopMetric<T>, AssemblyError> {
        self.metrics
            .get(&id)
            .ok_or(AssemblyError::UnsupportedMetric(id))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.metrics.contains_key(&id)
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<_> = self.metrics.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
