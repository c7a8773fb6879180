//! Invariants of 2x2 matrices and their derivatives with respect to the matrix entries.
//!
//! Given a matrix $\vec J$, the evaluator provides
//! $$
//! I_1 = |\vec J|^2, \quad I_{2b} = \det \vec J, \quad I_2 = I_{2b}^2, \quad I_{1b} = \frac{I_1}{I_{2b}},
//! $$
//! together with their first derivatives $\pd{I}{J_{ij}}$ (returned as 2x2 matrices) and second
//! derivatives $\pd{^2 I}{J_{ij} \partial J_{rc}}$ (returned as [`InvariantHessian`]).
//!
//! The barred invariants are undefined for singular matrices. No attempt is made to detect
//! this: a (near-)singular input yields very large or non-finite values.
use crate::Real;
use nalgebra::Matrix2;
use numeric_literals::replace_float_literals;

/// Second derivatives of a scalar invariant of a 2x2 matrix.
///
/// Entry `h[i][j][(r, c)]` holds $\pd{^2 I}{J_{ij} \partial J_{rc}}$.
pub type InvariantHessian<T> = [[Matrix2<T>; 2]; 2];

/// Lazily evaluates invariants of a fixed 2x2 matrix.
///
/// Every quantity is computed on first request and cached, so a metric only pays for the
/// derivatives it actually uses. The evaluator holds no state besides the matrix and its
/// cache, and is cheap enough to create once per quadrature point.
#[derive(Debug, Clone)]
pub struct InvariantsEvaluator2D<T: Real> {
    j: Matrix2<T>,
    i1: Option<T>,
    i2b: Option<T>,
    d_i1: Option<Matrix2<T>>,
    d_i1b: Option<Matrix2<T>>,
    d_i2: Option<Matrix2<T>>,
    d_i2b: Option<Matrix2<T>>,
    dd_i1: Option<InvariantHessian<T>>,
    dd_i1b: Option<InvariantHessian<T>>,
    dd_i2: Option<InvariantHessian<T>>,
    dd_i2b: Option<InvariantHessian<T>>,
}

fn hessian_from_fn<T: Real>(mut f: impl FnMut(usize, usize, usize, usize) -> T) -> InvariantHessian<T> {
    let mut h = [[Matrix2::zeros(); 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            h[i][j] = Matrix2::from_fn(|r, c| f(i, j, r, c));
        }
    }
    h
}

/// The 2D permutation symbol.
fn epsilon<T: Real>(a: usize, b: usize) -> T {
    match (a, b) {
        (0, 1) => T::one(),
        (1, 0) => -T::one(),
        _ => T::zero(),
    }
}

fn delta<T: Real>(a: usize, b: usize) -> T {
    if a == b {
        T::one()
    } else {
        T::zero()
    }
}

impl<T: Real> InvariantsEvaluator2D<T> {
    pub fn new(j: &Matrix2<T>) -> Self {
        Self {
            j: *j,
            i1: None,
            i2b: None,
            d_i1: None,
            d_i1b: None,
            d_i2: None,
            d_i2b: None,
            dd_i1: None,
            dd_i1b: None,
            dd_i2: None,
            dd_i2b: None,
        }
    }

    pub fn matrix(&self) -> &Matrix2<T> {
        &self.j
    }

    /// $I_1 = |\vec J|^2$.
    pub fn i1(&mut self) -> T {
        let j = &self.j;
        *self.i1.get_or_insert_with(|| j.norm_squared())
    }

    /// $I_{2b} = \det \vec J$.
    pub fn i2b(&mut self) -> T {
        let j = &self.j;
        *self.i2b.get_or_insert_with(|| j[(0, 0)] * j[(1, 1)] - j[(0, 1)] * j[(1, 0)])
    }

    /// $I_2 = (\det \vec J)^2$.
    pub fn i2(&mut self) -> T {
        let det = self.i2b();
        det * det
    }

    /// $I_{1b} = I_1 / \det \vec J$.
    pub fn i1b(&mut self) -> T {
        self.i1() / self.i2b()
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn d_i1(&mut self) -> Matrix2<T> {
        let j = &self.j;
        *self.d_i1.get_or_insert_with(|| j * 2.0)
    }

    /// The cofactor matrix of $\vec J$, i.e. the derivative of the determinant.
    pub fn d_i2b(&mut self) -> Matrix2<T> {
        let j = &self.j;
        *self
            .d_i2b
            .get_or_insert_with(|| Matrix2::new(j[(1, 1)], -j[(1, 0)], -j[(0, 1)], j[(0, 0)]))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn d_i2(&mut self) -> Matrix2<T> {
        if let Some(d_i2) = self.d_i2 {
            return d_i2;
        }
        let d_i2 = self.d_i2b() * (2.0 * self.i2b());
        self.d_i2 = Some(d_i2);
        d_i2
    }

    pub fn d_i1b(&mut self) -> Matrix2<T> {
        if let Some(d_i1b) = self.d_i1b {
            return d_i1b;
        }
        let det = self.i2b();
        let i1b = self.i1b();
        let d_i1b = (self.d_i1() - self.d_i2b() * i1b) / det;
        self.d_i1b = Some(d_i1b);
        d_i1b
    }

    /// $\pd{^2 I_1}{J_{ij} \partial J_{rc}} = 2 \delta_{ir} \delta_{jc}$.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn dd_i1(&mut self) -> InvariantHessian<T> {
        *self
            .dd_i1
            .get_or_insert_with(|| hessian_from_fn(|i, j, r, c| 2.0 * delta(i, r) * delta(j, c)))
    }

    /// $\pd{^2 I_{2b}}{J_{ij} \partial J_{rc}} = \epsilon_{ir} \epsilon_{jc}$.
    pub fn dd_i2b(&mut self) -> InvariantHessian<T> {
        *self
            .dd_i2b
            .get_or_insert_with(|| hessian_from_fn(|i, j, r, c| epsilon::<T>(i, r) * epsilon(j, c)))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn dd_i2(&mut self) -> InvariantHessian<T> {
        if let Some(dd_i2) = self.dd_i2 {
            return dd_i2;
        }
        let det = self.i2b();
        let d_det = self.d_i2b();
        let dd_det = self.dd_i2b();
        let dd_i2 = hessian_from_fn(|i, j, r, c| 2.0 * d_det[(i, j)] * d_det[(r, c)] + 2.0 * det * dd_det[i][j][(r, c)]);
        self.dd_i2 = Some(dd_i2);
        dd_i2
    }

    pub fn dd_i1b(&mut self) -> InvariantHessian<T> {
        if let Some(dd_i1b) = self.dd_i1b {
            return dd_i1b;
        }
        let det = self.i2b();
        let i1b = self.i1b();
        let d_det = self.d_i2b();
        let d_i1b = self.d_i1b();
        let dd_i1 = self.dd_i1();
        let dd_det = self.dd_i2b();
        let dd_i1b = hessian_from_fn(|i, j, r, c| {
            (dd_i1[i][j][(r, c)]
                - i1b * dd_det[i][j][(r, c)]
                - d_i1b[(i, j)] * d_det[(r, c)]
                - d_i1b[(r, c)] * d_det[(i, j)])
                / det
        });
        self.dd_i1b = Some(dd_i1b);
        dd_i1b
    }
}
