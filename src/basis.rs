//! One-dimensional basis tables for tensor-product elements.
use crate::error::AssemblyError;
use crate::quadrature::{gauss, gauss_lobatto};
use crate::Real;
use nalgebra::DMatrix;

/// Interpolation and derivative tables of a 1D nodal basis evaluated at 1D quadrature points.
///
/// Both tables have shape `(Q1D, D1D)`: `b[(q, d)]` is the value of the `d`-th basis function
/// at the `q`-th quadrature point and `g[(q, d)]` its derivative. The tables only depend on the
/// polynomial degree and the quadrature rule, so a single instance is shared by all elements
/// of a batch and reused across assembly passes.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorBasis<T: Real> {
    b: DMatrix<T>,
    g: DMatrix<T>,
}

impl<T: Real> TensorBasis<T> {
    /// Lagrange basis with nodes at the Gauss-Lobatto points, evaluated at the Gauss points.
    ///
    /// `num_dofs_1d` is the number of nodes per dimension (polynomial degree + 1) and
    /// `num_quad_1d` the number of quadrature points per dimension.
    ///
    /// # Panics
    ///
    /// Panics if either count is zero.
    pub fn lobatto_nodal(num_dofs_1d: usize, num_quad_1d: usize) -> Self {
        let (_, nodes) = gauss_lobatto::<T>(num_dofs_1d);
        let (_, points) = gauss::<T>(num_quad_1d);
        Self::lagrange(&nodes, &points)
    }

    /// Lagrange basis with the given (distinct) nodes, evaluated at the given points.
    pub fn lagrange(nodes: &[T], points: &[T]) -> Self {
        let b = DMatrix::from_fn(points.len(), nodes.len(), |q, d| lagrange_value(nodes, d, points[q]));
        let g = DMatrix::from_fn(points.len(), nodes.len(), |q, d| lagrange_derivative(nodes, d, points[q]));
        Self { b, g }
    }

    /// Wraps precomputed tables.
    pub fn from_tables(b: DMatrix<T>, g: DMatrix<T>) -> Result<Self, AssemblyError> {
        if b.shape() != g.shape() {
            return Err(AssemblyError::DimensionMismatch {
                what: "basis derivative table",
                expected: b.len(),
                actual: g.len(),
            });
        }
        Ok(Self { b, g })
    }

    pub fn num_dofs_1d(&self) -> usize {
        self.b.ncols()
    }

    pub fn num_quad_1d(&self) -> usize {
        self.b.nrows()
    }

    /// The interpolation table `B`.
    pub fn b(&self) -> &DMatrix<T> {
        &self.b
    }

    /// The derivative table `G`.
    pub fn g(&self) -> &DMatrix<T> {
        &self.g
    }
}

fn lagrange_value<T: Real>(nodes: &[T], j: usize, x: T) -> T {
    let x_j = nodes[j];
    nodes
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != j)
        .fold(T::one(), |acc, (_, &x_k)| acc * (x - x_k) / (x_j - x_k))
}

fn lagrange_derivative<T: Real>(nodes: &[T], j: usize, x: T) -> T {
    let x_j = nodes[j];
    let mut result = T::zero();
    for (m, &x_m) in nodes.iter().enumerate() {
        if m == j {
            continue;
        }
        let mut term = T::one() / (x_j - x_m);
        for (k, &x_k) in nodes.iter().enumerate() {
            if k != j && k != m {
                term *= (x - x_k) / (x_j - x_k);
            }
        }
        result += term;
    }
    result
}
