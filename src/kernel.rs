//! Tensor-product kernel for the partially assembled TMOP gradient in two dimensions.
//!
//! For every element the kernel
//!
//! 1. stages the element's nodal coordinates and the 1D basis tables into fixed-size tiles,
//! 2. computes the reference gradient $\vec J_{pr}$ at all quadrature points by two separable
//!    contractions (first along $\xi_x$, then along $\xi_y$), which costs
//!    $O(D_{1D} Q_{1D}^2)$ per element instead of $O(D_{1D}^2 Q_{1D}^2)$,
//! 3. forms $\vec J_{pt} = \vec J_{pr} \vec J_{tr}^{-1}$ and the integration weight
//!    $w = \nu \\, W(q_x, q_y) \det \vec J_{tr}$ at each quadrature point and writes the
//!    weighted metric Hessian into the output.
//!
//! The second contraction reads every entry written by the first, so the two passes run to
//! completion one after the other. Once the tiles are complete, quadrature points are
//! independent. Elements only share read-only data and write to disjoint parts of the output,
//! so they are processed in parallel without synchronization.
use crate::basis::TensorBasis;
use crate::metrics::TmopMetric;
use crate::tensor::{TargetJacobians, HESSIAN_BLOCK_SIZE};
use crate::{Real, DIM};
use nalgebra::{DMatrix, Matrix2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether elements are processed on the calling thread or on the rayon thread pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionPolicy {
    Serial,
    #[default]
    Parallel,
}

/// Read-only input of a gradient assembly pass.
#[derive(Debug, Copy, Clone)]
pub struct GradientKernelInput<'a, T: Real> {
    /// Nodal coordinates with shape `(D1D, D1D, DIM, NE)`.
    pub x: &'a [T],
    pub basis: &'a TensorBasis<T>,
    /// Quadrature weights `W[(qx, qy)]`.
    pub weights: &'a DMatrix<T>,
    pub target_jacobians: &'a TargetJacobians<T>,
    pub metric: &'a TmopMetric<T>,
    /// Global normalization constant $\nu$ of the metric.
    pub metric_normal: T,
    pub num_elements: usize,
}

/// Per-element scratch storage.
///
/// `MD1` and `MQ1` bound the number of nodes and quadrature points per dimension. They are the
/// exact sizes for specialized kernels and the maximum supported sizes for the generic kernel.
struct ElementTiles<T, const MD1: usize, const MQ1: usize> {
    // x[component][dy][dx]
    x: [[[T; MD1]; MD1]; DIM],
    // b[q][d], g[q][d]
    b: [[T; MD1]; MQ1],
    g: [[T; MD1]; MQ1],
    // Partial contractions along x: dq[k][dy][qx] for
    // k = (X0 G, X0 B, X1 G, X1 B)
    dq: [[[T; MQ1]; MD1]; 4],
    // Reference derivatives: qq[k][qy][qx] for
    // k = (dX0/dx, dX0/dy, dX1/dx, dX1/dy)
    qq: [[[T; MQ1]; MQ1]; 4],
}

impl<T: Real, const MD1: usize, const MQ1: usize> ElementTiles<T, MD1, MQ1> {
    fn new() -> Self {
        Self {
            x: [[[T::zero(); MD1]; MD1]; DIM],
            b: [[T::zero(); MD1]; MQ1],
            g: [[T::zero(); MD1]; MQ1],
            dq: [[[T::zero(); MQ1]; MD1]; 4],
            qq: [[[T::zero(); MQ1]; MQ1]; 4],
        }
    }

    /// Copies the element's nodal coordinates into the tiles. `x_element` has shape
    /// `(D1D, D1D, DIM)`.
    fn load_x(&mut self, x_element: &[T], d1d: usize) {
        for comp in 0..DIM {
            for dy in 0..d1d {
                for dx in 0..d1d {
                    self.x[comp][dy][dx] = x_element[dx + d1d * (dy + d1d * comp)];
                }
            }
        }
    }

    fn load_bg(&mut self, basis: &TensorBasis<T>, d1d: usize, q1d: usize) {
        let (b, g) = (basis.b(), basis.g());
        for q in 0..q1d {
            for d in 0..d1d {
                self.b[q][d] = b[(q, d)];
                self.g[q][d] = g[(q, d)];
            }
        }
    }

    /// Contracts the nodal values along the x-direction.
    fn grad_x(&mut self, d1d: usize, q1d: usize) {
        for dy in 0..d1d {
            for qx in 0..q1d {
                let mut u = [T::zero(); 4];
                for dx in 0..d1d {
                    let x0 = self.x[0][dy][dx];
                    let x1 = self.x[1][dy][dx];
                    let b = self.b[qx][dx];
                    let g = self.g[qx][dx];
                    u[0] += x0 * g;
                    u[1] += x0 * b;
                    u[2] += x1 * g;
                    u[3] += x1 * b;
                }
                for k in 0..4 {
                    self.dq[k][dy][qx] = u[k];
                }
            }
        }
    }

    /// Contracts the partial results along the y-direction. Requires `grad_x` to have completed.
    fn grad_y(&mut self, d1d: usize, q1d: usize) {
        for qy in 0..q1d {
            for qx in 0..q1d {
                let mut u = [T::zero(); 4];
                for dy in 0..d1d {
                    let b = self.b[qy][dy];
                    let g = self.g[qy][dy];
                    u[0] += self.dq[0][dy][qx] * b;
                    u[1] += self.dq[1][dy][qx] * g;
                    u[2] += self.dq[2][dy][qx] * b;
                    u[3] += self.dq[3][dy][qx] * g;
                }
                for k in 0..4 {
                    self.qq[k][qy][qx] = u[k];
                }
            }
        }
    }

    /// Returns $\vec J_{pr}$ with entries $\pd{X_r}{\xi_c}$ at the given quadrature point.
    fn pull_grad_xy(&self, qx: usize, qy: usize) -> Matrix2<T> {
        Matrix2::new(
            self.qq[0][qy][qx],
            self.qq[1][qy][qx],
            self.qq[2][qy][qx],
            self.qq[3][qy][qx],
        )
    }

    /// Runs the staging and both contraction passes for a single element.
    fn prepare(&mut self, x_element: &[T], basis: &TensorBasis<T>, d1d: usize, q1d: usize) {
        assert!(d1d <= MD1 && q1d <= MQ1, "Element tiles are too small for the problem size");
        self.load_x(x_element, d1d);
        self.load_bg(basis, d1d, q1d);
        self.grad_x(d1d, q1d);
        self.grad_y(d1d, q1d);
    }
}

/// Inverse of a 2x2 matrix through its adjugate.
///
/// Singular input is not detected; it produces non-finite entries.
fn calc_inverse<T: Real>(m: &Matrix2<T>) -> Matrix2<T> {
    let det = m.determinant();
    Matrix2::new(m[(1, 1)], -m[(0, 1)], -m[(1, 0)], m[(0, 0)]) / det
}

/// Returns the `(D1D, D1D, DIM)` nodal coordinates of element `e`.
fn element_x<T>(x: &[T], d1d: usize, e: usize) -> &[T] {
    let len = d1d * d1d * DIM;
    &x[e * len..(e + 1) * len]
}

fn setup_element<T: Real, const MD1: usize, const MQ1: usize>(
    input: &GradientKernelInput<T>,
    e: usize,
    d1d: usize,
    q1d: usize,
    h_element: &mut [T],
) {
    let mut tiles = ElementTiles::<T, MD1, MQ1>::new();
    tiles.prepare(element_x(input.x, d1d, e), input.basis, d1d, q1d);

    for qy in 0..q1d {
        for qx in 0..q1d {
            let jtr = input.target_jacobians.get(qx, qy, e);
            let det_jtr = jtr.determinant();
            let weight = input.metric_normal * input.weights[(qx, qy)] * det_jtr;

            let jrt = calc_inverse(&jtr);
            let jpr = tiles.pull_grad_xy(qx, qy);
            let jpt = jpr * jrt;

            let block = input.metric.hessian(weight, &jpt);
            let offset = HESSIAN_BLOCK_SIZE * (qx + q1d * qy);
            h_element[offset..offset + HESSIAN_BLOCK_SIZE].copy_from_slice(block.as_slice());
        }
    }
}

/// Assembles the weighted metric Hessian at every quadrature point of every element into `h`.
///
/// Non-zero `T_D1D` and `T_Q1D` fix the problem size at compile time and the run-time sizes
/// `d1d` and `q1d` are ignored. Otherwise the run-time sizes are used and must fit in the
/// tiles of size `MD1` and `MQ1`. `h` must have the shape `(DIM, DIM, DIM, DIM, Q1D, Q1D, NE)`
/// and is completely overwritten.
///
/// Input sizes are expected to have been validated by the caller, see
/// [`setup_gradient_2d`](crate::dispatch::setup_gradient_2d).
///
/// # Panics
///
/// Panics if the sizes exceed the tiles or the input slices are too short.
pub fn setup_gradient_kernel_2d<T, const T_D1D: usize, const T_Q1D: usize, const MD1: usize, const MQ1: usize>(
    input: &GradientKernelInput<T>,
    d1d: usize,
    q1d: usize,
    policy: ExecutionPolicy,
    h: &mut [T],
) where
    T: Real,
{
    let d1d = if T_D1D != 0 { T_D1D } else { d1d };
    let q1d = if T_Q1D != 0 { T_Q1D } else { q1d };
    assert!(d1d <= MD1 && q1d <= MQ1, "Max size error!");

    let element_len = HESSIAN_BLOCK_SIZE * q1d * q1d;
    if element_len == 0 || input.num_elements == 0 {
        return;
    }
    assert_eq!(h.len(), element_len * input.num_elements);

    let process_element =
        |(e, h_element): (usize, &mut [T])| setup_element::<T, MD1, MQ1>(input, e, d1d, q1d, h_element);

    match policy {
        ExecutionPolicy::Serial => h
            .chunks_exact_mut(element_len)
            .enumerate()
            .for_each(process_element),
        ExecutionPolicy::Parallel => h
            .par_chunks_exact_mut(element_len)
            .enumerate()
            .for_each(process_element),
    }
}

/// Computes the local distortion matrices $\vec J_{pt} = \vec J_{pr} \vec J_{tr}^{-1}$ of a
/// single element, ordered with `qx` fastest.
///
/// This runs the same staging and contraction passes as the gradient kernel, and is mainly
/// useful for inspecting the geometry the metric sees.
///
/// # Panics
///
/// Panics if the basis sizes exceed [`MAX_D1D`](crate::MAX_D1D) or
/// [`MAX_Q1D`](crate::MAX_Q1D), or if the element index is out of bounds.
pub fn compute_distortion_matrices<T: Real>(input: &GradientKernelInput<T>, e: usize) -> Vec<Matrix2<T>> {
    let d1d = input.basis.num_dofs_1d();
    let q1d = input.basis.num_quad_1d();
    assert!(e < input.num_elements, "Element index out of bounds");

    let mut tiles = ElementTiles::<T, { crate::MAX_D1D }, { crate::MAX_Q1D }>::new();
    tiles.prepare(element_x(input.x, d1d, e), input.basis, d1d, q1d);

    let mut result = Vec::with_capacity(q1d * q1d);
    for qy in 0..q1d {
        for qx in 0..q1d {
            let jrt = calc_inverse(&input.target_jacobians.get(qx, qy, e));
            result.push(tiles.pull_grad_xy(qx, qy) * jrt);
        }
    }
    result
}
