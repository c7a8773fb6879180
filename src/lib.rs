//! Partially assembled gradient kernels for the Target-Matrix Optimization Paradigm (TMOP).
//!
//! The crate computes, for every element and every quadrature point of a batch of
//! tensor-product quadrilateral elements, the second derivative of a TMOP shape metric
//! $\mu(\vec T)$ with respect to the entries of the local distortion matrix
//! $\vec T = \vec J_{pr} \vec J_{tr}^{-1}$. The resulting 4-index blocks are stored in a dense
//! [`HessianTensor`](tensor::HessianTensor) which a matrix-free gradient action later contracts.
//!
//! The main entry points are
//!
//! - [`TmopGradientAssembler`](assembler::TmopGradientAssembler), which owns all
//!   per-mesh data and the output storage,
//! - [`setup_gradient_2d`](dispatch::setup_gradient_2d), which dispatches a single
//!   assembly pass to a specialized or generic kernel.
use nalgebra::RealField;

pub mod assembler;
pub mod basis;
pub mod convergence;
pub mod dispatch;
pub mod error;
pub mod invariants;
pub mod kernel;
pub mod metrics;
pub mod procedural;
pub mod quadrature;
pub mod tensor;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;

/// Scalar types usable by the kernels.
///
/// Elements are processed on the rayon thread pool, hence the `Send + Sync` bounds.
pub trait Real: RealField + Copy + Send + Sync {}

impl<T: RealField + Copy + Send + Sync> Real for T {}

/// Spatial dimension of the kernels in this crate.
pub const DIM: usize = 2;

/// Largest number of nodes per dimension the generic kernel can hold in its tiles.
pub const MAX_D1D: usize = 8;

/// Largest number of quadrature points per dimension the generic kernel can hold in its tiles.
pub const MAX_Q1D: usize = 8;
