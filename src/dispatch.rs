//! Selection of kernel instantiations by problem size.
//!
//! Kernels with compile-time problem sizes let the compiler unroll the contraction loops and
//! size the element tiles exactly. A [`KernelRegistry`] holds such instantiations keyed by
//! `(d1d << 4) | q1d`. Sizes without a registered instantiation run through the generic
//! kernel, whose tiles are bounded by [`MAX_D1D`] and [`MAX_Q1D`].
use crate::error::AssemblyError;
use crate::kernel::{setup_gradient_kernel_2d, ExecutionPolicy, GradientKernelInput};
use crate::tensor::{HessianTensor, JACOBIAN_SIZE};
use crate::{Real, DIM, MAX_D1D, MAX_Q1D};
use log::{debug, trace};
use rustc_hash::FxHashMap;
use std::fmt;

/// A kernel instantiation, called as `kernel(input, d1d, q1d, policy, h)`.
pub type KernelFn<T> = fn(&GradientKernelInput<T>, usize, usize, ExecutionPolicy, &mut [T]);

/// Packs the problem sizes into a registry key.
///
/// Returns `None` if either size does not fit into the 4 bits reserved for it.
pub fn kernel_key(d1d: usize, q1d: usize) -> Option<u32> {
    (d1d < 16 && q1d < 16).then(|| ((d1d as u32) << 4) | q1d as u32)
}

/// Registers compile-time specialized kernels for a list of `(D1D, Q1D)` pairs.
macro_rules! register_specializations {
    ($registry:expr; $(($d1d:literal, $q1d:literal)),* $(,)?) => {
        $( $registry.register::<$d1d, $q1d>(); )*
    };
}

/// Specialized gradient kernels keyed by problem size.
#[derive(Clone)]
pub struct KernelRegistry<T: Real> {
    kernels: FxHashMap<u32, KernelFn<T>>,
}

impl<T: Real> fmt::Debug for KernelRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.kernels.keys().map(|key| (key >> 4, key & 0xF)).collect();
        keys.sort_unstable();
        f.debug_struct("KernelRegistry")
            .field("specializations", &keys)
            .finish()
    }
}

impl<T: Real> Default for KernelRegistry<T> {
    /// A registry with specializations for the common low-order configurations.
    fn default() -> Self {
        let mut registry = Self::new();
        register_specializations!(registry;
            (2, 2), (2, 3), (2, 4), (2, 5), (2, 6),
            (3, 3), (3, 4), (3, 5), (3, 6),
            (4, 4), (4, 5), (4, 6),
            (5, 5), (5, 6));
        registry
    }
}

impl<T: Real> KernelRegistry<T> {
    /// An empty registry. Every problem size runs through the generic kernel.
    pub fn new() -> Self {
        Self {
            kernels: FxHashMap::default(),
        }
    }

    /// Registers the kernel specialized for `D1D` nodes and `Q1D` quadrature points per
    /// dimension.
    ///
    /// # Panics
    ///
    /// Panics if either size is zero or does not fit into a [`kernel_key`].
    pub fn register<const D1D: usize, const Q1D: usize>(&mut self) {
        assert!(D1D > 0 && Q1D > 0, "Specialized sizes must be positive");
        let key = kernel_key(D1D, Q1D).expect("Specialized sizes must be smaller than 16");
        trace!("Registering TMOP gradient kernel for d1d = {D1D}, q1d = {Q1D}");
        self.kernels
            .insert(key, setup_gradient_kernel_2d::<T, D1D, Q1D, D1D, Q1D>);
    }

    pub fn find(&self, d1d: usize, q1d: usize) -> Option<KernelFn<T>> {
        kernel_key(d1d, q1d).and_then(|key| self.kernels.get(&key).copied())
    }

    pub fn contains(&self, d1d: usize, q1d: usize) -> bool {
        self.find(d1d, q1d).is_some()
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), AssemblyError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssemblyError::DimensionMismatch { what, expected, actual })
    }
}

fn validate_input<T: Real>(input: &GradientKernelInput<T>, d1d: usize, q1d: usize) -> Result<(), AssemblyError> {
    let ne = input.num_elements;
    check_len("nodal coordinates", d1d * d1d * DIM * ne, input.x.len())?;
    check_len("quadrature weights", q1d * q1d, input.weights.len())?;
    check_len("quadrature weights per dimension", q1d, input.weights.nrows())?;
    check_len(
        "target Jacobians",
        JACOBIAN_SIZE * q1d * q1d * ne,
        input.target_jacobians.as_slice().len(),
    )?;
    check_len(
        "target Jacobians per dimension",
        q1d,
        input.target_jacobians.num_quad_1d(),
    )?;
    Ok(())
}

/// Assembles the weighted metric Hessians of all elements into `h`.
///
/// The problem sizes are taken from the basis tables. A specialized kernel from `registry`
/// runs if one matches, otherwise the generic kernel. `h` is resized to
/// `(DIM, DIM, DIM, DIM, Q1D, Q1D, NE)` and fully overwritten.
///
/// # Errors
///
/// Fails without touching `h` if the inputs are inconsistent, or if no specialization
/// matches and the sizes exceed [`MAX_D1D`] or [`MAX_Q1D`].
pub fn setup_gradient_2d<T: Real>(
    input: &GradientKernelInput<T>,
    registry: &KernelRegistry<T>,
    policy: ExecutionPolicy,
    h: &mut HessianTensor<T>,
) -> Result<(), AssemblyError> {
    let d1d = input.basis.num_dofs_1d();
    let q1d = input.basis.num_quad_1d();
    validate_input(input, d1d, q1d)?;

    let ne = input.num_elements;
    let metric_id = input.metric.id();
    match registry.find(d1d, q1d) {
        Some(kernel) => {
            debug!("Specialized TMOP gradient kernel: d1d = {d1d}, q1d = {q1d}, ne = {ne}, metric = {metric_id}");
            h.resize(q1d, ne);
            kernel(input, 0, 0, policy, h.as_mut_slice());
        }
        None => {
            if d1d > MAX_D1D || q1d > MAX_Q1D {
                return Err(AssemblyError::TileSizeExceeded {
                    d1d,
                    q1d,
                    max_d1d: MAX_D1D,
                    max_q1d: MAX_Q1D,
                });
            }
            debug!("Generic TMOP gradient kernel: d1d = {d1d}, q1d = {q1d}, ne = {ne}, metric = {metric_id}");
            h.resize(q1d, ne);
            setup_gradient_kernel_2d::<T, 0, 0, MAX_D1D, MAX_Q1D>(input, d1d, q1d, policy, h.as_mut_slice());
        }
    }
    Ok(())
}
