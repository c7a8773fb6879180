//! Dense column-major storage for the per-quadrature-point data consumed and produced by the
//! kernels.
//!
//! All arrays use the convention that the first index varies fastest. A 2x2 matrix `M` is
//! therefore stored with `M(r, c)` at offset `r + 2 c`, which coincides with the storage order
//! of [`nalgebra::Matrix2`].
use crate::error::AssemblyError;
use crate::invariants::InvariantHessian;
use crate::{Real, DIM};
use nalgebra::Matrix2;
use std::slice::ChunksExactMut;

/// Number of entries in a single 4-index Hessian block.
pub const HESSIAN_BLOCK_SIZE: usize = DIM * DIM * DIM * DIM;

/// Number of entries in a single 2x2 Jacobian.
pub const JACOBIAN_SIZE: usize = DIM * DIM;

/// Second derivative of a scalar energy density with respect to the entries of a 2x2 matrix,
/// stored as `H(r, c, i, j)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HessianBlock<T> {
    data: [T; HESSIAN_BLOCK_SIZE],
}

#[inline(always)]
fn block_offset(r: usize, c: usize, i: usize, j: usize) -> usize {
    debug_assert!(r < DIM && c < DIM && i < DIM && j < DIM);
    r + DIM * (c + DIM * (i + DIM * j))
}

impl<T: Real> HessianBlock<T> {
    pub fn zeros() -> Self {
        Self {
            data: [T::zero(); HESSIAN_BLOCK_SIZE],
        }
    }

    pub fn from_fn(mut f: impl FnMut(usize, usize, usize, usize) -> T) -> Self {
        let mut block = Self::zeros();
        for j in 0..DIM {
            for i in 0..DIM {
                for c in 0..DIM {
                    for r in 0..DIM {
                        block.data[block_offset(r, c, i, j)] = f(r, c, i, j);
                    }
                }
            }
        }
        block
    }

    /// Constructs the block `H(r, c, i, j) = scale * h[i][j][(r, c)]`.
    pub fn from_invariant_hessian(scale: T, h: &InvariantHessian<T>) -> Self {
        Self::from_fn(|r, c, i, j| scale * h[i][j][(r, c)])
    }

    /// Constructs a block from its column-major entries.
    ///
    /// # Panics
    ///
    /// Panics if the slice does not contain exactly [`HESSIAN_BLOCK_SIZE`] entries.
    pub fn from_slice(entries: &[T]) -> Self {
        let mut block = Self::zeros();
        block.data.copy_from_slice(entries);
        block
    }

    pub fn get(&self, r: usize, c: usize, i: usize, j: usize) -> T {
        self.data[block_offset(r, c, i, j)]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Interprets the block as a 4x4 matrix acting on column-major flattened 2x2 matrices.
    ///
    /// Row `r + 2 c` and column `i + 2 j` hold `H(r, c, i, j)`.
    pub fn to_matrix(&self) -> nalgebra::Matrix4<T> {
        nalgebra::Matrix4::from_column_slice(&self.data)
    }

    /// Largest absolute difference between `H(r, c, i, j)` and `H(i, j, r, c)`.
    pub fn symmetry_defect(&self) -> T {
        let m = self.to_matrix();
        (m - m.transpose()).amax()
    }

    pub fn scaled(&self, factor: T) -> Self {
        Self {
            data: self.data.map(|h| factor * h),
        }
    }
}

/// The output of a gradient assembly pass: one [`HessianBlock`] per element and quadrature point.
///
/// The logical shape is `(DIM, DIM, DIM, DIM, Q1D, Q1D, NE)`. Since the block indices vary
/// fastest, every `(qx, qy, e)` block is contiguous, and so is the data of each element.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianTensor<T> {
    num_quad_1d: usize,
    num_elements: usize,
    data: Vec<T>,
}

impl<T: Real> Default for HessianTensor<T> {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}

impl<T: Real> HessianTensor<T> {
    pub fn zeros(num_quad_1d: usize, num_elements: usize) -> Self {
        Self {
            num_quad_1d,
            num_elements,
            data: vec![T::zero(); Self::required_len(num_quad_1d, num_elements)],
        }
    }

    pub fn required_len(num_quad_1d: usize, num_elements: usize) -> usize {
        HESSIAN_BLOCK_SIZE * num_quad_1d * num_quad_1d * num_elements
    }

    /// Changes the shape of the tensor. Existing entries are not preserved in any meaningful
    /// order and must be considered garbage until the next assembly pass.
    pub fn resize(&mut self, num_quad_1d: usize, num_elements: usize) {
        self.num_quad_1d = num_quad_1d;
        self.num_elements = num_elements;
        self.data
            .resize(Self::required_len(num_quad_1d, num_elements), T::zero());
    }

    pub fn num_quad_1d(&self) -> usize {
        self.num_quad_1d
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn element_len(&self) -> usize {
        HESSIAN_BLOCK_SIZE * self.num_quad_1d * self.num_quad_1d
    }

    fn block_range(&self, qx: usize, qy: usize, e: usize) -> std::ops::Range<usize> {
        let q1d = self.num_quad_1d;
        assert!(qx < q1d && qy < q1d, "Quadrature point index out of bounds");
        assert!(e < self.num_elements, "Element index out of bounds");
        let start = HESSIAN_BLOCK_SIZE * (qx + q1d * (qy + q1d * e));
        start..start + HESSIAN_BLOCK_SIZE
    }

    /// Returns `H(r, c, i, j, qx, qy, e)`.
    pub fn get(&self, r: usize, c: usize, i: usize, j: usize, qx: usize, qy: usize, e: usize) -> T {
        let range = self.block_range(qx, qy, e);
        self.data[range.start + block_offset(r, c, i, j)]
    }

    pub fn block(&self, qx: usize, qy: usize, e: usize) -> HessianBlock<T> {
        HessianBlock::from_slice(&self.data[self.block_range(qx, qy, e)])
    }

    /// Iterates over all blocks of all elements in storage order, i.e. `qx` fastest.
    pub fn blocks(&self) -> impl '_ + Iterator<Item = HessianBlock<T>> {
        self.data
            .chunks_exact(HESSIAN_BLOCK_SIZE)
            .map(HessianBlock::from_slice)
    }

    /// The storage of all elements, `element_len()` entries per element.
    pub fn element_chunks_mut(&mut self) -> ChunksExactMut<T> {
        let len = self.element_len().max(1);
        self.data.chunks_exact_mut(len)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Per-element, per-quadrature-point target Jacobians $\vec J_{tr}$ with shape
/// `(DIM, DIM, Q1D, Q1D, NE)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetJacobians<T> {
    num_quad_1d: usize,
    num_elements: usize,
    data: Vec<T>,
}

impl<T: Real> TargetJacobians<T> {
    pub fn from_fn(
        num_quad_1d: usize,
        num_elements: usize,
        mut f: impl FnMut(usize, usize, usize) -> Matrix2<T>,
    ) -> Self {
        let mut data = Vec::with_capacity(JACOBIAN_SIZE * num_quad_1d * num_quad_1d * num_elements);
        for e in 0..num_elements {
            for qy in 0..num_quad_1d {
                for qx in 0..num_quad_1d {
                    data.extend_from_slice(f(e, qx, qy).as_slice());
                }
            }
        }
        Self {
            num_quad_1d,
            num_elements,
            data,
        }
    }

    /// The target corresponding to ideal shape and unit size at every quadrature point.
    pub fn identity(num_quad_1d: usize, num_elements: usize) -> Self {
        Self::from_fn(num_quad_1d, num_elements, |_, _, _| Matrix2::identity())
    }

    /// The same target matrix at every quadrature point.
    pub fn constant(num_quad_1d: usize, num_elements: usize, target: &Matrix2<T>) -> Self {
        Self::from_fn(num_quad_1d, num_elements, |_, _, _| *target)
    }

    pub fn from_vec(num_quad_1d: usize, num_elements: usize, data: Vec<T>) -> Result<Self, AssemblyError> {
        let expected = JACOBIAN_SIZE * num_quad_1d * num_quad_1d * num_elements;
        if data.len() != expected {
            return Err(AssemblyError::DimensionMismatch {
                what: "target Jacobians",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            num_quad_1d,
            num_elements,
            data,
        })
    }

    pub fn num_quad_1d(&self) -> usize {
        self.num_quad_1d
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn get(&self, qx: usize, qy: usize, e: usize) -> Matrix2<T> {
        let q1d = self.num_quad_1d;
        let start = JACOBIAN_SIZE * (qx + q1d * (qy + q1d * e));
        Matrix2::from_column_slice(&self.data[start..start + JACOBIAN_SIZE])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}
