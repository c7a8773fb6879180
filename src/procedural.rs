//! Procedural generation of element batches.
//!
//! Element nodal coordinates are produced directly in the element-wise layout
//! `(D1D, D1D, DIM, NE)` expected by the kernels.
use crate::quadrature::gauss_lobatto;
use crate::{Real, DIM};
use itertools::iproduct;
use nalgebra::Point2;

/// Number of entries per element in the nodal coordinate layout.
pub fn element_nodal_len(num_dofs_1d: usize) -> usize {
    num_dofs_1d * num_dofs_1d * DIM
}

/// Nodal coordinates of a uniform grid of `cells_x` by `cells_y` square cells with the given
/// side length and the lower left corner at the origin.
///
/// Nodes are placed at the Gauss-Lobatto points of each cell. Elements are ordered with the
/// x-index varying fastest.
pub fn create_uniform_quad_grid_nodes<T: Real>(
    cells_x: usize,
    cells_y: usize,
    cell_size: T,
    num_dofs_1d: usize,
) -> Vec<T> {
    let d1d = num_dofs_1d;
    let (_, nodes) = gauss_lobatto::<T>(d1d);
    let to_t = |i: usize| T::from_usize(i).expect("Must be able to fit usize in T");

    let mut x = vec![T::zero(); element_nodal_len(d1d) * cells_x * cells_y];
    for (e, x_element) in x.chunks_exact_mut(element_nodal_len(d1d)).enumerate() {
        let (ex, ey) = (to_t(e % cells_x), to_t(e / cells_x));
        for (dy, dx) in iproduct!(0..d1d, 0..d1d) {
            x_element[dx + d1d * dy] = (ex + nodes[dx]) * cell_size;
            x_element[dx + d1d * (dy + d1d)] = (ey + nodes[dy]) * cell_size;
        }
    }
    x
}

/// Moves every node `p` of every element to `f(p)`.
///
/// # Panics
///
/// Panics if the length of `x` is not a multiple of the element size.
pub fn transform_nodes<T: Real>(x: &mut [T], num_dofs_1d: usize, mut f: impl FnMut(&Point2<T>) -> Point2<T>) {
    let d1d = num_dofs_1d;
    let element_len = element_nodal_len(d1d);
    assert_eq!(x.len() % element_len.max(1), 0, "Nodal coordinates must consist of whole elements");
    let n = d1d * d1d;
    for x_element in x.chunks_exact_mut(element_len) {
        for node in 0..n {
            let p = f(&Point2::new(x_element[node], x_element[node + n]));
            x_element[node] = p.x;
            x_element[node + n] = p.y;
        }
    }
}
