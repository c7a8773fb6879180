use fenris_tmop::procedural::{create_uniform_quad_grid_nodes, element_nodal_len, transform_nodes};
use itertools::izip;
use matrixcompare::assert_scalar_eq;
use nalgebra::{Point2, Vector2};
use util::assert_panics;

#[test]
fn element_nodal_len_counts_both_components() {
    assert_eq!(element_nodal_len(1), 2);
    assert_eq!(element_nodal_len(3), 18);
}

#[test]
fn uniform_grid_bilinear_nodes() {
    let x = create_uniform_quad_grid_nodes(2, 1, 0.5, 2);
    assert_eq!(x.len(), 2 * element_nodal_len(2));

    // Element 1 covers [0.5, 1] x [0, 0.5]
    let element = &x[8..16];
    let expected_x = [0.5, 1.0, 0.5, 1.0];
    let expected_y = [0.0, 0.0, 0.5, 0.5];
    for (&x, &y, &ex, &ey) in izip!(&element[..4], &element[4..], &expected_x, &expected_y) {
        assert_scalar_eq!(x, ex, comp = abs, tol = 1e-15);
        assert_scalar_eq!(y, ey, comp = abs, tol = 1e-15);
    }
}

#[test]
fn uniform_grid_orders_elements_with_x_fastest() {
    let (cells_x, cells_y, d1d) = (3, 2, 3);
    let x = create_uniform_quad_grid_nodes(cells_x, cells_y, 2.0, d1d);
    let n = d1d * d1d;
    for (e, element) in x.chunks_exact(element_nodal_len(d1d)).enumerate() {
        let (ex, ey) = ((e % cells_x) as f64, (e / cells_x) as f64);
        // First node is the lower left corner, last node the upper right corner
        assert_scalar_eq!(element[0], 2.0 * ex, comp = abs, tol = 1e-14);
        assert_scalar_eq!(element[n], 2.0 * ey, comp = abs, tol = 1e-14);
        assert_scalar_eq!(element[n - 1], 2.0 * (ex + 1.0), comp = abs, tol = 1e-14);
        assert_scalar_eq!(element[2 * n - 1], 2.0 * (ey + 1.0), comp = abs, tol = 1e-14);
        // Middle node of a quadratic element sits in the cell center
        assert_scalar_eq!(element[4], 2.0 * ex + 1.0, comp = abs, tol = 1e-14);
        assert_scalar_eq!(element[n + 4], 2.0 * ey + 1.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn transform_nodes_translates_every_node() {
    let original = create_uniform_quad_grid_nodes(2, 2, 1.0, 3);
    let mut x = original.clone();
    let offset = Vector2::new(1.5, -2.0);
    transform_nodes(&mut x, 3, |p| *p + offset);

    let n = 9;
    for (element, original) in izip!(x.chunks_exact(18), original.chunks_exact(18)) {
        for node in 0..n {
            assert_scalar_eq!(element[node], original[node] + 1.5, comp = abs, tol = 1e-14);
            assert_scalar_eq!(element[node + n], original[node + n] - 2.0, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn transform_nodes_requires_whole_elements() {
    assert_panics!(transform_nodes(&mut vec![0.0; 7], 2, |p: &Point2<f64>| *p));
}
