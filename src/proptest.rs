use crate::{MAX_D1D, MAX_Q1D};
use ::proptest::prelude::*;
use nalgebra::{Matrix2, Rotation2, Vector2};
use std::f64::consts::PI;

/// 2x2 matrices with determinant bounded away from zero.
///
/// The matrices are generated as a rotation times an upper triangular matrix with diagonal
/// entries in `[0.5, 2]`, so the determinant lies in `[0.25, 4]`.
pub fn positive_determinant_matrix2() -> impl Strategy<Value = Matrix2<f64>> {
    let angle = -PI..PI;
    let scale = 0.5..2.0;
    let shear = -0.5..0.5;
    (angle, scale.clone(), scale, shear).prop_map(|(angle, s1, s2, shear)| {
        let rotation = Rotation2::new(angle);
        rotation.matrix() * Matrix2::new(s1, shear, 0.0, s2)
    })
}

/// Affine maps `x -> A x + b` with `det A > 0`.
pub fn orientation_preserving_affine_map() -> impl Strategy<Value = (Matrix2<f64>, Vector2<f64>)> {
    let offset = [-5.0..5.0, -5.0..5.0];
    (positive_determinant_matrix2(), offset).prop_map(|(a, [bx, by])| (a, Vector2::new(bx, by)))
}

/// Pairs `(d1d, q1d)` of nodes and quadrature points per dimension that the generic kernel
/// supports, with at least two nodes per dimension.
pub fn supported_problem_size() -> impl Strategy<Value = (usize, usize)> {
    (2..=MAX_D1D).prop_flat_map(|d1d| (Just(d1d), d1d..=MAX_Q1D))
}
