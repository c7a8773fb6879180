use crate::{approximate_matrix_derivative, approximate_scalar_derivative};
use fenris_tmop::error::AssemblyError;
use fenris_tmop::metrics::{MetricRegistry, TmopMetric};
use fenris_tmop::proptest::positive_determinant_matrix2;
use fenris_tmop::tensor::HessianBlock;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, Matrix2};
use proptest::prelude::*;

fn catalog() -> Vec<TmopMetric<f64>> {
    vec![
        TmopMetric::metric_001(),
        TmopMetric::metric_002(),
        TmopMetric::metric_007(),
        TmopMetric::metric_056(),
        TmopMetric::metric_077(),
    ]
}

fn block_as_matrix(block: &HessianBlock<f64>) -> DMatrix<f64> {
    DMatrix::from_column_slice(4, 4, block.as_slice())
}

fn delta(a: usize, b: usize) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

#[test]
fn default_registry_contains_catalog() {
    let registry = MetricRegistry::<f64>::default();
    assert_eq!(registry.ids(), vec![1, 2, 7, 56, 77]);
    for metric in catalog() {
        assert!(registry.contains(metric.id()));
        assert_eq!(registry.get(metric.id()).unwrap().name(), metric.name());
    }
}

#[test]
fn unknown_metric_is_rejected() {
    let registry = MetricRegistry::<f64>::default();
    assert!(!registry.contains(3));
    assert_eq!(registry.get(3).unwrap_err(), AssemblyError::UnsupportedMetric(3));
    assert!(MetricRegistry::<f64>::empty().get(2).is_err());
}

#[test]
fn registering_custom_metric() {
    fn energy(t: &Matrix2<f64>) -> f64 {
        3.0 * t.norm_squared()
    }
    fn first_derivative(t: &Matrix2<f64>) -> Matrix2<f64> {
        t * 6.0
    }
    fn hessian(weight: f64, _: &Matrix2<f64>) -> HessianBlock<f64> {
        HessianBlock::from_fn(|r, c, i, j| 6.0 * weight * delta(i, r) * delta(j, c))
    }

    let mut registry = MetricRegistry::empty();
    assert!(registry
        .register(TmopMetric::new(1000, "3 |T|^2", energy, first_derivative, hessian))
        .is_none());
    assert_eq!(registry.ids(), vec![1000]);

    let previous = registry.register(TmopMetric::new(1000, "replacement", energy, first_derivative, hessian));
    assert_eq!(previous.map(|metric| metric.name()), Some("3 |T|^2"));
    let metric = registry.get(1000).unwrap();
    assert_eq!(metric.name(), "replacement");
    assert_scalar_eq!(metric.energy_density(&Matrix2::identity()), 6.0, comp = abs, tol = 1e-14);
}

#[test]
fn shape_metrics_are_minimized_by_identity() {
    let identity = Matrix2::identity();
    for metric in catalog().into_iter().filter(|metric| metric.id() != 1) {
        assert_scalar_eq!(metric.energy_density(&identity), 0.0, comp = abs, tol = 1e-14);
        assert_matrix_eq!(metric.first_derivative(&identity), Matrix2::<f64>::zeros(), comp = abs, tol = 1e-14);
    }
}

#[test]
fn metric_001_hessian_is_constant() {
    let metric = TmopMetric::metric_001();
    let weight = 0.3;
    let expected = HessianBlock::from_fn(|r, c, i, j| weight * 2.0 * delta(i, r) * delta(j, c));
    for t in [Matrix2::identity(), Matrix2::new(2.0, 1.0, -0.5, 0.7)] {
        assert_eq!(metric.hessian(weight, &t), expected);
    }
}

#[test]
fn metric_002_hessian_at_identity() {
    // 0.5 * weight * ddI1b(I), with ddI1b(I) = 2 (δ_ir δ_jc - ε_ir ε_jc)
    let weight = 0.25;
    let block = TmopMetric::metric_002().hessian(weight, &Matrix2::identity());
    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(4, 4, &[
         1.0, 0.0, 0.0, -1.0,
         0.0, 1.0, 1.0,  0.0,
         0.0, 1.0, 1.0,  0.0,
        -1.0, 0.0, 0.0,  1.0,
    ]) * (0.5 * weight * 2.0);
    assert_matrix_eq!(block_as_matrix(&block), expected, comp = abs, tol = 1e-14);
}

proptest! {
    #[test]
    fn first_derivatives_match_finite_differences(t in positive_determinant_matrix2()) {
        for metric in catalog() {
            let approx = approximate_scalar_derivative(|t| metric.energy_density(t), &t);
            let exact = metric.first_derivative(&t);
            let tol = 1e-6 * exact.amax().max(1.0);
            assert_matrix_eq!(exact, approx, comp = abs, tol = tol);
        }
    }

    #[test]
    fn hessians_match_finite_differences(t in positive_determinant_matrix2()) {
        for metric in catalog() {
            let approx = approximate_matrix_derivative(|t| metric.first_derivative(t), &t);
            let exact = block_as_matrix(&metric.hessian(1.0, &t));
            let tol = 1e-5 * exact.amax().max(1.0);
            assert_matrix_eq!(exact, approx, comp = abs, tol = tol);
        }
    }

    #[test]
    fn hessians_are_symmetric(t in positive_determinant_matrix2()) {
        for metric in catalog() {
            let block = metric.hessian(1.0, &t);
            let tol = 1e-12 * block.to_matrix().amax().max(1.0);
            prop_assert!(block.symmetry_defect() <= tol, "metric {} is not symmetric", metric.id());
        }
    }

    #[test]
    fn hessians_scale_linearly_with_weight(t in positive_determinant_matrix2(), weight in 0.01..10.0) {
        for metric in catalog() {
            let unit = block_as_matrix(&metric.hessian(1.0, &t));
            let weighted = block_as_matrix(&metric.hessian(weight, &t));
            let tol = 1e-12 * weighted.amax().max(1.0);
            assert_matrix_eq!(weighted, unit * weight, comp = abs, tol = tol);
        }
    }
}
