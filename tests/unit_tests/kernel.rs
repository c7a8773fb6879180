use crate::TestProblem;
use fenris_tmop::kernel::{compute_distortion_matrices, setup_gradient_kernel_2d, ExecutionPolicy, GradientKernelInput};
use fenris_tmop::metrics::TmopMetric;
use fenris_tmop::procedural::{element_nodal_len, transform_nodes};
use fenris_tmop::proptest::{orientation_preserving_affine_map, supported_problem_size};
use fenris_tmop::tensor::{HessianTensor, TargetJacobians};
use fenris_tmop::{MAX_D1D, MAX_Q1D};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DVector, Matrix2, Matrix4, Point2};
use proptest::prelude::*;

fn run_generic(input: &GradientKernelInput<f64>, policy: ExecutionPolicy) -> HessianTensor<f64> {
    let d1d = input.basis.num_dofs_1d();
    let q1d = input.basis.num_quad_1d();
    let mut h = HessianTensor::zeros(q1d, input.num_elements);
    setup_gradient_kernel_2d::<f64, 0, 0, MAX_D1D, MAX_Q1D>(input, d1d, q1d, policy, h.as_mut_slice());
    h
}

fn scaled_identity(factor: f64) -> Matrix4<f64> {
    Matrix4::identity() * factor
}

fn as_vector(h: &HessianTensor<f64>) -> DVector<f64> {
    DVector::from_column_slice(h.as_slice())
}

#[test]
fn distortion_is_identity_for_unit_cells_and_identity_targets() {
    for d1d in 2..=5 {
        for q1d in d1d..=6 {
            let problem = TestProblem::uniform_grid(d1d, q1d, 3, 2, TmopMetric::metric_002());
            for e in 0..problem.num_elements {
                let jpt = compute_distortion_matrices(&problem.input(), e);
                assert_eq!(jpt.len(), q1d * q1d);
                for j in jpt {
                    assert_matrix_eq!(j, Matrix2::<f64>::identity(), comp = abs, tol = 1e-12);
                }
            }
        }
    }
}

#[test]
fn distortion_accounts_for_target_jacobians() {
    let mut problem = TestProblem::uniform_grid(3, 4, 1, 1, TmopMetric::metric_002());
    let target = Matrix2::new(2.0, 0.5, 0.0, 1.0);
    problem.target_jacobians = TargetJacobians::constant(4, 1, &target);
    let expected = target.try_inverse().unwrap();
    for j in compute_distortion_matrices(&problem.input(), 0) {
        assert_matrix_eq!(j, expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn identity_geometry_gives_weighted_metric_001_hessian() {
    let mut problem = TestProblem::uniform_grid(3, 3, 2, 2, TmopMetric::metric_001());
    problem.metric_normal = 2.0;
    let h = run_generic(&problem.input(), ExecutionPolicy::Serial);
    for e in 0..4 {
        for qy in 0..3 {
            for qx in 0..3 {
                let w = 2.0 * problem.weights[(qx, qy)];
                let block = h.block(qx, qy, e).to_matrix();
                assert_matrix_eq!(block, scaled_identity(2.0 * w), comp = abs, tol = 1e-12);
            }
        }
    }
}

#[test]
fn weight_includes_target_determinant() {
    let mut problem = TestProblem::uniform_grid(2, 2, 1, 1, TmopMetric::metric_001());
    problem.target_jacobians = TargetJacobians::constant(2, 1, &Matrix2::new(2.0, 0.0, 0.0, 3.0));
    let h = run_generic(&problem.input(), ExecutionPolicy::Serial);
    for block in h.blocks() {
        // W = 1/4, det(J_tr) = 6, ddI1 = 2 δ δ
        assert_matrix_eq!(block.to_matrix(), scaled_identity(3.0), comp = abs, tol = 1e-12);
    }
}

#[test]
fn specialized_and_generic_kernels_agree() {
    let problem = TestProblem::distorted_grid(3, 4, 3, 2, TmopMetric::metric_007());
    let input = problem.input();
    let generic = run_generic(&input, ExecutionPolicy::Serial);

    let mut specialized = HessianTensor::zeros(4, problem.num_elements);
    setup_gradient_kernel_2d::<f64, 3, 4, 3, 4>(&input, 0, 0, ExecutionPolicy::Serial, specialized.as_mut_slice());
    assert_matrix_eq!(as_vector(&specialized), as_vector(&generic), comp = abs, tol = 1e-12);
}

#[test]
fn serial_and_parallel_execution_agree() {
    let problem = TestProblem::distorted_grid(4, 5, 4, 3, TmopMetric::metric_077());
    let serial = run_generic(&problem.input(), ExecutionPolicy::Serial);
    let parallel = run_generic(&problem.input(), ExecutionPolicy::Parallel);
    assert_eq!(serial, parallel);
}

#[test]
fn elements_are_independent() {
    let problem = TestProblem::distorted_grid(3, 3, 3, 3, TmopMetric::metric_056());
    let batch = run_generic(&problem.input(), ExecutionPolicy::Parallel);

    let d1d = problem.basis.num_dofs_1d();
    let q1d = problem.basis.num_quad_1d();
    let x_len = element_nodal_len(d1d);
    let target_len = 4 * q1d * q1d;
    for e in 0..problem.num_elements {
        let x_e = &problem.x[e * x_len..(e + 1) * x_len];
        let targets_e = TargetJacobians::from_vec(
            q1d,
            1,
            problem.target_jacobians.as_slice()[e * target_len..(e + 1) * target_len].to_vec(),
        )
        .unwrap();
        let input = GradientKernelInput {
            x: x_e,
            target_jacobians: &targets_e,
            num_elements: 1,
            ..problem.input()
        };
        let single = run_generic(&input, ExecutionPolicy::Serial);
        let element_len = single.element_len();
        assert_eq!(
            single.as_slice(),
            &batch.as_slice()[e * element_len..(e + 1) * element_len]
        );
    }
}

#[test]
fn empty_batch_is_a_no_op() {
    let problem = TestProblem::uniform_grid(2, 2, 0, 0, TmopMetric::metric_002());
    let h = run_generic(&problem.input(), ExecutionPolicy::Parallel);
    assert!(h.as_slice().is_empty());
}

proptest! {
    #[test]
    fn distortion_of_affine_elements_is_constant(
        (a, b) in orientation_preserving_affine_map(),
        (d1d, q1d) in supported_problem_size())
    {
        let mut problem = TestProblem::uniform_grid(d1d, q1d, 2, 1, TmopMetric::metric_002());
        transform_nodes(&mut problem.x, d1d, |p| Point2::from(a * p.coords + b));
        for e in 0..problem.num_elements {
            for j in compute_distortion_matrices(&problem.input(), e) {
                assert_matrix_eq!(j, a, comp = abs, tol = 1e-10);
            }
        }
    }

    #[test]
    fn assembled_blocks_are_symmetric((d1d, q1d) in supported_problem_size()) {
        let problem = TestProblem::distorted_grid(d1d, q1d, 2, 2, TmopMetric::metric_002());
        let h = run_generic(&problem.input(), ExecutionPolicy::Parallel);
        for block in h.blocks() {
            prop_assert!(block.symmetry_defect() <= 1e-12);
        }
    }
}
