//! Integrator-level entry point for partially assembled TMOP gradients.
use crate::basis::TensorBasis;
use crate::dispatch::{setup_gradient_2d, KernelRegistry};
use crate::kernel::{ExecutionPolicy, GradientKernelInput};
use crate::metrics::{MetricRegistry, TmopMetric};
use crate::quadrature::quadrilateral_gauss_weights;
use crate::tensor::{HessianTensor, TargetJacobians};
use crate::Real;
use eyre::WrapErr;
use nalgebra::DMatrix;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Parameters selecting the metric and its normalization.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TmopParameters<T> {
    /// Identifier of the metric in the [`MetricRegistry`].
    pub metric_id: u32,
    /// Global normalization constant $\nu$ multiplying the metric.
    pub metric_normal: T,
}

impl<T: Real> Default for TmopParameters<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self {
            metric_id: 2,
            metric_normal: 1.0,
        }
    }
}

/// Assembles and stores the metric Hessians of a batch of tensor-product quadrilaterals.
///
/// The assembler owns everything that stays fixed across Newton iterations: the basis tables,
/// the quadrature weights, the target Jacobians and the metric choice. Each call to
/// [`assemble_gradient`](Self::assemble_gradient) recomputes the Hessians for new nodal
/// coordinates and overwrites the stored [`HessianTensor`].
#[derive(Debug, Clone)]
pub struct TmopGradientAssembler<T: Real> {
    basis: TensorBasis<T>,
    weights: DMatrix<T>,
    target_jacobians: TargetJacobians<T>,
    parameters: TmopParameters<T>,
    metrics: MetricRegistry<T>,
    kernels: KernelRegistry<T>,
    policy: ExecutionPolicy,
    hessian: HessianTensor<T>,
}

impl<T: Real> TmopGradientAssembler<T> {
    pub fn new(
        basis: TensorBasis<T>,
        weights: DMatrix<T>,
        target_jacobians: TargetJacobians<T>,
        parameters: TmopParameters<T>,
    ) -> Self {
        Self {
            basis,
            weights,
            target_jacobians,
            parameters,
            metrics: MetricRegistry::default(),
            kernels: KernelRegistry::default(),
            policy: ExecutionPolicy::default(),
            hessian: HessianTensor::default(),
        }
    }

    /// Creates an assembler for Gauss-Lobatto nodal elements with `num_dofs_1d` nodes and
    /// `num_quad_1d` Gauss points per dimension.
    pub fn for_lobatto_elements(
        num_dofs_1d: usize,
        num_quad_1d: usize,
        target_jacobians: TargetJacobians<T>,
        parameters: TmopParameters<T>,
    ) -> Self {
        Self::new(
            TensorBasis::lobatto_nodal(num_dofs_1d, num_quad_1d),
            quadrilateral_gauss_weights(num_quad_1d),
            target_jacobians,
            parameters,
        )
    }

    pub fn with_metric_registry(self, metrics: MetricRegistry<T>) -> Self {
        Self { metrics, ..self }
    }

    pub fn with_kernel_registry(self, kernels: KernelRegistry<T>) -> Self {
        Self { kernels, ..self }
    }

    pub fn with_execution_policy(self, policy: ExecutionPolicy) -> Self {
        Self { policy, ..self }
    }

    pub fn parameters(&self) -> &TmopParameters<T> {
        &self.parameters
    }

    pub fn set_parameters(&mut self, parameters: TmopParameters<T>) {
        self.parameters = parameters;
    }

    pub fn basis(&self) -> &TensorBasis<T> {
        &self.basis
    }

    pub fn weights(&self) -> &DMatrix<T> {
        &self.weights
    }

    pub fn target_jacobians(&self) -> &TargetJacobians<T> {
        &self.target_jacobians
    }

    pub fn num_elements(&self) -> usize {
        self.target_jacobians.num_elements()
    }

    /// The metric selected by the current parameters.
    pub fn metric(&self) -> eyre::Result<&TmopMetric<T>> {
        Ok(self.metrics.get(self.parameters.metric_id)?)
    }

    /// The Hessians computed by the most recent successful call to
    /// [`assemble_gradient`](Self::assemble_gradient).
    pub fn hessian(&self) -> &HessianTensor<T> {
        &self.hessian
    }

    /// Recomputes the metric Hessians for the nodal coordinates `x`, given with shape
    /// `(D1D, D1D, DIM, NE)`.
    ///
    /// # Errors
    ///
    /// Fails before any work is done if the metric id is not registered, if `x` has the wrong
    /// length, or if the problem size cannot be handled by any kernel. The stored Hessians are
    /// left untouched in that case.
    pub fn assemble_gradient(&mut self, x: &[T]) -> eyre::Result<()> {
        let metric = self.metrics.get(self.parameters.metric_id)?;
        let input = GradientKernelInput {
            x,
            basis: &self.basis,
            weights: &self.weights,
            target_jacobians: &self.target_jacobians,
            metric,
            metric_normal: self.parameters.metric_normal,
            num_elements: self.target_jacobians.num_elements(),
        };
        setup_gradient_2d(&input, &self.kernels, self.policy, &mut self.hessian)
            .wrap_err("Failed to assemble TMOP gradient")
    }
}
