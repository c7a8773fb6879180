//! Bookkeeping for convergence studies under uniform refinement.
//!
//! Each refinement level registers the number of degrees of freedom, the $L^2$ error and the
//! $L^2$ norm of the reference solution. Rates are computed assuming that the mesh size is
//! halved between consecutive levels, i.e. `rate_k = log2(err_{k-1} / err_k)`. The first level
//! has rate zero.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors and rates recorded for one refinement level.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSample {
    pub num_dofs: usize,
    pub l2_error: f64,
    pub l2_rate: f64,
    pub l2_relative_error: f64,
    pub l2_relative_rate: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRates {
    samples: Vec<ConvergenceSample>,
}

fn rate(previous: Option<f64>, current: f64) -> f64 {
    previous
        .map(|previous| (previous / current).log2())
        .unwrap_or(0.0)
}

impl ConvergenceRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all registered levels.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Registers the next refinement level.
    ///
    /// `l2_norm` is the $L^2$ norm of the reference solution, used for the relative error.
    pub fn register_solution(&mut self, num_dofs: usize, l2_error: f64, l2_norm: f64) {
        let l2_relative_error = l2_error / l2_norm;
        let previous = self.samples.last();
        let sample = ConvergenceSample {
            num_dofs,
            l2_error,
            l2_rate: rate(previous.map(|s| s.l2_error), l2_error),
            l2_relative_error,
            l2_relative_rate: rate(previous.map(|s| s.l2_relative_error), l2_relative_error),
        };
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The $L^2$ error of level `n`, or `None` if fewer levels have been registered.
    pub fn l2_error(&self, n: usize) -> Option<f64> {
        self.samples.get(n).map(|s| s.l2_error)
    }

    pub fn l2_errors(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.l2_error).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.l2_rate).collect()
    }

    pub fn samples(&self) -> &[ConvergenceSample] {
        &self.samples
    }
}

impl Display for ConvergenceRates {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rule = " ------------------------------------------------------------------------";
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "{:>11}{:>15}{:>15}{:>15}{:>15}",
            "DOFs ", "L^2 error ", "L^2 rate ", "L^2 Rel error ", "L^2 Rel rate "
        )?;
        writeln!(f, "{rule}")?;
        for s in &self.samples {
            writeln!(
                f,
                "{:>10}{:>16.4e}{:>13.4}{:>15.4e}{:>13.4}",
                s.num_dofs, s.l2_error, s.l2_rate, s.l2_relative_error, s.l2_relative_rate
            )?;
        }
        Ok(())
    }
}
