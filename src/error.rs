//! Library-wide error type.
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors reported by gradient assembly before any element is processed.
///
/// An assembly pass is all-or-nothing: whenever one of these errors is returned, the output
/// tensor has not been written to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// The number of nodes or quadrature points per dimension exceeds what the generic
    /// kernel's tiles can hold.
    TileSizeExceeded {
        d1d: usize,
        q1d: usize,
        max_d1d: usize,
        max_q1d: usize,
    },
    /// No metric with the given identifier is registered.
    UnsupportedMetric(u32),
    /// An input array does not have the length implied by the problem sizes.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl Display for AssemblyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::TileSizeExceeded {
                d1d,
                q1d,
                max_d1d,
                max_q1d,
            } => {
                write!(
                    f,
                    "Max size error: d1d = {d1d}, q1d = {q1d} exceed the kernel bounds \
                     (max d1d = {max_d1d}, max q1d = {max_q1d})"
                )
            }
            Self::UnsupportedMetric(id) => {
                write!(f, "Unsupported metric: no metric with id {id} is registered")
            }
            Self::DimensionMismatch { what, expected, actual } => {
                write!(f, "Dimension mismatch for {what}: expected length {expected}, got {actual}")
            }
        }
    }
}

impl std::error::Error for AssemblyError {}
