use crate::global_variables::Float;
use thiserror::Error;

/// Errors that abort a run.
///
/// None of them are retried: they come from the geometry or the case
/// configuration, so a second attempt would fail the same way.
#[derive(Debug, Error)]
pub enum FemError {
    /// An element maps to a non-positive area at some quadrature point.
    #[error("degenerate or inverted element {element}: det(J) = {determinant:e}")]
    Geometry {
        /// Index of the offending element in the connectivity table.
        element: usize,

        /// Smallest Jacobian determinant found on the element.
        determinant: Float,
    },

    /// Invalid or inconsistent run parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The step matrix could not be factorized.
    #[error("singular system at step {step}: pivot {pivot:e}")]
    SingularSystem {
        /// Step index being solved (0 for a standalone factorization).
        step: usize,

        /// Pivot that failed the tolerance check.
        pivot: Float,
    },

    /// A case-file value could not be parsed.
    #[error("cannot parse `{key}` = `{value}`")]
    Parse { key: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FemError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
