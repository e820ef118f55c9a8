// error.rs

use thiserror::Error;

use crate::plot::PlotId;
use crate::store::StoreError;

/// Errors produced by drawing, import, submission and selection.
///
/// None of them is fatal: the workspace always stays in a state from which
/// the user can retry or cancel.
#[derive(Error, Debug)]
pub enum PlotError {
    /// Unsupported or malformed GeoJSON on import
    #[error("Invalid geometry input: {message}")]
    InvalidGeometryInput { message: String },

    /// Shape reported by the drawing tool has too few distinct vertices
    #[error("Degenerate shape: {vertices} distinct vertices, at least {required} required")]
    DegenerateShape { vertices: usize, required: usize },

    /// The store rejected or failed to create the plot
    #[error("Failed to save plot: {0}")]
    PersistenceFailure(#[from] StoreError),

    /// The selected plot is no longer in the plot list
    #[error("Plot {0} is no longer available")]
    StaleSelection(PlotId),

    /// Submission without a name
    #[error("Plot name must not be empty")]
    EmptyName,

    /// Submission with no pending drawing session
    #[error("No drawing session awaiting confirmation")]
    NoSession,
}

impl PlotError {
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometryInput {
            message: message.into(),
        }
    }

    /// Whether the error should be shown to the user rather than only logged.
    pub fn is_reported(&self) -> bool {
        !matches!(
            self,
            PlotError::DegenerateShape { .. } | PlotError::StaleSelection(_)
        )
    }
}
