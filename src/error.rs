use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Errors raised while building, rendering or exporting a speedup chart.
#[derive(Debug, Error)]
pub enum PlotError {
    /// The data cannot be plotted: mismatched, empty or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw chart: {0}")]
    Render(String),

    #[error("failed to encode png: {0}")]
    Encode(String),

    #[error("embedded font could not be loaded")]
    Font,

    #[error("series csv: {0}")]
    Csv(#[from] csv::Error),

    /// Not fatal: the figure was exported but there is nowhere to show it.
    #[error("display unavailable: {0}")]
    DisplayUnavailable(String),
}

impl PlotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlotError::Io {
            path: path.into(),
            source,
        }
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Render(e.to_string())
    }
}
