use serde::{Deserialize, Serialize};

use crate::error::PlotError;

/// One measurement: speedup observed when running with `threads` threads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub threads: u32,
    pub speedup: f64,
}

/// Ordered, non-empty run of measurements with strictly increasing thread counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    /// Pair up thread counts and speedups. Values are kept exactly as given.
    pub fn new(threads: &[u32], speedups: &[f64]) -> Result<Self, PlotError> {
        if threads.len() != speedups.len() {
            return Err(PlotError::InvalidInput(format!(
                "{} thread counts but {} speedups",
                threads.len(),
                speedups.len()
            )));
        }

        let points = threads
            .iter()
            .zip(speedups)
            .map(|(&threads, &speedup)| SeriesPoint { threads, speedup })
            .collect();

        Self::from_points(points)
    }

    pub fn from_points(points: Vec<SeriesPoint>) -> Result<Self, PlotError> {
        if points.is_empty() {
            return Err(PlotError::InvalidInput("series is empty".to_string()));
        }

        for (i, point) in points.iter().enumerate() {
            if point.threads == 0 {
                return Err(PlotError::InvalidInput(format!(
                    "thread count at index {i} is zero"
                )));
            }
            if !point.speedup.is_finite() || point.speedup < 0.0 {
                return Err(PlotError::InvalidInput(format!(
                    "speedup at index {i} is {}",
                    point.speedup
                )));
            }
        }

        if let Some(w) = points.windows(2).find(|w| w[1].threads <= w[0].threads) {
            return Err(PlotError::InvalidInput(format!(
                "thread counts must increase, got {} after {}",
                w[1].threads, w[0].threads
            )));
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> SeriesPoint {
        self.points[0]
    }

    pub fn last(&self) -> SeriesPoint {
        self.points[self.points.len() - 1]
    }
}
