use std::fs::File;
use std::path::Path;

use crate::error::PlotError;
use crate::export;
use crate::perf::{Series, SeriesPoint};

/// Save a series as `threads,speedup` rows with a header.
pub fn write_series(path: &Path, series: &Series) -> Result<(), PlotError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in series.points() {
        writer.serialize(point)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PlotError::io(path, e.into_error()))?;

    export::write_atomic(path, &bytes)
}

pub fn read_series(path: &Path) -> Result<Series, PlotError> {
    let file = File::open(path).map_err(|e| PlotError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let points = reader
        .deserialize::<SeriesPoint>()
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("read {} points from {}", points.len(), path.display());
    Series::from_points(points)
}
