use std::ops::Range;
use std::sync::OnceLock;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::{register_font, FontStyle};

use crate::config::{LineStyle, Marker, PlotConfig};
use crate::error::PlotError;
use crate::export;
use crate::perf::Series;

const FONT: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

const CAPTION_SIZE: u32 = 22;
const AXIS_DESC_SIZE: u32 = 16;
const LABEL_SIZE: u32 = 13;

/// Fraction of the data span added on each side of an axis.
const AXIS_PADDING: f64 = 0.05;

/// Text is drawn with a font compiled into the binary so output never depends
/// on what is installed on the host.
fn ensure_font() -> Result<(), PlotError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| register_font(FONT, FontStyle::Normal, FONT_BYTES).is_ok());
    if ok {
        Ok(())
    } else {
        Err(PlotError::Font)
    }
}

fn padded_range(min: f64, max: f64) -> Range<f64> {
    let span = max - min;
    let pad = if span > 0.0 { span * AXIS_PADDING } else { 0.5 };
    min - pad..max + pad
}

fn tick_label(v: &f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// A rendered chart: what was plotted and the encoded png.
#[derive(Debug, Clone)]
pub struct Figure {
    /// Data coordinates in drawing order.
    pub points: Vec<(f64, f64)>,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Figure {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

fn layout(series: &Series) -> (Vec<(f64, f64)>, Range<f64>, Range<f64>) {
    let points: Vec<(f64, f64)> = series
        .points()
        .iter()
        .map(|p| (p.threads as f64, p.speedup))
        .collect();

    let x_min = series.first().threads as f64;
    let x_max = series.last().threads as f64;
    let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    (points, padded_range(x_min, x_max), padded_range(y_min, y_max))
}

fn draw(
    buffer: &mut [u8],
    points: &[(f64, f64)],
    x_range: Range<f64>,
    y_range: Range<f64>,
    config: &PlotConfig,
) -> Result<(), PlotError> {
    let root = BitMapBackend::with_buffer(buffer, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(&config.text.title, (FONT, CAPTION_SIZE))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(x_range, y_range)?;

    let y_label = |v: &f64| format!("{:.1}", v);
    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&tick_label)
        .y_label_formatter(&y_label)
        .x_labels(points.len().clamp(2, 20))
        .y_labels(10)
        .x_desc(config.text.x_label.as_str())
        .y_desc(config.text.y_label.as_str())
        .label_style((FONT, LABEL_SIZE))
        .axis_desc_style((FONT, AXIS_DESC_SIZE));
    if config.text.grid {
        mesh.bold_line_style(BLACK.mix(0.15))
            .light_line_style(WHITE.mix(0.0));
    } else {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    let color = config.style.color.rgb();
    let line = color.stroke_width(config.line_width);

    match config.style.line_style {
        LineStyle::Solid => {
            chart.draw_series(LineSeries::new(points.iter().copied(), line))?;
        }
        LineStyle::Dashed => {
            chart.draw_series(DashedLineSeries::new(points.to_vec(), 8, 5, line))?;
        }
        LineStyle::Dotted => {
            chart.draw_series(DashedLineSeries::new(points.to_vec(), 2, 4, line))?;
        }
        LineStyle::None => {}
    }

    let size = config.marker_size;
    let half = size as i32;
    let fill = color.filled();

    match config.style.marker {
        Marker::Circle => {
            chart.draw_series(points.iter().map(|&p| Circle::new(p, size, fill)))?;
        }
        Marker::Square => {
            chart.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p) + Rectangle::new([(-half, -half), (half, half)], fill)
            }))?;
        }
        Marker::Triangle => {
            chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, size, fill)))?;
        }
        Marker::Cross => {
            chart.draw_series(points.iter().map(|&p| Cross::new(p, size, line)))?;
        }
        Marker::None => {}
    }

    root.present()?;
    Ok(())
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PlotError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgb, width, height, ColorType::Rgb8)
        .map_err(|e| PlotError::Encode(e.to_string()))?;
    Ok(png)
}

/// Draw `series` as a single line with markers and encode it as png.
///
/// Nothing is written to disk. The same series and config always produce the
/// same bytes.
pub fn render(series: &Series, config: &PlotConfig) -> Result<Figure, PlotError> {
    config.validate()?;
    ensure_font()?;

    let (points, x_range, y_range) = layout(series);

    let mut buffer = vec![0u8; config.width as usize * config.height as usize * 3];
    draw(&mut buffer, &points, x_range.clone(), y_range.clone(), config)?;
    let png = encode_png(&buffer, config.width, config.height)?;

    Ok(Figure {
        points,
        x_range,
        y_range,
        width: config.width,
        height: config.height,
        png,
    })
}

/// Render `series` and save it to `config.output`.
pub fn write_plot(series: &Series, config: &PlotConfig) -> Result<Figure, PlotError> {
    let figure = render(series, config)?;
    export::write_atomic(&config.output, &figure.png)?;

    tracing::info!(
        "wrote {} ({}x{}, {} points)",
        config.output.display(),
        figure.width,
        figure.height,
        figure.point_count()
    );
    tracing::debug!("x axis {:?}, y axis {:?}", figure.x_range, figure.y_range);
    Ok(figure)
}
