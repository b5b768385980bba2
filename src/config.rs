use std::path::PathBuf;
use std::str::FromStr;

use plotters::style::RGBColor;

use crate::error::PlotError;

pub const DEFAULT_OUTPUT: &str = "speedup.png";
pub const DEFAULT_TITLE: &str = "Speedup vs Number of Threads";
pub const DEFAULT_X_LABEL: &str = "Number of Threads";
pub const DEFAULT_Y_LABEL: &str = "Speedup (Linear / Parallel)";

pub const PLOT_WIDTH: u32 = 640;
pub const PLOT_HEIGHT: u32 = 480;
pub const LINE_WIDTH: u32 = 2;
pub const MARKER_SIZE: u32 = 4;

/// Glyph drawn at each data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    Circle,
    Square,
    Triangle,
    Cross,
    None,
}

impl FromStr for Marker {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o" | "circle" => Ok(Marker::Circle),
            "s" | "square" => Ok(Marker::Square),
            "^" | "triangle" => Ok(Marker::Triangle),
            "x" | "cross" => Ok(Marker::Cross),
            "" | "none" => Ok(Marker::None),
            other => Err(PlotError::InvalidInput(format!("unknown marker '{other}'"))),
        }
    }
}

/// Appearance of the line joining consecutive points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

impl FromStr for LineStyle {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" | "solid" => Ok(LineStyle::Solid),
            "--" | "dashed" => Ok(LineStyle::Dashed),
            ":" | "dotted" => Ok(LineStyle::Dotted),
            "" | "none" => Ok(LineStyle::None),
            other => Err(PlotError::InvalidInput(format!(
                "unknown line style '{other}'"
            ))),
        }
    }
}

/// Line and marker color, using the matplotlib single-letter palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotColor {
    #[default]
    Blue,
    Green,
    Red,
    Cyan,
    Magenta,
    Yellow,
    Black,
}

impl PlotColor {
    pub fn rgb(self) -> RGBColor {
        match self {
            PlotColor::Blue => RGBColor(0, 0, 255),
            PlotColor::Green => RGBColor(0, 128, 0),
            PlotColor::Red => RGBColor(255, 0, 0),
            PlotColor::Cyan => RGBColor(0, 191, 191),
            PlotColor::Magenta => RGBColor(191, 0, 191),
            PlotColor::Yellow => RGBColor(191, 191, 0),
            PlotColor::Black => RGBColor(0, 0, 0),
        }
    }
}

impl FromStr for PlotColor {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" | "blue" => Ok(PlotColor::Blue),
            "g" | "green" => Ok(PlotColor::Green),
            "r" | "red" => Ok(PlotColor::Red),
            "c" | "cyan" => Ok(PlotColor::Cyan),
            "m" | "magenta" => Ok(PlotColor::Magenta),
            "y" | "yellow" => Ok(PlotColor::Yellow),
            "k" | "black" => Ok(PlotColor::Black),
            other => Err(PlotError::InvalidInput(format!("unknown color '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlotStyle {
    pub marker: Marker,
    pub line_style: LineStyle,
    pub color: PlotColor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotText {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Draw background grid lines at the major ticks.
    pub grid: bool,
}

impl Default for PlotText {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
            grid: true,
        }
    }
}

/// Everything needed to turn a series into a png on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub style: PlotStyle,
    pub text: PlotText,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub line_width: u32,
    pub marker_size: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            style: PlotStyle::default(),
            text: PlotText::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
            line_width: LINE_WIDTH,
            marker_size: MARKER_SIZE,
        }
    }
}

impl PlotConfig {
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PlotError> {
        if self.width == 0 || self.height == 0 {
            return Err(PlotError::InvalidInput(format!(
                "figure size {}x{} has no area",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
