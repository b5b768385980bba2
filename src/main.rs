use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod export;
mod perf;
mod perf_csv;
mod perf_data;
mod perf_floyd;
mod plot;
mod viewer;

use crate::config::{LineStyle, Marker, PlotColor, PlotConfig, PlotStyle, PlotText};
use crate::error::PlotError;
use crate::perf::Series;
use crate::viewer::{NoViewer, SystemViewer, Viewer};

#[derive(Debug, StructOpt)]
#[structopt(name = "speedup-plot", about = "Plot parallel speedup against thread count")]
struct Opt {
    #[structopt(flatten)]
    plot: PlotOpt,

    #[structopt(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, StructOpt)]
struct PlotOpt {
    /// Where to write the png
    #[structopt(short, long, parse(from_os_str), default_value = "speedup.png")]
    output: PathBuf,

    /// Plot a `threads,speedup` csv instead of the recorded measurements
    #[structopt(short, long, parse(from_os_str))]
    input: Option<PathBuf>,

    #[structopt(long, default_value = "Speedup vs Number of Threads")]
    title: String,

    #[structopt(long, default_value = "Number of Threads")]
    x_label: String,

    #[structopt(long, default_value = "Speedup (Linear / Parallel)")]
    y_label: String,

    #[structopt(long)]
    no_grid: bool,

    /// circle (o), square (s), triangle (^), cross (x) or none
    #[structopt(long, default_value = "circle")]
    marker: Marker,

    /// solid (-), dashed (--), dotted (:) or none
    #[structopt(long, default_value = "solid")]
    line_style: LineStyle,

    /// b, g, r, c, m, y, k or the full color name
    #[structopt(long, default_value = "blue")]
    color: PlotColor,

    #[structopt(long, default_value = "640")]
    width: u32,

    #[structopt(long, default_value = "480")]
    height: u32,

    /// Only write the file, never open a viewer
    #[structopt(long)]
    no_show: bool,
}

impl PlotOpt {
    fn to_config(&self) -> PlotConfig {
        PlotConfig {
            style: PlotStyle {
                marker: self.marker,
                line_style: self.line_style,
                color: self.color,
            },
            text: PlotText {
                title: self.title.clone(),
                x_label: self.x_label.clone(),
                y_label: self.y_label.clone(),
                grid: !self.no_grid,
            },
            width: self.width,
            height: self.height,
            ..PlotConfig::default()
        }
        .with_output(&self.output)
    }
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Time Floyd-Warshall sequentially and with 1..=threads threads, then plot the speedups
    Measure {
        #[structopt(long, default_value = "1000")]
        nodes: usize,

        /// Chance that any ordered pair of nodes is joined by an edge
        #[structopt(long, default_value = "0.5")]
        probability: f64,

        #[structopt(long, default_value = "8")]
        threads: u32,

        /// Seed for the graph generator; random when omitted
        #[structopt(long)]
        seed: Option<u64>,

        /// Also save the measured series as csv
        #[structopt(long, parse(from_os_str))]
        csv: Option<PathBuf>,
    },
}

fn setup_logger() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn measure(
    nodes: usize,
    probability: f64,
    threads: u32,
    seed: Option<u64>,
) -> Result<Series, PlotError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(PlotError::InvalidInput(format!(
            "probability {probability} is outside 0..=1"
        )));
    }

    let fits = nodes
        .checked_mul(nodes)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<u32>()))
        .is_some_and(|bytes| bytes <= isize::MAX as usize);
    if !fits {
        return Err(PlotError::InvalidInput(format!(
            "{nodes} nodes do not fit in an adjacency matrix"
        )));
    }

    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    tracing::info!("generating graph with {} nodes", nodes);
    let graph = perf_floyd::Graph::random(nodes, probability, &mut rng);

    perf_floyd::measure_speedup(&graph, threads)
}

fn run(opt: Opt) -> Result<(), Box<dyn Error>> {
    let config = opt.plot.to_config();

    let series = match &opt.cmd {
        Some(Command::Measure {
            nodes,
            probability,
            threads,
            seed,
            csv,
        }) => {
            let series = measure(*nodes, *probability, *threads, *seed)?;
            if let Some(csv) = csv {
                perf_csv::write_series(csv, &series)?;
                tracing::info!("saved measurements to {}", csv.display());
            }
            series
        }
        None => match &opt.plot.input {
            Some(input) => perf_csv::read_series(input)?,
            None => perf_data::recorded_series(),
        },
    };

    tracing::info!("plotting {} points", series.len());

    let viewer: &dyn Viewer = if opt.plot.no_show {
        &NoViewer
    } else {
        &SystemViewer
    };
    viewer::present(&series, &config, viewer)?;

    Ok(())
}

fn main() {
    setup_logger();

    if let Err(e) = run(Opt::from_args()) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
