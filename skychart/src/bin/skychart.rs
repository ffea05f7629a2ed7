//! Render a sky chart from the command line.
//!
//! Usage:
//! ```text
//! cargo run --bin skychart -- --ra-min 60 --ra-max 120 --dec-min -10 --dec-max 30 \
//!     --magnitude "< 5" --output orion.html --interactive
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use skychart::chart::ChartPrimitives;
use skychart::projection::MapProjection;
use skychart::{backend_names, ChartConfig, SkyExtent, SkyPlot, StarFilter};

/// Command line arguments for the chart renderer
#[derive(Parser, Debug)]
#[command(version, about = "Render a star chart to SVG, PNG, JPEG or interactive HTML")]
struct Args {
    /// Lower right ascension bound in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    ra_min: f64,

    /// Upper right ascension bound in degrees; below ra-min wraps through 0h
    #[arg(long, default_value_t = 360.0, allow_negative_numbers = true)]
    ra_max: f64,

    #[arg(long, default_value_t = -90.0, allow_negative_numbers = true)]
    dec_min: f64,

    #[arg(long, default_value_t = 90.0, allow_negative_numbers = true)]
    dec_max: f64,

    /// Star filter, e.g. "< 5", ">= 2" or "all"
    #[arg(short, long, default_value = "< 5")]
    magnitude: StarFilter,

    /// Map projection (plate_carree, miller, mercator, mollweide, stereographic, orthographic)
    #[arg(short, long, default_value_t = MapProjection::PlateCarree)]
    projection: MapProjection,

    /// Output file; the extension selects the format
    #[arg(short, long, default_value = "chart.svg")]
    output: PathBuf,

    /// JSON chart config; overrides the extent and projection flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON style patch merged over the configured style
    #[arg(long)]
    style: Option<String>,

    /// Static backend name
    #[arg(long)]
    backend: Option<String>,

    /// Record the chart and export interactive HTML
    #[arg(short, long)]
    interactive: bool,

    /// Skip star, DSO and constellation labels
    #[arg(long)]
    no_labels: bool,
}

fn load_config(args: &Args) -> Result<ChartConfig> {
    let mut config = match &args.config {
        Some(path) => ChartConfig::from_json_file(path)
            .with_context(|| format!("loading chart config {}", path.display()))?,
        None => {
            let extent = SkyExtent::new(args.ra_min, args.ra_max, args.dec_min, args.dec_max)?;
            ChartConfig::map(args.projection, extent)
        }
    };
    if let Some(backend) = &args.backend {
        config.backend = backend.clone();
    }
    if let Some(style) = &args.style {
        config = config.with_style_overrides(style)?;
    }
    config.validate()?;
    Ok(config)
}

fn draw<P: ChartPrimitives>(plot: &mut SkyPlot<P>, args: &Args) -> Result<()> {
    let labels = !args.no_labels;
    plot.constellations()?;
    let stars = plot.stars(args.magnitude)?;
    plot.dsos(None, labels)?;
    plot.ecliptic()?;
    plot.celestial_equator()?;
    if labels {
        plot.star_labels(2.5)?;
        plot.constellation_labels()?;
    }
    plot.border()?;
    info!("plotted {stars} stars");

    let report = plot.export(&args.output)?;
    info!(
        "wrote {} ({}{})",
        report.path.display(),
        report.format,
        if report.fell_back { ", fallback" } else { "" }
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        "backend '{}' (available: {})",
        config.backend,
        backend_names().join(", ")
    );

    if args.interactive {
        let mut plot = SkyPlot::interactive(&config)?;
        draw(&mut plot, &args)?;
    } else {
        let mut plot = SkyPlot::new(&config)?;
        draw(&mut plot, &args)?;
    }
    Ok(())
}
