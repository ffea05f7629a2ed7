//! Sky charts in equatorial coordinates.
//!
//! A chart is built from a [`ChartConfig`]: a map of an RA/Dec window, a
//! zenith view for an observer, a horizon strip or an optic field of view.
//! [`SkyPlot`] offers the high-level calls (stars, constellations, DSOs,
//! planets, labels, borders) and reduces every one of them to the primitive
//! operations of [`chart::ChartPrimitives`].
//!
//! The default [`StaticChart`] draws onto a named backend (SVG, optionally
//! rasterized). [`SkyPlot::interactive`] wraps it in a [`Recording`] so the
//! same calls are also replayed into an interactive Plotly figure:
//!
//! ```no_run
//! use skychart::{ChartConfig, SkyExtent, SkyPlot, StarFilter};
//! use skychart::projection::MapProjection;
//!
//! # fn main() -> skychart::Result<()> {
//! let extent = SkyExtent::new(60.0, 120.0, -10.0, 30.0)?;
//! let config = ChartConfig::map(MapProjection::PlateCarree, extent);
//! let mut plot = SkyPlot::interactive(&config)?;
//! plot.stars(StarFilter::brighter_than(5.0))?;
//! plot.constellations()?;
//! plot.export_html(std::path::Path::new("orion.html"))?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod coords;
pub mod error;
pub mod export;
pub mod interactive;
pub mod projection;
pub mod style;

pub use backend::{backend_names, create_backend, register_backend, PlotBackend};
pub use catalog::{Catalog, Dso, Planet, Star, StarFilter};
pub use chart::{ChartPrimitives, SkyMarker, SkyPlot, StaticChart};
pub use config::{ChartConfig, ChartSpec};
pub use coords::{Equatorial, NativePoint};
pub use error::{ChartError, Result};
pub use export::{ExportFormat, ExportReport};
pub use interactive::{DrawingRecorder, Figure, PlotlyRenderer, Recording};
pub use projection::{ChartKind, Observer, Projector, SkyExtent};
pub use style::PlotStyle;
