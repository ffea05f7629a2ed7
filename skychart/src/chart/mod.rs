//! Static plotting pipeline.
//!
//! [`ChartPrimitives`] is the set of primitive drawing operations every
//! high-level call in [`SkyPlot`] reduces to. [`StaticChart`] implements it
//! over a [`PlotBackend`](crate::backend::PlotBackend); the recording overlay
//! in [`crate::interactive`] wraps any implementation.

pub mod labels;
pub mod plot;
pub mod static_chart;

use std::path::Path;

use crate::backend::{ElementId, PixelRect, TextProps};
use crate::catalog::{Dso, Planet, Star};
use crate::coords::{Equatorial, NativePoint};
use crate::error::Result;
use crate::export::{ExportFormat, ExportReport};
use crate::projection::{AxisLimits, Projector};
use crate::style::{
    AnchorPoint, FontWeight, GradientStyle, LabelStyle, MarkerStyle, PathStyle, PolygonStyle,
};

pub use labels::LabelSpace;
pub use plot::SkyPlot;
pub use static_chart::StaticChart;

/// Handle to a drawn text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub ElementId);

/// Geometry and scene settings fixed when a chart is created.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub projector: Projector,
    /// Axis limits in display order.
    pub limits: AxisLimits,
    pub resolution: u32,
    pub background_color: String,
    pub figure_background_color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlottedStar {
    pub star: Star,
    pub point: NativePoint,
    pub size: f64,
    pub color: String,
}

/// What a marker stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkedObject {
    Dso(Dso),
    Planet(Planet),
    Custom,
}

/// One marker request in sky coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyMarker {
    pub position: Equatorial,
    /// Area in points².
    pub size: f64,
    pub color: Option<String>,
    pub object: MarkedObject,
}

impl SkyMarker {
    pub fn new(position: Equatorial, size: f64) -> Self {
        Self {
            position,
            size,
            color: None,
            object: MarkedObject::Custom,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlottedMarker {
    pub marker: SkyMarker,
    pub point: NativePoint,
    pub gid: String,
}

/// A constellation figure with segment endpoints resolved from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstellationLines {
    pub iau_id: String,
    pub name: String,
    pub segments: Vec<(Equatorial, Equatorial)>,
}

/// Everything the static pipeline has plotted, in plotting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlottedObjects {
    pub stars: Vec<PlottedStar>,
    pub markers: Vec<PlottedMarker>,
    pub constellations: Vec<ConstellationLines>,
}

/// Bottom-of-chart table of column headers and values.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoTable {
    pub columns: Vec<String>,
    pub values: Vec<String>,
    /// Relative column widths.
    pub widths: Vec<f64>,
}

/// Primitive drawing operations in sky coordinates.
///
/// Implementations project with [`ChartFrame::projector`] and skip points
/// that do not project. Errors from the drawing surface propagate.
pub trait ChartPrimitives {
    fn frame(&self) -> &ChartFrame;

    fn objects(&self) -> &PlottedObjects;

    /// Pixel rectangle labels must stay inside.
    fn plot_area(&self) -> PixelRect;

    /// Plot stars with per-star marker areas; returns how many were drawn.
    fn scatter_stars(&mut self, stars: &[Star], sizes: &[f64], style: &MarkerStyle)
        -> Result<usize>;

    fn scatter_markers(
        &mut self,
        markers: &[SkyMarker],
        style: &MarkerStyle,
        gid: &str,
    ) -> Result<usize>;

    fn polygon(&mut self, points: &[Equatorial], style: &PolygonStyle, gid: &str) -> Result<()>;

    /// Draw a label. `None` when the anchor point does not project.
    fn text(
        &mut self,
        at: Equatorial,
        text: &str,
        props: &TextProps,
        gid: &str,
    ) -> Result<Option<LabelId>>;

    /// Remove a drawn label; false if it was already removed.
    fn remove_text(&mut self, id: LabelId) -> bool;

    fn label_extent(&self, id: LabelId) -> Option<PixelRect>;

    /// Polyline, split into finite runs.
    fn line(&mut self, points: &[Equatorial], style: &PathStyle, gid: &str) -> Result<()>;

    /// Constellation figures; returns the number of segments drawn.
    fn constellations(&mut self, lines: &[ConstellationLines], style: &PathStyle) -> Result<usize>;

    fn gradient_background(&mut self, gradient: &GradientStyle) -> Result<()>;

    fn info_table(&mut self, table: &InfoTable, style: &LabelStyle) -> Result<()>;

    /// Chart outline: a circle on zenith and optic charts, the axes frame
    /// otherwise.
    fn border(&mut self, style: &PathStyle) -> Result<()>;

    fn supports_format(&self, format: ExportFormat) -> bool;

    /// Write the chart; the extension picks the format, falling back with a
    /// warning when it is unavailable.
    fn export(&mut self, path: &Path) -> Result<ExportReport>;
}

/// Closed ring of native points approximating the circle inscribed in the
/// axis limits.
pub fn border_ring(limits: &AxisLimits, steps: usize) -> Vec<NativePoint> {
    let center = limits.center();
    let radius = limits.width().min(limits.height()) / 2.0;
    (0..steps)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / steps as f64;
            NativePoint::new(center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .collect()
}

/// Compass labels just inside the border circle. East is on the left of a
/// sky-facing chart.
pub fn compass_points(limits: &AxisLimits) -> [(&'static str, NativePoint); 4] {
    let c = limits.center();
    let r = limits.width().min(limits.height()) / 2.0 * 0.94;
    let east = if limits.x_inverted() { 1.0 } else { -1.0 };
    [
        ("N", NativePoint::new(c.x, c.y + r)),
        ("E", NativePoint::new(c.x + east * r, c.y)),
        ("S", NativePoint::new(c.x, c.y - r)),
        ("W", NativePoint::new(c.x - east * r, c.y)),
    ]
}

pub const BORDER_STEPS: usize = 180;

/// Label style of a reference line's name, colored like the line.
pub fn line_label_style(line: &PathStyle) -> LabelStyle {
    LabelStyle {
        font_size: 22.0,
        font_color: line.color.clone(),
        font_alpha: line.alpha,
        anchor_point: AnchorPoint::Top,
        anchor_fallbacks: vec![AnchorPoint::Bottom],
        zorder: line.zorder,
        ..LabelStyle::default()
    }
}

/// Label style of the compass letters, colored like the border.
pub fn compass_style(border: &PathStyle) -> LabelStyle {
    LabelStyle {
        font_size: 32.0,
        font_color: border.color.clone(),
        font_weight: FontWeight::Bold,
        font_alpha: border.alpha,
        anchor_point: AnchorPoint::Center,
        anchor_fallbacks: Vec::new(),
        offset: 0.0,
        zorder: border.zorder,
        ..LabelStyle::default()
    }
}

/// Polygon style for an unfilled outline drawn with a path style.
pub fn outline_style(path: &PathStyle) -> PolygonStyle {
    PolygonStyle {
        fill_color: None,
        edge_color: path.color.clone(),
        edge_width: path.width,
        line_style: path.style,
        alpha: path.alpha,
        zorder: path.zorder,
    }
}
