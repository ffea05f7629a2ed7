//! Low-level drawing surfaces.
//!
//! A [`PlotBackend`] draws primitives in a chart's native coordinates onto a
//! single set of axes. Two surfaces are built in: [`svg::SvgBackend`], a
//! static SVG document that can be rasterized to PNG/JPEG, and
//! [`plotly::PlotlyBackend`], which writes an interactive figure directly.
//! Backends are created by name through [`registry`].

pub mod plotly;
pub mod registry;
pub mod svg;

use log::info;
use std::path::{Path, PathBuf};

use crate::coords::NativePoint;
use crate::error::BackendError;
use crate::export::ExportFormat;
use crate::projection::AxisLimits;
use crate::style::{
    AnchorPoint, FontWeight, GradientStyle, HAlign, LabelStyle, MarkerStyle, PathStyle,
    PolygonStyle, VAlign,
};

pub use registry::{backend_names, create_backend, register_backend, BackendRegistry};

/// Handle to a drawn element.
pub type ElementId = u64;

/// Static surface pixels per typographic point: 200 DPI, 2× supersampled
/// and downscaled.
pub const PX_PER_POINT: f64 = (200.0 / 72.0) * 0.5;

/// Axis-aligned rectangle in figure pixels, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PixelRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    pub fn contains(&self, other: &PixelRect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }
}

/// Resolved text properties for a single label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    pub font_size: f64,
    pub font_color: String,
    pub font_weight: FontWeight,
    pub font_name: String,
    pub alpha: f64,
    pub ha: HAlign,
    pub va: VAlign,
    /// Pixel gap between the anchored point and the text box.
    pub offset: f64,
    pub zorder: i32,
}

impl TextProps {
    pub fn from_label(style: &LabelStyle, anchor: AnchorPoint) -> Self {
        let (va, ha) = anchor.alignment();
        Self {
            font_size: style.font_size,
            font_color: style.font_color.clone(),
            font_weight: style.font_weight,
            font_name: style.font_name.clone(),
            alpha: style.font_alpha,
            ha,
            va,
            offset: style.offset,
            zorder: style.zorder,
        }
    }
}

/// Estimated pixel box of `text` aligned around the pixel `(px, py)`.
pub fn text_box(px: f64, py: f64, text: &str, props: &TextProps, px_per_point: f64) -> PixelRect {
    let size = props.font_size * px_per_point;
    let weight = match props.font_weight {
        FontWeight::Bold | FontWeight::Heavy => 0.65,
        _ => 0.6,
    };
    let width = text.chars().count() as f64 * size * weight;
    let height = size * 1.2;

    let x0 = match props.ha {
        HAlign::Left => px + props.offset,
        HAlign::Center => px - width / 2.0,
        HAlign::Right => px - props.offset - width,
    };
    let y0 = match props.va {
        VAlign::Top => py + props.offset,
        VAlign::Center => py - height / 2.0,
        VAlign::Bottom | VAlign::Baseline => py - props.offset - height,
    };
    PixelRect::new(x0, y0, x0 + width, y0 + height)
}

/// Mapping from native coordinates to figure pixels for one set of axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub limits: AxisLimits,
    pub axis_off: bool,
    pub aspect_equal: bool,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            limits: AxisLimits {
                x_min: 0.0,
                x_max: 1.0,
                y_min: 0.0,
                y_max: 1.0,
            },
            axis_off: false,
            aspect_equal: false,
        }
    }

    /// Pixel rectangle occupied by the axes.
    pub fn plot_area(&self) -> PixelRect {
        let (w, h) = (self.width as f64, self.height as f64);
        let margin = if self.axis_off { 0.0 } else { 0.06 * w.min(h) };
        let (mut aw, mut ah) = (w - 2.0 * margin, h - 2.0 * margin);
        if self.aspect_equal {
            let data_w = self.limits.width();
            let data_h = self.limits.height();
            if data_w > 0.0 && data_h > 0.0 {
                let ratio = data_w / data_h;
                if aw / ah > ratio {
                    aw = ah * ratio;
                } else {
                    ah = aw / ratio;
                }
            }
        }
        let x0 = (w - aw) / 2.0;
        let y0 = (h - ah) / 2.0;
        PixelRect::new(x0, y0, x0 + aw, y0 + ah)
    }

    pub fn to_pixel(&self, p: NativePoint) -> (f64, f64) {
        let area = self.plot_area();
        let l = &self.limits;
        let fx = (p.x - l.x_min) / (l.x_max - l.x_min);
        let fy = (p.y - l.y_min) / (l.y_max - l.y_min);
        (area.x0 + fx * area.width(), area.y1 - fy * area.height())
    }
}

/// A drawing surface for one set of axes.
pub trait PlotBackend {
    fn name(&self) -> &'static str;

    fn create_figure(&mut self, width: u32, height: u32) -> Result<(), BackendError>;

    /// Reset the single axes of the current figure.
    fn create_subplot(&mut self) -> Result<(), BackendError>;

    /// `left` may exceed `right` for an inverted axis.
    fn set_xlim(&mut self, left: f64, right: f64);

    fn set_ylim(&mut self, bottom: f64, top: f64);

    fn set_extent(&mut self, limits: AxisLimits) {
        self.set_xlim(limits.x_min, limits.x_max);
        self.set_ylim(limits.y_min, limits.y_max);
    }

    fn limits(&self) -> AxisLimits;

    fn set_background_color(&mut self, axes: &str, figure: &str) -> Result<(), BackendError>;

    fn set_title(&mut self, title: &str);

    fn scatter(
        &mut self,
        points: &[NativePoint],
        sizes: &[f64],
        colors: &[String],
        style: &MarkerStyle,
    ) -> Result<ElementId, BackendError>;

    fn plot_lines(&mut self, path: &[NativePoint], style: &PathStyle)
        -> Result<ElementId, BackendError>;

    fn add_text(
        &mut self,
        at: NativePoint,
        text: &str,
        props: &TextProps,
    ) -> Result<ElementId, BackendError>;

    fn add_polygon(
        &mut self,
        points: &[NativePoint],
        style: &PolygonStyle,
    ) -> Result<ElementId, BackendError>;

    fn add_gradient(
        &mut self,
        gradient: &GradientStyle,
        zorder: i32,
    ) -> Result<ElementId, BackendError>;

    /// Remove a drawn element; false if it does not exist.
    fn remove(&mut self, id: ElementId) -> bool;

    /// Pixel extent of a drawn text element.
    fn text_extent(&self, id: ElementId) -> Option<PixelRect>;

    fn plot_area(&self) -> PixelRect;

    fn set_axis_off(&mut self);

    fn set_aspect_equal(&mut self);

    fn supports(&self, format: ExportFormat) -> bool;

    /// Format written when a requested one is unavailable.
    fn fallback_format(&self) -> ExportFormat;

    fn export(&self, path: &Path, format: ExportFormat) -> Result<(), BackendError>;

    /// Write the figure to a temporary file for viewing.
    fn show(&self) -> Result<PathBuf, BackendError> {
        let format = self.fallback_format();
        let path = std::env::temp_dir().join(format!(
            "skychart-{}-{}.{}",
            self.name(),
            std::process::id(),
            format.extension()
        ));
        self.export(&path, format)?;
        info!("chart written to {}", path.display());
        Ok(path)
    }

    fn close(&mut self);
}

fn check_parallel(
    what: &'static str,
    left: usize,
    right: usize,
) -> Result<(), BackendError> {
    if left != right {
        return Err(BackendError::LengthMismatch { what, left, right });
    }
    Ok(())
}
