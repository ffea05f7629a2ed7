//! Interactive surface that builds a Plotly figure directly, without the
//! recording layer.

use serde_json::{json, Value};
use std::path::Path;

use super::{check_parallel, text_box, ElementId, PixelRect, PlotBackend, TextProps, Viewport};
use crate::coords::NativePoint;
use crate::error::BackendError;
use crate::export::ExportFormat;
use crate::interactive::calibration::{self, MarkerCalibration};
use crate::interactive::figure::Figure;
use crate::projection::AxisLimits;
use crate::style::{FontWeight, GradientStyle, MarkerStyle, PathStyle, PolygonStyle, Rgba};

#[derive(Debug, Clone)]
enum Item {
    Trace(Value),
    Annotation(Value),
    Shape(Value),
}

#[derive(Debug, Clone)]
struct Element {
    id: ElementId,
    zorder: i32,
    item: Item,
    extent: Option<PixelRect>,
}

fn css(color: &str, alpha: f64) -> Result<String, BackendError> {
    Rgba::parse(color)
        .map(|c| c.to_css(alpha))
        .map_err(|e| BackendError::Raster(e.to_string()))
}

#[derive(Debug)]
pub struct PlotlyBackend {
    viewport: Option<Viewport>,
    calibration: MarkerCalibration,
    elements: Vec<Element>,
    next_id: ElementId,
    axes_background: String,
    figure_background: String,
    title: Option<String>,
}

impl Default for PlotlyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotlyBackend {
    pub fn new() -> Self {
        Self {
            viewport: None,
            calibration: MarkerCalibration::new(crate::interactive::recorder::DEFAULT_RESOLUTION),
            elements: Vec::new(),
            next_id: 1,
            axes_background: "#000000".into(),
            figure_background: "#000000".into(),
            title: None,
        }
    }

    fn viewport(&self) -> Result<&Viewport, BackendError> {
        self.viewport.as_ref().ok_or(BackendError::NoFigure)
    }

    fn push(&mut self, zorder: i32, item: Item, extent: Option<PixelRect>) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.push(Element {
            id,
            zorder,
            item,
            extent,
        });
        id
    }

    /// Assemble the figure from the drawn elements in z-order.
    pub fn figure(&self) -> Result<Figure, BackendError> {
        let vp = self.viewport()?;
        let mut figure = Figure::new();
        let (width, height) = (
            calibration::VIEWPORT_PX as u32,
            (calibration::VIEWPORT_PX * vp.height as f64 / vp.width.max(1) as f64) as u32,
        );
        figure.update_layout(json!({
            "width": width,
            "height": height,
            "plot_bgcolor": self.axes_background,
            "paper_bgcolor": self.figure_background,
            "xaxis": {
                "range": [vp.limits.x_min, vp.limits.x_max],
                "visible": !vp.axis_off,
                "showgrid": false,
                "zeroline": false,
            },
            "yaxis": {
                "range": [vp.limits.y_min, vp.limits.y_max],
                "visible": !vp.axis_off,
                "showgrid": false,
                "zeroline": false,
            },
            "hovermode": "closest",
            "dragmode": "pan",
            "showlegend": false,
            "margin": {"l": 10, "r": 10, "t": 30, "b": 10},
        }));
        if vp.aspect_equal {
            figure.update_layout(json!({"yaxis": {"scaleanchor": "x", "scaleratio": 1}}));
        }
        if let Some(title) = &self.title {
            figure.update_layout(json!({"title": {"text": title, "font": {"color": "#ffffff"}}}));
        }

        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.zorder);
        for element in ordered {
            match &element.item {
                Item::Trace(t) => figure.add_trace(t.clone()),
                Item::Annotation(a) => figure.add_annotation(a.clone()),
                Item::Shape(s) => figure.add_shape(s.clone()),
            }
        }
        Ok(figure)
    }
}

impl PlotBackend for PlotlyBackend {
    fn name(&self) -> &'static str {
        "plotly"
    }

    fn create_figure(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Raster(format!("invalid figure size {width}x{height}")));
        }
        self.viewport = Some(Viewport::new(width, height));
        self.calibration = MarkerCalibration::new(width);
        self.elements.clear();
        Ok(())
    }

    fn create_subplot(&mut self) -> Result<(), BackendError> {
        let vp = *self.viewport()?;
        self.viewport = Some(Viewport::new(vp.width, vp.height));
        self.elements.clear();
        Ok(())
    }

    fn set_xlim(&mut self, left: f64, right: f64) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.limits.x_min = left;
            vp.limits.x_max = right;
        }
    }

    fn set_ylim(&mut self, bottom: f64, top: f64) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.limits.y_min = bottom;
            vp.limits.y_max = top;
        }
    }

    fn limits(&self) -> AxisLimits {
        self.viewport
            .map(|vp| vp.limits)
            .unwrap_or(Viewport::new(1, 1).limits)
    }

    fn set_background_color(&mut self, axes: &str, figure: &str) -> Result<(), BackendError> {
        self.axes_background = css(axes, 1.0)?;
        self.figure_background = css(figure, 1.0)?;
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn scatter(
        &mut self,
        points: &[NativePoint],
        sizes: &[f64],
        colors: &[String],
        style: &MarkerStyle,
    ) -> Result<ElementId, BackendError> {
        self.viewport()?;
        check_parallel("scatter sizes", points.len(), sizes.len())?;
        check_parallel("scatter colors", points.len(), colors.len())?;
        let colors = colors
            .iter()
            .map(|c| css(c, 1.0))
            .collect::<Result<Vec<_>, _>>()?;
        let diameters: Vec<f64> = sizes
            .iter()
            .map(|s| self.calibration.marker_diameter(*s))
            .collect();
        let mut marker = json!({
            "size": diameters,
            "color": colors,
            "opacity": style.alpha,
            "symbol": calibration::plotly_symbol(style.symbol),
        });
        if let Some(edge) = &style.edge_color {
            marker["line"] = json!({
                "color": css(edge, 1.0)?,
                "width": calibration::edge_width(style.edge_width),
            });
        }
        let trace = json!({
            "type": "scattergl",
            "mode": "markers",
            "x": points.iter().map(|p| p.x).collect::<Vec<_>>(),
            "y": points.iter().map(|p| p.y).collect::<Vec<_>>(),
            "marker": marker,
            "hoverinfo": "skip",
        });
        Ok(self.push(style.zorder, Item::Trace(trace), None))
    }

    fn plot_lines(
        &mut self,
        path: &[NativePoint],
        style: &PathStyle,
    ) -> Result<ElementId, BackendError> {
        self.viewport()?;
        let trace = json!({
            "type": "scatter",
            "mode": "lines",
            "x": path.iter().map(|p| p.x).collect::<Vec<_>>(),
            "y": path.iter().map(|p| p.y).collect::<Vec<_>>(),
            "line": {
                "color": css(&style.color, style.alpha)?,
                "width": calibration::line_width(style.width),
                "dash": calibration::dash(style.style),
            },
            "hoverinfo": "skip",
        });
        Ok(self.push(style.zorder, Item::Trace(trace), None))
    }

    fn add_text(
        &mut self,
        at: NativePoint,
        text: &str,
        props: &TextProps,
    ) -> Result<ElementId, BackendError> {
        let vp = *self.viewport()?;
        let (px, py) = vp.to_pixel(at);
        let rect = text_box(px, py, text, props, super::PX_PER_POINT);
        let (yanchor, xanchor) = calibration::annotation_anchor(props.va, props.ha);
        let label = if matches!(props.font_weight, FontWeight::Bold | FontWeight::Heavy) {
            format!("<b>{text}</b>")
        } else {
            text.to_string()
        };
        let annotation = json!({
            "x": at.x,
            "y": at.y,
            "xref": "x",
            "yref": "y",
            "text": label,
            "showarrow": false,
            "xanchor": xanchor,
            "yanchor": yanchor,
            "font": {
                "size": calibration::font_size(props.font_size),
                "color": css(&props.font_color, 1.0)?,
                "family": props.font_name,
            },
            "opacity": props.alpha,
        });
        Ok(self.push(props.zorder, Item::Annotation(annotation), Some(rect)))
    }

    fn add_polygon(
        &mut self,
        points: &[NativePoint],
        style: &PolygonStyle,
    ) -> Result<ElementId, BackendError> {
        self.viewport()?;
        let mut ring = points.to_vec();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        let mut trace = json!({
            "type": "scatter",
            "mode": "lines",
            "x": ring.iter().map(|p| p.x).collect::<Vec<_>>(),
            "y": ring.iter().map(|p| p.y).collect::<Vec<_>>(),
            "line": {
                "color": css(&style.edge_color, style.alpha)?,
                "width": calibration::line_width(style.edge_width),
                "dash": calibration::dash(style.line_style),
            },
            "hoverinfo": "skip",
        });
        if let Some(fill) = &style.fill_color {
            trace["fill"] = json!("toself");
            trace["fillcolor"] = json!(css(fill, style.alpha)?);
        }
        Ok(self.push(style.zorder, Item::Trace(trace), None))
    }

    fn add_gradient(
        &mut self,
        gradient: &GradientStyle,
        zorder: i32,
    ) -> Result<ElementId, BackendError> {
        self.viewport()?;
        // Flat fill in the outermost stop color. The replayed figure samples
        // the full gradient as a heatmap.
        let color = gradient
            .stops
            .last()
            .map(|(_, c)| c.as_str())
            .unwrap_or("#000000");
        let shape = json!({
            "type": "rect",
            "xref": "paper",
            "yref": "paper",
            "x0": 0, "x1": 1, "y0": 0, "y1": 1,
            "layer": "below",
            "line": {"width": 0},
            "fillcolor": css(color, 1.0)?,
        });
        Ok(self.push(zorder, Item::Shape(shape), None))
    }

    fn remove(&mut self, id: ElementId) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.elements.len() != before
    }

    fn text_extent(&self, id: ElementId) -> Option<PixelRect> {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.extent)
    }

    fn plot_area(&self) -> PixelRect {
        self.viewport
            .map(|vp| vp.plot_area())
            .unwrap_or(PixelRect::new(0.0, 0.0, 0.0, 0.0))
    }

    fn set_axis_off(&mut self) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.axis_off = true;
        }
    }

    fn set_aspect_equal(&mut self) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.aspect_equal = true;
        }
    }

    fn supports(&self, format: ExportFormat) -> bool {
        format == ExportFormat::Html
    }

    fn fallback_format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn export(&self, path: &Path, format: ExportFormat) -> Result<(), BackendError> {
        if format != ExportFormat::Html {
            return Err(BackendError::UnsupportedFormat {
                backend: "plotly",
                format: format.extension(),
            });
        }
        let title = self.title.as_deref().unwrap_or("Sky chart");
        self.figure()?.write_html(path, title)
    }

    fn close(&mut self) {
        self.viewport = None;
        self.elements.clear();
        self.title = None;
    }
}
