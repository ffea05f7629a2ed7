//! Static SVG surface, rasterized with resvg for PNG/JPEG output.

use std::fmt::Write as _;
use std::path::Path;

use super::{
    check_parallel, text_box, ElementId, PixelRect, PlotBackend, TextProps, Viewport, PX_PER_POINT,
};
use crate::coords::NativePoint;
use crate::error::BackendError;
use crate::export::ExportFormat;
use crate::interactive::figure::html_escape;
use crate::projection::AxisLimits;
use crate::style::{
    FontWeight, GradientDirection, GradientStyle, HAlign, LineStyle, MarkerStyle, MarkerSymbol,
    PathStyle, PolygonStyle, Rgba,
};

#[derive(Debug, Clone)]
struct Element {
    id: ElementId,
    zorder: i32,
    svg: String,
    extent: Option<PixelRect>,
}

/// SVG document builder for a single set of axes.
#[derive(Debug)]
pub struct SvgBackend {
    viewport: Option<Viewport>,
    elements: Vec<Element>,
    next_id: ElementId,
    axes_background: String,
    figure_background: String,
    title: Option<String>,
}

impl Default for SvgBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// `(fill, opacity)` attributes for a color string.
fn paint(color: &str, alpha: f64) -> Result<(String, f64), BackendError> {
    let rgba = Rgba::parse(color).map_err(|e| BackendError::Raster(e.to_string()))?;
    Ok((rgba.to_hex(), (rgba.opacity() * alpha).clamp(0.0, 1.0)))
}

fn dasharray(style: LineStyle, width: f64) -> String {
    let w = width.max(1.0);
    match style {
        LineStyle::Solid => String::new(),
        LineStyle::Dashed => format!(r#" stroke-dasharray="{} {}""#, 4.0 * w, 2.0 * w),
        LineStyle::Dotted => format!(r#" stroke-dasharray="{} {}""#, w, 1.5 * w),
        LineStyle::DashDot => format!(
            r#" stroke-dasharray="{} {} {} {}""#,
            4.0 * w,
            1.5 * w,
            w,
            1.5 * w
        ),
    }
}

fn polygon_points(cx: f64, cy: f64, r: f64, n: usize, inner: Option<f64>, rotation: f64) -> String {
    let steps = if inner.is_some() { n * 2 } else { n };
    (0..steps)
        .map(|i| {
            let radius = match inner {
                Some(ratio) if i % 2 == 1 => r * ratio,
                _ => r,
            };
            let a = rotation + i as f64 * std::f64::consts::TAU / steps as f64;
            format!("{:.2},{:.2}", cx + radius * a.sin(), cy - radius * a.cos())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One marker glyph. `paint_attrs` carries fill and stroke attributes.
fn marker_svg(symbol: MarkerSymbol, cx: f64, cy: f64, r: f64, paint_attrs: &str) -> String {
    match symbol {
        MarkerSymbol::Square | MarkerSymbol::SquareStripesDiagonal => format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {paint_attrs}/>"#,
            cx - r,
            cy - r,
            2.0 * r,
            2.0 * r
        ),
        MarkerSymbol::Diamond => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 4, None, 0.0)
        ),
        MarkerSymbol::Triangle => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 3, None, 0.0)
        ),
        MarkerSymbol::Pentagon => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 5, None, 0.0)
        ),
        MarkerSymbol::Hexagon => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 6, None, 0.0)
        ),
        MarkerSymbol::Star | MarkerSymbol::Comet => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 5, Some(0.45), 0.0)
        ),
        MarkerSymbol::Star4 => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 4, Some(0.35), 0.0)
        ),
        MarkerSymbol::Star8 => format!(
            r#"<polygon points="{}" {paint_attrs}/>"#,
            polygon_points(cx, cy, r, 8, Some(0.5), 0.0)
        ),
        MarkerSymbol::Plus | MarkerSymbol::Cross => {
            let (dx, dy) = if symbol == MarkerSymbol::Plus {
                (r, 0.0)
            } else {
                (r * 0.707, r * 0.707)
            };
            format!(
                r#"<path d="M{:.2},{:.2} L{:.2},{:.2} M{:.2},{:.2} L{:.2},{:.2}" {paint_attrs}/>"#,
                cx - dx,
                cy - dy,
                cx + dx,
                cy + dy,
                cx + dy,
                cy - dx,
                cx - dy,
                cy + dx
            )
        }
        MarkerSymbol::Ellipse => format!(
            r#"<ellipse cx="{cx:.2}" cy="{cy:.2}" rx="{:.2}" ry="{:.2}" {paint_attrs}/>"#,
            r,
            r * 0.55
        ),
        MarkerSymbol::CircleDot | MarkerSymbol::Sun => format!(
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" {paint_attrs}/><circle cx="{cx:.2}" cy="{cy:.2}" r="{:.2}" {paint_attrs}/>"#,
            r * 0.25
        ),
        MarkerSymbol::CirclePlus | MarkerSymbol::CircleCrosshair => format!(
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" {paint_attrs}/><path d="M{:.2},{cy:.2} L{:.2},{cy:.2} M{cx:.2},{:.2} L{cx:.2},{:.2}" {paint_attrs}/>"#,
            cx - r,
            cx + r,
            cy - r,
            cy + r
        ),
        _ => format!(r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" {paint_attrs}/>"#),
    }
}

impl SvgBackend {
    pub fn new() -> Self {
        Self {
            viewport: None,
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

    fn push(&mut self, zorder: i32, svg: String, extent: Option<PixelRect>) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.push(Element {
            id,
            zorder,
            svg,
            extent,
        });
        id
    }

    fn path_data(&self, points: &[NativePoint]) -> Result<String, BackendError> {
        let vp = self.viewport()?;
        let mut d = String::new();
        for (i, p) in points.iter().enumerate() {
            let (x, y) = vp.to_pixel(*p);
            let _ = write!(d, "{}{x:.2},{y:.2} ", if i == 0 { "M" } else { "L" });
        }
        Ok(d.trim_end().to_string())
    }

    /// Number of drawn elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Render the complete SVG document.
    pub fn to_svg(&self) -> Result<String, BackendError> {
        let vp = self.viewport()?;
        let area = vp.plot_area();
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = vp.width,
            h = vp.height
        );
        let (fig_fill, fig_opacity) = paint(&self.figure_background, 1.0)?;
        let (ax_fill, ax_opacity) = paint(&self.axes_background, 1.0)?;
        let _ = write!(
            svg,
            r#"<rect width="100%" height="100%" fill="{fig_fill}" fill-opacity="{fig_opacity:.3}"/>"#
        );
        let _ = write!(
            svg,
            r#"<defs><clipPath id="plot-area"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
            area.x0,
            area.y0,
            area.width(),
            area.height()
        );
        let _ = write!(
            svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{ax_fill}" fill-opacity="{ax_opacity:.3}"/>"#,
            area.x0,
            area.y0,
            area.width(),
            area.height()
        );

        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.zorder);
        svg.push_str(r#"<g clip-path="url(#plot-area)">"#);
        for element in ordered {
            svg.push_str(&element.svg);
        }
        svg.push_str("</g>");

        if let Some(title) = &self.title {
            let _ = write!(
                svg,
                r##"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{:.1}" fill="#ffffff" text-anchor="middle">{}</text>"##,
                vp.width as f64 / 2.0,
                (area.y0 - 10.0).max(24.0),
                24.0 * PX_PER_POINT,
                html_escape(title)
            );
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    #[cfg(feature = "raster")]
    fn rasterize(&self) -> Result<image::RgbaImage, BackendError> {
        use std::sync::Arc;
        use usvg::fontdb;

        let vp = self.viewport()?;
        let svg = self.to_svg()?;

        let mut fontdb = fontdb::Database::new();
        fontdb.load_system_fonts();
        let mut options = usvg::Options::default();
        options.fontdb = Arc::new(fontdb);

        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| BackendError::Raster(e.to_string()))?;
        let mut pixmap = tiny_skia::Pixmap::new(vp.width, vp.height)
            .ok_or_else(|| BackendError::Raster("zero-sized canvas".into()))?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        let mut out = image::RgbaImage::new(vp.width, vp.height);
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            if let Some(p) = pixmap.pixel(x, y) {
                let c = p.demultiply();
                *pixel = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
            }
        }
        Ok(out)
    }

    #[cfg(feature = "raster")]
    fn write_raster(&self, path: &Path, format: ExportFormat) -> Result<(), BackendError> {
        let img = self.rasterize()?;
        let result = match format {
            ExportFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
                .to_rgb8()
                .save_with_format(path, image::ImageFormat::Jpeg),
            _ => img.save_with_format(path, image::ImageFormat::Png),
        };
        result.map_err(|e| BackendError::Raster(format!("{}: {e}", path.display())))
    }

    #[cfg(not(feature = "raster"))]
    fn write_raster(&self, _path: &Path, _format: ExportFormat) -> Result<(), BackendError> {
        Err(BackendError::RasterUnavailable)
    }
}

impl PlotBackend for SvgBackend {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn create_figure(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Raster(format!("invalid figure size {width}x{height}")));
        }
        self.viewport = Some(Viewport::new(width, height));
        self.elements.clear();
        Ok(())
    }

    fn create_subplot(&mut self) -> Result<(), BackendError> {
        let vp = self.viewport()?;
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
        paint(axes, 1.0)?;
        paint(figure, 1.0)?;
        self.axes_background = axes.to_string();
        self.figure_background = figure.to_string();
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
        check_parallel("scatter sizes", points.len(), sizes.len())?;
        check_parallel("scatter colors", points.len(), colors.len())?;
        let vp = *self.viewport()?;
        let stroke = match &style.edge_color {
            Some(edge) if style.edge_width > 0.0 => {
                let (hex, opacity) = paint(edge, style.alpha)?;
                format!(
                    r#" stroke="{hex}" stroke-opacity="{opacity:.3}" stroke-width="{:.2}""#,
                    style.edge_width * PX_PER_POINT
                )
            }
            _ => String::new(),
        };
        let outline_only = matches!(
            style.symbol,
            MarkerSymbol::Plus | MarkerSymbol::Cross | MarkerSymbol::CircleLine
        );

        let mut group = String::from("<g>");
        for ((p, size), color) in points.iter().zip(sizes).zip(colors) {
            if !p.is_finite() {
                continue;
            }
            let (cx, cy) = vp.to_pixel(*p);
            let r = (size.max(0.0) / std::f64::consts::PI).sqrt() * PX_PER_POINT;
            let (hex, opacity) = paint(color, style.alpha)?;
            let attrs = if outline_only {
                format!(
                    r#"fill="none" stroke="{hex}" stroke-opacity="{opacity:.3}" stroke-width="{:.2}""#,
                    (r / 3.0).max(1.0)
                )
            } else {
                format!(r#"fill="{hex}" fill-opacity="{opacity:.3}"{stroke}"#)
            };
            group.push_str(&marker_svg(style.symbol, cx, cy, r, &attrs));
        }
        group.push_str("</g>");
        Ok(self.push(style.zorder, group, None))
    }

    fn plot_lines(
        &mut self,
        path: &[NativePoint],
        style: &PathStyle,
    ) -> Result<ElementId, BackendError> {
        let d = self.path_data(path)?;
        let (hex, opacity) = paint(&style.color, style.alpha)?;
        let width = style.width * PX_PER_POINT;
        let svg = format!(
            r#"<path d="{d}" fill="none" stroke="{hex}" stroke-opacity="{opacity:.3}" stroke-width="{width:.2}" stroke-linecap="round" stroke-linejoin="round"{}/>"#,
            dasharray(style.style, width)
        );
        Ok(self.push(style.zorder, svg, None))
    }

    fn add_text(
        &mut self,
        at: NativePoint,
        text: &str,
        props: &TextProps,
    ) -> Result<ElementId, BackendError> {
        let vp = *self.viewport()?;
        let (px, py) = vp.to_pixel(at);
        let rect = text_box(px, py, text, props, PX_PER_POINT);
        let (hex, opacity) = paint(&props.font_color, props.alpha)?;
        let (x, anchor) = match props.ha {
            HAlign::Left => (rect.x0, "start"),
            HAlign::Center => ((rect.x0 + rect.x1) / 2.0, "middle"),
            HAlign::Right => (rect.x1, "end"),
        };
        let baseline = rect.y1 - 0.2 * rect.height();
        let weight = match props.font_weight {
            FontWeight::Light => "300",
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
            FontWeight::Heavy => "900",
        };
        let svg = format!(
            r#"<text x="{x:.2}" y="{baseline:.2}" font-family="{}" font-size="{:.1}" font-weight="{weight}" fill="{hex}" fill-opacity="{opacity:.3}" text-anchor="{anchor}">{}</text>"#,
            html_escape(&props.font_name),
            props.font_size * PX_PER_POINT,
            html_escape(text)
        );
        Ok(self.push(props.zorder, svg, Some(rect)))
    }

    fn add_polygon(
        &mut self,
        points: &[NativePoint],
        style: &PolygonStyle,
    ) -> Result<ElementId, BackendError> {
        let d = format!("{} Z", self.path_data(points)?);
        let (edge, edge_opacity) = paint(&style.edge_color, style.alpha)?;
        let fill = match &style.fill_color {
            Some(color) => {
                let (hex, opacity) = paint(color, style.alpha)?;
                format!(r#"fill="{hex}" fill-opacity="{opacity:.3}""#)
            }
            None => r#"fill="none""#.to_string(),
        };
        let width = style.edge_width * PX_PER_POINT;
        let svg = format!(
            r#"<path d="{d}" {fill} stroke="{edge}" stroke-opacity="{edge_opacity:.3}" stroke-width="{width:.2}"{}/>"#,
            dasharray(style.line_style, width)
        );
        Ok(self.push(style.zorder, svg, None))
    }

    fn add_gradient(
        &mut self,
        gradient: &GradientStyle,
        zorder: i32,
    ) -> Result<ElementId, BackendError> {
        let area = self.viewport()?.plot_area();
        let id = self.next_id;
        let def_id = format!("background-gradient-{id}");
        let mut stops = String::new();
        for (offset, color) in &gradient.stops {
            let (hex, opacity) = paint(color, 1.0)?;
            let _ = write!(
                stops,
                r#"<stop offset="{:.4}" stop-color="{hex}" stop-opacity="{opacity:.3}"/>"#,
                offset.clamp(0.0, 1.0)
            );
        }
        let def = match gradient.direction {
            GradientDirection::Linear => format!(
                r#"<linearGradient id="{def_id}" x1="0" y1="1" x2="0" y2="0">{stops}</linearGradient>"#
            ),
            GradientDirection::Radial => format!(
                r#"<radialGradient id="{def_id}" cx="0.5" cy="0.5" r="0.5">{stops}</radialGradient>"#
            ),
        };
        let svg = format!(
            r#"<defs>{def}</defs><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="url(#{def_id})"/>"#,
            area.x0,
            area.y0,
            area.width(),
            area.height()
        );
        Ok(self.push(zorder, svg, None))
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
        match format {
            ExportFormat::Svg => true,
            ExportFormat::Png | ExportFormat::Jpeg => cfg!(feature = "raster"),
            ExportFormat::Html => false,
        }
    }

    fn fallback_format(&self) -> ExportFormat {
        ExportFormat::Svg
    }

    fn export(&self, path: &Path, format: ExportFormat) -> Result<(), BackendError> {
        match format {
            ExportFormat::Svg => {
                let svg = self.to_svg()?;
                std::fs::write(path, svg).map_err(|source| BackendError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
            ExportFormat::Png | ExportFormat::Jpeg => self.write_raster(path, format),
            ExportFormat::Html => Err(BackendError::UnsupportedFormat {
                backend: "svg",
                format: "html",
            }),
        }
    }

    fn close(&mut self) {
        self.viewport = None;
        self.elements.clear();
        self.title = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{AnchorPoint, LabelStyle};

    fn backend() -> SvgBackend {
        let mut b = SvgBackend::new();
        b.create_figure(400, 300).unwrap();
        b.create_subplot().unwrap();
        b.set_extent(AxisLimits {
            x_min: 10.0,
            x_max: -10.0,
            y_min: -5.0,
            y_max: 5.0,
        });
        b.set_axis_off();
        b
    }

    #[test]
    fn test_requires_figure() {
        let mut b = SvgBackend::new();
        let err = b
            .plot_lines(&[NativePoint::new(0.0, 0.0)], &PathStyle::default())
            .unwrap_err();
        assert!(matches!(err, BackendError::NoFigure));
    }

    #[test]
    fn test_elements_drawn_in_zorder() {
        let mut b = backend();
        let mut top = PathStyle::default();
        top.zorder = 100;
        top.color = "#ff0000".into();
        let mut bottom = PathStyle::default();
        bottom.zorder = -100;
        bottom.color = "#00ff00".into();
        let path = [NativePoint::new(0.0, 0.0), NativePoint::new(1.0, 1.0)];
        b.plot_lines(&path, &top).unwrap();
        b.plot_lines(&path, &bottom).unwrap();
        let svg = b.to_svg().unwrap();
        let red = svg.find("#ff0000").unwrap();
        let green = svg.find("#00ff00").unwrap();
        assert!(green < red);
    }

    #[test]
    fn test_text_extent_and_remove() {
        let mut b = backend();
        let props = TextProps::from_label(&LabelStyle::default(), AnchorPoint::Center);
        let id = b.add_text(NativePoint::new(0.0, 0.0), "Orion & co", &props).unwrap();
        let rect = b.text_extent(id).unwrap();
        assert!((rect.x0 + rect.x1 - 400.0).abs() < 1e-9);
        assert!(b.to_svg().unwrap().contains("Orion &amp; co"));
        assert!(b.remove(id));
        assert!(!b.remove(id));
        assert!(b.text_extent(id).is_none());
    }

    #[test]
    fn test_scatter_length_checked() {
        let mut b = backend();
        let err = b
            .scatter(
                &[NativePoint::new(0.0, 0.0)],
                &[1.0, 2.0],
                &["#fff".to_string()],
                &MarkerStyle::default(),
            )
            .unwrap_err();
        assert!(matches!(err, BackendError::LengthMismatch { .. }));
    }

    #[test]
    fn test_svg_export_and_html_unsupported() {
        let mut b = backend();
        b.scatter(
            &[NativePoint::new(0.0, 0.0), NativePoint::new(5.0, 2.0)],
            &[30.0, 10.0],
            &["#ffffff".to_string(), "#ffcc88".to_string()],
            &MarkerStyle::default(),
        )
        .unwrap();
        b.add_gradient(
            &GradientStyle {
                direction: GradientDirection::Radial,
                stops: vec![(0.0, "#000000".into()), (1.0, "#1a3d7c".into())],
            },
            -2000,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        b.export(&path, ExportFormat::Svg).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("radialGradient"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(!b.supports(ExportFormat::Html));
        assert!(b.export(&dir.path().join("x.html"), ExportFormat::Html).is_err());
    }

    #[cfg(feature = "raster")]
    #[test]
    fn test_png_export() {
        let mut b = backend();
        b.set_background_color("#102040", "#000000").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        b.export(&path, ExportFormat::Png).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 400);
        assert_eq!(img.height(), 300);
    }
}
