//! Replays recorded drawing commands into a Plotly figure.
//!
//! Rendering is a single pass: layout from the scene metadata, commands in
//! stable z-order, then the interactive affordances. A command that cannot
//! be replayed is logged and skipped so one bad element never loses the
//! scene.

use log::{debug, warn};
use serde_json::{json, Value};
use std::collections::HashSet;

use super::calibration::{self, MarkerCalibration};
use super::command::{
    CommandData, CommandId, CommandKind, DrawingCommand, DsoMeta, ElementMeta, PlanetMeta,
    StarMeta,
};
use super::figure::Figure;
use super::recorder::{DrawingRecorder, ProjectionInfo, StyleInfo};
use crate::coords::NativePoint;
use crate::error::RenderError;
use crate::projection::{AxisLimits, ChartKind};
use crate::style::{FontWeight, GradientDirection, HAlign, LineStyle, MarkerSymbol, Rgba, VAlign};

const GRADIENT_SAMPLES: usize = 64;
const MODEBAR_BUTTONS: [&str; 5] = ["zoom", "pan", "select", "lasso2d", "resetScale2d"];

/// Default figure size in pixels per chart family.
pub fn figure_size(kind: ChartKind) -> (u32, u32) {
    match kind {
        ChartKind::Map => (1200, 900),
        ChartKind::Zenith | ChartKind::Optic => (1000, 1000),
        ChartKind::Horizon => (1200, 600),
    }
}

pub fn star_hover(meta: &StarMeta) -> String {
    let mut lines = Vec::new();
    match (&meta.name, &meta.bayer) {
        (Some(name), _) => lines.push(format!("<b>{name}</b>")),
        (None, Some(bayer)) => lines.push(format!("<b>{bayer}</b>")),
        (None, None) => lines.push(format!("<b>HIP {}</b>", meta.hip)),
    }
    if let (Some(_), Some(bayer)) = (&meta.name, &meta.bayer) {
        lines.push(bayer.clone());
    }
    lines.push(format!("Magnitude: {:.2}", meta.magnitude));
    lines.push(format!(
        "RA: {:.4}h  DEC: {:.4}°",
        meta.ra / 15.0,
        meta.dec
    ));
    if let Some(con) = &meta.constellation {
        lines.push(format!("Constellation: {}", con.to_uppercase()));
    }
    lines.join("<br>")
}

pub fn dso_hover(meta: &DsoMeta) -> String {
    let title = meta.name.as_deref().unwrap_or(if meta.id.is_empty() {
        "DSO"
    } else {
        &meta.id
    });
    let mut lines = vec![format!("<b>{title}</b>")];
    if meta.name.is_some() && !meta.id.is_empty() {
        lines.push(meta.id.clone());
    }
    lines.push(format!("Type: {}", meta.dso_type));
    if let Some(mag) = meta.magnitude {
        lines.push(format!("Magnitude: {mag:.1}"));
    }
    lines.push(format!(
        "RA: {:.4}h  DEC: {:.4}°",
        meta.ra / 15.0,
        meta.dec
    ));
    lines.join("<br>")
}

pub fn planet_hover(meta: &PlanetMeta) -> String {
    let name = if meta.name.is_empty() {
        "Planet"
    } else {
        &meta.name
    };
    let mut lines = vec![format!("<b>{name}</b>")];
    if let Some(mag) = meta.magnitude {
        lines.push(format!("Magnitude: {mag:.2}"));
    }
    lines.join("<br>")
}

pub fn hover_text(meta: &ElementMeta) -> String {
    match meta {
        ElementMeta::Star(s) => star_hover(s),
        ElementMeta::Dso(d) => dso_hover(d),
        ElementMeta::Planet(p) => planet_hover(p),
        ElementMeta::Constellation(c) => format!("<b>{}</b>", c.name),
    }
}

fn css_color(
    id: CommandId,
    kind: CommandKind,
    color: &str,
    alpha: f64,
) -> Result<String, RenderError> {
    Rgba::parse(color)
        .map(|c| c.to_css(alpha))
        .map_err(|e| RenderError::Malformed {
            id,
            kind,
            reason: e.to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct PlotlyRenderer {
    pub calibration: MarkerCalibration,
}

impl Default for PlotlyRenderer {
    fn default() -> Self {
        Self::new(MarkerCalibration::new(super::recorder::DEFAULT_RESOLUTION))
    }
}

struct RenderContext {
    legend_seen: HashSet<String>,
    limits: Option<AxisLimits>,
}

impl RenderContext {
    /// True the first time a group id is seen.
    fn first_legend(&mut self, gid: &str) -> bool {
        self.legend_seen.insert(gid.to_string())
    }
}

impl PlotlyRenderer {
    pub fn new(calibration: MarkerCalibration) -> Self {
        Self { calibration }
    }

    pub fn render(&self, recorder: &DrawingRecorder) -> Figure {
        self.render_entries(
            recorder.entries().iter().map(|(id, c)| (*id, c)),
            recorder.projection_info(),
            recorder.style_info(),
        )
    }

    /// Replay commands that were never recorded; ids follow iteration order.
    pub fn render_commands<'a>(
        &self,
        commands: impl IntoIterator<Item = &'a DrawingCommand>,
        projection: Option<&ProjectionInfo>,
        style: Option<&StyleInfo>,
    ) -> Figure {
        let entries = commands
            .into_iter()
            .enumerate()
            .map(|(i, c)| (CommandId(i as u64), c));
        self.render_entries(entries, projection, style)
    }

    fn render_entries<'a>(
        &self,
        entries: impl IntoIterator<Item = (CommandId, &'a DrawingCommand)>,
        projection: Option<&ProjectionInfo>,
        style: Option<&StyleInfo>,
    ) -> Figure {
        let mut figure = Figure::new();
        self.configure_layout(&mut figure, projection, style);

        let mut ordered: Vec<(CommandId, &DrawingCommand)> = entries.into_iter().collect();
        ordered.sort_by_key(|(_, c)| c.zorder);

        let mut ctx = RenderContext {
            legend_seen: HashSet::new(),
            limits: projection.map(|p| p.limits),
        };
        let mut skipped = 0;
        for (id, command) in &ordered {
            if let Err(e) = self.render_command(&mut figure, &mut ctx, *id, command) {
                warn!("skipping {id}: {e}");
                skipped += 1;
            }
        }
        debug!(
            "rendered {} commands into {} traces ({} skipped)",
            ordered.len() - skipped,
            figure.data.len(),
            skipped
        );

        figure.update_layout(json!({
            "modebar": {"add": MODEBAR_BUTTONS},
            "clickmode": "event+select",
        }));
        figure
    }

    fn configure_layout(
        &self,
        figure: &mut Figure,
        projection: Option<&ProjectionInfo>,
        style: Option<&StyleInfo>,
    ) {
        let default_style = StyleInfo::default();
        let style = style.unwrap_or(&default_style);
        let (width, height) = figure_size(projection.map(|p| p.kind).unwrap_or(ChartKind::Map));

        let mut xaxis = json!({
            "visible": false,
            "showgrid": false,
            "zeroline": false,
        });
        let mut yaxis = json!({
            "visible": false,
            "showgrid": false,
            "zeroline": false,
            "scaleanchor": "x",
            "scaleratio": 1,
        });
        if let Some(p) = projection {
            xaxis["range"] = json!([p.limits.x_min, p.limits.x_max]);
            yaxis["range"] = json!([p.limits.y_min, p.limits.y_max]);
        }

        figure.update_layout(json!({
            "width": width,
            "height": height,
            "plot_bgcolor": style.background_color,
            "paper_bgcolor": style.figure_background_color,
            "xaxis": xaxis,
            "yaxis": yaxis,
            "hovermode": "closest",
            "dragmode": "pan",
            "showlegend": true,
            "legend": {
                "bgcolor": "rgba(0,0,0,0.5)",
                "font": {"color": "#ffffff"},
            },
            "margin": {"l": 10, "r": 10, "t": 30, "b": 10},
        }));
    }

    fn render_command(
        &self,
        figure: &mut Figure,
        ctx: &mut RenderContext,
        id: CommandId,
        command: &DrawingCommand,
    ) -> Result<(), RenderError> {
        let kind = command.kind();
        let malformed = |reason: String| RenderError::Malformed {
            id,
            kind,
            reason,
        };
        if !command.metadata.is_empty() && command.metadata.len() != command.data.element_count() {
            return Err(malformed(format!(
                "{} metadata entries for {} elements",
                command.metadata.len(),
                command.data.element_count()
            )));
        }

        match &command.data {
            CommandData::Scatter {
                x,
                y,
                sizes,
                colors,
                alphas,
            } => {
                let n = x.len();
                if y.len() != n || sizes.len() != n || colors.len() != n || alphas.len() != n {
                    return Err(malformed("parallel arrays differ in length".into()));
                }
                let colors = colors
                    .iter()
                    .map(|c| css_color(id, kind, c, 1.0))
                    .collect::<Result<Vec<_>, _>>()?;
                let sizes: Vec<f64> = sizes
                    .iter()
                    .map(|s| self.calibration.marker_diameter(*s))
                    .collect();
                let symbol = command.style.marker.unwrap_or(MarkerSymbol::Circle);
                let mut marker = json!({
                    "size": sizes,
                    "color": colors,
                    "opacity": alphas,
                    "symbol": calibration::plotly_symbol(symbol),
                });
                if let Some(edge) = &command.style.edge_color {
                    marker["line"] = json!({
                        "color": css_color(id, kind, edge, 1.0)?,
                        "width": calibration::edge_width(command.style.edge_width.unwrap_or(1.0)),
                    });
                }
                let mut trace = json!({
                    "type": "scattergl",
                    "mode": "markers",
                    "x": x,
                    "y": y,
                    "marker": marker,
                    "name": calibration::legend_name(&command.gid),
                    "legendgroup": command.gid,
                    "showlegend": ctx.first_legend(&command.gid),
                });
                if command.metadata.is_empty() {
                    trace["hoverinfo"] = json!("skip");
                } else {
                    let text: Vec<String> = command.metadata.iter().map(hover_text).collect();
                    trace["text"] = json!(text);
                    trace["hoverinfo"] = json!("text");
                }
                figure.add_trace(trace);
            }
            CommandData::LineCollection { segments } => {
                let mut xs: Vec<Value> = Vec::with_capacity(segments.len() * 3);
                let mut ys: Vec<Value> = Vec::with_capacity(segments.len() * 3);
                let mut text: Vec<Value> = Vec::with_capacity(segments.len() * 3);
                for (i, [a, b]) in segments.iter().enumerate() {
                    if !a.is_finite() || !b.is_finite() {
                        return Err(malformed(format!("segment {i} is not finite")));
                    }
                    let label = command
                        .metadata
                        .get(i)
                        .map(|m| Value::String(hover_text(m)))
                        .unwrap_or(Value::Null);
                    xs.extend([json!(a.x), json!(b.x), Value::Null]);
                    ys.extend([json!(a.y), json!(b.y), Value::Null]);
                    text.extend([label.clone(), label, Value::Null]);
                }
                let mut trace = self.line_trace(id, command, xs, ys, ctx)?;
                if command.metadata.is_empty() {
                    trace["hoverinfo"] = json!("skip");
                } else {
                    trace["text"] = json!(text);
                    trace["hoverinfo"] = json!("text");
                }
                figure.add_trace(trace);
            }
            CommandData::Line { x, y } => {
                if x.len() != y.len() {
                    return Err(malformed("x and y differ in length".into()));
                }
                let xs = x.iter().map(|v| json!(v)).collect();
                let ys = y.iter().map(|v| json!(v)).collect();
                let mut trace = self.line_trace(id, command, xs, ys, ctx)?;
                trace["hoverinfo"] = json!("skip");
                figure.add_trace(trace);
            }
            CommandData::Polygon { points } => {
                let mut ring: Vec<NativePoint> = points.clone();
                if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
                    if first != last {
                        ring.push(first);
                    }
                }
                let edge = command
                    .style
                    .edge_color
                    .as_deref()
                    .or(command.style.color.as_deref())
                    .unwrap_or("#ffffff");
                let alpha = command.style.alpha.unwrap_or(1.0);
                let edge_width = command.style.edge_width.unwrap_or(1.0);
                let dash = command.style.line_style.unwrap_or(LineStyle::Solid);
                let mut trace = json!({
                    "type": "scatter",
                    "mode": "lines",
                    "x": ring.iter().map(|p| p.x).collect::<Vec<_>>(),
                    "y": ring.iter().map(|p| p.y).collect::<Vec<_>>(),
                    "line": {
                        "color": css_color(id, kind, edge, alpha)?,
                        "width": calibration::line_width(edge_width),
                        "dash": calibration::dash(dash),
                    },
                    "hoverinfo": "skip",
                    "name": calibration::legend_name(&command.gid),
                    "legendgroup": command.gid,
                    "showlegend": false,
                });
                if let Some(fill) = &command.style.fill_color {
                    trace["fill"] = json!("toself");
                    trace["fillcolor"] = json!(css_color(id, kind, fill, alpha)?);
                }
                figure.add_trace(trace);
            }
            CommandData::Text { x, y, text } => {
                let (yanchor, xanchor) = calibration::annotation_anchor(
                    command.style.va.unwrap_or(VAlign::Center),
                    command.style.ha.unwrap_or(HAlign::Center),
                );
                let color = command
                    .style
                    .font_color
                    .as_deref()
                    .or(command.style.color.as_deref())
                    .unwrap_or("#ffffff");
                let bold = matches!(
                    command.style.font_weight,
                    Some(FontWeight::Bold | FontWeight::Heavy)
                );
                let label = if bold {
                    format!("<b>{text}</b>")
                } else {
                    text.clone()
                };
                figure.add_annotation(json!({
                    "x": x,
                    "y": y,
                    "xref": "x",
                    "yref": "y",
                    "text": label,
                    "showarrow": false,
                    "xanchor": xanchor,
                    "yanchor": yanchor,
                    "font": {
                        "size": calibration::font_size(command.style.font_size.unwrap_or(20.0)),
                        "color": css_color(id, kind, color, 1.0)?,
                        "family": command.style.font_name.as_deref().unwrap_or("sans-serif"),
                    },
                    "opacity": command.style.alpha.unwrap_or(1.0),
                }));
            }
            CommandData::Gradient {
                direction,
                color_stops,
            } => {
                let limits = ctx
                    .limits
                    .ok_or_else(|| malformed("gradient needs projection info".into()))?;
                let colorscale = color_stops
                    .iter()
                    .map(|(offset, color)| {
                        Ok(json!([offset.clamp(0.0, 1.0), css_color(id, kind, color, 1.0)?]))
                    })
                    .collect::<Result<Vec<_>, RenderError>>()?;
                figure.add_trace(gradient_trace(*direction, &limits, colorscale));
            }
            CommandData::InfoTable {
                columns,
                values,
                widths,
            } => {
                if columns.len() != values.len() || columns.len() != widths.len() {
                    return Err(malformed("columns, values and widths differ in length".into()));
                }
                let total: f64 = widths.iter().sum();
                if !(total > 0.0) {
                    return Err(malformed("column widths sum to zero".into()));
                }
                let color = command
                    .style
                    .font_color
                    .as_deref()
                    .unwrap_or("#c8d2e6");
                let color = css_color(id, kind, color, 1.0)?;
                let size = calibration::font_size(command.style.font_size.unwrap_or(20.0));
                let mut left = 0.0;
                for ((column, value), width) in columns.iter().zip(values).zip(widths) {
                    let frac = width / total;
                    let center = left + frac / 2.0;
                    for (text, y) in [(format!("<b>{column}</b>"), -0.03), (value.clone(), -0.08)] {
                        figure.add_annotation(json!({
                            "x": center,
                            "y": y,
                            "xref": "paper",
                            "yref": "paper",
                            "text": text,
                            "showarrow": false,
                            "xanchor": "center",
                            "yanchor": "middle",
                            "font": {"size": size, "color": color},
                        }));
                    }
                    if left > 0.0 {
                        figure.add_shape(json!({
                            "type": "line",
                            "xref": "paper",
                            "yref": "paper",
                            "x0": left, "x1": left, "y0": -0.11, "y1": 0.0,
                            "line": {"color": color, "width": 1},
                        }));
                    }
                    left += frac;
                }
                figure.add_shape(json!({
                    "type": "rect",
                    "xref": "paper",
                    "yref": "paper",
                    "x0": 0.0, "x1": 1.0, "y0": -0.11, "y1": 0.0,
                    "line": {"color": color, "width": 1},
                }));
                figure.update_layout(json!({"margin": {"b": 90}}));
            }
        }
        Ok(())
    }

    fn line_trace(
        &self,
        id: CommandId,
        command: &DrawingCommand,
        xs: Vec<Value>,
        ys: Vec<Value>,
        ctx: &mut RenderContext,
    ) -> Result<Value, RenderError> {
        let color = command.style.color.as_deref().unwrap_or("#ffffff");
        let alpha = command.style.alpha.unwrap_or(1.0);
        Ok(json!({
            "type": "scattergl",
            "mode": "lines",
            "x": xs,
            "y": ys,
            "connectgaps": false,
            "line": {
                "color": css_color(id, command.kind(), color, alpha)?,
                "width": calibration::line_width(command.style.line_width.unwrap_or(1.0)),
                "dash": calibration::dash(command.style.line_style.unwrap_or(LineStyle::Solid)),
            },
            "name": calibration::legend_name(&command.gid),
            "legendgroup": command.gid,
            "showlegend": ctx.first_legend(&command.gid),
        }))
    }
}

/// Heatmap covering the axes: linear runs bottom to top, radial runs from
/// the center out to the inscribed circle.
fn gradient_trace(
    direction: GradientDirection,
    limits: &AxisLimits,
    colorscale: Vec<Value>,
) -> Value {
    let (x0, x1) = (limits.x_min.min(limits.x_max), limits.x_min.max(limits.x_max));
    let (y0, y1) = (limits.y_min.min(limits.y_max), limits.y_min.max(limits.y_max));
    let n = GRADIENT_SAMPLES;
    let lerp = |a: f64, b: f64, i: usize| a + (b - a) * i as f64 / (n - 1) as f64;
    let xs: Vec<f64> = (0..n).map(|i| lerp(x0, x1, i)).collect();
    let ys: Vec<f64> = (0..n).map(|i| lerp(y0, y1, i)).collect();

    let z: Vec<Vec<f64>> = match direction {
        GradientDirection::Linear => (0..n)
            .map(|row| vec![row as f64 / (n - 1) as f64; n])
            .collect(),
        GradientDirection::Radial => {
            let center = limits.center();
            let radius = (limits.width().min(limits.height()) / 2.0).max(f64::EPSILON);
            ys.iter()
                .map(|y| {
                    xs.iter()
                        .map(|x| {
                            ((x - center.x).hypot(y - center.y) / radius).min(1.0)
                        })
                        .collect()
                })
                .collect()
        }
    };

    json!({
        "type": "heatmap",
        "x": xs,
        "y": ys,
        "z": z,
        "zmin": 0.0,
        "zmax": 1.0,
        "colorscale": colorscale,
        "showscale": false,
        "hoverinfo": "skip",
        "name": "Background",
        "showlegend": false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::command::{ConstellationMeta, Style};
    use crate::projection::SkyExtent;

    fn projection() -> ProjectionInfo {
        ProjectionInfo {
            kind: ChartKind::Map,
            extent: SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap(),
            limits: AxisLimits {
                x_min: 30.0,
                x_max: -30.0,
                y_min: -10.0,
                y_max: 30.0,
            },
        }
    }

    fn star(hip: u32, name: Option<&str>) -> StarMeta {
        StarMeta {
            hip,
            name: name.map(str::to_string),
            bayer: Some("α Ori".into()),
            magnitude: 0.45,
            ra: 88.7929,
            dec: 7.4071,
            constellation: Some("ori".into()),
            bv: Some(1.85),
        }
    }

    fn scatter_cmd(gid: &str, zorder: i32, colors: Vec<String>) -> DrawingCommand {
        let n = colors.len();
        DrawingCommand {
            data: CommandData::Scatter {
                x: (0..n).map(|i| i as f64).collect(),
                y: vec![0.0; n],
                sizes: vec![20.0; n],
                colors,
                alphas: vec![0.9; n],
            },
            style: Style::default(),
            metadata: Vec::new(),
            zorder,
            gid: gid.into(),
        }
    }

    #[test]
    fn test_star_hover_template() {
        let text = star_hover(&star(27989, Some("Betelgeuse")));
        assert_eq!(
            text,
            concat!(
                "<b>Betelgeuse</b><br>α Ori<br>Magnitude: 0.45<br>",
                "RA: 5.9195h  DEC: 7.4071°<br>Constellation: ORI"
            )
        );
        let unnamed = star_hover(&StarMeta {
            bayer: None,
            ..star(33449, None)
        });
        assert!(unnamed.starts_with("<b>HIP 33449</b>"));
    }

    #[test]
    fn test_dso_and_planet_hover() {
        let dso = DsoMeta {
            id: "M42".into(),
            name: Some("Orion Nebula".into()),
            dso_type: "Nebula".into(),
            magnitude: Some(4.0),
            ra: 83.8221,
            dec: -5.3911,
        };
        let text = dso_hover(&dso);
        assert!(text.starts_with("<b>Orion Nebula</b><br>M42"));
        assert!(text.contains("Type: Nebula"));
        assert!(text.contains("Magnitude: 4.0"));

        let anonymous = dso_hover(&DsoMeta {
            id: String::new(),
            name: None,
            ..dso
        });
        assert!(anonymous.starts_with("<b>DSO</b>"));

        let planet = planet_hover(&PlanetMeta {
            name: "Jupiter".into(),
            magnitude: Some(-2.2),
            ra: 40.0,
            dec: 15.0,
        });
        assert_eq!(planet, "<b>Jupiter</b><br>Magnitude: -2.20");
    }

    #[test]
    fn test_layout_from_scene_metadata() {
        let renderer = PlotlyRenderer::default();
        let style = StyleInfo {
            background_color: "#101020".into(),
            figure_background_color: "#000000".into(),
            resolution: 2048,
        };
        let fig = renderer.render_commands(std::iter::empty(), Some(&projection()), Some(&style));
        assert_eq!(fig.layout["plot_bgcolor"], "#101020");
        assert_eq!(fig.layout["xaxis"]["range"], json!([30.0, -30.0]));
        assert_eq!(fig.layout["yaxis"]["scaleanchor"], "x");
        assert_eq!(fig.layout["hovermode"], "closest");
        assert_eq!(fig.layout["dragmode"], "pan");
        assert_eq!(fig.layout["clickmode"], "event+select");
        assert_eq!(fig.layout["modebar"]["add"].as_array().unwrap().len(), 5);
        assert_eq!(fig.layout["width"], 1200);
    }

    #[test]
    fn test_zorder_sort_is_stable() {
        let renderer = PlotlyRenderer::default();
        let cmds = vec![
            scatter_cmd("b", 10, vec!["#ffffff".into()]),
            scatter_cmd("a", 0, vec!["#ffffff".into()]),
            scatter_cmd("c", 10, vec!["#ffffff".into()]),
        ];
        let fig = renderer.render_commands(&cmds, Some(&projection()), None);
        let order: Vec<&str> = fig
            .data
            .iter()
            .map(|t| t["legendgroup"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bad_command_is_skipped() {
        let renderer = PlotlyRenderer::default();
        let cmds = vec![
            scatter_cmd("stars", 0, vec!["#ffffff".into(), "#ffeedd".into()]),
            scatter_cmd("marker", 1, vec!["not-a-color".into()]),
            scatter_cmd("dso", 2, vec!["#ff6868".into()]),
        ];
        let fig = renderer.render_commands(&cmds, Some(&projection()), None);
        assert_eq!(fig.data.len(), 2);
        assert_eq!(fig.data[1]["name"], "DSOs");
    }

    #[test]
    fn test_legend_shown_once_per_gid() {
        let renderer = PlotlyRenderer::default();
        let cmds = vec![
            scatter_cmd("stars", 0, vec!["#ffffff".into()]),
            scatter_cmd("stars", 0, vec!["#ffffff".into()]),
        ];
        let fig = renderer.render_commands(&cmds, None, None);
        assert_eq!(fig.data[0]["showlegend"], true);
        assert_eq!(fig.data[1]["showlegend"], false);
        assert_eq!(fig.data[0]["name"], "Stars");
    }

    #[test]
    fn test_scatter_uses_calibrated_sizes_and_hover() {
        let renderer = PlotlyRenderer::default();
        let mut cmd = scatter_cmd("stars", 0, vec!["#ffffff".into()]);
        cmd.metadata = vec![ElementMeta::Star(star(27989, Some("Betelgeuse")))];
        let fig = renderer.render_commands([&cmd], None, None);
        let trace = &fig.data[0];
        assert_eq!(trace["type"], "scattergl");
        assert_eq!(trace["hoverinfo"], "text");
        let size = trace["marker"]["size"][0].as_f64().unwrap();
        assert!((size - renderer.calibration.marker_diameter(20.0)).abs() < 1e-12);
        assert_eq!(trace["marker"]["opacity"], json!([0.9]));
    }

    #[test]
    fn test_per_point_alpha_kept() {
        let renderer = PlotlyRenderer::default();
        let mut cmd = scatter_cmd("stars", 0, vec!["#ffffff".into(), "#ffeedd".into()]);
        if let CommandData::Scatter { alphas, .. } = &mut cmd.data {
            *alphas = vec![1.0, 0.25];
        }
        let fig = renderer.render_commands([&cmd], None, None);
        assert_eq!(fig.data[0]["marker"]["opacity"], json!([1.0, 0.25]));
    }

    #[test]
    fn test_render_error_names_command_id() {
        let renderer = PlotlyRenderer::default();
        let mut figure = Figure::new();
        let mut ctx = RenderContext {
            legend_seen: HashSet::new(),
            limits: None,
        };
        let bad = scatter_cmd("marker", 0, vec!["not-a-color".into()]);
        let err = renderer
            .render_command(&mut figure, &mut ctx, CommandId(7), &bad)
            .unwrap_err();
        let RenderError::Malformed { id, kind, .. } = &err;
        assert_eq!(*id, CommandId(7));
        assert_eq!(*kind, CommandKind::Scatter);
        assert!(err.to_string().contains("cmd#7"));
    }

    #[test]
    fn test_line_collection_breaks_between_segments() {
        let renderer = PlotlyRenderer::default();
        let meta = ElementMeta::Constellation(ConstellationMeta {
            name: "Orion".into(),
            iau_id: "ori".into(),
        });
        let cmd = DrawingCommand {
            data: CommandData::LineCollection {
                segments: vec![
                    [NativePoint::new(0.0, 0.0), NativePoint::new(1.0, 1.0)],
                    [NativePoint::new(2.0, 2.0), NativePoint::new(3.0, 3.0)],
                ],
            },
            style: Style {
                color: Some("#6a7f99".into()),
                line_width: Some(5.0),
                ..Style::default()
            },
            metadata: vec![meta.clone(), meta],
            zorder: 0,
            gid: "constellations-line".into(),
        };
        let fig = renderer.render_commands([&cmd], None, None);
        let trace = &fig.data[0];
        assert_eq!(trace["x"], json!([0.0, 1.0, null, 2.0, 3.0, null]));
        assert_eq!(trace["name"], "Constellations");
        assert_eq!(trace["text"][0], "<b>Orion</b>");
        assert!((trace["line"]["width"].as_f64().unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_polygon_closed_and_filled_only_with_fill() {
        let renderer = PlotlyRenderer::default();
        let points = vec![
            NativePoint::new(0.0, 0.0),
            NativePoint::new(1.0, 0.0),
            NativePoint::new(1.0, 1.0),
        ];
        let outline = DrawingCommand {
            data: CommandData::Polygon {
                points: points.clone(),
            },
            style: Style::default(),
            metadata: vec![],
            zorder: 0,
            gid: "polygon".into(),
        };
        let filled = DrawingCommand {
            style: Style {
                fill_color: Some("#ff0000".into()),
                ..Style::default()
            },
            ..outline.clone()
        };
        let fig = renderer.render_commands([&outline, &filled], None, None);
        assert_eq!(fig.data[0]["x"].as_array().unwrap().len(), 4);
        assert!(fig.data[0].get("fill").is_none());
        assert_eq!(fig.data[1]["fill"], "toself");
    }

    #[test]
    fn test_text_annotation_anchor_and_font() {
        let renderer = PlotlyRenderer::default();
        let cmd = DrawingCommand {
            data: CommandData::Text {
                x: 1.0,
                y: 2.0,
                text: "Rigel".into(),
            },
            style: Style {
                font_size: Some(30.0),
                va: Some(VAlign::Top),
                ha: Some(HAlign::Left),
                ..Style::default()
            },
            metadata: vec![],
            zorder: 0,
            gid: "star-label".into(),
        };
        let fig = renderer.render_commands([&cmd], None, None);
        let ann = &fig.annotations()[0];
        assert_eq!(ann["yanchor"], "top");
        assert_eq!(ann["xanchor"], "right");
        assert_eq!(ann["font"]["size"], 12.0);
    }

    #[test]
    fn test_gradient_becomes_background_heatmap() {
        let renderer = PlotlyRenderer::default();
        let cmd = DrawingCommand {
            data: CommandData::Gradient {
                direction: GradientDirection::Radial,
                color_stops: vec![(0.0, "#000000".into()), (1.0, "#1a3d7c".into())],
            },
            style: Style::default(),
            metadata: vec![],
            zorder: -2000,
            gid: "gradient".into(),
        };
        let text = DrawingCommand {
            data: CommandData::Text {
                x: 0.0,
                y: 0.0,
                text: "x".into(),
            },
            style: Style::default(),
            metadata: vec![],
            zorder: 0,
            gid: "t".into(),
        };
        let fig = renderer.render_commands([&text, &cmd], Some(&projection()), None);
        assert_eq!(fig.data[0]["type"], "heatmap");
        let z = fig.data[0]["z"].as_array().unwrap();
        assert_eq!(z.len(), GRADIENT_SAMPLES);

        // Without axis limits the gradient cannot be placed and is skipped.
        let fig = renderer.render_commands([&cmd], None, None);
        assert!(fig.data.is_empty());
    }

    #[test]
    fn test_info_table_annotations() {
        let renderer = PlotlyRenderer::default();
        let cmd = DrawingCommand {
            data: CommandData::InfoTable {
                columns: vec!["Date".into(), "Location".into(), "Limit".into()],
                values: vec!["2024-01-01".into(), "Paris".into(), "< 5".into()],
                widths: vec![0.4, 0.4, 0.2],
            },
            style: Style::default(),
            metadata: vec![],
            zorder: 0,
            gid: "info-table".into(),
        };
        let fig = renderer.render_commands([&cmd], None, None);
        assert_eq!(fig.annotations().len(), 6);
        // Border plus two column separators.
        assert_eq!(fig.shapes().len(), 3);
        assert_eq!(fig.layout["margin"]["b"], 90);
    }
}
