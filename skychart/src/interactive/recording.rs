//! Recording decorator over the static primitives.
//!
//! Every primitive is delegated to the wrapped implementation first. Only
//! after it returns successfully is the matching command recorded, with
//! geometry re-derived through the wrapped chart's own projector. Batch
//! operations read back what was actually plotted from the object graph,
//! so recorded counts always match the static rendering.

use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

use super::calibration::MarkerCalibration;
use super::command::{
    CommandId, ConstellationMeta, DsoMeta, ElementMeta, Layer, PerPoint, PlanetMeta, StarMeta,
    Style,
};
use super::figure::Figure;
use super::recorder::{DrawingRecorder, ProjectionInfo, ScatterInput, StyleInfo};
use super::renderer::PlotlyRenderer;
use crate::backend::{PixelRect, TextProps};
use crate::catalog::Star;
use crate::chart::{
    border_ring, compass_points, compass_style, outline_style, ChartFrame, ChartPrimitives,
    ConstellationLines, InfoTable, LabelId, MarkedObject, PlottedObjects, SkyMarker,
    BORDER_STEPS,
};
use crate::coords::{Equatorial, NativePoint};
use crate::error::Result;
use crate::export::{self, ExportFormat, ExportReport};
use crate::projection::ChartKind;
use crate::style::{
    AnchorPoint, GradientStyle, LabelStyle, MarkerStyle, PathStyle, PolygonStyle, ZOrder,
};

pub fn marker_style(style: &MarkerStyle) -> Style {
    Style {
        color: Some(style.color.clone()),
        edge_color: style.edge_color.clone(),
        edge_width: style.edge_color.as_ref().map(|_| style.edge_width),
        alpha: Some(style.alpha),
        marker: Some(style.symbol),
        ..Style::default()
    }
}

pub fn path_style(style: &PathStyle) -> Style {
    Style {
        color: Some(style.color.clone()),
        line_width: Some(style.width),
        line_style: Some(style.style),
        alpha: Some(style.alpha),
        ..Style::default()
    }
}

pub fn polygon_style(style: &PolygonStyle) -> Style {
    Style {
        fill_color: style.fill_color.clone(),
        edge_color: Some(style.edge_color.clone()),
        edge_width: Some(style.edge_width),
        line_style: Some(style.line_style),
        alpha: Some(style.alpha),
        ..Style::default()
    }
}

pub fn text_style(props: &TextProps) -> Style {
    Style {
        font_size: Some(props.font_size),
        font_weight: Some(props.font_weight),
        font_color: Some(props.font_color.clone()),
        font_name: Some(props.font_name.clone()),
        alpha: Some(props.alpha),
        ha: Some(props.ha),
        va: Some(props.va),
        ..Style::default()
    }
}

fn marker_meta(object: &MarkedObject) -> Option<ElementMeta> {
    match object {
        MarkedObject::Dso(dso) => Some(ElementMeta::Dso(DsoMeta::from(dso))),
        MarkedObject::Planet(planet) => Some(ElementMeta::Planet(PlanetMeta::from(planet))),
        MarkedObject::Custom => None,
    }
}

/// Placement state of one drawn label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelState {
    /// Drawn and recorded; placement may still reject it.
    Proposed(CommandId),
    Finalized(CommandId),
    /// Removed by the static pipeline; its command was retracted.
    Abandoned,
}

/// Tracks each drawn label from proposal to its final state.
#[derive(Debug, Clone, Default)]
pub struct LabelLedger {
    states: BTreeMap<LabelId, LabelState>,
}

impl LabelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_draw(&mut self, label: LabelId, command: CommandId) {
        self.states.insert(label, LabelState::Proposed(command));
    }

    /// Mark a label abandoned, returning the command to retract. Removing an
    /// abandoned or unknown label returns `None`.
    pub fn on_remove(&mut self, label: LabelId) -> Option<CommandId> {
        let state = self.states.get_mut(&label)?;
        match *state {
            LabelState::Proposed(command) | LabelState::Finalized(command) => {
                *state = LabelState::Abandoned;
                Some(command)
            }
            LabelState::Abandoned => None,
        }
    }

    /// Promote every proposed label; returns how many changed.
    pub fn finalize(&mut self) -> usize {
        let mut promoted = 0;
        for state in self.states.values_mut() {
            if let LabelState::Proposed(command) = *state {
                *state = LabelState::Finalized(command);
                promoted += 1;
            }
        }
        promoted
    }

    pub fn state(&self, label: LabelId) -> Option<LabelState> {
        self.states.get(&label).copied()
    }

    fn count(&self, pred: impl Fn(&LabelState) -> bool) -> usize {
        self.states.values().filter(|s| pred(s)).count()
    }

    pub fn proposed(&self) -> usize {
        self.count(|s| matches!(s, LabelState::Proposed(_)))
    }

    pub fn finalized(&self) -> usize {
        self.count(|s| matches!(s, LabelState::Finalized(_)))
    }

    pub fn abandoned(&self) -> usize {
        self.count(|s| matches!(s, LabelState::Abandoned))
    }
}

/// Wraps a [`ChartPrimitives`] implementation and records every primitive
/// for interactive replay.
#[derive(Debug)]
pub struct Recording<P> {
    inner: P,
    recorder: DrawingRecorder,
    ledger: LabelLedger,
    renderer: PlotlyRenderer,
}

impl<P: ChartPrimitives> Recording<P> {
    /// Wrap an initialized chart, capturing its projection and style info.
    pub fn new(inner: P) -> Self {
        let frame = inner.frame();
        let mut recorder = DrawingRecorder::new();
        recorder.set_projection_info(ProjectionInfo::from_projector(
            &frame.projector,
            frame.limits,
        ));
        recorder.set_style_info(StyleInfo {
            background_color: frame.background_color.clone(),
            figure_background_color: frame.figure_background_color.clone(),
            resolution: frame.resolution,
        });
        // Recorded sizes already carry the chart scale.
        let renderer = PlotlyRenderer::new(MarkerCalibration::new(frame.resolution));
        Self {
            inner,
            recorder,
            ledger: LabelLedger::new(),
            renderer,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    pub fn recorder(&self) -> &DrawingRecorder {
        &self.recorder
    }

    pub fn ledger(&self) -> &LabelLedger {
        &self.ledger
    }

    pub fn renderer_mut(&mut self) -> &mut PlotlyRenderer {
        &mut self.renderer
    }

    /// Finalize outstanding labels and replay the recording.
    pub fn to_plotly(&mut self) -> Figure {
        let promoted = self.ledger.finalize();
        if promoted > 0 {
            debug!("finalized {promoted} labels");
        }
        self.renderer.render(&self.recorder)
    }

    pub fn export_html(&mut self, path: &Path) -> Result<()> {
        let kind = self.inner.frame().projector.kind();
        let figure = self.to_plotly();
        figure.write_html(path, &format!("Sky chart ({kind})"))?;
        info!(
            "exported interactive chart with {} commands to {}",
            self.recorder.len(),
            path.display()
        );
        Ok(())
    }

    fn project(&self, eq: &Equatorial) -> NativePoint {
        self.inner.frame().projector.project(eq)
    }
}

impl<P: ChartPrimitives> ChartPrimitives for Recording<P> {
    fn frame(&self) -> &ChartFrame {
        self.inner.frame()
    }

    fn objects(&self) -> &PlottedObjects {
        self.inner.objects()
    }

    fn plot_area(&self) -> PixelRect {
        self.inner.plot_area()
    }

    fn scatter_stars(
        &mut self,
        stars: &[Star],
        sizes: &[f64],
        style: &MarkerStyle,
    ) -> Result<usize> {
        let before = self.inner.objects().stars.len();
        let count = self.inner.scatter_stars(stars, sizes, style)?;
        let plotted = &self.inner.objects().stars[before..];
        if plotted.is_empty() {
            return Ok(count);
        }

        let points: Vec<NativePoint> = plotted
            .iter()
            .map(|p| self.project(&p.star.position))
            .collect();
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        let input = ScatterInput {
            x: &x,
            y: &y,
            sizes: PerPoint::Each(plotted.iter().map(|p| p.size).collect()),
            colors: PerPoint::Each(plotted.iter().map(|p| p.color.clone()).collect()),
            alphas: PerPoint::Uniform(style.alpha),
        };
        let metadata = plotted
            .iter()
            .map(|p| ElementMeta::Star(StarMeta::from(&p.star)))
            .collect();
        self.recorder.record_scatter(
            input,
            marker_style(style),
            metadata,
            Layer::new(style.zorder, "stars"),
        )?;
        Ok(count)
    }

    fn scatter_markers(
        &mut self,
        markers: &[SkyMarker],
        style: &MarkerStyle,
        gid: &str,
    ) -> Result<usize> {
        let before = self.inner.objects().markers.len();
        let count = self.inner.scatter_markers(markers, style, gid)?;
        let plotted = &self.inner.objects().markers[before..];
        if plotted.is_empty() {
            return Ok(count);
        }

        let points: Vec<NativePoint> = plotted
            .iter()
            .map(|p| self.project(&p.marker.position))
            .collect();
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        let colors = plotted
            .iter()
            .map(|p| p.marker.color.clone().unwrap_or_else(|| style.color.clone()))
            .collect();
        let input = ScatterInput {
            x: &x,
            y: &y,
            sizes: PerPoint::Each(plotted.iter().map(|p| p.marker.size).collect()),
            colors: PerPoint::Each(colors),
            alphas: PerPoint::Uniform(style.alpha),
        };
        // Metadata is all or nothing: one plain marker drops it for the batch.
        let metadata = plotted
            .iter()
            .map(|p| marker_meta(&p.marker.object))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        self.recorder
            .record_scatter(input, marker_style(style), metadata, Layer::new(style.zorder, gid))?;
        Ok(count)
    }

    fn polygon(&mut self, points: &[Equatorial], style: &PolygonStyle, gid: &str) -> Result<()> {
        self.inner.polygon(points, style, gid)?;
        let ring: Vec<NativePoint> = points
            .iter()
            .filter_map(|p| self.project(p).finite())
            .collect();
        if ring.len() >= 3 {
            self.recorder
                .record_polygon(&ring, polygon_style(style), Layer::new(style.zorder, gid))?;
        }
        Ok(())
    }

    fn text(
        &mut self,
        at: Equatorial,
        text: &str,
        props: &TextProps,
        gid: &str,
    ) -> Result<Option<LabelId>> {
        let Some(label) = self.inner.text(at, text, props, gid)? else {
            return Ok(None);
        };
        let point = self.project(&at);
        if !text.is_empty() && point.is_finite() {
            let command = self.recorder.record_text(
                point,
                text,
                text_style(props),
                Layer::new(props.zorder, gid),
            )?;
            self.ledger.on_draw(label, command);
        }
        Ok(Some(label))
    }

    fn remove_text(&mut self, id: LabelId) -> bool {
        let removed = self.inner.remove_text(id);
        if let Some(command) = self.ledger.on_remove(id) {
            self.recorder.retract(command);
        }
        removed
    }

    fn label_extent(&self, id: LabelId) -> Option<PixelRect> {
        self.inner.label_extent(id)
    }

    fn line(&mut self, points: &[Equatorial], style: &PathStyle, gid: &str) -> Result<()> {
        self.inner.line(points, style, gid)?;
        for run in self.inner.frame().projector.project_path(points) {
            let x: Vec<f64> = run.iter().map(|p| p.x).collect();
            let y: Vec<f64> = run.iter().map(|p| p.y).collect();
            self.recorder
                .record_line(&x, &y, path_style(style), Layer::new(style.zorder, gid))?;
        }
        Ok(())
    }

    fn constellations(&mut self, lines: &[ConstellationLines], style: &PathStyle) -> Result<usize> {
        let before = self.inner.objects().constellations.len();
        let count = self.inner.constellations(lines, style)?;

        let projector = &self.inner.frame().projector;
        let mut segments: Vec<[NativePoint; 2]> = Vec::new();
        let mut metadata = Vec::new();
        for constellation in &self.inner.objects().constellations[before..] {
            for (a, b) in &constellation.segments {
                if let Some((pa, pb)) = projector.project_segment(a, b) {
                    segments.push([pa, pb]);
                    metadata.push(ElementMeta::Constellation(ConstellationMeta {
                        name: constellation.name.clone(),
                        iau_id: constellation.iau_id.clone(),
                    }));
                }
            }
        }
        if !segments.is_empty() {
            self.recorder.record_line_collection(
                &segments,
                path_style(style),
                metadata,
                Layer::new(style.zorder, "constellations-line"),
            )?;
        }
        Ok(count)
    }

    fn gradient_background(&mut self, gradient: &GradientStyle) -> Result<()> {
        self.inner.gradient_background(gradient)?;
        self.recorder.record_gradient(
            gradient.direction,
            &gradient.stops,
            Layer::new(ZOrder::Background.value(), "background-gradient"),
        )?;
        Ok(())
    }

    fn info_table(&mut self, table: &InfoTable, style: &LabelStyle) -> Result<()> {
        self.inner.info_table(table, style)?;
        let props = TextProps::from_label(style, AnchorPoint::Center);
        self.recorder.record_info_table(
            &table.columns,
            &table.values,
            &table.widths,
            text_style(&props),
            Layer::new(style.zorder, "info-table"),
        )?;
        Ok(())
    }

    fn border(&mut self, style: &PathStyle) -> Result<()> {
        self.inner.border(style)?;
        let frame = self.inner.frame();
        let kind = frame.projector.kind();
        let limits = frame.limits;
        match kind {
            ChartKind::Zenith | ChartKind::Optic => {
                let ring = border_ring(&limits, BORDER_STEPS);
                self.recorder.record_polygon(
                    &ring,
                    polygon_style(&outline_style(style)),
                    Layer::new(style.zorder, "border"),
                )?;
                if kind == ChartKind::Zenith {
                    let props =
                        TextProps::from_label(&compass_style(style), AnchorPoint::Center);
                    for (letter, at) in compass_points(&limits) {
                        self.recorder.record_text(
                            at,
                            letter,
                            text_style(&props),
                            Layer::new(props.zorder, "compass-label"),
                        )?;
                    }
                }
            }
            ChartKind::Map | ChartKind::Horizon => {
                debug!("{kind} chart: border not recorded");
            }
        }
        Ok(())
    }

    fn supports_format(&self, format: ExportFormat) -> bool {
        format == ExportFormat::Html || self.inner.supports_format(format)
    }

    /// `.html` replays the recording; other formats go to the wrapped chart.
    fn export(&mut self, path: &Path) -> Result<ExportReport> {
        let inner = &self.inner;
        let report = export::resolve(
            path,
            |f| f == ExportFormat::Html || inner.supports_format(f),
            ExportFormat::Html,
        )?;
        if report.format == ExportFormat::Html {
            self.export_html(&report.path)?;
            return Ok(report);
        }
        self.inner.export(&report.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::StaticChart;
    use crate::config::ChartConfig;
    use crate::interactive::command::CommandKind;
    use crate::catalog::Catalog;
    use crate::projection::{MapProjection, Observer, SkyExtent};

    fn orion() -> Recording<StaticChart> {
        let extent = SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap();
        let config = ChartConfig::map(MapProjection::PlateCarree, extent);
        let chart = StaticChart::new(&config).unwrap();
        Recording::new(chart)
    }

    #[test]
    fn test_scene_info_captured() {
        let rec = orion();
        let info = rec.recorder().projection_info().unwrap();
        assert_eq!(info.kind, ChartKind::Map);
        assert_eq!(info.extent.ra_min, 60.0);
        assert!(info.limits.x_inverted());
        assert_eq!(rec.recorder().style_info().unwrap().resolution, 2048);
    }

    #[test]
    fn test_star_scatter_matches_static() {
        let mut rec = orion();
        let stars = &Catalog::bundled().stars;
        let sizes = vec![20.0; stars.len()];
        let count = rec
            .scatter_stars(stars, &sizes, &MarkerStyle::default())
            .unwrap();
        let scatter: Vec<_> = rec.recorder().commands_of(CommandKind::Scatter).collect();
        assert_eq!(scatter.len(), 1);
        assert_eq!(scatter[0].data.element_count(), count);
        assert_eq!(scatter[0].metadata.len(), count);
        assert_eq!(rec.objects().stars.len(), count);
    }

    #[test]
    fn test_label_removal_retracts() {
        let mut rec = orion();
        let props = TextProps::from_label(&LabelStyle::default(), AnchorPoint::Center);
        let at = Equatorial::new(88.79, 7.41);
        let kept = rec.text(at, "Betelgeuse", &props, "star-label").unwrap().unwrap();
        let dropped = rec.text(at, "Betelgeuse", &props, "star-label").unwrap().unwrap();
        assert_eq!(rec.recorder().commands_of(CommandKind::Text).count(), 2);

        assert!(rec.remove_text(dropped));
        assert!(!rec.remove_text(dropped));
        assert_eq!(rec.recorder().commands_of(CommandKind::Text).count(), 1);
        assert_eq!(rec.ledger().state(dropped), Some(LabelState::Abandoned));
        assert!(matches!(rec.ledger().state(kept), Some(LabelState::Proposed(_))));

        rec.to_plotly();
        assert!(matches!(rec.ledger().state(kept), Some(LabelState::Finalized(_))));
        assert_eq!(rec.ledger().finalized(), 1);
        assert_eq!(rec.ledger().abandoned(), 1);
    }

    #[test]
    fn test_border_only_on_round_charts() {
        let mut map = orion();
        map.border(&PathStyle::default()).unwrap();
        assert!(map.recorder().is_empty());

        let observer = Observer {
            latitude: 45.0,
            longitude: 0.0,
            lst: 60.0,
        };
        let chart = StaticChart::new(&ChartConfig::zenith(observer)).unwrap();
        let mut zenith = Recording::new(chart);
        zenith.border(&PathStyle::default()).unwrap();
        assert_eq!(zenith.recorder().commands_of(CommandKind::Polygon).count(), 1);
        let compass: Vec<String> = zenith
            .recorder()
            .commands_of(CommandKind::Text)
            .filter_map(|c| match &c.data {
                crate::interactive::command::CommandData::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(compass, vec!["N", "E", "S", "W"]);

        let config = ChartConfig::optic(Equatorial::new(83.8, -5.4), 10.0);
        let chart = StaticChart::new(&config).unwrap();
        let mut optic = Recording::new(chart);
        optic.border(&PathStyle::default()).unwrap();
        assert_eq!(optic.recorder().commands_of(CommandKind::Polygon).count(), 1);
        assert_eq!(optic.recorder().commands_of(CommandKind::Text).count(), 0);
    }

    #[test]
    fn test_static_errors_propagate() {
        let mut rec = orion();
        let stars = &Catalog::bundled().stars[..2];
        let err = rec.scatter_stars(stars, &[1.0], &MarkerStyle::default());
        assert!(err.is_err());
        assert!(rec.recorder().is_empty());
    }

    #[test]
    fn test_ledger_transitions() {
        let mut ledger = LabelLedger::new();
        let label = LabelId(7);
        assert_eq!(ledger.on_remove(label), None);
        ledger.on_draw(label, CommandId(3));
        assert_eq!(ledger.proposed(), 1);
        assert_eq!(ledger.on_remove(label), Some(CommandId(3)));
        assert_eq!(ledger.on_remove(label), None);
        assert_eq!(ledger.finalize(), 0);
    }
}
