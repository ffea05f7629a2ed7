//! High-level plotting API shared by static and interactive charts.

use log::debug;
use std::borrow::Cow;
use std::path::Path;

use super::labels::LabelSpace;
use super::{
    line_label_style, ChartPrimitives, ConstellationLines, InfoTable, LabelId, MarkedObject,
    PlottedObjects, SkyMarker, StaticChart,
};
use crate::backend::TextProps;
use crate::catalog::{Catalog, Planet, Star, StarFilter};
use crate::config::ChartConfig;
use crate::coords::Equatorial;
use crate::error::Result;
use crate::export::ExportReport;
use crate::interactive::{Figure, Recording};
use crate::projection::{MapProjection, Observer, Projector, SkyExtent};
use crate::style::{GradientStyle, LabelStyle, MarkerStyle, PathStyle, PlotStyle, PolygonStyle};

/// Mean obliquity of the ecliptic at J2000, degrees.
pub const OBLIQUITY_J2000: f64 = 23.4393;

const LINE_STEP_DEG: f64 = 2.0;
const CIRCLE_STEPS: usize = 72;

/// Equatorial position of ecliptic longitude `lon` on the ecliptic.
pub fn ecliptic_point(lon: f64) -> Equatorial {
    let eps = OBLIQUITY_J2000.to_radians();
    let l = lon.to_radians();
    let ra = (l.sin() * eps.cos()).atan2(l.cos()).to_degrees();
    let dec = (eps.sin() * l.sin()).clamp(-1.0, 1.0).asin().to_degrees();
    Equatorial::new(ra, dec)
}

/// Small circle of angular `radius` around `center`, as a ring of points.
pub fn small_circle(center: Equatorial, radius: f64, steps: usize) -> Vec<Equatorial> {
    let (ra1, dec1) = (center.ra.to_radians(), center.dec.to_radians());
    let d = radius.to_radians();
    (0..steps)
        .map(|i| {
            let bearing = i as f64 * std::f64::consts::TAU / steps as f64;
            let dec2 = (dec1.sin() * d.cos() + dec1.cos() * d.sin() * bearing.cos())
                .clamp(-1.0, 1.0)
                .asin();
            let ra2 = ra1
                + (bearing.sin() * d.sin() * dec1.cos())
                    .atan2(d.cos() - dec1.sin() * dec2.sin());
            Equatorial::new(ra2.to_degrees(), dec2.to_degrees())
        })
        .collect()
}

fn sweep(step: f64) -> impl Iterator<Item = f64> {
    let n = (360.0 / step).round() as usize;
    (0..=n).map(move |i| i as f64 * step)
}

fn star_label(star: &Star) -> Option<&str> {
    star.name.as_deref().or(star.bayer.as_deref())
}

/// A sky chart drawn through any [`ChartPrimitives`] implementation.
#[derive(Debug)]
pub struct SkyPlot<P: ChartPrimitives = StaticChart> {
    primitives: P,
    style: PlotStyle,
    catalog: Cow<'static, Catalog>,
    scale: f64,
    hide_colliding_labels: bool,
    labels: LabelSpace,
}

impl SkyPlot<StaticChart> {
    /// Static chart on the configured backend.
    pub fn new(config: &ChartConfig) -> Result<Self> {
        let chart = StaticChart::new(config)?;
        Self::from_primitives(chart, config)
    }

    pub fn map(projection: MapProjection, extent: SkyExtent) -> Result<Self> {
        Self::new(&ChartConfig::map(projection, extent))
    }

    pub fn zenith(observer: Observer) -> Result<Self> {
        Self::new(&ChartConfig::zenith(observer))
    }

    pub fn optic(center: Equatorial, fov: f64) -> Result<Self> {
        Self::new(&ChartConfig::optic(center, fov))
    }

    /// Static chart with every primitive also recorded for interactive
    /// replay.
    pub fn interactive(config: &ChartConfig) -> Result<SkyPlot<Recording<StaticChart>>> {
        let chart = StaticChart::new(config)?;
        SkyPlot::from_primitives(Recording::new(chart), config)
    }
}

impl<P: ChartPrimitives> SkyPlot<Recording<P>> {
    /// Replay everything drawn so far into a Plotly figure.
    pub fn to_plotly(&mut self) -> Figure {
        self.primitives.to_plotly()
    }

    pub fn export_html(&mut self, path: &Path) -> Result<()> {
        self.primitives.export_html(path)
    }
}

impl<P: ChartPrimitives> SkyPlot<P> {
    /// Wrap primitives already set up for `config`. Draws the configured
    /// background gradient, if any.
    pub fn from_primitives(primitives: P, config: &ChartConfig) -> Result<Self> {
        let mut plot = Self {
            primitives,
            style: config.style.clone(),
            catalog: Cow::Borrowed(Catalog::bundled()),
            scale: config.scale,
            hide_colliding_labels: config.hide_colliding_labels,
            labels: LabelSpace::with_padding(2.0),
        };
        if let Some(gradient) = plot.style.gradient.clone() {
            plot.primitives.gradient_background(&gradient)?;
        }
        Ok(plot)
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Cow::Owned(catalog);
        self
    }

    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    pub fn primitives_mut(&mut self) -> &mut P {
        &mut self.primitives
    }

    pub fn into_primitives(self) -> P {
        self.primitives
    }

    pub fn style(&self) -> &PlotStyle {
        &self.style
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn projector(&self) -> &Projector {
        &self.primitives.frame().projector
    }

    pub fn objects(&self) -> &PlottedObjects {
        self.primitives.objects()
    }

    /// Plot catalog stars accepted by `filter`; returns how many landed on
    /// the chart.
    pub fn stars(&mut self, filter: StarFilter) -> Result<usize> {
        let stars: Vec<Star> = self
            .catalog
            .stars
            .iter()
            .filter(|s| filter.accepts(s))
            .cloned()
            .collect();
        let sizes: Vec<f64> = stars
            .iter()
            .map(|s| self.style.star_size(s.magnitude, self.scale))
            .collect();
        let marker = self.style.star.marker.clone();
        let count = self.primitives.scatter_stars(&stars, &sizes, &marker)?;
        debug!("stars({filter}): {count} plotted");
        Ok(count)
    }

    /// Label plotted stars brighter than `max_magnitude` by name or Bayer
    /// designation; returns how many labels were placed.
    pub fn star_labels(&mut self, max_magnitude: f64) -> Result<usize> {
        let candidates: Vec<(Equatorial, String)> = self
            .objects()
            .stars
            .iter()
            .filter(|p| p.star.magnitude < max_magnitude)
            .filter_map(|p| Some((p.star.position, star_label(&p.star)?.to_string())))
            .collect();
        let style = self.style.star.label.clone();
        let mut placed = 0;
        for (at, name) in candidates {
            if self.text(at, &name, &style, "star-label")?.is_some() {
                placed += 1;
            }
        }
        Ok(placed)
    }

    /// Draw every catalog constellation figure; returns the segment count.
    pub fn constellations(&mut self) -> Result<usize> {
        let lines: Vec<ConstellationLines> = self
            .catalog
            .constellations
            .iter()
            .map(|c| ConstellationLines {
                iau_id: c.iau_id.clone(),
                name: c.name.clone(),
                segments: self.catalog.segments(c),
            })
            .filter(|c| !c.segments.is_empty())
            .collect();
        let style = self.style.constellation_lines.clone();
        self.primitives.constellations(&lines, &style)
    }

    pub fn constellation_labels(&mut self) -> Result<usize> {
        let candidates: Vec<(Equatorial, String)> = self
            .catalog
            .constellations
            .iter()
            .filter_map(|c| Some((self.catalog.label_position(c)?, c.name.to_uppercase())))
            .collect();
        let style = self.style.constellation_labels.clone();
        let mut placed = 0;
        for (at, name) in candidates {
            if self.text(at, &name, &style, "constellations-label-name")?.is_some() {
                placed += 1;
            }
        }
        Ok(placed)
    }

    pub fn ecliptic(&mut self) -> Result<()> {
        let points: Vec<Equatorial> = sweep(LINE_STEP_DEG).map(ecliptic_point).collect();
        let style = self.style.ecliptic.clone();
        self.primitives.line(&points, &style, "ecliptic-line")?;
        self.line_label(&points, "ECLIPTIC", &style, "ecliptic-label")?;
        Ok(())
    }

    pub fn celestial_equator(&mut self) -> Result<()> {
        let points: Vec<Equatorial> = sweep(LINE_STEP_DEG)
            .map(|ra| Equatorial::new(ra, 0.0))
            .collect();
        let style = self.style.celestial_equator.clone();
        self.primitives
            .line(&points, &style, "celestial-equator-line")?;
        self.line_label(&points, "CELESTIAL EQUATOR", &style, "celestial-equator-label")?;
        Ok(())
    }

    /// Name a reference line at the middle of its visible points.
    fn line_label(
        &mut self,
        points: &[Equatorial],
        text: &str,
        line: &PathStyle,
        gid: &str,
    ) -> Result<Option<LabelId>> {
        let visible: Vec<Equatorial> = points
            .iter()
            .filter(|p| self.projector().contains(p))
            .copied()
            .collect();
        let Some(at) = visible.get(visible.len() / 2).copied() else {
            return Ok(None);
        };
        self.text(at, text, &line_label_style(line), gid)
    }

    /// Plot catalog deep-sky objects, optionally limited by magnitude.
    /// Objects without a magnitude pass any limit.
    pub fn dsos(&mut self, max_magnitude: Option<f64>, labels: bool) -> Result<usize> {
        let mut by_type: Vec<(String, Vec<SkyMarker>)> = Vec::new();
        for dso in &self.catalog.dsos {
            if let (Some(limit), Some(mag)) = (max_magnitude, dso.magnitude) {
                if mag >= limit {
                    continue;
                }
            }
            let gid = dso.kind.gid();
            let marker = SkyMarker {
                position: dso.position,
                size: self.style.dso.marker.size * self.scale,
                color: None,
                object: MarkedObject::Dso(dso.clone()),
            };
            match by_type.iter_mut().find(|(g, _)| *g == gid) {
                Some((_, markers)) => markers.push(marker),
                None => by_type.push((gid, vec![marker])),
            }
        }

        let style = self.style.dso.marker.clone();
        let start = self.objects().markers.len();
        let mut count = 0;
        for (gid, markers) in &by_type {
            count += self.primitives.scatter_markers(markers, &style, gid)?;
        }
        if labels {
            let label = self.style.dso.label.clone();
            self.label_markers(start, &label, "dso-label")?;
        }
        Ok(count)
    }

    /// Plot planets at caller-supplied positions.
    pub fn planets(&mut self, planets: &[Planet], labels: bool) -> Result<usize> {
        let markers: Vec<SkyMarker> = planets
            .iter()
            .map(|p| SkyMarker {
                position: p.position,
                size: self.style.planet.marker.size * self.scale,
                color: None,
                object: MarkedObject::Planet(p.clone()),
            })
            .collect();
        let style = self.style.planet.marker.clone();
        let start = self.objects().markers.len();
        let count = self
            .primitives
            .scatter_markers(&markers, &style, "planet-marker")?;
        if labels {
            let label = self.style.planet.label.clone();
            self.label_markers(start, &label, "planet-label")?;
        }
        Ok(count)
    }

    /// Arbitrary markers in one group.
    pub fn markers(&mut self, markers: &[SkyMarker], style: &MarkerStyle) -> Result<usize> {
        self.primitives.scatter_markers(markers, style, "marker")
    }

    fn label_markers(&mut self, start: usize, style: &LabelStyle, gid: &str) -> Result<()> {
        let candidates: Vec<(Equatorial, String)> = self.objects().markers[start..]
            .iter()
            .filter_map(|m| {
                let name = match &m.marker.object {
                    MarkedObject::Dso(d) => d.name.clone().unwrap_or_else(|| d.id.clone()),
                    MarkedObject::Planet(p) => p.name.clone(),
                    MarkedObject::Custom => return None,
                };
                Some((m.marker.position, name))
            })
            .collect();
        for (at, name) in candidates {
            self.text(at, &name, style, gid)?;
        }
        Ok(())
    }

    pub fn polygon(&mut self, points: &[Equatorial], style: &PolygonStyle) -> Result<()> {
        self.primitives.polygon(points, style, "polygon")
    }

    /// Circle of angular `radius` degrees around `center`.
    pub fn circle(&mut self, center: Equatorial, radius: f64, style: &PolygonStyle) -> Result<()> {
        let ring = small_circle(center, radius, CIRCLE_STEPS);
        self.primitives.polygon(&ring, style, "circle")
    }

    /// Place a label, trying the style's fallback anchors when it collides
    /// with an earlier label or leaves the plot area. Returns `None` when
    /// the label could not be placed.
    pub fn text(
        &mut self,
        at: Equatorial,
        text: &str,
        style: &LabelStyle,
        gid: &str,
    ) -> Result<Option<LabelId>> {
        if !self.hide_colliding_labels {
            let props = TextProps::from_label(style, style.anchor_point);
            let id = self.primitives.text(at, text, &props, gid)?;
            if let Some(rect) = id.and_then(|id| self.primitives.label_extent(id)) {
                self.labels.place(rect);
            }
            return Ok(id);
        }

        let area = self.primitives.plot_area();
        for anchor in style.anchor_sequence() {
            let props = TextProps::from_label(style, anchor);
            let Some(id) = self.primitives.text(at, text, &props, gid)? else {
                return Ok(None);
            };
            let verdict = self
                .primitives
                .label_extent(id)
                .map(|rect| self.labels.check(&rect, &area).map(|_| rect));
            match verdict {
                Some(Ok(rect)) => {
                    self.labels.place(rect);
                    return Ok(Some(id));
                }
                Some(Err(reason)) => {
                    debug!("label '{text}' at {anchor}: {reason:?}, retrying");
                    self.primitives.remove_text(id);
                }
                None => {
                    self.primitives.remove_text(id);
                }
            }
        }
        debug!("label '{text}' abandoned");
        Ok(None)
    }

    pub fn gradient_background(&mut self, gradient: &GradientStyle) -> Result<()> {
        self.primitives.gradient_background(gradient)
    }

    pub fn info_table(&mut self, table: &InfoTable) -> Result<()> {
        let style = self.style.info_text.clone();
        self.primitives.info_table(table, &style)
    }

    pub fn border(&mut self) -> Result<()> {
        let style = self.style.border.clone();
        self.primitives.border(&style)
    }

    /// Custom polyline in sky coordinates.
    pub fn line(&mut self, points: &[Equatorial], style: &PathStyle) -> Result<()> {
        self.primitives.line(points, style, "line")
    }

    pub fn export(&mut self, path: &Path) -> Result<ExportReport> {
        self.primitives.export(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::command::CommandData;
    use crate::interactive::CommandKind;
    use approx::assert_relative_eq;

    fn orion() -> SkyPlot {
        SkyPlot::map(
            MapProjection::PlateCarree,
            SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_ecliptic_points() {
        let p = ecliptic_point(90.0);
        assert_relative_eq!(p.ra, 90.0, epsilon = 1e-9);
        assert_relative_eq!(p.dec, OBLIQUITY_J2000, epsilon = 1e-9);
        let p = ecliptic_point(0.0);
        assert_relative_eq!(p.dec, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_small_circle_radius() {
        let center = Equatorial::new(83.8, -5.4);
        let g = crate::projection::Gnomonic::new(center);
        for p in small_circle(center, 3.0, 24) {
            assert_relative_eq!(g.separation(&p), 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_stars_with_filter() {
        let mut plot = orion();
        let bright = plot.stars(StarFilter::brighter_than(2.0)).unwrap();
        assert!(bright > 0);
        for p in &plot.objects().stars {
            assert!(p.star.magnitude < 2.0);
        }
    }

    #[test]
    fn test_labels_retry_and_abandon() {
        let mut plot = orion();
        let style = LabelStyle::default();
        let at = Equatorial::new(88.79, 7.41);
        let first = plot.text(at, "Betelgeuse", &style, "test").unwrap();
        assert!(first.is_some());
        // Each retry lands on a different anchor until every anchor is taken.
        let mut placed = 1;
        for _ in 0..style.anchor_sequence().len() + 2 {
            if plot.text(at, "Betelgeuse", &style, "test").unwrap().is_some() {
                placed += 1;
            }
        }
        assert!(placed <= style.anchor_sequence().len());
        assert!(plot.text(at, "Betelgeuse", &style, "test").unwrap().is_none());
    }

    #[test]
    fn test_reference_lines_are_named() {
        let config = ChartConfig::map(MapProjection::PlateCarree, SkyExtent::FULL_SKY);
        let mut plot = SkyPlot::interactive(&config).unwrap();
        plot.ecliptic().unwrap();
        plot.celestial_equator().unwrap();

        let recorder = plot.primitives().recorder();
        let labels: Vec<(&str, &str)> = recorder
            .commands_of(CommandKind::Text)
            .filter_map(|c| match &c.data {
                CommandData::Text { text, .. } => Some((c.gid.as_str(), text.as_str())),
                _ => None,
            })
            .collect();
        assert!(labels.contains(&("ecliptic-label", "ECLIPTIC")));
        assert!(labels.contains(&("celestial-equator-label", "CELESTIAL EQUATOR")));
    }

    #[test]
    fn test_equator_breaks_at_seam() {
        let plot = SkyPlot::map(MapProjection::Mollweide, SkyExtent::FULL_SKY).unwrap();
        let equator: Vec<Equatorial> = sweep(LINE_STEP_DEG)
            .map(|ra| Equatorial::new(ra, 0.0))
            .collect();
        let runs = plot.projector().project_path(&equator);
        assert!(!runs.is_empty());
        for run in &runs {
            for pair in run.windows(2) {
                // No run jumps across the chart.
                assert!((pair[0].x - pair[1].x).abs() < 10.0);
            }
        }
    }
}
