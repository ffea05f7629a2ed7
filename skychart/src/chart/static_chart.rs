use log::{debug, info, warn};
use std::path::Path;

use super::{
    border_ring, compass_points, compass_style, outline_style, ChartFrame, ChartPrimitives,
    ConstellationLines, InfoTable, LabelId, PlottedMarker, PlottedObjects, PlottedStar, SkyMarker,
    BORDER_STEPS,
};
use crate::backend::{create_backend, PixelRect, PlotBackend, TextProps};
use crate::catalog::Star;
use crate::config::ChartConfig;
use crate::coords::{Equatorial, NativePoint};
use crate::error::{BackendError, ConfigError, Result};
use crate::export::{self, ExportFormat, ExportReport};
use crate::projection::{AxisLimits, ChartKind};
use crate::style::{
    AnchorPoint, FontWeight, GradientStyle, HAlign, LabelStyle, MarkerStyle, PathStyle,
    PolygonStyle, ZOrder,
};

/// Figure size for a chart of the given limits: `resolution` wide, height
/// following the native aspect ratio.
fn figure_size(resolution: u32, limits: &AxisLimits) -> (u32, u32) {
    let aspect = if limits.width() > 0.0 {
        limits.height() / limits.width()
    } else {
        1.0
    };
    let height = (resolution as f64 * aspect).round() as u32;
    (resolution, height.clamp((resolution / 8).max(1), resolution))
}

/// The static pipeline: projects sky coordinates and draws onto a backend.
pub struct StaticChart {
    backend: Box<dyn PlotBackend>,
    frame: ChartFrame,
    objects: PlottedObjects,
}

impl std::fmt::Debug for StaticChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticChart")
            .field("backend", &self.backend.name())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl StaticChart {
    /// Chart on the backend named in the config.
    pub fn new(config: &ChartConfig) -> Result<Self> {
        config.validate()?;
        let backend = create_backend(&config.backend)?;
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: &ChartConfig, mut backend: Box<dyn PlotBackend>) -> Result<Self> {
        let projector = config.to_projector()?;
        let limits = projector.axis_limits();
        let (width, height) = figure_size(config.resolution, &limits);

        backend.create_figure(width, height)?;
        backend.create_subplot()?;
        backend.set_extent(limits);
        backend.set_axis_off();
        backend.set_aspect_equal();
        let style = &config.style;
        backend.set_background_color(&style.background_color, &style.figure_background_color)?;

        info!(
            "created {} chart on '{}' backend ({width}x{height})",
            projector.kind(),
            backend.name()
        );
        Ok(Self {
            backend,
            frame: ChartFrame {
                projector,
                limits,
                resolution: config.resolution,
                background_color: style.effective_background().to_string(),
                figure_background_color: style.figure_background_color.clone(),
            },
            objects: PlottedObjects::default(),
        })
    }

    pub fn backend(&self) -> &dyn PlotBackend {
        self.backend.as_ref()
    }

    pub fn set_title(&mut self, title: &str) {
        self.backend.set_title(title);
    }

    /// Native position of a sky point inside the chart's domain.
    fn visible(&self, eq: &Equatorial) -> Option<NativePoint> {
        if !self.frame.projector.contains(eq) {
            return None;
        }
        self.frame.projector.project(eq).finite()
    }
}

impl ChartPrimitives for StaticChart {
    fn frame(&self) -> &ChartFrame {
        &self.frame
    }

    fn objects(&self) -> &PlottedObjects {
        &self.objects
    }

    fn plot_area(&self) -> PixelRect {
        self.backend.plot_area()
    }

    fn scatter_stars(
        &mut self,
        stars: &[Star],
        sizes: &[f64],
        style: &MarkerStyle,
    ) -> Result<usize> {
        if stars.len() != sizes.len() {
            return Err(BackendError::LengthMismatch {
                what: "star sizes",
                left: stars.len(),
                right: sizes.len(),
            }
            .into());
        }
        let plotted: Vec<PlottedStar> = stars
            .iter()
            .zip(sizes)
            .filter_map(|(star, size)| {
                Some(PlottedStar {
                    point: self.visible(&star.position)?,
                    star: star.clone(),
                    size: *size,
                    color: style.color.clone(),
                })
            })
            .collect();
        if plotted.is_empty() {
            debug!("no stars of {} inside the chart", stars.len());
            return Ok(0);
        }
        let points: Vec<NativePoint> = plotted.iter().map(|p| p.point).collect();
        let sizes: Vec<f64> = plotted.iter().map(|p| p.size).collect();
        let colors: Vec<String> = plotted.iter().map(|p| p.color.clone()).collect();
        self.backend.scatter(&points, &sizes, &colors, style)?;

        let count = plotted.len();
        debug!("plotted {count} of {} stars", stars.len());
        self.objects.stars.extend(plotted);
        Ok(count)
    }

    fn scatter_markers(
        &mut self,
        markers: &[SkyMarker],
        style: &MarkerStyle,
        gid: &str,
    ) -> Result<usize> {
        let plotted: Vec<PlottedMarker> = markers
            .iter()
            .filter_map(|m| {
                Some(PlottedMarker {
                    point: self.visible(&m.position)?,
                    marker: m.clone(),
                    gid: gid.to_string(),
                })
            })
            .collect();
        if plotted.is_empty() {
            return Ok(0);
        }
        let points: Vec<NativePoint> = plotted.iter().map(|p| p.point).collect();
        let sizes: Vec<f64> = plotted.iter().map(|p| p.marker.size).collect();
        let colors: Vec<String> = plotted
            .iter()
            .map(|p| p.marker.color.clone().unwrap_or_else(|| style.color.clone()))
            .collect();
        self.backend.scatter(&points, &sizes, &colors, style)?;

        let count = plotted.len();
        self.objects.markers.extend(plotted);
        Ok(count)
    }

    fn polygon(&mut self, points: &[Equatorial], style: &PolygonStyle, gid: &str) -> Result<()> {
        let ring: Vec<NativePoint> = points
            .iter()
            .filter_map(|p| self.frame.projector.project(p).finite())
            .collect();
        if ring.len() < 3 {
            debug!("polygon '{gid}' has {} projectable points, skipped", ring.len());
            return Ok(());
        }
        self.backend.add_polygon(&ring, style)?;
        Ok(())
    }

    fn text(
        &mut self,
        at: Equatorial,
        text: &str,
        props: &TextProps,
        _gid: &str,
    ) -> Result<Option<LabelId>> {
        let Some(point) = self.visible(&at) else {
            return Ok(None);
        };
        let id = self.backend.add_text(point, text, props)?;
        Ok(Some(LabelId(id)))
    }

    fn remove_text(&mut self, id: LabelId) -> bool {
        self.backend.remove(id.0)
    }

    fn label_extent(&self, id: LabelId) -> Option<PixelRect> {
        self.backend.text_extent(id.0)
    }

    fn line(&mut self, points: &[Equatorial], style: &PathStyle, _gid: &str) -> Result<()> {
        for run in self.frame.projector.project_path(points) {
            self.backend.plot_lines(&run, style)?;
        }
        Ok(())
    }

    fn constellations(&mut self, lines: &[ConstellationLines], style: &PathStyle) -> Result<usize> {
        let mut drawn = 0;
        for constellation in lines {
            let segments: Vec<(NativePoint, NativePoint)> = constellation
                .segments
                .iter()
                .filter_map(|(a, b)| self.frame.projector.project_segment(a, b))
                .collect();
            if segments.is_empty() {
                continue;
            }
            for (a, b) in &segments {
                self.backend.plot_lines(&[*a, *b], style)?;
            }
            drawn += segments.len();
            self.objects.constellations.push(constellation.clone());
        }
        debug!("plotted {drawn} constellation segments");
        Ok(drawn)
    }

    fn gradient_background(&mut self, gradient: &GradientStyle) -> Result<()> {
        self.backend
            .add_gradient(gradient, ZOrder::Background.value())?;
        Ok(())
    }

    fn info_table(&mut self, table: &InfoTable, style: &LabelStyle) -> Result<()> {
        let n = table.columns.len();
        let lengths = [
            ("info values", table.values.len()),
            ("info widths", table.widths.len()),
        ];
        for (what, len) in lengths {
            if len != n {
                return Err(BackendError::LengthMismatch {
                    what,
                    left: n,
                    right: len,
                }
                .into());
            }
        }
        let total: f64 = table.widths.iter().sum();
        if !(total > 0.0) {
            return Err(
                ConfigError::Extent("info table widths must sum to a positive value".into()).into(),
            );
        }

        let l = self.frame.limits;
        let mut props = TextProps::from_label(style, AnchorPoint::Center);
        props.ha = HAlign::Center;
        let header = TextProps {
            font_weight: FontWeight::Bold,
            ..props.clone()
        };
        let mut left = 0.0;
        for ((column, value), width) in table.columns.iter().zip(&table.values).zip(&table.widths) {
            let frac = left + width / total / 2.0;
            let x = l.x_min + (l.x_max - l.x_min) * frac;
            let header_y = l.y_min + (l.y_max - l.y_min) * 0.08;
            let value_y = l.y_min + (l.y_max - l.y_min) * 0.03;
            self.backend
                .add_text(NativePoint::new(x, header_y), column, &header)?;
            self.backend
                .add_text(NativePoint::new(x, value_y), value, &props)?;
            left += width / total;
        }
        Ok(())
    }

    fn border(&mut self, style: &PathStyle) -> Result<()> {
        let limits = self.frame.limits;
        match self.frame.projector.kind() {
            ChartKind::Zenith | ChartKind::Optic => {
                let ring = border_ring(&limits, BORDER_STEPS);
                self.backend.add_polygon(&ring, &outline_style(style))?;
                if self.frame.projector.kind() == ChartKind::Zenith {
                    let props = TextProps::from_label(&compass_style(style), AnchorPoint::Center);
                    for (letter, at) in compass_points(&limits) {
                        self.backend.add_text(at, letter, &props)?;
                    }
                }
            }
            ChartKind::Map | ChartKind::Horizon => {
                let frame = [
                    NativePoint::new(limits.x_min, limits.y_min),
                    NativePoint::new(limits.x_max, limits.y_min),
                    NativePoint::new(limits.x_max, limits.y_max),
                    NativePoint::new(limits.x_min, limits.y_max),
                ];
                self.backend.add_polygon(&frame, &outline_style(style))?;
            }
        }
        Ok(())
    }

    fn supports_format(&self, format: ExportFormat) -> bool {
        self.backend.supports(format)
    }

    /// A raster conversion that fails at write time falls back to the
    /// backend's fallback format like an unsupported one does.
    fn export(&mut self, path: &Path) -> Result<ExportReport> {
        let backend = self.backend.as_ref();
        let fallback = backend.fallback_format();
        let report = export::resolve(path, |f| backend.supports(f), fallback)?;
        let report = match backend.export(&report.path, report.format) {
            Err(err @ (BackendError::Raster(_) | BackendError::RasterUnavailable))
                if report.format != fallback =>
            {
                let fallback_path = report.path.with_extension(fallback.extension());
                warn!(
                    "{} export failed ({err}); writing {} as {fallback} instead",
                    report.format,
                    fallback_path.display()
                );
                backend.export(&fallback_path, fallback)?;
                ExportReport {
                    path: fallback_path,
                    format: fallback,
                    fell_back: true,
                }
            }
            result => {
                result?;
                report
            }
        };
        info!("exported {} chart to {}", report.format, report.path.display());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::svg::SvgBackend;
    use crate::backend::ElementId;
    use crate::catalog::Catalog;
    use crate::projection::{MapProjection, Observer, SkyExtent};

    fn orion_map() -> StaticChart {
        let extent = SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap();
        StaticChart::new(&ChartConfig::map(MapProjection::PlateCarree, extent)).unwrap()
    }

    #[test]
    fn test_figure_follows_aspect() {
        let limits = AxisLimits {
            x_min: 180.0,
            x_max: -180.0,
            y_min: -90.0,
            y_max: 90.0,
        };
        assert_eq!(figure_size(2048, &limits), (2048, 1024));
    }

    #[test]
    fn test_stars_outside_extent_skipped() {
        let mut chart = orion_map();
        let catalog = Catalog::bundled();
        let sizes = vec![10.0; catalog.stars.len()];
        let drawn = chart
            .scatter_stars(&catalog.stars, &sizes, &MarkerStyle::default())
            .unwrap();
        assert!(drawn > 0);
        assert!(drawn < catalog.stars.len());
        assert_eq!(chart.objects().stars.len(), drawn);
        for plotted in &chart.objects().stars {
            let ra = plotted.star.position.ra;
            assert!((60.0..=120.0).contains(&ra), "ra {ra} outside extent");
        }
    }

    #[test]
    fn test_text_and_remove() {
        let mut chart = orion_map();
        let props = TextProps::from_label(&LabelStyle::default(), AnchorPoint::Center);
        let id = chart
            .text(Equatorial::new(88.79, 7.41), "Betelgeuse", &props, "labels")
            .unwrap()
            .unwrap();
        assert!(chart.label_extent(id).is_some());
        assert!(chart.remove_text(id));
        assert!(!chart.remove_text(id));

        let outside = chart
            .text(Equatorial::new(200.0, 7.0), "nowhere", &props, "labels")
            .unwrap();
        assert!(outside.is_none());
    }

    #[test]
    fn test_zenith_border_and_info_table() {
        let observer = Observer {
            latitude: 40.0,
            longitude: 0.0,
            lst: 90.0,
        };
        let mut chart = StaticChart::new(&ChartConfig::zenith(observer)).unwrap();
        chart.border(&PathStyle::default()).unwrap();
        let table = InfoTable {
            columns: vec!["Observer".into(), "LST".into()],
            values: vec!["40.0°N".into(), "6h".into()],
            widths: vec![2.0, 1.0],
        };
        chart.info_table(&table, &LabelStyle::default()).unwrap();

        let bad = InfoTable {
            widths: vec![1.0],
            ..table
        };
        assert!(chart.info_table(&bad, &LabelStyle::default()).is_err());
    }

    /// SVG surface whose PNG conversion always fails at write time.
    struct FailingRaster(SvgBackend);

    impl PlotBackend for FailingRaster {
        fn name(&self) -> &'static str {
            "failing-raster"
        }
        fn create_figure(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
            self.0.create_figure(width, height)
        }
        fn create_subplot(&mut self) -> Result<(), BackendError> {
            self.0.create_subplot()
        }
        fn set_xlim(&mut self, left: f64, right: f64) {
            self.0.set_xlim(left, right)
        }
        fn set_ylim(&mut self, bottom: f64, top: f64) {
            self.0.set_ylim(bottom, top)
        }
        fn limits(&self) -> AxisLimits {
            self.0.limits()
        }
        fn set_background_color(&mut self, axes: &str, figure: &str) -> Result<(), BackendError> {
            self.0.set_background_color(axes, figure)
        }
        fn set_title(&mut self, title: &str) {
            self.0.set_title(title)
        }
        fn scatter(
            &mut self,
            points: &[NativePoint],
            sizes: &[f64],
            colors: &[String],
            style: &MarkerStyle,
        ) -> Result<ElementId, BackendError> {
            self.0.scatter(points, sizes, colors, style)
        }
        fn plot_lines(
            &mut self,
            path: &[NativePoint],
            style: &PathStyle,
        ) -> Result<ElementId, BackendError> {
            self.0.plot_lines(path, style)
        }
        fn add_text(
            &mut self,
            at: NativePoint,
            text: &str,
            props: &TextProps,
        ) -> Result<ElementId, BackendError> {
            self.0.add_text(at, text, props)
        }
        fn add_polygon(
            &mut self,
            points: &[NativePoint],
            style: &PolygonStyle,
        ) -> Result<ElementId, BackendError> {
            self.0.add_polygon(points, style)
        }
        fn add_gradient(
            &mut self,
            gradient: &GradientStyle,
            zorder: i32,
        ) -> Result<ElementId, BackendError> {
            self.0.add_gradient(gradient, zorder)
        }
        fn remove(&mut self, id: ElementId) -> bool {
            self.0.remove(id)
        }
        fn text_extent(&self, id: ElementId) -> Option<PixelRect> {
            self.0.text_extent(id)
        }
        fn plot_area(&self) -> PixelRect {
            self.0.plot_area()
        }
        fn set_axis_off(&mut self) {
            self.0.set_axis_off()
        }
        fn set_aspect_equal(&mut self) {
            self.0.set_aspect_equal()
        }
        fn supports(&self, format: ExportFormat) -> bool {
            matches!(format, ExportFormat::Svg | ExportFormat::Png)
        }
        fn fallback_format(&self) -> ExportFormat {
            ExportFormat::Svg
        }
        fn export(&self, path: &Path, format: ExportFormat) -> Result<(), BackendError> {
            match format {
                ExportFormat::Png => Err(BackendError::Raster("canvas allocation failed".into())),
                other => self.0.export(path, other),
            }
        }
        fn close(&mut self) {
            self.0.close()
        }
    }

    #[test]
    fn test_failed_raster_falls_back_to_svg() {
        let _ = env_logger::builder().is_test(true).try_init();
        let extent = SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap();
        let config = ChartConfig::map(MapProjection::PlateCarree, extent);
        let backend = Box::new(FailingRaster(SvgBackend::new()));
        let mut chart = StaticChart::with_backend(&config, backend).unwrap();
        chart.border(&PathStyle::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let report = chart.export(&dir.path().join("orion.png")).unwrap();
        assert!(report.fell_back);
        assert_eq!(report.format, ExportFormat::Svg);
        assert_eq!(report.path, dir.path().join("orion.svg"));
        assert!(report.path.exists());
        assert!(!dir.path().join("orion.png").exists());
    }

    #[test]
    fn test_unknown_backend() {
        let config = ChartConfig {
            backend: "bokeh".into(),
            ..ChartConfig::default()
        };
        let err = StaticChart::new(&config).unwrap_err();
        assert!(err.to_string().contains("bokeh"));
    }
}
