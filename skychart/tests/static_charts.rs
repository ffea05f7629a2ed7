//! Static surface tests: backend registry, configs and export fallbacks.

use skychart::backend::svg::SvgBackend;
use skychart::backend::BackendRegistry;
use skychart::error::ConfigError;
use skychart::projection::MapProjection;
use skychart::{
    backend_names, create_backend, register_backend, ChartConfig, ChartError, ChartKind,
    Equatorial, ExportFormat, SkyExtent, SkyPlot, StarFilter,
};
use test_helpers::{chart_artifact, init_test_logging};

#[test]
fn test_unknown_backend_lists_available() {
    let err = match create_backend("matplotlib") {
        Err(e) => e,
        Ok(_) => panic!("unexpected backend"),
    };
    match &err {
        ConfigError::UnknownBackend { name, available } => {
            assert_eq!(name, "matplotlib");
            assert!(available.iter().any(|n| n == "svg"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("svg"));
}

#[test]
fn test_registered_backend_usable_by_name() {
    register_backend("svg-test", || Box::new(SvgBackend::new()));
    assert!(backend_names().iter().any(|n| n == "svg-test"));

    let mut config = ChartConfig::optic(Equatorial::new(83.8, -5.4), 15.0);
    config.backend = "svg-test".into();
    let mut plot = SkyPlot::new(&config).unwrap();
    assert!(plot.stars(StarFilter::All).unwrap() > 0);
    assert_eq!(plot.projector().kind(), ChartKind::Optic);
}

#[test]
fn test_local_registry_isolated() {
    let mut registry = BackendRegistry::new();
    assert!(registry.create("svg").is_err());
    registry.register("svg", || Box::new(SvgBackend::new()));
    let backend = registry.create("svg").unwrap();
    assert_eq!(backend.name(), "svg");
    assert_eq!(registry.names(), vec!["svg".to_string()]);
}

#[test]
fn test_config_from_json() {
    let json = r##"{
        "chart": {"type": "map", "projection": "mollweide"},
        "resolution": 1024,
        "style": {"background_color": "#101020"}
    }"##;
    let config = ChartConfig::from_json_str(json).unwrap();
    assert_eq!(config.resolution, 1024);
    assert_eq!(config.backend, "svg");
    let projector = config.to_projector().unwrap();
    assert_eq!(projector.kind(), ChartKind::Map);

    let bad = ChartConfig::from_json_str(r##"{"style": {"background_color": "bluish"}}"##);
    assert!(bad.is_err());
}

#[test]
fn test_unknown_backend_fails_chart_creation() {
    let mut config = ChartConfig::default();
    config.backend = "nope".into();
    let err = SkyPlot::new(&config).unwrap_err();
    assert!(matches!(err, ChartError::Config(ConfigError::UnknownBackend { .. })));
}

#[test]
fn test_export_fallbacks() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let extent = SkyExtent::new(60.0, 120.0, -10.0, 30.0).unwrap();
    let mut plot = SkyPlot::map(MapProjection::Miller, extent).unwrap();
    plot.stars(StarFilter::brighter_than(4.0)).unwrap();
    plot.constellations().unwrap();
    plot.border().unwrap();

    let report = plot.export(&dir.path().join("map.pdf")).unwrap();
    assert!(report.fell_back);
    assert_eq!(report.format, ExportFormat::Svg);
    assert!(dir.path().join("map.svg").exists());

    // Static charts cannot write HTML.
    let report = plot.export(&dir.path().join("map.html")).unwrap();
    assert!(report.fell_back);
    assert_eq!(report.format, ExportFormat::Svg);

    assert!(plot.export(&dir.path().join("map.docx")).is_err());

    let artifact = chart_artifact("static", "orion_miller.svg").unwrap();
    plot.export(&artifact).unwrap();
}

#[cfg(feature = "raster")]
#[test]
fn test_png_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut plot = SkyPlot::optic(Equatorial::new(83.8, -5.4), 20.0).unwrap();
    plot.stars(StarFilter::All).unwrap();
    let report = plot.export(&dir.path().join("optic.png")).unwrap();
    assert!(!report.fell_back);
    let bytes = std::fs::read(&report.path).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}

#[test]
fn test_plotly_backend_writes_html() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ChartConfig::map(MapProjection::PlateCarree, SkyExtent::FULL_SKY);
    config.backend = "plotly".into();
    let mut plot = SkyPlot::new(&config).unwrap();
    plot.stars(StarFilter::brighter_than(2.0)).unwrap();

    let report = plot.export(&dir.path().join("sky.svg")).unwrap();
    assert!(report.fell_back);
    assert_eq!(report.format, ExportFormat::Html);
    let html = std::fs::read_to_string(&report.path).unwrap();
    assert!(html.contains("Plotly.newPlot"));
}
