//! Chart configuration loadable from JSON.
//!
//! Every field has a default, so `{}` is a valid configuration: a full-sky
//! plate carrée map drawn on the `svg` backend at 2048 px.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::coords::Equatorial;
use crate::error::ConfigError;
use crate::interactive::recorder::DEFAULT_RESOLUTION;
use crate::projection::{MapProjection, Observer, Projector, SkyExtent};
use crate::style::PlotStyle;

/// Chart family and its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartSpec {
    Map {
        #[serde(default)]
        projection: MapProjection,
        #[serde(default = "full_sky")]
        extent: SkyExtent,
    },
    Zenith {
        observer: Observer,
    },
    Horizon {
        observer: Observer,
        #[serde(default = "default_azimuth")]
        az: (f64, f64),
        #[serde(default = "default_altitude")]
        alt: (f64, f64),
    },
    Optic {
        center: Equatorial,
        /// Field of view diameter in degrees.
        fov: f64,
    },
}

fn full_sky() -> SkyExtent {
    SkyExtent::FULL_SKY
}

fn default_azimuth() -> (f64, f64) {
    (0.0, 360.0)
}

fn default_altitude() -> (f64, f64) {
    (0.0, 60.0)
}

impl Default for ChartSpec {
    fn default() -> Self {
        ChartSpec::Map {
            projection: MapProjection::default(),
            extent: SkyExtent::FULL_SKY,
        }
    }
}

/// Smallest and largest accepted output width in pixels.
pub const MIN_RESOLUTION: u32 = 64;
pub const MAX_RESOLUTION: u32 = 16384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub chart: ChartSpec,
    /// Output width and height of the static surface in pixels.
    pub resolution: u32,
    /// Registry name of the static backend.
    pub backend: String,
    pub hide_colliding_labels: bool,
    /// Multiplier for marker sizes and line widths.
    pub scale: f64,
    pub style: PlotStyle,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            chart: ChartSpec::default(),
            resolution: DEFAULT_RESOLUTION,
            backend: "svg".into(),
            hide_colliding_labels: true,
            scale: 1.0,
            style: PlotStyle::default(),
        }
    }
}

impl ChartConfig {
    pub fn map(projection: MapProjection, extent: SkyExtent) -> Self {
        Self {
            chart: ChartSpec::Map { projection, extent },
            ..Self::default()
        }
    }

    pub fn zenith(observer: Observer) -> Self {
        Self {
            chart: ChartSpec::Zenith { observer },
            ..Self::default()
        }
    }

    pub fn horizon(observer: Observer, az: (f64, f64), alt: (f64, f64)) -> Self {
        Self {
            chart: ChartSpec::Horizon { observer, az, alt },
            ..Self::default()
        }
    }

    pub fn optic(center: Equatorial, fov: f64) -> Self {
        Self {
            chart: ChartSpec::Optic { center, fov },
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&self.resolution) {
            return Err(ConfigError::Extent(format!(
                "resolution {} outside {MIN_RESOLUTION}..={MAX_RESOLUTION}",
                self.resolution
            )));
        }
        if !(self.scale > 0.0) {
            return Err(ConfigError::Extent(format!("scale {} must be positive", self.scale)));
        }
        self.style.validate()?;
        self.to_projector().map(|_| ())
    }

    /// Apply a JSON style patch on top of the current style.
    pub fn with_style_overrides(mut self, overrides: &str) -> Result<Self, ConfigError> {
        let patch: serde_json::Value = serde_json::from_str(overrides)?;
        self.style = self.style.merged(&patch)?;
        Ok(self)
    }

    pub fn to_projector(&self) -> Result<Projector, ConfigError> {
        match &self.chart {
            ChartSpec::Map { projection, extent } => Projector::map(*projection, *extent),
            ChartSpec::Zenith { observer } => Ok(Projector::zenith(*observer)),
            ChartSpec::Horizon { observer, az, alt } => Projector::horizon(*observer, *az, *alt),
            ChartSpec::Optic { center, fov } => Projector::optic(*center, *fov),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ChartKind;

    #[test]
    fn test_empty_json_is_default() {
        let config = ChartConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ChartConfig::default());
        assert_eq!(config.to_projector().unwrap().kind(), ChartKind::Map);
    }

    #[test]
    fn test_tagged_chart_spec() {
        let config = ChartConfig::from_json_str(
            r##"{
                "chart": {"type": "optic", "center": {"ra": 83.8, "dec": -5.4}, "fov": 10.0},
                "backend": "plotly",
                "style": {"star": {"marker": {"color": "#ffeecc"}}}
            }"##,
        )
        .unwrap();
        assert_eq!(config.backend, "plotly");
        assert_eq!(config.style.star.marker.color, "#ffeecc");
        assert_eq!(config.to_projector().unwrap().kind(), ChartKind::Optic);
    }

    #[test]
    fn test_invalid_rejected() {
        assert!(ChartConfig::from_json_str(r#"{"scale": 0}"#).is_err());
        assert!(ChartConfig::from_json_str(r#"{"resolution": 0}"#).is_err());
        assert!(ChartConfig::from_json_str(r#"{"resolution": 100000}"#).is_err());
        assert!(ChartConfig::from_json_str(r#"{"resolution": 16384}"#).is_ok());
        assert!(ChartConfig::from_json_str(
            r#"{"chart": {"type": "optic", "center": {"ra": 0, "dec": 0}, "fov": 200}}"#
        )
        .is_err());
        let bad_color = r#"{"style": {"background_color": "blurple"}}"#;
        assert!(ChartConfig::from_json_str(bad_color).is_err());
    }

    #[test]
    fn test_style_overrides_merge() {
        let config = ChartConfig::default()
            .with_style_overrides(r#"{"constellation_lines": {"width": 5.0}}"#)
            .unwrap();
        assert_eq!(config.style.constellation_lines.width, 5.0);
        assert_eq!(
            config.style.constellation_lines.color,
            PlotStyle::default().constellation_lines.color
        );
    }

    #[test]
    fn test_from_missing_file() {
        let err = ChartConfig::from_json_file(Path::new("/nonexistent/skychart.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
