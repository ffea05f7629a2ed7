//! Backend-agnostic record of one primitive drawing operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter};

use crate::catalog::{Dso, Planet, Star};
use crate::coords::NativePoint;
use crate::style::{FontWeight, GradientDirection, HAlign, LineStyle, MarkerSymbol, VAlign};

/// Stable identity of a recorded command, used for retraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub(crate) u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    Scatter,
    Line,
    Polygon,
    Text,
    LineCollection,
    Gradient,
    InfoTable,
}

/// Kind-specific geometry. Parallel arrays always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandData {
    Scatter {
        x: Vec<f64>,
        y: Vec<f64>,
        sizes: Vec<f64>,
        colors: Vec<String>,
        alphas: Vec<f64>,
    },
    Line {
        x: Vec<f64>,
        y: Vec<f64>,
    },
    /// Implicitly closed ring.
    Polygon {
        points: Vec<NativePoint>,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
    },
    LineCollection {
        segments: Vec<[NativePoint; 2]>,
    },
    Gradient {
        direction: GradientDirection,
        color_stops: Vec<(f64, String)>,
    },
    InfoTable {
        columns: Vec<String>,
        values: Vec<String>,
        widths: Vec<f64>,
    },
}

impl CommandData {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandData::Scatter { .. } => CommandKind::Scatter,
            CommandData::Line { .. } => CommandKind::Line,
            CommandData::Polygon { .. } => CommandKind::Polygon,
            CommandData::Text { .. } => CommandKind::Text,
            CommandData::LineCollection { .. } => CommandKind::LineCollection,
            CommandData::Gradient { .. } => CommandKind::Gradient,
            CommandData::InfoTable { .. } => CommandKind::InfoTable,
        }
    }

    /// Number of elements metadata entries correspond to: points for a
    /// scatter, segments for a line collection, one otherwise.
    pub fn element_count(&self) -> usize {
        match self {
            CommandData::Scatter { x, .. } => x.len(),
            CommandData::LineCollection { segments } => segments.len(),
            _ => 1,
        }
    }
}

/// Flat, renderer-neutral style attributes. Unset fields take the
/// renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub color: Option<String>,
    pub fill_color: Option<String>,
    pub edge_color: Option<String>,
    pub edge_width: Option<f64>,
    pub line_width: Option<f64>,
    pub line_style: Option<LineStyle>,
    pub alpha: Option<f64>,
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub font_color: Option<String>,
    pub font_name: Option<String>,
    pub ha: Option<HAlign>,
    pub va: Option<VAlign>,
    pub marker: Option<MarkerSymbol>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarMeta {
    pub hip: u32,
    pub name: Option<String>,
    pub bayer: Option<String>,
    pub magnitude: f64,
    pub ra: f64,
    pub dec: f64,
    pub constellation: Option<String>,
    pub bv: Option<f64>,
}

impl From<&Star> for StarMeta {
    fn from(star: &Star) -> Self {
        Self {
            hip: star.hip,
            name: star.name.clone(),
            bayer: star.bayer.clone(),
            magnitude: star.magnitude,
            ra: star.position.ra,
            dec: star.position.dec,
            constellation: star.constellation.clone(),
            bv: star.bv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DsoMeta {
    pub id: String,
    pub name: Option<String>,
    pub dso_type: String,
    pub magnitude: Option<f64>,
    pub ra: f64,
    pub dec: f64,
}

impl From<&Dso> for DsoMeta {
    fn from(dso: &Dso) -> Self {
        Self {
            id: dso.id.clone(),
            name: dso.name.clone(),
            dso_type: dso.kind.display_name().to_string(),
            magnitude: dso.magnitude,
            ra: dso.position.ra,
            dec: dso.position.dec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetMeta {
    pub name: String,
    pub magnitude: Option<f64>,
    pub ra: f64,
    pub dec: f64,
}

impl From<&Planet> for PlanetMeta {
    fn from(planet: &Planet) -> Self {
        Self {
            name: planet.name.clone(),
            magnitude: planet.magnitude,
            ra: planet.position.ra,
            dec: planet.position.dec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationMeta {
    pub name: String,
    pub iau_id: String,
}

/// Per-element annotation used to build hover text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementMeta {
    Star(StarMeta),
    Dso(DsoMeta),
    Planet(PlanetMeta),
    Constellation(ConstellationMeta),
}

impl ElementMeta {
    pub fn as_star(&self) -> Option<&StarMeta> {
        match self {
            ElementMeta::Star(s) => Some(s),
            _ => None,
        }
    }
}

/// Draw order and legend grouping of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub zorder: i32,
    pub gid: String,
}

impl Layer {
    pub fn new(zorder: i32, gid: impl Into<String>) -> Self {
        Self {
            zorder,
            gid: gid.into(),
        }
    }
}

/// One recorded drawing operation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingCommand {
    pub data: CommandData,
    pub style: Style,
    pub metadata: Vec<ElementMeta>,
    pub zorder: i32,
    pub gid: String,
}

impl DrawingCommand {
    pub fn kind(&self) -> CommandKind {
        self.data.kind()
    }
}

/// A per-point attribute given either once for the whole batch or per point.
#[derive(Debug, Clone, PartialEq)]
pub enum PerPoint<T> {
    Uniform(T),
    Each(Vec<T>),
}

impl<T: Clone> PerPoint<T> {
    /// Expand to exactly `n` values; `Err(len)` when a per-point list has the
    /// wrong length.
    pub fn broadcast(self, n: usize) -> Result<Vec<T>, usize> {
        match self {
            PerPoint::Uniform(v) => Ok(vec![v; n]),
            PerPoint::Each(values) if values.len() == n => Ok(values),
            PerPoint::Each(values) => Err(values.len()),
        }
    }
}

impl<T> From<Vec<T>> for PerPoint<T> {
    fn from(values: Vec<T>) -> Self {
        PerPoint::Each(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_broadcast_uniform_and_each() {
        assert_eq!(PerPoint::Uniform(0.5).broadcast(3), Ok(vec![0.5, 0.5, 0.5]));
        assert_eq!(PerPoint::Each(vec![1, 2]).broadcast(2), Ok(vec![1, 2]));
        assert_eq!(PerPoint::Each(vec![1, 2]).broadcast(3), Err(2));
    }

    #[test]
    fn test_element_count() {
        let scatter = CommandData::Scatter {
            x: vec![0.0; 4],
            y: vec![0.0; 4],
            sizes: vec![1.0; 4],
            colors: vec!["#fff".into(); 4],
            alphas: vec![1.0; 4],
        };
        assert_eq!(scatter.element_count(), 4);
        assert_eq!(scatter.kind(), CommandKind::Scatter);
        let text = CommandData::Text {
            x: 0.0,
            y: 0.0,
            text: "Orion".into(),
        };
        assert_eq!(text.element_count(), 1);
    }

    #[test]
    fn test_metadata_serializes_with_type_tag() {
        let meta = ElementMeta::Constellation(ConstellationMeta {
            name: "Orion".into(),
            iau_id: "ori".into(),
        });
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            json!({"type": "constellation", "name": "Orion", "iau_id": "ori"})
        );
        let back: ElementMeta = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CommandKind::LineCollection.to_string(), "line_collection");
        assert_eq!(CommandKind::InfoTable.to_string(), "info_table");
    }
}
