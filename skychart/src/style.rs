//! Backend-neutral style vocabulary and plot styles.
//!
//! Styles are plain serde structs with defaults for every field, so a JSON
//! override only needs the keys it changes; see [`PlotStyle::with_overrides`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::error::ConfigError;

/// Marker glyphs understood by both surfaces.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MarkerSymbol {
    Point,
    Plus,
    #[default]
    Circle,
    Square,
    SquareStripesDiagonal,
    Star,
    Sun,
    Diamond,
    Triangle,
    CirclePlus,
    CircleCross,
    CircleCrosshair,
    CircleDot,
    CircleDottedEdge,
    CircleDottedRings,
    CircleLine,
    Comet,
    #[strum(serialize = "star_4")]
    #[serde(rename = "star_4")]
    Star4,
    #[strum(serialize = "star_8")]
    #[serde(rename = "star_8")]
    Star8,
    Ellipse,
    Cross,
    Hexagon,
    Pentagon,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VAlign {
    Top,
    #[default]
    Center,
    Bottom,
    Baseline,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Normal,
    Bold,
    Heavy,
}

/// Where a label sits relative to the point it annotates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnchorPoint {
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl AnchorPoint {
    /// Text alignment that places the label on this side of the point.
    ///
    /// A label to the bottom right of its point is aligned by its top-left
    /// corner, so each axis is inverted.
    pub fn alignment(self) -> (VAlign, HAlign) {
        match self {
            AnchorPoint::Center => (VAlign::Center, HAlign::Center),
            AnchorPoint::Top => (VAlign::Bottom, HAlign::Center),
            AnchorPoint::Bottom => (VAlign::Top, HAlign::Center),
            AnchorPoint::Left => (VAlign::Center, HAlign::Right),
            AnchorPoint::Right => (VAlign::Center, HAlign::Left),
            AnchorPoint::TopLeft => (VAlign::Bottom, HAlign::Right),
            AnchorPoint::TopRight => (VAlign::Bottom, HAlign::Left),
            AnchorPoint::BottomLeft => (VAlign::Top, HAlign::Right),
            AnchorPoint::BottomRight => (VAlign::Top, HAlign::Left),
        }
    }
}

/// Draw-order layers. Higher values draw on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumIter)]
pub enum ZOrder {
    Background,
    Layer1,
    Layer2,
    Layer3,
    Layer4,
}

impl ZOrder {
    pub const fn value(self) -> i32 {
        match self {
            ZOrder::Background => -2000,
            ZOrder::Layer1 => -1000,
            ZOrder::Layer2 => 0,
            ZOrder::Layer3 => 1000,
            ZOrder::Layer4 => 2000,
        }
    }
}

/// An sRGB color with alpha, parsed from `#rgb`, `#rrggbb`, `#rrggbbaa` or a
/// small set of names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("orange", "#ffa500"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("gold", "#ffd700"),
    ("none", "#00000000"),
    ("transparent", "#00000000"),
];

impl Rgba {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let s = input.trim();
        if let Some((_, hex)) = NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
        {
            return Self::parse(hex);
        }
        let invalid = || ConfigError::InvalidColor(input.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| invalid())
        };
        match hex.len() {
            3 => Ok(Self {
                r: nibble(0)?,
                g: nibble(1)?,
                b: nibble(2)?,
                a: 255,
            }),
            6 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: 255,
            }),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// CSS `rgba()` form with an extra alpha multiplier.
    pub fn to_css(&self, alpha: f64) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            (self.opacity() * alpha).clamp(0.0, 1.0)
        )
    }
}

fn validate_color(color: &str) -> Result<(), ConfigError> {
    Rgba::parse(color).map(|_| ())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub color: String,
    pub alpha: f64,
    /// Marker area in points², as the static surface measures it.
    pub size: f64,
    pub symbol: MarkerSymbol,
    pub edge_color: Option<String>,
    pub edge_width: f64,
    pub zorder: i32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: "#ffffff".into(),
            alpha: 1.0,
            size: 36.0,
            symbol: MarkerSymbol::Circle,
            edge_color: None,
            edge_width: 0.0,
            zorder: ZOrder::Layer3.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    pub color: String,
    pub width: f64,
    pub style: LineStyle,
    pub alpha: f64,
    pub zorder: i32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: "#6a7f99".into(),
            width: 2.0,
            style: LineStyle::Solid,
            alpha: 1.0,
            zorder: ZOrder::Layer2.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonStyle {
    pub fill_color: Option<String>,
    pub edge_color: String,
    pub edge_width: f64,
    pub line_style: LineStyle,
    pub alpha: f64,
    pub zorder: i32,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill_color: None,
            edge_color: "#ffffff".into(),
            edge_width: 2.0,
            line_style: LineStyle::Solid,
            alpha: 1.0,
            zorder: ZOrder::Layer2.value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub font_size: f64,
    pub font_color: String,
    pub font_weight: FontWeight,
    pub font_name: String,
    pub font_alpha: f64,
    pub anchor_point: AnchorPoint,
    /// Tried in order when the preferred anchor collides.
    pub anchor_fallbacks: Vec<AnchorPoint>,
    /// Pixel offset from the anchored point.
    pub offset: f64,
    pub zorder: i32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size: 28.0,
            font_color: "#ffffff".into(),
            font_weight: FontWeight::Normal,
            font_name: "sans-serif".into(),
            font_alpha: 1.0,
            anchor_point: AnchorPoint::BottomRight,
            anchor_fallbacks: vec![
                AnchorPoint::TopRight,
                AnchorPoint::BottomLeft,
                AnchorPoint::TopLeft,
                AnchorPoint::Right,
                AnchorPoint::Left,
            ],
            offset: 4.0,
            zorder: ZOrder::Layer4.value(),
        }
    }
}

impl LabelStyle {
    /// Preferred anchor followed by its fallbacks, without repeats.
    pub fn anchor_sequence(&self) -> Vec<AnchorPoint> {
        let mut seq = vec![self.anchor_point];
        for a in &self.anchor_fallbacks {
            if !seq.contains(a) {
                seq.push(*a);
            }
        }
        seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GradientDirection {
    #[default]
    Linear,
    Radial,
}

/// Background gradient drawn beneath everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStyle {
    #[serde(default)]
    pub direction: GradientDirection,
    /// `(offset in 0..=1, color)` pairs in increasing offset order.
    pub stops: Vec<(f64, String)>,
}

/// Marker and label styling for one object family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStyle {
    pub marker: MarkerStyle,
    pub label: LabelStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub background_color: String,
    pub figure_background_color: String,
    pub gradient: Option<GradientStyle>,
    pub star: ObjectStyle,
    /// Magnitude at which a star is drawn with `star.marker.size`.
    pub star_reference_magnitude: f64,
    pub dso: ObjectStyle,
    pub planet: ObjectStyle,
    pub constellation_lines: PathStyle,
    pub constellation_labels: LabelStyle,
    pub ecliptic: PathStyle,
    pub celestial_equator: PathStyle,
    pub border: PathStyle,
    pub info_text: LabelStyle,
}

impl Default for PlotStyle {
    fn default() -> Self {
        let mut star = ObjectStyle::default();
        star.label.font_size = 22.0;

        let mut dso = ObjectStyle::default();
        dso.marker.color = "#ff6868".into();
        dso.marker.symbol = MarkerSymbol::Ellipse;
        dso.marker.edge_color = Some("#ff6868".into());
        dso.marker.edge_width = 1.5;
        dso.marker.zorder = ZOrder::Layer3.value() - 10;
        dso.label.font_color = "#ff6868".into();
        dso.label.font_size = 20.0;

        let mut planet = ObjectStyle::default();
        planet.marker.color = "#f89d00".into();
        planet.marker.size = 120.0;
        planet.marker.zorder = ZOrder::Layer3.value() + 10;
        planet.label.font_color = "#f89d00".into();

        let constellation_labels = LabelStyle {
            font_size: 26.0,
            font_color: "#c8d2e6".into(),
            font_alpha: 0.6,
            anchor_point: AnchorPoint::Center,
            anchor_fallbacks: Vec::new(),
            offset: 0.0,
            zorder: ZOrder::Layer3.value(),
            ..LabelStyle::default()
        };

        Self {
            background_color: "#000000".into(),
            figure_background_color: "#000000".into(),
            gradient: None,
            star,
            star_reference_magnitude: 4.0,
            dso,
            planet,
            constellation_lines: PathStyle {
                color: "#6a7f99".into(),
                width: 3.0,
                alpha: 0.5,
                ..PathStyle::default()
            },
            constellation_labels,
            ecliptic: PathStyle {
                color: "#e0c442".into(),
                width: 2.0,
                style: LineStyle::Dotted,
                alpha: 0.9,
                ..PathStyle::default()
            },
            celestial_equator: PathStyle {
                color: "#2d5ec2".into(),
                width: 2.0,
                style: LineStyle::DashDot,
                alpha: 0.65,
                ..PathStyle::default()
            },
            border: PathStyle {
                color: "#c8d2e6".into(),
                width: 4.0,
                zorder: ZOrder::Layer4.value(),
                ..PathStyle::default()
            },
            info_text: LabelStyle {
                font_size: 20.0,
                font_color: "#c8d2e6".into(),
                anchor_fallbacks: Vec::new(),
                ..LabelStyle::default()
            },
        }
    }
}

impl PlotStyle {
    /// Merge a JSON object of overrides into the default style.
    pub fn with_overrides(overrides: &str) -> Result<Self, ConfigError> {
        let patch: Value = serde_json::from_str(overrides)?;
        Self::default().merged(&patch)
    }

    /// Copy of `self` with `patch` merged over it key by key.
    pub fn merged(&self, patch: &Value) -> Result<Self, ConfigError> {
        let mut base = serde_json::to_value(self)?;
        merge_json(&mut base, patch);
        let style: PlotStyle = serde_json::from_value(base)?;
        style.validate()?;
        Ok(style)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_color(&self.background_color)?;
        validate_color(&self.figure_background_color)?;
        if let Some(gradient) = &self.gradient {
            for (_, color) in &gradient.stops {
                validate_color(color)?;
            }
        }
        for object in [&self.star, &self.dso, &self.planet] {
            validate_color(&object.marker.color)?;
            if let Some(edge) = &object.marker.edge_color {
                validate_color(edge)?;
            }
            validate_color(&object.label.font_color)?;
        }
        for path in [
            &self.constellation_lines,
            &self.ecliptic,
            &self.celestial_equator,
            &self.border,
        ] {
            validate_color(&path.color)?;
        }
        validate_color(&self.constellation_labels.font_color)?;
        validate_color(&self.info_text.font_color)?;
        Ok(())
    }

    /// Marker area for a star of the given magnitude; brighter is larger.
    pub fn star_size(&self, magnitude: f64, scale: f64) -> f64 {
        let steps = self.star_reference_magnitude - magnitude;
        (self.star.marker.size * 1.6_f64.powf(steps) * scale).max(1.0)
    }

    /// Background color reported to the interactive surface: black when a
    /// gradient covers the axes.
    pub fn effective_background(&self) -> &str {
        if self.gradient.is_some() {
            "#000000"
        } else {
            &self.background_color
        }
    }
}

/// Recursively merge `patch` into `base`: objects merge key by key, every
/// other value replaces.
pub fn merge_json(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_colors() {
        assert_eq!(
            Rgba::parse("#ff8000").unwrap(),
            Rgba {
                r: 255,
                g: 128,
                b: 0,
                a: 255
            }
        );
        assert_eq!(Rgba::parse("#fff").unwrap().to_hex(), "#ffffff");
        assert_eq!(Rgba::parse("#00000080").unwrap().a, 128);
        assert_eq!(Rgba::parse("White").unwrap().to_hex(), "#ffffff");
        assert!(Rgba::parse("ff0000").is_err());
        assert!(Rgba::parse("#ggg").is_err());
        assert!(Rgba::parse("#12345").is_err());
    }

    #[test]
    fn test_css_alpha_combines() {
        let c = Rgba::parse("#ff000080").unwrap();
        assert_eq!(c.to_css(0.5), "rgba(255,0,0,0.251)");
    }

    #[test]
    fn test_anchor_alignment_inverts() {
        assert_eq!(
            AnchorPoint::BottomRight.alignment(),
            (VAlign::Top, HAlign::Left)
        );
        assert_eq!(AnchorPoint::Top.alignment(), (VAlign::Bottom, HAlign::Center));
        assert_eq!(
            AnchorPoint::Center.alignment(),
            (VAlign::Center, HAlign::Center)
        );
    }

    #[test]
    fn test_anchor_sequence_dedups() {
        let style = LabelStyle {
            anchor_point: AnchorPoint::Right,
            ..LabelStyle::default()
        };
        let seq = style.anchor_sequence();
        assert_eq!(seq[0], AnchorPoint::Right);
        assert_eq!(seq.iter().filter(|a| **a == AnchorPoint::Right).count(), 1);
    }

    #[test]
    fn test_merge_json_recurses() {
        let mut base = json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
        merge_json(&mut base, &json!({"a": {"c": 3}, "d": [9], "e": true}));
        assert_eq!(base, json!({"a": {"b": 1, "c": 3}, "d": [9], "e": true}));
    }

    #[test]
    fn test_style_overrides_keep_unrelated_fields() {
        let style = PlotStyle::with_overrides(
            r##"{"background_color": "#102030", "star": {"marker": {"color": "#ffeeaa"}}}"##,
        )
        .unwrap();
        assert_eq!(style.background_color, "#102030");
        assert_eq!(style.star.marker.color, "#ffeeaa");
        assert_eq!(style.star.marker.size, PlotStyle::default().star.marker.size);
        assert_eq!(style.ecliptic, PlotStyle::default().ecliptic);
    }

    #[test]
    fn test_style_overrides_reject_bad_color() {
        let err = PlotStyle::with_overrides(r#"{"background_color": "midnight"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor(_)));
        assert!(PlotStyle::with_overrides("{not json").is_err());
    }

    #[test]
    fn test_gradient_forces_black_background() {
        let mut style = PlotStyle::default();
        style.background_color = "#223344".into();
        assert_eq!(style.effective_background(), "#223344");
        style.gradient = Some(GradientStyle {
            direction: GradientDirection::Radial,
            stops: vec![(0.0, "#000000".into()), (1.0, "#1a3d7c".into())],
        });
        assert_eq!(style.effective_background(), "#000000");
    }

    #[test]
    fn test_star_size_monotonic_in_brightness() {
        let style = PlotStyle::default();
        assert!(style.star_size(0.0, 1.0) > style.star_size(3.0, 1.0));
        assert!(style.star_size(12.0, 1.0) >= 1.0);
    }

    #[test]
    fn test_vocabulary_names() {
        assert_eq!(MarkerSymbol::Star4.to_string(), "star_4");
        assert_eq!(MarkerSymbol::CircleDottedRings.to_string(), "circle_dotted_rings");
        assert_eq!(LineStyle::DashDot.to_string(), "dashdot");
        assert_eq!(MarkerSymbol::iter().count(), 23);
        let zs: Vec<i32> = ZOrder::iter().map(ZOrder::value).collect();
        assert!(zs.windows(2).all(|w| w[0] < w[1]));
    }
}
