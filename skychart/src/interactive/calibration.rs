//! Unit calibration between the static surface and the interactive figure.
//!
//! Static marker sizes are areas in points² rendered at [`STATIC_DPI`] onto
//! a canvas that is supersampled 2× and then downscaled. Interactive marker
//! sizes are pixel diameters inside a [`VIEWPORT_PX`] wide viewport.

use crate::style::{HAlign, LineStyle, MarkerSymbol, VAlign};

pub const STATIC_DPI: f64 = 200.0;
pub const POINTS_PER_INCH: f64 = 72.0;
/// Downscale applied after the 2× supersampled static render.
pub const SUPERSAMPLE_FACTOR: f64 = 0.5;
pub const VIEWPORT_PX: f64 = 1000.0;
/// Empirical factor tuned by comparing both renderings side by side.
pub const RENDERING_CORRECTION: f64 = 0.70;
pub const MIN_MARKER_PX: f64 = 1.5;

pub const LINE_WIDTH_SCALE: f64 = 0.3;
/// Floor for replayed line and outline widths.
pub const MIN_LINE_WIDTH_PX: f64 = 1.0;
pub const EDGE_WIDTH_SCALE: f64 = 0.3;
pub const FONT_SCALE: f64 = 0.4;
pub const MIN_FONT_PX: f64 = 8.0;

/// Converts static marker areas into interactive pixel diameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerCalibration {
    pub resolution: f64,
    pub scale: f64,
    pub correction: f64,
    pub viewport_px: f64,
}

impl MarkerCalibration {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(1) as f64,
            scale: 1.0,
            correction: RENDERING_CORRECTION,
            viewport_px: VIEWPORT_PX,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_correction(mut self, correction: f64) -> Self {
        self.correction = correction;
        self
    }

    /// Pixel diameter for a static marker area, never below [`MIN_MARKER_PX`].
    pub fn marker_diameter(&self, size: f64) -> f64 {
        if !(size > 0.0) {
            return MIN_MARKER_PX;
        }
        let diameter_pt = 2.0 * (size / std::f64::consts::PI).sqrt();
        let static_px = diameter_pt * (STATIC_DPI / POINTS_PER_INCH) * SUPERSAMPLE_FACTOR;
        let diameter =
            static_px * self.correction * (self.viewport_px / self.resolution) * self.scale;
        diameter.max(MIN_MARKER_PX)
    }
}

pub fn line_width(width: f64) -> f64 {
    (width * LINE_WIDTH_SCALE).max(MIN_LINE_WIDTH_PX)
}

pub fn edge_width(width: f64) -> f64 {
    (width * EDGE_WIDTH_SCALE).max(0.0)
}

pub fn font_size(size: f64) -> f64 {
    (size * FONT_SCALE).max(MIN_FONT_PX)
}

pub fn plotly_symbol(symbol: MarkerSymbol) -> &'static str {
    match symbol {
        MarkerSymbol::Point | MarkerSymbol::Circle => "circle",
        MarkerSymbol::Plus => "cross-thin-open",
        MarkerSymbol::Square => "square",
        MarkerSymbol::SquareStripesDiagonal => "square-x-open",
        MarkerSymbol::Star => "star",
        MarkerSymbol::Sun => "circle-dot",
        MarkerSymbol::Diamond => "diamond",
        MarkerSymbol::Triangle => "triangle-up",
        MarkerSymbol::CirclePlus | MarkerSymbol::CircleCrosshair => "circle-cross-open",
        MarkerSymbol::CircleCross => "circle-x-open",
        MarkerSymbol::CircleDot => "circle-dot",
        MarkerSymbol::CircleDottedEdge => "circle-open-dot",
        MarkerSymbol::CircleDottedRings | MarkerSymbol::CircleLine | MarkerSymbol::Ellipse => {
            "circle-open"
        }
        MarkerSymbol::Comet => "star-triangle-up",
        MarkerSymbol::Star4 => "star-square",
        MarkerSymbol::Star8 => "asterisk-open",
        MarkerSymbol::Cross => "x-thin-open",
        MarkerSymbol::Hexagon => "hexagon",
        MarkerSymbol::Pentagon => "pentagon",
    }
}

/// Lookup by name; unknown names draw as circles.
pub fn symbol_for(name: &str) -> &'static str {
    name.parse::<MarkerSymbol>()
        .map(plotly_symbol)
        .unwrap_or("circle")
}

pub fn dash(style: LineStyle) -> &'static str {
    match style {
        LineStyle::Solid => "solid",
        LineStyle::Dashed => "dash",
        LineStyle::Dotted => "dot",
        LineStyle::DashDot => "dashdot",
    }
}

/// Lookup accepting both names and the short `-`, `--`, `:`, `-.` forms.
pub fn dash_for(name: &str) -> &'static str {
    match name {
        "-" => "solid",
        "--" => "dash",
        ":" => "dot",
        "-." => "dashdot",
        other => other.parse::<LineStyle>().map(dash).unwrap_or("solid"),
    }
}

/// `(yanchor, xanchor)` for a static text alignment.
///
/// Horizontal anchors are mirrored: sky charts display x inverted, so a
/// label aligned left in data space opens toward the right on screen. Horizon
/// charts do not invert x but use the same table.
pub fn annotation_anchor(va: VAlign, ha: HAlign) -> (&'static str, &'static str) {
    let y = match va {
        VAlign::Top => "top",
        VAlign::Center => "middle",
        VAlign::Bottom | VAlign::Baseline => "bottom",
    };
    let x = match ha {
        HAlign::Left => "right",
        HAlign::Center => "center",
        HAlign::Right => "left",
    };
    (y, x)
}

/// String form of [`annotation_anchor`]; unknown pairs anchor at the middle.
pub fn anchor_for(va: &str, ha: &str) -> (&'static str, &'static str) {
    match (va.parse::<VAlign>(), ha.parse::<HAlign>()) {
        (Ok(v), Ok(h)) => annotation_anchor(v, h),
        _ => ("middle", "center"),
    }
}

const LEGEND_NAMES: &[(&str, &str)] = &[
    ("stars", "Stars"),
    ("constellations-line", "Constellations"),
    ("constellations-border", "Borders"),
    ("constellations-label-name", "Labels"),
    ("ecliptic-line", "Ecliptic"),
    ("celestial-equator-line", "Celestial Equator"),
    ("planet-marker", "Planets"),
    ("moon-marker", "Moon"),
    ("sun-marker", "Sun"),
    ("marker", "Markers"),
    ("dso", "DSOs"),
    ("dso_galaxy", "Galaxies"),
    ("dso_nebula", "Nebulae"),
    ("dso_open_cluster", "Open Clusters"),
    ("dso_globular_cluster", "Globular Clusters"),
];

/// Legend label for a group id, title-casing unknown ids.
pub fn legend_name(gid: &str) -> String {
    if let Some((_, name)) = LEGEND_NAMES.iter().find(|(g, _)| *g == gid) {
        return (*name).to_string();
    }
    gid.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
