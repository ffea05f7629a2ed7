//! Ordered, append-only log of drawing commands plus scene metadata.
//!
//! Every `record_*` operation validates its input, copies caller buffers and
//! returns a [`CommandId`]. Malformed input is rejected with a
//! [`RecordError`]; nothing is truncated or padded. The only removal is
//! [`DrawingRecorder::retract`], by identity.

use log::debug;
use serde::{Deserialize, Serialize};

use super::command::{
    CommandData, CommandId, CommandKind, DrawingCommand, ElementMeta, Layer, PerPoint, Style,
};
use crate::coords::NativePoint;
use crate::error::RecordError;
use crate::projection::{AxisLimits, ChartKind, Projector, SkyExtent};
use crate::style::GradientDirection;

/// Chart type, domain extent and native axis limits (display order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInfo {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    #[serde(flatten)]
    pub extent: SkyExtent,
    #[serde(flatten)]
    pub limits: AxisLimits,
}

impl ProjectionInfo {
    pub fn from_projector(projector: &Projector, limits: AxisLimits) -> Self {
        Self {
            kind: projector.kind(),
            extent: projector.sky_extent(),
            limits,
        }
    }
}

pub const DEFAULT_RESOLUTION: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleInfo {
    pub background_color: String,
    pub figure_background_color: String,
    pub resolution: u32,
}

impl Default for StyleInfo {
    fn default() -> Self {
        Self {
            background_color: "#000000".into(),
            figure_background_color: "#000000".into(),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

/// Scatter geometry as handed to [`DrawingRecorder::record_scatter`].
#[derive(Debug, Clone)]
pub struct ScatterInput<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub sizes: PerPoint<f64>,
    pub colors: PerPoint<String>,
    pub alphas: PerPoint<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DrawingRecorder {
    commands: Vec<(CommandId, DrawingCommand)>,
    next_id: u64,
    projection_info: Option<ProjectionInfo>,
    style_info: Option<StyleInfo>,
}

fn check_len(
    kind: CommandKind,
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), RecordError> {
    if expected != actual {
        return Err(RecordError::LengthMismatch {
            kind,
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_finite<'a>(
    kind: CommandKind,
    values: impl IntoIterator<Item = &'a f64>,
) -> Result<(), RecordError> {
    match values.into_iter().position(|v| !v.is_finite()) {
        Some(index) => Err(RecordError::NonFinite { kind, index }),
        None => Ok(()),
    }
}

fn check_points(kind: CommandKind, points: &[NativePoint]) -> Result<(), RecordError> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(RecordError::NonFinite { kind, index }),
        None => Ok(()),
    }
}

impl DrawingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_projection_info(&mut self, info: ProjectionInfo) {
        self.projection_info = Some(info);
    }

    pub fn set_style_info(&mut self, info: StyleInfo) {
        self.style_info = Some(info);
    }

    pub fn projection_info(&self) -> Option<&ProjectionInfo> {
        self.projection_info.as_ref()
    }

    pub fn style_info(&self) -> Option<&StyleInfo> {
        self.style_info.as_ref()
    }

    fn push(
        &mut self,
        data: CommandData,
        style: Style,
        metadata: Vec<ElementMeta>,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        let kind = data.kind();
        if !metadata.is_empty() {
            check_len(kind, "metadata", data.element_count(), metadata.len())?;
        }
        let id = CommandId(self.next_id);
        self.next_id += 1;
        debug!(
            "recorded {id} {kind} gid={} zorder={} elements={}",
            layer.gid,
            layer.zorder,
            data.element_count()
        );
        self.commands.push((
            id,
            DrawingCommand {
                data,
                style,
                metadata,
                zorder: layer.zorder,
                gid: layer.gid,
            },
        ));
        Ok(id)
    }

    /// Scalar sizes, colors or alphas are broadcast to every point.
    pub fn record_scatter(
        &mut self,
        input: ScatterInput<'_>,
        style: Style,
        metadata: Vec<ElementMeta>,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::Scatter;
        let n = input.x.len();
        if n == 0 {
            return Err(RecordError::Empty { kind: KIND });
        }
        check_len(KIND, "y", n, input.y.len())?;
        check_finite(KIND, input.x.iter().chain(input.y))?;
        let sizes = input
            .sizes
            .broadcast(n)
            .map_err(|actual| RecordError::LengthMismatch {
                kind: KIND,
                field: "sizes",
                expected: n,
                actual,
            })?;
        let colors = input
            .colors
            .broadcast(n)
            .map_err(|actual| RecordError::LengthMismatch {
                kind: KIND,
                field: "colors",
                expected: n,
                actual,
            })?;
        let alphas = input
            .alphas
            .broadcast(n)
            .map_err(|actual| RecordError::LengthMismatch {
                kind: KIND,
                field: "alphas",
                expected: n,
                actual,
            })?;
        self.push(
            CommandData::Scatter {
                x: input.x.to_vec(),
                y: input.y.to_vec(),
                sizes,
                colors,
                alphas,
            },
            style,
            metadata,
            layer,
        )
    }

    pub fn record_line(
        &mut self,
        x: &[f64],
        y: &[f64],
        style: Style,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::Line;
        if x.is_empty() {
            return Err(RecordError::Empty { kind: KIND });
        }
        check_len(KIND, "y", x.len(), y.len())?;
        check_finite(KIND, x.iter().chain(y))?;
        self.push(
            CommandData::Line {
                x: x.to_vec(),
                y: y.to_vec(),
            },
            style,
            Vec::new(),
            layer,
        )
    }

    pub fn record_polygon(
        &mut self,
        points: &[NativePoint],
        style: Style,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::Polygon;
        if points.is_empty() {
            return Err(RecordError::Empty { kind: KIND });
        }
        check_points(KIND, points)?;
        self.push(
            CommandData::Polygon {
                points: points.to_vec(),
            },
            style,
            Vec::new(),
            layer,
        )
    }

    pub fn record_text(
        &mut self,
        at: NativePoint,
        text: &str,
        style: Style,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::Text;
        if text.is_empty() {
            return Err(RecordError::Empty { kind: KIND });
        }
        check_points(KIND, &[at])?;
        self.push(
            CommandData::Text {
                x: at.x,
                y: at.y,
                text: text.to_string(),
            },
            style,
            Vec::new(),
            layer,
        )
    }

    pub fn record_line_collection(
        &mut self,
        segments: &[[NativePoint; 2]],
        style: Style,
        metadata: Vec<ElementMeta>,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::LineCollection;
        if segments.is_empty() {
            return Err(RecordError::Empty { kind: KIND });
        }
        if let Some(index) = segments
            .iter()
            .position(|[a, b]| !a.is_finite() || !b.is_finite())
        {
            return Err(RecordError::NonFinite { kind: KIND, index });
        }
        self.push(
            CommandData::LineCollection {
                segments: segments.to_vec(),
            },
            style,
            metadata,
            layer,
        )
    }

    pub fn record_gradient(
        &mut self,
        direction: GradientDirection,
        color_stops: &[(f64, String)],
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::Gradient;
        if color_stops.is_empty() {
            return Err(RecordError::Empty { kind: KIND });
        }
        check_finite(KIND, color_stops.iter().map(|(offset, _)| offset))?;
        self.push(
            CommandData::Gradient {
                direction,
                color_stops: color_stops.to_vec(),
            },
            Style::default(),
            Vec::new(),
            layer,
        )
    }

    pub fn record_info_table(
        &mut self,
        columns: &[String],
        values: &[String],
        widths: &[f64],
        style: Style,
        layer: Layer,
    ) -> Result<CommandId, RecordError> {
        const KIND: CommandKind = CommandKind::InfoTable;
        if columns.is_empty() {
            return Err(RecordError::Empty { kind: KIND });
        }
        check_len(KIND, "values", columns.len(), values.len())?;
        check_len(KIND, "widths", columns.len(), widths.len())?;
        check_finite(KIND, widths)?;
        self.push(
            CommandData::InfoTable {
                columns: columns.to_vec(),
                values: values.to_vec(),
                widths: widths.to_vec(),
            },
            style,
            Vec::new(),
            layer,
        )
    }

    /// Remove a command by identity. Returns false if it was already gone.
    pub fn retract(&mut self, id: CommandId) -> bool {
        match self.commands.iter().position(|(cid, _)| *cid == id) {
            Some(index) => {
                self.commands.remove(index);
                debug!("retracted {id}");
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: CommandId) -> Option<&DrawingCommand> {
        self.commands
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, cmd)| cmd)
    }

    /// Commands in emission order.
    pub fn commands(&self) -> impl Iterator<Item = &DrawingCommand> {
        self.commands.iter().map(|(_, cmd)| cmd)
    }

    pub fn entries(&self) -> &[(CommandId, DrawingCommand)] {
        &self.commands
    }

    pub fn commands_of(&self, kind: CommandKind) -> impl Iterator<Item = &DrawingCommand> {
        self.commands().filter(move |c| c.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every command and the scene metadata.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.projection_info = None;
        self.style_info = None;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
