//! Interactive output: a recording layer over the static primitives and a
//! Plotly replay of the recorded commands.
//!
//! [`Recording`] wraps any [`ChartPrimitives`](crate::chart::ChartPrimitives)
//! implementation. Each primitive is drawn by the wrapped chart first and
//! then appended to a [`DrawingRecorder`] as one [`DrawingCommand`]. The
//! [`PlotlyRenderer`] replays the log into a [`Figure`] with marker sizes
//! calibrated to match the static rendering.

pub mod calibration;
pub mod command;
pub mod figure;
pub mod recorder;
pub mod recording;
pub mod renderer;

pub use calibration::MarkerCalibration;
pub use command::{CommandId, CommandKind, DrawingCommand, ElementMeta, Layer, Style};
pub use figure::Figure;
pub use recorder::{DrawingRecorder, ProjectionInfo, StyleInfo};
pub use recording::{LabelLedger, LabelState, Recording};
pub use renderer::PlotlyRenderer;
