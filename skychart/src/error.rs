//! Error types for chart construction, recording, replay and export.

use std::path::PathBuf;
use thiserror::Error;

use crate::interactive::command::{CommandId, CommandKind};

/// Invalid configuration: backend names, styles, extents.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown backend '{name}', available: {}", .available.join(", "))]
    UnknownBackend {
        name: String,
        available: Vec<String>,
    },
    #[error("invalid color '{0}': expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),
    #[error("invalid style override: {0}")]
    Style(#[from] serde_json::Error),
    #[error("invalid extent: {0}")]
    Extent(String),
    #[error("invalid star filter '{0}': expected e.g. '< 5' or 'all'")]
    Filter(String),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Malformed input to one of the recorder's `record_*` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("{kind:?}: '{field}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        kind: CommandKind,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{kind:?}: non-finite coordinate at index {index}")]
    NonFinite { kind: CommandKind, index: usize },
    #[error("{kind:?}: empty geometry")]
    Empty { kind: CommandKind },
}

/// Failure replaying a single command into the interactive figure.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("command {id} ({kind:?}) is malformed: {reason}")]
    Malformed {
        id: CommandId,
        kind: CommandKind,
        reason: String,
    },
}

/// Failures of a drawing surface.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no figure: call create_figure first")]
    NoFigure,
    #[error("{what}: length mismatch ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },
    #[error("backend '{backend}' cannot write {format}")]
    UnsupportedFormat {
        backend: &'static str,
        format: &'static str,
    },
    #[error("raster output requires the 'raster' feature")]
    RasterUnavailable,
    #[error("svg rasterization failed: {0}")]
    Raster(String),
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures resolving an export target.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("unknown export format for '{0}'")]
    UnknownFormat(PathBuf),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Umbrella error for plotting calls.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T, E = ChartError> = std::result::Result<T, E>;
