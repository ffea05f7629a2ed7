//! Export target resolution.
//!
//! The file extension selects the format. Formats the library recognizes but
//! cannot encode (pdf, webp, eps, tiff, gif), and raster formats when the
//! `raster` feature is off, fall back to the surface's known-good format
//! with a warning. Unknown extensions are an error.

use log::warn;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter};

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Html => "html",
        }
    }

    pub fn is_raster(self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Jpeg)
    }
}

/// What a file extension asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requested {
    Format(ExportFormat),
    /// Recognized image format without an encoder.
    Unsupported(&'static str),
}

const UNSUPPORTED: &[&str] = &["pdf", "webp", "eps", "ps", "tif", "tiff", "gif", "bmp"];

pub fn requested_format(path: &Path) -> Result<Requested, ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| ExportError::UnknownFormat(path.to_path_buf()))?;
    let format = match ext.as_str() {
        "png" => ExportFormat::Png,
        "jpg" | "jpeg" => ExportFormat::Jpeg,
        "svg" => ExportFormat::Svg,
        "html" | "htm" => ExportFormat::Html,
        other => {
            return UNSUPPORTED
                .iter()
                .find(|u| **u == other)
                .map(|u| Requested::Unsupported(*u))
                .ok_or_else(|| ExportError::UnknownFormat(path.to_path_buf()));
        }
    };
    Ok(Requested::Format(format))
}

/// Resolved export target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    /// True when the requested format was replaced by the fallback.
    pub fell_back: bool,
}

/// Decide the format and final path for an export. `supports` says which
/// formats the surface can write; `fallback` must be one of them.
pub fn resolve(
    path: &Path,
    supports: impl Fn(ExportFormat) -> bool,
    fallback: ExportFormat,
) -> Result<ExportReport, ExportError> {
    let requested = requested_format(path)?;
    let wanted = match requested {
        Requested::Format(format) if supports(format) => {
            return Ok(ExportReport {
                path: path.to_path_buf(),
                format,
                fell_back: false,
            })
        }
        Requested::Format(format) => format.to_string(),
        Requested::Unsupported(ext) => ext.to_string(),
    };
    let fallback_path = path.with_extension(fallback.extension());
    warn!(
        "{wanted} export is not available here; writing {} as {} instead",
        fallback_path.display(),
        fallback
    );
    Ok(ExportReport {
        path: fallback_path,
        format: fallback,
        fell_back: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(
            requested_format(Path::new("a/chart.PNG")).unwrap(),
            Requested::Format(ExportFormat::Png)
        );
        assert_eq!(
            requested_format(Path::new("chart.jpeg")).unwrap(),
            Requested::Format(ExportFormat::Jpeg)
        );
        assert_eq!(
            requested_format(Path::new("chart.pdf")).unwrap(),
            Requested::Unsupported("pdf")
        );
        assert!(requested_format(Path::new("chart.xyz")).is_err());
        assert!(requested_format(Path::new("chart")).is_err());
    }

    #[test]
    fn test_supported_format_kept() {
        let report = resolve(Path::new("out/map.svg"), |_| true, ExportFormat::Svg).unwrap();
        assert_eq!(report.path, PathBuf::from("out/map.svg"));
        assert!(!report.fell_back);
    }

    #[test]
    fn test_fallback_rewrites_extension() {
        let html_only = |f: ExportFormat| f == ExportFormat::Html;
        let report = resolve(Path::new("out/map.png"), html_only, ExportFormat::Html).unwrap();
        assert_eq!(report.path, PathBuf::from("out/map.html"));
        assert_eq!(report.format, ExportFormat::Html);
        assert!(report.fell_back);

        let report = resolve(Path::new("out/map.pdf"), |_| true, ExportFormat::Svg).unwrap();
        assert_eq!(report.path, PathBuf::from("out/map.svg"));
        assert!(report.fell_back);
    }

    #[test]
    fn test_unknown_is_error() {
        assert!(resolve(Path::new("map.doc"), |_| true, ExportFormat::Svg).is_err());
    }
}
