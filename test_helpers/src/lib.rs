//! Test helpers for the skychart workspace.
//!
//! Chart tests write their SVG/HTML artifacts under `test_output/` at the
//! workspace root so they can be inspected after a run.

use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("workspace root not found: {0}")]
    WorkspaceRootNotFound(String),
    #[error("failed to prepare artifact directory {path}: {source}")]
    ArtifactDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Walk up from the current directory to the Cargo.toml declaring `[workspace]`.
pub fn find_workspace_root() -> Result<PathBuf, TestHelperError> {
    let mut dir = env::current_dir()
        .map_err(|e| TestHelperError::WorkspaceRootNotFound(format!("current dir: {e}")))?;

    loop {
        let manifest = dir.join("Cargo.toml");
        if manifest.is_file() {
            let content = std::fs::read_to_string(&manifest).map_err(|e| {
                TestHelperError::WorkspaceRootNotFound(format!("{}: {e}", manifest.display()))
            })?;
            if content.contains("[workspace]") {
                return Ok(dir);
            }
        }
        if !dir.pop() {
            break;
        }
    }

    Err(TestHelperError::WorkspaceRootNotFound(
        "no Cargo.toml with [workspace] above the current directory".to_string(),
    ))
}

static WORKSPACE_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_workspace_root().expect("Failed to find workspace root directory"));

/// Directory for test artifacts, created on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = WORKSPACE_ROOT.join("test_output");
    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }
    output_dir
}

/// Path of a chart artifact grouped by test suite, e.g. `test_output/charts/map.html`.
pub fn chart_artifact(suite: &str, file_name: &str) -> Result<PathBuf, TestHelperError> {
    let dir = get_output_dir().join(suite);
    std::fs::create_dir_all(&dir).map_err(|source| TestHelperError::ArtifactDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir.join(file_name))
}

/// Route `log` output through the test harness capture; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
    log::trace!("test logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_exists() {
        let root = find_workspace_root().expect("Failed to find workspace root");
        assert!(root.join("Cargo.toml").exists());
    }

    #[test]
    fn test_output_dir_created() {
        let output = get_output_dir();
        assert!(output.is_dir());
    }

    #[test]
    fn test_chart_artifact_creates_suite_dir() {
        let path = chart_artifact("helpers_selftest", "probe.svg").unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(path.file_name().unwrap(), "probe.svg");
    }

    #[test]
    fn test_logging_init_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }
}
