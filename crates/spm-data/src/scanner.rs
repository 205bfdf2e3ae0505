//! Discovery of per-version PerformanceLog folders under a data root.

use std::path::{Path, PathBuf};

use spm_core::config::PipelineConfig;
use spm_core::error::{Result, SpmError};
use tracing::{debug, warn};

// ── LogPattern ────────────────────────────────────────────────────────────────

/// Which log files of a PerformanceLog folder are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPattern {
    /// `*loading.log` only; keeps co-located login-timing logs out.
    LoadingLogs,
    /// Every `*.log` file.
    AllLogs,
}

impl LogPattern {
    /// The glob spelling of the pattern, used in diagnostics.
    pub fn as_glob(&self) -> &'static str {
        match self {
            LogPattern::LoadingLogs => "*loading.log",
            LogPattern::AllLogs => "*.log",
        }
    }

    /// `true` when a file called `file_name` matches the pattern.
    ///
    /// Only the suffix is checked, so hidden files match too.
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            LogPattern::LoadingLogs => file_name.ends_with("loading.log"),
            LogPattern::AllLogs => file_name.ends_with(".log"),
        }
    }
}

impl std::fmt::Display for LogPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_glob())
    }
}

// ── VersionLogDir ─────────────────────────────────────────────────────────────

/// A located log folder for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLogDir {
    /// Name of the version folder directly under the data root.
    pub version: String,
    /// The PerformanceLog folder found for that version.
    pub log_dir: PathBuf,
    /// Which files of `log_dir` to parse.
    pub pattern: LogPattern,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Locate every version's log folder under `data_root`, sorted by version.
///
/// Version folders without any log folder are skipped. A missing data root is
/// [`SpmError::DataPathNotFound`].
pub fn scan_data_root(data_root: &Path, config: &PipelineConfig) -> Result<Vec<VersionLogDir>> {
    if !data_root.is_dir() {
        return Err(SpmError::DataPathNotFound(data_root.to_path_buf()));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(data_root)
        .map_err(|source| SpmError::FileRead {
            path: data_root.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();

    let mut found = Vec::new();
    for candidate in candidates {
        let Some(version) = candidate.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };
        match find_log_dir(&candidate, &config.log_dir_name) {
            Some(log_dir) => {
                let pattern = determine_pattern(&log_dir);
                debug!(
                    "{}: using {} with pattern {}",
                    version,
                    log_dir.display(),
                    pattern
                );
                found.push(VersionLogDir {
                    version,
                    log_dir,
                    pattern,
                });
            }
            None => debug!(
                "{}: no {} folder, skipping",
                candidate.display(),
                config.log_dir_name
            ),
        }
    }
    Ok(found)
}

/// Find the log folder of one version folder.
///
/// A direct child named `log_dir_name` wins; otherwise the first directory
/// with that name in a name-sorted depth-first walk is used.
pub fn find_log_dir(version_dir: &Path, log_dir_name: &str) -> Option<PathBuf> {
    let direct = version_dir.join(log_dir_name);
    if direct.is_dir() {
        return Some(direct);
    }

    walkdir::WalkDir::new(version_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_dir() && entry.file_name() == log_dir_name)
        .map(|entry| entry.into_path())
}

/// Choose [`LogPattern::LoadingLogs`] when any file name ends with
/// `loading.log`, otherwise [`LogPattern::AllLogs`].
pub fn determine_pattern(log_dir: &Path) -> LogPattern {
    let has_loading_logs = file_names(log_dir)
        .iter()
        .any(|name| LogPattern::LoadingLogs.matches(name));
    if has_loading_logs {
        LogPattern::LoadingLogs
    } else {
        LogPattern::AllLogs
    }
}

/// Files of `log_dir` matching `pattern`, in lexicographic order.
pub fn list_matching_files(log_dir: &Path, pattern: LogPattern) -> Vec<PathBuf> {
    let mut names: Vec<String> = file_names(log_dir)
        .into_iter()
        .filter(|name| pattern.matches(name))
        .collect();
    names.sort();
    names.into_iter().map(|name| log_dir.join(name)).collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Names of the regular files directly inside `dir`.
fn file_names(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            Vec::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
