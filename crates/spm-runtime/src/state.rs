//! Result-folder state and the run manifest.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use spm_core::error::{Result, SpmError};
use spm_data::artifact::{self, OVERALL_STATS_FILE, SERVICE_STATS_FILE, SUMMARY_FILE};
use spm_data::combiner::read_combined;
use tracing::debug;

/// File name of the manifest written at the end of a successful run.
pub const MANIFEST_FILE: &str = "manifest.json";

// ── RunManifest ───────────────────────────────────────────────────────────────

/// Rows written for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRows {
    pub version: String,
    pub rows: usize,
}

/// Record of a completed generation, written after every other artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
    pub data_root: String,
    pub versions: Vec<VersionRows>,
    pub combined_rows: usize,
}

impl RunManifest {
    pub fn new(data_root: &Path, versions: Vec<VersionRows>, combined_rows: usize) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            data_root: data_root.display().to_string(),
            versions,
            combined_rows,
        }
    }

    /// Total per-version summary rows.
    pub fn total_rows(&self) -> usize {
        self.versions.iter().map(|v| v.rows).sum()
    }

    pub fn write(&self, result_dir: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        artifact::write_bytes_atomic(&result_dir.join(MANIFEST_FILE), &json)
    }

    pub fn read(result_dir: &Path) -> Result<Self> {
        let path = result_dir.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| SpmError::FileRead {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ── PipelineState ─────────────────────────────────────────────────────────────

/// Whether a result folder holds a complete set of artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unbuilt,
    Built,
}

impl PipelineState {
    /// Inspect `result_dir`.
    ///
    /// `Built` requires a combined summary with a valid header, both
    /// statistics artifacts, and a manifest that parses. Anything less,
    /// including truncated leftovers, is `Unbuilt`.
    pub fn detect(result_dir: &Path) -> Self {
        if let Err(e) = read_combined(&result_dir.join(SUMMARY_FILE)) {
            debug!("{}: combined summary unusable: {}", result_dir.display(), e);
            return PipelineState::Unbuilt;
        }
        for name in [OVERALL_STATS_FILE, SERVICE_STATS_FILE] {
            if !result_dir.join(name).is_file() {
                debug!("{}: {} missing", result_dir.display(), name);
                return PipelineState::Unbuilt;
            }
        }
        if let Err(e) = RunManifest::read(result_dir) {
            debug!("{}: manifest unusable: {}", result_dir.display(), e);
            return PipelineState::Unbuilt;
        }
        PipelineState::Built
    }

    pub fn is_built(&self) -> bool {
        matches!(self, PipelineState::Built)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
