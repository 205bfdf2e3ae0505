//! End-to-end report generation for one or more data roots.
//!
//! A result folder is either reused as-is (see [`PipelineState::detect`]) or
//! regenerated from scratch: per-version summaries, the combined summary, both
//! statistics artifacts, validation, and finally the manifest.
//!
//! Nothing here locks the result folder. Running two generations against the
//! same result folder at once is unsupported; callers must serialize them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use spm_core::config::PipelineConfig;
use spm_core::error::{Result, SpmError};
use spm_core::models::ValidationResult;
use spm_core::validation::validate_records;
use spm_data::artifact::SUMMARY_FILE;
use spm_data::combiner::combine_summaries;
use spm_data::parser::LogLineParser;
use spm_data::report::{generate_statistics, load_long_form};
use spm_data::scanner::scan_data_root;
use spm_data::summary::build_summary;
use tracing::{error, info, warn};

use crate::state::{PipelineState, RunManifest, VersionRows, MANIFEST_FILE};

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// What [`generate_reports`] did for one data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The result folder was already complete; nothing was written.
    Reused,
    /// Every artifact was (re)written.
    Generated {
        /// Rows across all per-version summaries.
        total_rows: usize,
        /// Rows of the combined summary.
        combined_rows: usize,
        /// Versions with at least one sample, in column order.
        versions: Vec<String>,
        validation: ValidationResult,
    },
    /// No log folder or no timing line was found.
    NoData,
}

/// Result of one data root within [`generate_batch`].
#[derive(Debug)]
pub struct DatasetRun {
    pub data_root: PathBuf,
    pub result_dir: PathBuf,
    pub outcome: Result<GenerationOutcome>,
}

impl DatasetRun {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Generate (or reuse) the reports of the dataset rooted at `data_root`.
pub fn generate_reports(data_root: &Path, config: &PipelineConfig) -> Result<GenerationOutcome> {
    config.validate()?;
    let result_dir = config.result_dir_for(data_root);

    if PipelineState::detect(&result_dir).is_built() {
        info!("Reusing existing reports in {}", result_dir.display());
        return Ok(GenerationOutcome::Reused);
    }

    let found = scan_data_root(data_root, config)?;
    if found.is_empty() {
        warn!(
            "No {} folders found under {}",
            config.log_dir_name,
            data_root.display()
        );
        return Ok(GenerationOutcome::NoData);
    }

    // A stale manifest would mark a half-regenerated folder as built.
    remove_manifest(&result_dir)?;

    let parser = LogLineParser::new();
    let mut summaries = BTreeMap::new();
    let mut version_rows = Vec::new();
    for entry in &found {
        let out = result_dir.join(&entry.version).join(SUMMARY_FILE);
        let summary = build_summary(&parser, entry, &out)?;
        if summary.is_empty() {
            warn!(
                "{}: no timing lines in {} ({})",
                entry.version,
                entry.log_dir.display(),
                entry.pattern
            );
            continue;
        }
        info!("{}: {} rows -> {}", summary.version, summary.len(), out.display());
        version_rows.push(VersionRows {
            version: summary.version.clone(),
            rows: summary.len(),
        });
        summaries.insert(summary.version, out);
    }
    if summaries.is_empty() {
        warn!("No timing lines found under {}", data_root.display());
        return Ok(GenerationOutcome::NoData);
    }

    let combined_rows = combine_summaries(&summaries, &result_dir.join(SUMMARY_FILE))?;
    if combined_rows == 0 {
        return Ok(GenerationOutcome::NoData);
    }

    generate_statistics(&result_dir, config).map_err(|e| SpmError::dependent("statistics", e))?;

    let validation =
        validate_dataset(&result_dir, config).map_err(|e| SpmError::dependent("validation", e))?;
    log_validation(&validation);

    let manifest = RunManifest::new(data_root, version_rows, combined_rows);
    manifest
        .write(&result_dir)
        .map_err(|e| SpmError::dependent("manifest", e))?;

    info!(
        "Reports for {} written to {}",
        data_root.display(),
        result_dir.display()
    );
    Ok(GenerationOutcome::Generated {
        total_rows: manifest.total_rows(),
        combined_rows,
        versions: manifest.versions.into_iter().map(|v| v.version).collect(),
        validation,
    })
}

/// Run [`generate_reports`] for every data root in order.
///
/// A failing dataset is logged and recorded; the remaining ones still run.
pub fn generate_batch(data_roots: &[PathBuf], config: &PipelineConfig) -> Vec<DatasetRun> {
    data_roots
        .iter()
        .map(|data_root| {
            let outcome = generate_reports(data_root, config);
            if let Err(e) = &outcome {
                error!("Dataset {} failed: {}", data_root.display(), e);
            }
            DatasetRun {
                data_root: data_root.clone(),
                result_dir: config.result_dir_for(data_root),
                outcome,
            }
        })
        .collect()
}

// ── Result folders ────────────────────────────────────────────────────────────

/// Remove `result_dir` and everything in it.
///
/// Returns `false` when there was nothing to remove.
pub fn clean_results(result_dir: &Path) -> Result<bool> {
    if !result_dir.exists() {
        info!("Nothing to clean at {}", result_dir.display());
        return Ok(false);
    }
    std::fs::remove_dir_all(result_dir).map_err(|source| SpmError::FileWrite {
        path: result_dir.to_path_buf(),
        source,
    })?;
    info!("Removed {}", result_dir.display());
    Ok(true)
}

/// Names of the result folders under `result_base` holding a combined
/// summary, sorted.
pub fn available_datasets(result_base: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(result_base) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join(SUMMARY_FILE).is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Validate the combined summary stored in `result_dir`.
pub fn validate_dataset(result_dir: &Path, config: &PipelineConfig) -> Result<ValidationResult> {
    let records = load_long_form(result_dir)?;
    Ok(validate_records(&records, config))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn remove_manifest(result_dir: &Path) -> Result<()> {
    let path = result_dir.join(MANIFEST_FILE);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SpmError::FileWrite { path, source }),
    }
}

fn log_validation(validation: &ValidationResult) {
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if let Some(err) = &validation.error {
        error!("{}", err);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_results() {
        let dir = TempDir::new().unwrap();
        let result = dir.path().join("result").join("data");
        std::fs::create_dir_all(result.join("v1")).unwrap();
        std::fs::write(result.join("v1").join(SUMMARY_FILE), "x").unwrap();
        assert!(clean_results(&result).unwrap());
        assert!(!result.exists());
        assert!(!clean_results(&result).unwrap());
    }

    #[test]
    fn test_available_datasets() {
        let dir = TempDir::new().unwrap();
        for name in ["b", "a"] {
            let d = dir.path().join(name);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join(SUMMARY_FILE), "service,A\n").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("partial")).unwrap();
        assert_eq!(available_datasets(dir.path()), vec!["a", "b"]);
        assert!(available_datasets(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_remove_manifest_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        remove_manifest(dir.path()).unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "{}").unwrap();
        remove_manifest(dir.path()).unwrap();
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_generate_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            baseline_service: String::new(),
            result_base: dir.path().join("result"),
            ..Default::default()
        };
        let err = generate_reports(dir.path(), &config).unwrap_err();
        assert!(matches!(err, SpmError::Config(_)));
    }
}
