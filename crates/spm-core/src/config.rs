//! Pipeline configuration passed explicitly through every pipeline call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, SpmError};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Name of the per-version folder that holds the raw `.log` files.
pub const DEFAULT_LOG_DIR_NAME: &str = "PerformanceLog";

/// Number of distinct services a complete dataset is expected to contain.
pub const DEFAULT_EXPECTED_SERVICE_COUNT: usize = 24;

/// Service whose sample count every other service is compared against.
pub const DEFAULT_BASELINE_SERVICE: &str = "AUTO TEST";

/// Service names that carry no useful timing information.
pub const DEFAULT_EXCLUDED_SERVICES: &[&str] = &[
    "EIP2",
    "EIP 2",
    "Microsoft 365",
    "MICROSOFT 365",
    "OUTLOOK",
    "Outlook",
];

/// Directory under which one result folder per dataset is created.
pub const DEFAULT_RESULT_BASE: &str = "result";

// ── PipelineConfig ────────────────────────────────────────────────────────────

/// Settings shared by the scanner, the report writer and the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory for generated artifacts; each dataset gets a subfolder.
    pub result_base: PathBuf,
    /// Folder name searched for inside every version folder.
    pub log_dir_name: String,
    /// Distinct service count below or above which validation warns.
    pub expected_service_count: usize,
    /// Baseline service name, matched case-insensitively.
    pub baseline_service: String,
    /// Service names dropped before statistics and validation (case-sensitive).
    pub excluded_services: BTreeSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            result_base: PathBuf::from(DEFAULT_RESULT_BASE),
            log_dir_name: DEFAULT_LOG_DIR_NAME.to_string(),
            expected_service_count: DEFAULT_EXPECTED_SERVICE_COUNT,
            baseline_service: DEFAULT_BASELINE_SERVICE.to_string(),
            excluded_services: DEFAULT_EXCLUDED_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Default config file location: `~/.spm/config.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config file location rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".spm").join("config.json")
    }

    /// Load a config file, falling back to defaults when it is absent or
    /// cannot be parsed. Fields missing from the file keep their defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable config {}: {}; using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Atomically write the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|source| SpmError::FileWrite {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| SpmError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.baseline_service.trim().is_empty() {
            return Err(SpmError::Config(
                "baseline service must not be empty".to_string(),
            ));
        }
        if self.log_dir_name.trim().is_empty() {
            return Err(SpmError::Config(
                "log directory name must not be empty".to_string(),
            ));
        }
        if self.excluded_services.contains(&self.baseline_service) {
            return Err(SpmError::Config(format!(
                "baseline service '{}' is also excluded",
                self.baseline_service
            )));
        }
        Ok(())
    }

    /// Result folder for the dataset rooted at `data_root`.
    pub fn result_dir_for(&self, data_root: &Path) -> PathBuf {
        let name = data_root
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data".into());
        self.result_base.join(name)
    }

    /// `true` when `service` is in the exclusion set (exact match).
    pub fn is_excluded(&self, service: &str) -> bool {
        self.excluded_services.contains(service)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
