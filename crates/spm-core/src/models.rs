use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single timing observation extracted from one log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    /// Service label, trimmed and never empty.
    pub service: String,
    /// Reported loading / elapsed time in milliseconds.
    pub duration_ms: u64,
}

impl Sample {
    /// Build a sample, trimming the label.
    ///
    /// Returns `None` when the trimmed label is empty.
    pub fn new(service: &str, duration_ms: u64) -> Option<Self> {
        let service = service.trim();
        if service.is_empty() {
            return None;
        }
        Some(Self {
            service: service.to_string(),
            duration_ms,
        })
    }
}

/// The ordered samples of one version, in file-then-line encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSummary {
    /// Version label (the name of the version folder).
    pub version: String,
    /// Samples exactly as encountered; never sorted or grouped.
    pub samples: Vec<Sample>,
}

impl VersionSummary {
    pub fn new(version: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            version: version.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One `(service, version, duration)` observation of a combined table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongFormRecord {
    pub service: String,
    pub version: String,
    pub duration_ms: u64,
}

/// One positional row of the combined table: a value per version or a blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedRow {
    pub service: String,
    pub cells: Vec<Option<u64>>,
}

/// Per-service, per-version raw values with a stable global service order.
///
/// Service order is the order in which services were first pushed. Callers
/// push versions in sorted label order, each version's samples in their
/// original order, which yields the first-seen ordering of the combined
/// artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedTable {
    versions: Vec<String>,
    service_order: Vec<String>,
    values: HashMap<String, HashMap<String, Vec<u64>>>,
}

impl CombinedTable {
    /// Create an empty table with the given version columns.
    pub fn new(versions: Vec<String>) -> Self {
        Self {
            versions,
            ..Self::default()
        }
    }

    /// Append `value` to the `(service, version)` list.
    ///
    /// Unknown versions are appended as new columns.
    pub fn push(&mut self, version: &str, service: &str, value: u64) {
        if !self.versions.iter().any(|v| v == version) {
            self.versions.push(version.to_string());
        }
        if !self.values.contains_key(service) {
            self.service_order.push(service.to_string());
        }
        self.values
            .entry(service.to_string())
            .or_default()
            .entry(version.to_string())
            .or_default()
            .push(value);
    }

    /// Version column labels, in column order.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Services in first-seen order.
    pub fn services(&self) -> &[String] {
        &self.service_order
    }

    /// `true` when no service has any value.
    pub fn is_empty(&self) -> bool {
        self.service_order.is_empty()
    }

    /// Raw values of `service` under `version` (empty when absent).
    pub fn values(&self, service: &str, version: &str) -> &[u64] {
        self.values
            .get(service)
            .and_then(|m| m.get(version))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of output rows `service` contributes: its longest version list.
    pub fn row_count(&self, service: &str) -> usize {
        self.versions
            .iter()
            .map(|v| self.values(service, v).len())
            .max()
            .unwrap_or(0)
    }

    /// Total number of rows the serialized table will contain.
    pub fn total_rows(&self) -> usize {
        self.service_order.iter().map(|s| self.row_count(s)).sum()
    }

    /// Positionally aligned rows; row *i* of a service holds each version's
    /// *i*-th value or `None`.
    pub fn rows(&self) -> Vec<CombinedRow> {
        let mut rows = Vec::with_capacity(self.total_rows());
        for service in &self.service_order {
            for idx in 0..self.row_count(service) {
                let cells = self
                    .versions
                    .iter()
                    .map(|v| self.values(service, v).get(idx).copied())
                    .collect();
                rows.push(CombinedRow {
                    service: service.clone(),
                    cells,
                });
            }
        }
        rows
    }

    /// Every value of `version`, pooled across all services.
    pub fn version_values(&self, version: &str) -> Vec<u64> {
        self.service_order
            .iter()
            .flat_map(|s| self.values(s, version).iter().copied())
            .collect()
    }

    /// Melt the table into long form, one record per non-blank cell.
    pub fn long_form(&self) -> Vec<LongFormRecord> {
        let mut records = Vec::new();
        for version in &self.versions {
            for service in &self.service_order {
                for &value in self.values(service, version) {
                    records.push(LongFormRecord {
                        service: service.clone(),
                        version: version.clone(),
                        duration_ms: value,
                    });
                }
            }
        }
        records
    }

    /// Copy of the table without the services for which `exclude` is true.
    pub fn without_services(&self, exclude: impl Fn(&str) -> bool) -> CombinedTable {
        let service_order: Vec<String> = self
            .service_order
            .iter()
            .filter(|s| !exclude(s))
            .cloned()
            .collect();
        let values = service_order
            .iter()
            .filter_map(|s| self.values.get(s).map(|m| (s.clone(), m.clone())))
            .collect();
        CombinedTable {
            versions: self.versions.clone(),
            service_order,
            values,
        }
    }
}

/// Descriptive aggregates of one service under one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatistic {
    pub service: String,
    pub version: String,
    pub avg: u64,
    pub max: u64,
    pub min: u64,
    pub median: u64,
}

/// Outcome of checking a dataset's shape.
///
/// `error` is fatal for visualization readiness only; warnings never are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

impl ValidationResult {
    /// `true` when the dataset may be visualized.
    pub fn is_ready(&self) -> bool {
        self.error.is_none()
    }

    /// `true` when there is nothing to report at all.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.error.is_none()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
