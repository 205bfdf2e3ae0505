//! Statistics tables derived from the combined summary.
//!
//! The presentation layer reads these artifacts as-is and never recomputes
//! statistics itself.

use std::path::{Path, PathBuf};

use spm_core::config::PipelineConfig;
use spm_core::error::Result;
use spm_core::models::{CombinedTable, LongFormRecord, ServiceStatistic};
use spm_core::stats::Aggregates;
use spm_core::validation::normalize_service_name;
use tracing::info;

use crate::artifact::{self, OVERALL_STATS_FILE, SERVICE_COLUMN, SERVICE_STATS_FILE, SUMMARY_FILE};
use crate::combiner::read_combined;

/// Row labels of the overall statistics table, in output order.
pub const OVERALL_METRICS: [&str; 4] = ["Average", "Max", "Min", "Median"];

/// Column suffixes of the per-service table, in output order per version.
pub const SERVICE_METRIC_SUFFIXES: [&str; 4] = ["avg", "max", "min", "median"];

// ── Overall ───────────────────────────────────────────────────────────────────

/// Aggregates of every version, pooled over all services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStats {
    pub versions: Vec<String>,
    pub per_version: Vec<Aggregates>,
}

impl OverallStats {
    /// Pool each version's values across services and aggregate them.
    pub fn from_table(table: &CombinedTable) -> Self {
        let versions = table.versions().to_vec();
        let per_version = versions
            .iter()
            .map(|v| Aggregates::of(&table.version_values(v)))
            .collect();
        Self {
            versions,
            per_version,
        }
    }

    /// Rows `Average`, `Max`, `Min`, `Median`, one cell per version.
    pub fn rows(&self) -> Vec<Vec<String>> {
        OVERALL_METRICS
            .iter()
            .map(|metric| {
                let mut row = vec![metric.to_string()];
                row.extend(self.per_version.iter().map(|agg| {
                    let value = match *metric {
                        "Average" => agg.avg,
                        "Max" => agg.max,
                        "Min" => agg.min,
                        _ => agg.median,
                    };
                    value.to_string()
                }));
                row
            })
            .collect()
    }

    /// Write `metric,<v1>,<v2>,...` plus the four metric rows.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut header = vec!["metric".to_string()];
        header.extend(self.versions.iter().cloned());
        artifact::write_csv_atomic(path, &header, self.rows())
    }
}

// ── Per service ───────────────────────────────────────────────────────────────

/// Per-service aggregates for every version, services in first-seen order.
pub fn service_statistics(table: &CombinedTable) -> Vec<ServiceStatistic> {
    table
        .services()
        .iter()
        .flat_map(|service| {
            table
                .versions()
                .iter()
                .map(move |version| Aggregates::of(table.values(service, version)).for_service(service, version))
        })
        .collect()
}

/// Write `service,<v>_avg,<v>_max,<v>_min,<v>_median,...`, one row per service.
pub fn write_service_stats(table: &CombinedTable, path: &Path) -> Result<()> {
    let mut header = vec![SERVICE_COLUMN.to_string()];
    for version in table.versions() {
        header.extend(
            SERVICE_METRIC_SUFFIXES
                .iter()
                .map(|suffix| format!("{version}_{suffix}")),
        );
    }

    let stats = service_statistics(table);
    let per_row = table.versions().len().max(1);
    let rows = stats.chunks(per_row).map(|chunk| {
        let mut row = Vec::with_capacity(1 + chunk.len() * 4);
        row.push(chunk[0].service.clone());
        for stat in chunk {
            row.push(stat.avg.to_string());
            row.push(stat.max.to_string());
            row.push(stat.min.to_string());
            row.push(stat.median.to_string());
        }
        row
    });
    artifact::write_csv_atomic(path, &header, rows)
}

// ── Pipeline step ─────────────────────────────────────────────────────────────

/// Paths of the statistics artifacts written by [`generate_statistics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsArtifacts {
    pub overall: PathBuf,
    pub per_service: PathBuf,
    /// Services left after the exclusion filter.
    pub services: usize,
}

/// Load the combined summary of `result_dir` without excluded services.
///
/// Fails with `MissingInput` when the combined artifact is absent and with
/// `SchemaMismatch` when its header is wrong.
pub fn load_filtered_table(result_dir: &Path, config: &PipelineConfig) -> Result<CombinedTable> {
    let table = read_combined(&result_dir.join(SUMMARY_FILE))?;
    Ok(table.without_services(|s| config.is_excluded(&normalize_service_name(s))))
}

/// Long-form records of the combined summary of `result_dir`, unfiltered.
pub fn load_long_form(result_dir: &Path) -> Result<Vec<LongFormRecord>> {
    Ok(read_combined(&result_dir.join(SUMMARY_FILE))?.long_form())
}

/// Compute and write both statistics artifacts from the combined summary.
pub fn generate_statistics(result_dir: &Path, config: &PipelineConfig) -> Result<StatisticsArtifacts> {
    let table = load_filtered_table(result_dir, config)?;

    let overall = result_dir.join(OVERALL_STATS_FILE);
    OverallStats::from_table(&table).write(&overall)?;
    info!("Wrote overall stats to {}", overall.display());

    let per_service = result_dir.join(SERVICE_STATS_FILE);
    write_service_stats(&table, &per_service)?;
    info!("Wrote per-service stats to {}", per_service.display());

    Ok(StatisticsArtifacts {
        overall,
        per_service,
        services: table.services().len(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
