//! Merging per-version summaries into one positionally aligned table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use spm_core::error::{Result, SpmError};
use spm_core::models::CombinedTable;
use tracing::{info, warn};

use crate::artifact::{self, SERVICE_COLUMN};
use crate::summary::read_summary;

/// Build the combined table from `version → summary artifact` paths.
///
/// Versions are visited in sorted label order and become the columns. A
/// missing artifact or one with a bad header is skipped with a warning; its
/// version still appears as an (empty) column.
pub fn combine_tables(summaries: &BTreeMap<String, PathBuf>) -> CombinedTable {
    let mut table = CombinedTable::new(summaries.keys().cloned().collect());
    for (version, path) in summaries {
        if !path.exists() {
            warn!("Skipping missing summary: {}", path.display());
            continue;
        }
        match read_summary(path) {
            Ok(samples) => {
                for sample in samples {
                    table.push(version, &sample.service, sample.duration_ms);
                }
            }
            Err(e) => warn!("Skipping summary {}: {}", path.display(), e),
        }
    }
    table
}

/// Serialize a combined table to `out_path`.
///
/// Header is `service,<v1>,<v2>,...`; each service contributes as many rows
/// as its longest version list, blank where a version has no value at that
/// position. Returns the number of rows written.
pub fn write_combined(table: &CombinedTable, out_path: &Path) -> Result<usize> {
    let mut header = vec![SERVICE_COLUMN.to_string()];
    header.extend(table.versions().iter().cloned());

    let rows = table.rows();
    let count = rows.len();
    let records = rows.into_iter().map(|row| {
        let mut record = Vec::with_capacity(row.cells.len() + 1);
        record.push(row.service);
        record.extend(
            row.cells
                .into_iter()
                .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()),
        );
        record
    });
    artifact::write_csv_atomic(out_path, &header, records)?;
    Ok(count)
}

/// Combine the per-version summaries into `out_path`.
///
/// Returns the number of combined rows; `0` means no usable service was found
/// and nothing was written.
pub fn combine_summaries(summaries: &BTreeMap<String, PathBuf>, out_path: &Path) -> Result<usize> {
    if summaries.is_empty() {
        info!("No summaries to combine");
        return Ok(0);
    }
    let table = combine_tables(summaries);
    if table.is_empty() {
        info!("No service rows collected; skipping combined summary");
        return Ok(0);
    }
    let rows = write_combined(&table, out_path)?;
    info!("Wrote combined summary to {} ({} rows)", out_path.display(), rows);
    Ok(rows)
}

/// Read a combined summary artifact back into a table.
///
/// The header must be `service` followed by at least one version column.
/// Blank and non-integer cells are skipped; empty rows are ignored.
pub fn read_combined(path: &Path) -> Result<CombinedTable> {
    let csv = artifact::read_csv(path)?;
    artifact::expect_first_column(path, &csv, SERVICE_COLUMN)?;
    let versions: Vec<String> = csv.header[1..].to_vec();
    if versions.is_empty() {
        return Err(SpmError::SchemaMismatch {
            path: path.to_path_buf(),
            reason: "no version columns".to_string(),
        });
    }

    let mut table = CombinedTable::new(versions.clone());
    for row in &csv.rows {
        let Some(service) = row.first() else {
            continue;
        };
        for (idx, version) in versions.iter().enumerate() {
            if let Some(value) = row.get(idx + 1).and_then(|c| artifact::parse_cell(c)) {
                table.push(version, service, value);
            }
        }
    }
    Ok(table)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
