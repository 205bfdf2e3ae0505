//! Per-version summary artifacts: every parsed sample of one version in
//! encounter order.

use std::path::Path;

use spm_core::error::Result;
use spm_core::models::{Sample, VersionSummary};
use tracing::{debug, warn};

use crate::artifact::{self, SERVICE_COLUMN};
use crate::parser::LogLineParser;
use crate::scanner::{list_matching_files, VersionLogDir};

/// Header of a per-version summary artifact.
pub const SUMMARY_HEADER: [&str; 2] = [SERVICE_COLUMN, "loading_time_ms"];

/// Parse every file of one version's log folder.
///
/// Files are visited in lexicographic order and lines in file order; samples
/// are concatenated without sorting or grouping. Files that cannot be read
/// are logged and skipped.
pub fn collect_samples(parser: &LogLineParser, log: &VersionLogDir) -> VersionSummary {
    let files = list_matching_files(&log.log_dir, log.pattern);
    let mut samples = Vec::new();
    for file in &files {
        match parser.parse_file(file) {
            Ok(parsed) => samples.extend(parsed),
            Err(e) => warn!("Skipping {}: {}", file.display(), e),
        }
    }
    debug!(
        "{}: {} samples from {} files ({})",
        log.log_dir.display(),
        samples.len(),
        files.len(),
        log.pattern
    );
    VersionSummary::new(log.version.clone(), samples)
}

/// Write `samples` as a summary artifact at `out_path`.
pub fn write_summary(out_path: &Path, samples: &[Sample]) -> Result<()> {
    let header: Vec<String> = SUMMARY_HEADER.iter().map(|c| c.to_string()).collect();
    let rows = samples
        .iter()
        .map(|s| vec![s.service.clone(), s.duration_ms.to_string()]);
    artifact::write_csv_atomic(out_path, &header, rows)
}

/// Build the summary artifact of one version.
///
/// An empty summary means no timing line matched; nothing is written then.
pub fn build_summary(
    parser: &LogLineParser,
    log: &VersionLogDir,
    out_path: &Path,
) -> Result<VersionSummary> {
    let summary = collect_samples(parser, log);
    if !summary.is_empty() {
        write_summary(out_path, &summary.samples)?;
    }
    Ok(summary)
}

/// Read a summary artifact back into samples.
///
/// The header must start with `service`. Short rows, blank services and
/// non-integer values are skipped.
pub fn read_summary(path: &Path) -> Result<Vec<Sample>> {
    let table = artifact::read_csv(path)?;
    artifact::expect_first_column(path, &table, SERVICE_COLUMN)?;
    Ok(table
        .rows
        .iter()
        .filter_map(|row| {
            let service = row.first()?;
            let value = artifact::parse_cell(row.get(1)?)?;
            Sample::new(service, value)
        })
        .collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
