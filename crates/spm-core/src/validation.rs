//! Dataset shape checks run before a dataset is handed to visualization.

use std::collections::BTreeMap;

use crate::config::PipelineConfig;
use crate::models::{LongFormRecord, ValidationResult};

/// Trim a service name and collapse internal whitespace runs to one space.
pub fn normalize_service_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize names and drop excluded services.
///
/// The exclusion set is matched case-sensitively against the normalized name.
pub fn filter_records(records: &[LongFormRecord], config: &PipelineConfig) -> Vec<LongFormRecord> {
    records
        .iter()
        .filter_map(|r| {
            let service = normalize_service_name(&r.service);
            if service.is_empty() || config.is_excluded(&service) {
                return None;
            }
            Some(LongFormRecord {
                service,
                version: r.version.clone(),
                duration_ms: r.duration_ms,
            })
        })
        .collect()
}

/// Check a long-form record set against the dataset rules.
///
/// Records are normalized and filtered with [`filter_records`] first. Rules,
/// in order:
/// 1. the distinct service count must equal `expected_service_count`
///    (warning otherwise);
/// 2. a service matching `baseline_service` case-insensitively must exist
///    (fatal error otherwise, nothing further is checked);
/// 3. every other service must have as many samples as the baseline
///    (one warning listing all offenders otherwise).
pub fn validate_records(records: &[LongFormRecord], config: &PipelineConfig) -> ValidationResult {
    let cleaned = filter_records(records, config);
    let mut result = ValidationResult::default();

    // Sorted by name so messages are deterministic.
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &cleaned {
        *counts.entry(record.service.as_str()).or_insert(0) += 1;
    }

    let service_count = counts.len();
    if service_count != config.expected_service_count {
        result.warnings.push(format!(
            "Warning: dataset must include {} services, found {}.",
            config.expected_service_count, service_count
        ));
    }

    let wanted = config.baseline_service.to_uppercase();
    let Some((baseline_name, baseline)) = counts
        .iter()
        .find(|(name, _)| name.to_uppercase() == wanted)
        .map(|(name, count)| (*name, *count))
    else {
        result.error = Some(format!(
            "Error: dataset is missing required '{}' service.",
            config.baseline_service
        ));
        return result;
    };

    let mismatched: Vec<String> = counts
        .iter()
        .filter(|(name, count)| **name != baseline_name && **count != baseline)
        .map(|(name, count)| format!("{} ({} samples)", name, count))
        .collect();

    if !mismatched.is_empty() {
        result.warnings.push(format!(
            "Warning: sample counts differ from {} ({} samples): {}.",
            config.baseline_service,
            baseline,
            mismatched.join(", ")
        ));
    }

    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
