//! Reading and atomically writing the CSV artifacts of a result folder.
//!
//! Every write goes to a temporary file in the destination directory which is
//! then renamed over the target, so an interrupted run never leaves a
//! half-written artifact behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use spm_core::error::{Result, SpmError};
use tempfile::NamedTempFile;
use tracing::debug;

// ── Artifact names ────────────────────────────────────────────────────────────

/// Per-version summary (`<result>/<version>/summary.csv`) and the combined
/// summary (`<result>/summary.csv`) share this file name.
pub const SUMMARY_FILE: &str = "summary.csv";

/// Overall per-version statistics.
pub const OVERALL_STATS_FILE: &str = "summary_stats.csv";

/// Per-service, per-version statistics.
pub const SERVICE_STATS_FILE: &str = "service_stats.csv";

/// First header cell of every service-keyed artifact.
pub const SERVICE_COLUMN: &str = "service";

/// Mode of a newly created artifact. An existing artifact keeps its own mode.
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

// ── Writing ───────────────────────────────────────────────────────────────────

/// Atomically replace `path` with `bytes`, creating parent directories.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|source| SpmError::FileWrite {
        path: parent.clone(),
        source,
    })?;

    let write_err = |source| SpmError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o7777)
            .unwrap_or(ARTIFACT_MODE);
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))
            .map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Serialize `header` and `rows` as CSV and atomically write them to `path`.
///
/// Records are `\n`-terminated and fields are quoted only when necessary.
pub fn write_csv_atomic<I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut bytes = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut bytes);
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }
    write_bytes_atomic(path, &bytes)
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Raw CSV content: the header row plus every data row as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV file whose rows may have differing lengths.
///
/// A missing file is [`SpmError::MissingInput`]. A leading byte-order mark is
/// removed from the first header cell. Rows that cannot be decoded are
/// skipped.
pub fn read_csv(path: &Path) -> Result<CsvTable> {
    if !path.exists() {
        return Err(SpmError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| SpmError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut table = CsvTable::default();
    let mut records = reader.records();
    match records.next() {
        Some(Ok(first)) => {
            table.header = first.iter().map(str::to_string).collect();
            if let Some(cell) = table.header.first_mut() {
                *cell = cell.trim_start_matches('\u{feff}').to_string();
            }
        }
        Some(Err(e)) => {
            return Err(SpmError::SchemaMismatch {
                path: path.to_path_buf(),
                reason: format!("unreadable header: {e}"),
            })
        }
        None => return Ok(table),
    }

    for record in records {
        match record {
            Ok(r) => table.rows.push(r.iter().map(str::to_string).collect()),
            Err(e) => debug!("Skipping unreadable row in {}: {}", path.display(), e),
        }
    }
    Ok(table)
}

/// Require the header of `table` to start with `first_column`.
pub fn expect_first_column(path: &Path, table: &CsvTable, first_column: &str) -> Result<()> {
    match table.header.first() {
        Some(cell) if cell == first_column => Ok(()),
        Some(cell) => Err(SpmError::SchemaMismatch {
            path: path.to_path_buf(),
            reason: format!("expected first column '{first_column}', found '{cell}'"),
        }),
        None => Err(SpmError::SchemaMismatch {
            path: path.to_path_buf(),
            reason: "missing header".to_string(),
        }),
    }
}

/// Parse a CSV cell as a non-negative integer, tolerating surrounding spaces.
pub fn parse_cell(cell: &str) -> Option<u64> {
    cell.trim().parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_write_csv_atomic_exact_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        write_csv_atomic(
            &path,
            &header(&["service", "a", "b"]),
            vec![
                vec!["X".to_string(), "1".to_string(), String::new()],
                vec!["Y, Inc".to_string(), String::new(), "2".to_string()],
            ],
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "service,a,b\nX,1,\n\"Y, Inc\",,2\n");
    }

    #[test]
    fn test_write_replaces_existing_file_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "service,trunc").unwrap();
        write_csv_atomic(&path, &header(&["service", "v"]), Vec::new()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "service,v\n");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_artifact_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        write_csv_atomic(&path, &header(&["service", "v"]), Vec::new()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();
        write_bytes_atomic(&path, b"{\"a\":1}").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_read_csv_missing_is_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = read_csv(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, SpmError::MissingInput { .. }));
    }

    #[test]
    fn test_read_csv_flexible_rows_and_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "\u{feff}service,v1\nA,1\nB\n\nC,3,extra\n").unwrap();
        let table = read_csv(&path).unwrap();
        assert_eq!(table.header, header(&["service", "v1"]));
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], vec!["B".to_string()]);
        assert!(expect_first_column(&path, &table, "service").is_ok());
    }

    #[test]
    fn test_read_csv_empty_file_has_no_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();
        let table = read_csv(&path).unwrap();
        let err = expect_first_column(&path, &table, "service").unwrap_err();
        assert!(matches!(err, SpmError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_expect_first_column_wrong_name() {
        let table = CsvTable {
            header: header(&["metric", "v1"]),
            rows: Vec::new(),
        };
        let err = expect_first_column(Path::new("x.csv"), &table, "service").unwrap_err();
        assert!(err.to_string().contains("found 'metric'"));
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("42"), Some(42));
        assert_eq!(parse_cell(" 42 "), Some(42));
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("-3"), None);
        assert_eq!(parse_cell("4.5"), None);
    }
}
