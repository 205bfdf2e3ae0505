//! Consolidating several data folders into one destination tree.
//!
//! Relative layout is preserved and nothing is ever deleted; a file that
//! already exists at the destination is skipped or overwritten according to
//! the [`ConflictPolicy`].

use std::path::{Path, PathBuf};

use spm_core::error::{Result, SpmError};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    Skip,
    Overwrite,
}

/// Counts reported by [`merge_data_folders`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub copied: usize,
    pub skipped: usize,
    pub overwritten: usize,
}

/// Copy every file of each folder in `sources` into `dest`.
///
/// Missing sources and a source that is `dest` itself are skipped with a
/// warning. When `dest` lies inside a source, the walk does not descend into
/// it.
pub fn merge_data_folders(sources: &[PathBuf], dest: &Path, policy: ConflictPolicy) -> Result<MergeStats> {
    std::fs::create_dir_all(dest).map_err(|source| SpmError::FileWrite {
        path: dest.to_path_buf(),
        source,
    })?;
    let dest_canonical = dest.canonicalize().map_err(|source| SpmError::FileRead {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut stats = MergeStats::default();
    for source in sources {
        if !source.is_dir() {
            warn!("Skipping missing source folder: {}", source.display());
            continue;
        }
        let source_canonical = match source.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping {}: {}", source.display(), e);
                continue;
            }
        };
        if source_canonical == dest_canonical {
            warn!(
                "Skipping {}: it is the destination folder",
                source.display()
            );
            continue;
        }

        info!("Merging {} into {}", source.display(), dest.display());
        merge_one(&source_canonical, &dest_canonical, policy, &mut stats)?;
    }

    info!(
        "Merge finished: {} copied, {} overwritten, {} skipped",
        stats.copied, stats.overwritten, stats.skipped
    );
    Ok(stats)
}

fn merge_one(source: &Path, dest: &Path, policy: ConflictPolicy, stats: &mut MergeStats) -> Result<()> {
    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.path() != dest);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", source.display(), e);
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|source| SpmError::FileWrite {
                path: target.clone(),
                source,
            })?;
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let existed = target.exists();
        if existed && policy == ConflictPolicy::Skip {
            debug!("Exists, skipping: {}", target.display());
            stats.skipped += 1;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SpmError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::copy(entry.path(), &target).map_err(|source| SpmError::FileWrite {
            path: target.clone(),
            source,
        })?;
        if existed {
            stats.overwritten += 1;
        } else {
            stats.copied += 1;
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_merge_preserves_layout() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        write(&a.join("2.0.1.0").join("PerformanceLog").join("x.log"), "a");
        write(&b.join("2.0.1.3").join("PerformanceLog").join("y.log"), "b");
        let dest = tmp.path().join("data");

        let stats = merge_data_folders(&[a, b], &dest, ConflictPolicy::Skip).unwrap();
        assert_eq!(stats.copied, 2);
        assert_eq!(
            std::fs::read_to_string(dest.join("2.0.1.0/PerformanceLog/x.log")).unwrap(),
            "a"
        );
        assert!(dest.join("2.0.1.3/PerformanceLog/y.log").exists());
    }

    #[test]
    fn test_merge_conflicts_skip_then_overwrite() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        write(&src.join("v1").join("x.log"), "new");
        write(&dest.join("v1").join("x.log"), "old");
        write(&dest.join("v1").join("keep.log"), "keep");

        let stats = merge_data_folders(&[src.clone()], &dest, ConflictPolicy::Skip).unwrap();
        assert_eq!(stats, MergeStats { copied: 0, skipped: 1, overwritten: 0 });
        assert_eq!(std::fs::read_to_string(dest.join("v1/x.log")).unwrap(), "old");

        let stats = merge_data_folders(&[src], &dest, ConflictPolicy::Overwrite).unwrap();
        assert_eq!(stats.overwritten, 1);
        assert_eq!(stats.copied, 0);
        assert_eq!(std::fs::read_to_string(dest.join("v1/x.log")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(dest.join("v1/keep.log")).unwrap(), "keep");
    }

    #[test]
    fn test_merge_skips_missing_and_self() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        write(&dest.join("v1").join("x.log"), "x");

        let stats = merge_data_folders(
            &[tmp.path().join("nope"), dest.clone()],
            &dest,
            ConflictPolicy::Overwrite,
        )
        .unwrap();
        assert_eq!(stats, MergeStats::default());
        assert_eq!(std::fs::read_to_string(dest.join("v1/x.log")).unwrap(), "x");
    }

    #[test]
    fn test_merge_does_not_descend_into_nested_dest() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("v1").join("x.log"), "x");
        let dest = src.join("merged");

        let stats = merge_data_folders(&[src.clone()], &dest, ConflictPolicy::Skip).unwrap();
        assert_eq!(stats.copied, 1);
        assert!(dest.join("v1/x.log").exists());
        assert!(!dest.join("merged").exists());
    }
}
