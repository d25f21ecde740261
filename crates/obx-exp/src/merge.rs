//! Folds per-session output shards into the canonical output folder.
//!
//! Runs strictly after the dispatch barrier, single-threaded; only the
//! merger touches the canonical tree. Folding is append-only and
//! at-least-once: re-running against shards with un-drained content appends
//! duplicates, re-running once every shard is gone is a no-op.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use obx_core::{ErrorInfo, ObxError};
use obx_logger::layout;

/// A shard whose merge step was aborted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardFailure {
    /// Directory name of the shard.
    pub shard: String,
    /// Error that aborted the shard's merge.
    pub error: String,
}

/// Outcome of one merge pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Shards fully folded into the canonical folder, in merge order.
    pub merged: Vec<String>,
    /// Shards left in place because their merge step was aborted.
    pub failed: Vec<ShardFailure>,
}

impl MergeReport {
    /// True when no shard merge was aborted.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Discovers every sibling directory whose name extends `canonical_root`'s
/// base name and folds it into the canonical folder.
///
/// A format error aborts only the offending shard; already-merged canonical
/// content is retained (no rollback) and the remaining shards still merge.
pub fn merge_output(canonical_root: &Path) -> Result<MergeReport, ObxError> {
    let base = canonical_root
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ObxError::Config(
                ErrorInfo::new("merge_root", "canonical root has no usable base name")
                    .with_context("path", canonical_root.display().to_string()),
            )
        })?;
    let parent = match canonical_root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut report = MergeReport {
        merged: Vec::new(),
        failed: Vec::new(),
    };
    if !parent.is_dir() {
        return Ok(report);
    }
    for shard in sibling_shards(parent, base)? {
        let name = shard
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match merge_shard(&shard, canonical_root) {
            Ok(()) => {
                tracing::debug!(shard = %name, "folded shard into canonical folder");
                report.merged.push(name);
            }
            Err(err) => {
                tracing::warn!(shard = %name, error = %err, "aborted shard merge");
                report.failed.push(ShardFailure {
                    shard: name,
                    error: err.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Sibling directories prefixed by the canonical base name, sorted by name.
fn sibling_shards(parent: &Path, base: &str) -> Result<Vec<PathBuf>, ObxError> {
    let entries =
        fs::read_dir(parent).map_err(|err| ObxError::io("merge_scan", parent.display(), err))?;
    let mut shards = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ObxError::io("merge_scan", parent.display(), err))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(base) && name != base {
            shards.push(entry.path());
        }
    }
    shards.sort();
    Ok(shards)
}

fn merge_shard(shard: &Path, canonical_root: &Path) -> Result<(), ObxError> {
    fs::create_dir_all(canonical_root)
        .map_err(|err| ObxError::io("merge_root_dir", canonical_root.display(), err))?;
    for entry in sorted_entries(shard)? {
        if entry.is_dir() {
            // Data directories are folded through their paired summary file.
            continue;
        }
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data_dir = if layout::is_summary_file(&name) {
            layout::data_directory_name(&name)
        } else {
            None
        };
        let Some(data_dir) = data_dir else {
            return Err(ObxError::MergeFormat(
                ErrorInfo::new("stray_file", "shard contains an unrecognized file")
                    .with_context("shard", shard.display().to_string())
                    .with_context("file", name),
            ));
        };

        fold_summary_file(&entry, &canonical_root.join(&name))?;
        let source_data = shard.join(&data_dir);
        if source_data.is_dir() {
            fold_data_directory(&source_data, &canonical_root.join(&data_dir))?;
        }
        fs::remove_file(&entry).map_err(|err| ObxError::io("shard_cleanup", entry.display(), err))?;
        if source_data.is_dir() {
            fs::remove_dir(&source_data)
                .map_err(|err| ObxError::io("shard_cleanup", source_data.display(), err))?;
        }
    }
    if dir_is_empty(shard)? {
        fs::remove_dir(shard).map_err(|err| ObxError::io("shard_cleanup", shard.display(), err))?;
    }
    Ok(())
}

/// Appends the shard's summary content to the canonical file, separated by
/// exactly one blank line; creates the file verbatim when it is new.
fn fold_summary_file(source: &Path, target: &Path) -> Result<(), ObxError> {
    let content =
        fs::read(source).map_err(|err| ObxError::io("summary_read", source.display(), err))?;
    let existed = target.exists();
    let mut out = OpenOptions::new()
        .append(true)
        .create(true)
        .open(target)
        .map_err(|err| ObxError::io("summary_append", target.display(), err))?;
    if existed {
        out.write_all(b"\n")
            .map_err(|err| ObxError::io("summary_append", target.display(), err))?;
    }
    out.write_all(&content)
        .map_err(|err| ObxError::io("summary_append", target.display(), err))
}

/// Appends every file of the shard's data directory into the canonical data
/// directory, creating directory and files as needed; never overwrites.
fn fold_data_directory(source: &Path, target: &Path) -> Result<(), ObxError> {
    fs::create_dir_all(target).map_err(|err| ObxError::io("data_dir", target.display(), err))?;
    for file in sorted_entries(source)? {
        if file.is_dir() {
            return Err(ObxError::MergeFormat(
                ErrorInfo::new("nested_dir", "data directory contains a nested directory")
                    .with_context("path", file.display().to_string()),
            ));
        }
        let name = file.file_name().map(PathBuf::from).unwrap_or_default();
        let content =
            fs::read(&file).map_err(|err| ObxError::io("data_read", file.display(), err))?;
        let mut out = OpenOptions::new()
            .append(true)
            .create(true)
            .open(target.join(&name))
            .map_err(|err| ObxError::io("data_append", target.join(&name).display(), err))?;
        out.write_all(&content)
            .map_err(|err| ObxError::io("data_append", target.join(&name).display(), err))?;
        fs::remove_file(&file)
            .map_err(|err| ObxError::io("shard_cleanup", file.display(), err))?;
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ObxError> {
    let entries =
        fs::read_dir(dir).map_err(|err| ObxError::io("merge_scan", dir.display(), err))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ObxError::io("merge_scan", dir.display(), err))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn dir_is_empty(dir: &Path) -> Result<bool, ObxError> {
    let mut entries =
        fs::read_dir(dir).map_err(|err| ObxError::io("merge_scan", dir.display(), err))?;
    Ok(entries.next().is_none())
}
