//! Compresses and optionally removes the canonical output tree.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use obx_core::{ErrorInfo, ObxError};

/// Post-run disposal of the canonical tree.
///
/// With `compress`, a single `<root>.zip` containing every file under the
/// tree is produced. With `delete_after`, the tree is removed — but only
/// after a successful archive when both options are requested; without
/// compression the deletion acts immediately, which is the caller's explicit
/// request for data loss.
///
/// Returns the archive path when one was produced.
pub fn finalize(
    canonical_root: &Path,
    compress: bool,
    delete_after: bool,
) -> Result<Option<PathBuf>, ObxError> {
    let archive = if compress {
        Some(archive_tree(canonical_root)?)
    } else {
        None
    };
    if delete_after {
        fs::remove_dir_all(canonical_root)
            .map_err(|err| ObxError::io("tree_remove", canonical_root.display(), err))?;
        tracing::info!(root = %canonical_root.display(), "removed canonical tree");
    }
    Ok(archive)
}

fn archive_tree(canonical_root: &Path) -> Result<PathBuf, ObxError> {
    let base = canonical_root
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ObxError::Config(
                ErrorInfo::new("archive_root", "canonical root has no usable base name")
                    .with_context("path", canonical_root.display().to_string()),
            )
        })?;
    let parent = match canonical_root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let archive_path = parent.join(format!("{base}.zip"));
    let file = File::create(&archive_path)
        .map_err(|err| ObxError::io("archive_create", archive_path.display(), err))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(canonical_root).sort_by_file_name() {
        let entry =
            entry.map_err(|err| ObxError::io("archive_walk", canonical_root.display(), err))?;
        let relative = entry
            .path()
            .strip_prefix(canonical_root)
            .map_err(|err| ObxError::io("archive_walk", entry.path().display(), err))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|err| archive_error(&archive_path, err))?;
        } else {
            writer
                .start_file(name, options)
                .map_err(|err| archive_error(&archive_path, err))?;
            let mut source = File::open(entry.path())
                .map_err(|err| ObxError::io("archive_read", entry.path().display(), err))?;
            io::copy(&mut source, &mut writer)
                .map_err(|err| ObxError::io("archive_write", archive_path.display(), err))?;
        }
    }
    writer
        .finish()
        .map_err(|err| archive_error(&archive_path, err))?;
    tracing::info!(archive = %archive_path.display(), "archived canonical tree");
    Ok(archive_path)
}

fn archive_error(path: &Path, err: zip::result::ZipError) -> ObxError {
    ObxError::io("archive_write", path.display(), err)
}
