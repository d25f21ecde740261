//! Naming rules for the on-disk output layout.
//!
//! A session directory holds one summary file per problem family plus one
//! paired data subdirectory per summary file. The pairing is a fixed,
//! reversible name transformation: drop the `.info` extension and replace the
//! leading `obx` token with `data`, so `obx_f1_Sphere.info` pairs with
//! `data_f1_Sphere`. The merge protocol relies on this rule to locate the
//! data tree belonging to a summary file it is folding in.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use obx_core::ObxError;

/// Leading token of summary and data file names.
pub const SUMMARY_PREFIX: &str = "obx";
/// Extension identifying summary files.
pub const SUMMARY_EXTENSION: &str = "info";
/// Leading token of paired data directory names.
pub const DATA_PREFIX: &str = "data";

/// File name of the summary file for a problem family.
pub fn summary_file_name(fid: u64, problem_name: &str) -> String {
    format!("{SUMMARY_PREFIX}_f{fid}_{problem_name}.{SUMMARY_EXTENSION}")
}

/// Name of the data directory paired with `summary_file`, or `None` when the
/// name does not follow the summary naming rule.
pub fn data_directory_name(summary_file: &str) -> Option<String> {
    let stem = summary_file.strip_suffix(&format!(".{SUMMARY_EXTENSION}"))?;
    let rest = stem.strip_prefix(SUMMARY_PREFIX)?;
    Some(format!("{DATA_PREFIX}{rest}"))
}

/// True when `name` is recognized as a summary file name.
pub fn is_summary_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext == SUMMARY_EXTENSION)
        .unwrap_or(false)
}

/// File name of the per-dimension trace file inside a data directory.
pub fn data_file_name(fid: u64, dim: u64) -> String {
    format!("{SUMMARY_PREFIX}_f{fid}_DIM{dim}.dat")
}

/// Creates and returns a directory that no other session owns.
///
/// The first caller gets `<root>/<folder_name>`; later callers fall back to
/// `<folder_name>-1`, `<folder_name>-2`, … . `create_dir` is the atomic
/// claim, so concurrent sessions racing for the same name never share a
/// directory.
pub fn unique_directory(root: &Path, folder_name: &str) -> Result<PathBuf, ObxError> {
    fs::create_dir_all(root).map_err(|err| ObxError::io("session_root", root.display(), err))?;
    let mut candidate = root.join(folder_name);
    let mut suffix = 0u32;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                suffix += 1;
                candidate = root.join(format!("{folder_name}-{suffix}"));
            }
            Err(err) => return Err(ObxError::io("session_dir", candidate.display(), err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_and_data_names_pair_up() {
        let summary = summary_file_name(1, "Sphere");
        assert_eq!(summary, "obx_f1_Sphere.info");
        assert_eq!(data_directory_name(&summary).as_deref(), Some("data_f1_Sphere"));
    }

    #[test]
    fn unrecognized_names_have_no_pair() {
        assert_eq!(data_directory_name("notes.txt"), None);
        assert_eq!(data_directory_name("other_f1_Sphere.info"), None);
    }

    #[test]
    fn summary_detection_is_extension_based() {
        assert!(is_summary_file("obx_f4_OneMax.info"));
        assert!(!is_summary_file("obx_f4_OneMax.dat"));
        assert!(!is_summary_file("README"));
    }

    #[test]
    fn unique_directory_suffixes_taken_names() {
        let temp = tempfile::tempdir().expect("tmp dir");
        let first = unique_directory(temp.path(), "run").expect("first");
        let second = unique_directory(temp.path(), "run").expect("second");
        let third = unique_directory(temp.path(), "run").expect("third");
        assert_eq!(first, temp.path().join("run"));
        assert_eq!(second, temp.path().join("run-1"));
        assert_eq!(third, temp.path().join("run-2"));
    }
}
