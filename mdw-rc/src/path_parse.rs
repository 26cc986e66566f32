//! Run path convention parsing
//!
//! Pure functions extracting identity fields from a run file's
//! location in the fixed directory layout:
//!
//! ```text
//! .../clinic=<id>/measurement=<kind>/<batch>/subject_<n>/run_<k>.csv
//!                                                        run_<k>_header.json
//! ```
//!
//! No I/O happens here; everything operates on the path string alone.

use mdw_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Prefix of per-subject directory names
pub const SUBJECT_DIR_PREFIX: &str = "subject_";

/// Prefix of run file base names
pub const RUN_FILE_PREFIX: &str = "run_";

/// Suffix distinguishing a sidecar metadata stem from the raw stem
pub const METADATA_STEM_SUFFIX: &str = "_header";

/// Extension of raw payload files
pub const RAW_EXTENSION: &str = "csv";

/// Extension of sidecar metadata files
pub const METADATA_EXTENSION: &str = "json";

fn malformed(path: &Path, reason: impl Into<String>) -> Error {
    Error::MalformedPath {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Parse the subject number from the run file's parent directory name.
///
/// The parent must be named `subject_<digits>`.
pub fn parse_subject_id(run_path: &Path) -> Result<i64> {
    let parent = run_path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .ok_or_else(|| malformed(run_path, "no parent directory"))?;

    let digits = parent.strip_prefix(SUBJECT_DIR_PREFIX).ok_or_else(|| {
        malformed(
            run_path,
            format!("parent directory '{parent}' lacks '{SUBJECT_DIR_PREFIX}' prefix"),
        )
    })?;

    digits.parse::<i64>().map_err(|_| {
        malformed(
            run_path,
            format!("subject directory suffix '{digits}' is not numeric"),
        )
    })
}

/// Parse the clinic-supplied run number from the file's base name.
///
/// Accepts both the raw stem (`run_3`) and the sidecar stem
/// (`run_3_header`). The run number is informational only and never
/// participates in run identity.
pub fn parse_run_number(run_path: &Path) -> Result<i64> {
    let stem = run_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| malformed(run_path, "no file name"))?;

    let stem = stem.strip_suffix(METADATA_STEM_SUFFIX).unwrap_or(stem);
    let digits = stem.strip_prefix(RUN_FILE_PREFIX).ok_or_else(|| {
        malformed(
            run_path,
            format!("file name '{stem}' lacks '{RUN_FILE_PREFIX}' prefix"),
        )
    })?;

    digits
        .parse::<i64>()
        .map_err(|_| malformed(run_path, format!("run file suffix '{digits}' is not numeric")))
}

/// Extract the value of a `key=value` ancestor path segment.
fn parse_tagged_segment(run_path: &Path, prefix: &str) -> Result<String> {
    run_path
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .find_map(|segment| segment.strip_prefix(prefix))
        .map(|v| v.to_string())
        .ok_or_else(|| malformed(run_path, format!("no '{prefix}<value>' path segment")))
}

/// Extract the clinic id from the nearest `clinic=<id>` ancestor segment.
pub fn parse_clinic_id(run_path: &Path) -> Result<String> {
    parse_tagged_segment(run_path, "clinic=")
}

/// Extract the measurement kind from the nearest `measurement=<kind>`
/// ancestor segment.
pub fn parse_measurement(run_path: &Path) -> Result<String> {
    parse_tagged_segment(run_path, "measurement=")
}

/// Derive the raw CSV path from either the raw or sidecar file name.
/// Raw and sidecar files are related by their shared run token.
pub fn raw_payload_path(run_path: &Path) -> Result<PathBuf> {
    let number = parse_run_number(run_path)?;
    Ok(run_path.with_file_name(format!("{RUN_FILE_PREFIX}{number}.{RAW_EXTENSION}")))
}

/// Derive the companion sidecar metadata path for a run file.
pub fn sidecar_metadata_path(run_path: &Path) -> Result<PathBuf> {
    let number = parse_run_number(run_path)?;
    Ok(run_path.with_file_name(format!(
        "{RUN_FILE_PREFIX}{number}{METADATA_STEM_SUFFIX}.{METADATA_EXTENSION}"
    )))
}

/// Whether a file name looks like a raw run payload (`run_<n>.csv`).
pub fn is_raw_run_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(&format!(".{RAW_EXTENSION}")) else {
        return false;
    };
    stem.strip_prefix(RUN_FILE_PREFIX)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Whether a directory name follows the subject convention (`subject_<n>`).
pub fn is_subject_dir_name(name: &str) -> bool {
    name.strip_prefix(SUBJECT_DIR_PREFIX)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
