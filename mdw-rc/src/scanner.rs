//! Candidate run file discovery
//!
//! Enumerates raw run payloads exactly two levels below the data root:
//! `subject_<n>/run_<k>.csv`. Anything else in the tree (sidecar
//! files, unconventional directories, stray files) is ignored here;
//! convention violations inside a matching candidate surface later
//! from the record builder.

use crate::path_parse;
use mdw_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Find all candidate raw run paths under the data root.
///
/// Filesystem enumeration order is not stable, so results are sorted.
/// The sort only serves deterministic logging and reporting; run
/// identity never depends on it.
pub fn find_run_paths(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.exists() {
        return Err(Error::InvalidInput(format!(
            "data directory not found: {}",
            data_dir.display()
        )));
    }
    if !data_dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "not a directory: {}",
            data_dir.display()
        )));
    }

    let mut paths = Vec::new();

    let walker = WalkDir::new(data_dir)
        .follow_links(false)
        .min_depth(2)
        .max_depth(2);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error accessing entry under {}: {}", data_dir.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let parent_matches = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .is_some_and(path_parse::is_subject_dir_name);
        let name_matches = entry
            .file_name()
            .to_str()
            .is_some_and(path_parse::is_raw_run_file_name);

        if parent_matches && name_matches {
            paths.push(entry.path().to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}
