//! Candidate run record construction
//!
//! Composes the path parser, metadata loader, and content hasher into
//! one eagerly-populated immutable value. Persisted state and on-demand
//! file re-reads are kept separate: the record holds what was true at
//! build time, and the explicit `read_*` accessors go back to disk.

use crate::{hash, metadata, path_parse};
use chrono::NaiveDate;
use mdw_common::{Error, Result};
use std::path::Path;

/// One candidate measurement run, fully populated from disk.
///
/// Identity is `(subject_id, content_hash)`. `run_number` is
/// clinic-supplied and informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub subject_id: i64,
    pub run_number: i64,
    pub clinic_id: String,
    pub measurement: String,
    pub occurrence_date: NaiveDate,
    pub units: String,
    pub sample_rate: i64,
    pub age_at_run: i64,
    pub sex: String,
    pub content_hash: String,
    pub raw_path: String,
    pub meta_path: String,
}

impl RunRecord {
    /// Re-read the raw payload this record was built from.
    ///
    /// Deliberately not cached on the record: if the file's bytes have
    /// changed since build time, the caller sees the current content,
    /// and its hash will no longer match `content_hash`.
    pub fn read_raw(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.raw_path)?)
    }

    /// Re-read the sidecar metadata this record was built from.
    pub fn read_metadata(&self) -> Result<metadata::RunMetadata> {
        metadata::load_run_metadata(Path::new(&self.raw_path))
    }
}

/// Build a candidate run record from a raw payload path.
///
/// Requires the path to reference an existing file inside a
/// `subject_<n>` directory. Any parser, loader, or hashing failure is
/// wrapped in `InvalidRunPath` so the caller sees which candidate
/// failed along with the specific cause.
pub fn build_run_record(run_path: &Path) -> Result<RunRecord> {
    build_inner(run_path).map_err(|e| match e {
        already @ Error::InvalidRunPath { .. } => already,
        cause => Error::invalid_run_path(run_path, cause),
    })
}

fn build_inner(run_path: &Path) -> Result<RunRecord> {
    if !run_path.is_file() {
        return Err(Error::MalformedPath {
            path: run_path.to_path_buf(),
            reason: "not an existing file".to_string(),
        });
    }

    let subject_id = path_parse::parse_subject_id(run_path)?;
    let run_number = path_parse::parse_run_number(run_path)?;
    let clinic_id = path_parse::parse_clinic_id(run_path)?;
    let measurement = path_parse::parse_measurement(run_path)?;
    let meta_path = path_parse::sidecar_metadata_path(run_path)?;

    let meta = metadata::load_run_metadata(run_path)?;
    let occurrence_date = meta.occurrence_date(&meta_path)?;
    let content_hash = hash::content_hash(run_path)?;

    Ok(RunRecord {
        subject_id,
        run_number,
        clinic_id,
        measurement,
        occurrence_date,
        units: meta.units,
        sample_rate: meta.fs,
        age_at_run: meta.age,
        sex: meta.sex,
        content_hash,
        raw_path: run_path.to_string_lossy().into_owned(),
        meta_path: meta_path.to_string_lossy().into_owned(),
    })
}
