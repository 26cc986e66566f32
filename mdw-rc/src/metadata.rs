//! Sidecar metadata loading
//!
//! Each raw run file `run_<n>.csv` is accompanied by a structured
//! sidecar `run_<n>_header.json` carrying the fields the warehouse
//! needs beyond the payload itself.

use crate::path_parse;
use chrono::NaiveDate;
use mdw_common::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Date format used by clinics in sidecar files (`DD.MM.YYYY`)
const SIDECAR_DATE_FORMAT: &str = "%d.%m.%Y";

/// Typed sidecar metadata for one run
#[derive(Debug, Clone, Deserialize)]
pub struct RunMetadata {
    /// Occurrence date, formatted `DD.MM.YYYY`
    pub date: String,
    /// Measurement units of the raw payload samples
    pub units: String,
    /// Sampling rate in Hz
    pub fs: i64,
    /// Subject's age at the time of the run
    pub age: i64,
    /// Single-character sex code as recorded by the clinic
    pub sex: String,
}

impl RunMetadata {
    /// Parse the clinic-formatted occurrence date into a calendar date.
    pub fn occurrence_date(&self, origin: &Path) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, SIDECAR_DATE_FORMAT).map_err(|e| {
            Error::MalformedMetadata {
                path: origin.to_path_buf(),
                reason: format!("date '{}' is not DD.MM.YYYY: {e}", self.date),
            }
        })
    }
}

/// Load and parse the sidecar metadata for the given raw run path.
///
/// The sidecar path is derived from the raw path by the shared run
/// token convention.
pub fn load_run_metadata(run_path: &Path) -> Result<RunMetadata> {
    let meta_path = path_parse::sidecar_metadata_path(run_path)?;

    if !meta_path.is_file() {
        return Err(Error::MissingMetadata(meta_path));
    }

    let contents = std::fs::read_to_string(&meta_path)?;
    let metadata: RunMetadata =
        serde_json::from_str(&contents).map_err(|e| Error::MalformedMetadata {
            path: meta_path.clone(),
            reason: e.to_string(),
        })?;

    // Reject an undecodable date at load time so a candidate fails
    // before any store round trip
    metadata.occurrence_date(&meta_path)?;

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_run(dir: &Path, body: &str) -> std::path::PathBuf {
        let raw = dir.join("run_1.csv");
        fs::write(&raw, "t,v\n0,1\n").unwrap();
        fs::write(dir.join("run_1_header.json"), body).unwrap();
        raw
    }

    #[test]
    fn test_load_valid_metadata() {
        let tmp = TempDir::new().unwrap();
        let raw = write_run(
            tmp.path(),
            r#"{"date": "05.11.2019", "units": "mV", "fs": 500, "age": 34, "sex": "F"}"#,
        );

        let meta = load_run_metadata(&raw).unwrap();
        assert_eq!(meta.units, "mV");
        assert_eq!(meta.fs, 500);
        assert_eq!(meta.age, 34);
        assert_eq!(meta.sex, "F");
        assert_eq!(
            meta.occurrence_date(&raw).unwrap(),
            NaiveDate::from_ymd_opt(2019, 11, 5).unwrap()
        );
    }

    #[test]
    fn test_missing_sidecar() {
        let tmp = TempDir::new().unwrap();
        let raw = tmp.path().join("run_2.csv");
        fs::write(&raw, "t,v\n").unwrap();

        let err = load_run_metadata(&raw).unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(_)));
    }

    #[test]
    fn test_absent_field_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let raw = write_run(
            tmp.path(),
            r#"{"date": "05.11.2019", "units": "mV", "fs": 500, "age": 34}"#,
        );

        let err = load_run_metadata(&raw).unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata { .. }));
    }

    #[test]
    fn test_bad_date_format_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let raw = write_run(
            tmp.path(),
            r#"{"date": "2019-11-05", "units": "mV", "fs": 500, "age": 34, "sex": "F"}"#,
        );

        let err = load_run_metadata(&raw).unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata { .. }));
    }
}
