//! Content identity hashing
//!
//! A run's durable identity is a digest of its raw payload bytes.
//! Filenames, run numbers, and sidecar metadata never participate, so
//! re-presenting the same bytes under a different name is a no-op for
//! the warehouse.

use mdw_common::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Calculate the content-identity digest of a raw run payload.
///
/// The payload is decoded as UTF-8 text and re-encoded before hashing
/// so that the digest tracks canonical content rather than incidental
/// encoding differences. Returns a lowercase hex SHA-256 string.
pub fn content_hash(run_path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(run_path)?;
    let digest = Sha256::digest(text.as_bytes());
    Ok(format!("{:x}", digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_same_digest() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("run_1.csv");
        let b = tmp.path().join("run_9.csv");
        fs::write(&a, "t,v\n0,0.5\n1,0.7\n").unwrap();
        fs::write(&b, "t,v\n0,0.5\n1,0.7\n").unwrap();

        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_differing_content_differs() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("run_1.csv");
        let b = tmp.path().join("run_2.csv");
        fs::write(&a, "t,v\n0,0.5\n").unwrap();
        fs::write(&b, "t,v\n0,0.6\n").unwrap();

        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("run_1.csv");
        fs::write(&a, "payload").unwrap();

        let digest = content_hash(&a).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(digest, format!("{:x}", Sha256::digest(b"payload")));
    }
}
