//! Reading and writing result documents.
//!
//! A result is stored as a single JSON document:
//!
//! ```json
//! {
//!     "identifier": "r0",
//!     "tag": "",
//!     "versions": [
//!         { "version": 0, "data": {} },
//!         { "version": 1, "data": {} }
//!     ]
//! }
//! ```
//!
//! Persistence is atomic from a reader's point of view: the document is
//! serialized to a temporary file in the same directory and renamed over
//! the target, so a read observes either the previous or the new document,
//! never a partial write.

use std::fs;
use std::io;
use std::path::Path;

use attest_store::{ResultRecord, StoreError};

/// Read and validate a result document, or `None` if it does not exist.
///
/// A missing document is not an error at this layer: callers decide whether
/// absence means NotFound (a gated read) or simply "skip" (an enumeration
/// racing a concurrent delete). An undecodable document means the medium is
/// inconsistent; a decodable document with an empty version list violates an
/// engine invariant (the last version deletion must remove the document) and
/// is an internal error. The version list is normalized to ascending order.
pub(crate) fn try_read_document(path: &Path) -> Result<Option<ResultRecord>, StoreError> {
    log::debug!("Reading {}...", path.display());

    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::medium(
                format!("failed to open result document {}", path.display()),
                e,
            ))
        }
    };
    let mut record: ResultRecord =
        serde_json::from_reader(io::BufReader::new(file)).map_err(|e| {
            StoreError::medium_inconsistent(format!(
                "undecodable result document {}: {}",
                path.display(),
                e
            ))
        })?;

    if record.versions.is_empty() {
        return Err(StoreError::internal(format!(
            "result document {} has an empty version list",
            path.display()
        )));
    }

    record.normalize();
    Ok(Some(record))
}

/// Read a result document whose existence has already been confirmed.
///
/// Absence here means the document disappeared after an existence gate,
/// which surfaces as NotFound.
pub(crate) fn read_document(path: &Path) -> Result<ResultRecord, StoreError> {
    try_read_document(path)?.ok_or_else(|| {
        StoreError::not_found(format!("result document {} not found", path.display()))
    })
}

/// Persist a result document atomically.
pub(crate) fn write_document(path: &Path, record: &ResultRecord) -> Result<(), StoreError> {
    log::debug!("Writing {}...", path.display());

    let parent = path.parent().ok_or_else(|| {
        StoreError::internal(format!(
            "result document path has no parent directory: {}",
            path.display()
        ))
    })?;

    let mut normalized = record.clone();
    normalized.normalize();

    let temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        StoreError::medium(
            format!("failed to create temporary file in {}", parent.display()),
            e,
        )
    })?;
    serde_json::to_writer(temp.as_file(), &normalized).map_err(|e| {
        StoreError::internal(format!(
            "failed to serialize result document {}: {}",
            path.display(),
            e
        ))
    })?;
    temp.persist(path).map_err(|e| {
        StoreError::medium(
            format!("failed to replace result document {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_store::ResultVersion;
    use serde_json::json;

    fn record_with_versions(versions: Vec<(u32, serde_json::Value)>) -> ResultRecord {
        ResultRecord {
            identifier: "r0".to_string(),
            tag: "t0".to_string(),
            versions: versions
                .into_iter()
                .map(|(version, data)| ResultVersion { version, data })
                .collect(),
        }
    }

    #[test]
    fn round_trip_preserves_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r0.json");
        let record = record_with_versions(vec![(0, json!({"a": 1})), (1, json!([1, 2, 3]))]);

        write_document(&path, &record).unwrap();
        let read = read_document(&path).unwrap();
        assert_eq!(read, record);
    }

    #[test]
    fn round_trip_normalizes_version_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r0.json");
        let unordered = record_with_versions(vec![(2, json!(2)), (0, json!(0)), (1, json!(1))]);
        let mut ordered = unordered.clone();
        ordered.normalize();

        write_document(&path, &unordered).unwrap();
        assert_eq!(read_document(&path).unwrap(), ordered);
    }

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(try_read_document(&path).unwrap().is_none());

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn empty_version_list_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r0.json");
        fs::write(&path, br#"{"identifier": "r0", "tag": "", "versions": []}"#).unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, StoreError::Internal { .. }));
    }

    #[test]
    fn malformed_json_is_a_medium_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r0.json");
        fs::write(&path, b"not json").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, StoreError::Medium { .. }));
    }

    #[test]
    fn replace_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r0.json");

        write_document(&path, &record_with_versions(vec![(0, json!(0))])).unwrap();
        write_document(&path, &record_with_versions(vec![(0, json!(0)), (1, json!(1))])).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("r0.json")]);
    }
}
