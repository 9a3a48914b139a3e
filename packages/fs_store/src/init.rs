//! Store construction from a URI.

use attest_store::{Store, StoreError, StoreUri};

use crate::store::FsStore;

/// Construct the store selected by a URI string.
///
/// `file://<absolute-path>` yields the filesystem store rooted at the path.
/// The instance is constructed once at startup and injected into request
/// handlers as a trait object; callers never name a concrete store type.
pub fn initialize_store(uri: &str) -> Result<Box<dyn Store>, StoreError> {
    match StoreUri::parse(uri)? {
        StoreUri::Filesystem(root) => Ok(Box::new(FsStore::new(root)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_uri(path: &std::path::Path) -> String {
        format!("file://{}", path.display())
    }

    #[test]
    fn initialize_filesystem_store_works() {
        let dir = tempfile::tempdir().unwrap();
        let store = initialize_store(&file_uri(dir.path())).unwrap();
        assert!(store.read_model_metadata(None).unwrap().is_empty());
    }

    #[test]
    fn unknown_scheme_is_invalid_argument() {
        let err = initialize_store("mongodb://localhost:27017/").err().unwrap();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
    }

    #[test]
    fn missing_root_is_a_medium_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = initialize_store(&file_uri(&missing)).err().unwrap();
        assert!(matches!(err, StoreError::Medium { .. }));
    }

    #[test]
    fn root_that_is_a_file_is_a_medium_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rootfile");
        std::fs::write(&file, b"").unwrap();
        let err = initialize_store(&file_uri(&file)).err().unwrap();
        assert!(matches!(err, StoreError::Medium { .. }));
    }
}
