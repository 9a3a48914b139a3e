//! Store URIs: scheme-qualified addresses selecting a store implementation
//! and its root location.

use std::path::PathBuf;

use url::Url;

use crate::error::StoreError;

/// A parsed store URI.
///
/// The scheme selects the implementation; the remainder locates its root.
/// New backends (an object store, a document database) add a variant here
/// and a branch in the factory without changing any caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    /// `file://<absolute-path>`: the filesystem store rooted at the path.
    Filesystem(PathBuf),
}

impl StoreUri {
    /// Parse a store URI string.
    ///
    /// An unparsable string or an unrecognized scheme is an
    /// `InvalidArgument` failure.
    pub fn parse(uri: &str) -> Result<StoreUri, StoreError> {
        let parsed = Url::parse(uri).map_err(|e| {
            StoreError::invalid_argument(format!("malformed store URI '{}': {}", uri, e))
        })?;

        match parsed.scheme() {
            "file" => {
                let path = parsed.to_file_path().map_err(|_| {
                    StoreError::invalid_argument(format!(
                        "file store URI does not name a local path: {}",
                        uri
                    ))
                })?;
                Ok(StoreUri::Filesystem(path))
            }
            scheme => Err(StoreError::invalid_argument(format!(
                "unrecognized store URI scheme '{}': {}",
                scheme, uri
            ))),
        }
    }
}
