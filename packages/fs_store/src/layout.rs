//! Physical layout of the filesystem store.
//!
//! The directory hierarchy is three levels deep:
//!
//! ```text
//! root/
//!   <model-identifier>/
//!     <model-version>/
//!       <result-identifier>.json
//! ```
//!
//! Each result is one JSON document. Directory enumeration at each level is
//! the source of truth for what exists; there is no separate index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use attest_store::{ModelMetadata, StoreError};

/// File extension for result documents, including the dot.
const RESULT_SUFFIX: &str = ".json";

/// Resolves (model, model version, result) coordinates to physical paths
/// and enumerates the children present at each hierarchy level.
pub(crate) struct Layout {
    root: PathBuf,
}

impl Layout {
    pub(crate) fn new(root: PathBuf) -> Self {
        Layout { root }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn model_dir(&self, model: &str) -> PathBuf {
        self.root.join(model)
    }

    pub(crate) fn version_dir(&self, model: &str, model_version: &str) -> PathBuf {
        self.root.join(model).join(model_version)
    }

    pub(crate) fn result_file(&self, model: &str, model_version: &str, result: &str) -> PathBuf {
        self.version_dir(model, model_version)
            .join(format!("{}{}", result, RESULT_SUFFIX))
    }

    /// Reject identifiers that cannot serve as a single path component.
    ///
    /// Identifiers are otherwise opaque; this only guards the hierarchy
    /// against traversal outside the root.
    pub(crate) fn validate_component(component: &str) -> Result<(), StoreError> {
        if component.is_empty()
            || component == "."
            || component == ".."
            || component.contains(['/', '\\'])
        {
            return Err(StoreError::invalid_argument(format!(
                "identifier is not a valid path component: '{}'",
                component
            )));
        }
        Ok(())
    }

    /// List the model-version directory names under a model, sorted.
    pub(crate) fn list_model_versions(&self, model: &str) -> Result<Vec<String>, StoreError> {
        let mut versions = list_directories(&self.model_dir(model))?;
        versions.sort();
        Ok(versions)
    }

    /// List the result document paths under a (model, model version) pair.
    pub(crate) fn list_result_files(
        &self,
        model: &str,
        model_version: &str,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.version_dir(model, model_version);
        let entries = fs::read_dir(&dir).map_err(|e| {
            StoreError::medium(format!("failed to list directory {}", dir.display()), e)
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                StoreError::medium(format!("failed to list directory {}", dir.display()), e)
            })?;
            let path = entry.path();
            if path.is_file() && is_result_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Whether a (model, model version) container currently holds any
    /// result documents.
    pub(crate) fn version_dir_is_empty(
        &self,
        model: &str,
        model_version: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.list_result_files(model, model_version)?.is_empty())
    }

    /// Enumerate all models and their versions by walking the root two
    /// levels deep: depth 1 entries are models, depth 2 entries are model
    /// versions.
    pub(crate) fn enumerate_models(&self) -> Result<Vec<ModelMetadata>, StoreError> {
        let mut models: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for entry in walkdir::WalkDir::new(&self.root).min_depth(1).max_depth(2) {
            let entry = entry.map_err(|e| {
                StoreError::medium_inconsistent(format!(
                    "failed to walk store root {}: {}",
                    self.root.display(),
                    e
                ))
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            match entry.depth() {
                1 => {
                    models.entry(name).or_default();
                }
                2 => {
                    let model = entry
                        .path()
                        .parent()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().into_owned())
                        .ok_or_else(|| {
                            StoreError::internal(format!(
                                "model version directory without a parent: {}",
                                entry.path().display()
                            ))
                        })?;
                    models.entry(model).or_default().push(name);
                }
                _ => {}
            }
        }

        Ok(models
            .into_iter()
            .map(|(identifier, mut versions)| {
                versions.sort();
                ModelMetadata {
                    identifier,
                    versions,
                }
            })
            .collect())
    }
}

/// Extract the result identifier from a document path.
pub(crate) fn result_identifier(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()?.strip_suffix(RESULT_SUFFIX)
}

fn is_result_file(path: &Path) -> bool {
    result_identifier(path).is_some()
}

fn list_directories(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        StoreError::medium(format!("failed to list directory {}", dir.display()), e)
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            StoreError::medium(format!("failed to list directory {}", dir.display()), e)
        })?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
