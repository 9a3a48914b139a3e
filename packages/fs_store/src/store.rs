//! The filesystem-backed result store.

use std::fs;
use std::path::{Path, PathBuf};

use attest_store::{ModelMetadata, ResultRecord, ResultVersion, Store, StoreError, StoreUri};

use crate::codec;
use crate::layout::Layout;
use crate::lock::{self, LockRegistry};

/// A result store over a directory hierarchy.
///
/// Composes the layout resolver, the document codec, version allocation,
/// and cascading deletion. A single instance is shared across threads;
/// the read-modify-write sequences take per-result locks and container
/// maintenance takes per-container locks (see `lock`).
pub struct FsStore {
    layout: Layout,
    locks: LockRegistry,
}

impl FsStore {
    /// Open a store rooted at an existing, writable directory.
    pub fn new(root: PathBuf) -> Result<FsStore, StoreError> {
        let attr = fs::metadata(&root).map_err(|e| {
            StoreError::medium(
                format!("store root does not exist: {}", root.display()),
                e,
            )
        })?;
        if !attr.is_dir() {
            return Err(StoreError::medium_inconsistent(format!(
                "store root is not a directory: {}",
                root.display()
            )));
        }
        if attr.permissions().readonly() {
            return Err(StoreError::medium_inconsistent(format!(
                "store root is not writable: {}",
                root.display()
            )));
        }
        let root = root.canonicalize().map_err(|e| {
            StoreError::medium(
                format!("failed to canonicalize store root {}", root.display()),
                e,
            )
        })?;

        Ok(FsStore {
            layout: Layout::new(root),
            locks: LockRegistry::new(),
        })
    }

    /// Open the store addressed by an already-parsed URI.
    pub fn from_uri(uri: &StoreUri) -> Result<FsStore, StoreError> {
        match uri {
            StoreUri::Filesystem(root) => FsStore::new(root.clone()),
        }
    }

    /// The canonicalized root directory.
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// NotFound gate for a (model, model version) pair.
    fn require_version_dir(
        &self,
        model: &str,
        model_version: &str,
    ) -> Result<PathBuf, StoreError> {
        Layout::validate_component(model)?;
        Layout::validate_component(model_version)?;
        let dir = self.layout.version_dir(model, model_version);
        if !dir.is_dir() {
            return Err(StoreError::not_found(format!(
                "no results available for model '{}' version '{}'",
                model, model_version
            )));
        }
        Ok(dir)
    }

    /// NotFound gate for a result document.
    fn require_result_file(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
    ) -> Result<PathBuf, StoreError> {
        Layout::validate_component(result)?;
        let file = self.layout.result_file(model, model_version, result);
        if !file.is_file() {
            return Err(StoreError::not_found(format!(
                "result '{}' not found under model '{}' version '{}'",
                result, model, model_version
            )));
        }
        Ok(file)
    }

    /// Bottom-up cascading deletion: remove the (model, model version)
    /// container if it holds no result documents, then the model container
    /// if it holds nothing at all. Stops at the first non-empty level.
    ///
    /// Emptiness is re-checked under the container lock immediately before
    /// removal, and removal uses `remove_dir`, which the OS refuses on a
    /// non-empty directory. A write that repopulates the container between
    /// the check and the removal therefore wins the tie.
    fn prune_containers(&self, model: &str, model_version: &str) -> Result<(), StoreError> {
        {
            let container = self.locks.acquire(&[model, model_version]);
            let _guard = lock::hold(&container);

            let dir = self.layout.version_dir(model, model_version);
            if !dir.is_dir() || !self.layout.version_dir_is_empty(model, model_version)? {
                return Ok(());
            }
            log::debug!("Removing {}...", dir.display());
            remove_dir_if_possible(&dir)?;
        }
        self.prune_model(model)
    }

    /// Remove the model container if nothing remains beneath it.
    fn prune_model(&self, model: &str) -> Result<(), StoreError> {
        let model_lock = self.locks.acquire(&[model]);
        let _guard = lock::hold(&model_lock);

        let dir = self.layout.model_dir(model);
        if !dir.is_dir() || !directory_is_empty(&dir)? {
            return Ok(());
        }
        log::debug!("Removing {}...", dir.display());
        remove_dir_if_possible(&dir)
    }
}

impl Store for FsStore {
    fn read_model_metadata(&self, model: Option<&str>) -> Result<Vec<ModelMetadata>, StoreError> {
        match model {
            None => self.layout.enumerate_models(),
            Some(model) => {
                Layout::validate_component(model)?;
                if !self.layout.model_dir(model).is_dir() {
                    return Err(StoreError::not_found(format!(
                        "model '{}' not found",
                        model
                    )));
                }
                Ok(vec![ModelMetadata {
                    identifier: model.to_string(),
                    versions: self.layout.list_model_versions(model)?,
                }])
            }
        }
    }

    fn read_result(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
        result_version: Option<u32>,
    ) -> Result<ResultRecord, StoreError> {
        self.require_version_dir(model, model_version)?;
        let file = self.require_result_file(model, model_version, result)?;

        let mut record = codec::read_document(&file)?;
        if let Some(requested) = result_version {
            if record.find_version(requested).is_none() {
                return Err(StoreError::not_found(format!(
                    "version {} of result '{}' not found",
                    requested, result
                )));
            }
            record.versions.retain(|v| v.version == requested);
        }
        Ok(record)
    }

    fn read_results(
        &self,
        model: &str,
        model_version: &str,
        tag: Option<&str>,
    ) -> Result<Vec<ResultRecord>, StoreError> {
        self.require_version_dir(model, model_version)?;

        let mut records = Vec::new();
        for file in self.layout.list_result_files(model, model_version)? {
            // A concurrent delete may have removed the document since
            // enumeration; skip it rather than fail the whole read.
            let Some(record) = codec::try_read_document(&file)? else {
                continue;
            };
            if let Some(tag) = tag {
                if record.tag != tag {
                    continue;
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    fn write_result(
        &self,
        model: &str,
        model_version: &str,
        record: &ResultRecord,
    ) -> Result<usize, StoreError> {
        Layout::validate_component(model)?;
        Layout::validate_component(model_version)?;
        Layout::validate_component(&record.identifier)?;
        if record.versions.len() != 1 {
            return Err(StoreError::invalid_argument(format!(
                "write payload must contain exactly one result version, found {}",
                record.versions.len()
            )));
        }
        let data = &record.versions[0].data;

        let result_lock = self
            .locks
            .acquire(&[model, model_version, &record.identifier]);
        let _result_guard = lock::hold(&result_lock);

        let file = self.layout.result_file(model, model_version, &record.identifier);
        if file.is_file() {
            // The document exists for the whole read-allocate-append-persist
            // sequence, so pruning cannot observe the container empty; the
            // result lock alone suffices.
            let mut stored = codec::read_document(&file)?;
            let next = stored
                .latest_version()
                .ok_or_else(|| {
                    StoreError::internal(format!(
                        "result document {} has no versions after decode",
                        file.display()
                    ))
                })?
                + 1;
            stored.tag = record.tag.clone();
            stored.versions.push(ResultVersion {
                version: next,
                data: data.clone(),
            });
            codec::write_document(&file, &stored)?;
        } else {
            // First write of this result: container creation and the initial
            // document land under the container lock so a concurrent prune
            // cannot remove the directory in between. Creating a directory
            // that already exists is a no-op.
            let container = self.locks.acquire(&[model, model_version]);
            let _container_guard = lock::hold(&container);

            let dir = self.layout.version_dir(model, model_version);
            fs::create_dir_all(&dir).map_err(|e| {
                StoreError::medium(
                    format!("failed to create container {}", dir.display()),
                    e,
                )
            })?;
            let document = ResultRecord {
                identifier: record.identifier.clone(),
                tag: record.tag.clone(),
                versions: vec![ResultVersion {
                    version: 0,
                    data: data.clone(),
                }],
            };
            codec::write_document(&file, &document)?;
        }
        Ok(1)
    }

    fn delete_result_version(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
        result_version: u32,
    ) -> Result<usize, StoreError> {
        self.require_version_dir(model, model_version)?;

        let result_lock = self.locks.acquire(&[model, model_version, result]);
        {
            let _guard = lock::hold(&result_lock);

            let file = self.require_result_file(model, model_version, result)?;
            let mut record = codec::read_document(&file)?;
            if record.find_version(result_version).is_none() {
                return Err(StoreError::not_found(format!(
                    "version {} of result '{}' not found",
                    result_version, result
                )));
            }
            record.versions.retain(|v| v.version != result_version);

            if record.versions.is_empty() {
                log::debug!("Removing {}...", file.display());
                fs::remove_file(&file).map_err(|e| {
                    StoreError::medium(
                        format!("failed to remove result document {}", file.display()),
                        e,
                    )
                })?;
            } else {
                codec::write_document(&file, &record)?;
            }
        }

        self.prune_containers(model, model_version)?;
        Ok(1)
    }

    fn delete_result(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
    ) -> Result<usize, StoreError> {
        self.require_version_dir(model, model_version)?;

        let result_lock = self.locks.acquire(&[model, model_version, result]);
        {
            let _guard = lock::hold(&result_lock);

            let file = self.require_result_file(model, model_version, result)?;
            log::debug!("Removing {}...", file.display());
            fs::remove_file(&file).map_err(|e| {
                StoreError::medium(
                    format!("failed to remove result document {}", file.display()),
                    e,
                )
            })?;
        }

        self.prune_containers(model, model_version)?;
        Ok(1)
    }

    fn delete_results(
        &self,
        model: &str,
        model_version: &str,
        tag: Option<&str>,
    ) -> Result<usize, StoreError> {
        self.require_version_dir(model, model_version)?;

        let mut deleted = 0;
        for file in self.layout.list_result_files(model, model_version)? {
            let Some(identifier) = crate::layout::result_identifier(&file) else {
                continue;
            };

            let result_lock = self.locks.acquire(&[model, model_version, identifier]);
            let _guard = lock::hold(&result_lock);

            // Re-check existence and the tag under the lock: a concurrent
            // write may have retagged the result since enumeration.
            if let Some(tag) = tag {
                let Some(record) = codec::try_read_document(&file)? else {
                    continue;
                };
                if record.tag != tag {
                    continue;
                }
            } else if !file.is_file() {
                continue;
            }

            log::debug!("Removing {}...", file.display());
            fs::remove_file(&file).map_err(|e| {
                StoreError::medium(
                    format!("failed to remove result document {}", file.display()),
                    e,
                )
            })?;
            deleted += 1;
        }

        self.prune_containers(model, model_version)?;
        Ok(deleted)
    }

    fn delete_model_version(&self, model: &str, model_version: &str) -> Result<(), StoreError> {
        let dir = self.require_version_dir(model, model_version)?;

        {
            let container = self.locks.acquire(&[model, model_version]);
            let _guard = lock::hold(&container);

            log::debug!("Removing {}...", dir.display());
            fs::remove_dir_all(&dir).map_err(|e| {
                StoreError::medium(
                    format!("failed to remove container {}", dir.display()),
                    e,
                )
            })?;
        }

        self.prune_model(model)
    }

    fn delete_model(&self, model: &str) -> Result<(), StoreError> {
        Layout::validate_component(model)?;
        let dir = self.layout.model_dir(model);
        if !dir.is_dir() {
            return Err(StoreError::not_found(format!(
                "model '{}' not found",
                model
            )));
        }

        let model_lock = self.locks.acquire(&[model]);
        let _guard = lock::hold(&model_lock);

        log::debug!("Removing {}...", dir.display());
        fs::remove_dir_all(&dir).map_err(|e| {
            StoreError::medium(
                format!("failed to remove container {}", dir.display()),
                e,
            )
        })
    }
}

/// Remove a directory, tolerating the two benign races: a concurrent prune
/// already removed it, or a concurrent write repopulated it.
fn remove_dir_if_possible(dir: &Path) -> Result<(), StoreError> {
    match fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::DirectoryNotEmpty
            ) =>
        {
            Ok(())
        }
        Err(e) => Err(StoreError::medium(
            format!("failed to remove container {}", dir.display()),
            e,
        )),
    }
}

fn directory_is_empty(dir: &Path) -> Result<bool, StoreError> {
    let mut entries = fs::read_dir(dir).map_err(|e| {
        StoreError::medium(format!("failed to list directory {}", dir.display()), e)
    })?;
    Ok(entries.next().is_none())
}
