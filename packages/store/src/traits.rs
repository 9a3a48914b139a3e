//! The store capability contract.

use std::sync::Arc;

use crate::error::StoreError;
use crate::model::{ModelMetadata, ResultRecord};

/// The operation set every concrete store supports.
///
/// All operations are synchronous: each call either fully succeeds or fails
/// leaving the store in its prior observable state. Receivers are `&self`
/// because a single store handle is shared across concurrently executing
/// request handlers (the construction site injects an `Arc<dyn Store>`);
/// implementations provide their own internal mutual exclusion.
///
/// # Object Safety
///
/// The trait is object-safe: callers hold `Arc<dyn Store>` or
/// `Box<dyn Store>`, never a concrete type.
pub trait Store: Send + Sync {
    /// Read metadata for one model, or for all models when `model` is
    /// `None`.
    ///
    /// Requesting a specific absent model is `NotFound`; an empty store
    /// with no filter yields an empty list.
    fn read_model_metadata(&self, model: Option<&str>) -> Result<Vec<ModelMetadata>, StoreError>;

    /// Read an individual result.
    ///
    /// With `result_version` given, the returned record's version list is
    /// filtered to exactly that version; with `None`, all versions are
    /// returned. Any absent element of the hierarchy, or a version number
    /// not in the stored set, is `NotFound`.
    fn read_result(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
        result_version: Option<u32>,
    ) -> Result<ResultRecord, StoreError>;

    /// Read all results under a (model, model version) pair, filtered by
    /// exact tag match when `tag` is given.
    ///
    /// `Some("")` filters for untagged results; `None` disables filtering.
    fn read_results(
        &self,
        model: &str,
        model_version: &str,
        tag: Option<&str>,
    ) -> Result<Vec<ResultRecord>, StoreError>;

    /// Write one new version of a result.
    ///
    /// `record` must contain exactly one result version (`InvalidArgument`
    /// otherwise); the engine assigns the stored version number and the
    /// record's tag replaces any previously stored tag. Missing containers
    /// are created on demand. Returns the number of objects written,
    /// always 1 on success.
    fn write_result(
        &self,
        model: &str,
        model_version: &str,
        record: &ResultRecord,
    ) -> Result<usize, StoreError>;

    /// Delete a single version of a result, cascading upward if containers
    /// become empty. Returns the number of versions deleted, always 1 on
    /// success.
    fn delete_result_version(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
        result_version: u32,
    ) -> Result<usize, StoreError>;

    /// Delete a result and all its versions, cascading upward. Returns the
    /// number of results deleted, always 1 on success.
    fn delete_result(
        &self,
        model: &str,
        model_version: &str,
        result: &str,
    ) -> Result<usize, StoreError>;

    /// Delete all results under a (model, model version) pair matching the
    /// optional tag filter, cascading upward. Returns the number of results
    /// deleted.
    fn delete_results(
        &self,
        model: &str,
        model_version: &str,
        tag: Option<&str>,
    ) -> Result<usize, StoreError>;

    /// Delete a model version and everything beneath it.
    fn delete_model_version(&self, model: &str, model_version: &str) -> Result<(), StoreError>;

    /// Delete a model and everything beneath it.
    fn delete_model(&self, model: &str) -> Result<(), StoreError>;
}

// Blanket implementations so the contract composes through references and
// smart pointers.

macro_rules! delegate_store {
    () => {
        fn read_model_metadata(
            &self,
            model: Option<&str>,
        ) -> Result<Vec<ModelMetadata>, StoreError> {
            (**self).read_model_metadata(model)
        }

        fn read_result(
            &self,
            model: &str,
            model_version: &str,
            result: &str,
            result_version: Option<u32>,
        ) -> Result<ResultRecord, StoreError> {
            (**self).read_result(model, model_version, result, result_version)
        }

        fn read_results(
            &self,
            model: &str,
            model_version: &str,
            tag: Option<&str>,
        ) -> Result<Vec<ResultRecord>, StoreError> {
            (**self).read_results(model, model_version, tag)
        }

        fn write_result(
            &self,
            model: &str,
            model_version: &str,
            record: &ResultRecord,
        ) -> Result<usize, StoreError> {
            (**self).write_result(model, model_version, record)
        }

        fn delete_result_version(
            &self,
            model: &str,
            model_version: &str,
            result: &str,
            result_version: u32,
        ) -> Result<usize, StoreError> {
            (**self).delete_result_version(model, model_version, result, result_version)
        }

        fn delete_result(
            &self,
            model: &str,
            model_version: &str,
            result: &str,
        ) -> Result<usize, StoreError> {
            (**self).delete_result(model, model_version, result)
        }

        fn delete_results(
            &self,
            model: &str,
            model_version: &str,
            tag: Option<&str>,
        ) -> Result<usize, StoreError> {
            (**self).delete_results(model, model_version, tag)
        }

        fn delete_model_version(&self, model: &str, model_version: &str) -> Result<(), StoreError> {
            (**self).delete_model_version(model, model_version)
        }

        fn delete_model(&self, model: &str) -> Result<(), StoreError> {
            (**self).delete_model(model)
        }
    };
}

impl<T: Store + ?Sized> Store for &T {
    delegate_store!();
}

impl<T: Store + ?Sized> Store for Box<T> {
    delegate_store!();
}

impl<T: Store + ?Sized> Store for Arc<T> {
    delegate_store!();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A store that answers every operation with NotFound, for exercising
    /// the blanket implementations and object safety.
    struct EmptyStore;

    impl Store for EmptyStore {
        fn read_model_metadata(
            &self,
            model: Option<&str>,
        ) -> Result<Vec<ModelMetadata>, StoreError> {
            match model {
                None => Ok(Vec::new()),
                Some(m) => Err(StoreError::not_found(format!("model '{}' not found", m))),
            }
        }

        fn read_result(
            &self,
            model: &str,
            _model_version: &str,
            _result: &str,
            _result_version: Option<u32>,
        ) -> Result<ResultRecord, StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }

        fn read_results(
            &self,
            model: &str,
            _model_version: &str,
            _tag: Option<&str>,
        ) -> Result<Vec<ResultRecord>, StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }

        fn write_result(
            &self,
            _model: &str,
            _model_version: &str,
            _record: &ResultRecord,
        ) -> Result<usize, StoreError> {
            Ok(1)
        }

        fn delete_result_version(
            &self,
            model: &str,
            _model_version: &str,
            _result: &str,
            _result_version: u32,
        ) -> Result<usize, StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }

        fn delete_result(
            &self,
            model: &str,
            _model_version: &str,
            _result: &str,
        ) -> Result<usize, StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }

        fn delete_results(
            &self,
            model: &str,
            _model_version: &str,
            _tag: Option<&str>,
        ) -> Result<usize, StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }

        fn delete_model_version(
            &self,
            model: &str,
            _model_version: &str,
        ) -> Result<(), StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }

        fn delete_model(&self, model: &str) -> Result<(), StoreError> {
            Err(StoreError::not_found(format!("model '{}' not found", model)))
        }
    }

    #[test]
    fn object_safety_works() {
        let boxed: Box<dyn Store> = Box::new(EmptyStore);
        assert!(boxed.read_model_metadata(None).unwrap().is_empty());
        assert!(boxed.read_model_metadata(Some("m0")).is_err());
    }

    #[test]
    fn arc_blanket_impl_works() {
        let shared: Arc<dyn Store> = Arc::new(EmptyStore);
        assert_eq!(shared.write_result("m0", "v0", &record()).unwrap(), 1);
    }

    #[test]
    fn ref_blanket_impl_works() {
        let store = EmptyStore;
        let by_ref: &dyn Store = &store;
        assert!(by_ref.read_result("m0", "v0", "r0", None).is_err());
    }

    fn record() -> ResultRecord {
        ResultRecord::new("r0", serde_json::json!({}))
    }
}
