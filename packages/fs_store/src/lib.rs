//! attest-fs-store: the filesystem implementation of the attest store
//! contract.
//!
//! Results live in a three-level directory hierarchy
//! (`root/<model>/<model-version>/<result>.json`), one JSON document per
//! result. Directory enumeration is the source of truth for what exists,
//! version numbers are allocated monotonically per result, and deletions
//! cascade upward so an empty container never outlives its contents.

mod codec;
mod layout;
mod lock;
mod store;

pub mod init;

pub use init::initialize_store;
pub use store::FsStore;

// Re-export the contract so depending on this crate alone is enough.
pub use attest_store::{ModelMetadata, ResultRecord, ResultVersion, Store, StoreError, StoreUri};
