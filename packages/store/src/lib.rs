//! attest-store: the store contract for versioned model results.
//!
//! This crate defines what a result store is, independent of any medium:
//! - `Store`: the capability contract all backends implement
//! - `ResultRecord` / `ResultVersion` / `ModelMetadata`: the data model
//! - `StoreError`: the typed failure taxonomy
//! - `StoreUri`: scheme-qualified backend selection
//!
//! Concrete backends live in sibling crates (`attest-fs-store` for the
//! filesystem) and are constructed through a URI-based factory; callers
//! hold `Arc<dyn Store>` and never name a concrete type.

mod error;
mod model;
mod traits;
mod uri;

pub use error::StoreError;
pub use model::{ModelMetadata, ResultRecord, ResultVersion};
pub use traits::Store;
pub use uri::StoreUri;
