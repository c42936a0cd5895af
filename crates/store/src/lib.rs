//! Brightfold Store - Document store adapter.
//!
//! The remote source of truth for every Brightfold aggregate is a
//! hierarchical, path-addressable document database supporting point writes,
//! ordered queries, and change subscriptions. This crate defines that
//! contract as the [`DocumentStore`] trait and provides [`MemoryStore`], a
//! complete in-memory implementation used by tests and local tooling.
//!
//! The store handle is always constructed explicitly and passed into
//! repositories - never reached through a module-level singleton - so every
//! consumer can be exercised against [`MemoryStore`].
//!
//! # Modules
//!
//! - [`path`] - Document and collection paths
//! - [`query`] - Ordered collection queries with limits
//! - [`subscription`] - Watch handles and snapshot events
//! - [`memory`] - In-memory store implementation
//! - [`value`] - JSON value helpers (deep merge, field lookup)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod memory;
pub mod path;
pub mod query;
pub mod subscription;
pub mod value;

use serde_json::Value;

pub use memory::MemoryStore;
pub use path::{CollectionPath, DocPath, PathError};
pub use query::{Direction, OrderBy, Query};
pub use subscription::{
    CollectionEvent, CollectionWatch, DocEvent, DocWatch, WatchHandle, WatchTarget,
};

/// A document that exists in the store: its path plus its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub value: Value,
}

/// How a [`DocumentStore::set`] write treats fields absent from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace the whole document with the payload.
    #[default]
    Replace,
    /// Deep-merge the payload into the existing document, leaving unrelated
    /// fields untouched.
    Merge,
}

/// Errors returned by document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A path was structurally invalid.
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// A document payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store rejected or failed the operation.
    ///
    /// Recoverable: callers surface it and keep their session alive.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A hierarchical, path-addressable document database.
///
/// The operation set mirrors what the Brightfold dashboard actually uses:
/// point reads, writes with merge semantics, an atomic single-document
/// update, deletes, ordered queries with a limit, and change subscriptions
/// that push every remote change (including the initial state) to the
/// subscriber.
///
/// Writes to a single document are atomic; nothing here coordinates writes
/// across documents. Cross-aggregate sequences (checkout: create order, then
/// clear cart) are ordered by the caller and are not transactional.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync + 'static {
    /// Read a document. `Ok(None)` means the document does not exist, which
    /// is not a fault - absent aggregates read as "not yet created".
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    /// Write a document, replacing or deep-merging per `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn set(&self, path: &DocPath, value: Value, mode: WriteMode) -> Result<(), StoreError>;

    /// Atomically read-modify-write a single document.
    ///
    /// The closure receives the current value (or `None`) and returns the
    /// next value; returning `None` deletes the document. No other write to
    /// the same document can interleave. Returns the value that was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn update<F>(&self, path: &DocPath, f: F) -> Result<Option<Value>, StoreError>
    where
        F: FnOnce(Option<Value>) -> Option<Value> + Send;

    /// Delete a document. Deleting an absent document is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// Run an ordered query over the direct documents of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store fails.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Subscribe to a single document.
    ///
    /// The current state (or `None` for an absent document) is delivered
    /// immediately, then every subsequent change, in store-observed order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the subscription cannot be
    /// established.
    fn watch_doc(&self, path: &DocPath) -> Result<DocWatch, StoreError>;

    /// Subscribe to the direct documents of a collection.
    ///
    /// Semantics match [`DocumentStore::watch_doc`]: initial snapshot first,
    /// then every change to any document in the collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the subscription cannot be
    /// established.
    fn watch_collection(&self, path: &CollectionPath) -> Result<CollectionWatch, StoreError>;
}
