//! Document store access.
//!
//! The backend is a keyed JSON document database addressed by
//! hierarchical paths (`flashcard/<key>`, `users/<uid>`, ...). The
//! [`DocumentStore`] trait captures the contract this layer needs;
//! [`RestStore`] talks to a real backend over HTTP and [`MemoryStore`]
//! is the in-process fake used by tests.

mod key;
mod memory;
mod rest;

pub use key::push_key;
pub use memory::MemoryStore;
pub use rest::RestStore;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur talking to the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// A record could not be serialized to JSON.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A keyed JSON document database addressed by path.
///
/// Writes replace or merge the document at a path; reads are one-shot
/// (no subscriptions). All methods resolve remotely and never block
/// the caller's thread.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync {
    /// Generates a fresh child key for the collection at `path`.
    ///
    /// Key generation is client-side and pure: no store state changes
    /// until the key is actually written to.
    fn generate_key(&self, path: &str) -> String;

    /// Replaces the document at `path`.
    async fn write(&self, path: &str, doc: &Value) -> Result<(), StoreError>;

    /// Merges the given top-level fields into the document at `path`,
    /// leaving other fields untouched.
    async fn update_fields(&self, path: &str, fields: &Value) -> Result<(), StoreError>;

    /// Removes the document at `path` and everything below it.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Reads the document at `path`, or `None` if nothing is there.
    async fn read_once(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Reads all children of the collection at `path`, keyed by child key.
    async fn read_children_once(&self, path: &str)
        -> Result<BTreeMap<String, Value>, StoreError>;

    /// Atomically adds `delta` to the numeric `field` of the document
    /// at `path`, treating a missing field as 0.
    async fn increment_field(&self, path: &str, field: &str, delta: i64)
        -> Result<(), StoreError>;

    /// Creates a record under `path` with a freshly generated key in a
    /// single operation.
    ///
    /// `build` receives the new key so the record can embed it. Because
    /// the key is generated client-side, a failed write leaves no trace
    /// in the store and no key is burned.
    async fn create_with_key<T, F>(&self, path: &str, build: F) -> Result<T, StoreError>
    where
        T: Serialize + Send,
        F: FnOnce(&str) -> T + Send,
    {
        let child_key = self.generate_key(path);
        let record = build(&child_key);
        let doc = serde_json::to_value(&record)?;
        self.write(&format!("{path}/{child_key}"), &doc).await?;
        Ok(record)
    }
}
