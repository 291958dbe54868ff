#![allow(async_fn_in_trait)]

//! The store trait and the push-subscription handle.

use tokio::sync::{mpsc, oneshot};

use crate::document::Document;
use crate::error::StoreError;
use crate::query::Query;
use crate::value::Fields;

/// Boundary to the external key-document database.
///
/// All operations are non-blocking async calls that suspend until the
/// round-trip completes. `create` is the atomic "create if absent"
/// primitive; callers that need race-safe existence arbitration rely on its
/// [`StoreError::AlreadyExists`] rejection rather than a separate read.
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by key. `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create a document if and only if the key is free. Returns the stored
    /// document with server timestamps resolved.
    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError>;

    /// Overwrite (or create) the document unconditionally.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merge the given fields into the document, creating it when missing.
    /// Fields not named are left untouched.
    async fn set_merge(&self, collection: &str, id: &str, fields: Fields)
    -> Result<(), StoreError>;

    /// Update fields of an existing document; [`StoreError::NotFound`] when
    /// it does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Delete by key. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Run an equality-filtered snapshot query.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Subscribe to a query: the current matching snapshot is delivered
    /// immediately, then again after every change to the collection.
    async fn watch(&self, query: &Query) -> Result<Subscription, StoreError>;
}

/// Handle to a live query subscription.
///
/// Snapshots arrive through [`Subscription::next`]. Teardown is explicit via
/// [`Subscription::stop`] (dropping the handle tears down too); there is no
/// automatic timeout.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Vec<Document>>,
    // Dropping the sender wakes the listener task's stop branch.
    _stop: oneshot::Sender<()>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<Vec<Document>>, stop: oneshot::Sender<()>) -> Self {
        Self { rx, _stop: stop }
    }

    /// Wait for the next snapshot. `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }

    /// Tear the subscription down, cancelling the underlying listener.
    pub fn stop(self) {
        drop(self);
    }
}
