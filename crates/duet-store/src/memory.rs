//! In-process [`DocumentStore`] with real push subscriptions.
//!
//! Backs every integration test in the workspace and doubles as an offline
//! development store. One async mutex guards the whole document tree, so
//! `create` is a genuinely atomic check-then-insert.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::debug;

use crate::document::Document;
use crate::error::StoreError;
use crate::query::{Direction, Query};
use crate::store::{DocumentStore, Subscription};
use crate::value::{Fields, Value, resolve_server_timestamps};

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

struct Inner {
    collections: Mutex<Collections>,
    /// Collection paths that changed; watchers re-run their query on match.
    changes: broadcast::Sender<String>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(Collections::new()),
                changes,
            }),
        }
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine; watchers subscribe lazily.
        let _ = self.inner.changes.send(collection.to_owned());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.inner.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        let resolved = resolve_server_timestamps(fields, Utc::now());
        {
            let mut collections = self.inner.collections.lock().await;
            let docs = collections.entry(collection.to_owned()).or_default();
            if docs.contains_key(id) {
                return Err(StoreError::AlreadyExists);
            }
            docs.insert(id.to_owned(), resolved.clone());
        }
        self.notify(collection);
        Ok(Document::new(id, resolved))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let resolved = resolve_server_timestamps(fields, Utc::now());
        {
            let mut collections = self.inner.collections.lock().await;
            collections
                .entry(collection.to_owned())
                .or_default()
                .insert(id.to_owned(), resolved);
        }
        self.notify(collection);
        Ok(())
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let resolved = resolve_server_timestamps(fields, Utc::now());
        {
            let mut collections = self.inner.collections.lock().await;
            let docs = collections.entry(collection.to_owned()).or_default();
            docs.entry(id.to_owned()).or_default().extend(resolved);
        }
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let resolved = resolve_server_timestamps(fields, Utc::now());
        {
            let mut collections = self.inner.collections.lock().await;
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or(StoreError::NotFound)?;
            doc.extend(resolved);
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut collections = self.inner.collections.lock().await;
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if removed {
            self.notify(collection);
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.inner.collections.lock().await;
        Ok(run_query(&collections, query))
    }

    async fn watch(&self, query: &Query) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        // Subscribe before taking the initial snapshot so no change between
        // the two is missed.
        let mut changes = self.inner.changes.subscribe();
        let inner = Arc::clone(&self.inner);
        let query = query.clone();

        tokio::spawn(async move {
            let mut last = {
                let collections = inner.collections.lock().await;
                run_query(&collections, &query)
            };
            if tx.send(last.clone()).await.is_err() {
                return;
            }
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    changed = changes.recv() => {
                        match changed {
                            Ok(path) if path != query.collection => continue,
                            // On overflow, fall through and re-query anyway.
                            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                        let snapshot = {
                            let collections = inner.collections.lock().await;
                            run_query(&collections, &query)
                        };
                        if snapshot != last {
                            last = snapshot.clone();
                            if tx.send(snapshot).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            debug!(collection = %query.collection, "memory store subscription ended");
        });

        Ok(Subscription::new(rx, stop_tx))
    }
}

fn run_query(collections: &Collections, query: &Query) -> Vec<Document> {
    let Some(docs) = collections.get(&query.collection) else {
        return Vec::new();
    };
    let mut matched: Vec<Document> = docs
        .iter()
        .filter(|(_, fields)| {
            query
                .filters
                .iter()
                .all(|f| fields.get(&f.field) == Some(&f.equals))
        })
        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
        .collect();
    if let Some((field, direction)) = &query.order_by {
        matched.sort_by(|a, b| {
            let ord = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => compare_values(x, y),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
    if let Some(limit) = query.limit {
        matched.truncate(limit);
    }
    matched
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
