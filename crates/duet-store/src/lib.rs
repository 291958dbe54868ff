//! The Document Store boundary: a networked, schemaless key-document
//! database supporting create/read/update/delete, equality queries, and
//! push-based change subscriptions.
//!
//! The [`DocumentStore`] trait is the seam the rest of the workspace codes
//! against. [`MemoryStore`] is a push-capable in-process implementation used
//! by tests and offline development; [`FirestoreStore`] talks to the real
//! hosted service through its public REST API.

pub mod document;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod query;
pub mod store;
pub mod value;

pub use document::Document;
pub use error::StoreError;
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, Query};
pub use store::{DocumentStore, Subscription};
pub use value::{Fields, Value};
