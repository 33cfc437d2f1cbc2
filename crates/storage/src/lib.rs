//! Storage Layer
//!
//! Document-store abstraction used by every record service: collections of
//! JSON documents with equality/array-contains filters, ordering, limits
//! and change subscriptions.

mod document;
mod memory;
mod query;
mod watch;

pub use document::{to_fields, Document, Fields};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, Query};
pub use watch::{ChangeKind, DocumentChange, Watch};

use thiserror::Error;
use tokio::sync::broadcast;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

/// Notification that a document in `collection` was written or deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChanged {
    pub collection: String,
    pub id: String,
}

/// Document persistence used by the record services
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a generated id
    fn add(&self, collection: &str, fields: Fields) -> Result<Document, StorageError>;

    /// Create or replace the document `id`
    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StorageError>;

    /// Fetch one document
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError>;

    /// Merge `fields` into an existing document
    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StorageError>;

    /// Remove a document; removing a missing document is not an error
    fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError>;

    /// Run a query
    fn query(&self, query: &Query) -> Result<Vec<Document>, StorageError>;

    /// Names of collections holding at least one document
    fn list_collections(&self) -> Result<Vec<String>, StorageError>;

    /// Receiver of write notifications
    fn changes(&self) -> broadcast::Receiver<CollectionChanged>;
}
