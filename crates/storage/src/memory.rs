//! In-memory document store

use crate::document::{Document, Fields};
use crate::query::Query;
use crate::{CollectionChanged, DocumentStore, StorageError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Capacity of the change notification channel
const CHANGE_CHANNEL_CAPACITY: usize = 256;

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

struct Inner {
    /// Documents keyed by collection path, then by id
    collections: Mutex<Collections>,
    /// Write notifications
    changes: broadcast::Sender<CollectionChanged>,
}

/// Document store kept entirely in memory.
///
/// Cloning is cheap and every clone sees the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory document store");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(BTreeMap::new()),
                changes,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StorageError> {
        self.inner
            .collections
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
    }

    fn notify(&self, collection: &str, id: &str) {
        // No receivers is fine: nobody is watching
        let _ = self.inner.changes.send(CollectionChanged {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    /// Number of documents in `collection`
    pub fn document_count(&self, collection: &str) -> usize {
        self.lock()
            .map(|c| c.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Total number of documents across collections
    pub fn total_documents(&self) -> usize {
        self.lock()
            .map(|c| c.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Remove everything (for testing)
    pub fn clear(&self) {
        if let Ok(mut collections) = self.lock() {
            collections.clear();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn add(&self, collection: &str, fields: Fields) -> Result<Document, StorageError> {
        let id = Uuid::new_v4().simple().to_string();
        {
            let mut collections = self.lock()?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields.clone());
        }
        debug!("Added document {}/{}", collection, id);
        self.notify(collection, &id);
        Ok(Document::new(id, fields))
    }

    fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StorageError> {
        {
            let mut collections = self.lock()?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), fields);
        }
        debug!("Set document {}/{}", collection, id);
        self.notify(collection, id);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StorageError> {
        {
            let mut collections = self.lock()?;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StorageError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            existing.extend(fields);
        }
        debug!("Updated document {}/{}", collection, id);
        self.notify(collection, id);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        let removed = {
            let mut collections = self.lock()?;
            let removed = collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some();
            if collections.get(collection).is_some_and(BTreeMap::is_empty) {
                collections.remove(collection);
            }
            removed
        };
        if removed {
            debug!("Deleted document {}/{}", collection, id);
            self.notify(collection, id);
        }
        Ok(())
    }

    fn query(&self, query: &Query) -> Result<Vec<Document>, StorageError> {
        let collections = self.lock()?;
        let docs = collections
            .get(&query.collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()));
        Ok(query.apply(docs))
    }

    fn list_collections(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn changes(&self) -> broadcast::Receiver<CollectionChanged> {
        self.inner.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Direction;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let store = MemoryStore::new();
        let doc = store
            .add("quick_checks", fields(json!({ "title": "Front brakes" })))
            .unwrap();
        assert_eq!(doc.id.len(), 32);

        let fetched = store.get("quick_checks", &doc.id).unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert!(store.get("quick_checks", "missing").unwrap().is_none());
        assert!(store.get("other", &doc.id).unwrap().is_none());
    }

    #[test]
    fn test_update_merges_and_requires_existing() {
        let store = MemoryStore::new();
        store
            .set("users", "u1", fields(json!({ "name": "Dana", "role": "technician" })))
            .unwrap();
        store.update("users", "u1", fields(json!({ "role": "admin" }))).unwrap();

        let user = store.get("users", "u1").unwrap().unwrap();
        assert_eq!(user.get_str("name"), Some("Dana"));
        assert_eq!(user.get_str("role"), Some("admin"));

        let err = store.update("users", "u2", Fields::new()).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("users", "u1", Fields::new()).unwrap();
        store.delete("users", "u1").unwrap();
        store.delete("users", "u1").unwrap();
        assert_eq!(store.document_count("users"), 0);
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_query_with_filter_and_order() {
        let store = MemoryStore::new();
        for (id, user, updated) in [("d1", "u1", "2024-01-02"), ("d2", "u2", "2024-01-03"), ("d3", "u1", "2024-01-05")] {
            store
                .set("quick_check_drafts", id, fields(json!({ "user": user, "updated_at": updated })))
                .unwrap();
        }

        let query = Query::collection("quick_check_drafts")
            .where_eq("user", "u1")
            .order_by("updated_at", Direction::Desc);
        let ids: Vec<_> = store.query(&query).unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["d3", "d1"]);
        assert_eq!(store.total_documents(), 3);
    }

    #[test]
    fn test_nested_collection_paths_are_independent() {
        let store = MemoryStore::new();
        store.set("conversations", "c1", Fields::new()).unwrap();
        store
            .add("conversations/c1/messages", fields(json!({ "content": "hi" })))
            .unwrap();
        store.delete("conversations", "c1").unwrap();
        assert_eq!(store.document_count("conversations/c1/messages"), 1);
        assert_eq!(store.list_collections().unwrap(), vec!["conversations/c1/messages"]);
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let store = MemoryStore::new();
        let mut changes = store.changes();
        store.set("users", "u1", Fields::new()).unwrap();
        store.delete("users", "missing").unwrap();
        store.delete("users", "u1").unwrap();

        let first = changes.recv().await.unwrap();
        assert_eq!(first, CollectionChanged { collection: "users".into(), id: "u1".into() });
        let second = changes.recv().await.unwrap();
        assert_eq!(second.id, "u1");
        assert!(changes.try_recv().is_err());
    }
}
