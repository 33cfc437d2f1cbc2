//! Change subscriptions over a query

use crate::document::Document;
use crate::query::Query;
use crate::{CollectionChanged, DocumentStore, StorageError};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Kind of change to a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One delta of a watched query
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub document: Document,
}

/// Live view of a query.
///
/// Yields `Added` for every document matching at subscription time, then
/// the deltas produced by each later write to the collection.
pub struct Watch {
    store: Arc<dyn DocumentStore>,
    query: Query,
    receiver: broadcast::Receiver<CollectionChanged>,
    snapshot: Vec<Document>,
    pending: VecDeque<DocumentChange>,
}

impl Watch {
    pub fn new(store: Arc<dyn DocumentStore>, query: Query) -> Result<Self, StorageError> {
        // Subscribe first so no write between the snapshot and the
        // subscription goes unseen
        let receiver = store.changes();
        let snapshot = store.query(&query)?;
        let pending = snapshot
            .iter()
            .cloned()
            .map(|document| DocumentChange {
                kind: ChangeKind::Added,
                document,
            })
            .collect();

        debug!("Watching {} ({} initial documents)", query.collection, snapshot.len());
        Ok(Self {
            store,
            query,
            receiver,
            snapshot,
            pending,
        })
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Current query result
    pub fn snapshot(&self) -> &[Document] {
        &self.snapshot
    }

    /// Next change.
    ///
    /// The watch keeps its store alive, so this only returns `None` if the
    /// store closes its change channel itself. [`MemoryStore`](crate::MemoryStore)
    /// never does; its watches run until they are dropped.
    pub async fn next(&mut self) -> Option<Result<DocumentChange, StorageError>> {
        loop {
            if let Some(change) = self.pending.pop_front() {
                return Some(Ok(change));
            }

            match self.receiver.recv().await {
                Ok(changed) if changed.collection != self.query.collection => continue,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Watch on {} lagged by {} changes, resyncing", self.query.collection, skipped);
                }
                Err(RecvError::Closed) => return None,
            }

            if let Err(e) = self.resync() {
                return Some(Err(e));
            }
        }
    }

    /// Re-run the query and queue the differences from the last snapshot
    fn resync(&mut self) -> Result<(), StorageError> {
        let current = self.store.query(&self.query)?;
        let previous: HashMap<&str, &Document> =
            self.snapshot.iter().map(|d| (d.id.as_str(), d)).collect();
        let current_ids: HashMap<&str, ()> = current.iter().map(|d| (d.id.as_str(), ())).collect();

        for doc in &self.snapshot {
            if !current_ids.contains_key(doc.id.as_str()) {
                self.pending.push_back(DocumentChange {
                    kind: ChangeKind::Removed,
                    document: doc.clone(),
                });
            }
        }

        for doc in &current {
            let kind = match previous.get(doc.id.as_str()) {
                None => ChangeKind::Added,
                Some(old) if old.fields != doc.fields => ChangeKind::Modified,
                Some(_) => continue,
            };
            self.pending.push_back(DocumentChange {
                kind,
                document: doc.clone(),
            });
        }

        self.snapshot = current;
        Ok(())
    }
}
