//! Live Updates Module
//!
//! Watches the most recent quick checks and fans every change out to
//! subscribers as a [`LiveMessage`]:
//! - `created` / `updated` carry the full record
//! - `deleted` carries only the record id
//! - watch failures are reported as `error` messages
//!
//! Connection state is published on a watch channel so consumers can
//! render it without polling.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use storage::{ChangeKind, Direction, DocumentChange, DocumentStore, Query, StorageError, Watch};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Live update error types
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Watch failed: {0}")]
    Watch(#[from] StorageError),
}

/// What happened to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    Created,
    Updated,
    Deleted,
}

impl From<ChangeKind> for UpdateAction {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Added => UpdateAction::Created,
            ChangeKind::Modified => UpdateAction::Updated,
            ChangeKind::Removed => UpdateAction::Deleted,
        }
    }
}

/// Message delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    QuickCheckUpdate { action: UpdateAction, data: Value },
    Error { data: String },
}

impl From<DocumentChange> for LiveMessage {
    fn from(change: DocumentChange) -> Self {
        let action = UpdateAction::from(change.kind);
        let data = match action {
            UpdateAction::Deleted => json!({ "id": change.document.id }),
            _ => change.document.to_value(),
        };
        LiveMessage::QuickCheckUpdate { action, data }
    }
}

/// Connection state as seen by consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub authenticated: bool,
    pub reconnecting: bool,
}

impl ConnectionStatus {
    const ONLINE: Self = Self {
        connected: true,
        authenticated: true,
        reconnecting: false,
    };
}

/// Live update configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Watched collection
    pub collection: String,
    /// Field the window is ordered by, newest first
    pub order_by: String,
    /// Number of records in the window
    pub window: usize,
    /// Messages buffered per subscriber
    pub channel_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            collection: "quick_checks".to_string(),
            order_by: "created_at".to_string(),
            window: 10,
            channel_capacity: 256,
        }
    }
}

/// Change feed over the newest quick checks
pub struct LiveUpdates {
    store: Arc<dyn DocumentStore>,
    config: LiveConfig,
    messages: broadcast::Sender<LiveMessage>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveUpdates {
    /// Create a disconnected feed; call [`connect`](Self::connect) to start it
    pub fn new(store: Arc<dyn DocumentStore>, config: LiveConfig) -> Self {
        let (messages, _) = broadcast::channel(config.channel_capacity.max(1));
        let (status, _) = watch::channel(ConnectionStatus::default());
        Self {
            store,
            config,
            messages,
            status: Arc::new(status),
            task: Mutex::new(None),
        }
    }

    /// Create and connect with the default window
    pub fn start(store: Arc<dyn DocumentStore>) -> Result<Self, LiveError> {
        let live = Self::new(store, LiveConfig::default());
        live.connect()?;
        Ok(live)
    }

    /// Start forwarding changes. Connecting twice is a no-op.
    pub fn connect(&self) -> Result<(), LiveError> {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Live updates already connected");
            return Ok(());
        }

        let query = Query::collection(self.config.collection.as_str())
            .order_by(self.config.order_by.as_str(), Direction::Desc)
            .limit(self.config.window);
        let feed = Watch::new(self.store.clone(), query)?;

        self.status.send_replace(ConnectionStatus::ONLINE);
        *task = Some(tokio::spawn(forward(
            feed,
            self.messages.clone(),
            self.status.clone(),
        )));
        info!("Live updates connected to {}", self.config.collection);
        Ok(())
    }

    /// Stop forwarding changes
    pub fn disconnect(&self) {
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.abort();
            info!("Live updates disconnected");
        }
        self.status.send_replace(ConnectionStatus::default());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveMessage> {
        self.messages.subscribe()
    }

    /// Number of live receivers, one per open client stream
    pub fn subscribers(&self) -> usize {
        self.messages.receiver_count()
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().connected
    }
}

impl Drop for LiveUpdates {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().ok().and_then(Option::take) {
            task.abort();
        }
    }
}

async fn forward(
    mut feed: Watch,
    messages: broadcast::Sender<LiveMessage>,
    status: Arc<watch::Sender<ConnectionStatus>>,
) {
    while let Some(change) = feed.next().await {
        let message = match change {
            Ok(change) => LiveMessage::from(change),
            Err(e) => {
                error!("Live update listener error: {}", e);
                LiveMessage::Error { data: e.to_string() }
            }
        };
        // No subscribers is not an error
        if messages.send(message).is_err() {
            debug!("Live update dropped, no subscribers");
        }
    }

    warn!("Live update source closed");
    status.send_replace(ConnectionStatus::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use storage::{Document, Fields, MemoryStore};

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    async fn next_message(rx: &mut broadcast::Receiver<LiveMessage>) -> LiveMessage {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("message within timeout")
            .expect("channel open")
    }

    fn live(store: &MemoryStore) -> LiveUpdates {
        LiveUpdates::new(Arc::new(store.clone()), LiveConfig::default())
    }

    #[test]
    fn test_message_wire_format() {
        let created = LiveMessage::from(DocumentChange {
            kind: ChangeKind::Added,
            document: Document::new("q1", fields(json!({ "title": "Check" }))),
        });
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            json!({ "type": "quick_check_update", "action": "created", "data": { "id": "q1", "title": "Check" } })
        );

        let deleted = LiveMessage::from(DocumentChange {
            kind: ChangeKind::Removed,
            document: Document::new("q1", fields(json!({ "title": "Check" }))),
        });
        assert_eq!(
            serde_json::to_value(&deleted).unwrap(),
            json!({ "type": "quick_check_update", "action": "deleted", "data": { "id": "q1" } })
        );

        let error = LiveMessage::Error { data: "boom".into() };
        assert_eq!(serde_json::to_value(&error).unwrap()["type"], "error");
    }

    #[tokio::test]
    async fn test_changes_are_forwarded() {
        let store = MemoryStore::new();
        store
            .set("quick_checks", "q1", fields(json!({ "created_at": "2024-01-01T00:00:00.000Z" })))
            .unwrap();

        let live = live(&store);
        let mut rx = live.subscribe();
        live.connect().unwrap();

        match next_message(&mut rx).await {
            LiveMessage::QuickCheckUpdate { action, data } => {
                assert_eq!(action, UpdateAction::Created);
                assert_eq!(data["id"], "q1");
            }
            other => panic!("unexpected {other:?}"),
        }

        store
            .update("quick_checks", "q1", fields(json!({ "status": "done" })))
            .unwrap();
        match next_message(&mut rx).await {
            LiveMessage::QuickCheckUpdate { action, data } => {
                assert_eq!(action, UpdateAction::Updated);
                assert_eq!(data["status"], "done");
            }
            other => panic!("unexpected {other:?}"),
        }

        store.delete("quick_checks", "q1").unwrap();
        assert_eq!(
            next_message(&mut rx).await,
            LiveMessage::QuickCheckUpdate {
                action: UpdateAction::Deleted,
                data: json!({ "id": "q1" }),
            }
        );
    }

    #[tokio::test]
    async fn test_other_collections_do_not_notify() {
        let store = MemoryStore::new();
        let live = live(&store);
        let mut rx = live.subscribe();
        live.connect().unwrap();

        store.add("bank_deposits", fields(json!({ "amount": 10 }))).unwrap();
        store
            .add("quick_checks", fields(json!({ "created_at": "2024-01-01T00:00:00.000Z" })))
            .unwrap();

        match next_message(&mut rx).await {
            LiveMessage::QuickCheckUpdate { action, .. } => assert_eq!(action, UpdateAction::Created),
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_status_follows_connection() {
        let store = MemoryStore::new();
        let live = live(&store);
        let status = live.status();
        assert_eq!(*status.borrow(), ConnectionStatus::default());

        live.connect().unwrap();
        assert!(live.is_connected());
        assert_eq!(*status.borrow(), ConnectionStatus::ONLINE);

        // Second connect keeps the running listener
        live.connect().unwrap();
        assert!(live.is_connected());

        live.disconnect();
        assert!(!live.is_connected());
        assert!(!status.borrow().authenticated);
    }

    #[tokio::test]
    async fn test_disconnect_stops_forwarding() {
        let store = MemoryStore::new();
        let live = live(&store);
        let mut rx = live.subscribe();
        live.connect().unwrap();
        live.disconnect();
        tokio::task::yield_now().await;

        store
            .add("quick_checks", fields(json!({ "created_at": "2024-01-01T00:00:00.000Z" })))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscribers_counts_open_receivers() {
        let store = MemoryStore::new();
        let live = live(&store);
        assert_eq!(live.subscribers(), 0);

        let first = live.subscribe();
        let second = live.subscribe();
        assert_eq!(live.subscribers(), 2);

        drop(first);
        assert_eq!(live.subscribers(), 1);
        drop(second);
        assert_eq!(live.subscribers(), 0);
    }

    #[tokio::test]
    async fn test_start_connects() {
        let live = LiveUpdates::start(Arc::new(MemoryStore::new())).unwrap();
        assert!(live.is_connected());
    }
}
