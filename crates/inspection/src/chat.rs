//! Conversations and their messages

use crate::collections::{self, CONVERSATIONS};
use crate::{timestamp, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use storage::{to_fields, Direction, DocumentStore, Query};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub read_by: Vec<String>,
}

/// Message as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Conversations `user_id` takes part in
    pub fn conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ServiceError> {
        if user_id.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::collection(CONVERSATIONS).where_array_contains("participants", user_id);
        self.store
            .query(&query)?
            .iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    /// Messages of a conversation, oldest first
    pub fn messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, ServiceError> {
        if conversation_id.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::collection(collections::messages(conversation_id))
            .order_by("timestamp", Direction::Asc);
        self.store
            .query(&query)?
            .iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    pub fn send(&self, conversation_id: &str, message: NewMessage) -> Result<ChatMessage, ServiceError> {
        if conversation_id.is_empty() {
            return Err(ServiceError::InvalidInput("Conversation id is required".into()));
        }
        let mut fields = to_fields(&message)?;
        fields.insert("timestamp".into(), Value::String(timestamp()));
        fields.insert(
            "readBy".into(),
            Value::Array(vec![Value::String(message.sender_id.clone())]),
        );

        let doc = self.store.add(&collections::messages(conversation_id), fields)?;
        debug!("Message {} sent to {}", doc.id, conversation_id);
        Ok(doc.decode()?)
    }

    /// Conversation between exactly `participants`, created if none exists
    pub fn create_conversation(&self, participants: &[String]) -> Result<Conversation, ServiceError> {
        let wanted: BTreeSet<&str> = participants.iter().map(String::as_str).collect();
        let Some(first) = wanted.iter().next() else {
            return Err(ServiceError::InvalidInput("A conversation needs participants".into()));
        };

        let existing = self.conversations(first)?.into_iter().find(|c| {
            c.participants.iter().map(String::as_str).collect::<BTreeSet<_>>() == wanted
        });
        if let Some(conversation) = existing {
            return Ok(conversation);
        }

        let now = timestamp();
        let conversation = Conversation {
            id: String::new(),
            participants: wanted.iter().map(|p| p.to_string()).collect(),
            created_at: now.clone(),
            updated_at: now,
        };
        let mut fields = to_fields(&conversation)?;
        fields.remove("id");

        let doc = self.store.add(CONVERSATIONS, fields)?;
        info!("Conversation {} created", doc.id);
        Ok(Conversation {
            id: doc.id,
            ..conversation
        })
    }

    /// Delete a conversation together with its messages
    pub fn delete_conversation(&self, conversation_id: &str) -> Result<(), ServiceError> {
        let path = collections::messages(conversation_id);
        for message in self.store.query(&Query::collection(path.as_str()))? {
            self.store.delete(&path, &message.id)?;
        }
        self.store.delete(CONVERSATIONS, conversation_id)?;
        info!("Conversation {} deleted", conversation_id);
        Ok(())
    }

    pub fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<(), ServiceError> {
        self.store
            .delete(&collections::messages(conversation_id), message_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::MemoryStore;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn message(sender: &str, content: &str) -> NewMessage {
        NewMessage {
            sender_id: sender.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_empty_ids_yield_nothing() {
        let chat = ChatService::new(Arc::new(MemoryStore::new()));
        assert!(chat.conversations("").unwrap().is_empty());
        assert!(chat.messages("").unwrap().is_empty());
        assert!(chat.send("", message("u1", "hi")).is_err());
        assert!(chat.create_conversation(&[]).is_err());
    }

    #[test]
    fn test_create_conversation_reuses_existing() {
        let chat = ChatService::new(Arc::new(MemoryStore::new()));
        let first = chat.create_conversation(&ids(&["u1", "u2"])).unwrap();
        let again = chat.create_conversation(&ids(&["u2", "u1"])).unwrap();
        assert_eq!(first.id, again.id);

        let group = chat.create_conversation(&ids(&["u1", "u2", "u3"])).unwrap();
        assert_ne!(group.id, first.id);

        assert_eq!(chat.conversations("u1").unwrap().len(), 2);
        assert_eq!(chat.conversations("u3").unwrap().len(), 1);
        assert!(chat.conversations("u4").unwrap().is_empty());
    }

    #[test]
    fn test_messages_in_order() {
        let chat = ChatService::new(Arc::new(MemoryStore::new()));
        let conversation = chat.create_conversation(&ids(&["u1", "u2"])).unwrap();

        let sent = chat.send(&conversation.id, message("u1", "first")).unwrap();
        assert_eq!(sent.read_by, vec!["u1"]);
        std::thread::sleep(std::time::Duration::from_millis(2));
        chat.send(&conversation.id, message("u2", "second")).unwrap();

        let contents: Vec<_> = chat
            .messages(&conversation.id)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "second"]);

        chat.delete_message(&conversation.id, &sent.id).unwrap();
        assert_eq!(chat.messages(&conversation.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_conversation_removes_messages() {
        let store = MemoryStore::new();
        let chat = ChatService::new(Arc::new(store.clone()));
        let conversation = chat.create_conversation(&ids(&["u1", "u2"])).unwrap();
        chat.send(&conversation.id, message("u1", "hello")).unwrap();

        chat.delete_conversation(&conversation.id).unwrap();
        assert!(chat.conversations("u1").unwrap().is_empty());
        assert_eq!(store.total_documents(), 0);
    }
}
