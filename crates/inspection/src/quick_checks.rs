//! Quick-check inspections and their drafts

use crate::collections::{QUICK_CHECKS, QUICK_CHECK_DRAFTS};
use crate::{timestamp, ServiceError};
use serde_json::Value;
use std::sync::Arc;
use storage::{Direction, Document, DocumentStore, Fields, Query};
use tracing::{debug, info};

/// Submitted quick checks and in-progress drafts
#[derive(Clone)]
pub struct QuickCheckService {
    store: Arc<dyn DocumentStore>,
}

impl QuickCheckService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a submitted form, stamped with `created_at`
    pub fn submit(&self, mut data: Fields) -> Result<Document, ServiceError> {
        data.insert("created_at".into(), Value::String(timestamp()));
        let doc = self.store.add(QUICK_CHECKS, data)?;
        info!("Quick check {} submitted", doc.id);
        Ok(doc)
    }

    /// Submitted quick checks, newest first
    pub fn history(&self) -> Result<Vec<Document>, ServiceError> {
        let query = Query::collection(QUICK_CHECKS).order_by("created_at", Direction::Desc);
        Ok(self.store.query(&query)?)
    }

    pub fn get(&self, id: &str) -> Result<Document, ServiceError> {
        self.store
            .get(QUICK_CHECKS, id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Quick check {id} not found")))
    }

    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(QUICK_CHECKS, id)?;
        debug!("Quick check {} deleted", id);
        Ok(())
    }

    pub fn update_status(&self, id: &str, status: &str) -> Result<(), ServiceError> {
        let mut fields = Fields::new();
        fields.insert("status".into(), Value::String(status.to_string()));
        self.store.update(QUICK_CHECKS, id, fields)?;
        Ok(())
    }

    /// Save a new draft and return its id
    pub fn create_draft(&self, title: &str, data: Fields) -> Result<String, ServiceError> {
        let now = timestamp();
        let mut fields = Fields::new();
        fields.insert("title".into(), Value::String(title.to_string()));
        fields.extend(data);
        fields.insert("is_draft".into(), Value::Bool(true));
        fields.insert("created_at".into(), Value::String(now.clone()));
        fields.insert("updated_at".into(), Value::String(now));

        let doc = self.store.add(QUICK_CHECK_DRAFTS, fields)?;
        debug!("Draft {} created", doc.id);
        Ok(doc.id)
    }

    pub fn update_draft(&self, id: &str, title: &str, data: Fields) -> Result<(), ServiceError> {
        let mut fields = Fields::new();
        fields.insert("title".into(), Value::String(title.to_string()));
        fields.extend(data);
        fields.insert("updated_at".into(), Value::String(timestamp()));
        self.store.update(QUICK_CHECK_DRAFTS, id, fields)?;
        Ok(())
    }

    /// Drafts, most recently updated first, optionally for one user
    pub fn drafts(&self, user: Option<&str>) -> Result<Vec<Document>, ServiceError> {
        let mut query = Query::collection(QUICK_CHECK_DRAFTS);
        if let Some(user) = user {
            query = query.where_eq("user", user);
        }
        let query = query.order_by("updated_at", Direction::Desc);
        Ok(self.store.query(&query)?)
    }

    /// Delete drafts (optionally only one user's) and return how many
    pub fn delete_all_drafts(&self, user: Option<&str>) -> Result<usize, ServiceError> {
        let drafts = self.drafts(user)?;
        for draft in &drafts {
            self.store.delete(QUICK_CHECK_DRAFTS, &draft.id)?;
        }
        info!("Deleted {} drafts", drafts.len());
        Ok(drafts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fields;
    use serde_json::json;
    use storage::MemoryStore;

    fn service() -> (QuickCheckService, MemoryStore) {
        let store = MemoryStore::new();
        (QuickCheckService::new(Arc::new(store.clone())), store)
    }

    #[test]
    fn test_submit_stamps_created_at() {
        let (service, _) = service();
        let doc = service
            .submit(fields(json!({ "vin": "1FTFW1ET4CKA5R2K0", "mileage": "42000" })))
            .unwrap();
        assert!(doc.get_str("created_at").unwrap().ends_with('Z'));
        assert_eq!(service.get(&doc.id).unwrap(), doc);
    }

    #[test]
    fn test_history_newest_first() {
        let (service, store) = service();
        store.set("quick_checks", "a", fields(json!({ "created_at": "2024-05-01T10:00:00.000Z" }))).unwrap();
        store.set("quick_checks", "b", fields(json!({ "created_at": "2024-05-03T10:00:00.000Z" }))).unwrap();
        store.set("quick_checks", "c", fields(json!({ "created_at": "2024-05-02T10:00:00.000Z" }))).unwrap();

        let ids: Vec<_> = service.history().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_status_and_delete() {
        let (service, _) = service();
        let doc = service.submit(Fields::new()).unwrap();
        service.update_status(&doc.id, "archived").unwrap();
        assert_eq!(service.get(&doc.id).unwrap().get_str("status"), Some("archived"));

        service.delete(&doc.id).unwrap();
        assert!(matches!(service.get(&doc.id), Err(ServiceError::NotFound(_))));
        assert!(service.update_status(&doc.id, "x").is_err());
    }

    #[test]
    fn test_drafts_lifecycle() {
        let (service, store) = service();
        let id = service
            .create_draft("Morning check", fields(json!({ "user": "u1", "vin": "" })))
            .unwrap();
        let draft = store.get("quick_check_drafts", &id).unwrap().unwrap();
        assert_eq!(draft.get("is_draft"), Some(&json!(true)));
        assert_eq!(draft.get_str("title"), Some("Morning check"));
        assert_eq!(draft.get_str("created_at"), draft.get_str("updated_at"));

        service
            .update_draft(&id, "Renamed", fields(json!({ "vin": "1FTFW1ET4CKA5R2K0" })))
            .unwrap();
        let draft = store.get("quick_check_drafts", &id).unwrap().unwrap();
        assert_eq!(draft.get_str("title"), Some("Renamed"));
        assert_eq!(draft.get_str("user"), Some("u1"));

        service.create_draft("Other", fields(json!({ "user": "u2" }))).unwrap();
        assert_eq!(service.drafts(Some("u1")).unwrap().len(), 1);
        assert_eq!(service.drafts(None).unwrap().len(), 2);

        assert_eq!(service.delete_all_drafts(Some("u2")).unwrap(), 1);
        assert_eq!(service.drafts(None).unwrap().len(), 1);
        assert_eq!(service.delete_all_drafts(None).unwrap(), 1);
    }

    #[test]
    fn test_drafts_order_by_updated_at() {
        let (service, store) = service();
        store.set("quick_check_drafts", "old", fields(json!({ "updated_at": "2024-01-01" }))).unwrap();
        store.set("quick_check_drafts", "new", fields(json!({ "updated_at": "2024-02-01" }))).unwrap();
        let ids: Vec<_> = service.drafts(None).unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
