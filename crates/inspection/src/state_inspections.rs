//! State inspection records and fleet accounts

use crate::collections::{FLEET_ACCOUNTS, STATE_INSPECTIONS};
use crate::{timestamp, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use storage::{Direction, Document, DocumentStore, Fields, Query};
use tracing::{debug, info};

/// Outcome counts over all state inspections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl InspectionStats {
    fn record(&mut self, status: Option<&str>) {
        self.total += 1;
        match status.map(str::to_ascii_lowercase).as_deref() {
            Some("pass" | "passed") => self.passed += 1,
            Some("fail" | "failed") => self.failed += 1,
            _ => {}
        }
    }
}

#[derive(Clone)]
pub struct StateInspectionService {
    store: Arc<dyn DocumentStore>,
}

impl StateInspectionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All inspections, newest first
    pub fn records(&self) -> Result<Vec<Document>, ServiceError> {
        let query = Query::collection(STATE_INSPECTIONS).order_by("createdAt", Direction::Desc);
        Ok(self.store.query(&query)?)
    }

    pub fn record(&self, id: &str) -> Result<Document, ServiceError> {
        self.store
            .get(STATE_INSPECTIONS, id)?
            .ok_or_else(|| ServiceError::NotFound("No such document!".into()))
    }

    pub fn create(&self, mut data: Fields) -> Result<Document, ServiceError> {
        data.insert("createdAt".into(), Value::String(timestamp()));
        let doc = self.store.add(STATE_INSPECTIONS, data)?;
        info!("State inspection {} created", doc.id);
        Ok(doc)
    }

    /// Merge `data` into the record and return the merged record
    pub fn update(&self, id: &str, data: Fields) -> Result<Document, ServiceError> {
        self.store.update(STATE_INSPECTIONS, id, data)?;
        self.record(id)
    }

    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(STATE_INSPECTIONS, id)?;
        debug!("State inspection {} deleted", id);
        Ok(())
    }

    pub fn stats(&self) -> Result<InspectionStats, ServiceError> {
        let docs = self.store.query(&Query::collection(STATE_INSPECTIONS))?;
        let mut stats = InspectionStats::default();
        for doc in &docs {
            stats.record(doc.get_str("status"));
        }
        Ok(stats)
    }

    /// Fleet accounts by name
    pub fn fleet_accounts(&self) -> Result<Vec<Document>, ServiceError> {
        let query = Query::collection(FLEET_ACCOUNTS).order_by("name", Direction::Asc);
        Ok(self.store.query(&query)?)
    }

    pub fn create_fleet_account(&self, mut data: Fields) -> Result<Document, ServiceError> {
        data.insert("createdAt".into(), Value::String(timestamp()));
        let doc = self.store.add(FLEET_ACCOUNTS, data)?;
        info!("Fleet account {} created", doc.id);
        Ok(doc)
    }

    pub fn update_fleet_account(&self, id: &str, data: Fields) -> Result<(), ServiceError> {
        self.store.update(FLEET_ACCOUNTS, id, data)?;
        Ok(())
    }

    pub fn delete_fleet_account(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(FLEET_ACCOUNTS, id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fields;
    use serde_json::json;
    use storage::MemoryStore;

    fn service() -> StateInspectionService {
        StateInspectionService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_create_get_update_delete() {
        let service = service();
        let created = service
            .create(fields(json!({ "plate": "ABC123", "status": "pending" })))
            .unwrap();
        assert!(created.get_str("createdAt").is_some());

        let updated = service
            .update(&created.id, fields(json!({ "status": "passed" })))
            .unwrap();
        assert_eq!(updated.get_str("status"), Some("passed"));
        assert_eq!(updated.get_str("plate"), Some("ABC123"));

        service.delete(&created.id).unwrap();
        match service.record(&created.id) {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "No such document!"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_records_newest_first() {
        let store = MemoryStore::new();
        store.set("state_inspections", "a", fields(json!({ "createdAt": "2024-03-01T00:00:00.000Z" }))).unwrap();
        store.set("state_inspections", "b", fields(json!({ "createdAt": "2024-04-01T00:00:00.000Z" }))).unwrap();
        let service = StateInspectionService::new(Arc::new(store));
        let ids: Vec<_> = service.records().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_stats_counts_outcomes() {
        let service = service();
        for status in ["pass", "Passed", "fail", "FAILED", "pending"] {
            service.create(fields(json!({ "status": status }))).unwrap();
        }
        service.create(Fields::new()).unwrap();
        assert_eq!(
            service.stats().unwrap(),
            InspectionStats { total: 6, passed: 2, failed: 2 }
        );
    }

    #[test]
    fn test_fleet_accounts_sorted_by_name() {
        let service = service();
        let zed = service.create_fleet_account(fields(json!({ "name": "Zed Logistics" }))).unwrap();
        service.create_fleet_account(fields(json!({ "name": "Acme Rentals" }))).unwrap();

        let names: Vec<_> = service
            .fleet_accounts()
            .unwrap()
            .iter()
            .map(|d| d.get_str("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Acme Rentals", "Zed Logistics"]);

        service.update_fleet_account(&zed.id, fields(json!({ "name": "Bravo Fleet" }))).unwrap();
        assert_eq!(service.fleet_accounts().unwrap()[1].get_str("name"), Some("Bravo Fleet"));

        service.delete_fleet_account(&zed.id).unwrap();
        assert_eq!(service.fleet_accounts().unwrap().len(), 1);
    }
}
