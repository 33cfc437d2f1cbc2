//! Cash management: bank deposits, drawer counts and drawer settings

use crate::collections::{BANK_DEPOSITS, DRAWER_COUNTS, DRAWER_SETTINGS};
use crate::{timestamp, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use session::Actor;
use std::sync::Arc;
use storage::{Direction, Document, DocumentStore, Fields, Query};
use tracing::{debug, info};

/// Number of bills or coins of one denomination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenominationCount {
    pub value: f64,
    pub count: u32,
}

/// Sum of value × count over all denominations
pub fn calculate_total_cash(counts: &[DenominationCount]) -> f64 {
    counts.iter().map(|c| c.value * f64::from(c.count)).sum()
}

/// Cash taken in between the start and end drawer totals
pub fn calculate_cash_out(start: f64, end: f64) -> f64 {
    end - start
}

/// Aggregates over deposits and drawer counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashAnalytics {
    pub deposit_count: usize,
    pub total_deposits: f64,
    pub average_deposit: f64,
    pub total_drawer_counts: usize,
    pub total_variance: f64,
}

#[derive(Clone)]
pub struct CashService {
    store: Arc<dyn DocumentStore>,
}

impl CashService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record a deposit on behalf of `actor`
    pub fn submit_deposit(&self, data: Fields, actor: &Actor) -> Result<Document, ServiceError> {
        let doc = self.store.add(BANK_DEPOSITS, stamped(data, actor))?;
        info!("Bank deposit {} submitted by {}", doc.id, actor.user_name);
        Ok(doc)
    }

    /// Deposits, newest first
    pub fn deposits(&self) -> Result<Vec<Document>, ServiceError> {
        let query = Query::collection(BANK_DEPOSITS).order_by("timestamp", Direction::Desc);
        Ok(self.store.query(&query)?)
    }

    pub fn delete_deposit(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(BANK_DEPOSITS, id)?;
        debug!("Bank deposit {} deleted", id);
        Ok(())
    }

    /// Record a drawer count on behalf of `actor`
    pub fn submit_drawer_count(&self, data: Fields, actor: &Actor) -> Result<Document, ServiceError> {
        let doc = self.store.add(DRAWER_COUNTS, stamped(data, actor))?;
        debug!("Drawer count {} submitted", doc.id);
        Ok(doc)
    }

    /// Drawer counts, newest first
    pub fn drawer_counts(&self) -> Result<Vec<Document>, ServiceError> {
        let query = Query::collection(DRAWER_COUNTS).order_by("timestamp", Direction::Desc);
        Ok(self.store.query(&query)?)
    }

    pub fn update_drawer_count(&self, id: &str, data: Fields) -> Result<(), ServiceError> {
        self.store.update(DRAWER_COUNTS, id, data)?;
        Ok(())
    }

    pub fn delete_drawer_count(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(DRAWER_COUNTS, id)?;
        Ok(())
    }

    pub fn drawer_settings(&self) -> Result<Vec<Document>, ServiceError> {
        Ok(self.store.query(&Query::collection(DRAWER_SETTINGS))?)
    }

    pub fn create_drawer_setting(&self, data: Fields) -> Result<Document, ServiceError> {
        Ok(self.store.add(DRAWER_SETTINGS, data)?)
    }

    pub fn update_drawer_setting(&self, id: &str, data: Fields) -> Result<(), ServiceError> {
        self.store.update(DRAWER_SETTINGS, id, data)?;
        Ok(())
    }

    pub fn delete_drawer_setting(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(DRAWER_SETTINGS, id)?;
        Ok(())
    }

    pub fn analytics(&self) -> Result<CashAnalytics, ServiceError> {
        let deposits = self.store.query(&Query::collection(BANK_DEPOSITS))?;
        let counts = self.store.query(&Query::collection(DRAWER_COUNTS))?;

        let total_deposits: f64 = deposits.iter().map(|d| number(d, "amount")).sum();
        let average_deposit = if deposits.is_empty() {
            0.0
        } else {
            total_deposits / deposits.len() as f64
        };

        Ok(CashAnalytics {
            deposit_count: deposits.len(),
            total_deposits,
            average_deposit,
            total_drawer_counts: counts.len(),
            total_variance: counts.iter().map(|d| number(d, "variance")).sum(),
        })
    }
}

/// Add the submission time and the acting user
fn stamped(mut data: Fields, actor: &Actor) -> Fields {
    data.insert("timestamp".into(), Value::String(timestamp()));
    data.insert("userId".into(), Value::String(actor.user_id.clone()));
    data.insert("userName".into(), Value::String(actor.user_name.clone()));
    data
}

/// Numeric field value; numeric strings are accepted, anything else is 0
fn number(doc: &Document, field: &str) -> f64 {
    match doc.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
