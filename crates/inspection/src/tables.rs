//! Generic table browser over the known collections

use crate::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use storage::{DocumentStore, Query};

/// Collections offered by the browser
pub const KNOWN_COLLECTIONS: [&str; 5] = [
    "users",
    "quick_checks",
    "state_inspections",
    "bank_deposits",
    "label_templates",
];

const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub not_null: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
    pub date_columns: Vec<String>,
    pub searchable_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Clone)]
pub struct TableBrowser {
    store: Arc<dyn DocumentStore>,
}

impl TableBrowser {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn tables(&self) -> Vec<TableInfo> {
        KNOWN_COLLECTIONS
            .iter()
            .map(|name| TableInfo {
                name: name.to_string(),
            })
            .collect()
    }

    /// Documents have no fixed shape: every table is an id plus its data
    pub fn schema(&self, _table: &str) -> TableSchema {
        let column = |name: &str, kind: &str, primary: bool| ColumnInfo {
            name: name.to_string(),
            kind: kind.to_string(),
            not_null: primary,
            primary_key: primary,
        };
        TableSchema {
            columns: vec![column("id", "string", true), column("data", "json", false)],
            date_columns: vec!["created_at".to_string(), "timestamp".to_string()],
            searchable_columns: vec!["id".to_string()],
        }
    }

    /// First page of a collection. Columns are `id` followed by every other
    /// key in order of first appearance.
    pub fn data(&self, table: &str) -> Result<TableData, ServiceError> {
        if table.is_empty() {
            return Err(ServiceError::InvalidInput("Table name is required".into()));
        }
        let docs = self.store.query(&Query::collection(table).limit(PAGE_SIZE))?;

        let mut columns = vec!["id".to_string()];
        for doc in &docs {
            for key in doc.fields.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows: Vec<Value> = docs.iter().map(|doc| doc.to_value()).collect();
        Ok(TableData {
            columns,
            total: rows.len(),
            rows,
            page: 1,
            total_pages: 1,
            has_next: false,
            has_prev: false,
        })
    }
}
