//! Inspection Record Services
//!
//! Typed operations over the document store for every record kind the
//! shop application keeps: users, quick checks and drafts, state
//! inspections and fleet accounts, cash management, label templates,
//! chat, and a generic table browser.

mod cash;
mod chat;
mod labels;
mod quick_checks;
mod state_inspections;
mod tables;
mod users;

pub use cash::{calculate_cash_out, calculate_total_cash, CashAnalytics, CashService, DenominationCount};
pub use chat::{ChatMessage, ChatService, Conversation, NewMessage};
pub use labels::{CreateLabelRequest, LabelService, LabelTemplate};
pub use quick_checks::QuickCheckService;
pub use state_inspections::{InspectionStats, StateInspectionService};
pub use tables::{ColumnInfo, TableBrowser, TableData, TableInfo, TableSchema, KNOWN_COLLECTIONS};
pub use users::{UserRecord, UserService};

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use storage::{DocumentStore, StorageError};
use thiserror::Error;

/// Collection names
pub mod collections {
    pub const USERS: &str = "users";
    pub const QUICK_CHECKS: &str = "quick_checks";
    pub const QUICK_CHECK_DRAFTS: &str = "quick_check_drafts";
    pub const STATE_INSPECTIONS: &str = "state_inspections";
    pub const FLEET_ACCOUNTS: &str = "fleet_accounts";
    pub const BANK_DEPOSITS: &str = "bank_deposits";
    pub const DRAWER_COUNTS: &str = "drawer_counts";
    pub const DRAWER_SETTINGS: &str = "drawer_settings";
    pub const LABEL_TEMPLATES: &str = "label_templates";
    pub const CONVERSATIONS: &str = "conversations";

    /// Messages of one conversation
    pub fn messages(conversation_id: &str) -> String {
        format!("{CONVERSATIONS}/{conversation_id}/messages")
    }
}

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Current time as an RFC 3339 UTC string with milliseconds
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// All record services over one store
#[derive(Clone)]
pub struct InspectionServices {
    pub users: UserService,
    pub quick_checks: QuickCheckService,
    pub state_inspections: StateInspectionService,
    pub cash: CashService,
    pub labels: LabelService,
    pub chat: ChatService,
    pub tables: TableBrowser,
}

impl InspectionServices {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: UserService::new(store.clone()),
            quick_checks: QuickCheckService::new(store.clone()),
            state_inspections: StateInspectionService::new(store.clone()),
            cash: CashService::new(store.clone()),
            labels: LabelService::new(store.clone()),
            chat: ChatService::new(store.clone()),
            tables: TableBrowser::new(store),
        }
    }
}
