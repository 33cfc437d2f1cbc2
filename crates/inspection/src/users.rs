//! User administration over the `users` collection

use crate::collections::USERS;
use crate::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use session::UserProfile;
use std::sync::Arc;
use storage::{DocumentStore, Fields, Query};
use tracing::{debug, info};

/// A user profile together with its document id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Result<Vec<UserRecord>, ServiceError> {
        let docs = self.store.query(&Query::collection(USERS))?;
        docs.iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    /// Users available as chat participants
    pub fn chat_users(&self) -> Result<Vec<UserRecord>, ServiceError> {
        self.list()
    }

    /// Remove the profile document; the identity itself is untouched
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(USERS, id)?;
        info!("User {} deleted", id);
        Ok(())
    }

    pub fn enable(&self, id: &str) -> Result<(), ServiceError> {
        self.set_field(id, "disabled", Value::Bool(false))
    }

    pub fn disable(&self, id: &str) -> Result<(), ServiceError> {
        self.set_field(id, "disabled", Value::Bool(true))
    }

    pub fn update_role(&self, id: &str, role: &str) -> Result<(), ServiceError> {
        self.set_field(id, "role", Value::String(role.to_string()))
    }

    /// Merge `updates` into the profile of `user_id`. Identity keys in the
    /// update are ignored.
    pub fn update_profile(&self, user_id: &str, mut updates: Fields) -> Result<(), ServiceError> {
        if user_id.is_empty() {
            return Err(ServiceError::InvalidInput("No user ID available".into()));
        }
        updates.remove("id");
        updates.remove("userId");
        self.store.update(USERS, user_id, updates)?;
        debug!("Profile {} updated", user_id);
        Ok(())
    }

    /// Stored profile, `None` when the user has none
    pub fn profile(&self, id: &str) -> Result<Option<UserProfile>, ServiceError> {
        if id.is_empty() {
            return Err(ServiceError::InvalidInput("No user ID available".into()));
        }
        match self.store.get(USERS, id)? {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc.fields))?)),
            None => Ok(None),
        }
    }

    /// First user whose PIN matches
    pub fn lookup_by_pin(&self, pin: &str) -> Result<Option<UserRecord>, ServiceError> {
        let query = Query::collection(USERS).where_eq("pin", pin).limit(1);
        match self.store.query(&query)?.first() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    fn set_field(&self, id: &str, field: &str, value: Value) -> Result<(), ServiceError> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), value);
        self.store.update(USERS, id, fields)?;
        debug!("User {} {} updated", id, field);
        Ok(())
    }
}
