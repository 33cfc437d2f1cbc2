//! Label templates

use crate::collections::LABEL_TEMPLATES;
use crate::{timestamp, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use storage::{DocumentStore, Fields, Query};
use tracing::info;

/// A printable label layout. Layout fields other than the ones named here
/// are kept in `layout` as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub layout: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLabelRequest {
    pub name: String,
    #[serde(flatten)]
    pub layout: Fields,
}

#[derive(Clone)]
pub struct LabelService {
    store: Arc<dyn DocumentStore>,
}

impl LabelService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All templates, or only archived / only active ones
    pub fn templates(&self, archived: Option<bool>) -> Result<Vec<LabelTemplate>, ServiceError> {
        let mut query = Query::collection(LABEL_TEMPLATES);
        if let Some(archived) = archived {
            query = query.where_eq("archived", archived);
        }
        self.store
            .query(&query)?
            .iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    pub fn active(&self) -> Result<Vec<LabelTemplate>, ServiceError> {
        self.templates(Some(false))
    }

    pub fn archived(&self) -> Result<Vec<LabelTemplate>, ServiceError> {
        self.templates(Some(true))
    }

    pub fn template(&self, id: &str) -> Result<LabelTemplate, ServiceError> {
        match self.store.get(LABEL_TEMPLATES, id)? {
            Some(doc) => Ok(doc.decode()?),
            None => Err(ServiceError::NotFound("Label template not found".into())),
        }
    }

    /// Create an active template
    pub fn create(&self, request: CreateLabelRequest) -> Result<LabelTemplate, ServiceError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("Template name is required".into()));
        }

        let now = timestamp();
        let mut fields = request.layout;
        for key in ["id", "name", "archived", "createdAt", "updatedAt"] {
            fields.remove(key);
        }
        fields.insert("name".into(), Value::String(name.to_string()));
        fields.insert("archived".into(), Value::Bool(false));
        fields.insert("createdAt".into(), Value::String(now.clone()));
        fields.insert("updatedAt".into(), Value::String(now));

        let doc = self.store.add(LABEL_TEMPLATES, fields)?;
        info!("Label template {} created", doc.id);
        Ok(doc.decode()?)
    }

    /// Merge `changes` into the template and return it
    pub fn update(&self, id: &str, mut changes: Fields) -> Result<LabelTemplate, ServiceError> {
        self.template(id)?;
        changes.remove("id");
        changes.insert("updatedAt".into(), Value::String(timestamp()));
        self.store.update(LABEL_TEMPLATES, id, changes)?;
        self.template(id)
    }

    /// Archive (`true`) or restore (`false`) a template
    pub fn set_archived(&self, id: &str, archived: bool) -> Result<LabelTemplate, ServiceError> {
        let mut changes = Fields::new();
        changes.insert("archived".into(), Value::Bool(archived));
        self.update(id, changes)
    }

    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store.delete(LABEL_TEMPLATES, id)?;
        info!("Label template {} deleted", id);
        Ok(())
    }

    /// Store a copy of an existing template under a new name
    pub fn duplicate(&self, id: &str, name: &str) -> Result<LabelTemplate, ServiceError> {
        let source = self.template(id)?;
        self.create(CreateLabelRequest {
            name: name.to_string(),
            layout: source.layout,
        })
    }
}
