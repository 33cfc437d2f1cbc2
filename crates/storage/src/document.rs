//! Documents and field maps

use crate::StorageError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field map of a stored document
pub type Fields = Map<String, Value>;

/// A stored document: its id plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Field value, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String field value, if present and a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Flat JSON object: `id` followed by the fields (a stored `id` field wins)
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.extend(self.fields.clone());
        Value::Object(object)
    }

    /// Deserialize the flat representation into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StorageError> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Fields::deserialize(deserializer)?;
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            Some(other) => other.to_string(),
            None => return Err(serde::de::Error::missing_field("id")),
        };
        Ok(Self { id, fields })
    }
}

/// Serialize a record into a field map; the record must serialize to an object
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields, StorageError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StorageError::SerializationError(format!(
            "expected an object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flat_representation() {
        let doc = Document::new("abc", fields(json!({ "title": "Oil change", "mileage": 42000 })));
        assert_eq!(
            doc.to_value(),
            json!({ "id": "abc", "title": "Oil change", "mileage": 42000 })
        );
        assert_eq!(doc.get_str("title"), Some("Oil change"));
        assert_eq!(doc.get_str("mileage"), None);
    }

    #[test]
    fn test_roundtrip_through_serde() {
        let doc: Document = serde_json::from_value(json!({ "id": "x1", "role": "admin" })).unwrap();
        assert_eq!(doc.id, "x1");
        assert_eq!(doc.fields.len(), 1);
        assert!(serde_json::from_value::<Document>(json!({ "role": "admin" })).is_err());
    }

    #[test]
    fn test_decode_typed() {
        #[derive(Deserialize)]
        struct Named {
            id: String,
            name: String,
        }
        let doc = Document::new("u1", fields(json!({ "name": "Dana" })));
        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "u1");
        assert_eq!(named.name, "Dana");
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        assert!(to_fields(&json!({ "a": 1 })).is_ok());
        assert!(matches!(
            to_fields(&json!([1, 2])),
            Err(StorageError::SerializationError(_))
        ));
    }
}
