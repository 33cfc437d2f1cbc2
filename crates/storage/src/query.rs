//! Query model: filters, ordering and limits

use crate::document::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// A document predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value
    Eq { field: String, value: Value },
    /// Field is an array containing value
    ArrayContains { field: String, value: Value },
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => doc.get(field) == Some(value),
            Filter::ArrayContains { field, value } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

/// Query over a single collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    /// All documents of `collection`
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn where_array_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::ArrayContains {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order by `field`; documents without the field are excluded
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `doc` passes the filters (ignores limit)
    pub fn matches(&self, doc: &Document) -> bool {
        let has_order_field = match &self.order {
            Some((field, _)) => doc.get(field).is_some(),
            None => true,
        };
        has_order_field && self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter, sort and truncate documents given in id order
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut results: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some((field, direction)) = &self.order {
            // Stable sort keeps id order among equal keys
            results.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

/// Total order across JSON values: null < bool < number < string < array < object
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Array(x), Value::Array(y)) => x
                .iter()
                .zip(y.iter())
                .map(|(x, y)| compare_values(Some(x), Some(y)))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| x.len().cmp(&y.len())),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        Document::new(id, value.as_object().cloned().unwrap())
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_eq_and_array_contains() {
        let a = doc("a", json!({ "archived": false, "participants": ["u1", "u2"] }));
        assert!(Filter::Eq { field: "archived".into(), value: json!(false) }.matches(&a));
        assert!(!Filter::Eq { field: "archived".into(), value: json!(true) }.matches(&a));
        assert!(Filter::ArrayContains { field: "participants".into(), value: json!("u2") }.matches(&a));
        assert!(!Filter::ArrayContains { field: "participants".into(), value: json!("u3") }.matches(&a));
        assert!(!Filter::ArrayContains { field: "archived".into(), value: json!(false) }.matches(&a));
    }

    #[test]
    fn test_order_desc_and_limit() {
        let docs = vec![
            doc("a", json!({ "created_at": "2024-01-01T00:00:00Z" })),
            doc("b", json!({ "created_at": "2024-03-01T00:00:00Z" })),
            doc("c", json!({ "created_at": "2024-02-01T00:00:00Z" })),
            doc("d", json!({ "title": "no timestamp" })),
        ];
        let query = Query::collection("quick_checks").order_by("created_at", Direction::Desc);
        assert_eq!(ids(&query.apply(docs.clone())), vec!["b", "c", "a"]);

        let query = query.limit(2);
        assert_eq!(ids(&query.apply(docs)), vec!["b", "c"]);
    }

    #[test]
    fn test_numeric_and_mixed_ordering() {
        let docs = vec![
            doc("a", json!({ "n": 10 })),
            doc("b", json!({ "n": 2.5 })),
            doc("c", json!({ "n": "text" })),
            doc("d", json!({ "n": null })),
        ];
        let query = Query::collection("x").order_by("n", Direction::Asc);
        assert_eq!(ids(&query.apply(docs)), vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_unordered_keeps_input_order() {
        let docs = vec![doc("a", json!({ "user": "u1" })), doc("b", json!({ "user": "u2" })), doc("c", json!({ "user": "u1" }))];
        let query = Query::collection("drafts").where_eq("user", "u1");
        assert_eq!(ids(&query.apply(docs)), vec!["a", "c"]);
    }
}
