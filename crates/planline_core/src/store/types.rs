//! Document, query and write shapes shared by every store implementation.
//!
//! # Invariants
//! - Field names used in filters and ordering are plain identifiers, so they
//!   can be embedded in JSON paths without escaping.
//! - `FieldValue::ServerTimestamp` is resolved by the store at write time;
//!   callers never supply wall-clock values for `createdAt`/`updatedAt`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use super::error::{StoreError, StoreResult};

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid field name regex"));
static COLLECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]{0,63}$").expect("valid collection regex"));

/// Store-assigned document identifier.
pub type DocId = String;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

/// Location of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentPath {
    pub collection: String,
    pub id: DocId,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: impl Into<DocId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_collection(&self.collection)?;
        if self.id.trim().is_empty() || self.id.contains('/') {
            return Err(StoreError::invalid_argument(format!(
                "invalid document id `{}`",
                self.id
            )));
        }
        Ok(())
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document snapshot: id plus resolved fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
}

impl Document {
    /// Returns the fields with `id` injected, ready for typed decoding.
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// Value written to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FieldValue {
    Set(Value),
    /// Replaced by the store clock (epoch milliseconds) when applied.
    ServerTimestamp,
    /// Removes the field on merge/update writes.
    Delete,
}

/// Ordered set of field writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteData {
    fields: BTreeMap<String, FieldValue>,
}

impl WriteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields
            .insert(field.to_string(), FieldValue::Set(value.into()));
        self
    }

    /// Sets the field when `value` is present, otherwise leaves it untouched.
    pub fn set_opt<V: Into<Value>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(field, value),
            None => self,
        }
    }

    pub fn server_timestamp(mut self, field: &str) -> Self {
        self.fields
            .insert(field.to_string(), FieldValue::ServerTimestamp);
        self
    }

    pub fn delete(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string(), FieldValue::Delete);
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        for field in self.fields.keys() {
            validate_field(field)?;
            if field == "id" {
                return Err(StoreError::invalid_argument(
                    "`id` is reserved for the document key",
                ));
            }
        }
        Ok(())
    }

    /// Applies the writes onto `base`, resolving sentinels with `now_ms`.
    pub fn apply_to(&self, base: &mut Fields, now_ms: i64) {
        for (field, value) in &self.fields {
            match value {
                FieldValue::Set(value) => {
                    base.insert(field.clone(), value.clone());
                }
                FieldValue::ServerTimestamp => {
                    base.insert(field.clone(), Value::from(now_ms));
                }
                FieldValue::Delete => {
                    base.remove(field);
                }
            }
        }
    }
}

/// Sort direction for a query ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Equality filter on one scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// Collection query executed by the store.
///
/// Filtering, ordering and limits are evaluated inside the store, never by
/// the caller, so results stay correct once pagination is layered on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_collection(&self.collection)?;
        for filter in &self.filters {
            validate_field(&filter.field)?;
            if matches!(filter.value, Value::Array(_) | Value::Object(_)) {
                return Err(StoreError::invalid_argument(format!(
                    "filter on `{}` must compare a scalar value",
                    filter.field
                )));
            }
        }
        for order in &self.order_by {
            validate_field(&order.field)?;
        }
        Ok(())
    }
}

fn validate_collection(collection: &str) -> StoreResult<()> {
    if COLLECTION_RE.is_match(collection) {
        Ok(())
    } else {
        Err(StoreError::invalid_argument(format!(
            "invalid collection name `{collection}`"
        )))
    }
}

fn validate_field(field: &str) -> StoreResult<()> {
    if FIELD_NAME_RE.is_match(field) {
        Ok(())
    } else {
        Err(StoreError::invalid_argument(format!(
            "invalid field name `{field}`"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_resolves_sentinels_and_deletes() {
        let mut base = json!({ "name": "old", "notes": "drop me" })
            .as_object()
            .cloned()
            .expect("object literal");
        WriteData::new()
            .set("name", "new")
            .server_timestamp("updatedAt")
            .delete("notes")
            .apply_to(&mut base, 42);

        assert_eq!(base.get("name"), Some(&json!("new")));
        assert_eq!(base.get("updatedAt"), Some(&json!(42)));
        assert!(!base.contains_key("notes"));
    }

    #[test]
    fn query_rejects_json_path_injection() {
        let query = Query::collection("projects").order_by("orderIndex') --", Direction::Ascending);
        assert!(query.validate().is_err());

        let ok = Query::collection("taskLogs")
            .where_eq("ownerId", "demo")
            .order_by("createdAt", Direction::Descending);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn write_data_rejects_reserved_id_field() {
        assert!(WriteData::new().set("id", "x").validate().is_err());
    }
}
