//! Table schema and row record types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, ValidationError};

/// Prefix the API puts in front of a field id to form its wire key.
pub const FIELD_KEY_PREFIX: &str = "field_";

/// One row, keyed either by field names or by wire keys.
pub type Record = Map<String, Value>;

/// Opaque field identifier from a table schema.
///
/// The API sends integers, but the value is never interpreted, only
/// formatted into a wire key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the wire key for this field, e.g. `field_42`.
    pub fn key(&self) -> String {
        format!("{}{}", FIELD_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FieldId> for String {
    fn from(id: FieldId) -> Self {
        id.0
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => FieldId(n.to_string()),
            Raw::Text(s) => FieldId(s),
        })
    }
}

/// One column of a table as reported by the schema endpoint.
///
/// The endpoint returns many more properties (type, order, primary...);
/// only the id and display name matter for key translation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchemaEntry {
    pub id: FieldId,
    pub name: String,
}

impl FieldSchemaEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: FieldId::new(id),
            name: name.into(),
        }
    }
}

/// Interpret a JSON value as a record.
pub fn record_from_value(value: Value) -> Result<Record, Error> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Record::new()),
        other => Err(ValidationError::InvalidRecord {
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }
        .into()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_entry_ignores_extra_properties() {
        let entry: FieldSchemaEntry = serde_json::from_value(json!({
            "id": 42,
            "name": "Name",
            "type": "text",
            "primary": true,
            "order": 0
        }))
        .unwrap();
        assert_eq!(entry.id.key(), "field_42");
        assert_eq!(entry.name, "Name");
    }

    #[test]
    fn field_id_accepts_strings() {
        let id: FieldId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(id.key(), "field_abc");
    }

    #[test]
    fn record_from_non_object_fails() {
        assert!(record_from_value(json!([1, 2])).is_err());
        assert!(record_from_value(json!(null)).unwrap().is_empty());
    }
}
