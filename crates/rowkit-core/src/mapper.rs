//! Translation between human field names and wire field keys.
//!
//! Rows travel over the wire keyed by `field_<id>`. Callers work with the
//! display names from the table schema. [`FieldMapper`] holds both lookup
//! directions for one table and rewrites record keys accordingly.
//!
//! Keys the schema does not know about (`id`, `order`, anything a caller
//! adds) always pass through untouched.
//!
//! The API allows two fields to share a display name. When that happens the
//! field defined last in the schema owns the name: `resolve_field` and
//! `to_identifier_keys` route the name to that field, and `to_names` keeps
//! that field's value when several wire keys collapse onto the same name.

use std::collections::HashMap;

use crate::schema::{FIELD_KEY_PREFIX, FieldSchemaEntry, Record};

/// Bidirectional field name / wire key lookup for one table.
#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    name_to_key: HashMap<String, String>,
    key_to_name: HashMap<String, String>,
    raw_fields: bool,
}

impl FieldMapper {
    /// Build the mappings from a table schema.
    pub fn build(entries: &[FieldSchemaEntry]) -> Self {
        let mut name_to_key = HashMap::with_capacity(entries.len());
        let mut key_to_name = HashMap::with_capacity(entries.len());

        for entry in entries {
            let key = entry.id.key();
            // Later entries overwrite earlier ones sharing the same name.
            name_to_key.insert(entry.name.clone(), key.clone());
            key_to_name.insert(key, entry.name.clone());
        }

        Self {
            name_to_key,
            key_to_name,
            raw_fields: false,
        }
    }

    /// A mapper in "do not map" mode: every key and field reference is
    /// assumed to already be in wire format.
    pub fn raw() -> Self {
        Self {
            raw_fields: true,
            ..Self::default()
        }
    }

    /// Returns true in "do not map" mode.
    pub fn is_raw(&self) -> bool {
        self.raw_fields
    }

    /// Number of known fields.
    pub fn len(&self) -> usize {
        self.key_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_name.is_empty()
    }

    /// Wire key for a field name, if the schema knows it.
    pub fn key_for(&self, name: &str) -> Option<&str> {
        self.name_to_key.get(name).map(String::as_str)
    }

    /// Field name for a wire key, if the schema knows it.
    pub fn name_for(&self, key: &str) -> Option<&str> {
        self.key_to_name.get(key).map(String::as_str)
    }

    /// Rename every known field name in `record` to its wire key.
    pub fn to_identifier_keys(&self, record: &Record) -> Record {
        if self.raw_fields {
            return record.clone();
        }

        let mut out = Record::new();
        for (key, value) in record {
            let target = self.name_to_key.get(key).unwrap_or(key);
            out.insert(target.clone(), value.clone());
        }
        out
    }

    /// Rename every known wire key in `record` to its field name.
    pub fn to_names(&self, record: &Record) -> Record {
        if self.raw_fields {
            return record.clone();
        }

        let mut out = Record::new();
        for (key, value) in record {
            match self.key_to_name.get(key) {
                Some(name) => {
                    let owns_name = self.name_to_key.get(name) == Some(key);
                    if owns_name || !out.contains_key(name) {
                        out.insert(name.clone(), value.clone());
                    }
                }
                None => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        out
    }

    /// Resolve a field reference for use in a filter or sort parameter.
    ///
    /// Known names resolve to their wire key. A bare numeric id that is not
    /// itself a known name becomes `field_<id>`. Anything else is returned
    /// unchanged. Never fails.
    pub fn resolve_field(&self, field: &str) -> String {
        if self.raw_fields {
            return field.to_string();
        }

        if let Some(key) = self.name_to_key.get(field) {
            return key.clone();
        }

        if !field.is_empty() && field.chars().all(|c| c.is_ascii_digit()) {
            return format!("{}{}", FIELD_KEY_PREFIX, field);
        }

        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn schema() -> Vec<FieldSchemaEntry> {
        vec![
            FieldSchemaEntry::new("1", "Name"),
            FieldSchemaEntry::new("2", "Email"),
            FieldSchemaEntry::new("3", "Active"),
        ]
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn keys(record: &Record) -> BTreeSet<String> {
        record.keys().cloned().collect()
    }

    #[test]
    fn renames_names_to_keys() {
        let mapper = FieldMapper::build(&schema());
        let out = mapper.to_identifier_keys(&record(json!({
            "Name": "Ada",
            "Email": "ada@example.com"
        })));
        assert_eq!(out["field_1"], json!("Ada"));
        assert_eq!(out["field_2"], json!("ada@example.com"));
        assert!(!out.contains_key("Name"));
    }

    #[test]
    fn renames_keys_to_names() {
        let mapper = FieldMapper::build(&schema());
        let out = mapper.to_names(&record(json!({
            "id": 7,
            "order": "1.00000000000000000000",
            "field_1": "Ada",
            "field_3": true
        })));
        assert_eq!(out["Name"], json!("Ada"));
        assert_eq!(out["Active"], json!(true));
        assert_eq!(out["id"], json!(7));
    }

    #[test]
    fn round_trip_is_stable() {
        let mapper = FieldMapper::build(&schema());
        let input = record(json!({"Name": "Ada", "Email": "a@b.c", "Active": false}));
        let once = mapper.to_identifier_keys(&input);
        let again = mapper.to_identifier_keys(&mapper.to_names(&once));
        assert_eq!(keys(&once), keys(&again));
        assert_eq!(once, again);
    }

    #[test]
    fn unknown_keys_pass_through_both_ways() {
        let mapper = FieldMapper::build(&schema());
        let input = record(json!({"Name": "Ada", "id": 3, "field_99": "x", "Notes": [1, 2]}));

        let wire = mapper.to_identifier_keys(&input);
        let names = mapper.to_names(&wire);
        for out in [&wire, &names] {
            assert_eq!(out["id"], json!(3));
            assert_eq!(out["field_99"], json!("x"));
            assert_eq!(out["Notes"], json!([1, 2]));
        }
    }

    #[test]
    fn input_record_is_not_mutated() {
        let mapper = FieldMapper::build(&schema());
        let input = record(json!({"Name": "Ada"}));
        let _ = mapper.to_identifier_keys(&input);
        assert!(input.contains_key("Name"));
    }

    #[test]
    fn duplicate_names_resolve_to_last_entry() {
        let mapper = FieldMapper::build(&[
            FieldSchemaEntry::new("5", "Status"),
            FieldSchemaEntry::new("9", "Status"),
        ]);
        assert_eq!(mapper.resolve_field("Status"), "field_9");
        assert_eq!(mapper.name_for("field_5"), Some("Status"));
        assert_eq!(mapper.name_for("field_9"), Some("Status"));

        let out = mapper.to_names(&record(json!({"field_5": "old", "field_9": "new"})));
        assert_eq!(out.len(), 1);
        assert_eq!(out["Status"], json!("new"));
    }

    #[test]
    fn duplicate_name_precedence_ignores_key_order() {
        // field_10 sorts before field_2 but was defined first.
        let mapper = FieldMapper::build(&[
            FieldSchemaEntry::new("10", "Status"),
            FieldSchemaEntry::new("2", "Status"),
        ]);
        let out = mapper.to_names(&record(json!({"field_10": "first", "field_2": "last"})));
        assert_eq!(out["Status"], json!("last"));
    }

    #[test]
    fn resolve_field_fallbacks() {
        let mapper = FieldMapper::build(&schema());
        assert_eq!(mapper.resolve_field("Email"), "field_2");
        assert_eq!(mapper.resolve_field("12"), "field_12");
        assert_eq!(mapper.resolve_field("field_7"), "field_7");
        assert_eq!(mapper.resolve_field("Unknown"), "Unknown");
    }

    #[test]
    fn raw_mode_leaves_everything_alone() {
        let mapper = FieldMapper::raw();
        assert!(mapper.is_raw());
        assert_eq!(mapper.resolve_field("Email"), "Email");
        assert_eq!(mapper.resolve_field("12"), "12");
        let input = record(json!({"field_1": "Ada"}));
        assert_eq!(mapper.to_names(&input), input);
    }
}
