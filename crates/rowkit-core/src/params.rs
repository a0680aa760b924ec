//! Per-item parameters supplied by the host.
//!
//! Hosts hand over loosely typed parameter bags ([`RawItemParams`]). They
//! are validated into the closed [`ItemParams`] shape at the dispatcher's
//! per-item boundary, so one malformed item fails on its own.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::error::{Error, ValidationError};
use crate::mapper::FieldMapper;
use crate::query::{Filter, FilterType, RowQuery, SortField};
use crate::schema::{FIELD_KEY_PREFIX, Record};
use crate::types::{RowId, TableId};

/// Page size used when a bounded listing does not name one.
pub const DEFAULT_LIMIT: u32 = 50;

/// Parameter bag for one input item, as the host supplies it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItemParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<Value>,
    /// `autoMapInputData` (default) or `defineBelow`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_to_send: Option<String>,
    /// Comma-separated string or array of input keys to leave out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_to_ignore: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_values: Option<Vec<RawFieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_all: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
    /// Array of `{field, operator, value}` objects or `field:operator:value` strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    /// Array of `{field, direction}` objects or `field:asc|desc` strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Skip name/key translation entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_fields: Option<bool>,
}

/// One explicit `{fieldId, fieldValue}` pair from the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFieldValue {
    pub field_id: Value,
    #[serde(default)]
    pub field_value: Value,
}

/// How many rows a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    /// Drain every page.
    All,
    /// One request with `size` set to this value.
    AtMost(u32),
}

/// An explicit field/value assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub field: String,
    pub value: Value,
}

/// Where the outgoing row body comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RowData {
    /// Copy the item's input record, minus the listed keys.
    AutoMapInput { ignore: Vec<String> },
    /// Use only the listed field/value pairs.
    Fields(Vec<FieldValue>),
}

impl RowData {
    /// Build the wire-keyed request body for an item.
    pub fn build_body(&self, input: &Record, mapper: &FieldMapper) -> Record {
        match self {
            RowData::AutoMapInput { ignore } => {
                let mut body = input.clone();
                for key in ignore {
                    body.remove(key);
                }
                mapper.to_identifier_keys(&body)
            }
            RowData::Fields(fields) => fields
                .iter()
                .map(|fv| (explicit_field_key(mapper, &fv.field), fv.value.clone()))
                .collect(),
        }
    }
}

/// Explicit assignments name fields by id, so a bare id is always a wire
/// reference unless it happens to be a field name.
fn explicit_field_key(mapper: &FieldMapper, field: &str) -> String {
    if mapper.key_for(field).is_none() && is_numeric(field) {
        format!("{}{}", FIELD_KEY_PREFIX, field)
    } else {
        mapper.resolve_field(field)
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// A validated row operation.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOperation {
    Create {
        table: TableId,
        data: RowData,
    },
    Get {
        table: TableId,
        row: RowId,
    },
    Update {
        table: TableId,
        row: RowId,
        data: RowData,
    },
    Delete {
        table: TableId,
        row: RowId,
    },
    List {
        table: TableId,
        query: RowQuery,
        limit: RowLimit,
    },
}

impl RowOperation {
    /// Host-facing operation name.
    pub fn name(&self) -> &'static str {
        match self {
            RowOperation::Create { .. } => "create",
            RowOperation::Get { .. } => "get",
            RowOperation::Update { .. } => "update",
            RowOperation::Delete { .. } => "delete",
            RowOperation::List { .. } => "getAll",
        }
    }

    /// The table this operation targets.
    pub fn table(&self) -> &TableId {
        match self {
            RowOperation::Create { table, .. }
            | RowOperation::Get { table, .. }
            | RowOperation::Update { table, .. }
            | RowOperation::Delete { table, .. }
            | RowOperation::List { table, .. } => table,
        }
    }

    /// Whether the operation reads or writes field values and so needs the
    /// table schema for key translation.
    pub fn uses_fields(&self) -> bool {
        !matches!(self, RowOperation::Delete { .. })
    }
}

/// Validated parameters for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemParams {
    pub operation: RowOperation,
    /// "Do not map" mode: field references are already wire keys.
    pub raw_fields: bool,
}

impl ItemParams {
    /// Validate a host parameter bag.
    pub fn from_raw(raw: &RawItemParams) -> Result<Self, Error> {
        if let Some(resource) = raw.resource.as_deref()
            && resource != "row"
        {
            return Err(ValidationError::UnsupportedResource(resource.to_string()).into());
        }

        let operation = raw
            .operation
            .as_deref()
            .ok_or_else(|| ValidationError::missing("operation"))?;

        let table: TableId = id_param("tableId", raw.table_id.as_ref())?;

        let operation = match operation {
            "create" => RowOperation::Create {
                table,
                data: row_data(raw)?,
            },
            "get" => RowOperation::Get {
                table,
                row: id_param("rowId", raw.row_id.as_ref())?,
            },
            "update" => RowOperation::Update {
                table,
                row: id_param("rowId", raw.row_id.as_ref())?,
                data: row_data(raw)?,
            },
            "delete" => RowOperation::Delete {
                table,
                row: id_param("rowId", raw.row_id.as_ref())?,
            },
            "getAll" | "list" => RowOperation::List {
                table,
                query: row_query(raw)?,
                limit: row_limit(raw)?,
            },
            other => return Err(ValidationError::UnsupportedOperation(other.to_string()).into()),
        };

        Ok(Self {
            operation,
            raw_fields: raw.raw_fields.unwrap_or(false),
        })
    }
}

fn id_param<T>(name: &str, value: Option<&Value>) -> Result<T, Error>
where
    T: FromStr<Err = Error>,
{
    match value {
        None | Some(Value::Null) => Err(ValidationError::missing(name).into()),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::missing(name).into()),
        Some(Value::String(s)) => s.parse(),
        Some(Value::Number(n)) => n.to_string().parse(),
        Some(_) => Err(ValidationError::invalid(name, "expected a string or number").into()),
    }
}

fn row_data(raw: &RawItemParams) -> Result<RowData, Error> {
    match raw.data_to_send.as_deref().unwrap_or("autoMapInputData") {
        "autoMapInputData" => Ok(RowData::AutoMapInput {
            ignore: ignore_list(raw.inputs_to_ignore.as_ref())?,
        }),
        "defineBelow" => {
            let fields = raw
                .field_values
                .iter()
                .flatten()
                .map(|fv| {
                    let field = match &fv.field_id {
                        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                        Value::Number(n) => n.to_string(),
                        _ => {
                            return Err(ValidationError::invalid(
                                "fieldValues",
                                "every entry needs a fieldId",
                            ));
                        }
                    };
                    Ok(FieldValue {
                        field,
                        value: fv.field_value.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RowData::Fields(fields))
        }
        other => Err(ValidationError::invalid(
            "dataToSend",
            format!("expected autoMapInputData or defineBelow, got '{}'", other),
        )
        .into()),
    }
}

fn ignore_list(value: Option<&Value>) -> Result<Vec<String>, Error> {
    let keys = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').map(|k| k.trim().to_string()).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    ValidationError::invalid("inputsToIgnore", "array entries must be strings")
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ValidationError::invalid(
                "inputsToIgnore",
                "expected a comma-separated string or an array",
            )
            .into());
        }
    };

    Ok(keys.into_iter().filter(|k| !k.is_empty()).collect())
}

fn row_limit(raw: &RawItemParams) -> Result<RowLimit, Error> {
    let return_all = match &raw.return_all {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.as_str() {
            "true" => true,
            "false" => false,
            _ => return Err(ValidationError::invalid("returnAll", "expected a boolean").into()),
        },
        Some(_) => return Err(ValidationError::invalid("returnAll", "expected a boolean").into()),
    };

    if return_all {
        return Ok(RowLimit::All);
    }

    let limit = match &raw.limit {
        None | Some(Value::Null) => DEFAULT_LIMIT as i64,
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ValidationError::invalid("limit", "expected an integer"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::invalid("limit", "expected an integer"))?,
        Some(_) => return Err(ValidationError::invalid("limit", "expected an integer").into()),
    };

    let limit = u32::try_from(limit)
        .ok()
        .filter(|l| *l >= 1)
        .ok_or_else(|| ValidationError::invalid("limit", "must be at least 1"))?;

    Ok(RowLimit::AtMost(limit))
}

fn row_query(raw: &RawItemParams) -> Result<RowQuery, Error> {
    let filters = list_param(raw.filters.as_ref(), |item| match item {
        Value::String(s) => s.parse::<Filter>(),
        other => serde_json::from_value::<Filter>(other.clone()).map_err(|e| {
            Error::from(ValidationError::InvalidFilter {
                value: other.to_string(),
                reason: e.to_string(),
            })
        }),
    })?;

    let sort = list_param(raw.sort.as_ref(), |item| match item {
        Value::String(s) => s.parse::<SortField>(),
        other => serde_json::from_value::<SortField>(other.clone()).map_err(|e| {
            Error::from(ValidationError::InvalidSort {
                value: other.to_string(),
                reason: e.to_string(),
            })
        }),
    })?;

    let filter_type = raw
        .filter_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(FilterType::from_str)
        .transpose()?;

    Ok(RowQuery {
        filters,
        sort,
        filter_type,
        search: raw.search.clone().filter(|s| !s.is_empty()),
    })
}

fn list_param<T>(
    value: Option<&Value>,
    parse: impl Fn(&Value) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(parse).collect(),
        Some(single) => Ok(vec![parse(single)?]),
    }
}
