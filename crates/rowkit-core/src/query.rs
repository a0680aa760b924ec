//! Filter, sort and search parameters for row listing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};
use crate::mapper::FieldMapper;

/// Ordered query string parameters.
pub type QueryParams = Vec<(String, String)>;

/// Filter operators understood by the row listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Contains,
    ContainsNot,
    Equal,
    NotEqual,
    HigherThan,
    LowerThan,
    Empty,
    NotEmpty,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Contains,
        FilterOperator::ContainsNot,
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::HigherThan,
        FilterOperator::LowerThan,
        FilterOperator::Empty,
        FilterOperator::NotEmpty,
    ];

    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::ContainsNot => "contains_not",
            FilterOperator::Equal => "equal",
            FilterOperator::NotEqual => "not_equal",
            FilterOperator::HigherThan => "higher_than",
            FilterOperator::LowerThan => "lower_than",
            FilterOperator::Empty => "empty",
            FilterOperator::NotEmpty => "not_empty",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                ValidationError::InvalidFilter {
                    value: s.to_string(),
                    reason: "unknown operator".to_string(),
                }
                .into()
            })
    }
}

/// One `{field, operator, value}` filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    /// Parses `field:operator[:value]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let field = parts.next().unwrap_or_default().trim();
        let operator = parts.next().map(str::trim);
        let value = parts.next().unwrap_or_default();

        let Some(operator) = operator.filter(|_| !field.is_empty()) else {
            return Err(ValidationError::InvalidFilter {
                value: s.to_string(),
                reason: "expected field:operator[:value]".to_string(),
            }
            .into());
        };

        let operator = operator.parse::<FilterOperator>().map_err(|_| {
            ValidationError::InvalidFilter {
                value: s.to_string(),
                reason: format!("unknown operator '{}'", operator),
            }
        })?;

        Ok(Filter::new(field, operator, value))
    }
}

/// Sort direction.
///
/// Deserializes from the same spellings [`FromStr`] accepts, so `"-"` and
/// `"desc"` work in object sort keys too. A null direction is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Prefix placed in front of the field key in `order_by`.
    pub fn prefix(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "",
            SortDirection::Descending => "-",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "asc" | "ascending" => Ok(SortDirection::Ascending),
            "-" | "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(ValidationError::InvalidSort {
                value: other.to_string(),
                reason: "direction must be asc or desc".to_string(),
            }
            .into()),
        }
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .unwrap_or_default()
            .parse::<SortDirection>()
            .map_err(serde::de::Error::custom)
    }
}

/// One `{field, direction}` sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortField {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    /// Parses `field[:asc|desc]`. A suffix after the last `:` that is not a
    /// direction stays part of the field name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.rsplit_once(':') {
            Some((field, suffix)) => match suffix.parse::<SortDirection>() {
                Ok(direction) => (field.trim(), direction),
                Err(_) => (s.trim(), SortDirection::Ascending),
            },
            None => (s.trim(), SortDirection::Ascending),
        };

        if field.is_empty() {
            return Err(ValidationError::InvalidSort {
                value: s.to_string(),
                reason: "field cannot be empty".to_string(),
            }
            .into());
        }

        Ok(SortField::new(field, direction))
    }
}

/// How multiple filters combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterType {
    And,
    Or,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::And => "AND",
            FilterType::Or => "OR",
        }
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(FilterType::And),
            "OR" => Ok(FilterType::Or),
            _ => Err(ValidationError::invalid("filterType", "expected AND or OR").into()),
        }
    }
}

/// Structured listing options, referencing fields by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowQuery {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub sort: Vec<SortField>,
    #[serde(default)]
    pub filter_type: Option<FilterType>,
    #[serde(default)]
    pub search: Option<String>,
}

impl RowQuery {
    /// Build query parameters, translating field references through `mapper`.
    ///
    /// Emits filters first (in order), then `order_by`, `filter_type` and
    /// `search`. Empty parts are left out entirely.
    pub fn to_query_params(&self, mapper: &FieldMapper) -> QueryParams {
        let mut params = QueryParams::new();

        for filter in &self.filters {
            params.push((
                format!(
                    "filter__{}__{}",
                    mapper.resolve_field(&filter.field),
                    filter.operator
                ),
                filter.value.clone(),
            ));
        }

        if !self.sort.is_empty() {
            let order_by = self
                .sort
                .iter()
                .map(|s| format!("{}{}", s.direction.prefix(), mapper.resolve_field(&s.field)))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order_by".to_string(), order_by));
        }

        if let Some(filter_type) = self.filter_type {
            params.push(("filter_type".to_string(), filter_type.as_str().to_string()));
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search".to_string(), search.to_string()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchemaEntry;

    fn mapper() -> FieldMapper {
        FieldMapper::build(&[
            FieldSchemaEntry::new("1", "Name"),
            FieldSchemaEntry::new("2", "Age"),
        ])
    }

    #[test]
    fn operator_vocabulary_is_exact() {
        let names: Vec<_> = FilterOperator::ALL.iter().map(|op| op.as_str()).collect();
        assert_eq!(
            names,
            [
                "contains",
                "contains_not",
                "equal",
                "not_equal",
                "higher_than",
                "lower_than",
                "empty",
                "not_empty"
            ]
        );
        assert!("greater_than".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn builds_params_in_order() {
        let query = RowQuery {
            filters: vec![
                Filter::new("Name", FilterOperator::Contains, "Ad"),
                Filter::new("Age", FilterOperator::HigherThan, "30"),
            ],
            sort: vec![
                SortField::new("Age", SortDirection::Descending),
                SortField::new("Name", SortDirection::Ascending),
            ],
            filter_type: Some(FilterType::Or),
            search: Some("ada".to_string()),
        };

        let params = query.to_query_params(&mapper());
        let expected: QueryParams = vec![
            ("filter__field_1__contains".into(), "Ad".into()),
            ("filter__field_2__higher_than".into(), "30".into()),
            ("order_by".into(), "-field_2,field_1".into()),
            ("filter_type".into(), "OR".into()),
            ("search".into(), "ada".into()),
        ];
        assert_eq!(params, expected);
    }

    #[test]
    fn empty_query_has_no_params() {
        let query = RowQuery {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(query.to_query_params(&mapper()).is_empty());
    }

    #[test]
    fn raw_mapper_keeps_wire_keys() {
        let query = RowQuery {
            filters: vec![Filter::new("field_8", FilterOperator::Empty, "")],
            ..Default::default()
        };
        let params = query.to_query_params(&FieldMapper::raw());
        assert_eq!(params[0].0, "filter__field_8__empty");
    }

    #[test]
    fn parses_filter_text() {
        let filter: Filter = "Name:equal:Ada: Lovelace".parse().unwrap();
        assert_eq!(filter.field, "Name");
        assert_eq!(filter.operator, FilterOperator::Equal);
        assert_eq!(filter.value, "Ada: Lovelace");

        let filter: Filter = "Notes:not_empty".parse().unwrap();
        assert_eq!(filter.value, "");

        assert!("Name".parse::<Filter>().is_err());
        assert!("Name:like:x".parse::<Filter>().is_err());
    }

    #[test]
    fn parses_sort_text() {
        let sort: SortField = "Age:desc".parse().unwrap();
        assert_eq!(sort.direction, SortDirection::Descending);
        let sort: SortField = "Name".parse().unwrap();
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert!(":desc".parse::<SortField>().is_err());
    }

    #[test]
    fn sort_field_name_may_contain_colon() {
        let sort: SortField = "Time: start".parse().unwrap();
        assert_eq!(sort, SortField::new("Time: start", SortDirection::Ascending));

        let sort: SortField = "Time: start:desc".parse().unwrap();
        assert_eq!(sort, SortField::new("Time: start", SortDirection::Descending));

        let sort: SortField = "Name:".parse().unwrap();
        assert_eq!(sort, SortField::new("Name", SortDirection::Ascending));
    }

    #[test]
    fn sort_direction_deserializes_every_spelling() {
        for (raw, expected) in [
            ("-", SortDirection::Descending),
            ("desc", SortDirection::Descending),
            ("descending", SortDirection::Descending),
            ("", SortDirection::Ascending),
            ("asc", SortDirection::Ascending),
            ("ascending", SortDirection::Ascending),
        ] {
            let sort: SortField =
                serde_json::from_value(serde_json::json!({"field": "Age", "direction": raw}))
                    .unwrap();
            assert_eq!(sort.direction, expected, "direction {:?}", raw);
        }

        let sort: SortField =
            serde_json::from_value(serde_json::json!({"field": "Age", "direction": null})).unwrap();
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert!(
            serde_json::from_value::<SortField>(
                serde_json::json!({"field": "Age", "direction": "sideways"})
            )
            .is_err()
        );
    }

    #[test]
    fn deserializes_host_structures() {
        let query: RowQuery = serde_json::from_value(serde_json::json!({
            "filters": [{"field": "Name", "operator": "contains_not", "value": "x"}],
            "sort": [{"field": "Age", "direction": "descending"}],
            "filterType": "AND"
        }))
        .unwrap();
        assert_eq!(query.filters[0].operator, FilterOperator::ContainsNot);
        assert_eq!(query.sort[0].direction, SortDirection::Descending);
        assert_eq!(query.filter_type, Some(FilterType::And));
    }
}
