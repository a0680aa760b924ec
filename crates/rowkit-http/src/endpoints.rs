//! Endpoint paths and request/response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rowkit_core::{Record, RowId, TableId};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Username/password exchange for a session token.
pub const TOKEN_AUTH: &str = "/api/user/token-auth/";

/// Largest page size the row listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Schema of a table.
pub fn table_fields(table: &TableId) -> String {
    format!("/api/database/fields/table/{}/", table)
}

/// Row collection of a table.
pub fn table_rows(table: &TableId) -> String {
    format!("/api/database/rows/table/{}/", table)
}

/// A single row of a table.
pub fn table_row(table: &TableId, row: &RowId) -> String {
    format!("/api/database/rows/table/{}/{}/", table, row)
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the token exchange.
#[derive(Debug, Serialize)]
pub struct TokenAuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from the token exchange.
///
/// Newer servers send `access_token` next to the older `token`; either is
/// accepted, `token` first.
#[derive(Debug, Deserialize)]
pub struct TokenAuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl TokenAuthResponse {
    pub fn into_token(self) -> Option<String> {
        self.token
            .or(self.access_token)
            .filter(|t| !t.is_empty())
    }
}

/// One page of a row listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub count: Option<u64>,
    /// URL of the next page; absent or null on the last page.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Record>,
}

impl Page {
    /// Whether the API says another page follows.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorResponse {
    /// Best human-readable message in the body.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Null) | None => self.error.clone(),
            Some(other) => Some(match &self.error {
                Some(code) => format!("{}: {}", code, other),
                None => other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_end_with_slash() {
        let table = TableId::new("12").unwrap();
        let row = RowId::new("3").unwrap();
        assert_eq!(table_fields(&table), "/api/database/fields/table/12/");
        assert_eq!(table_rows(&table), "/api/database/rows/table/12/");
        assert_eq!(table_row(&table, &row), "/api/database/rows/table/12/3/");
    }

    #[test]
    fn token_response_prefers_token() {
        let both: TokenAuthResponse =
            serde_json::from_value(json!({"token": "a", "access_token": "b"})).unwrap();
        assert_eq!(both.into_token().as_deref(), Some("a"));

        let access_only: TokenAuthResponse =
            serde_json::from_value(json!({"access_token": "b", "user": {}})).unwrap();
        assert_eq!(access_only.into_token().as_deref(), Some("b"));

        let neither: TokenAuthResponse = serde_json::from_value(json!({"user": {}})).unwrap();
        assert_eq!(neither.into_token(), None);
    }

    #[test]
    fn page_treats_null_next_as_last() {
        let page: Page =
            serde_json::from_value(json!({"count": 1, "next": null, "results": [{"id": 1}]}))
                .unwrap();
        assert!(!page.has_next());
        assert_eq!(page.results.len(), 1);
    }

    #[test]
    fn error_message_from_detail() {
        let body: ApiErrorResponse = serde_json::from_value(json!({
            "error": "ERROR_ROW_DOES_NOT_EXIST",
            "detail": "The row 5 does not exist."
        }))
        .unwrap();
        assert_eq!(body.message().as_deref(), Some("The row 5 does not exist."));

        let body: ApiErrorResponse = serde_json::from_value(json!({
            "error": "ERROR_REQUEST_BODY_VALIDATION",
            "detail": {"field_1": [{"error": "bad", "code": "invalid"}]}
        }))
        .unwrap();
        assert!(body.message().unwrap().starts_with("ERROR_REQUEST_BODY_VALIDATION: "));
    }
}
