//! Error types for rowkit.
//!
//! This module provides a unified error type with explicit variants for
//! authentication, API (HTTP status and transport), and input validation
//! errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for rowkit operations.
///
/// Every failure raised by the request layer or the dispatcher ends up here,
/// so the dispatcher's per-item boundary has a single type to isolate.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential problems or a failed token exchange.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP status or transport failure on a data call.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Malformed structured input (parameters, ids, filters, records).
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Returns the wrapped [`ApiError`], if any.
    ///
    /// A failed token exchange also counts, since it carries the HTTP
    /// context of the exchange call.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            Error::Auth(AuthError::Exchange(err)) => Some(err),
            _ => None,
        }
    }
}

/// Transport-level failure classification.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Any other HTTP client failure (request building, body decoding).
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token mode was selected but no token was supplied.
    #[error("API token auth requires a non-empty token")]
    MissingToken,

    /// Username/password mode was selected but a part is missing.
    #[error("username/password auth requires both a username and a password")]
    MissingUsernamePassword,

    /// The token exchange succeeded but the response carried no token.
    #[error("token exchange response did not contain a token")]
    TokenMissingFromResponse,

    /// The token exchange call itself failed.
    #[error("token exchange failed: {0}")]
    Exchange(ApiError),
}

/// A failed call against the database API.
///
/// A `None` status means the request never produced an HTTP response; the
/// `transport` field then says why.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP method of the failed call.
    pub method: String,
    /// Request path (without host) of the failed call.
    pub path: String,
    /// HTTP status code, if a response was received.
    pub status: Option<u16>,
    /// Human-readable message, taken from the response where possible.
    pub message: String,
    /// Raw response body for diagnostics.
    pub body: Option<String>,
    /// Transport failure classification when no response was received.
    pub transport: Option<TransportError>,
}

impl ApiError {
    /// Create an error for a non-success HTTP response.
    pub fn status(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status: Some(status),
            message: message.into(),
            body,
            transport: None,
        }
    }

    /// Create an error for a request that never got a response.
    pub fn transport(
        method: impl Into<String>,
        path: impl Into<String>,
        transport: TransportError,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status: None,
            message: transport.to_string(),
            body: None,
            transport: Some(transport),
        }
    }

    /// Create an error for a success response whose body has the wrong shape.
    pub fn unexpected(
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status: None,
            message: message.into(),
            body,
            transport: None,
        }
    }

    /// Check if the API rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        match self.status {
            Some(status) => write!(f, " returned HTTP {}: {}", status, self.message),
            None => write!(f, " failed: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.transport
            .as_ref()
            .map(|t| t as &(dyn std::error::Error + 'static))
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required parameter was not supplied.
    #[error("missing required parameter '{name}'")]
    MissingParameter { name: String },

    /// A parameter was supplied with an unusable value.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The host URL is unusable.
    #[error("invalid host URL '{value}': {reason}")]
    InvalidHost { value: String, reason: String },

    /// A table or row identifier is unusable in a request path.
    #[error("invalid {kind} '{value}': {reason}")]
    InvalidId {
        kind: &'static str,
        value: String,
        reason: String,
    },

    /// A filter specification could not be parsed.
    #[error("invalid filter '{value}': {reason}")]
    InvalidFilter { value: String, reason: String },

    /// A sort specification could not be parsed.
    #[error("invalid sort '{value}': {reason}")]
    InvalidSort { value: String, reason: String },

    /// A record was not a JSON object.
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// The resource is not one this adapter handles.
    #[error("unsupported resource '{0}'")]
    UnsupportedResource(String),

    /// The operation is not one this adapter handles.
    #[error("unsupported operation '{0}'")]
    UnsupportedOperation(String),
}

impl ValidationError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(name: &str) -> Self {
        ValidationError::MissingParameter {
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_names_the_call() {
        let err = ApiError::status(
            "GET",
            "/api/database/rows/table/1/2/",
            404,
            "The row does not exist.",
            Some(r#"{"error":"ERROR_ROW_DOES_NOT_EXIST"}"#.to_string()),
        );
        let shown = err.to_string();
        assert!(shown.contains("GET /api/database/rows/table/1/2/"));
        assert!(shown.contains("404"));
        assert!(shown.contains("The row does not exist."));
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = ApiError::transport("POST", "/api/x/", TransportError::Timeout);
        assert_eq!(err.status, None);
        assert!(!err.is_unauthorized());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn exchange_failure_exposes_api_error() {
        let api = ApiError::status("POST", "/api/user/token-auth/", 400, "bad", None);
        let err = Error::from(AuthError::Exchange(api));
        assert_eq!(err.api_error().and_then(|e| e.status), Some(400));
    }
}
