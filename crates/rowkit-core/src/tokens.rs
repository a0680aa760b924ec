//! Token types for database API authentication.

use std::fmt;

/// A long-lived API token (self-hosted deployments).
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Create a new API token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiToken").field(&"[REDACTED]").finish()
    }
}

/// A short-lived session token obtained by exchanging username and password.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Create a new session token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    pub fn header_value(&self) -> String {
        format!("JWT {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_token_header_uses_token_scheme() {
        assert_eq!(ApiToken::new("abc").header_value(), "Token abc");
    }

    #[test]
    fn session_token_header_uses_jwt_scheme() {
        assert_eq!(SessionToken::new("eyJ.x.y").header_value(), "JWT eyJ.x.y");
    }

    #[test]
    fn tokens_hide_value_in_debug() {
        let debug = format!("{:?} {:?}", ApiToken::new("abc123"), SessionToken::new("eyJhbGci"));
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }
}
