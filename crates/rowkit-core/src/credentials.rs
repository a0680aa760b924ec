//! Stored credential types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthError, Error, ValidationError};
use crate::tokens::ApiToken;
use crate::types::HostUrl;

/// Which authentication scheme a credential uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    /// Long-lived API token, sent as `Authorization: Token <t>`.
    Token,
    /// Username and password exchanged for a session token per call,
    /// sent as `Authorization: JWT <t>`.
    #[default]
    UsernamePassword,
}

impl AuthMode {
    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Token => "token",
            AuthMode::UsernamePassword => "usernamePassword",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(AuthMode::Token),
            "usernamePassword" | "username-password" | "password" => {
                Ok(AuthMode::UsernamePassword)
            }
            other => Err(ValidationError::invalid(
                "authMode",
                format!("expected 'token' or 'usernamePassword', got '{}'", other),
            )
            .into()),
        }
    }
}

/// Credential values as the host stores them.
///
/// All secrets are optional here; [`Credential::from_raw`] enforces which
/// ones the selected mode needs.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCredential {
    #[serde(default, alias = "authType")]
    pub auth_mode: AuthMode,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for RawCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCredential")
            .field("auth_mode", &self.auth_mode)
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The secret part of a credential.
#[derive(Clone)]
pub enum CredentialAuth {
    Token(ApiToken),
    UsernamePassword { username: String, password: String },
}

/// A validated credential: a host plus exactly one usable auth branch.
///
/// # Security
///
/// Secrets are never exposed in Debug output.
///
/// # Example
///
/// ```
/// use rowkit_core::{AuthMode, Credential, HostUrl};
///
/// let host = HostUrl::new("https://rows.example.com").unwrap();
/// let cred = Credential::token(host, "abc").unwrap();
/// assert_eq!(cred.auth_mode(), AuthMode::Token);
/// ```
#[derive(Clone)]
pub struct Credential {
    host: HostUrl,
    auth: CredentialAuth,
}

impl Credential {
    /// Create a token-mode credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] if the token is blank.
    pub fn token(host: HostUrl, token: impl Into<String>) -> Result<Self, Error> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        Ok(Self {
            host,
            auth: CredentialAuth::Token(ApiToken::new(token)),
        })
    }

    /// Create a username/password-mode credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingUsernamePassword`] if either part is blank.
    pub fn username_password(
        host: HostUrl,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingUsernamePassword.into());
        }
        Ok(Self {
            host,
            auth: CredentialAuth::UsernamePassword { username, password },
        })
    }

    /// Validate host-supplied credential values.
    ///
    /// Values belonging to the other auth branch are ignored.
    pub fn from_raw(raw: RawCredential) -> Result<Self, Error> {
        let host = match raw.host.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => HostUrl::new(h)?,
            _ => HostUrl::default(),
        };

        match raw.auth_mode {
            AuthMode::Token => Self::token(host, raw.token.unwrap_or_default()),
            AuthMode::UsernamePassword => Self::username_password(
                host,
                raw.username.unwrap_or_default(),
                raw.password.unwrap_or_default(),
            ),
        }
    }

    /// Returns the API host.
    pub fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the auth mode.
    pub fn auth_mode(&self) -> AuthMode {
        match self.auth {
            CredentialAuth::Token(_) => AuthMode::Token,
            CredentialAuth::UsernamePassword { .. } => AuthMode::UsernamePassword,
        }
    }

    /// Returns the secret part.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    /// Never log or display the values.
    pub fn auth(&self) -> &CredentialAuth {
        &self.auth
    }
}

// Intentionally hide secrets in Debug output
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Credential");
        s.field("host", &self.host.as_str())
            .field("auth_mode", &self.auth_mode());
        if let CredentialAuth::UsernamePassword { username, .. } = &self.auth {
            s.field("username", username);
        }
        s.field("secret", &"[REDACTED]").finish()
    }
}
