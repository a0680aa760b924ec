//! Database API host URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, ValidationError};

/// Path prefix every database API endpoint lives under.
pub const API_PREFIX: &str = "/api";

/// Host used when a credential does not name one.
pub const DEFAULT_HOST: &str = "https://api.baserow.io";

/// A validated database API host URL.
///
/// The URL must be absolute and use HTTPS; plain HTTP is accepted only for
/// loopback hosts so local instances and test servers keep working.
///
/// # Example
///
/// ```
/// use rowkit_core::HostUrl;
///
/// let host = HostUrl::new("https://api.baserow.io").unwrap();
/// assert_eq!(host.api_url("/database/rows/table/1/"),
///            "https://api.baserow.io/api/database/rows/table/1/");
/// assert_eq!(host.api_url("/api/database/rows/table/1/"),
///            "https://api.baserow.io/api/database/rows/table/1/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostUrl(Url);

impl HostUrl {
    /// Create a new host URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref().trim();
        let url = Url::parse(s).map_err(|e| ValidationError::InvalidHost {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        let normalized = if url.path() == "/" {
            let mut u = url.clone();
            u.set_path("");
            u
        } else {
            url
        };

        Ok(Self(normalized))
    }

    /// Returns the absolute URL for an API path.
    ///
    /// The `/api` prefix appears exactly once in the result, whether or not
    /// the host or the path already carry it.
    pub fn api_url(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        let base = base.strip_suffix(API_PREFIX).unwrap_or(base);
        format!("{}{}", base, api_path(path))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(ValidationError::InvalidHost {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let Some(host) = url.host_str() else {
            return Err(ValidationError::InvalidHost {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        };

        let is_loopback = matches!(host, "localhost" | "127.0.0.1" | "[::1]" | "::1");
        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_loopback) {
            return Err(ValidationError::InvalidHost {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ValidationError::InvalidHost {
                value: original.to_string(),
                reason: "must not carry a query or fragment".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Normalize an endpoint path so it starts with `/api/` exactly once.
pub fn api_path(path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if path == API_PREFIX || path.starts_with("/api/") {
        path
    } else {
        format!("{}{}", API_PREFIX, path)
    }
}

impl Default for HostUrl {
    fn default() -> Self {
        Self(Url::parse(DEFAULT_HOST).expect("default host is a valid URL"))
    }
}

impl fmt::Display for HostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HostUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for HostUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for HostUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HostUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let host = HostUrl::new("https://api.baserow.io").unwrap();
        assert_eq!(host.host(), Some("api.baserow.io"));
    }

    #[test]
    fn valid_localhost_http() {
        let host = HostUrl::new("http://localhost:8000").unwrap();
        assert_eq!(host.host(), Some("localhost"));
    }

    #[test]
    fn api_prefix_added_once() {
        let host = HostUrl::new("https://rows.example.com").unwrap();
        assert_eq!(
            host.api_url("/database/fields/table/7/"),
            "https://rows.example.com/api/database/fields/table/7/"
        );
        assert_eq!(
            host.api_url("/api/database/fields/table/7/"),
            "https://rows.example.com/api/database/fields/table/7/"
        );
    }

    #[test]
    fn api_prefix_not_duplicated_when_host_has_it() {
        let host = HostUrl::new("https://rows.example.com/api/").unwrap();
        assert_eq!(
            host.api_url("/api/user/token-auth/"),
            "https://rows.example.com/api/user/token-auth/"
        );
        assert_eq!(
            host.api_url("database/rows/table/1/"),
            "https://rows.example.com/api/database/rows/table/1/"
        );
    }

    #[test]
    fn keeps_sub_path_installs() {
        let host = HostUrl::new("https://example.com/baserow").unwrap();
        assert_eq!(
            host.api_url("/database/rows/table/1/"),
            "https://example.com/baserow/api/database/rows/table/1/"
        );
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(HostUrl::new("http://rows.example.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(HostUrl::new("/api/database").is_err());
    }

    #[test]
    fn default_is_hosted_service() {
        assert_eq!(HostUrl::default().host(), Some("api.baserow.io"));
    }
}
