//! Table and row identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ValidationError};

const MAX_ID_LENGTH: usize = 64;

/// Accepts identifiers written either as JSON strings or as integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Ids end up inside request paths, so only a conservative character set
/// is allowed.
fn validate_id(kind: &'static str, s: &str) -> Result<(), Error> {
    let reason = if s.is_empty() {
        Some("cannot be empty".to_string())
    } else if s.len() > MAX_ID_LENGTH {
        Some(format!(
            "exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        ))
    } else {
        s.chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
            .map(|c| format!("contains invalid character '{}'", c))
    };

    match reason {
        Some(reason) => Err(ValidationError::InvalidId {
            kind,
            value: s.to_string(),
            reason,
        }
        .into()),
        None => Ok(()),
    }
}

macro_rules! path_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
        #[serde(into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, validating the format.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty, too long, or contains
            /// characters that are unsafe in a request path.
            pub fn new(s: impl Into<String>) -> Result<Self, Error> {
                let s = s.into().trim().to_string();
                validate_id($kind, &s)?;
                Ok(Self(s))
            }

            /// Returns the identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = RawId::deserialize(deserializer)?;
                $name::new(String::from(raw)).map_err(serde::de::Error::custom)
            }
        }
    };
}

path_id!(
    /// Identifier of a table.
    ///
    /// # Example
    ///
    /// ```
    /// use rowkit_core::TableId;
    ///
    /// let table = TableId::new("421").unwrap();
    /// assert_eq!(table.as_str(), "421");
    /// ```
    TableId,
    "table id"
);

path_id!(
    /// Identifier of a row within a table.
    RowId,
    "row id"
);
