//! rowkit-core - Core types, field mapping and row dispatch.
//!
//! This crate holds everything that does not touch the network: validated
//! credentials and identifiers, the error taxonomy, the field name / wire key
//! mapper, listing query construction, host parameter validation, and the
//! [`Dispatcher`] that runs host items against any [`RowApi`].
//!
//! # Example
//!
//! ```
//! use rowkit_core::{FieldMapper, FieldSchemaEntry};
//! use serde_json::json;
//!
//! let mapper = FieldMapper::build(&[FieldSchemaEntry::new("1", "Name")]);
//! let row = json!({"id": 4, "field_1": "Ada"}).as_object().cloned().unwrap();
//! let named = mapper.to_names(&row);
//! assert_eq!(named["Name"], "Ada");
//! assert_eq!(named["id"], 4);
//! ```

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod mapper;
pub mod params;
pub mod query;
pub mod schema;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::{AuthMode, Credential, CredentialAuth, RawCredential};
pub use dispatch::{Dispatcher, HostItem, ItemOutcome};
pub use error::{ApiError, AuthError, Error, TransportError, ValidationError};
pub use mapper::FieldMapper;
pub use params::{ItemParams, RawItemParams, RowLimit, RowOperation};
pub use query::{Filter, FilterOperator, FilterType, QueryParams, RowQuery, SortDirection, SortField};
pub use schema::{FieldId, FieldSchemaEntry, Record};
pub use tokens::{ApiToken, SessionToken};
pub use traits::RowApi;
pub use types::{HostUrl, RowId, TableId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
