//! Validated identifier and URL types.
//!
//! These types enforce request-path invariants at construction time,
//! so ids and hosts that reach the HTTP layer are always usable.

mod host_url;
mod ids;

pub use host_url::{API_PREFIX, DEFAULT_HOST, HostUrl, api_path};
pub use ids::{RowId, TableId};
