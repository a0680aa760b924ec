//! rowkit-http - HTTP-backed row API.
//!
//! [`ApiClient`] is the request executor: it resolves authorization for the
//! configured credential, sends one JSON call and maps failures into
//! [`rowkit_core::ApiError`]. It implements [`rowkit_core::RowApi`], so a
//! [`rowkit_core::Dispatcher`] can drive it directly.

mod auth;
mod client;
pub mod endpoints;
mod paginate;
mod rows;

pub use auth::{DEFAULT_TOKEN_TTL_SECS, SessionTokenProvider, TokenPolicy};
pub use client::{ApiClient, ClientOptions, DEFAULT_TIMEOUT};
pub use endpoints::Page;
pub use paginate::{PAGE_SIZE, PageCursor, Paginator};
