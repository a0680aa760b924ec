//! Authenticated request executor.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use rowkit_core::types::api_path;
use rowkit_core::{ApiError, Credential, CredentialAuth, Error, Record, Result, TransportError};

use crate::auth::{SessionTokenProvider, TokenCache, TokenPolicy};
use crate::endpoints::ApiErrorResponse;
use crate::paginate::Paginator;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout; `None` disables it.
    pub timeout: Option<Duration>,
    /// Session token handling in username/password mode.
    pub token_policy: TokenPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            token_policy: TokenPolicy::default(),
        }
    }
}

/// Executes authenticated JSON calls against one database host.
///
/// Cloning is cheap and clones share the token cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    credential: Credential,
    tokens: SessionTokenProvider,
    policy: TokenPolicy,
    cache: TokenCache,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("credential", &self.inner.credential)
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with default options.
    pub fn new(credential: Credential) -> Self {
        Self::with_options(credential, ClientOptions::default())
    }

    pub fn with_options(credential: Credential, options: ClientOptions) -> Self {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("rowkit/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().expect("failed to build HTTP client");

        Self {
            inner: Arc::new(ClientInner {
                tokens: SessionTokenProvider::new(http.clone()),
                http,
                credential,
                policy: options.token_policy,
                cache: TokenCache::default(),
            }),
        }
    }

    /// The credential this client authenticates with.
    pub fn credential(&self) -> &Credential {
        &self.inner.credential
    }

    pub fn token_policy(&self) -> TokenPolicy {
        self.inner.policy
    }

    /// Paginator over this client with the default page size.
    pub fn paginator(&self) -> Paginator<'_> {
        Paginator::new(self)
    }

    /// Perform one authenticated call and return the parsed JSON body.
    ///
    /// `path` may be given with or without the `/api` prefix. An empty body
    /// or query is left off the request entirely. A response with no body
    /// yields `Value::Null`.
    #[instrument(skip(self, body, query), fields(host = %self.inner.credential.host()))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
    ) -> Result<Value> {
        self.call(&method, path, body, query, ResponseBody::Json).await
    }

    /// Perform one authenticated call where only the status matters.
    ///
    /// Any 2xx succeeds whatever its body holds; the body is never parsed.
    #[instrument(skip(self, body, query), fields(host = %self.inner.credential.host()))]
    pub async fn execute_no_response(
        &self,
        method: Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
    ) -> Result<()> {
        self.call(&method, path, body, query, ResponseBody::Discard)
            .await
            .map(|_| ())
    }

    /// [`execute`](Self::execute) and deserialize the body into `R`.
    pub async fn execute_as<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
    ) -> Result<R> {
        let value = self.execute(method.clone(), path, body, query).await?;
        serde_json::from_value(value.clone()).map_err(|e| {
            ApiError::unexpected(
                method.as_str(),
                api_path(path),
                format!("unexpected response: {}", e),
                Some(value.to_string()),
            )
            .into()
        })
    }

    async fn call(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
        expect: ResponseBody,
    ) -> Result<Value> {
        let path = api_path(path);

        match self.send(method, &path, body, query, expect).await {
            Err(Error::Api(err)) if err.is_unauthorized() && self.inner.policy.is_cached() => {
                debug!("Cached session token rejected, retrying with a fresh one");
                self.inner.cache.invalidate().await;
                self.send(method, &path, body, query, expect).await
            }
            other => other,
        }
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Record>,
        query: &[(String, String)],
        expect: ResponseBody,
    ) -> Result<Value> {
        let url = self.inner.credential.host().api_url(path);
        let authorization = self.authorization().await?;

        debug!(%method, path, "API request");
        trace!(?query, "query parameters");

        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, authorization);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(method.as_str(), path, &e))?;

        match expect {
            ResponseBody::Json => Ok(read_response(method.as_str(), path, response).await?),
            ResponseBody::Discard => {
                check_status(method.as_str(), path, response).await?;
                Ok(Value::Null)
            }
        }
    }

    /// Authorization header value for the configured auth mode.
    async fn authorization(&self) -> Result<String> {
        let inner = &self.inner;
        match inner.credential.auth() {
            CredentialAuth::Token(token) => Ok(token.header_value()),
            CredentialAuth::UsernamePassword { .. } => {
                let token = match inner.policy {
                    TokenPolicy::PerRequest => inner.tokens.get_token(&inner.credential).await?,
                    TokenPolicy::Cached { ttl } => {
                        inner
                            .cache
                            .get_or_fetch(&inner.tokens, &inner.credential, ttl)
                            .await?
                    }
                };
                Ok(token.header_value())
            }
        }
    }
}

/// How a successful response body is handled.
#[derive(Debug, Clone, Copy)]
enum ResponseBody {
    Json,
    Discard,
}

/// Read a response body, turning non-success statuses into [`ApiError`].
pub(crate) async fn read_response(
    method: &str,
    path: &str,
    response: reqwest::Response,
) -> std::result::Result<Value, ApiError> {
    let status = response.status();
    trace!(status = %status, "API response");

    let text = response
        .text()
        .await
        .map_err(|e| transport_error(method, path, &e))?;

    if !status.is_success() {
        return Err(status_error(method, path, status, text));
    }

    if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| {
        ApiError::unexpected(method, path, format!("invalid JSON in response: {}", e), Some(text))
    })
}

/// Check the status only; a successful body is dropped unread.
async fn check_status(
    method: &str,
    path: &str,
    response: reqwest::Response,
) -> std::result::Result<(), ApiError> {
    let status = response.status();
    trace!(status = %status, "API response");

    if status.is_success() {
        return Ok(());
    }

    let text = response
        .text()
        .await
        .map_err(|e| transport_error(method, path, &e))?;
    Err(status_error(method, path, status, text))
}

fn status_error(method: &str, path: &str, status: StatusCode, text: String) -> ApiError {
    let message = error_message(status, &text);
    let body = (!text.is_empty()).then_some(text);
    ApiError::status(method, path, status.as_u16(), message, body)
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.message())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string())
}

/// Classify a reqwest failure that produced no response.
pub(crate) fn transport_error(method: &str, path: &str, err: &reqwest::Error) -> ApiError {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    ApiError::transport(method, path, transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowkit_core::HostUrl;

    #[test]
    fn client_creation() {
        let host = HostUrl::new("https://rows.example.com").unwrap();
        let client = ApiClient::new(Credential::token(host.clone(), "t").unwrap());
        assert_eq!(client.credential().host(), &host);
        assert_eq!(client.token_policy(), TokenPolicy::PerRequest);
    }

    #[test]
    fn debug_hides_secrets() {
        let client = ApiClient::new(
            Credential::username_password(HostUrl::default(), "ada", "hunter2").unwrap(),
        );
        assert!(!format!("{:?}", client).contains("hunter2"));
    }

    #[test]
    fn error_message_falls_back_to_reason() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, "<html>nope</html>"),
            "Not Found"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"ERROR_X"}"#),
            "ERROR_X"
        );
    }
}
