//! Session token exchange and caching.

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use rowkit_core::{AuthError, Credential, CredentialAuth, Result, SessionToken};

use crate::client::{read_response, transport_error};
use crate::endpoints::{TOKEN_AUTH, TokenAuthRequest, TokenAuthResponse};

/// Default lifetime of a cached session token.
///
/// Session tokens issued by the token exchange expire after ten minutes.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 9 * 60;

/// How the request executor obtains session tokens in username/password mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// Exchange credentials before every executor call.
    #[default]
    PerRequest,
    /// Reuse a token until `ttl` has passed or the API rejects it.
    Cached { ttl: Duration },
}

impl TokenPolicy {
    /// Cached policy with the default lifetime.
    pub fn cached() -> Self {
        TokenPolicy::Cached {
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, TokenPolicy::Cached { .. })
    }
}

/// Exchanges a username and password for a short-lived session token.
#[derive(Debug, Clone)]
pub struct SessionTokenProvider {
    client: reqwest::Client,
}

impl SessionTokenProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST the credential's username and password to the token endpoint.
    ///
    /// Fails with [`AuthError::MissingUsernamePassword`] for token-mode
    /// credentials, [`AuthError::Exchange`] when the call fails, and
    /// [`AuthError::TokenMissingFromResponse`] when the reply has no token.
    #[instrument(skip(self, credential), fields(host = %credential.host()))]
    pub async fn get_token(&self, credential: &Credential) -> Result<SessionToken> {
        let CredentialAuth::UsernamePassword { username, password } = credential.auth() else {
            return Err(AuthError::MissingUsernamePassword.into());
        };

        info!(%username, "Exchanging credentials for a session token");

        let url = credential.host().api_url(TOKEN_AUTH);
        let request = TokenAuthRequest { username, password };

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(transport_error("POST", TOKEN_AUTH, &e)))?;

        let value = read_response("POST", TOKEN_AUTH, response)
            .await
            .map_err(AuthError::Exchange)?;

        let token = serde_json::from_value::<TokenAuthResponse>(value)
            .ok()
            .and_then(TokenAuthResponse::into_token)
            .ok_or(AuthError::TokenMissingFromResponse)?;

        debug!("Session token issued");
        Ok(SessionToken::new(token))
    }
}

#[derive(Debug)]
struct CachedToken {
    token: SessionToken,
    issued_at: DateTime<Utc>,
}

/// Holds at most one session token for the cached policy.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Return the cached token if still fresh, otherwise exchange a new one.
    ///
    /// The lock is held across the exchange so concurrent callers share one
    /// exchange instead of racing.
    pub(crate) async fn get_or_fetch(
        &self,
        provider: &SessionTokenProvider,
        credential: &Credential,
        ttl: Duration,
    ) -> Result<SessionToken> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref()
            && Utc::now() - cached.issued_at < ttl
        {
            debug!("Reusing cached session token");
            return Ok(cached.token.clone());
        }

        let token = provider.get_token(credential).await?;
        *slot = Some(CachedToken {
            token: token.clone(),
            issued_at: Utc::now(),
        });
        Ok(token)
    }

    pub(crate) async fn invalidate(&self) {
        debug!("Dropping cached session token");
        self.slot.lock().await.take();
    }
}
