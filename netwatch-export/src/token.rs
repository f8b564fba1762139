//! Client-credentials token cache.
//!
//! Uploads carry a bearer token issued by the auth server. Tokens are
//! fetched lazily and cached until their advertised expiry; the whole
//! check-then-fetch sequence holds one async lock, so concurrent
//! uploads during a refresh wait for a single endpoint round trip
//! instead of racing their own.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use netwatch_config::AuthConfig;
use netwatch_core::time::Clock;

use crate::error::ExportError;

/// Applied when the endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Shared bearer-token source for the upload path.
pub struct TokenCache {
    http: Client,
    auth: AuthConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, ExportError> {
        let http = Client::builder().timeout(TOKEN_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            auth,
            clock,
            state: Mutex::new(None),
        })
    }

    /// Returns a token valid at the time of the call, fetching a fresh
    /// one from the endpoint if the cached token is missing or expired.
    pub async fn token(&self) -> Result<String, ExportError> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            if self.clock.now() < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        let fetched = self.fetch().await?;
        let lifetime = fetched
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        debug!(
            lifetime_secs = lifetime.as_secs(),
            "fetched fresh access token"
        );

        let token = fetched.access_token;
        *state = Some(CachedToken {
            token: token.clone(),
            expires_at: self.clock.now() + lifetime,
        });
        Ok(token)
    }

    async fn fetch(&self) -> Result<TokenResponse, ExportError> {
        let response = self
            .http
            .post(&self.auth.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.auth.client_id.as_str()),
                ("client_secret", self.auth.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Auth(format!(
                "token endpoint returned status {}",
                status.as_u16()
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ExportError::Auth(format!("malformed token response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use netwatch_core::time::VirtualClock;
    use serde_json::json;

    fn auth_for(server: &Server) -> AuthConfig {
        AuthConfig {
            token_url: server.url_str("/oauth2/token"),
            client_id: "netwatch-agent".into(),
            client_secret: "s3cret".into(),
        }
    }

    fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
        json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "Bearer"
        })
    }

    #[tokio::test]
    async fn caches_token_until_expiry() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/oauth2/token"),
                request::body(url_decoded(contains((
                    "grant_type",
                    "client_credentials"
                )))),
                request::body(url_decoded(contains(("client_id", "netwatch-agent")))),
            ])
            .times(1)
            .respond_with(json_encoded(token_body("tok-1", 300))),
        );

        let clock = Arc::new(VirtualClock::new());
        let cache = TokenCache::new(auth_for(&server), clock.clone()).unwrap();

        assert_eq!(cache.token().await.unwrap(), "tok-1");
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.token().await.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn expiry_triggers_refetch() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/oauth2/token"),
            ])
            .times(2)
            .respond_with(cycle![
                json_encoded(token_body("tok-1", 60)),
                json_encoded(token_body("tok-2", 60)),
            ]),
        );

        let clock = Arc::new(VirtualClock::new());
        let cache = TokenCache::new(auth_for(&server), clock.clone()).unwrap();

        assert_eq!(cache.token().await.unwrap(), "tok-1");
        clock.advance(Duration::from_secs(61));
        assert_eq!(cache.token().await.unwrap(), "tok-2");
    }

    #[tokio::test]
    async fn missing_expires_in_defaults_to_five_minutes() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/oauth2/token"),
            ])
            .times(2)
            .respond_with(cycle![
                json_encoded(json!({"access_token": "tok-1"})),
                json_encoded(json!({"access_token": "tok-2"})),
            ]),
        );

        let clock = Arc::new(VirtualClock::new());
        let cache = TokenCache::new(auth_for(&server), clock.clone()).unwrap();

        assert_eq!(cache.token().await.unwrap(), "tok-1");
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.token().await.unwrap(), "tok-1");
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.token().await.unwrap(), "tok-2");
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/oauth2/token"),
            ])
            .times(1)
            .respond_with(json_encoded(token_body("tok-1", 300))),
        );

        let clock = Arc::new(VirtualClock::new());
        let cache = TokenCache::new(auth_for(&server), clock).unwrap();

        let (a, b) = tokio::join!(cache.token(), cache.token());
        assert_eq!(a.unwrap(), "tok-1");
        assert_eq!(b.unwrap(), "tok-1");
    }

    #[tokio::test]
    async fn endpoint_rejection_propagates_as_auth_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method("POST"),
                request::path("/oauth2/token"),
            ])
            .respond_with(status_code(401)),
        );

        let clock = Arc::new(VirtualClock::new());
        let cache = TokenCache::new(auth_for(&server), clock).unwrap();

        let err = cache.token().await.unwrap_err();
        assert!(matches!(err, ExportError::Auth(_)), "got {err:?}");
    }
}
