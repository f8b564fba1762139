//! Backend collector and token endpoint configuration.
//!
//! The backend ingests event batches over authenticated HTTP; the auth
//! section describes the client-credentials token endpoint that gates it.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Batch collector endpoint parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BackendConfig {
    /// Batch ingest endpoint.
    #[validate(custom(function = validation::validate_http_url))]
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Upload request timeout (milliseconds).
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8080/api/v1/packets/batch".into()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// OAuth2 client-credentials parameters for the backend.
#[derive(Serialize, Deserialize, Validate, Clone)]
pub struct AuthConfig {
    /// Token endpoint issuing bearer tokens.
    #[validate(custom(function = validation::validate_http_url))]
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// OAuth2 client id.
    #[validate(length(min = 1, max = 128))]
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// OAuth2 client secret. Usually supplied via `NETWATCH_AUTH__CLIENT_SECRET`.
    #[serde(default)]
    pub client_secret: String,
}

fn default_token_url() -> String {
    "http://localhost:8081/oauth2/token".into()
}

fn default_client_id() -> String {
    "netwatch-agent".into()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: default_token_url(),
            client_id: default_client_id(),
            client_secret: String::new(),
        }
    }
}

// The secret must never reach logs or `check-config` output.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_the_secret() {
        let auth = AuthConfig {
            client_secret: "gA9xkHXpcEcn7P8hWLjf".into(),
            ..AuthConfig::default()
        };
        let printed = format!("{auth:?}");
        assert!(!printed.contains("gA9xkHXpcEcn7P8hWLjf"));
        assert!(printed.contains("<redacted>"));
    }
}
