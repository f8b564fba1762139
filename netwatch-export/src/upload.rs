//! Batch delivery to the collector.
//!
//! The uploader does exactly one attempt per batch. What happens to a
//! batch that fails is the caller's policy; today the pipeline logs it
//! and moves on, accepting the loss.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use netwatch_config::BackendConfig;
use netwatch_core::events::normalize::PacketEvent;

use crate::error::ExportError;
use crate::token::TokenCache;

/// Wire shape of one collector POST.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketBatch {
    pub agent_id: String,
    pub host_name: String,
    pub interface_name: String,
    pub packets: Vec<PacketEvent>,
}

/// Authenticated single-shot uploader.
pub struct BatchUploader {
    http: Client,
    url: String,
    tokens: Arc<TokenCache>,
}

impl BatchUploader {
    pub fn new(backend: &BackendConfig, tokens: Arc<TokenCache>) -> Result<Self, ExportError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(backend.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            url: backend.url.clone(),
            tokens,
        })
    }

    /// Ships one batch, bearer-authorized, under the configured timeout.
    pub async fn upload(&self, batch: &PacketBatch) -> Result<(), ExportError> {
        let token = self.tokens.token().await?;

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(token)
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Status(status.as_u16()));
        }
        Ok(())
    }
}
