//! Webhook delivery.

use crate::payload::{self, WebhookPayload};
use async_trait::async_trait;
use ratewatch_core::{RateChangeAlert, VaultConfig};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub use reqwest::StatusCode;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(StatusCode),
}

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Payload accepted by the endpoint.
    Delivered,
    /// Vault has no endpoint configured; nothing was sent.
    Skipped,
}

/// Destination for alert payloads. The monitor depends on this seam, so cycle
/// tests can observe deliveries without a live endpoint.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send_alert(
        &self,
        alert: &RateChangeAlert,
        endpoint: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError>;

    async fn send_first_check(
        &self,
        vault: &VaultConfig,
        rate: f64,
        endpoint: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError>;
}

/// Sends embed payloads to per-vault webhook endpoints.
///
/// Delivery is best-effort: one request with a bounded timeout, no inline
/// retry. The next poll cycle is the retry mechanism.
pub struct AlertDispatcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    async fn post(
        &self,
        endpoint: &str,
        payload: &WebhookPayload,
    ) -> Result<DispatchOutcome, DispatchError> {
        let response = self
            .http
            .post(endpoint)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }
        Ok(DispatchOutcome::Delivered)
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for AlertDispatcher {
    async fn send_alert(
        &self,
        alert: &RateChangeAlert,
        endpoint: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) else {
            debug!(vault_id = %alert.vault_id, "no webhook endpoint configured, skipping alert");
            return Ok(DispatchOutcome::Skipped);
        };
        self.post(endpoint, &payload::rate_alert_payload(alert)).await
    }

    async fn send_first_check(
        &self,
        vault: &VaultConfig,
        rate: f64,
        endpoint: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) else {
            debug!(vault_id = %vault.vault_id, "no webhook endpoint configured, skipping notice");
            return Ok(DispatchOutcome::Skipped);
        };
        self.post(endpoint, &payload::first_check_payload(vault, rate))
            .await
    }
}
