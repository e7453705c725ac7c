//! Vault configuration.

use crate::MarketPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vault enrolled for rate monitoring.
///
/// `vault_id` is immutable once created and keys every store lookup. The
/// last-observed rate lives in the store's rates map, not here;
/// `last_alert_rate` is the separate baseline anchor and only moves when an
/// alert fires (or on the first observation, which seeds it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Stable external identifier, unique per vault.
    pub vault_id: String,
    /// Display label used in alerts.
    pub nickname: String,
    /// Minimum absolute rate movement, in percentage points, that alerts.
    pub threshold_percent: f64,
    /// Opaque identifier of the channel this vault alerts to.
    pub channel_ref: String,
    /// Webhook endpoint for the channel, once provisioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Market pair hint (e.g. WBTC-USDC) used during resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_pair: Option<MarketPair>,
    /// Cached market key discovered by the resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_key: Option<String>,
    /// Rate value at the most recent alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_alert_rate: Option<f64>,
    /// Enrollment time.
    pub created_at: DateTime<Utc>,
}

impl VaultConfig {
    /// Create a vault record with no resolution or history state yet.
    pub fn new(
        vault_id: impl Into<String>,
        nickname: impl Into<String>,
        threshold_percent: f64,
        channel_ref: impl Into<String>,
    ) -> Self {
        Self {
            vault_id: vault_id.into(),
            nickname: nickname.into(),
            threshold_percent,
            channel_ref: channel_ref.into(),
            webhook_url: None,
            market_pair: None,
            market_key: None,
            last_alert_rate: None,
            created_at: Utc::now(),
        }
    }
}
