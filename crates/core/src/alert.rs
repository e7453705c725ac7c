//! Rate-change alert events.

use crate::{MarketPair, VaultConfig};
use chrono::{DateTime, Utc};

/// A threshold-crossing rate change on one vault.
///
/// Ephemeral: built when a cycle decides to alert, handed to the dispatcher,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RateChangeAlert {
    pub vault_id: String,
    pub nickname: String,
    pub market_pair: Option<MarketPair>,
    /// The comparison baseline the change was measured against.
    pub previous_rate: f64,
    pub current_rate: f64,
    /// Signed change in percentage points (current - previous), not a
    /// relative percentage of the baseline.
    pub change_points: f64,
    pub timestamp: DateTime<Utc>,
}

impl RateChangeAlert {
    pub fn new(vault: &VaultConfig, previous_rate: f64, current_rate: f64) -> Self {
        Self {
            vault_id: vault.vault_id.clone(),
            nickname: vault.nickname.clone(),
            market_pair: vault.market_pair.clone(),
            previous_rate,
            current_rate,
            change_points: current_rate - previous_rate,
            timestamp: Utc::now(),
        }
    }

    /// True when the rate moved up (worse for borrowers).
    pub fn increased(&self) -> bool {
        self.change_points > 0.0
    }
}
