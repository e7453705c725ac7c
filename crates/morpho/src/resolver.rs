//! Vault-to-market resolution over a bulk market listing.

use crate::{ListedMarket, MorphoError};
use ratewatch_core::MarketPair;
use tracing::debug;

/// Fallback matching strategies, tried in [`STRATEGY_ORDER`] when no
/// market-pair hint matches. The first strategy with any match wins, and
/// within a strategy the first entry in listing order wins. The substring
/// strategies can false-positive on short or ambiguous ids; the fixed
/// priority and first-match tie-break are part of the resolution contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Listing id equals the vault id exactly.
    IdEquals,
    /// Market key contains the vault id.
    KeyContains,
    /// Market key ends with the vault id.
    KeySuffix,
    /// Either asset's on-chain address contains the vault id.
    AssetAddress,
    /// Listing id contains the vault id.
    IdContains,
}

pub const STRATEGY_ORDER: [MatchStrategy; 5] = [
    MatchStrategy::IdEquals,
    MatchStrategy::KeyContains,
    MatchStrategy::KeySuffix,
    MatchStrategy::AssetAddress,
    MatchStrategy::IdContains,
];

impl MatchStrategy {
    /// Pure predicate: does `market` match `vault_id` under this strategy?
    pub fn matches(&self, market: &ListedMarket, vault_id: &str) -> bool {
        match self {
            MatchStrategy::IdEquals => market.id == vault_id,
            MatchStrategy::KeyContains => market.unique_key.contains(vault_id),
            MatchStrategy::KeySuffix => market.unique_key.ends_with(vault_id),
            MatchStrategy::AssetAddress => {
                market.loan_asset.address.contains(vault_id)
                    || market.collateral_asset.address.contains(vault_id)
            }
            MatchStrategy::IdContains => market.id.contains(vault_id),
        }
    }
}

/// Find the listing entry for a vault.
///
/// An exact collateral/loan match on the pair hint takes precedence over
/// every fallback strategy. Resolution is idempotent: the same inputs against
/// an unchanged listing pick the same entry.
pub fn find_market<'a>(
    listing: &'a [ListedMarket],
    vault_id: &str,
    pair_hint: Option<&MarketPair>,
) -> Result<&'a ListedMarket, MorphoError> {
    if let Some(pair) = pair_hint {
        if let Some(market) = listing.iter().find(|m| {
            m.collateral_asset.symbol == pair.collateral && m.loan_asset.symbol == pair.loan
        }) {
            debug!(vault_id, key = %market.unique_key, %pair, "resolved vault by market pair");
            return Ok(market);
        }
    }

    for strategy in STRATEGY_ORDER {
        if let Some(market) = listing.iter().find(|m| strategy.matches(m, vault_id)) {
            debug!(
                vault_id,
                key = %market.unique_key,
                strategy = ?strategy,
                "resolved vault by fallback strategy"
            );
            return Ok(market);
        }
    }

    Err(MorphoError::Unresolved {
        vault_id: vault_id.to_string(),
    })
}
