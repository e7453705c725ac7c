//! Market listing entries as returned by the bulk markets query.

use compact_str::CompactString;
use ratewatch_core::{MarketPair, MarketSnapshot};
use serde::Deserialize;

/// One market in the bulk listing.
///
/// The direct by-key lookup returns the same shape minus the listing id and
/// asset addresses, so those fields default to empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedMarket {
    /// Internal listing id, distinct from the unique key.
    #[serde(default)]
    pub id: String,
    pub unique_key: String,
    pub loan_asset: ListedAsset,
    pub collateral_asset: ListedAsset,
    #[serde(default)]
    pub state: ListedMarketState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedAsset {
    pub symbol: CompactString,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub decimals: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedMarketState {
    /// Borrow APY as a fraction (0.058 means 5.8%).
    #[serde(default)]
    pub borrow_apy: f64,
    /// Supply APY as a fraction.
    #[serde(default)]
    pub supply_apy: f64,
}

impl ListedMarket {
    /// Convert to a snapshot, scaling APY fractions to percentages.
    pub fn to_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            market_key: self.unique_key.clone(),
            collateral: self.collateral_asset.symbol.clone(),
            loan: self.loan_asset.symbol.clone(),
            borrow_rate: self.state.borrow_apy * 100.0,
            supply_rate: self.state.supply_apy * 100.0,
        }
    }

    pub fn pair(&self) -> MarketPair {
        MarketPair::new(
            self.collateral_asset.symbol.clone(),
            self.loan_asset.symbol.clone(),
        )
    }
}
