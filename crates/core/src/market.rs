//! Market identification and per-cycle market state.

use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Collateral/loan symbol pair identifying a lending market, e.g. `WBTC-USDC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketPair {
    /// Collateral asset symbol.
    pub collateral: CompactString,
    /// Loan asset symbol.
    pub loan: CompactString,
}

impl MarketPair {
    pub fn new(collateral: impl Into<CompactString>, loan: impl Into<CompactString>) -> Self {
        Self {
            collateral: collateral.into(),
            loan: loan.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid market pair '{0}': expected COLLATERAL-LOAN")]
pub struct ParseMarketPairError(pub String);

impl FromStr for MarketPair {
    type Err = ParseMarketPairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(collateral), Some(loan), None) if !collateral.is_empty() && !loan.is_empty() => {
                Ok(Self::new(collateral, loan))
            }
            _ => Err(ParseMarketPairError(s.to_string())),
        }
    }
}

impl fmt::Display for MarketPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.collateral, self.loan)
    }
}

// Serialized as the plain "WBTC-USDC" form.
impl Serialize for MarketPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MarketPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Point-in-time state of one market, fetched fresh each poll cycle.
/// Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    /// Resolver-stable market identifier, possibly distinct from the vault id.
    pub market_key: String,
    /// Collateral asset symbol.
    pub collateral: CompactString,
    /// Loan asset symbol.
    pub loan: CompactString,
    /// Borrow APY in percent (5.8 means 5.8%).
    pub borrow_rate: f64,
    /// Supply APY in percent.
    pub supply_rate: f64,
}

impl MarketSnapshot {
    pub fn pair(&self) -> MarketPair {
        MarketPair::new(self.collateral.clone(), self.loan.clone())
    }
}
