//! GraphQL client for the Morpho Blue API.

use crate::{ListedMarket, MorphoError};
use async_trait::async_trait;
use ratewatch_core::MarketSnapshot;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MARKET_BY_KEY_QUERY: &str = r#"
query MarketByKey($uniqueKey: String!, $chainId: Int!) {
    marketByUniqueKey(uniqueKey: $uniqueKey, chainId: $chainId) {
        uniqueKey
        loanAsset { symbol }
        collateralAsset { symbol }
        state { borrowApy supplyApy }
    }
}"#;

const MARKET_LISTING_QUERY: &str = r#"
query MarketListing($first: Int!, $chainIds: [Int!]) {
    markets(first: $first, where: { chainId_in: $chainIds }) {
        items {
            id
            uniqueKey
            loanAsset { symbol address decimals }
            collateralAsset { symbol address decimals }
            state { borrowApy supplyApy }
        }
    }
}"#;

/// Source of market data: direct key lookups plus the bounded bulk listing.
/// The client implements it against the live API; cycle tests script it.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch one market by its resolver-stable key.
    async fn fetch_by_key(&self, key: &str) -> Result<MarketSnapshot, MorphoError>;

    /// Fetch the market listing, bounded to the configured page size and
    /// chain. Callers resolving several vaults in one cycle share one fetch.
    async fn fetch_listing(&self) -> Result<Vec<ListedMarket>, MorphoError>;
}

/// HTTP client for the Morpho Blue GraphQL API.
pub struct MorphoClient {
    http: reqwest::Client,
    api_url: String,
    page_size: u32,
    chain_id: u32,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketByKeyData {
    market_by_unique_key: Option<ListedMarket>,
}

#[derive(Debug, Deserialize)]
struct MarketListingData {
    markets: MarketListingItems,
}

#[derive(Debug, Deserialize)]
struct MarketListingItems {
    items: Vec<ListedMarket>,
}

impl MorphoClient {
    pub fn new(api_url: impl Into<String>, page_size: u32, chain_id: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            page_size,
            chain_id,
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, MorphoError> {
        let body = json!({ "query": query, "variables": variables });
        let response = self
            .http
            .post(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MorphoError::Api(format!("HTTP {}", response.status())));
        }

        let envelope: GraphqlResponse<T> = response.json().await?;
        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
                return Err(MorphoError::Api(messages.join("; ")));
            }
        }
        envelope
            .data
            .ok_or_else(|| MorphoError::Api("response missing data".to_string()))
    }
}

#[async_trait]
impl MarketSource for MorphoClient {
    async fn fetch_by_key(&self, key: &str) -> Result<MarketSnapshot, MorphoError> {
        let data: MarketByKeyData = self
            .query(
                MARKET_BY_KEY_QUERY,
                json!({ "uniqueKey": key, "chainId": self.chain_id }),
            )
            .await?;

        let market = data
            .market_by_unique_key
            .filter(|m| !m.unique_key.is_empty())
            .ok_or_else(|| MorphoError::MarketNotFound {
                key: key.to_string(),
            })?;

        let snapshot = market.to_snapshot();
        debug!(
            key = %snapshot.market_key,
            pair = %snapshot.pair(),
            borrow = snapshot.borrow_rate,
            supply = snapshot.supply_rate,
            "fetched market"
        );
        Ok(snapshot)
    }

    async fn fetch_listing(&self) -> Result<Vec<ListedMarket>, MorphoError> {
        let data: MarketListingData = self
            .query(
                MARKET_LISTING_QUERY,
                json!({ "first": self.page_size, "chainIds": [self.chain_id] }),
            )
            .await?;
        debug!(markets = data.markets.items.len(), "fetched market listing");
        Ok(data.markets.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_envelope_surfaces_graphql_errors() {
        let json = r#"{"data": null, "errors": [{"message": "boom"}, {"message": "again"}]}"#;
        let envelope: GraphqlResponse<MarketByKeyData> = serde_json::from_str(json).unwrap();
        let messages: Vec<String> = envelope.errors.unwrap().into_iter().map(|e| e.message).collect();
        assert_eq!(messages.join("; "), "boom; again");
    }

    #[test]
    fn test_null_market_deserializes_to_none() {
        let json = r#"{"data": {"marketByUniqueKey": null}}"#;
        let envelope: GraphqlResponse<MarketByKeyData> = serde_json::from_str(json).unwrap();
        assert!(envelope.data.unwrap().market_by_unique_key.is_none());
    }

    #[test]
    fn test_listing_envelope_shape() {
        let json = r#"{"data": {"markets": {"items": [{
            "id": "m1",
            "uniqueKey": "0xabc",
            "loanAsset": {"symbol": "USDC", "address": "0x1", "decimals": 6},
            "collateralAsset": {"symbol": "WBTC", "address": "0x2", "decimals": 8},
            "state": {"borrowApy": 0.05, "supplyApy": 0.03}
        }]}}}"#;
        let envelope: GraphqlResponse<MarketListingData> = serde_json::from_str(json).unwrap();
        let items = envelope.data.unwrap().markets.items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unique_key, "0xabc");
    }
}
