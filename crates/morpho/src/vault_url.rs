//! Summer.fi position URL parsing.

use ratewatch_core::MarketPair;
use thiserror::Error;
use url::Url;

/// Vault identity extracted from a Summer.fi position URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultUrlInfo {
    pub vault_id: String,
    pub market_pair: MarketPair,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultUrlError {
    #[error("invalid URL: {0}")]
    Malformed(String),

    #[error("not a summer.fi URL")]
    WrongHost,

    #[error("unexpected URL path: expected .../MARKET-PAIR/VAULT-ID")]
    BadPath,

    #[error("invalid market pair in URL: {0}")]
    BadPair(String),

    #[error("vault id in URL is not numeric: {0}")]
    BadVaultId(String),
}

/// Parse a position URL like
/// `https://pro.summer.fi/ethereum/morphoblue/borrow/WBTC-USDC/1234#overview`.
///
/// The market pair and vault id are the last two path segments.
pub fn parse_vault_url(raw: &str) -> Result<VaultUrlInfo, VaultUrlError> {
    let parsed = Url::parse(raw).map_err(|e| VaultUrlError::Malformed(e.to_string()))?;

    let host = parsed.host_str().ok_or(VaultUrlError::WrongHost)?;
    if !host.contains("summer.fi") {
        return Err(VaultUrlError::WrongHost);
    }

    let segments: Vec<&str> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() < 5 {
        return Err(VaultUrlError::BadPath);
    }

    let vault_id = segments[segments.len() - 1];
    let pair = segments[segments.len() - 2];

    let market_pair: MarketPair = pair
        .parse()
        .map_err(|_| VaultUrlError::BadPair(pair.to_string()))?;

    if vault_id.is_empty() || !vault_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VaultUrlError::BadVaultId(vault_id.to_string()));
    }

    Ok(VaultUrlInfo {
        vault_id: vault_id.to_string(),
        market_pair,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_position_url() {
        let info = parse_vault_url(
            "https://pro.summer.fi/ethereum/morphoblue/borrow/WBTC-USDC/1234#overview",
        )
        .unwrap();
        assert_eq!(info.vault_id, "1234");
        assert_eq!(info.market_pair, MarketPair::new("WBTC", "USDC"));
    }

    #[test]
    fn test_rejects_other_hosts() {
        let err = parse_vault_url("https://example.com/ethereum/morphoblue/borrow/WBTC-USDC/1234");
        assert_eq!(err.unwrap_err(), VaultUrlError::WrongHost);
    }

    #[test]
    fn test_rejects_short_paths() {
        let err = parse_vault_url("https://pro.summer.fi/borrow/WBTC-USDC/1234");
        assert_eq!(err.unwrap_err(), VaultUrlError::BadPath);
    }

    #[test]
    fn test_rejects_pair_without_hyphen() {
        let err = parse_vault_url("https://pro.summer.fi/ethereum/morphoblue/borrow/WBTCUSDC/1234");
        assert_eq!(err.unwrap_err(), VaultUrlError::BadPair("WBTCUSDC".to_string()));
    }

    #[test]
    fn test_rejects_non_numeric_vault_id() {
        let err = parse_vault_url("https://pro.summer.fi/ethereum/morphoblue/borrow/WBTC-USDC/12ab");
        assert_eq!(err.unwrap_err(), VaultUrlError::BadVaultId("12ab".to_string()));
    }

    #[test]
    fn test_rejects_unparseable_url() {
        assert!(matches!(
            parse_vault_url("not a url").unwrap_err(),
            VaultUrlError::Malformed(_)
        ));
    }
}
