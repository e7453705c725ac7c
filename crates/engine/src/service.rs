//! Command surface consumed by the chat front-end.

use crate::CheckTrigger;
use async_trait::async_trait;
use ratewatch_core::{MarketPair, VaultConfig};
use ratewatch_morpho::{find_market, parse_vault_url, MarketSource, MorphoError, VaultUrlError};
use ratewatch_store::{StoreError, VaultStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("threshold must be greater than 0 and at most 100, got {0}")]
    InvalidThreshold(f64),

    #[error(transparent)]
    InvalidUrl(#[from] VaultUrlError),

    #[error("vault {0} is not enrolled")]
    UnknownVault(String),

    #[error("vault {0} is already enrolled")]
    AlreadyEnrolled(String),

    #[error(transparent)]
    Market(#[from] MorphoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to provision delivery endpoint: {0}")]
    Provision(#[from] ProvisionError),
}

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ProvisionError(pub String);

/// Creates and tears down per-channel delivery endpoints. Implemented by the
/// chat front-end; enrollment uses it so a failed enrollment can revoke what
/// it provisioned.
#[async_trait]
pub trait EndpointProvisioner: Send + Sync {
    async fn provision(&self, channel_ref: &str) -> Result<String, ProvisionError>;
    async fn revoke(&self, endpoint: &str) -> Result<(), ProvisionError>;
}

/// Parameters for enrolling a vault, as collected by the front-end.
#[derive(Debug, Clone)]
pub struct EnrollRequest {
    pub vault_id: String,
    pub nickname: String,
    pub threshold_percent: f64,
    pub channel_ref: String,
    /// Resolution hint; enrollment works without one but resolves better
    /// with it.
    pub market_pair: Option<MarketPair>,
}

impl EnrollRequest {
    /// Build a request from a full Summer.fi position URL, which carries
    /// both the vault id and the market pair.
    pub fn from_url(
        url: &str,
        nickname: impl Into<String>,
        threshold_percent: f64,
        channel_ref: impl Into<String>,
    ) -> Result<Self, VaultUrlError> {
        let info = parse_vault_url(url)?;
        Ok(Self {
            vault_id: info.vault_id,
            nickname: nickname.into(),
            threshold_percent,
            channel_ref: channel_ref.into(),
            market_pair: Some(info.market_pair),
        })
    }
}

/// Vault management operations: enroll, unenroll, threshold updates, listing,
/// status, and the manual check trigger.
pub struct VaultService<S> {
    store: Arc<VaultStore>,
    source: S,
    provisioner: Option<Box<dyn EndpointProvisioner>>,
    trigger: CheckTrigger,
}

impl<S: MarketSource> VaultService<S> {
    pub fn new(store: Arc<VaultStore>, source: S, trigger: CheckTrigger) -> Self {
        Self {
            store,
            source,
            provisioner: None,
            trigger,
        }
    }

    pub fn with_provisioner(mut self, provisioner: Box<dyn EndpointProvisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    /// Enroll a vault for monitoring.
    ///
    /// Validation, resolution, and endpoint provisioning all happen before
    /// anything is persisted; if the persist itself fails, the provisioned
    /// endpoint is revoked. A failed enrollment leaves no partial state.
    pub async fn enroll(&self, request: EnrollRequest) -> Result<VaultConfig, ServiceError> {
        if !threshold_valid(request.threshold_percent) {
            return Err(ServiceError::InvalidThreshold(request.threshold_percent));
        }

        if self.store.vault(&request.vault_id).await.is_some() {
            return Err(ServiceError::AlreadyEnrolled(request.vault_id));
        }

        // Resolve eagerly so an unresolvable vault surfaces to the caller now
        // instead of failing silently on every later cycle.
        let listing = self.source.fetch_listing().await?;
        let market = find_market(&listing, &request.vault_id, request.market_pair.as_ref())?;

        let mut vault = VaultConfig::new(
            request.vault_id,
            request.nickname,
            request.threshold_percent,
            request.channel_ref,
        );
        vault.market_key = Some(market.unique_key.clone());
        vault.market_pair = request.market_pair;

        if let Some(provisioner) = &self.provisioner {
            vault.webhook_url = Some(provisioner.provision(&vault.channel_ref).await?);
        }

        if let Err(e) = self.store.upsert_vault(vault.clone()).await {
            if let (Some(provisioner), Some(endpoint)) =
                (&self.provisioner, vault.webhook_url.as_deref())
            {
                if let Err(revoke_err) = provisioner.revoke(endpoint).await {
                    warn!(
                        vault_id = %vault.vault_id,
                        error = %revoke_err,
                        "failed to revoke endpoint after enrollment failure"
                    );
                }
            }
            return Err(e.into());
        }

        info!(
            vault_id = %vault.vault_id,
            nickname = %vault.nickname,
            threshold = vault.threshold_percent,
            "vault enrolled"
        );
        Ok(vault)
    }

    /// Remove a vault and its rate history.
    pub async fn unenroll(&self, vault_id: &str) -> Result<(), ServiceError> {
        if self.store.remove_vault(vault_id).await? {
            info!(vault_id, "vault unenrolled");
            Ok(())
        } else {
            Err(ServiceError::UnknownVault(vault_id.to_string()))
        }
    }

    /// Update a vault's alert threshold.
    pub async fn set_threshold(
        &self,
        vault_id: &str,
        threshold_percent: f64,
    ) -> Result<(), ServiceError> {
        if !threshold_valid(threshold_percent) {
            return Err(ServiceError::InvalidThreshold(threshold_percent));
        }
        if self.store.set_threshold(vault_id, threshold_percent).await? {
            info!(vault_id, threshold = threshold_percent, "threshold updated");
            Ok(())
        } else {
            Err(ServiceError::UnknownVault(vault_id.to_string()))
        }
    }

    /// Request an immediate poll cycle. Returns false when one is already
    /// pending.
    pub fn trigger_check(&self) -> bool {
        self.trigger.fire()
    }

    pub async fn list(&self) -> Vec<VaultConfig> {
        self.store.all_vaults().await
    }

    /// Every vault with its last observed rate, when one has been recorded.
    pub async fn status(&self) -> Vec<(VaultConfig, Option<f64>)> {
        let vaults = self.store.all_vaults().await;
        let rates = self.store.all_last_rates().await;
        vaults
            .into_iter()
            .map(|vault| {
                let rate = rates.get(&vault.vault_id).copied();
                (vault, rate)
            })
            .collect()
    }
}

fn threshold_valid(threshold_percent: f64) -> bool {
    threshold_percent > 0.0 && threshold_percent <= 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::check_trigger;
    use ratewatch_core::MarketSnapshot;
    use ratewatch_morpho::listing::{ListedAsset, ListedMarket, ListedMarketState};
    use ratewatch_store::{MemoryBackend, StorageBackend, StoreSnapshot};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const VAULT_URL: &str =
        "https://pro.summer.fi/ethereum/morphoblue/borrow/WBTC-USDC/1234#overview";

    struct FakeSource {
        listing: Vec<ListedMarket>,
    }

    #[async_trait]
    impl MarketSource for FakeSource {
        async fn fetch_by_key(&self, key: &str) -> Result<MarketSnapshot, MorphoError> {
            Err(MorphoError::MarketNotFound {
                key: key.to_string(),
            })
        }

        async fn fetch_listing(&self) -> Result<Vec<ListedMarket>, MorphoError> {
            Ok(self.listing.clone())
        }
    }

    fn wbtc_usdc_market() -> ListedMarket {
        ListedMarket {
            id: "m1".to_string(),
            unique_key: "0xkey1234".to_string(),
            loan_asset: ListedAsset {
                symbol: "USDC".into(),
                address: "0x1".to_string(),
                decimals: 6,
            },
            collateral_asset: ListedAsset {
                symbol: "WBTC".into(),
                address: "0x2".to_string(),
                decimals: 8,
            },
            state: ListedMarketState::default(),
        }
    }

    fn request(threshold: f64) -> EnrollRequest {
        EnrollRequest::from_url(VAULT_URL, "My WBTC Vault", threshold, "chan-1").unwrap()
    }

    async fn service(listing: Vec<ListedMarket>) -> VaultService<FakeSource> {
        let store = Arc::new(VaultStore::open(MemoryBackend).await.unwrap());
        let (trigger, _rx) = check_trigger();
        VaultService::new(store, FakeSource { listing }, trigger)
    }

    #[tokio::test]
    async fn test_enroll_resolves_and_persists() {
        let service = service(vec![wbtc_usdc_market()]).await;
        let vault = service.enroll(request(0.5)).await.unwrap();

        assert_eq!(vault.vault_id, "1234");
        assert_eq!(vault.market_key.as_deref(), Some("0xkey1234"));
        assert_eq!(vault.market_pair, Some("WBTC-USDC".parse().unwrap()));
        assert_eq!(service.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_enroll_rejects_out_of_range_thresholds() {
        let service = service(vec![wbtc_usdc_market()]).await;
        for bad in [0.0, -1.0, 100.5] {
            let err = service.enroll(request(bad)).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidThreshold(_)));
        }
        assert!(service.list().await.is_empty());
    }

    #[test]
    fn test_request_from_url_extracts_identity() {
        let req = request(0.5);
        assert_eq!(req.vault_id, "1234");
        assert_eq!(req.market_pair, Some("WBTC-USDC".parse().unwrap()));
    }

    #[test]
    fn test_request_from_bad_url_is_rejected() {
        let err = EnrollRequest::from_url("https://example.com/vault/1234", "v", 0.5, "chan-1")
            .unwrap_err();
        assert!(matches!(err, VaultUrlError::WrongHost));

        // The parse error converts straight into the error surfaced to the
        // enrollment caller.
        let service_err: ServiceError = err.into();
        assert!(matches!(service_err, ServiceError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_enroll_surfaces_unresolved_markets() {
        // Listing has no WBTC-USDC market and nothing matching "1234".
        let mut other = wbtc_usdc_market();
        other.unique_key = "0xother".to_string();
        other.collateral_asset.symbol = "WETH".into();
        let service = service(vec![other]).await;

        let err = service.enroll(request(0.5)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Market(MorphoError::Unresolved { .. })
        ));
        assert!(service.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_enroll_twice_is_rejected() {
        let service = service(vec![wbtc_usdc_market()]).await;
        service.enroll(request(0.5)).await.unwrap();
        let err = service.enroll(request(0.5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyEnrolled(id) if id == "1234"));
    }

    #[tokio::test]
    async fn test_unenroll_unknown_vault_errors() {
        let service = service(vec![]).await;
        let err = service.unenroll("9999").await.unwrap_err();
        assert!(matches!(err, ServiceError::UnknownVault(id) if id == "9999"));
    }

    #[tokio::test]
    async fn test_set_threshold_validates_and_requires_enrollment() {
        let service = service(vec![wbtc_usdc_market()]).await;
        service.enroll(request(0.5)).await.unwrap();

        service.set_threshold("1234", 1.5).await.unwrap();
        assert_eq!(service.list().await[0].threshold_percent, 1.5);

        assert!(matches!(
            service.set_threshold("1234", 0.0).await.unwrap_err(),
            ServiceError::InvalidThreshold(_)
        ));
        assert!(matches!(
            service.set_threshold("9999", 1.0).await.unwrap_err(),
            ServiceError::UnknownVault(_)
        ));
    }

    #[tokio::test]
    async fn test_status_pairs_vaults_with_rates() {
        let service = service(vec![wbtc_usdc_market()]).await;
        service.enroll(request(0.5)).await.unwrap();

        let status = service.status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].1, None);

        service.store.update_last_rate("1234", 5.2).await.unwrap();
        let status = service.status().await;
        assert_eq!(status[0].1, Some(5.2));
    }

    #[tokio::test]
    async fn test_trigger_check_debounces() {
        // Build the service inline so the trigger receiver stays alive for the
        // duration of the test; the shared `service()` helper drops its
        // receiver on return, which would close the channel.
        let store = Arc::new(VaultStore::open(MemoryBackend).await.unwrap());
        let (trigger, _rx) = check_trigger();
        let service = VaultService::new(store, FakeSource { listing: vec![] }, trigger);
        assert!(service.trigger_check());
        assert!(!service.trigger_check());
    }

    /// Provisioner that hands out endpoints and records revocations.
    #[derive(Default)]
    struct RecordingProvisioner {
        revoked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EndpointProvisioner for RecordingProvisioner {
        async fn provision(&self, channel_ref: &str) -> Result<String, ProvisionError> {
            Ok(format!("https://hooks.example/{channel_ref}"))
        }

        async fn revoke(&self, endpoint: &str) -> Result<(), ProvisionError> {
            self.revoked.lock().unwrap().push(endpoint.to_string());
            Ok(())
        }
    }

    /// Backend whose vault saves start failing after a set number of writes.
    struct FlakyBackend {
        failures_after: usize,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for FlakyBackend {
        async fn load(&self) -> Result<StoreSnapshot, StoreError> {
            Ok(StoreSnapshot::default())
        }

        async fn save_vaults(
            &self,
            _vaults: &HashMap<String, VaultConfig>,
        ) -> Result<(), StoreError> {
            if self.saves.fetch_add(1, Ordering::SeqCst) >= self.failures_after {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            Ok(())
        }

        async fn save_rates(&self, _rates: &HashMap<String, f64>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_persist_revokes_provisioned_endpoint() {
        let backend = FlakyBackend {
            failures_after: 0,
            saves: AtomicUsize::new(0),
        };
        let store = Arc::new(VaultStore::open(backend).await.unwrap());
        let (trigger, _rx) = check_trigger();
        let provisioner = Arc::new(RecordingProvisioner::default());

        struct SharedProvisioner(Arc<RecordingProvisioner>);

        #[async_trait]
        impl EndpointProvisioner for SharedProvisioner {
            async fn provision(&self, channel_ref: &str) -> Result<String, ProvisionError> {
                self.0.provision(channel_ref).await
            }
            async fn revoke(&self, endpoint: &str) -> Result<(), ProvisionError> {
                self.0.revoke(endpoint).await
            }
        }

        let service = VaultService::new(
            store,
            FakeSource {
                listing: vec![wbtc_usdc_market()],
            },
            trigger,
        )
        .with_provisioner(Box::new(SharedProvisioner(Arc::clone(&provisioner))));

        let err = service.enroll(request(0.5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        // The endpoint created for the failed enrollment was torn down and
        // nothing was persisted.
        assert_eq!(
            provisioner.revoked.lock().unwrap().as_slice(),
            ["https://hooks.example/chan-1"]
        );
        assert!(service.list().await.is_empty());
    }
}
