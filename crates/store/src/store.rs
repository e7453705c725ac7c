//! Lock-guarded vault store.

use crate::{StorageBackend, StoreError, StoreSnapshot};
use ratewatch_core::VaultConfig;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Inner {
    vaults: HashMap<String, VaultConfig>,
    last_rates: HashMap<String, f64>,
}

/// Owns every vault record and its last observed rate.
///
/// Reads share the lock. Each mutation holds the write guard across both the
/// in-memory change and the backend flush, so a reader never sees state the
/// backend has not accepted. No mutation spans more than one vault's record,
/// except removal, which clears the vault and its rate together.
pub struct VaultStore {
    inner: RwLock<Inner>,
    backend: Box<dyn StorageBackend>,
}

impl VaultStore {
    /// Open a store, loading whatever the backend has.
    pub async fn open(backend: impl StorageBackend + 'static) -> Result<Self, StoreError> {
        let StoreSnapshot { vaults, rates } = backend.load().await?;
        debug!(vaults = vaults.len(), rates = rates.len(), "store loaded");
        Ok(Self {
            inner: RwLock::new(Inner {
                vaults,
                last_rates: rates,
            }),
            backend: Box::new(backend),
        })
    }

    /// Insert or replace a vault record. A failed flush rolls the in-memory
    /// map back, so readers never see state the backend rejected.
    pub async fn upsert_vault(&self, vault: VaultConfig) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let vault_id = vault.vault_id.clone();
        let previous = inner.vaults.insert(vault_id.clone(), vault);
        if let Err(e) = self.backend.save_vaults(&inner.vaults).await {
            match previous {
                Some(prev) => {
                    inner.vaults.insert(vault_id, prev);
                }
                None => {
                    inner.vaults.remove(&vault_id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a vault and its rate history. Returns false if it was unknown.
    pub async fn remove_vault(&self, vault_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(vault) = inner.vaults.remove(vault_id) else {
            inner.last_rates.remove(vault_id);
            return Ok(false);
        };
        let rate = inner.last_rates.remove(vault_id);
        if let Err(e) = self.backend.save_vaults(&inner.vaults).await {
            inner.vaults.insert(vault_id.to_string(), vault);
            if let Some(rate) = rate {
                inner.last_rates.insert(vault_id.to_string(), rate);
            }
            return Err(e);
        }
        // The vault itself is already durably gone; a stale rates entry on
        // disk is rewritten by the next rates flush.
        self.backend.save_rates(&inner.last_rates).await?;
        Ok(true)
    }

    pub async fn vault(&self, vault_id: &str) -> Option<VaultConfig> {
        self.inner.read().await.vaults.get(vault_id).cloned()
    }

    pub async fn all_vaults(&self) -> Vec<VaultConfig> {
        self.inner.read().await.vaults.values().cloned().collect()
    }

    /// Record the most recent observed rate. Runs on every successful fetch,
    /// whether or not an alert fired.
    pub async fn update_last_rate(&self, vault_id: &str, rate: f64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let previous = inner.last_rates.insert(vault_id.to_string(), rate);
        if let Err(e) = self.backend.save_rates(&inner.last_rates).await {
            match previous {
                Some(prev) => {
                    inner.last_rates.insert(vault_id.to_string(), prev);
                }
                None => {
                    inner.last_rates.remove(vault_id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    pub async fn last_rate(&self, vault_id: &str) -> Option<f64> {
        self.inner.read().await.last_rates.get(vault_id).copied()
    }

    pub async fn all_last_rates(&self) -> HashMap<String, f64> {
        self.inner.read().await.last_rates.clone()
    }

    /// Cache a resolved market key onto a vault so later cycles skip
    /// resolution. Returns false if the vault is no longer enrolled.
    pub async fn set_market_key(&self, vault_id: &str, market_key: &str) -> Result<bool, StoreError> {
        self.with_vault(vault_id, |vault| {
            vault.market_key = Some(market_key.to_string());
        })
        .await
    }

    /// Move the alert baseline to the rate that just alerted.
    pub async fn set_last_alert_rate(&self, vault_id: &str, rate: f64) -> Result<bool, StoreError> {
        self.with_vault(vault_id, |vault| {
            vault.last_alert_rate = Some(rate);
        })
        .await
    }

    /// Update a vault's alert threshold. Returns false if it is unknown.
    pub async fn set_threshold(&self, vault_id: &str, threshold_percent: f64) -> Result<bool, StoreError> {
        self.with_vault(vault_id, |vault| {
            vault.threshold_percent = threshold_percent;
        })
        .await
    }

    async fn with_vault<F>(&self, vault_id: &str, mutate: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut VaultConfig),
    {
        let mut inner = self.inner.write().await;
        let Some(vault) = inner.vaults.get_mut(vault_id) else {
            return Ok(false);
        };
        let previous = vault.clone();
        mutate(vault);
        if let Err(e) = self.backend.save_vaults(&inner.vaults).await {
            inner.vaults.insert(vault_id.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }
}
