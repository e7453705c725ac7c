//! Poll-cycle orchestration.

use crate::evaluator;
use futures_util::future::join_all;
use ratewatch_alerts::{AlertSink, DispatchOutcome};
use ratewatch_core::{MarketSnapshot, VaultConfig};
use ratewatch_morpho::{find_market, ListedMarket, MarketSource, MorphoError};
use ratewatch_store::{StoreError, VaultStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Drives poll cycles: one on startup, then on every interval tick or manual
/// trigger. Cycles never overlap; there is exactly one in flight at a time.
pub struct Monitor<S, A> {
    store: Arc<VaultStore>,
    source: S,
    sink: A,
    interval: Duration,
    trigger_rx: mpsc::Receiver<()>,
}

impl<S: MarketSource, A: AlertSink> Monitor<S, A> {
    pub fn new(
        store: Arc<VaultStore>,
        source: S,
        sink: A,
        interval: Duration,
        trigger_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            store,
            source,
            sink,
            interval,
            trigger_rx,
        }
    }

    /// Run the poll loop. The first interval tick fires immediately, so a
    /// cycle runs on startup. Returns when every trigger handle is dropped.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "starting rate monitor");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                triggered = self.trigger_rx.recv() => {
                    if triggered.is_none() {
                        info!("trigger channel closed, stopping monitor");
                        return;
                    }
                    info!("manual check triggered");
                }
            }
            self.check_all().await;
        }
    }

    /// One poll cycle over every vault. Per-vault failures are isolated and
    /// logged; the cycle always attempts every vault and always completes.
    pub async fn check_all(&self) {
        let vaults = self.store.all_vaults().await;
        if vaults.is_empty() {
            info!("no vaults to check");
            return;
        }
        info!(vaults = vaults.len(), "checking rates");

        // One listing fetch is shared by every vault that still needs
        // resolution. A transport failure degrades the cycle to cached-key
        // lookups only.
        let listing = if vaults.iter().any(|v| v.market_key.is_none()) {
            match self.source.fetch_listing().await {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!(error = %e, "market listing fetch failed, using cached keys only");
                    None
                }
            }
        } else {
            None
        };

        let snapshots = join_all(
            vaults
                .iter()
                .map(|vault| self.vault_snapshot(vault, listing.as_deref())),
        )
        .await;

        for (vault, snapshot) in vaults.iter().zip(snapshots) {
            let snapshot = match snapshot {
                Some(Ok(snapshot)) => snapshot,
                Some(Err(e)) => {
                    warn!(vault_id = %vault.vault_id, error = %e, "failed to fetch market data");
                    continue;
                }
                None => {
                    warn!(
                        vault_id = %vault.vault_id,
                        "skipping vault: no cached market key and no listing this cycle"
                    );
                    continue;
                }
            };
            if let Err(e) = self.process_vault(vault, &snapshot).await {
                error!(vault_id = %vault.vault_id, error = %e, "failed to persist rate history");
            }
        }
    }

    /// Fetch the market snapshot for one vault: the cached key short-circuits
    /// resolution entirely, otherwise the shared listing is searched. Returns
    /// None when resolution was skipped because the listing is unavailable.
    async fn vault_snapshot(
        &self,
        vault: &VaultConfig,
        listing: Option<&[ListedMarket]>,
    ) -> Option<Result<MarketSnapshot, MorphoError>> {
        if let Some(key) = vault.market_key.as_deref() {
            return Some(self.source.fetch_by_key(key).await);
        }
        let listing = listing?;
        Some(
            find_market(listing, &vault.vault_id, vault.market_pair.as_ref())
                .map(|market| market.to_snapshot()),
        )
    }

    /// Apply one snapshot's effects: market-key cache-back, evaluation, alert
    /// dispatch, history persistence. Delivery failures are logged and do not
    /// block the history updates.
    async fn process_vault(
        &self,
        vault: &VaultConfig,
        snapshot: &MarketSnapshot,
    ) -> Result<(), StoreError> {
        if vault.market_key.is_none() {
            info!(
                vault_id = %vault.vault_id,
                key = %snapshot.market_key,
                "caching resolved market key"
            );
            self.store
                .set_market_key(&vault.vault_id, &snapshot.market_key)
                .await?;
        }

        let last_rate = self.store.last_rate(&vault.vault_id).await;
        let evaluation = evaluator::evaluate(vault, snapshot.borrow_rate, last_rate);

        if evaluation.first_observation {
            info!(
                vault_id = %vault.vault_id,
                rate = snapshot.borrow_rate,
                "first rate observation"
            );
            if let Err(e) = self
                .sink
                .send_first_check(vault, snapshot.borrow_rate, vault.webhook_url.as_deref())
                .await
            {
                warn!(vault_id = %vault.vault_id, error = %e, "failed to send first-check notice");
            }
        }

        if let Some(alert) = &evaluation.alert {
            info!(
                vault_id = %alert.vault_id,
                previous = alert.previous_rate,
                current = alert.current_rate,
                change = alert.change_points,
                "rate change crossed threshold"
            );
            match self
                .sink
                .send_alert(alert, vault.webhook_url.as_deref())
                .await
            {
                Ok(DispatchOutcome::Delivered) => {}
                Ok(DispatchOutcome::Skipped) => {
                    debug!(vault_id = %alert.vault_id, "alert skipped: no endpoint")
                }
                Err(e) => warn!(vault_id = %alert.vault_id, error = %e, "alert delivery failed"),
            }
        }

        if let Some(rate) = evaluation.last_alert_rate {
            self.store
                .set_last_alert_rate(&vault.vault_id, rate)
                .await?;
        }
        self.store
            .update_last_rate(&vault.vault_id, evaluation.last_rate)
            .await?;
        Ok(())
    }
}
