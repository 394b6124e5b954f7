//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the public IP via IpSource
//! - Looking up (and caching) each domain's provider record
//! - Updating DNS records via DnsProvider when the address changed
//! - Scheduling passes and applying domain reloads between them
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐   reload   ┌───────────────┐
//!   interval ───▶ │ DdnsEngine   │ ◀───────── │ ReloadHandle  │
//!                 └──────────────┘            └───────────────┘
//!                        │
//!        ┌───────────────┼────────────────────────────┐
//!        │               │                            │
//!        ▼               ▼                            ▼
//! ┌─────────────┐ ┌──────────────┐            ┌─────────────┐
//! │  IpSource   │ │ RecordStore  │ ◀─ miss ─▶ │ DnsProvider │
//! │ (once/pass) │ │ (cache)      │            │ (list/put)  │
//! └─────────────┘ └──────────────┘            └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Resolve the public IP (bounded retries); skip the pass if unavailable
//! 2. For each domain, in order: cached state, or list the zone on a miss
//! 3. Equal address: nothing to do
//! 4. Different address: overwrite the record (bounded retries)
//! 5. Only a confirmed update changes the cached address

pub mod reload;
pub mod retry;

pub use reload::ReloadHandle;
pub use retry::RetryPolicy;

use crate::config::DdnsConfig;
use crate::domains::ManagedDomainSet;
use crate::error::Result;
use crate::traits::{
    DnsProvider, DomainRecordState, DomainSource, IpSource, RecordStore, UpdatePayload,
    find_address_record,
};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        domains_count: usize,
    },

    /// A reconciliation pass began
    PassStarted {
        domains_count: usize,
    },

    /// The public IP could not be resolved; the pass made no provider calls
    PublicIpUnavailable,

    /// The provider has no address record for the domain (retried next pass)
    DomainNotProvisioned {
        domain: String,
    },

    /// The provider already points at the public IP
    DomainUnchanged {
        domain: String,
        current_ip: String,
    },

    /// The record was overwritten and the cache updated
    DomainUpdated {
        domain: String,
        previous_ip: String,
        new_ip: String,
        record_id: String,
    },

    /// Every update attempt failed; the cache was left untouched
    UpdateFailed {
        domain: String,
        new_ip: String,
        attempts: usize,
    },

    /// A reload replaced the managed domain set
    DomainsReloaded {
        domains_count: usize,
    },

    /// A reload was requested but the current set was kept
    ReloadIgnored {
        reason: String,
    },

    /// A reconciliation pass finished
    PassCompleted {
        summary: PassSummary,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Outcome counts of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Records overwritten with the new address
    pub updated: usize,
    /// Records already pointing at the public IP
    pub unchanged: usize,
    /// Domains not processed (no public IP or not provisioned)
    pub skipped: usize,
    /// Domains whose update exhausted its retries
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DomainOutcome {
    Updated,
    Unchanged,
    NotProvisioned,
    Failed,
}

/// Core DDNS engine
///
/// The engine owns the record store and the active domain set. Passes run
/// sequentially on a single task; the only concurrent entry point is
/// [`ReloadHandle::request`].
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`] or [`DdnsEngine::run_with_shutdown()`]
/// 3. Engine runs passes every `check_interval_secs` until shutdown
pub struct DdnsEngine {
    /// IP source for discovering the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// Per-domain cache of provider state
    store: Box<dyn RecordStore>,

    /// Where reloads read the domain list from
    domain_source: Box<dyn DomainSource>,

    /// Provider zone holding every managed record
    zone_id: String,

    /// Active domain set, replaced as a whole on reload
    domains: RwLock<ManagedDomainSet>,

    /// Retry policy for every network operation
    retry: RetryPolicy,

    /// Pause between passes
    check_interval: Duration,

    /// Pending reload trigger
    reload: ReloadHandle,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `store`: Record store implementation
    /// - `domain_source`: Source consulted on reload
    /// - `config`: DDNS configuration (initial domain set included)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        store: Box<dyn RecordStore>,
        domain_source: Box<dyn DomainSource>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            store,
            domain_source,
            domains: RwLock::new(config.domain_set()),
            zone_id: config.zone_id,
            retry: RetryPolicy::from_config(&config.engine),
            check_interval: Duration::from_secs(config.engine.check_interval_secs),
            reload: ReloadHandle::new(),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Handle for requesting a domain reload from another task
    pub fn reload_handle(&self) -> ReloadHandle {
        self.reload.clone()
    }

    /// Snapshot of the active domain set
    pub async fn domains(&self) -> ManagedDomainSet {
        self.domains.read().await.clone()
    }

    /// Run the engine until Ctrl-C
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let listener = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = shutdown_tx.send(());
                }
                Err(e) => {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    // Keep the sender alive so the engine is not stopped by a closed channel
                    std::future::pending::<()>().await;
                    drop(shutdown_tx);
                }
            }
        });

        let result = self.run_internal(shutdown_rx).await;
        listener.abort();
        result
    }

    /// Run the engine until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// A pass in flight stops at the next domain boundary; a record update
    /// already sent is never abandoned halfway.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        let initial = self.domains().await;
        info!(
            "Starting DDNS updater for {} domain(s): {}",
            initial.len(),
            initial
        );
        self.emit_event(EngineEvent::Started {
            domains_count: initial.len(),
        });

        loop {
            self.apply_pending_reload().await;

            let (_, interrupted) = self.reconcile(Some(&mut shutdown_rx)).await;
            if interrupted {
                info!("Shutdown signal received, pass interrupted at domain boundary");
                break;
            }

            info!(
                "|----- Waiting {} seconds until next check... -----|",
                self.check_interval.as_secs()
            );

            if self.wait_for_next_tick(&mut shutdown_rx).await {
                info!("Shutdown signal received");
                break;
            }
        }

        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Engine stopped");

        Ok(())
    }

    /// Sleep until the next pass, applying reloads as they are requested
    ///
    /// Returns `true` if shutdown was requested while waiting.
    async fn wait_for_next_tick(&self, shutdown_rx: &mut oneshot::Receiver<()>) -> bool {
        // tokio clamps intervals past the clock's range to a far-future deadline
        let tick = tokio::time::sleep(self.check_interval);
        tokio::pin!(tick);

        loop {
            tokio::select! {
                _ = &mut *shutdown_rx => return true,
                _ = &mut tick => return false,
                _ = self.reload.notified() => self.apply_pending_reload().await,
            }
        }
    }

    /// Run one full reconciliation pass over the current domain set
    pub async fn run_pass(&self) -> PassSummary {
        self.reconcile(None).await.0
    }

    async fn reconcile(
        &self,
        mut shutdown_rx: Option<&mut oneshot::Receiver<()>>,
    ) -> (PassSummary, bool) {
        // One snapshot per pass: a reload never mixes old and new sets
        let domains = self.domains().await;
        let mut summary = PassSummary::default();

        self.emit_event(EngineEvent::PassStarted {
            domains_count: domains.len(),
        });

        let Some(public_ip) = self.resolve_public_ip().await else {
            error!("Could not retrieve public IP. Skipping update.");
            summary.skipped = domains.len();
            self.emit_event(EngineEvent::PublicIpUnavailable);
            self.emit_event(EngineEvent::PassCompleted { summary });
            return (summary, false);
        };

        for domain in domains.iter() {
            if let Some(rx) = shutdown_rx.as_mut()
                && shutdown_requested(rx)
            {
                return (summary, true);
            }

            info!(" -----| {} |----- ", domain);
            match self.reconcile_domain(domain, &public_ip).await {
                DomainOutcome::Updated => summary.updated += 1,
                DomainOutcome::Unchanged => summary.unchanged += 1,
                DomainOutcome::NotProvisioned => summary.skipped += 1,
                DomainOutcome::Failed => summary.failed += 1,
            }
        }

        debug!(?summary, "Pass completed");
        self.emit_event(EngineEvent::PassCompleted { summary });
        (summary, false)
    }

    async fn reconcile_domain(&self, domain: &str, public_ip: &str) -> DomainOutcome {
        let Some(state) = self.cached_or_fetch(domain).await else {
            error!(domain, "Could not retrieve record info. Skipping update.");
            self.emit_event(EngineEvent::DomainNotProvisioned {
                domain: domain.to_string(),
            });
            return DomainOutcome::NotProvisioned;
        };

        if state.current_ip == public_ip {
            info!(domain, "IP has not changed.");
            self.emit_event(EngineEvent::DomainUnchanged {
                domain: domain.to_string(),
                current_ip: state.current_ip,
            });
            return DomainOutcome::Unchanged;
        }

        if !self.update_record(&state, public_ip).await {
            error!(
                domain,
                record_id = %state.provider_record_id,
                "Could not update DNS record. Skipping update."
            );
            self.emit_event(EngineEvent::UpdateFailed {
                domain: domain.to_string(),
                new_ip: public_ip.to_string(),
                attempts: self.retry.max_attempts,
            });
            return DomainOutcome::Failed;
        }

        // The provider confirmed the write; only now does the cache move
        if let Err(e) = self.store.update_ip(domain, public_ip).await {
            error!(domain, "Failed to record updated IP in cache: {}", e);
            return DomainOutcome::Failed;
        }

        info!(
            domain,
            "Successfully updated from {} to {}.", state.current_ip, public_ip
        );
        self.emit_event(EngineEvent::DomainUpdated {
            domain: domain.to_string(),
            previous_ip: state.current_ip,
            new_ip: public_ip.to_string(),
            record_id: state.provider_record_id,
        });
        DomainOutcome::Updated
    }

    /// Resolve the public IP with the configured retry budget
    ///
    /// # Returns
    ///
    /// `None` once every attempt has failed or only blank bodies came back.
    pub async fn resolve_public_ip(&self) -> Option<String> {
        let source = &self.ip_source;
        let ip = self
            .retry
            .run("retrieving public IP", source.source_name(), move || source.current())
            .await?;

        let ip = ip.trim();
        if ip.is_empty() {
            warn!("IP source {} returned an empty address", source.source_name());
            return None;
        }

        debug!("Public IP: {}", ip);
        Some(ip.to_string())
    }

    /// Cached state for `domain`, populated from the provider on a miss
    async fn cached_or_fetch(&self, domain: &str) -> Option<DomainRecordState> {
        match self.store.get(domain).await {
            Ok(Some(state)) => return Some(state),
            Ok(None) => {}
            Err(e) => warn!(domain, "Record store lookup failed, querying provider: {}", e),
        }

        let state = self.fetch_record(domain).await?;
        if let Err(e) = self.store.put(domain, state.clone()).await {
            warn!(domain, "Failed to cache record state: {}", e);
        }
        Some(state)
    }

    /// Look up the provider's address record for `domain`
    ///
    /// The retry budget covers the whole listing; a listing without a match
    /// is a definite answer and is not retried.
    ///
    /// # Returns
    ///
    /// - `Some(state)`: The record exists with a non-empty address and id
    /// - `None`: Not provisioned, or the listing failed every attempt
    pub async fn fetch_record(&self, domain: &str) -> Option<DomainRecordState> {
        let provider = &self.provider;
        let zone_id = self.zone_id.as_str();

        let records = self
            .retry
            .run("retrieving configured IP", domain, move || {
                provider.list_records(zone_id)
            })
            .await?;

        let Some(record) = find_address_record(&records, domain) else {
            warn!(
                domain,
                "No {} record found at {}",
                crate::traits::ADDRESS_RECORD_TYPE,
                provider.provider_name()
            );
            return None;
        };

        info!(domain, record_id = %record.id, "Current IP configured: {}", record.content);
        DomainRecordState::new(domain, record.content.clone(), record.id.clone())
    }

    /// Overwrite the record behind `state` with `new_ip`
    ///
    /// Rejections (`success: false`) are retried like transport errors since
    /// the overwrite is idempotent.
    ///
    /// # Returns
    ///
    /// `true` only when the provider confirmed the update.
    pub async fn update_record(&self, state: &DomainRecordState, new_ip: &str) -> bool {
        let provider = &self.provider;
        let zone_id = self.zone_id.as_str();
        let record_id = state.provider_record_id.as_str();
        let payload = UpdatePayload::new(&state.domain, new_ip);
        let payload = &payload;

        self.retry
            .run("updating DNS record", &state.domain, move || {
                provider.update_record(zone_id, record_id, payload)
            })
            .await
            .is_some()
    }

    /// Reload the domain list from the domain source now
    ///
    /// A load error or an empty list keeps the current set. Domains dropped
    /// by the new set are evicted from the record store.
    ///
    /// # Returns
    ///
    /// `true` if the active set was replaced.
    pub async fn reload_domains(&self) -> bool {
        let loaded = match self.domain_source.load() {
            Ok(entries) => ManagedDomainSet::new(entries),
            Err(e) => {
                warn!(
                    "Reload: Failed to load domains from {}: {}. Keeping existing domains.",
                    self.domain_source.describe(),
                    e
                );
                self.emit_event(EngineEvent::ReloadIgnored {
                    reason: e.to_string(),
                });
                return false;
            }
        };

        if loaded.is_empty() {
            warn!("Reload: No domains found in configuration after reload. Keeping existing domains.");
            self.emit_event(EngineEvent::ReloadIgnored {
                reason: "empty domain list".to_string(),
            });
            return false;
        }

        let removed: Vec<String> = {
            let mut active = self.domains.write().await;
            if *active == loaded {
                info!("Reload: No changes in domains after reload.");
                return false;
            }

            let removed = active
                .iter()
                .filter(|domain| !loaded.contains(domain))
                .map(str::to_string)
                .collect();
            *active = loaded.clone();
            removed
        };

        for domain in &removed {
            if let Err(e) = self.store.remove(domain).await {
                warn!(domain = %domain, "Failed to evict removed domain from cache: {}", e);
            }
        }

        info!("Reload: Configuration reloaded. New domains: {}", loaded);
        self.emit_event(EngineEvent::DomainsReloaded {
            domains_count: loaded.len(),
        });
        true
    }

    async fn apply_pending_reload(&self) {
        if self.reload.take() {
            info!("Reload requested");
            self.reload_domains().await;
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}

/// Whether a shutdown was signalled (a dropped sender counts as one)
fn shutdown_requested(rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty))
}
