// # Record Store Trait
//
// Defines the interface for the per-domain cache the engine consults before
// calling the provider.
//
// ## Purpose
//
// The record store remembers, for each managed domain:
// - The address this process believes is configured at the provider
// - The provider's identifier for the record
//
// This avoids listing the zone on every tick. The store is memory-resident;
// after a restart it is rebuilt from the provider on first use.
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::RecordStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     if let Some(state) = store.get("example.com").await? {
//         println!("{} -> {}", state.domain, state.current_ip);
//     }
//
//     // After a confirmed provider update
//     store.update_ip("example.com", "1.2.3.4").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Cached provider state for one managed domain
///
/// A state only exists after a successful provider lookup, so both the
/// address and the record identifier are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecordState {
    /// Fully-qualified domain name (store key)
    pub domain: String,
    /// Address believed to be configured at the provider
    pub current_ip: String,
    /// Provider identifier of the record; fixed for the state's lifetime
    pub provider_record_id: String,
}

impl DomainRecordState {
    /// Create a state from a provider lookup
    ///
    /// # Returns
    ///
    /// `None` if any field is blank; a partial lookup is treated as
    /// "not provisioned" by the engine.
    pub fn new(
        domain: impl Into<String>,
        current_ip: impl Into<String>,
        provider_record_id: impl Into<String>,
    ) -> Option<Self> {
        let domain = domain.into();
        let current_ip = current_ip.into();
        let provider_record_id = provider_record_id.into();

        if domain.trim().is_empty()
            || current_ip.trim().is_empty()
            || provider_record_id.trim().is_empty()
        {
            return None;
        }

        Some(Self {
            domain,
            current_ip,
            provider_record_id,
        })
    }
}

/// Trait for record store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Keep state in memory behind a lock
///
/// ## Forbidden Capabilities
/// - ❌ Network access or retries
/// - ❌ Decide when to update (owned by `DdnsEngine`)
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Get the cached state for a domain
    ///
    /// # Returns
    ///
    /// - `Ok(Some(state))`: The domain has been looked up before
    /// - `Ok(None)`: Absent
    async fn get(&self, domain: &str) -> Result<Option<DomainRecordState>, crate::Error>;

    /// Insert or replace the state for a domain
    async fn put(&self, domain: &str, state: DomainRecordState) -> Result<(), crate::Error>;

    /// Replace the cached address of an existing entry
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The entry now carries `new_ip`
    /// - `Err(Error::UnknownDomain)`: No entry exists for `domain`
    async fn update_ip(&self, domain: &str, new_ip: &str) -> Result<(), crate::Error>;

    /// Drop the entry for a domain (no-op if absent)
    async fn remove(&self, domain: &str) -> Result<(), crate::Error>;

    /// List all cached domain names
    async fn domains(&self) -> Result<Vec<String>, crate::Error>;
}
