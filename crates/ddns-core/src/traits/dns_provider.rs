// # DNS Provider Trait
//
// Defines the two provider operations the reconciliation engine needs:
// listing the address records of a zone and overwriting one record.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::traits::UpdatePayload;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records("zone-id").await?;
//     let record = &records[0];
//
//     provider
//         .update_record("zone-id", &record.id, &UpdatePayload::new(&record.name, "1.2.3.4"))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The only record type this system manages
pub const ADDRESS_RECORD_TYPE: &str = "A";

/// TTL written with every update (seconds)
pub const UPDATE_TTL_SECS: u32 = 120;

/// A record as listed by the provider
///
/// Only the fields the engine reads are modelled; providers may carry more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content (the address for "A" records)
    pub content: String,
}

/// Full overwrite body sent for one update attempt
///
/// Built fresh for each update and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    /// Always [`ADDRESS_RECORD_TYPE`]
    #[serde(rename = "type")]
    pub record_type: &'static str,
    /// Fully-qualified record name
    pub name: String,
    /// New address
    pub content: String,
    /// Always [`UPDATE_TTL_SECS`]
    pub ttl: u32,
    /// Always `false`
    pub proxied: bool,
}

impl UpdatePayload {
    /// Build the overwrite body for `domain` pointing at `ip`
    pub fn new(domain: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            record_type: ADDRESS_RECORD_TYPE,
            name: domain.into(),
            content: ip.into(),
            ttl: UPDATE_TTL_SECS,
            proxied: false,
        }
    }
}

/// Find the managed address record for `domain` in a zone listing
///
/// First match wins. `None` means the domain is not provisioned at the
/// provider, which is not an error.
pub fn find_address_record<'a>(
    records: &'a [ProviderRecord],
    domain: &str,
) -> Option<&'a ProviderRecord> {
    records
        .iter()
        .find(|record| record.name == domain && record.record_type == ADDRESS_RECORD_TYPE)
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (owned by `DdnsEngine`)
/// - ❌ Access the record store (owned by `DdnsEngine`)
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Spawn tasks or threads
///
/// A provider call either succeeds or returns an error; the engine retries
/// errors according to its configured policy.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every address record in a zone
    ///
    /// Pagination, if the provider uses it, is handled inside this call so
    /// the engine sees one logical listing.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ProviderRecord>, crate::Error>;

    /// Overwrite one record with `payload`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider confirmed the update
    /// - `Err(Error::ProviderRejected)`: The response reported `success: false`
    /// - `Err(Error)`: Transport failure or non-2xx status
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &UpdatePayload,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
