// # IP Source Trait
//
// Defines the interface for discovering the caller's current public address.
//
// ## Implementations
//
// - HTTP IP-echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     // One attempt; the engine decides whether to try again
//     let current_ip = source.current().await?;
//     println!("public address: {current_ip}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Semi-Trusted
///
/// IP sources are **observers**, not decision-makers.
///
/// ## Allowed Capabilities
/// - ✅ Perform one outbound request per `current()` call
/// - ✅ Trim and validate the response
///
/// ## Forbidden Capabilities
/// - ❌ Retry or sleep (owned by `DdnsEngine`)
/// - ❌ Cache the address between calls (every tick must observe the network)
/// - ❌ Spawn tasks or polling loops (scheduling is owned by `DdnsEngine`)
/// - ❌ Perform DNS updates (use `DnsProvider`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The trimmed address as reported by the source
    /// - `Err(Error)`: Transport failure, non-2xx status, or unusable body
    async fn current(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
