// # ddns-core
//
// Core library for the polling DDNS updater.
//
// ## Architecture Overview
//
// This library keeps address ("A") records at a DNS provider pointed at the
// caller's current public IP:
// - **IpSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for listing and overwriting records via provider APIs
// - **RecordStore**: Trait for the in-memory per-domain cache
// - **DomainSource**: Trait for loading (and reloading) the managed domains
// - **DdnsEngine**: Reconciles every managed domain on a fixed interval
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Engine-Owned Retries**: Sources and providers are single-shot
// 3. **Cache After Confirmation**: Cached addresses move only after the
//    provider confirms an update
// 4. **Failure Isolation**: One domain's failure never aborts the pass
// 5. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod config;
pub mod domains;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{DnsProvider, DomainSource, IpSource, RecordStore};
pub use engine::{DdnsEngine, EngineEvent, PassSummary, ReloadHandle, RetryPolicy};
pub use config::{DdnsConfig, EngineConfig, parse_check_interval};
pub use domains::{FileDomainSource, ManagedDomainSet, StaticDomainSource};
pub use error::{Error, Result};
pub use state::MemoryRecordStore;
