// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - First pass after a restart lists the zone again for every domain
// - Nothing is ever written to disk

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::traits::record_store::{DomainRecordState, RecordStore};
use crate::Error;

/// In-memory record store implementation
///
/// This implementation stores all state in a HashMap protected by a RwLock.
/// Clones share the same map.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::MemoryRecordStore;
/// use ddns_core::traits::{DomainRecordState, RecordStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     let state = DomainRecordState::new("example.com", "1.2.3.3", "r1").unwrap();
///     store.put("example.com", state).await?;
///     store.update_ip("example.com", "1.2.3.4").await?;
///
///     let state = store.get("example.com").await?.unwrap();
///     assert_eq!(state.current_ip, "1.2.3.4");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<HashMap<String, DomainRecordState>>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, domain: &str) -> Result<Option<DomainRecordState>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(domain).cloned())
    }

    async fn put(&self, domain: &str, state: DomainRecordState) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(domain.to_string(), state);
        Ok(())
    }

    async fn update_ip(&self, domain: &str, new_ip: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let state = guard
            .get_mut(domain)
            .ok_or_else(|| Error::unknown_domain(domain))?;

        state.current_ip = new_ip.to_string();
        Ok(())
    }

    async fn remove(&self, domain: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(domain);
        Ok(())
    }

    async fn domains(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }
}
