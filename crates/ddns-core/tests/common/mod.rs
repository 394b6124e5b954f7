//! Test doubles and common utilities for engine contract tests
//!
//! The doubles are cheap to clone; clones share counters and state so a test
//! can keep a handle while the engine owns the boxed copy.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, EngineConfig};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DomainSource, IpSource, ProviderRecord, UpdatePayload};
use ddns_core::{DdnsEngine, EngineEvent, MemoryRecordStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const ZONE_ID: &str = "zone-123";

/// An IpSource that replays scripted answers, then repeats a fallback
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Result<String>>>>,
    fallback: Arc<Mutex<Option<String>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Always answer `ip`
    pub fn fixed(ip: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(Some(ip.to_string()))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fail
    pub fn failing() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue one answer ahead of the fallback
    pub fn push(&self, answer: Result<String>) {
        self.script.lock().unwrap().push_back(answer);
    }

    /// Change the address returned once the script is exhausted
    pub fn set_ip(&self, ip: &str) {
        *self.fallback.lock().unwrap() = Some(ip.to_string());
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(answer) = self.script.lock().unwrap().pop_front() {
            return answer;
        }

        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::http("connection refused"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// How the mock provider answers one update attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReply {
    /// `success: true`
    Accept,
    /// HTTP 200 with `success: false`
    Reject,
    /// Transport failure / 5xx
    Unavailable,
}

/// A mock DnsProvider backed by an in-memory zone
#[derive(Clone)]
pub struct MockDnsProvider {
    zone: Arc<Mutex<Vec<ProviderRecord>>>,
    list_failures: Arc<AtomicUsize>,
    update_replies: Arc<Mutex<VecDeque<UpdateReply>>>,
    default_reply: Arc<Mutex<UpdateReply>>,
    list_call_count: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, UpdatePayload)>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zone: Arc::new(Mutex::new(Vec::new())),
            list_failures: Arc::new(AtomicUsize::new(0)),
            update_replies: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: Arc::new(Mutex::new(UpdateReply::Accept)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a record to the zone
    pub fn with_record(self, id: &str, name: &str, record_type: &str, content: &str) -> Self {
        self.zone.lock().unwrap().push(ProviderRecord {
            id: id.to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Make the next `n` listings fail
    pub fn fail_next_lists(&self, n: usize) {
        self.list_failures.store(n, Ordering::SeqCst);
    }

    /// Queue replies for upcoming update attempts
    pub fn script_updates(&self, replies: &[UpdateReply]) {
        self.update_replies.lock().unwrap().extend(replies.iter().copied());
    }

    /// Reply used once the update script is exhausted
    pub fn set_default_reply(&self, reply: UpdateReply) {
        *self.default_reply.lock().unwrap() = reply;
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Every update attempt as (record id, payload)
    pub fn updates(&self) -> Vec<(String, UpdatePayload)> {
        self.updates.lock().unwrap().clone()
    }

    /// Current content of a record in the zone
    pub fn content_of(&self, id: &str) -> Option<String> {
        self.zone
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ProviderRecord>> {
        assert_eq!(zone_id, ZONE_ID);
        self.list_call_count.fetch_add(1, Ordering::SeqCst);

        let failures = self.list_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.list_failures.store(failures - 1, Ordering::SeqCst);
            return Err(Error::http("503 Service Unavailable"));
        }

        Ok(self.zone.lock().unwrap().clone())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &UpdatePayload,
    ) -> Result<()> {
        assert_eq!(zone_id, ZONE_ID);
        self.updates
            .lock()
            .unwrap()
            .push((record_id.to_string(), payload.clone()));

        let reply = self
            .update_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.default_reply.lock().unwrap());

        match reply {
            UpdateReply::Accept => {
                let mut zone = self.zone.lock().unwrap();
                if let Some(record) = zone.iter_mut().find(|record| record.id == record_id) {
                    record.content = payload.content.clone();
                }
                Ok(())
            }
            UpdateReply::Reject => Err(Error::rejected("mock", "validation failed")),
            UpdateReply::Unavailable => Err(Error::http("connection reset")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A DomainSource whose answer the test can change at runtime
#[derive(Clone)]
pub struct SharedDomainSource {
    domains: Arc<Mutex<Result<Vec<String>>>>,
    load_count: Arc<AtomicUsize>,
}

impl SharedDomainSource {
    pub fn new(domains: &[&str]) -> Self {
        Self {
            domains: Arc::new(Mutex::new(Ok(to_strings(domains)))),
            load_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer `domains` from now on
    pub fn set(&self, domains: &[&str]) {
        *self.domains.lock().unwrap() = Ok(to_strings(domains));
    }

    /// Fail every load from now on
    pub fn set_failing(&self) {
        *self.domains.lock().unwrap() = Err(Error::config("Domain file not found"));
    }

    /// Get the number of times load() was called
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }
}

impl DomainSource for SharedDomainSource {
    fn load(&self) -> Result<Vec<String>> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        match &*self.domains.lock().unwrap() {
            Ok(domains) => Ok(domains.clone()),
            Err(e) => Err(Error::config(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        "shared test source".to_string()
    }
}

fn to_strings(domains: &[&str]) -> Vec<String> {
    domains.iter().map(|d| d.to_string()).collect()
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domains: &[&str]) -> DdnsConfig {
    DdnsConfig {
        zone_id: ZONE_ID.to_string(),
        api_token: "test-token".to_string(),
        domains: to_strings(domains),
        ip_check_url: "http://127.0.0.1/ip".to_string(),
        engine: EngineConfig {
            max_retries: 3,
            retry_delay_secs: 5,
            check_interval_secs: 300,
            event_channel_capacity: 100,
        },
    }
}

/// Everything a test needs to drive and observe one engine
pub struct Harness {
    pub engine: DdnsEngine,
    pub events: mpsc::Receiver<EngineEvent>,
    pub ip_source: ScriptedIpSource,
    pub provider: MockDnsProvider,
    pub store: MemoryRecordStore,
    pub domain_source: SharedDomainSource,
}

impl Harness {
    pub fn new(ip_source: ScriptedIpSource, provider: MockDnsProvider, domains: &[&str]) -> Self {
        Self::with_config(ip_source, provider, minimal_config(domains))
    }

    pub fn with_config(
        ip_source: ScriptedIpSource,
        provider: MockDnsProvider,
        config: DdnsConfig,
    ) -> Self {
        let store = MemoryRecordStore::new();
        let initial: Vec<&str> = config.domains.iter().map(String::as_str).collect();
        let domain_source = SharedDomainSource::new(&initial);

        let (engine, events) = DdnsEngine::new(
            Box::new(ip_source.clone()),
            Box::new(provider.clone()),
            Box::new(store.clone()),
            Box::new(domain_source.clone()),
            config,
        )
        .expect("engine construction succeeds");

        Self {
            engine,
            events,
            ip_source,
            provider,
            store,
            domain_source,
        }
    }

    /// Drain every event emitted so far
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
