//! Configuration types for the DDNS updater
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::domains::ManagedDomainSet;

/// Default IP-echo endpoint
pub const DEFAULT_IP_CHECK_URL: &str = "https://api.ipify.org";

/// Default pause between reconciliation passes (seconds)
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Main DDNS configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Provider zone identifier
    pub zone_id: String,

    /// Provider API credential
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Domains to manage, in reconciliation order
    pub domains: Vec<String>,

    /// IP-echo endpoint queried once per pass
    #[serde(default = "default_ip_check_url")]
    pub ip_check_url: String,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("domains", &self.domains)
            .field("ip_check_url", &self.ip_check_url)
            .field("engine", &self.engine)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a configuration with default engine settings
    pub fn new(
        zone_id: impl Into<String>,
        api_token: impl Into<String>,
        domains: Vec<String>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_token: api_token.into(),
            domains,
            ip_check_url: default_ip_check_url(),
            engine: EngineConfig::default(),
        }
    }

    /// The configured domains with blanks removed
    pub fn domain_set(&self) -> ManagedDomainSet {
        ManagedDomainSet::new(&self.domains)
    }

    /// Validate the configuration
    ///
    /// Missing credentials or an empty domain list are startup faults.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID cannot be empty"));
        }

        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }

        if self.domain_set().is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        if self.ip_check_url.trim().is_empty() {
            return Err(crate::Error::config("IP check URL cannot be empty"));
        }

        self.engine.validate()
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Total attempts per network operation (not extra retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Constant delay between attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Pause after each reconciliation pass (in seconds)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate engine settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_retries == 0 {
            return Err(crate::Error::config("max_retries must be at least 1"));
        }

        if self.check_interval_secs == 0 {
            return Err(crate::Error::config("check_interval_secs must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            check_interval_secs: default_check_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Resolve a poll interval override
///
/// Absent overrides use the default silently. Anything that is not a
/// positive integer is logged as an error and replaced by the default.
pub fn parse_check_interval(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_CHECK_INTERVAL_SECS;
    };

    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            tracing::error!(
                "Invalid check interval value: {:?}. Using default value of {}.",
                raw,
                DEFAULT_CHECK_INTERVAL_SECS
            );
            DEFAULT_CHECK_INTERVAL_SECS
        }
    }
}

fn default_ip_check_url() -> String {
    DEFAULT_IP_CHECK_URL.to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_event_channel_capacity() -> usize {
    1000
}
