//! Core traits for the DDNS updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public address
//! - [`DnsProvider`]: List and overwrite address records via provider APIs
//! - [`RecordStore`]: Per-domain cache of provider state
//! - [`DomainSource`]: Load the list of managed domains

pub mod ip_source;
pub mod dns_provider;
pub mod record_store;
pub mod domain_source;

pub use ip_source::IpSource;
pub use dns_provider::{
    ADDRESS_RECORD_TYPE, DnsProvider, ProviderRecord, UPDATE_TTL_SECS, UpdatePayload,
    find_address_record,
};
pub use record_store::{DomainRecordState, RecordStore};
pub use domain_source::DomainSource;
