//! Managed domain sets and the sources they are loaded from
//!
//! A [`ManagedDomainSet`] is the ordered list of domains the engine
//! reconciles. It is only ever replaced as a whole (on reload), never edited.

pub mod file;

pub use file::FileDomainSource;

use crate::traits::DomainSource;
use std::collections::HashSet;
use std::sync::Arc;

/// Ordered, de-blanked list of managed domain names
///
/// Cloning is cheap; the engine hands out snapshots at the start of each pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedDomainSet {
    domains: Arc<[String]>,
}

impl ManagedDomainSet {
    /// Build a set from raw entries
    ///
    /// Entries are trimmed, blank entries are dropped, and repeated names
    /// keep only their first position.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let domains: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_string())
            .filter(|entry| !entry.is_empty())
            .filter(|entry| seen.insert(entry.clone()))
            .collect();

        Self {
            domains: domains.into(),
        }
    }

    /// Number of managed domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether no domain is managed
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Iterate in configured order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    /// Whether `domain` is part of the set
    pub fn contains(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d == domain)
    }
}

impl std::fmt::Display for ManagedDomainSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.domains.join(", "))
    }
}

/// A fixed domain list (e.g. from `DDNS_RECORDS`)
///
/// Reloading a static source always yields the same list.
#[derive(Debug, Clone)]
pub struct StaticDomainSource {
    domains: Vec<String>,
}

impl StaticDomainSource {
    /// Wrap a list
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }
}

impl DomainSource for StaticDomainSource {
    fn load(&self) -> crate::Result<Vec<String>> {
        Ok(self.domains.clone())
    }

    fn describe(&self) -> String {
        format!("static list ({} entries)", self.domains.len())
    }
}
