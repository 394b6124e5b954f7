// # Domain Source Trait
//
// Defines the "return the current domain list" query. The engine calls it
// when a reload is requested; the daemon also uses it once at startup.
//
// ## Implementations
//
// - File-based (YAML/TOML/JSON): `domains::FileDomainSource`
// - Fixed list: `domains::StaticDomainSource`

/// Trait for domain list sources
///
/// Loading is synchronous: domain lists are small local documents.
pub trait DomainSource: Send + Sync {
    /// Load the raw domain list
    ///
    /// Entries are returned as written; blank filtering happens in
    /// `ManagedDomainSet`.
    fn load(&self) -> Result<Vec<String>, crate::Error>;

    /// Describe the source (for logging)
    fn describe(&self) -> String;
}
