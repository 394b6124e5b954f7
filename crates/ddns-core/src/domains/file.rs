// # File Domain Source
//
// Loads the managed domain list from a document on disk. The format is
// picked from the file extension:
//
// - `.yaml` / `.yml`
// - `.toml`
// - `.json`
//
// Every format carries the same shape:
//
// ```yaml
// domains:
//   - example.com
//   - home.example.com
// ```
//
// The file is re-read on every `load()`, which is what makes SIGHUP reloads
// pick up edits.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::traits::DomainSource;
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct DomainDocument {
    #[serde(default)]
    domains: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Yaml,
    Toml,
    Json,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!(
                "Unsupported domain file format '{}': {} (expected .yaml, .yml, .toml or .json)",
                other,
                path.display()
            ))),
        }
    }
}

/// Domain list backed by a YAML, TOML or JSON file
#[derive(Debug, Clone)]
pub struct FileDomainSource {
    path: PathBuf,
}

impl FileDomainSource {
    /// Create a source for `path`
    ///
    /// The file is not read until [`DomainSource::load`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the domain file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, format: DocumentFormat, text: &str) -> Result<DomainDocument> {
        if text.trim().is_empty() {
            return Ok(DomainDocument::default());
        }

        match format {
            DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| {
                Error::config(format!("Invalid YAML in {}: {}", self.path.display(), e))
            }),
            DocumentFormat::Toml => toml::from_str(text).map_err(|e| {
                Error::config(format!("Invalid TOML in {}: {}", self.path.display(), e))
            }),
            DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        }
    }
}

impl DomainSource for FileDomainSource {
    fn load(&self) -> Result<Vec<String>> {
        let format = DocumentFormat::from_path(&self.path)?;

        if !self.path.exists() {
            return Err(Error::config(format!(
                "Domain file not found: {}",
                self.path.display()
            )));
        }

        let text = std::fs::read_to_string(&self.path)?;
        let document = self.parse(format, &text)?;

        tracing::debug!(
            path = %self.path.display(),
            count = document.domains.len(),
            "Loaded domain file"
        );
        Ok(document.domains)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
