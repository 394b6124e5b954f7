// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the Cloudflare API only
// - ✅ Parse Cloudflare response envelopes
//
// **Forbidden Capabilities**:
// - ❌ Retry or back off (owned by DdnsEngine)
// - ❌ Cache records between calls (owned by the record store)
// - ❌ Decide whether an update is needed (owned by DdnsEngine)
// - ❌ Spawn tasks or threads
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&per_page=100&page=N`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::traits::{ADDRESS_RECORD_TYPE, DnsProvider, ProviderRecord, UpdatePayload};
use ddns_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Timeout for listing records
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for overwriting a record
const UPDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Records requested per listing page
const PAGE_SIZE: u32 = 100;

const PROVIDER_NAME: &str = "cloudflare";

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

/// Join the error messages of a `success: false` envelope
fn describe_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details returned".to_string();
    }

    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Map a non-2xx status to a core error
fn status_error(status: reqwest::StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, status)),
        429 => Error::rate_limited(format!("Rate limit exceeded. Status: {}", status)),
        500..=599 => Error::http(format!(
            "Cloudflare server error (transient): {} - {}",
            status, body
        )),
        _ => Error::http(format!("{} failed: {} - {}", context, status, body)),
    }
}

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// Every call makes its HTTP requests once and reports the outcome. All
/// coordination is owned by `DdnsEngine`.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the provider still lists records but only logs
/// the PUT it would have sent, reporting success.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, overridable for tests
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: list normally, skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, list records but skip PUT updates
    ///
    /// # Returns
    ///
    /// - `Ok(CloudflareProvider)`: Ready to use
    /// - `Err(Error::Config)`: Empty token or HTTP client construction failure
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        Self::with_base_url(api_token, CLOUDFLARE_API_BASE, dry_run)
    }

    /// Create a provider talking to a different API root
    pub fn with_base_url(
        api_token: impl Into<String>,
        api_base: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    /// Fetch one listing page
    ///
    /// # Returns
    ///
    /// The page's records and the total page count reported by Cloudflare.
    async fn list_page(&self, zone_id: &str, page: u32) -> Result<(Vec<ProviderRecord>, u32)> {
        let response = self
            .client
            .get(self.records_url(zone_id))
            .query(&[
                ("type", ADDRESS_RECORD_TYPE.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ])
            .bearer_auth(&self.api_token)
            .timeout(READ_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "Listing DNS records"));
        }

        let envelope: Envelope<Vec<ProviderRecord>> = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(Error::rejected(PROVIDER_NAME, describe_errors(&envelope.errors)));
        }

        let total_pages = envelope
            .result_info
            .and_then(|info| info.total_pages)
            .unwrap_or(1);

        Ok((envelope.result.unwrap_or_default(), total_pages))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List every "A" record in the zone, following pagination
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ProviderRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (mut batch, total_pages) = self.list_page(zone_id, page).await?;
            tracing::debug!(page, total_pages, count = batch.len(), "Fetched DNS record page");
            records.append(&mut batch);

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    /// Overwrite one record with a single PUT
    ///
    /// A 2xx answer with `success: false` is reported as
    /// [`Error::ProviderRejected`].
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &UpdatePayload,
    ) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone_id), record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(payload)?
            );
            return Ok(());
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(payload)
            .timeout(UPDATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "Updating DNS record"));
        }

        let envelope: Envelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(Error::rejected(PROVIDER_NAME, describe_errors(&envelope.errors)));
        }

        tracing::debug!(record_id, name = %payload.name, "DNS record updated");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
