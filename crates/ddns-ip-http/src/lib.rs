// # HTTP IP Source
//
// This crate provides the IP-echo implementation of `IpSource`.
//
// ## Architecture
//
// One GET per `current()` call against a plain-text echo service such as
// `https://api.ipify.org`. The body is the caller's public IPv4 address.
// There is no polling and no caching here: the engine asks once per pass
// and owns retries.

use async_trait::async_trait;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Timeout for one echo request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP IP-echo source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Echo endpoint (e.g., "https://api.ipify.org")
    ///
    /// # Returns
    ///
    /// - `Ok(HttpIpSource)`: Ready to use
    /// - `Err(Error::Config)`: Empty URL or HTTP client construction failure
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::config("IP check URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// The configured echo endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Validate an echo body as an IPv4 address
fn parse_body(body: &str) -> Result<String> {
    let text = body.trim();
    let ip: Ipv4Addr = text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IPv4 address in response: {:?}", text)))?;

    Ok(ip.to_string())
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("IP service returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        let ip = parse_body(&body)?;
        tracing::debug!(url = %self.url, "Public IP: {}", ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
