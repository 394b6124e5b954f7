// # ddnsd - DDNS Daemon
//
// This is a THIN integration layer:
// - Reading configuration (and secrets) from the environment
// - Initializing logging and the runtime
// - Building the IP source, provider, record store and domain source
// - Wiring signals: SIGTERM/SIGINT stop the engine, SIGHUP reloads domains
//
// All reconciliation logic lives in ddns-core.
//
// ## Configuration
//
// All configuration is done via environment variables (a `.env` file in the
// working directory is honoured):
//
// ### Provider
// - `DDNS_ZONE_ID`: Cloudflare zone identifier (or `DDNS_ZONE_ID_FILE`)
// - `DDNS_API_TOKEN`: Cloudflare API token (or `DDNS_API_TOKEN_FILE`)
// - `DDNS_MODE`: `dry-run` to log updates instead of sending them
//
// ### Domains
// - `DDNS_DOMAIN_FILE`: YAML/TOML/JSON file with a `domains` list (reloaded on SIGHUP)
// - `DDNS_RECORDS`: Comma-separated list, used when no domain file is set
//
// ### Engine
// - `DDNS_CHECK_INTERVAL`: Seconds between passes (default 300)
// - `DDNS_IP_CHECK_URL`: IP-echo endpoint (default https://api.ipify.org)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export DDNS_ZONE_ID_FILE=/run/secrets/zone_id
// export DDNS_API_TOKEN_FILE=/run/secrets/api_token
// export DDNS_DOMAIN_FILE=/etc/ddns/domains.yaml
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::{DEFAULT_IP_CHECK_URL, DdnsConfig, EngineConfig};
use ddns_core::{
    DdnsEngine, DomainSource, EngineEvent, FileDomainSource, MemoryRecordStore, ReloadHandle,
    StaticDomainSource, parse_check_interval,
};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Where the managed domains come from
#[derive(Debug, Clone, PartialEq, Eq)]
enum DomainSpec {
    /// Reloadable domain file
    File(PathBuf),
    /// Fixed comma-separated list
    Inline(String),
}

impl DomainSpec {
    fn into_source(self) -> Box<dyn DomainSource> {
        match self {
            Self::File(path) => Box::new(FileDomainSource::new(path)),
            Self::Inline(raw) => Box::new(StaticDomainSource::from_csv(&raw)),
        }
    }
}

/// Application configuration
struct Config {
    zone_id: String,
    api_token: String,
    domains: DomainSpec,
    check_interval_secs: u64,
    ip_check_url: String,
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<REDACTED>")
            .field("domains", &self.domains)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("ip_check_url", &self.ip_check_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let zone_id = get_secret("DDNS_ZONE_ID", &lookup).context(
            "DDNS_ZONE_ID is required. Set it via DDNS_ZONE_ID or DDNS_ZONE_ID_FILE",
        )?;
        let api_token = get_secret("DDNS_API_TOKEN", &lookup).context(
            "DDNS_API_TOKEN is required. Set it via DDNS_API_TOKEN or DDNS_API_TOKEN_FILE",
        )?;

        let domains = match (non_empty(lookup("DDNS_DOMAIN_FILE")), non_empty(lookup("DDNS_RECORDS"))) {
            (Some(path), _) => DomainSpec::File(PathBuf::from(path)),
            (None, Some(records)) => DomainSpec::Inline(records),
            (None, None) => anyhow::bail!(
                "No domains configured. Set DDNS_DOMAIN_FILE or DDNS_RECORDS=example.com,www.example.com"
            ),
        };

        let check_interval_secs = parse_check_interval(lookup("DDNS_CHECK_INTERVAL").as_deref());

        let ip_check_url = non_empty(lookup("DDNS_IP_CHECK_URL"))
            .unwrap_or_else(|| DEFAULT_IP_CHECK_URL.to_string());
        if !ip_check_url.starts_with("https://") && !ip_check_url.starts_with("http://") {
            anyhow::bail!(
                "DDNS_IP_CHECK_URL must use HTTP or HTTPS scheme. Got: {}",
                ip_check_url
            );
        }

        let dry_run = lookup("DDNS_MODE")
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("dry-run"));

        Ok(Self {
            zone_id,
            api_token,
            domains,
            check_interval_secs,
            ip_check_url,
            dry_run,
        })
    }
}

/// Read a secret, preferring the file named by `<NAME>_FILE`
///
/// The file wins when it exists and is readable; otherwise the plain
/// variable is used. Values are trimmed and blank values count as unset.
fn get_secret<F>(name: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = non_empty(lookup(&format!("{}_FILE", name))) {
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                if let Some(value) = non_empty(Some(contents)) {
                    return Some(value);
                }
                warn!("{}_FILE points to an empty file: {}", name, path);
            }
            Err(e) => warn!("Could not read {}_FILE ({}): {}", name, path, e),
        }
    }

    non_empty(lookup(name))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_log_level(raw: Option<&str>) -> Result<Level> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("info") => Ok(Level::INFO),
        Some("trace") => Ok(Level::TRACE),
        Some("debug") => Ok(Level::DEBUG),
        Some("warn") => Ok(Level::WARN),
        Some("error") => Ok(Level::ERROR),
        Some(other) => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            other
        ),
    }
}

fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    let log_level = match parse_log_level(env::var("DDNS_LOG_LEVEL").ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd daemon");
    debug!(?config, "Configuration loaded");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let (engine, events) = match build_engine(config) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(engine, events).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    })
    .into()
}

/// Assemble the engine from the daemon configuration
fn build_engine(config: Config) -> Result<(DdnsEngine, mpsc::Receiver<EngineEvent>)> {
    let domain_source = config.domains.into_source();
    let domains = domain_source
        .load()
        .with_context(|| format!("Failed to load domains from {}", domain_source.describe()))?;

    let dry_run = config.dry_run;
    let ddns_config = DdnsConfig {
        zone_id: config.zone_id,
        api_token: config.api_token,
        domains,
        ip_check_url: config.ip_check_url,
        engine: EngineConfig {
            check_interval_secs: config.check_interval_secs,
            ..EngineConfig::default()
        },
    };
    let (ip_source, provider) = build_clients(&ddns_config, dry_run)?;

    info!(
        "Monitoring {} domain(s) every {} seconds via {}",
        ddns_config.domain_set().len(),
        ddns_config.engine.check_interval_secs,
        ddns_config.ip_check_url
    );

    let (engine, events) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(MemoryRecordStore::new()),
        domain_source,
        ddns_config,
    )?;

    Ok((engine, events))
}

/// Build the IP source and provider from the resolved configuration
fn build_clients(config: &DdnsConfig, dry_run: bool) -> Result<(HttpIpSource, CloudflareProvider)> {
    let ip_source = HttpIpSource::new(config.ip_check_url.clone())?;
    let provider = CloudflareProvider::new(config.api_token.clone(), dry_run)?;
    Ok((ip_source, provider))
}

/// Run the engine until a shutdown signal arrives
async fn run_daemon(engine: DdnsEngine, mut events: mpsc::Receiver<EngineEvent>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signals = spawn_signal_handler(engine.reload_handle(), shutdown_tx)?;

    let monitor = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::PassCompleted { summary } => info!(
                    updated = summary.updated,
                    unchanged = summary.unchanged,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Check completed"
                ),
                other => debug!(event = ?other, "Engine event"),
            }
        }
    });

    let result = engine.run_with_shutdown(shutdown_rx).await;

    signals.abort();
    drop(engine);
    let _ = monitor.await;

    result?;
    info!("Shutting down daemon");
    Ok(())
}

/// Forward SIGHUP to the reload handle and SIGTERM/SIGINT to shutdown
#[cfg(unix)]
fn spawn_signal_handler(
    reload: ReloadHandle,
    shutdown_tx: oneshot::Sender<()>,
) -> Result<tokio::task::JoinHandle<()>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to setup SIGHUP handler")?;

    Ok(tokio::spawn(async move {
        let name = loop {
            tokio::select! {
                _ = sigterm.recv() => break "SIGTERM",
                _ = sigint.recv() => break "SIGINT",
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading domains");
                    reload.request();
                }
            }
        };

        info!("Received shutdown signal: {}", name);
        let _ = shutdown_tx.send(());
    }))
}

/// Forward Ctrl-C to shutdown
///
/// Fallback implementation for non-Unix platforms, where no reload signal
/// exists.
#[cfg(not(unix))]
fn spawn_signal_handler(
    _reload: ReloadHandle,
    shutdown_tx: oneshot::Sender<()>,
) -> Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
        let _ = shutdown_tx.send(());
    }))
}
