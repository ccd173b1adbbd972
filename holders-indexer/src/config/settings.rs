//! Settings structs and loading logic.
//!
//! All settings have sensible defaults and can be overridden via
//! configuration files or environment variables. Per-chain knobs
//! (`INDEXER_MAX_SPAN_<chainId>`, `CHAIN_POLLER_MODE_<chainId>`, ...) are
//! layered on top of the deserialized chain catalogue in
//! [`Settings::apply_chain_env_overrides`], since the `config` crate has no
//! notion of "one env var per array element keyed by a field inside it".

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Static chain catalogue: one entry per EVM chain this deployment talks to.
    pub chains: Vec<ChainSettings>,
    /// Database configuration.
    pub database: DatabaseSettings,
    /// Indexer-wide tuning (not specific to any one chain).
    pub indexer: IndexerSettings,
    /// API server configuration.
    pub api: ApiSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Metrics configuration.
    pub metrics: MetricsSettings,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// Files are loaded in this order (later overrides earlier):
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (if exists)
    /// 3. Environment variables with `INDEXER_` prefix
    ///
    /// Per-chain overrides (`INDEXER_MAX_SPAN_<chainId>`,
    /// `CHAIN_POLLER_*_<chainId>`, ...) are then applied on top via
    /// [`Self::apply_chain_env_overrides`].
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration is invalid or cannot be loaded.
    pub fn load(environment: &str) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());

        let builder = Config::builder()
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout_ms", 5000)?
            .set_default("database.idle_timeout_ms", 600_000)?
            .set_default("indexer.initial_lookback_blocks", 50_000)?
            .set_default("indexer.backoff_ms", 1500)?
            .set_default("indexer.once", false)?
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080)?
            .set_default("api.request_timeout_ms", 30000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.file_path", Option::<String>::None)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.host", "0.0.0.0")?
            .set_default("metrics.port", 9090)?
            // Load default configuration file (chain catalogue normally lives here)
            .add_source(File::with_name(&format!("{config_dir}/default")).required(false))
            // Load environment-specific file
            .add_source(File::with_name(&format!("{config_dir}/{environment}")).required(false))
            // Override with environment variables (INDEXER_ prefix)
            .add_source(
                Environment::with_prefix("INDEXER")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut settings: Self = builder.build()?.try_deserialize()?;
        settings.apply_chain_env_overrides();
        Ok(settings)
    }

    /// Load settings from a specific file path.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut settings: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        settings.apply_chain_env_overrides();
        Ok(settings)
    }

    /// Apply the per-chain environment variable overrides documented in the
    /// configuration reference: `INDEXER_MAX_SPAN_<chainId>` (falling back to
    /// `INDEXER_MAX_SPAN_DEFAULT`), `INDEXER_QPS`,
    /// `CHAIN_POLLER_CONFIRMATIONS[_<chainId>]`,
    /// `CHAIN_POLLER_INTERVAL_MS[_<chainId>]`, `CHAIN_POLLER_MODE[_<chainId>]`,
    /// `CHAIN_POLLER_START_<chainId>`, `CHAIN_POLLER_TARGET_<chainId>`.
    ///
    /// Unset or unparseable variables leave the file-configured value as-is.
    pub fn apply_chain_env_overrides(&mut self) {
        let default_max_span = env_u64("INDEXER_MAX_SPAN_DEFAULT");
        let global_qps = env_u32("INDEXER_QPS");
        let global_confirmations = env_u64("CHAIN_POLLER_CONFIRMATIONS");
        let global_interval_ms = env_u64("CHAIN_POLLER_INTERVAL_MS");
        let global_mode = env_mode("CHAIN_POLLER_MODE");

        for chain in &mut self.chains {
            let id = chain.chain_id;

            if let Some(v) = env_u64(&format!("INDEXER_MAX_SPAN_{id}")).or(default_max_span) {
                chain.max_span = v;
            }
            if let Some(v) = global_qps.or_else(|| env_u32(&format!("INDEXER_QPS_{id}"))) {
                chain.qps = v;
            }
            if let Some(v) =
                env_u64(&format!("CHAIN_POLLER_CONFIRMATIONS_{id}")).or(global_confirmations)
            {
                chain.confirmations = v;
            }
            if let Some(v) =
                env_u64(&format!("CHAIN_POLLER_INTERVAL_MS_{id}")).or(global_interval_ms)
            {
                chain.poll_interval_ms = v;
            }
            if let Some(v) = env_mode(&format!("CHAIN_POLLER_MODE_{id}")).or(global_mode) {
                chain.mode = v;
            }
            if let Some(v) = env_u64(&format!("CHAIN_POLLER_START_{id}")) {
                chain.backfill_start = Some(v);
            }
            if let Some(v) = env_u64(&format!("CHAIN_POLLER_TARGET_{id}")) {
                chain.backfill_target = Some(v);
            }
        }
    }

    /// Validate settings and return any validation errors.
    ///
    /// # Errors
    /// Returns a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.chains.is_empty() {
            errors.push("chains must contain at least one entry".into());
        }
        for chain in &self.chains {
            if chain.rpc_url.is_empty() {
                errors.push(format!("chains[{}].rpc_url cannot be empty", chain.chain_id));
            }
            if chain.max_span == 0 {
                errors.push(format!("chains[{}].max_span must be non-zero", chain.chain_id));
            }
            if chain.qps == 0 {
                errors.push(format!("chains[{}].qps must be non-zero", chain.chain_id));
            }
        }

        if self.database.url.is_empty() {
            errors.push("database.url cannot be empty".into());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be non-zero".into());
        }
        if self.database.min_connections > self.database.max_connections {
            errors.push("database.min_connections cannot exceed max_connections".into());
        }

        if self.api.port == 0 {
            errors.push("api.port must be non-zero".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_mode(name: &str) -> Option<PollerMode> {
    std::env::var(name).ok().and_then(|v| match v.as_str() {
        "live" => Some(PollerMode::Live),
        "backfill" => Some(PollerMode::Backfill),
        _ => None,
    })
}

/// Per-chain poller mode: continuous tailing or one-shot backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerMode {
    /// Continuous tailing from the cursor to the confirmed chain tip.
    Live,
    /// One-shot pass over `[backfill_start, backfill_target]`.
    Backfill,
}

/// Static per-chain configuration, matching spec.md's `Chain` entity.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSettings {
    /// EVM chain ID.
    pub chain_id: u64,
    /// Human-readable name, for logs only.
    pub name: String,
    /// JSON-RPC HTTP endpoint.
    pub rpc_url: String,
    /// Block confirmations to wait before processing a block.
    pub confirmations: u64,
    /// Whether this chain is currently served by the query API.
    pub supported: bool,
    /// Per-endpoint request-rate floor, in requests per second.
    pub qps: u32,
    /// Span ceiling passed to the adaptive span controller.
    pub max_span: u64,
    /// Inter-poll sleep when no tracked token had work.
    pub poll_interval_ms: u64,
    /// `live` or `backfill`.
    pub mode: PollerMode,
    /// Starting block for a `backfill` run.
    pub backfill_start: Option<u64>,
    /// Inclusive target end block for a `backfill` run.
    pub backfill_target: Option<u64>,
}

impl ChainSettings {
    /// Get the poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
    /// Minimum connections to maintain.
    pub min_connections: u32,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle connection timeout in milliseconds.
    pub idle_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Get the connection timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Indexer-wide tuning that applies across every chain.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerSettings {
    /// Fallback start block when a token's cursor is null (`fromBlock = null`).
    pub initial_lookback_blocks: u64,
    /// Base backoff for non-ratelimit transport errors.
    pub backoff_ms: u64,
    /// Run one pass over every tracked token and exit, instead of looping.
    pub once: bool,
}

impl IndexerSettings {
    /// Get the backoff as a `Duration`.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl ApiSettings {
    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get the socket address string.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
    /// Optional file path for log output.
    pub file_path: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Host to bind metrics server to.
    pub host: String,
    /// Port for metrics server.
    pub port: u16,
}

impl MetricsSettings {
    /// Get the metrics socket address string.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
