//! Configuration loading and validation for the holder indexer.
//!
//! Configuration is loaded from multiple sources in order of precedence:
//! 1. Per-chain environment variable overrides (highest)
//! 2. `INDEXER_`-prefixed environment variables
//! 3. Environment-specific file (e.g., `development.toml`)
//! 4. Default file (`default.toml`)
//!
//! # Example
//!
//! ```ignore
//! use holders_indexer::config::Settings;
//!
//! let settings = Settings::load("development")?;
//! println!("chains configured: {}", settings.chains.len());
//! ```

mod settings;

pub use settings::{
    ApiSettings, ChainSettings, DatabaseSettings, IndexerSettings, LoggingSettings,
    MetricsSettings, PollerMode, Settings,
};
