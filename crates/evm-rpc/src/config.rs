//! Configuration for the EVM RPC client.
//!
//! This module provides [`ClientConfig`] for customizing client behavior:
//! request timeout and the per-endpoint queries-per-second floor.
//!
//! # Example
//!
//! ```
//! use evm_rpc::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::default()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_qps(5);
//! ```

use std::time::Duration;

use crate::error::{EvmRpcError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default timeout for HTTP requests to the RPC endpoint.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default queries-per-second floor when no per-chain override is configured.
pub const DEFAULT_QPS: u32 = 10;

/// Minimum allowed timeout.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum allowed timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

// ═══════════════════════════════════════════════════════════════════════════════
// CLIENT CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration options for [`EvmRpcClient`](crate::EvmRpcClient).
///
/// Use the builder pattern to customize settings:
///
/// ```
/// use evm_rpc::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_qps(20);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout for HTTP calls.
    ///
    /// Default: 30 seconds. Range: 1-300 seconds.
    pub timeout: Duration,

    /// Queries-per-second floor enforced between consecutive requests on
    /// this client.
    ///
    /// Default: 10.
    pub qps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            qps: DEFAULT_QPS,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the queries-per-second floor.
    #[must_use]
    pub fn with_qps(mut self, qps: u32) -> Self {
        self.qps = qps;
        self
    }

    /// The minimum delay between consecutive requests implied by `qps`.
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        let qps = self.qps.max(1);
        Duration::from_millis((1000u64).div_ceil(u64::from(qps)))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvmRpcError::Transport`] if the timeout is out of range or
    /// `qps` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.timeout < MIN_TIMEOUT {
            return Err(EvmRpcError::Transport(format!(
                "timeout must be at least {MIN_TIMEOUT:?}"
            )));
        }
        if self.timeout > MAX_TIMEOUT {
            return Err(EvmRpcError::Transport(format!(
                "timeout must be at most {MAX_TIMEOUT:?}"
            )));
        }
        if self.qps == 0 {
            return Err(EvmRpcError::Transport("qps must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.qps, DEFAULT_QPS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_qps(20);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.qps, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn min_delay_rounds_up() {
        assert_eq!(
            ClientConfig::new().with_qps(3).min_delay(),
            Duration::from_millis(334)
        );
        assert_eq!(
            ClientConfig::new().with_qps(1000).min_delay(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn validate_rejects_zero_qps() {
        let config = ClientConfig::new().with_qps(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_timeout_bounds() {
        assert!(ClientConfig::new()
            .with_timeout(Duration::from_millis(500))
            .validate()
            .is_err());
        assert!(ClientConfig::new()
            .with_timeout(Duration::from_secs(600))
            .validate()
            .is_err());
    }
}
