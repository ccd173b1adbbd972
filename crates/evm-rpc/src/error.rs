//! Error types for the EVM JSON-RPC client.
//!
//! This module provides a comprehensive error hierarchy for RPC operations:
//!
//! - [`EvmRpcError`] - the primary error type for all client operations
//! - [`RpcErrorDetail`] - the `{code, message, data}` shape of a JSON-RPC error body
//!
//! # Error Philosophy
//!
//! Errors are classified once at the RPC boundary into a small tagged set a
//! caller can act on programmatically, rather than threaded around as raw
//! strings or status codes.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`EvmRpcError`].
pub type Result<T> = std::result::Result<T, EvmRpcError>;

/// Default floor applied to a rate-limit retry delay when the server gives
/// none, or gives one shorter than this.
pub const RETRY_AFTER_FLOOR: Duration = Duration::from_secs(1);

/// Errors that can occur when using the EVM RPC client.
///
/// # Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|----------------|
/// | Rate limit | `RateLimited` | HTTP 429/503, JSON-RPC -32005/-32016 |
/// | Range rejection | `BlockRangeTooLarge` | HTTP 413, JSON-RPC -32062/-32602, "range"/"too large" message |
/// | Everything else | `Transport` | network errors, timeouts, malformed JSON |
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvmRpcError {
    /// The endpoint rejected the request due to rate limiting.
    ///
    /// `retry_after` is the server's hint (if any), floored at
    /// [`RETRY_AFTER_FLOOR`].
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// How long to wait before retrying.
        retry_after: Duration,
    },

    /// The requested block range was rejected as too large for the endpoint.
    #[error("block range too large")]
    BlockRangeTooLarge,

    /// Any other transport-level failure: connection refused, timeout,
    /// malformed JSON, or an RPC error that doesn't match a known kind.
    #[error("transport error: {0}")]
    Transport(String),
}

impl EvmRpcError {
    /// Classify an HTTP status code and optional `Retry-After` header.
    #[must_use]
    pub fn from_http_status(status: u16, retry_after: Option<Duration>) -> Option<Self> {
        match status {
            429 | 503 => Some(Self::RateLimited {
                retry_after: retry_after
                    .unwrap_or(RETRY_AFTER_FLOOR)
                    .max(RETRY_AFTER_FLOOR),
            }),
            413 => Some(Self::BlockRangeTooLarge),
            _ => None,
        }
    }

    /// Classify a JSON-RPC `{code, message}` error body.
    #[must_use]
    pub fn from_rpc_error(code: i64, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if code == -32005 || code == -32016 {
            return Self::RateLimited {
                retry_after: RETRY_AFTER_FLOOR,
            };
        }
        if code == -32062
            || code == -32602
            || lower.contains("range")
            || lower.contains("too large")
            || lower.contains("-32062")
            || lower.contains("-32602")
        {
            return Self::BlockRangeTooLarge;
        }
        Self::Transport(format!("rpc error ({code}): {message}"))
    }
}

impl From<reqwest::Error> for EvmRpcError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for EvmRpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("malformed response: {err}"))
    }
}

/// Detailed information from a JSON-RPC error response, used internally for
/// parsing server error bodies before classification.
#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct RpcErrorDetail {
    /// JSON-RPC error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data (unused, kept for completeness).
    #[serde(default)]
    #[allow(dead_code)]
    pub data: Option<serde_json::Value>,
}

impl RpcErrorDetail {
    /// Classify this detail into an [`EvmRpcError`].
    pub fn into_error(self) -> EvmRpcError {
        EvmRpcError::from_rpc_error(self.code, &self.message)
    }
}

impl fmt::Display for RpcErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC error ({}): {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_codes() {
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32005, "limit exceeded"),
            EvmRpcError::RateLimited { .. }
        ));
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32016, "limit exceeded"),
            EvmRpcError::RateLimited { .. }
        ));
    }

    #[test]
    fn classifies_range_too_large_codes_and_message() {
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32062, "x"),
            EvmRpcError::BlockRangeTooLarge
        ));
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32602, "x"),
            EvmRpcError::BlockRangeTooLarge
        ));
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32000, "query returned more than range limit"),
            EvmRpcError::BlockRangeTooLarge
        ));
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32000, "block range too large"),
            EvmRpcError::BlockRangeTooLarge
        ));
    }

    #[test]
    fn unrecognized_rpc_error_is_transport() {
        assert!(matches!(
            EvmRpcError::from_rpc_error(-32000, "internal error"),
            EvmRpcError::Transport(_)
        ));
    }

    #[test]
    fn http_status_classification() {
        assert!(matches!(
            EvmRpcError::from_http_status(429, None),
            Some(EvmRpcError::RateLimited { .. })
        ));
        assert!(matches!(
            EvmRpcError::from_http_status(503, Some(Duration::from_secs(5))),
            Some(EvmRpcError::RateLimited { retry_after }) if retry_after == Duration::from_secs(5)
        ));
        assert!(matches!(
            EvmRpcError::from_http_status(413, None),
            Some(EvmRpcError::BlockRangeTooLarge)
        ));
        assert!(EvmRpcError::from_http_status(200, None).is_none());
    }

    #[test]
    fn retry_after_is_floored() {
        match EvmRpcError::from_http_status(429, Some(Duration::from_millis(10))) {
            Some(EvmRpcError::RateLimited { retry_after }) => {
                assert_eq!(retry_after, RETRY_AFTER_FLOOR);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
