//! Layered error types for the holder indexer.
//!
//! This module provides a hierarchical error system:
//!
//! - [`DomainError`] - validation errors, always user-facing
//! - [`InfraError`] - infrastructure errors (database, serialization, config)
//! - [`IndexerError`] - RPC/indexing-loop error kinds that drive poller control flow
//! - [`AppError`] - application-level errors combining the three above
//! - [`ApiError`] - HTTP API errors with status codes
//!
//! # Error Philosophy
//!
//! - Domain errors are recoverable and user-facing
//! - Infrastructure errors are logged but details hidden from users
//! - `IndexerError::RateLimited`/`BlockRangeTooLarge`/`Transport` are handled
//!   locally by the poller and never reach an HTTP caller; `NegativeBalance`
//!   and `DatabaseUnavailable` are surfaced by structured log only
//! - The `Result` type alias uses `AppError` for application code

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Domain-level errors representing validation failures.
///
/// These errors are recoverable and should be shown to users.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomainError {
    /// Chain ID is not in the configured chain catalogue.
    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),

    /// Token address failed validation or is not tracked.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// `fromBlock` was not a valid non-negative integer.
    #[error("invalid from_block: {0}")]
    InvalidFromBlock(String),

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid amount (negative or malformed).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INFRASTRUCTURE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Infrastructure-level errors from external systems.
///
/// These errors are typically logged but their details are hidden from users.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InfraError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found in storage.
    #[error("resource not found")]
    NotFound,

    /// Connection pool exhausted.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INDEXER ERRORS (RPC / poll-loop control flow)
// ═══════════════════════════════════════════════════════════════════════════════

/// Error kinds the Chain Poller reacts to directly.
///
/// `RateLimited`, `BlockRangeTooLarge`, and `Transport` mirror
/// `evm_rpc::EvmRpcError` one-to-one (the poller maps across the crate
/// boundary); `NegativeBalance` and `DatabaseUnavailable` originate inside
/// this crate's own store layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IndexerError {
    /// The RPC endpoint asked us to slow down.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// How long to wait before retrying.
        retry_after: Duration,
    },

    /// The requested block span was rejected as too large; the span
    /// controller should shrink and retry.
    #[error("block range too large")]
    BlockRangeTooLarge,

    /// Any other RPC/transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Applying deltas would have driven a holder's balance negative.
    ///
    /// Fatal for the affected `(chain, token)`: the transaction aborts, the
    /// cursor is not advanced, and the token is quarantined.
    #[error(
        "negative balance for {address} on chain {chain_id} token {token}: \
         existing {existing} + delta {delta} < 0"
    )]
    NegativeBalance {
        /// Chain the violation was observed on.
        chain_id: u64,
        /// Token contract address (lower-hex).
        token: String,
        /// Holder whose balance would have gone negative.
        address: String,
        /// Balance on record before this delta.
        existing: String,
        /// Signed delta that caused the violation.
        delta: String,
    },

    /// The database is unreachable; retried with the same backoff as
    /// `Transport`.
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),
}

impl From<evm_rpc::EvmRpcError> for IndexerError {
    fn from(err: evm_rpc::EvmRpcError) -> Self {
        match err {
            evm_rpc::EvmRpcError::RateLimited { retry_after } => Self::RateLimited { retry_after },
            evm_rpc::EvmRpcError::BlockRangeTooLarge => Self::BlockRangeTooLarge,
            evm_rpc::EvmRpcError::Transport(msg) => Self::Transport(msg),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Application-level errors combining domain, infrastructure, and indexing
/// errors.
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure error.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Indexing-loop error kind.
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initialization error.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Graceful shutdown requested.
    #[error("shutdown requested")]
    ShutdownRequested,
}

/// Type alias for application Results.
pub type Result<T> = std::result::Result<T, AppError>;

// ═══════════════════════════════════════════════════════════════════════════════
// API ERRORS (HTTP-specific)
// ═══════════════════════════════════════════════════════════════════════════════

/// API-level errors with HTTP status codes.
///
/// These errors are converted to HTTP responses via [`IntoResponse`]. Only
/// `DomainError` variants and `BadRequest` are ever expected to reach a
/// caller; `IndexerError`/`InfraError` surface here only as an opaque 500
/// if something upstream of the HTTP layer slips.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Wrapped application error.
    #[error(transparent)]
    App(#[from] AppError),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::App(AppError::Domain(DomainError::UnsupportedChain(_))) => {
                (StatusCode::NOT_FOUND, "UNSUPPORTED_CHAIN", self.to_string())
            }

            Self::App(AppError::Domain(
                DomainError::InvalidToken(_)
                | DomainError::InvalidFromBlock(_)
                | DomainError::InvalidAddress(_)
                | DomainError::InvalidAmount(_),
            ))
            | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string()),

            // Indexer/infra errors should never reach the HTTP boundary per
            // the propagation policy; if one does, log and hide the detail.
            Self::App(
                AppError::Infra(_)
                | AppError::Indexer(_)
                | AppError::Config(_)
                | AppError::Initialization(_)
                | AppError::ShutdownRequested,
            ) => {
                tracing::error!(error = ?self, "internal error reached the API boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal error".into(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVENIENCE CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<crate::types::primitives::InvalidAddress> for DomainError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidAmount> for DomainError {
    fn from(err: crate::types::primitives::InvalidAmount) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidAddress> for AppError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::primitives::InvalidAmount> for AppError {
    fn from(err: crate::types::primitives::InvalidAmount) -> Self {
        Self::Domain(err.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
