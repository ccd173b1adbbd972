//! A small, generic EVM JSON-RPC client: `eth_blockNumber` and `eth_getLogs`
//! with classified errors and a per-endpoint queries-per-second floor.
//!
//! # Crate Relationships
//!
//! This is the lowest-level crate in the workspace:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Application layer (holders-indexer)                     │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  RPC layer (evm-rpc) ◄── YOU ARE HERE                    │
//! │  └─ Direct JSON-RPC access: eth_blockNumber, eth_getLogs  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use evm_rpc::{EvmRpcClient, types::LogFilter};
//!
//! let client = EvmRpcClient::new("https://rpc.example.com")?;
//! let tip = client.get_block_number().await?;
//! let logs = client.get_logs(LogFilter::new(tip - 1000, tip)).await?;
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T, EvmRpcError>`](error::Result). Errors
//! are classified once at the RPC boundary:
//!
//! ```ignore
//! match client.get_logs(filter).await {
//!     Ok(logs) => { /* success */ }
//!     Err(EvmRpcError::RateLimited { retry_after }) => { /* sleep and retry */ }
//!     Err(EvmRpcError::BlockRangeTooLarge) => { /* shrink and retry */ }
//!     Err(EvmRpcError::Transport(_)) => { /* log and back off */ }
//! }
//! ```
//!
//! # Modules
//!
//! - [`client`] - the main [`EvmRpcClient`] implementation
//! - [`config`] - configuration via [`ClientConfig`]
//! - [`types`] - request/response types
//! - [`error`] - classified error types

#![doc(html_root_url = "https://docs.rs/evm-rpc")]

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES
// ═══════════════════════════════════════════════════════════════════════════════

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

pub use client::EvmRpcClient;
pub use config::ClientConfig;
pub use error::{EvmRpcError, Result};
pub use types::LogFilter;

// ═══════════════════════════════════════════════════════════════════════════════
// CRATE INFO
// ═══════════════════════════════════════════════════════════════════════════════

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}
