//! Holders Indexer
//!
//! A multi-chain ERC-20 holder balance indexer: a set of per-chain
//! background workers that tail EVM-compatible chains, decode
//! `Transfer(address,address,uint256)` logs in bounded block windows,
//! fold them into signed balance deltas, and atomically apply those
//! deltas plus a cursor advance to a materialised per-chain, per-token
//! holder balance table served with cursor pagination.
//!
//! # Architecture
//!
//! The indexer follows a hexagonal architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        CHAIN POLLER                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │  eth_getLogs │─▶│   decoder    │─▶│  aggregator  │          │
//! │  └──────────────┘  └──────────────┘  └──────┬───────┘          │
//! │                                              │                  │
//! │              ┌───────────────────────────────┘                  │
//! │              ▼                                                  │
//! │       ┌──────────────┐              ┌──────────────┐   ┌─────┐ │
//! │       │    Store     │◀────────────▶│    Query     │──▶│Cache│ │
//! │       └──────────────┘              └──────────────┘   └─────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Domain types (entities, primitives)
//! - [`error`] - Layered error types
//! - [`config`] - Configuration loading and validation
//! - [`abi`] - ABI bindings for tracked contracts
//! - [`indexer`] - Decoding, delta aggregation, adaptive span, chain poller
//! - [`query`] - Holder listing query engine
//! - [`store`] - Data persistence (`PostgreSQL`, first-page cache)
//! - [`ports`] - Storage/cache/clock port traits
//! - [`api`] - REST API (admin reindex, holders query)
//!
//! # Getting Started
//!
//! ```bash
//! # Set up environment
//! cp .env.example .env
//! # Edit .env with your configuration
//!
//! # Run migrations
//! sqlx migrate run
//!
//! # Start the indexer
//! cargo run -- run
//! ```

pub mod abi;
pub mod api;
pub mod config;
pub mod error;
pub mod indexer;
pub mod ports;
pub mod query;
pub mod store;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().starts_with("0."));
    }
}
