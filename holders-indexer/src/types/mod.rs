//! Domain types for the holder indexer.
//!
//! This module contains all the core types used throughout the indexer:
//!
//! - [`primitives`] - Validated newtypes (`EthAddress`, `TokenAmount`, `SignedDelta`, `BlockNumber`)
//! - [`entities`] - Domain entities for database persistence

pub mod entities;
pub mod primitives;

// Re-export commonly used types at module level
pub use entities::{Chain, Holder, HolderBalance, HoldersPage, TrackedToken, Transfer};
pub use primitives::{BlockNumber, EthAddress, SignedDelta, TokenAmount};
