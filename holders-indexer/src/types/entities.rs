//! Domain entities for database persistence.
//!
//! These structs represent the application's core domain objects that are
//! persisted to the database. They differ from transient wire types (like
//! [`Transfer`]) in that they represent current state rather than a single
//! historical occurrence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::primitives::{BlockNumber, EthAddress, TokenAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// A configured EVM chain this indexer polls.
///
/// Chains are injected from configuration at startup; they are never
/// persisted as rows of their own, only referenced by `chain_id` from
/// [`TrackedToken`] and [`HolderBalance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// Numeric chain ID (e.g. 1 for Ethereum mainnet).
    pub chain_id: u64,
    /// Human-readable name, used in logs and error messages.
    pub name: String,
    /// Number of blocks below the tip considered final.
    pub confirmations: u64,
    /// Whether this chain is currently enabled for polling.
    pub supported: bool,
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Queries-per-second floor enforced against this chain's endpoint.
    pub qps: u32,
    /// Maximum block span this chain's RPC will accept for `eth_getLogs`
    /// before it starts rejecting requests as too large.
    pub max_span: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACKED TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// An ERC-20 token being indexed on a specific chain.
///
/// Identified by `(chain_id, token)`. `from_block` is the next block to
/// scan (`None` means "not yet started — apply the initial lookback
/// policy"); `to_block` is the last block successfully applied (`None`
/// means "indexing, no data yet"). After a successful batch,
/// `from_block = Some(to_block + 1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedToken {
    /// Chain this token lives on.
    pub chain_id: u64,
    /// Token contract address.
    pub token: EthAddress,
    /// Next block to scan, or `None` if indexing has not started.
    pub from_block: Option<BlockNumber>,
    /// Last block successfully applied, or `None` if no batch has landed yet.
    pub to_block: Option<BlockNumber>,
    /// Error message from the most recent `NegativeBalance` failure, if this
    /// token is quarantined. Cleared by a successful `EnqueueReindex`.
    pub quarantined_error: Option<String>,
    /// When this token was first registered.
    pub created_at: DateTime<Utc>,
    /// Last time the cursor advanced.
    pub updated_at: DateTime<Utc>,
}

impl TrackedToken {
    /// A quarantined token is skipped by the poll loop until a reindex clears it.
    #[must_use]
    pub const fn is_quarantined(&self) -> bool {
        self.quarantined_error.is_some()
    }

    /// `"ok"` once a batch has landed (`to_block` is set), `"indexing"` otherwise.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.to_block.is_some() {
            "ok"
        } else {
            "indexing"
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOLDER BALANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// A holder's current balance of a tracked token.
///
/// Identified by `(chain_id, token, holder)`. Rows with a zero balance MAY
/// be deleted by the writer but are never returned by the reader (I1–I3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderBalance {
    /// Chain this balance was observed on.
    pub chain_id: u64,
    /// Token contract address.
    pub token: EthAddress,
    /// Holder's wallet (or contract) address.
    pub holder: EthAddress,
    /// Current balance.
    pub balance: TokenAmount,
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOLDER (query projection)
// ═══════════════════════════════════════════════════════════════════════════════

/// A single row in a holders-listing response: a balance plus its derived
/// rank and percentage of total supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// Holder's wallet (or contract) address.
    pub holder: EthAddress,
    /// Current balance, as an exact decimal string.
    pub balance: TokenAmount,
    /// 1-based rank by descending balance among all holders of this token.
    pub rank: u64,
    /// Share of total supply as a decimal percentage string (e.g.
    /// `"55.555"`), carrying at least three significant fractional digits.
    /// `"0"` when total supply is zero.
    pub pct: String,
}

/// A page of [`Holder`] rows plus pagination/readiness metadata, the shape
/// returned by the holder query engine and cached for first-page reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldersPage {
    /// Holders in this page, ordered by `(balance DESC, holder ASC)`.
    pub items: Vec<Holder>,
    /// Opaque cursor for the next page, present iff exactly `limit` rows
    /// were returned.
    pub next_cursor: Option<String>,
    /// `"ok"` once the token has completed at least one batch, `"indexing"`
    /// otherwise.
    pub status: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFER (transient, never persisted as its own row)
// ═══════════════════════════════════════════════════════════════════════════════

/// A decoded ERC-20 `Transfer` event.
///
/// Transient: consumed by the delta aggregator within a single poll cycle
/// and never stored directly. `from == EthAddress::ZERO` is a mint,
/// `to == EthAddress::ZERO` is a burn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Token contract that emitted the event.
    pub token: EthAddress,
    /// Sender. The zero address marks a mint.
    pub from: EthAddress,
    /// Recipient. The zero address marks a burn.
    pub to: EthAddress,
    /// Raw on-chain amount.
    pub value: TokenAmount,
    /// Block the transfer was mined in.
    pub block_number: BlockNumber,
    /// Index of the log within the block.
    pub log_index: u64,
}

impl Transfer {
    /// A transfer is a mint if its source is the zero address.
    #[must_use]
    pub fn is_mint(&self) -> bool {
        self.from.is_zero()
    }

    /// A transfer is a burn if its destination is the zero address.
    #[must_use]
    pub fn is_burn(&self) -> bool {
        self.to.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> TrackedToken {
        TrackedToken {
            chain_id: 1,
            token: EthAddress::ZERO,
            from_block: Some(BlockNumber::new(101)),
            to_block: Some(BlockNumber::new(100)),
            quarantined_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn not_quarantined_by_default() {
        assert!(!sample_token().is_quarantined());
    }

    #[test]
    fn quarantined_when_error_set() {
        let mut token = sample_token();
        token.quarantined_error = Some("negative balance".to_string());
        assert!(token.is_quarantined());
    }

    #[test]
    fn status_ok_once_to_block_set() {
        assert_eq!(sample_token().status(), "ok");
    }

    #[test]
    fn status_indexing_without_to_block() {
        let mut token = sample_token();
        token.to_block = None;
        assert_eq!(token.status(), "indexing");
    }

    #[test]
    fn transfer_classifies_mint_and_burn() {
        let mint = Transfer {
            token: EthAddress::ZERO,
            from: EthAddress::ZERO,
            to: EthAddress::from_hex("0x1234567890123456789012345678901234567890").unwrap(),
            value: TokenAmount::zero(),
            block_number: BlockNumber::new(1),
            log_index: 0,
        };
        assert!(mint.is_mint());
        assert!(!mint.is_burn());

        let burn = Transfer {
            from: mint.to,
            to: EthAddress::ZERO,
            ..mint
        };
        assert!(burn.is_burn());
        assert!(!burn.is_mint());
    }
}
