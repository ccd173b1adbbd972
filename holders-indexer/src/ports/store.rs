//! Storage port traits for data persistence.
//!
//! These traits define the contract for persisting and retrieving
//! domain entities. Infrastructure adapters implement these traits
//! using concrete storage backends (e.g., PostgreSQL).

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::error::Result;
use crate::types::entities::{Holder, TrackedToken};
use crate::types::primitives::{BlockNumber, EthAddress, SignedDelta, TokenAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// CURSOR STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for tracked-token cursor persistence.
///
/// Handles the per-`(chain, token)` indexing progress record. The write
/// path (`upsert_cursor`) is transaction-scoped rather than `&self`-only:
/// the Chain Poller composes it with [`HolderStore::apply_deltas`] inside
/// one transaction so the cursor and balances always commit together.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Index on `(chain_id, token)` for fast lookups
/// - Never advance the cursor in a transaction that did not also apply the
///   matching deltas
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// List every tracked token, across all chains, in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn list_tracked(&self) -> Result<Vec<TrackedToken>>;

    /// Get the cursor row for `(chain_id, token)`, if registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn get_cursor(&self, chain_id: u64, token: EthAddress) -> Result<Option<TrackedToken>>;

    /// Advance `from_block`/`to_block` to `(to_block + 1, to_block)` within
    /// `tx`.
    ///
    /// Callers MUST commit `tx` only after also calling
    /// [`HolderStore::apply_deltas`] with the deltas for the same batch, so
    /// the two writes are atomic (spec property P4).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn upsert_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        chain_id: u64,
        token: EthAddress,
        to_block: BlockNumber,
    ) -> Result<()>;

    /// Insert the token if absent; otherwise set `from_block := from_block
    /// .or(existing.from_block)` and leave `to_block` untouched. Clears any
    /// `quarantined_error` on the row, since an admin-triggered reindex is
    /// the documented recovery path out of quarantine.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn enqueue_reindex(
        &self,
        chain_id: u64,
        token: EthAddress,
        from_block: Option<BlockNumber>,
    ) -> Result<()>;

    /// Mark a token quarantined with the given error message, within `tx`.
    ///
    /// Called from a follow-up transaction after the batch transaction that
    /// hit `NegativeBalance` has already rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn mark_quarantined(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        chain_id: u64,
        token: EthAddress,
        message: &str,
    ) -> Result<()>;

    /// Clear a token's quarantine marker without otherwise touching its cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn clear_quarantine(&self, chain_id: u64, token: EthAddress) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOLDER STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for holder-balance persistence.
///
/// `apply_deltas` is transaction-scoped for the same reason as
/// [`CursorStore::upsert_cursor`]: it must commit atomically with the
/// cursor advance. Implementations lock the affected rows with
/// `SELECT … FOR UPDATE` (or serialisable isolation) before applying
/// deltas, per the concurrency model.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Treat a missing row as a zero balance
/// - Delete rows that settle to exactly zero, or leave them (readers must
///   filter to `balance > 0` either way)
#[async_trait]
pub trait HolderStore: Send + Sync {
    /// Apply a batch of signed balance deltas for `(chain_id, token)` within
    /// `tx`, per spec.md §4.F's five-step algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AppError::Indexer`] with
    /// [`crate::error::IndexerError::NegativeBalance`] if any holder's
    /// resulting balance would be negative; the caller must roll back `tx`
    /// in that case.
    async fn apply_deltas(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        chain_id: u64,
        token: EthAddress,
        deltas: &std::collections::BTreeMap<EthAddress, SignedDelta>,
    ) -> Result<()>;

    /// Current total supply for `(chain_id, token)`: the sum of every
    /// stored positive balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn total_supply(&self, chain_id: u64, token: EthAddress) -> Result<TokenAmount>;

    /// A single holder's current balance, or zero if no row exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn get_balance(
        &self,
        chain_id: u64,
        token: EthAddress,
        holder: EthAddress,
    ) -> Result<TokenAmount>;

    /// Paginated holders for `(chain_id, token)`, ordered by
    /// `(balance DESC, holder ASC)`, with `rank` and `pct` already computed.
    ///
    /// `after` is an exclusive `(balance, holder)` cursor; `limit` is
    /// assumed already clamped to `[1, 100]` by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn list_holders_page(
        &self,
        chain_id: u64,
        token: EthAddress,
        after: Option<(TokenAmount, EthAddress)>,
        limit: u32,
    ) -> Result<Vec<Holder>>;
}
