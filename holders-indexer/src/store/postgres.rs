//! `PostgreSQL` implementation of the store ports using SQLx.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::{FromRow, Postgres, Transaction, postgres::PgPool};
use tracing::{debug, instrument, warn};

use crate::error::{AppError, IndexerError, InfraError, Result};
use crate::ports::{CursorStore, HolderStore};
use crate::types::entities::{Holder, TrackedToken};
use crate::types::primitives::{BlockNumber, EthAddress, SignedDelta, TokenAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// POSTGRES STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// `PostgreSQL`-based store implementation.
///
/// Implements both [`CursorStore`] and [`HolderStore`] over one connection
/// pool, so the Chain Poller can compose `upsert_cursor` and `apply_deltas`
/// into a single transaction (spec property P4) while holding only one
/// store handle.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new `PostgreSQL` store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InfraError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CURSOR STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct TrackedTokenRow {
    chain_id: i64,
    token: Vec<u8>,
    from_block: Option<i64>,
    to_block: Option<i64>,
    quarantined_error: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<TrackedTokenRow> for TrackedToken {
    type Error = InfraError;

    #[allow(clippy::cast_sign_loss)]
    fn try_from(row: TrackedTokenRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            chain_id: row.chain_id as u64,
            token: EthAddress::from_slice(&row.token).map_err(|_| {
                InfraError::Database(sqlx::Error::Decode(
                    "invalid token address in tracked_tokens".into(),
                ))
            })?,
            from_block: row.from_block.map(|b| BlockNumber::new(b as u64)),
            to_block: row.to_block.map(|b| BlockNumber::new(b as u64)),
            quarantined_error: row.quarantined_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TRACKED_TOKEN_COLUMNS: &str =
    "chain_id, token, from_block, to_block, quarantined_error, created_at, updated_at";

#[async_trait]
impl CursorStore for PostgresStore {
    #[instrument(skip(self))]
    async fn list_tracked(&self) -> Result<Vec<TrackedToken>> {
        let rows = sqlx::query_as::<_, TrackedTokenRow>(&format!(
            "SELECT {TRACKED_TOKEN_COLUMNS} FROM tracked_tokens ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        rows.into_iter()
            .map(|r| TrackedToken::try_from(r).map_err(Into::into))
            .collect()
    }

    #[instrument(skip(self), fields(chain_id = chain_id, token = %token))]
    async fn get_cursor(&self, chain_id: u64, token: EthAddress) -> Result<Option<TrackedToken>> {
        let row = sqlx::query_as::<_, TrackedTokenRow>(&format!(
            "SELECT {TRACKED_TOKEN_COLUMNS} FROM tracked_tokens WHERE chain_id = $1 AND token = $2"
        ))
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        row.map(TrackedToken::try_from)
            .transpose()
            .map_err(Into::into)
    }

    #[instrument(skip(self, tx), fields(chain_id = chain_id, token = %token, to_block = to_block.value()))]
    async fn upsert_cursor(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        chain_id: u64,
        token: EthAddress,
        to_block: BlockNumber,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE tracked_tokens
            SET from_block = $3, to_block = $4, updated_at = NOW()
            WHERE chain_id = $1 AND token = $2
            ",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .bind(i64::from(to_block.next()))
        .bind(i64::from(to_block))
        .execute(&mut **tx)
        .await
        .map_err(InfraError::Database)?;

        if result.rows_affected() == 0 {
            return Err(InfraError::NotFound.into());
        }

        debug!("cursor advanced");
        Ok(())
    }

    #[instrument(skip(self), fields(chain_id = chain_id, token = %token))]
    async fn enqueue_reindex(
        &self,
        chain_id: u64,
        token: EthAddress,
        from_block: Option<BlockNumber>,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO tracked_tokens (chain_id, token, from_block, to_block, quarantined_error, created_at, updated_at)
            VALUES ($1, $2, $3, NULL, NULL, NOW(), NOW())
            ON CONFLICT (chain_id, token) DO UPDATE SET
                from_block = COALESCE(EXCLUDED.from_block, tracked_tokens.from_block),
                quarantined_error = NULL,
                updated_at = NOW()
            ",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .bind(from_block.map(i64::from))
        .execute(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        debug!("reindex enqueued");
        Ok(())
    }

    #[instrument(skip(self, tx, message), fields(chain_id = chain_id, token = %token))]
    async fn mark_quarantined(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        chain_id: u64,
        token: EthAddress,
        message: &str,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE tracked_tokens
            SET quarantined_error = $3, updated_at = NOW()
            WHERE chain_id = $1 AND token = $2
            ",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .bind(message)
        .execute(&mut **tx)
        .await
        .map_err(InfraError::Database)?;

        warn!(chain_id, token = %token, error = message, "token quarantined");
        Ok(())
    }

    #[instrument(skip(self), fields(chain_id = chain_id, token = %token))]
    async fn clear_quarantine(&self, chain_id: u64, token: EthAddress) -> Result<()> {
        sqlx::query(
            r"
            UPDATE tracked_tokens
            SET quarantined_error = NULL, updated_at = NOW()
            WHERE chain_id = $1 AND token = $2
            ",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .execute(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOLDER STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct HolderBalanceRow {
    balance: BigDecimal,
}

#[derive(Debug, FromRow)]
struct RankedHolderRow {
    holder: Vec<u8>,
    balance: BigDecimal,
    rnk: i64,
}

/// `balance / total * 100`, formatted with at least three significant
/// fractional digits, or `"0"` if `total` is zero.
///
/// A fixed six-digit scale is enough for any holder with an ordinary share,
/// but a dust holder of a huge-supply token can have a `pct` whose first
/// nonzero fractional digit sits well past the sixth place — a fixed scale
/// would round it down to `"0.000000"`, losing every significant digit.
/// `significant_pct_scale` widens the scale to reach past that holder's
/// leading zeros.
fn compute_pct(balance: &TokenAmount, total: &TokenAmount) -> String {
    if total.is_zero() {
        return "0".to_string();
    }
    let pct = balance.as_decimal() / total.as_decimal() * BigDecimal::from(100);
    let scale = significant_pct_scale(&pct);
    pct.with_scale(scale).to_string()
}

/// Smallest scale that shows at least three significant fractional digits
/// of `pct`, never less than six.
fn significant_pct_scale(pct: &BigDecimal) -> i64 {
    const MIN_SCALE: i64 = 6;
    const MIN_SIGNIFICANT_DIGITS: i64 = 3;

    if pct.is_zero() {
        return MIN_SCALE;
    }

    // `pct == digits * 10^-scale`; when `scale > digit_count` the value is
    // below 1 and `scale - digit_count` counts the leading zeros between the
    // decimal point and the first significant digit.
    let (digits, scale) = pct.as_bigint_and_exponent();
    let digit_count = digits.to_string().trim_start_matches('-').len() as i64;
    let leading_zeros = (scale - digit_count).max(0);

    MIN_SCALE.max(leading_zeros + MIN_SIGNIFICANT_DIGITS)
}

#[async_trait]
impl HolderStore for PostgresStore {
    #[instrument(skip(self, tx, deltas), fields(chain_id = chain_id, token = %token, count = deltas.len()))]
    async fn apply_deltas(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        chain_id: u64,
        token: EthAddress,
        deltas: &BTreeMap<EthAddress, SignedDelta>,
    ) -> Result<()> {
        // BTreeMap iterates in ascending address order, so every writer locks
        // rows in the same order and cross-batch deadlocks can't happen.
        for (holder, delta) in deltas {
            if delta.is_zero() {
                continue;
            }

            let existing_row = sqlx::query_as::<_, HolderBalanceRow>(
                r"
                SELECT balance FROM token_holders
                WHERE chain_id = $1 AND token = $2 AND holder = $3
                FOR UPDATE
                ",
            )
            .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
            .bind(token.as_slice())
            .bind(holder.as_slice())
            .fetch_optional(&mut **tx)
            .await
            .map_err(InfraError::Database)?;

            let existing = existing_row
                .as_ref()
                .map_or_else(TokenAmount::zero, |r| TokenAmount::from_bigdecimal(&r.balance));

            let new_balance = existing.apply_delta(delta).map_err(|_| {
                AppError::Indexer(IndexerError::NegativeBalance {
                    chain_id,
                    token: token.to_hex(),
                    address: holder.to_hex(),
                    existing: existing.to_string(),
                    delta: format!("{delta:?}"),
                })
            })?;

            if new_balance.is_zero() {
                sqlx::query(
                    "DELETE FROM token_holders WHERE chain_id = $1 AND token = $2 AND holder = $3",
                )
                .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
                .bind(token.as_slice())
                .bind(holder.as_slice())
                .execute(&mut **tx)
                .await
                .map_err(InfraError::Database)?;
            } else {
                sqlx::query(
                    r"
                    INSERT INTO token_holders (chain_id, token, holder, balance)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (chain_id, token, holder) DO UPDATE SET
                        balance = EXCLUDED.balance
                    ",
                )
                .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
                .bind(token.as_slice())
                .bind(holder.as_slice())
                .bind(new_balance.to_bigdecimal())
                .execute(&mut **tx)
                .await
                .map_err(InfraError::Database)?;
            }
        }

        debug!("deltas applied");
        Ok(())
    }

    #[instrument(skip(self), fields(chain_id = chain_id, token = %token))]
    async fn total_supply(&self, chain_id: u64, token: EthAddress) -> Result<TokenAmount> {
        let total: Option<BigDecimal> = sqlx::query_scalar(
            "SELECT SUM(balance) FROM token_holders WHERE chain_id = $1 AND token = $2",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .fetch_one(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        Ok(total.map_or_else(TokenAmount::zero, |t| TokenAmount::from_bigdecimal(&t)))
    }

    #[instrument(skip(self), fields(chain_id = chain_id, token = %token, holder = %holder))]
    async fn get_balance(
        &self,
        chain_id: u64,
        token: EthAddress,
        holder: EthAddress,
    ) -> Result<TokenAmount> {
        let row = sqlx::query_as::<_, HolderBalanceRow>(
            "SELECT balance FROM token_holders WHERE chain_id = $1 AND token = $2 AND holder = $3",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .bind(holder.as_slice())
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        Ok(row.map_or_else(TokenAmount::zero, |r| TokenAmount::from_bigdecimal(&r.balance)))
    }

    #[instrument(skip(self), fields(chain_id = chain_id, token = %token, limit = limit))]
    async fn list_holders_page(
        &self,
        chain_id: u64,
        token: EthAddress,
        after: Option<(TokenAmount, EthAddress)>,
        limit: u32,
    ) -> Result<Vec<Holder>> {
        let total = self.total_supply(chain_id, token).await?;

        let (after_balance, after_holder) = match after {
            Some((b, h)) => (Some(b.to_bigdecimal()), Some(h.as_slice().to_vec())),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, RankedHolderRow>(
            r"
            WITH ranked AS (
                SELECT
                    holder,
                    balance,
                    RANK() OVER (ORDER BY balance DESC, holder ASC) AS rnk
                FROM token_holders
                WHERE chain_id = $1 AND token = $2 AND balance > 0
            )
            SELECT holder, balance, rnk
            FROM ranked
            WHERE ($3::numeric IS NULL AND $4::bytea IS NULL)
               OR balance < $3
               OR (balance = $3 AND holder > $4)
            ORDER BY balance DESC, holder ASC
            LIMIT $5
            ",
        )
        .bind(i64::try_from(chain_id).unwrap_or(i64::MAX))
        .bind(token.as_slice())
        .bind(after_balance)
        .bind(after_holder)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::Database)?;

        rows.into_iter()
            .map(|row| {
                let holder = EthAddress::from_slice(&row.holder).map_err(|_| {
                    InfraError::Database(sqlx::Error::Decode(
                        "invalid holder address in token_holders".into(),
                    ))
                })?;
                let balance = TokenAmount::from_bigdecimal(&row.balance);
                let pct = compute_pct(&balance, &total);
                #[allow(clippy::cast_sign_loss)]
                let rank = row.rnk as u64;
                Ok(Holder { holder, balance, rank, pct })
            })
            .collect::<std::result::Result<Vec<_>, InfraError>>()
            .map_err(Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // Full integration tests require a live PostgreSQL database and live in
    // tests/store_integration.rs.

    #[test]
    fn postgres_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresStore>();
    }

    #[test]
    fn compute_pct_zero_total_is_zero() {
        assert_eq!(
            compute_pct(&TokenAmount::parse("100").unwrap(), &TokenAmount::zero()),
            "0"
        );
    }

    #[test]
    fn compute_pct_full_share_is_hundred() {
        let amount = TokenAmount::parse("1000").unwrap();
        assert_eq!(compute_pct(&amount, &amount), "100.000000");
    }

    #[test]
    fn compute_pct_has_at_least_three_fractional_digits() {
        let pct = compute_pct(
            &TokenAmount::parse("500").unwrap(),
            &TokenAmount::parse("900").unwrap(),
        );
        let fractional = pct.split('.').nth(1).unwrap_or_default();
        assert!(fractional.len() >= 3);
        assert!(pct.starts_with("55.555"));
    }

    #[test]
    fn compute_pct_widens_scale_for_a_dust_holder_of_a_huge_supply_token() {
        // balance 1 against a total of 10^30: pct = 1e-28, whose first
        // nonzero fractional digit sits at the 28th decimal place. A fixed
        // six-digit scale would round this all the way down to zero.
        let balance = TokenAmount::parse("1").unwrap();
        let total = TokenAmount::parse(&format!("1{}", "0".repeat(30))).unwrap();

        let pct = compute_pct(&balance, &total);
        let fractional = pct.split('.').nth(1).unwrap_or_default();
        let leading_zeros = fractional.chars().take_while(|c| *c == '0').count();
        let significant = fractional.len() - leading_zeros;

        assert_ne!(pct, "0.000000");
        assert!(significant >= 3, "expected >=3 significant fractional digits, got {pct}");
    }
}
