//! Holder listing query: keyset pagination and the first-page cache.
//!
//! Rank and `pct` are computed by the store's `list_holders_page` query
//! itself; this module only owns cursor encoding and the cache lookaround.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::error::{AppError, DomainError, Result};
use crate::ports::{HolderStore, HoldersCache};
use crate::types::entities::{HoldersPage, TrackedToken};
use crate::types::primitives::{EthAddress, TokenAmount};

/// Smallest page size a caller may request.
pub const MIN_LIMIT: u32 = 1;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;
/// Page size used when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 25;

/// Clamp a caller-supplied limit into `[MIN_LIMIT, MAX_LIMIT]`.
#[must_use]
pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Encode a `(balance, holder)` keyset cursor as an opaque string.
///
/// The format (`"<balance>:<holder-lowerhex>"`) is not documented as part
/// of the API; callers must treat it as opaque and round-trip it via
/// [`decode_cursor`].
#[must_use]
pub fn encode_cursor(balance: &TokenAmount, holder: &EthAddress) -> String {
    format!("{balance}:{}", holder.to_hex())
}

/// Decode a cursor produced by [`encode_cursor`].
///
/// # Errors
///
/// Returns [`DomainError::InvalidToken`] (reused here as the generic "bad
/// request parameter" domain error) if `cursor` is not in the expected
/// `balance:holder` shape.
pub fn decode_cursor(cursor: &str) -> Result<(TokenAmount, EthAddress)> {
    let (balance_str, holder_str) = cursor
        .split_once(':')
        .ok_or_else(|| AppError::Domain(DomainError::InvalidToken("malformed cursor".into())))?;

    let balance = BigDecimal::from_str(balance_str)
        .ok()
        .and_then(|v| TokenAmount::new(v).ok())
        .ok_or_else(|| AppError::Domain(DomainError::InvalidToken("malformed cursor balance".into())))?;

    let holder = EthAddress::from_hex(holder_str)
        .map_err(|e| AppError::Domain(DomainError::InvalidToken(e.to_string())))?;

    Ok((balance, holder))
}

/// Fetch one page of holders for `(chain_id, token)`.
///
/// `cursor`, if present, must decode via [`decode_cursor`]; `limit` should
/// already be clamped via [`clamp_limit`]. The cursor-less first page is
/// served from `cache` when present and not expired, and populated on a
/// cache miss.
///
/// # Errors
///
/// Propagates store errors, or a [`DomainError::InvalidToken`] if `cursor`
/// is malformed.
pub async fn get_token_holders(
    holder_store: &dyn HolderStore,
    cache: &dyn HoldersCache,
    tracked: Option<&TrackedToken>,
    chain_id: u64,
    token: EthAddress,
    cursor: Option<&str>,
    limit: Option<u32>,
) -> Result<HoldersPage> {
    let limit = clamp_limit(limit);
    let status = tracked.map_or("indexing", TrackedToken::status);

    if cursor.is_none() {
        if let Some(page) = cache.get(chain_id, &token) {
            return Ok(page);
        }
    }

    let after = cursor.map(decode_cursor).transpose()?;

    let items = holder_store
        .list_holders_page(chain_id, token, after, limit)
        .await?;

    let next_cursor = if items.len() as u32 == limit {
        items.last().map(|h| encode_cursor(&h.balance, &h.holder))
    } else {
        None
    };

    let page = HoldersPage {
        items,
        next_cursor,
        status: status.to_string(),
    };

    if cursor.is_none() {
        cache.set(chain_id, &token, page.clone());
    }

    Ok(page)
}
