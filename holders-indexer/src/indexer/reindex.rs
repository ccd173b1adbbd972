//! Validate and enqueue admin-triggered reindex requests.

use crate::error::{AppError, DomainError, Result};
use crate::ports::CursorStore;
use crate::types::primitives::{BlockNumber, EthAddress};

/// A validated reindex request, ready to be enqueued.
#[derive(Debug, Clone)]
pub struct ReindexRequest {
    /// Chain to reindex on.
    pub chain_id: u64,
    /// Token contract address.
    pub token: EthAddress,
    /// Optional block to rewind `fromBlock` to; `None` leaves it untouched.
    pub from_block: Option<BlockNumber>,
}

/// Validate a raw admin request and, if it checks out, persist it via
/// [`CursorStore::enqueue_reindex`].
///
/// `supported_chain_ids` is the static chain catalogue's set of known chain
/// IDs; a request for any other chain is rejected with
/// [`DomainError::UnsupportedChain`].
///
/// # Errors
///
/// Returns [`DomainError::UnsupportedChain`] if `chain_id` is not in
/// `supported_chain_ids`, [`DomainError::InvalidToken`] if `token` is not a
/// well-formed address, or propagates whatever the store returns.
pub async fn enqueue_reindex(
    store: &dyn CursorStore,
    supported_chain_ids: &[u64],
    chain_id: u64,
    token: &str,
    from_block: Option<u64>,
) -> Result<ReindexRequest> {
    if !supported_chain_ids.contains(&chain_id) {
        return Err(AppError::Domain(DomainError::UnsupportedChain(chain_id)));
    }

    let token = EthAddress::from_hex(token)
        .map_err(|e| AppError::Domain(DomainError::InvalidToken(e.to_string())))?;

    let from_block = from_block.map(BlockNumber::new);

    store.enqueue_reindex(chain_id, token, from_block).await?;

    Ok(ReindexRequest { chain_id, token, from_block })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use sqlx::{Postgres, Transaction};

    use super::*;
    use crate::types::entities::TrackedToken;

    #[derive(Default)]
    struct RecordingStore {
        enqueued: std::sync::Mutex<Vec<(u64, EthAddress, Option<BlockNumber>)>>,
    }

    #[async_trait]
    impl CursorStore for RecordingStore {
        async fn list_tracked(&self) -> Result<Vec<TrackedToken>> {
            Ok(Vec::new())
        }

        async fn get_cursor(
            &self,
            _chain_id: u64,
            _token: EthAddress,
        ) -> Result<Option<TrackedToken>> {
            Ok(None)
        }

        async fn upsert_cursor(
            &self,
            _tx: &mut Transaction<'_, Postgres>,
            _chain_id: u64,
            _token: EthAddress,
            _to_block: BlockNumber,
        ) -> Result<()> {
            Ok(())
        }

        async fn enqueue_reindex(
            &self,
            chain_id: u64,
            token: EthAddress,
            from_block: Option<BlockNumber>,
        ) -> Result<()> {
            self.enqueued
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((chain_id, token, from_block));
            Ok(())
        }

        async fn mark_quarantined(
            &self,
            _tx: &mut Transaction<'_, Postgres>,
            _chain_id: u64,
            _token: EthAddress,
            _message: &str,
        ) -> Result<()> {
            Ok(())
        }

        async fn clear_quarantine(&self, _chain_id: u64, _token: EthAddress) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_chain() {
        let store = RecordingStore::default();
        let result = enqueue_reindex(&store, &[1, 137], 999, "0x0000000000000000000000000000000000000001", None).await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::UnsupportedChain(999)))
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_token() {
        let store = RecordingStore::default();
        let result = enqueue_reindex(&store, &[1], 1, "not-an-address", None).await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InvalidToken(_)))
        ));
    }

    #[tokio::test]
    async fn enqueues_valid_request() {
        let store = RecordingStore::default();
        let result = enqueue_reindex(
            &store,
            &[1],
            1,
            "0x0000000000000000000000000000000000000001",
            Some(100),
        )
        .await;

        assert!(result.is_ok());
        let enqueued = store.enqueued.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(enqueued.len(), 1);
        assert_eq!(enqueued[0].0, 1);
        assert_eq!(enqueued[0].2, Some(BlockNumber::new(100)));
    }
}
