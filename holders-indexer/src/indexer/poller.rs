//! Per-chain chain poller: live tailing and one-shot backfill.
//!
//! One [`ChainPoller`] runs per configured chain, wiring the RPC client,
//! decoder, delta aggregator, span controller, and store together. Within a
//! chain, tracked tokens are processed sequentially (round-robin) so span
//! learning stays monotonic and no two writers touch the same `(chain,
//! token)` row concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use evm_rpc::types::LogFilter;
use evm_rpc::{ClientConfig, EvmRpcClient, EvmRpcError};
use metrics::{counter, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::abi::erc20::Transfer as TransferEvent;
use crate::config::{ChainSettings, IndexerSettings, PollerMode};
use crate::error::{AppError, IndexerError, Result};
use crate::indexer::aggregator::aggregate;
use crate::indexer::decoder::decode_transfer_logs;
use crate::indexer::span::{SpanController, MAX_SPAN_RETRIES};
use crate::store::PostgresStore;
use crate::types::entities::TrackedToken;
use crate::types::primitives::BlockNumber;

/// Fixed inter-retry delay applied between shrink-and-retry attempts.
const RETRY_DELAY: Duration = Duration::from_millis(300);

/// One chain's polling worker.
#[derive(Debug)]
pub struct ChainPoller {
    chain: ChainSettings,
    rpc: EvmRpcClient,
    store: Arc<PostgresStore>,
    span: SpanController,
    indexer: IndexerSettings,
    shutdown: CancellationToken,
}

impl ChainPoller {
    /// Build a poller for `chain`, sharing `store` with every other chain's
    /// poller.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC client cannot be constructed (invalid
    /// QPS/timeout configuration).
    pub fn new(
        chain: ChainSettings,
        store: Arc<PostgresStore>,
        indexer: IndexerSettings,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let rpc = EvmRpcClient::with_config(
            chain.rpc_url.clone(),
            ClientConfig::new().with_qps(chain.qps),
        )
        .map_err(|e| AppError::Initialization(format!("evm rpc client for chain {}: {e}", chain.chain_id)))?;

        Ok(Self {
            chain,
            rpc,
            store,
            span: SpanController::new(),
            indexer,
            shutdown,
        })
    }

    /// Run this chain's poller to completion: `backfill` runs once and
    /// returns; `live` runs until the cancellation token fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the database becomes unreachable or chain
    /// configuration is invalid.
    #[instrument(skip(self), fields(chain_id = self.chain.chain_id))]
    pub async fn run(&self) -> Result<()> {
        match self.chain.mode {
            PollerMode::Live => self.run_live().await,
            PollerMode::Backfill => self.run_backfill().await,
        }
    }

    /// `live` runs until the cancellation token fires, except when
    /// `self.indexer.once` is set, in which case a single `poll_once` pass
    /// over every tracked token on this chain runs and the poller returns.
    async fn run_live(&self) -> Result<()> {
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }

            let did_work = self.poll_once().await?;

            if self.indexer.once {
                return Ok(());
            }

            if !did_work {
                tokio::select! {
                    () = tokio::time::sleep(self.chain.poll_interval()) => {}
                    () = self.shutdown.cancelled() => return Ok(()),
                }
            }
        }
    }

    async fn run_backfill(&self) -> Result<()> {
        let Some(start) = self.chain.backfill_start else {
            warn!(chain_id = self.chain.chain_id, "backfill mode with no start block configured, nothing to do");
            return Ok(());
        };
        let Some(target) = self.chain.backfill_target else {
            warn!(chain_id = self.chain.chain_id, "backfill mode with no target block configured, nothing to do");
            return Ok(());
        };

        let tokens = self.tracked_tokens_for_chain().await?;
        for mut token in tokens {
            if token.is_quarantined() {
                continue;
            }
            token.from_block.get_or_insert(BlockNumber::new(start));

            while token.from_block.is_some_and(|b| b.get() <= target) {
                if self.shutdown.is_cancelled() {
                    break;
                }
                // Each batch advances `token.from_block` so the next
                // iteration's `process_one_batch` scans forward instead of
                // re-scanning the same window.
                match self.process_one_batch(&token, BlockNumber::new(target)).await {
                    Ok(Some(new_cursor)) => token.from_block = Some(new_cursor),
                    Ok(None) => break,
                    Err(err) => {
                        warn!(chain_id = self.chain.chain_id, token = %token.token, error = %err, "backfill batch failed");
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    async fn tracked_tokens_for_chain(&self) -> Result<Vec<TrackedToken>> {
        use crate::ports::CursorStore;
        let all = self.store.list_tracked().await?;
        Ok(all.into_iter().filter(|t| t.chain_id == self.chain.chain_id).collect())
    }

    /// One live-loop iteration: process at most one batch for every tracked
    /// token on this chain. Returns whether any token had work to do.
    async fn poll_once(&self) -> Result<bool> {
        let Some(tip) = self.confirmed_tip().await? else {
            return Ok(false);
        };
        let tokens = self.tracked_tokens_for_chain().await?;

        let mut did_work = false;
        for token in tokens {
            if token.is_quarantined() {
                continue;
            }
            if let Some(()) = self.process_one_batch(&token, tip).await?.map(|_| ()) {
                did_work = true;
            }
        }
        Ok(did_work)
    }

    /// Fetch the confirmed tip, sleeping and retrying the same call across a
    /// rate-limit response rather than surfacing it to the caller. Returns
    /// `None` if shutdown was requested mid-retry.
    async fn confirmed_tip(&self) -> Result<Option<BlockNumber>> {
        loop {
            match self.rpc.get_block_number().await {
                Ok(tip) => return Ok(Some(BlockNumber::new(tip.saturating_sub(self.chain.confirmations)))),
                Err(EvmRpcError::RateLimited { retry_after }) => {
                    counter!("indexer_rate_limited_total", "chain_id" => self.chain.chain_id.to_string())
                        .increment(1);
                    warn!(
                        chain_id = self.chain.chain_id,
                        retry_after_ms = retry_after.as_millis(),
                        "rate limited fetching confirmed tip, retrying after backoff"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(retry_after) => {}
                        () = self.shutdown.cancelled() => return Ok(None),
                    }
                }
                Err(err) => return Err(IndexerError::from(err).into()),
            }
        }
    }

    /// Process one batch `[start, end]` for `token`, where `end` is chosen
    /// adaptively up to `tip`. Returns the new cursor position on success,
    /// or `None` if there was nothing to do (`start > tip`).
    #[instrument(skip(self, token), fields(chain_id = self.chain.chain_id, token = %token.token))]
    async fn process_one_batch(
        &self,
        token: &TrackedToken,
        tip: BlockNumber,
    ) -> Result<Option<BlockNumber>> {
        use crate::ports::{CursorStore, HolderStore};

        let start = token.from_block.map_or_else(
            || BlockNumber::new(tip.get().saturating_sub(self.indexer.initial_lookback_blocks).saturating_add(1)),
            |b| b,
        );

        if start.get() > tip.get() {
            return Ok(None);
        }

        let remaining = tip.get() - start.get() + 1;
        let mut span = self.span.initial_span(self.chain.chain_id, self.chain.max_span, remaining);
        let mut end = BlockNumber::new((start.get() + span - 1).min(tip.get()));
        let mut previous_span = None;
        let mut span_shrinks = 0u32;

        let started = Instant::now();

        // Unbounded: `BlockRangeTooLarge` is bounded separately by
        // `span_shrinks`/`previous_span` below. `RateLimited` and `Transport`
        // retry the same `[start, end]` window indefinitely (sleeping between
        // attempts) until they succeed or shutdown is requested.
        loop {
            if self.shutdown.is_cancelled() {
                return Ok(None);
            }

            let filter = LogFilter::new(start.get(), end.get())
                .with_address(token.token.into())
                .with_topics(vec![Some(TransferEvent::SIGNATURE_HASH)]);

            match self.rpc.get_logs(filter).await {
                Ok(logs) => {
                    let transfers = decode_transfer_logs(&logs);
                    let deltas = aggregate(&transfers);

                    let mut tx = self
                        .store
                        .pool()
                        .begin()
                        .await
                        .map_err(|e| IndexerError::DatabaseUnavailable(e.to_string()))?;

                    let apply_result = self
                        .store
                        .apply_deltas(&mut tx, self.chain.chain_id, token.token, &deltas)
                        .await;

                    match apply_result {
                        Ok(()) => {
                            self.store
                                .upsert_cursor(&mut tx, self.chain.chain_id, token.token, end)
                                .await?;
                            tx.commit()
                                .await
                                .map_err(|e| IndexerError::DatabaseUnavailable(e.to_string()))?;

                            self.span.remember(self.chain.chain_id, span);
                            let chain_label = self.chain.chain_id.to_string();
                            counter!("indexer_batches_total", "chain_id" => chain_label.clone()).increment(1);
                            counter!("indexer_transfers_total", "chain_id" => chain_label)
                                .increment(transfers.len() as u64);
                            histogram!("indexer_batch_duration_ms")
                                .record(started.elapsed().as_millis() as f64);
                            info!(
                                chain_id = self.chain.chain_id,
                                token = %token.token,
                                from = start.get(),
                                to = end.get(),
                                span,
                                logs = logs.len(),
                                transfers = transfers.len(),
                                duration_ms = started.elapsed().as_millis(),
                                "batch applied"
                            );
                            return Ok(Some(end.next()));
                        }
                        Err(AppError::Indexer(IndexerError::NegativeBalance { .. })) => {
                            drop(tx);
                            let message = "negative balance detected; token quarantined".to_string();
                            let mut quarantine_tx = self
                                .store
                                .pool()
                                .begin()
                                .await
                                .map_err(|e| IndexerError::DatabaseUnavailable(e.to_string()))?;
                            self.store
                                .mark_quarantined(&mut quarantine_tx, self.chain.chain_id, token.token, &message)
                                .await?;
                            quarantine_tx
                                .commit()
                                .await
                                .map_err(|e| IndexerError::DatabaseUnavailable(e.to_string()))?;
                            counter!("indexer_quarantined_tokens_total", "chain_id" => self.chain.chain_id.to_string())
                                .increment(1);
                            return Ok(None);
                        }
                        Err(other) => return Err(other),
                    }
                }
                Err(EvmRpcError::BlockRangeTooLarge) => {
                    span_shrinks += 1;
                    if span_shrinks >= MAX_SPAN_RETRIES {
                        return Err(IndexerError::BlockRangeTooLarge.into());
                    }
                    let shrunk = self.span.shrink(self.chain.chain_id, span, self.chain.max_span, remaining);
                    if previous_span == Some(shrunk) {
                        return Err(IndexerError::BlockRangeTooLarge.into());
                    }
                    previous_span = Some(shrunk);
                    span = shrunk;
                    end = BlockNumber::new((start.get() + span - 1).min(tip.get()));
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(EvmRpcError::RateLimited { retry_after }) => {
                    counter!("indexer_rate_limited_total", "chain_id" => self.chain.chain_id.to_string())
                        .increment(1);
                    warn!(
                        chain_id = self.chain.chain_id,
                        token = %token.token,
                        retry_after_ms = retry_after.as_millis(),
                        "rate limited, retrying same batch after backoff"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(retry_after) => {}
                        () = self.shutdown.cancelled() => return Ok(None),
                    }
                }
                Err(EvmRpcError::Transport(msg)) => {
                    warn!(chain_id = self.chain.chain_id, token = %token.token, error = %msg, "transport error, retrying after backoff");
                    tokio::select! {
                        () = tokio::time::sleep(self.indexer.backoff()) => {}
                        () = self.shutdown.cancelled() => return Ok(None),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chain() -> ChainSettings {
        ChainSettings {
            chain_id: 1,
            name: "test".into(),
            rpc_url: "http://localhost:1".into(),
            confirmations: 10,
            supported: true,
            qps: 5,
            max_span: 2000,
            poll_interval_ms: 5000,
            mode: PollerMode::Live,
            backfill_start: None,
            backfill_target: None,
        }
    }

    #[test]
    fn retry_delay_is_three_hundred_ms() {
        assert_eq!(RETRY_DELAY, Duration::from_millis(300));
    }

    #[test]
    fn chain_settings_roundtrip_through_sample() {
        let chain = sample_chain();
        assert_eq!(chain.chain_id, 1);
        assert_eq!(chain.max_span, 2000);
    }
}
