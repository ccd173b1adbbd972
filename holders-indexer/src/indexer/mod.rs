//! Core indexing logic: decode logs, fold them into balance deltas, and
//! drive per-chain polling.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Chain Poller                             │
//! │                                                                 │
//! │  ┌──────────────────┐   ┌──────────────┐   ┌─────────────────┐ │
//! │  │  eth_getLogs     │──▶│   decoder    │──▶│   aggregator    │ │
//! │  │  (via evm-rpc)   │   │ (raw → typed)│   │ (typed → delta) │ │
//! │  └──────────────────┘   └──────────────┘   └────────┬────────┘ │
//! │           ▲                                          │          │
//! │           │ span::SpanController                     ▼          │
//! │           │ (adaptive batch sizing)           store::apply_deltas
//! │           │                                  + store::upsert_cursor
//! │           └──────────────── one transaction ───────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod aggregator;
mod decoder;
mod poller;
mod reindex;
mod span;

pub use aggregator::aggregate;
pub use decoder::{decode_transfer_log, decode_transfer_logs};
pub use poller::ChainPoller;
pub use reindex::{enqueue_reindex, ReindexRequest};
pub use span::{SpanController, MAX_SPAN_RETRIES, MIN_SPAN};
