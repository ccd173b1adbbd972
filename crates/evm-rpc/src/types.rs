//! Request and response types for the EVM JSON-RPC methods this client uses.
//!
//! This module defines the data structures used for `eth_blockNumber` and
//! `eth_getLogs` calls: [`LogFilter`] for the request side, and the internal
//! JSON-RPC envelope types shared by both calls.

use alloy::primitives::{Address, B256};
use alloy::rpc::types::Log;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// LOG FILTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Filter parameters for `eth_getLogs`.
///
/// # Example
///
/// ```
/// use evm_rpc::types::LogFilter;
///
/// let filter = LogFilter::new(100, 200);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Starting block (hex string like `"0x100"`).
    pub from_block: String,

    /// Ending block (hex string like `"0x200"`).
    pub to_block: String,

    /// Optional contract address to filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Topic filters; each element is a single topic or `None` for wildcard.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    /// Create a filter for a block range with no address/topic constraints.
    #[must_use]
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block: format!("0x{from_block:x}"),
            to_block: format!("0x{to_block:x}"),
            address: None,
            topics: Vec::new(),
        }
    }

    /// Constrain the filter to a single contract address.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Constrain the filter to the given topics, in order.
    #[must_use]
    pub fn with_topics(mut self, topics: Vec<Option<B256>>) -> Self {
        self.topics = topics;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG RESPONSE
// ═══════════════════════════════════════════════════════════════════════════════

/// Response body for `eth_getLogs`: a plain array of logs.
pub type LogsResponse = Vec<Log>;

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNAL JSON-RPC ENVELOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
}

impl<'a, P: Serialize> JsonRpcRequest<'a, P> {
    pub fn new(method: &'a str, params: P, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// JSON-RPC response envelope for extracting result or error.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    pub id: u64,
    pub result: Option<T>,
    pub error: Option<crate::error::RpcErrorDetail>,
}
