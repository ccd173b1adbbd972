//! Decode raw `eth_getLogs` results into domain [`Transfer`]s.

use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use tracing::debug;

use crate::abi::erc20::Transfer as TransferEvent;
use crate::types::entities::Transfer;
use crate::types::primitives::{BlockNumber, EthAddress, TokenAmount};

/// Decode a single `Transfer` event out of a raw log.
///
/// Returns `None` (and logs at debug level) for any log that isn't a
/// well-formed ERC20 `Transfer` — wrong topic count, undecodable data,
/// missing block metadata, or `removed` (reorged out of the canonical
/// chain). Malformed logs are dropped rather than treated as a hard error:
/// one unparseable log must never abort an otherwise-healthy batch.
#[must_use]
pub fn decode_transfer_log(log: &Log) -> Option<Transfer> {
    if log.removed {
        return None;
    }

    let token = EthAddress::new(log.address().into_array());

    let decoded = TransferEvent::decode_log(&log.inner).ok()?.data;

    let block_number = log.block_number?;
    let log_index = log.log_index?;

    Some(Transfer {
        token,
        from: EthAddress::new(decoded.from.into_array()),
        to: EthAddress::new(decoded.to.into_array()),
        value: TokenAmount::from_u256(decoded.value),
        block_number: BlockNumber::new(block_number),
        log_index,
    })
}

/// Decode every log in `logs`, dropping malformed entries and logging how
/// many were skipped.
pub fn decode_transfer_logs(logs: &[Log]) -> Vec<Transfer> {
    let mut out = Vec::with_capacity(logs.len());
    let mut skipped = 0usize;

    for log in logs {
        match decode_transfer_log(log) {
            Some(transfer) => out.push(transfer),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, total = logs.len(), "dropped malformed transfer logs");
    }

    out
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes, Log as PrimitiveLog, LogData};

    use super::*;

    fn empty_log(block_number: Option<u64>, log_index: Option<u64>) -> Log {
        Log {
            inner: PrimitiveLog {
                address: Address::ZERO,
                data: LogData::new(vec![], Bytes::new()).expect("valid log data"),
            },
            block_hash: None,
            block_number,
            block_timestamp: None,
            transaction_hash: None,
            transaction_index: None,
            log_index,
            removed: false,
        }
    }

    #[test]
    fn decode_transfer_log_rejects_malformed_data() {
        let log = empty_log(Some(1), Some(0));
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn decode_transfer_log_rejects_missing_block_number() {
        let log = empty_log(None, Some(0));
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn decode_transfer_log_rejects_removed_logs() {
        let mut log = empty_log(Some(1), Some(0));
        log.removed = true;
        assert!(decode_transfer_log(&log).is_none());
    }

    #[test]
    fn decode_transfer_logs_skips_malformed_entries() {
        let logs = vec![empty_log(Some(1), Some(0)), empty_log(Some(1), Some(1))];
        let decoded = decode_transfer_logs(&logs);
        assert!(decoded.is_empty());
    }
}
