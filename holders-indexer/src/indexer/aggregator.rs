//! Fold a batch of transfers into net per-holder balance deltas.

use std::collections::BTreeMap;

use crate::types::entities::Transfer;
use crate::types::primitives::{EthAddress, SignedDelta};

/// Fold `transfers` into one signed delta per holder address.
///
/// The zero address itself is never credited or debited: a mint's `from`
/// and a burn's `to` are both the zero address, and this function only
/// tracks balances of real holders. A holder whose credits and debits
/// within this batch net to exactly zero is omitted entirely, not kept as
/// an explicit zero entry.
#[must_use]
pub fn aggregate(transfers: &[Transfer]) -> BTreeMap<EthAddress, SignedDelta> {
    let mut deltas: BTreeMap<EthAddress, SignedDelta> = BTreeMap::new();

    for transfer in transfers {
        if !transfer.from.is_zero() {
            *deltas.entry(transfer.from).or_insert_with(SignedDelta::zero) +=
                SignedDelta::debit(&transfer.value);
        }
        if !transfer.to.is_zero() {
            *deltas.entry(transfer.to).or_insert_with(SignedDelta::zero) +=
                SignedDelta::credit(&transfer.value);
        }
    }

    deltas.retain(|_, delta| !delta.is_zero());
    deltas
}

#[cfg(test)]
mod tests {
    use crate::types::primitives::{BlockNumber, TokenAmount};

    use super::*;

    fn addr(byte: u8) -> EthAddress {
        EthAddress::new([byte; 20])
    }

    fn amount(value: u64) -> TokenAmount {
        TokenAmount::new(value.into()).expect("non-negative")
    }

    fn transfer(from: EthAddress, to: EthAddress, value: u64) -> Transfer {
        Transfer {
            token: addr(0xAA),
            from,
            to,
            value: amount(value),
            block_number: BlockNumber::new(1),
            log_index: 0,
        }
    }

    #[test]
    fn mint_only_credits_recipient() {
        let transfers = vec![transfer(EthAddress::ZERO, addr(1), 100)];
        let deltas = aggregate(&transfers);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas.get(&addr(1)), Some(&SignedDelta::credit(&amount(100))));
    }

    #[test]
    fn burn_only_debits_sender() {
        let transfers = vec![transfer(addr(1), EthAddress::ZERO, 40)];
        let deltas = aggregate(&transfers);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas.get(&addr(1)), Some(&SignedDelta::debit(&amount(40))));
    }

    #[test]
    fn ordinary_transfer_debits_sender_and_credits_recipient() {
        let transfers = vec![transfer(addr(1), addr(2), 30)];
        let deltas = aggregate(&transfers);

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas.get(&addr(1)), Some(&SignedDelta::debit(&amount(30))));
        assert_eq!(deltas.get(&addr(2)), Some(&SignedDelta::credit(&amount(30))));
    }

    #[test]
    fn repeated_transfers_net_out_to_a_single_delta_per_holder() {
        let transfers = vec![
            transfer(addr(1), addr(2), 30),
            transfer(addr(2), addr(1), 10),
        ];
        let deltas = aggregate(&transfers);

        assert_eq!(deltas.len(), 2);
        // addr(1): -30 + 10 = -20
        assert_eq!(deltas.get(&addr(1)), Some(&SignedDelta::debit(&amount(20))));
        // addr(2): +30 - 10 = +20
        assert_eq!(deltas.get(&addr(2)), Some(&SignedDelta::credit(&amount(20))));
    }

    #[test]
    fn empty_batch_yields_empty_deltas() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn net_zero_holder_is_omitted_from_the_map() {
        let transfers = vec![
            transfer(addr(1), addr(2), 50),
            transfer(addr(2), addr(1), 50),
        ];
        let deltas = aggregate(&transfers);

        assert!(deltas.is_empty());
    }

    #[test]
    fn net_zero_only_omits_the_balanced_holder() {
        let transfers = vec![
            transfer(addr(1), addr(2), 50),
            transfer(addr(2), addr(1), 50),
            transfer(EthAddress::ZERO, addr(3), 10),
        ];
        let deltas = aggregate(&transfers);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas.get(&addr(3)), Some(&SignedDelta::credit(&amount(10))));
    }
}
