//! ABI binding for the standard ERC20 `Transfer` event.
//!
//! # Solidity Contract
//!
//! ```solidity
//! interface IERC20 {
//!     event Transfer(address indexed from, address indexed to, uint256 value);
//! }
//! ```

use alloy::sol;

sol! {
    /// Standard ERC20 transfer event.
    ///
    /// `from` is the zero address for mints, `to` is the zero address for
    /// burns.
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(
        address indexed from,
        address indexed to,
        uint256 value
    );
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolEvent;

    use super::*;

    #[test]
    fn transfer_signature() {
        assert_eq!(Transfer::SIGNATURE, "Transfer(address,address,uint256)");
    }
}
