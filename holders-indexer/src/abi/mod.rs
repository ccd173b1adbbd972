//! ABI bindings for tracked contracts.
//!
//! Type-safe Rust bindings for Solidity events using the `alloy::sol!`
//! macro. Currently just the one event the indexer decodes.
//!
//! # Usage
//!
//! ```ignore
//! use alloy::sol_types::SolEvent;
//! use holders_indexer::abi::erc20::Transfer;
//!
//! let event = Transfer::decode_log(&log.inner, true)?;
//! println!("{} -> {}: {}", event.from, event.to, event.value);
//! ```

pub mod erc20;

pub use erc20::Transfer;

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolEvent;

    use super::*;

    #[test]
    fn transfer_signature_string() {
        assert_eq!(Transfer::SIGNATURE, "Transfer(address,address,uint256)");
    }
}
