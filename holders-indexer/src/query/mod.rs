//! Read-side query engine for the holders API.

mod holders;

pub use holders::{
    clamp_limit, decode_cursor, encode_cursor, get_token_holders, DEFAULT_LIMIT, MAX_LIMIT,
    MIN_LIMIT,
};
