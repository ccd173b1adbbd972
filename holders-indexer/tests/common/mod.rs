//! Common test infrastructure: a disposable `PostgreSQL` container plus
//! fixture builders for domain entities.

pub mod fixtures;
