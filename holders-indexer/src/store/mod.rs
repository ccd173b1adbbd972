//! Data persistence layer (adapters for store ports).
//!
//! This module provides the concrete implementation of the store ports
//! defined in [`crate::ports::store`], backed by `PostgreSQL` via SQLx.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Store Adapter                             │
//! │                                                                 │
//! │   ┌──────────────────────────────────────────────────────────┐  │
//! │   │                  PostgresStore                            │  │
//! │   │   ┌──────────────────┐        ┌──────────────────┐        │  │
//! │   │   │   CursorStore    │        │   HolderStore     │        │  │
//! │   │   │ (tracked_tokens) │        │ (token_holders)   │        │  │
//! │   │   └──────────────────┘        └──────────────────┘        │  │
//! │   └──────────────────────────────────────────────────────────┘  │
//! │                               │                                  │
//! │                               ▼                                  │
//! │   ┌──────────────────────────────────────────────────────────┐  │
//! │   │              SQLx Connection Pool (PostgreSQL)             │  │
//! │   └──────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use holders_indexer::store::PostgresStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! let pool = PgPoolOptions::new()
//!     .max_connections(10)
//!     .connect("postgres://localhost/holders")
//!     .await?;
//!
//! sqlx::migrate!("./migrations").run(&pool).await?;
//!
//! let store = PostgresStore::new(pool);
//! let cursor = store.get_cursor(1, token).await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and run via `PostgresStore::run_migrations`
//! (or `sqlx migrate run` directly).

mod cache;
mod postgres;

pub use cache::TtlHoldersCache;
pub use postgres::PostgresStore;

// Re-export commonly used types for convenience
pub use sqlx::postgres::PgPool;
