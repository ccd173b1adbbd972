//! Port definitions for dependency injection and testability.
//!
//! Ports are trait definitions that describe what the domain layer needs.
//! Following hexagonal architecture, adapters (in the infrastructure layer)
//! implement these traits to provide concrete functionality.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Layer                            │
//! │                                                                 │
//! │  Uses ports (traits) to define what it needs                   │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐                              │
//! │  │ CursorStore │  │ HolderStore │                              │
//! │  └──────┬──────┘  └──────┬──────┘                              │
//! │         │                │                                     │
//! └─────────┼────────────────┼─────────────────────────────────────┘
//!           │                │
//!           ▼                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Infrastructure Layer                        │
//! │                                                                 │
//! │  ┌──────────────────────────────────────────┐                  │
//! │  │   PostgresStore (implements both)          │                  │
//! │  └──────────────────────────────────────────┘                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Port Categories
//!
//! | Category | Ports | Purpose |
//! |----------|-------|---------|
//! | Storage | [`CursorStore`], [`HolderStore`] | Data persistence |
//! | Caching | [`HoldersCache`] | First-page read caching |
//! | Time | [`Clock`] | Testable time operations |
//!
//! # Usage
//!
//! ```ignore
//! use holders_indexer::ports::{CursorStore, HolderStore, Clock, SystemClock};
//!
//! // Application code depends on traits, not implementations
//! async fn poll_once<C: CursorStore, H: HolderStore, Clk: Clock>(
//!     cursor_store: &C,
//!     holder_store: &H,
//!     clock: &Clk,
//! ) -> Result<()> {
//!     let now = clock.now();
//!     // ...
//!     Ok(())
//! }
//!
//! // In production, use the Postgres adapter
//! let store = PostgresStore::new(pool);
//! let clock = SystemClock;
//!
//! // In tests, use fakes
//! let clock = FakeClock::new(fixed_time);
//! ```

mod cache;
mod clock;
mod store;

// Re-export all port traits
pub use cache::{CacheStats, HoldersCache};
pub use clock::{Clock, SystemClock};
pub use store::{CursorStore, HolderStore};

// Re-export test utilities for tests and downstream crates using test-utils feature
#[cfg(any(test, feature = "test-utils"))]
pub use clock::FakeClock;
