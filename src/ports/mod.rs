//! Port definitions for dependency injection and testability.
//!
//! Ports are trait definitions that describe what the scanner needs from
//! the outside world. Following hexagonal architecture, adapters (in the
//! infrastructure layer) implement these traits to provide concrete
//! functionality.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Scanner Layer                            │
//! │                                                                 │
//! │  Uses ports (traits) to define what it needs                    │
//! │                                                                 │
//! │       ┌─────────────┐          ┌─────────────┐                  │
//! │       │ ChainClient │          │ProgressStore│                  │
//! │       └──────┬──────┘          └──────┬──────┘                  │
//! └──────────────┼────────────────────────┼───────────────────────┘
//!                ▼                        ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Infrastructure Layer                        │
//! │                                                                 │
//! │   AlloyChainClient               PostgresProgressStore          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use evmscan::ports::{ChainClient, ProgressStore};
//!
//! async fn scan_once<C: ChainClient, S: ProgressStore>(chain: &C, store: &S) -> Result<()> {
//!     let cursor = store.load_cursor(address, schema).await?;
//!     let tip = chain.latest_block().await?;
//!     // ...
//!     Ok(())
//! }
//! ```

mod chain;
mod store;

pub use chain::ChainClient;
pub use store::ProgressStore;
