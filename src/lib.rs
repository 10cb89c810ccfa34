//! Resumable, reorg-aware event scanner for EVM chains.
//!
//! Watches a single contract's event log for a schema of interest
//! (currently ERC-20 `Transfer`), walking forward from the contract's
//! creation block (or a saved cursor) up to one block behind the chain
//! tip, and persists every decoded event exactly once.
//!
//! # Architecture
//!
//! The scanner follows a hexagonal architecture: the algorithm in
//! [`scanner`] depends only on the [`ports::chain::ChainClient`] and
//! [`ports::store::ProgressStore`] traits, with concrete adapters plugged
//! in at the edges.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          SCANNER CORE                         │
//! │  ┌────────────────┐  ┌───────────────┐  ┌──────────────────┐ │
//! │  │ CreationLocator│  │  LogFetcher   │  │    ChunkSizer    │ │
//! │  └────────────────┘  └───────────────┘  └──────────────────┘ │
//! │                │              │                  │            │
//! │                └──────────────┼──────────────────┘            │
//! │                               ▼                                │
//! │                          Scanner (per segment)                 │
//! │                               │                                │
//! │                               ▼                                │
//! │                       ScanCoordinator (fan-out)                │
//! └───────────────┬───────────────────────────────┬────────────────┘
//!                 ▼                               ▼
//!          ChainClient (port)              ProgressStore (port)
//!                 │                               │
//!          AlloyChainClient               PostgresProgressStore
//! ```
//!
//! # Modules
//!
//! - [`types`] - domain types (block numbers, addresses, event schemas, cursors)
//! - [`error`] - layered error types
//! - [`config`] - configuration loading and validation
//! - [`abi`] - ABI bindings for decoded event schemas
//! - [`ports`] - `ChainClient`/`ProgressStore` trait boundaries
//! - [`scanner`] - the scan algorithm itself
//! - [`chain`] - the `alloy`-backed `ChainClient` adapter
//! - [`store`] - the `PostgreSQL`-backed `ProgressStore` adapter
//!
//! # Getting Started
//!
//! ```bash
//! cp .env.example .env
//! sqlx migrate run
//! cargo run -- scan --contract 0x... --event transfer
//! ```

#![doc(html_root_url = "https://docs.rs/evmscan")]

pub mod abi;
pub mod chain;
pub mod config;
pub mod error;
pub mod ports;
pub mod scanner;
pub mod store;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}
