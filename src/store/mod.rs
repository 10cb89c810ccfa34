//! Data persistence layer (adapter for the [`crate::ports::store::ProgressStore`] port).
//!
//! The primary implementation uses `PostgreSQL` via `SQLx`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   PostgresProgressStore                          │
//! │   ┌──────────────────┐  ┌──────────────────┐                     │
//! │   │   scan_cursors   │  │  decoded_events   │                     │
//! │   └──────────────────┘  └──────────────────┘                     │
//! │                               │                                  │
//! │                               ▼                                  │
//! │                    SQLx Connection Pool                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use evmscan::store::PostgresProgressStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! let pool = PgPoolOptions::new()
//!     .max_connections(10)
//!     .connect("postgres://localhost/evmscan")
//!     .await?;
//!
//! sqlx::migrate!("./migrations").run(&pool).await?;
//!
//! let store = PostgresProgressStore::new(pool);
//! ```
//!
//! # Migrations
//!
//! Migrations are located in `migrations/` and run via `sqlx migrate run`.

mod postgres;

pub use postgres::PostgresProgressStore;

pub use sqlx::postgres::PgPool;
