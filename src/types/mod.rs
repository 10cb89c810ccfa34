//! Domain types for the event scanner.
//!
//! - [`primitives`] - Validated newtypes (`EthAddress`, `BlockNumber`, `DecimalU256`)
//! - [`schema`] - Scanner-specific types (`EventSchema`, `RawLog`, `DecodedEvent`,
//!   `LogQuery`, `ScanCursor`, `BlockHeader`)

pub mod primitives;
pub mod schema;

pub use primitives::{BlockNumber, DecimalU256, EthAddress};
pub use schema::{
    BlockHeader, DecodedEvent, EventSchema, LogQuery, RawLog, ScanCursor, UnknownEventSchema,
};
