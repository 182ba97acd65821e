//! Shared types for the WattBank prepaid energy tracker.
//!
//! This crate holds the entity types persisted by `wattbank-store` and
//! consumed by the application layer: credit-ledger transactions, energy
//! consumption samples, alerts, Bluetooth pairing records, and sync events.
//! It is deliberately free of storage or async dependencies so every layer
//! can share it.
//!
//! # Units
//!
//! Energy is stored as **integer watt-hours** everywhere in this workspace.
//! Conversion to kilowatt-hours happens only at presentation boundaries via
//! [`wh_to_kwh`]. Timestamps are **epoch milliseconds** (`i64`).

mod error;
mod types;

pub use error::ParseError;
pub use types::{
    Alert, AlertKind, BluetoothConnection, CreditSource, CreditTransaction, EnergyRecord,
    HistoryRange, NewAlert, Severity, SyncEvent,
};

/// Convert stored watt-hours to kilowatt-hours for display.
#[must_use]
pub fn wh_to_kwh(wh: i64) -> f64 {
    wh as f64 / 1000.0
}

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 60 * 60 * 1000;
