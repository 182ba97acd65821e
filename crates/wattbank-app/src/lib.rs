//! Application-state aggregator for the WattBank prepaid energy tracker.
//!
//! [`App`] presents a single coherent snapshot of the account — credit
//! balance, today's usage, forecast, last sync, sensor link — and mediates
//! the two stateful user actions:
//!
//! - [`App::add_credit`] applies an optimistic in-memory balance update,
//!   durably appends the ledger transaction, and rolls the optimistic update
//!   back if the write fails.
//! - [`App::sync_now`] runs a round trip against a [`SyncEndpoint`] and
//!   records the sync time only on success.
//!
//! The snapshot is published through a `tokio::sync::watch` channel; UI
//! layers observe it with [`App::subscribe`] instead of reading ambient
//! global state.

mod config;
mod error;
mod rollup;
mod state;
mod sync;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use rollup::{bucket_kwh, bucket_layout, day_start_ms, window};
pub use state::{App, Snapshot};
pub use sync::{MockEndpoint, SyncEndpoint};
