//! Local SQLite persistence for WattBank credit and usage data.
//!
//! This crate owns the embedded store behind the prepaid energy tracker:
//! the append-only credit ledger, energy consumption samples, alerts,
//! Bluetooth pairing records, and sync history.
//!
//! # Layout
//!
//! - [`Store`] is the real SQLite-backed implementation; it opens the
//!   database once, ensures the schema, and exposes one group of methods
//!   per table.
//! - [`StoreBackend`] is the capability trait consumed by the application
//!   layer. [`NullStore`] is the no-op implementation selected on platforms
//!   without a usable embedded store; every operation against it returns a
//!   safe default instead of failing.
//! - Partial updates go through explicit change-set types ([`TransactionPatch`]
//!   and friends) rather than dynamic field maps.
//!
//! # Example
//!
//! ```no_run
//! use wattbank_store::Store;
//! use wattbank_types::CreditSource;
//!
//! let store = Store::open_default()?;
//! store.append_transaction(25.0, CreditSource::Manual, Some("top up"), None)?;
//! println!("balance: {}", store.balance()?);
//! # Ok::<(), wattbank_store::Error>(())
//! ```

mod backend;
mod error;
mod patch;
mod schema;
mod store;

pub use backend::{NullStore, StoreBackend};
pub use error::{Error, Result};
pub use patch::{AlertPatch, EnergyPatch, PairingPatch, SyncPatch, TransactionPatch};
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/wattbank/data.db`
/// - macOS: `~/Library/Application Support/wattbank/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\wattbank\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("wattbank")
        .join("data.db")
}
