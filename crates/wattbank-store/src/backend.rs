//! Capability-style storage backend.
//!
//! The application layer talks to storage through [`StoreBackend`], selected
//! once at startup: [`Store`] on platforms with a usable embedded database,
//! [`NullStore`] everywhere else (e.g. a web build). Call sites carry no
//! availability conditionals; against a [`NullStore`] every operation
//! short-circuits to its documented safe default and never errors.

use wattbank_types::{
    Alert, BluetoothConnection, CreditSource, CreditTransaction, EnergyRecord, NewAlert, SyncEvent,
};

use crate::error::Result;
use crate::patch::{AlertPatch, EnergyPatch, PairingPatch, SyncPatch, TransactionPatch};
use crate::store::Store;

/// Storage operations required by the application layer.
///
/// Mirrors the method groups on [`Store`]; see those for full contracts.
/// Reads of missing ids yield `Ok(None)`, updates and deletes of missing ids
/// are no-ops, and list queries order newest first with an id tie-break.
pub trait StoreBackend: Send {
    // Credit ledger
    fn append_transaction(
        &self,
        delta: f64,
        source: CreditSource,
        note: Option<&str>,
        ts: Option<i64>,
    ) -> Result<i64>;
    fn list_transactions(&self) -> Result<Vec<CreditTransaction>>;
    fn transaction(&self, id: i64) -> Result<Option<CreditTransaction>>;
    fn update_transaction(&self, id: i64, patch: &TransactionPatch) -> Result<()>;
    fn remove_transaction(&self, id: i64) -> Result<()>;
    fn balance(&self) -> Result<f64>;

    // Energy samples
    fn append_energy(&self, wh: i64, ts: Option<i64>) -> Result<i64>;
    fn list_energy(&self) -> Result<Vec<EnergyRecord>>;
    fn energy_in_range(&self, start: i64, end: i64) -> Result<Vec<EnergyRecord>>;
    fn energy_record(&self, id: i64) -> Result<Option<EnergyRecord>>;
    fn update_energy(&self, id: i64, patch: &EnergyPatch) -> Result<()>;
    fn remove_energy(&self, id: i64) -> Result<()>;

    // Alerts
    fn append_alert(&self, alert: &NewAlert) -> Result<i64>;
    fn list_alerts(&self) -> Result<Vec<Alert>>;
    fn alert(&self, id: i64) -> Result<Option<Alert>>;
    fn update_alert(&self, id: i64, patch: &AlertPatch) -> Result<()>;
    fn remove_alert(&self, id: i64) -> Result<()>;

    // Bluetooth pairings
    fn record_pairing(&self, name: &str, rssi: i32, connectable: bool) -> Result<i64>;
    fn list_pairings(&self) -> Result<Vec<BluetoothConnection>>;
    fn pairing(&self, id: i64) -> Result<Option<BluetoothConnection>>;
    fn update_pairing(&self, id: i64, patch: &PairingPatch) -> Result<()>;
    fn remove_pairing(&self, id: i64) -> Result<()>;

    // Sync history
    fn record_sync(&self, timestamp: i64) -> Result<i64>;
    fn list_sync_events(&self) -> Result<Vec<SyncEvent>>;
    fn sync_event(&self, id: i64) -> Result<Option<SyncEvent>>;
    fn update_sync_event(&self, id: i64, patch: &SyncPatch) -> Result<()>;
    fn remove_sync_event(&self, id: i64) -> Result<()>;
    fn last_synced(&self) -> Result<Option<i64>>;
}

impl StoreBackend for Store {
    fn append_transaction(
        &self,
        delta: f64,
        source: CreditSource,
        note: Option<&str>,
        ts: Option<i64>,
    ) -> Result<i64> {
        Store::append_transaction(self, delta, source, note, ts)
    }

    fn list_transactions(&self) -> Result<Vec<CreditTransaction>> {
        Store::list_transactions(self)
    }

    fn transaction(&self, id: i64) -> Result<Option<CreditTransaction>> {
        Store::transaction(self, id)
    }

    fn update_transaction(&self, id: i64, patch: &TransactionPatch) -> Result<()> {
        Store::update_transaction(self, id, patch)
    }

    fn remove_transaction(&self, id: i64) -> Result<()> {
        Store::remove_transaction(self, id)
    }

    fn balance(&self) -> Result<f64> {
        Store::balance(self)
    }

    fn append_energy(&self, wh: i64, ts: Option<i64>) -> Result<i64> {
        Store::append_energy(self, wh, ts)
    }

    fn list_energy(&self) -> Result<Vec<EnergyRecord>> {
        Store::list_energy(self)
    }

    fn energy_in_range(&self, start: i64, end: i64) -> Result<Vec<EnergyRecord>> {
        Store::energy_in_range(self, start, end)
    }

    fn energy_record(&self, id: i64) -> Result<Option<EnergyRecord>> {
        Store::energy_record(self, id)
    }

    fn update_energy(&self, id: i64, patch: &EnergyPatch) -> Result<()> {
        Store::update_energy(self, id, patch)
    }

    fn remove_energy(&self, id: i64) -> Result<()> {
        Store::remove_energy(self, id)
    }

    fn append_alert(&self, alert: &NewAlert) -> Result<i64> {
        Store::append_alert(self, alert)
    }

    fn list_alerts(&self) -> Result<Vec<Alert>> {
        Store::list_alerts(self)
    }

    fn alert(&self, id: i64) -> Result<Option<Alert>> {
        Store::alert(self, id)
    }

    fn update_alert(&self, id: i64, patch: &AlertPatch) -> Result<()> {
        Store::update_alert(self, id, patch)
    }

    fn remove_alert(&self, id: i64) -> Result<()> {
        Store::remove_alert(self, id)
    }

    fn record_pairing(&self, name: &str, rssi: i32, connectable: bool) -> Result<i64> {
        Store::record_pairing(self, name, rssi, connectable)
    }

    fn list_pairings(&self) -> Result<Vec<BluetoothConnection>> {
        Store::list_pairings(self)
    }

    fn pairing(&self, id: i64) -> Result<Option<BluetoothConnection>> {
        Store::pairing(self, id)
    }

    fn update_pairing(&self, id: i64, patch: &PairingPatch) -> Result<()> {
        Store::update_pairing(self, id, patch)
    }

    fn remove_pairing(&self, id: i64) -> Result<()> {
        Store::remove_pairing(self, id)
    }

    fn record_sync(&self, timestamp: i64) -> Result<i64> {
        Store::record_sync(self, timestamp)
    }

    fn list_sync_events(&self) -> Result<Vec<SyncEvent>> {
        Store::list_sync_events(self)
    }

    fn sync_event(&self, id: i64) -> Result<Option<SyncEvent>> {
        Store::sync_event(self, id)
    }

    fn update_sync_event(&self, id: i64, patch: &SyncPatch) -> Result<()> {
        Store::update_sync_event(self, id, patch)
    }

    fn remove_sync_event(&self, id: i64) -> Result<()> {
        Store::remove_sync_event(self, id)
    }

    fn last_synced(&self) -> Result<Option<i64>> {
        Store::last_synced(self)
    }
}

/// Sentinel backend for platforms without a usable embedded store.
///
/// Writes are accepted and discarded (returning id 0), reads return empty
/// lists, `None`, or zero. Nothing ever errors, so UI code needs no
/// per-call availability handling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl NullStore {
    /// Create a sentinel backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StoreBackend for NullStore {
    fn append_transaction(
        &self,
        _delta: f64,
        _source: CreditSource,
        _note: Option<&str>,
        _ts: Option<i64>,
    ) -> Result<i64> {
        Ok(0)
    }

    fn list_transactions(&self) -> Result<Vec<CreditTransaction>> {
        Ok(Vec::new())
    }

    fn transaction(&self, _id: i64) -> Result<Option<CreditTransaction>> {
        Ok(None)
    }

    fn update_transaction(&self, _id: i64, _patch: &TransactionPatch) -> Result<()> {
        Ok(())
    }

    fn remove_transaction(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    fn balance(&self) -> Result<f64> {
        Ok(0.0)
    }

    fn append_energy(&self, _wh: i64, _ts: Option<i64>) -> Result<i64> {
        Ok(0)
    }

    fn list_energy(&self) -> Result<Vec<EnergyRecord>> {
        Ok(Vec::new())
    }

    fn energy_in_range(&self, _start: i64, _end: i64) -> Result<Vec<EnergyRecord>> {
        Ok(Vec::new())
    }

    fn energy_record(&self, _id: i64) -> Result<Option<EnergyRecord>> {
        Ok(None)
    }

    fn update_energy(&self, _id: i64, _patch: &EnergyPatch) -> Result<()> {
        Ok(())
    }

    fn remove_energy(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    fn append_alert(&self, _alert: &NewAlert) -> Result<i64> {
        Ok(0)
    }

    fn list_alerts(&self) -> Result<Vec<Alert>> {
        Ok(Vec::new())
    }

    fn alert(&self, _id: i64) -> Result<Option<Alert>> {
        Ok(None)
    }

    fn update_alert(&self, _id: i64, _patch: &AlertPatch) -> Result<()> {
        Ok(())
    }

    fn remove_alert(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    fn record_pairing(&self, _name: &str, _rssi: i32, _connectable: bool) -> Result<i64> {
        Ok(0)
    }

    fn list_pairings(&self) -> Result<Vec<BluetoothConnection>> {
        Ok(Vec::new())
    }

    fn pairing(&self, _id: i64) -> Result<Option<BluetoothConnection>> {
        Ok(None)
    }

    fn update_pairing(&self, _id: i64, _patch: &PairingPatch) -> Result<()> {
        Ok(())
    }

    fn remove_pairing(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    fn record_sync(&self, _timestamp: i64) -> Result<i64> {
        Ok(0)
    }

    fn list_sync_events(&self) -> Result<Vec<SyncEvent>> {
        Ok(Vec::new())
    }

    fn sync_event(&self, _id: i64) -> Result<Option<SyncEvent>> {
        Ok(None)
    }

    fn update_sync_event(&self, _id: i64, _patch: &SyncPatch) -> Result<()> {
        Ok(())
    }

    fn remove_sync_event(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    fn last_synced(&self) -> Result<Option<i64>> {
        Ok(None)
    }
}
