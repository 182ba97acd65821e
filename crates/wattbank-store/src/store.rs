//! Main store implementation.

use std::path::Path;
use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension, ToSql};
use tracing::{debug, info};

use wattbank_types::{
    Alert, BluetoothConnection, CreditSource, CreditTransaction, EnergyRecord, NewAlert,
    ParseError, SyncEvent, now_ms,
};

use crate::error::{Error, Result};
use crate::patch::{AlertPatch, EnergyPatch, PairingPatch, SyncPatch, TransactionPatch};
use crate::schema;

/// SQLite-based store for WattBank account data.
///
/// Opened once per process and shared by reference; the embedded engine's
/// single-writer guarantees cover concurrent access from one process.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    fn run_patch(&self, table: &str, id: i64, assignments: crate::patch::Assignments) -> Result<()> {
        let (columns, mut params) = assignments;
        if columns.is_empty() {
            return Ok(());
        }
        params.push(Box::new(id));
        let sql = format!("UPDATE {} SET {} WHERE id = ?", table, columns.join(", "));
        debug!("Executing patch: {}", sql);
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        self.conn.execute(&sql, params_ref.as_slice())?;
        Ok(())
    }
}

/// Parse a stored text column into its enum, surfacing bad data as a
/// conversion failure on that column.
fn text_col<T>(idx: usize, row: &rusqlite::Row<'_>) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// Credit ledger operations
impl Store {
    /// Append a transaction to the credit ledger.
    ///
    /// `ts` defaults to the current time. No sign validation is performed:
    /// negative deltas (charges, corrections) are legal ledger entries.
    /// Returns the assigned row id.
    pub fn append_transaction(
        &self,
        delta: f64,
        source: CreditSource,
        note: Option<&str>,
        ts: Option<i64>,
    ) -> Result<i64> {
        let ts = ts.unwrap_or_else(now_ms);

        self.conn.execute(
            "INSERT INTO credit_transactions (ts, delta, source, note) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![ts, delta, source.as_str(), note],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Appended transaction {}: delta={} source={}", id, delta, source);
        Ok(id)
    }

    /// List all transactions, most recent first.
    ///
    /// Ordered by `ts DESC, id DESC` so rows with identical timestamps still
    /// sort deterministically across calls.
    pub fn list_transactions(&self) -> Result<Vec<CreditTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts, delta, source, note FROM credit_transactions
             ORDER BY ts DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([], map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get a transaction by id.
    pub fn transaction(&self, id: i64) -> Result<Option<CreditTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, ts, delta, source, note FROM credit_transactions WHERE id = ?",
        )?;

        let row = stmt.query_row([id], map_transaction).optional()?;
        Ok(row)
    }

    /// Apply a correction patch to a transaction.
    ///
    /// An empty patch is a no-op, as is patching a missing id.
    pub fn update_transaction(&self, id: i64, patch: &TransactionPatch) -> Result<()> {
        self.run_patch("credit_transactions", id, patch.assignments())
    }

    /// Delete a transaction. Idempotent: a missing id is not an error.
    pub fn remove_transaction(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM credit_transactions WHERE id = ?", [id])?;
        Ok(())
    }

    /// Current credit balance: the sum of `delta` over all ledger rows.
    ///
    /// Always computed from persisted rows, never cached, so it stays
    /// consistent across corrections and deletes. Zero for an empty ledger.
    pub fn balance(&self) -> Result<f64> {
        let balance: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(delta), 0.0) FROM credit_transactions",
            [],
            |row| row.get(0),
        )?;
        Ok(balance)
    }
}

fn map_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<CreditTransaction> {
    Ok(CreditTransaction {
        id: row.get(0)?,
        ts: row.get(1)?,
        delta: row.get(2)?,
        source: text_col(3, row)?,
        note: row.get(4)?,
    })
}

// Energy consumption operations
impl Store {
    /// Append an energy sample in watt-hours. `ts` defaults to now.
    pub fn append_energy(&self, wh: i64, ts: Option<i64>) -> Result<i64> {
        let ts = ts.unwrap_or_else(now_ms);

        self.conn.execute(
            "INSERT INTO energy_consumption_records (kwh_wh, timestamp) VALUES (?1, ?2)",
            rusqlite::params![wh, ts],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// List all energy samples, most recent first.
    pub fn list_energy(&self) -> Result<Vec<EnergyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kwh_wh, timestamp FROM energy_consumption_records
             ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([], map_energy)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// List energy samples with `start <= timestamp <= end`, most recent
    /// first. An empty window yields an empty list, not an error.
    pub fn energy_in_range(&self, start: i64, end: i64) -> Result<Vec<EnergyRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kwh_wh, timestamp FROM energy_consumption_records
             WHERE timestamp BETWEEN ?1 AND ?2
             ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([start, end], map_energy)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get an energy sample by id.
    pub fn energy_record(&self, id: i64) -> Result<Option<EnergyRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, kwh_wh, timestamp FROM energy_consumption_records WHERE id = ?")?;

        let row = stmt.query_row([id], map_energy).optional()?;
        Ok(row)
    }

    /// Apply a correction patch to an energy sample.
    pub fn update_energy(&self, id: i64, patch: &EnergyPatch) -> Result<()> {
        self.run_patch("energy_consumption_records", id, patch.assignments())
    }

    /// Delete an energy sample. Idempotent.
    pub fn remove_energy(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM energy_consumption_records WHERE id = ?", [id])?;
        Ok(())
    }
}

fn map_energy(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnergyRecord> {
    Ok(EnergyRecord {
        id: row.get(0)?,
        wh: row.get(1)?,
        timestamp: row.get(2)?,
    })
}

// Alert operations
impl Store {
    /// Insert a new alert. Returns the assigned row id.
    pub fn append_alert(&self, alert: &NewAlert) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO alerts (type, title, message, timestamp, severity, read)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                alert.kind.as_str(),
                alert.title,
                alert.message,
                alert.timestamp,
                alert.severity.as_str(),
                alert.read as i64,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// List all alerts, most recent first.
    pub fn list_alerts(&self) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, title, message, timestamp, severity, read FROM alerts
             ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([], map_alert)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get an alert by id.
    pub fn alert(&self, id: i64) -> Result<Option<Alert>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, title, message, timestamp, severity, read FROM alerts WHERE id = ?",
        )?;

        let row = stmt.query_row([id], map_alert).optional()?;
        Ok(row)
    }

    /// Apply a partial update to an alert (typically mark-as-read).
    pub fn update_alert(&self, id: i64, patch: &AlertPatch) -> Result<()> {
        self.run_patch("alerts", id, patch.assignments())
    }

    /// Delete an alert. Idempotent.
    pub fn remove_alert(&self, id: i64) -> Result<()> {
        self.conn.execute("DELETE FROM alerts WHERE id = ?", [id])?;
        Ok(())
    }
}

fn map_alert(row: &rusqlite::Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        kind: text_col(1, row)?,
        title: row.get(2)?,
        message: row.get(3)?,
        timestamp: row.get(4)?,
        severity: text_col(5, row)?,
        read: row.get::<_, i64>(6)? != 0,
    })
}

// Bluetooth pairing operations
impl Store {
    /// Log a pairing event from the device layer. Returns the row id.
    pub fn record_pairing(&self, name: &str, rssi: i32, connectable: bool) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO bluetooth_connections (name, rssi, connectable) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, rssi, connectable as i64],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// List all pairing records, most recent first.
    pub fn list_pairings(&self) -> Result<Vec<BluetoothConnection>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, rssi, connectable FROM bluetooth_connections ORDER BY id DESC",
        )?;

        let rows = stmt
            .query_map([], map_pairing)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get a pairing record by id.
    pub fn pairing(&self, id: i64) -> Result<Option<BluetoothConnection>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, rssi, connectable FROM bluetooth_connections WHERE id = ?")?;

        let row = stmt.query_row([id], map_pairing).optional()?;
        Ok(row)
    }

    /// Apply a partial update to a pairing record.
    pub fn update_pairing(&self, id: i64, patch: &PairingPatch) -> Result<()> {
        self.run_patch("bluetooth_connections", id, patch.assignments())
    }

    /// Delete a pairing record. Idempotent.
    pub fn remove_pairing(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM bluetooth_connections WHERE id = ?", [id])?;
        Ok(())
    }
}

fn map_pairing(row: &rusqlite::Row<'_>) -> rusqlite::Result<BluetoothConnection> {
    Ok(BluetoothConnection {
        id: row.get(0)?,
        name: row.get(1)?,
        rssi: row.get(2)?,
        connectable: row.get::<_, i64>(3)? != 0,
    })
}

// Sync history operations
impl Store {
    /// Record a successful sync at the given time. Returns the row id.
    pub fn record_sync(&self, timestamp: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sync_history (timestamp) VALUES (?1)",
            [timestamp],
        )?;

        debug!("Recorded sync at {}", timestamp);
        Ok(self.conn.last_insert_rowid())
    }

    /// List all sync events, most recent first.
    pub fn list_sync_events(&self) -> Result<Vec<SyncEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp FROM sync_history ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([], map_sync)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get a sync event by id.
    pub fn sync_event(&self, id: i64) -> Result<Option<SyncEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, timestamp FROM sync_history WHERE id = ?")?;

        let row = stmt.query_row([id], map_sync).optional()?;
        Ok(row)
    }

    /// Apply a partial update to a sync event.
    pub fn update_sync_event(&self, id: i64, patch: &SyncPatch) -> Result<()> {
        self.run_patch("sync_history", id, patch.assignments())
    }

    /// Delete a sync event. Idempotent.
    pub fn remove_sync_event(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_history WHERE id = ?", [id])?;
        Ok(())
    }

    /// Time of the most recent successful sync, if any.
    pub fn last_synced(&self) -> Result<Option<i64>> {
        let ts: Option<i64> =
            self.conn
                .query_row("SELECT MAX(timestamp) FROM sync_history", [], |row| {
                    row.get(0)
                })?;
        Ok(ts)
    }
}

fn map_sync(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncEvent> {
    Ok(SyncEvent {
        id: row.get(0)?,
        timestamp: row.get(1)?,
    })
}
