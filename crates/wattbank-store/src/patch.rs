//! Change-set types for partial updates.
//!
//! Each persisted entity has an explicit patch struct of optional fields
//! instead of a dynamic field map, so unsupported field names are
//! unrepresentable. An all-`None` patch is a documented no-op: the store
//! returns without issuing a statement.
//!
//! Patches are normal-operation tools only for `AlertPatch::read`
//! (mark-as-read); everything else exists for explicit corrections.

use rusqlite::ToSql;

use wattbank_types::{AlertKind, Severity};

/// Parameterized `SET` clause fragments, paired column-for-value.
pub(crate) type Assignments = (Vec<&'static str>, Vec<Box<dyn ToSql>>);

/// Correction patch for a credit transaction.
///
/// Only `delta` and `note` are correctable; `id` and `ts` are immutable by
/// ledger invariant. A set `note` replaces the stored note; there is no way
/// to clear a note through a patch.
#[derive(Debug, Default, Clone)]
pub struct TransactionPatch {
    /// Replacement signed amount.
    pub delta: Option<f64>,
    /// Replacement annotation.
    pub note: Option<String>,
}

impl TransactionPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement delta.
    #[must_use]
    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Set the replacement note.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// True when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delta.is_none() && self.note.is_none()
    }

    pub(crate) fn assignments(&self) -> Assignments {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(delta) = self.delta {
            columns.push("delta = ?");
            params.push(Box::new(delta));
        }
        if let Some(ref note) = self.note {
            columns.push("note = ?");
            params.push(Box::new(note.clone()));
        }
        (columns, params)
    }
}

/// Correction patch for an energy consumption sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnergyPatch {
    /// Replacement watt-hour value.
    pub wh: Option<i64>,
    /// Replacement sample time, epoch milliseconds.
    pub timestamp: Option<i64>,
}

impl EnergyPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement watt-hour value.
    #[must_use]
    pub fn wh(mut self, wh: i64) -> Self {
        self.wh = Some(wh);
        self
    }

    /// Set the replacement sample time.
    #[must_use]
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// True when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wh.is_none() && self.timestamp.is_none()
    }

    pub(crate) fn assignments(&self) -> Assignments {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(wh) = self.wh {
            columns.push("kwh_wh = ?");
            params.push(Box::new(wh));
        }
        if let Some(ts) = self.timestamp {
            columns.push("timestamp = ?");
            params.push(Box::new(ts));
        }
        (columns, params)
    }
}

/// Partial update for an alert.
///
/// In normal operation only `read` changes (mark-as-read); the remaining
/// fields exist for corrections.
#[derive(Debug, Default, Clone)]
pub struct AlertPatch {
    /// Replacement category.
    pub kind: Option<AlertKind>,
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement body.
    pub message: Option<String>,
    /// Replacement alert time, epoch milliseconds.
    pub timestamp: Option<i64>,
    /// Replacement urgency.
    pub severity: Option<Severity>,
    /// Replacement read state.
    pub read: Option<bool>,
}

impl AlertPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the alert read or unread.
    #[must_use]
    pub fn read(mut self, read: bool) -> Self {
        self.read = Some(read);
        self
    }

    /// Set the replacement category.
    #[must_use]
    pub fn kind(mut self, kind: AlertKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the replacement headline.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the replacement body.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the replacement alert time.
    #[must_use]
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the replacement urgency.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// True when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.message.is_none()
            && self.timestamp.is_none()
            && self.severity.is_none()
            && self.read.is_none()
    }

    pub(crate) fn assignments(&self) -> Assignments {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(kind) = self.kind {
            columns.push("type = ?");
            params.push(Box::new(kind.as_str()));
        }
        if let Some(ref title) = self.title {
            columns.push("title = ?");
            params.push(Box::new(title.clone()));
        }
        if let Some(ref message) = self.message {
            columns.push("message = ?");
            params.push(Box::new(message.clone()));
        }
        if let Some(ts) = self.timestamp {
            columns.push("timestamp = ?");
            params.push(Box::new(ts));
        }
        if let Some(severity) = self.severity {
            columns.push("severity = ?");
            params.push(Box::new(severity.as_str()));
        }
        if let Some(read) = self.read {
            columns.push("read = ?");
            params.push(Box::new(read as i64));
        }
        (columns, params)
    }
}

/// Partial update for a Bluetooth pairing record.
#[derive(Debug, Default, Clone)]
pub struct PairingPatch {
    /// Replacement device name.
    pub name: Option<String>,
    /// Replacement signal strength, dBm.
    pub rssi: Option<i32>,
    /// Replacement connectable flag.
    pub connectable: Option<bool>,
}

impl PairingPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement device name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the replacement signal strength.
    #[must_use]
    pub fn rssi(mut self, rssi: i32) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Set the replacement connectable flag.
    #[must_use]
    pub fn connectable(mut self, connectable: bool) -> Self {
        self.connectable = Some(connectable);
        self
    }

    /// True when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.rssi.is_none() && self.connectable.is_none()
    }

    pub(crate) fn assignments(&self) -> Assignments {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(ref name) = self.name {
            columns.push("name = ?");
            params.push(Box::new(name.clone()));
        }
        if let Some(rssi) = self.rssi {
            columns.push("rssi = ?");
            params.push(Box::new(rssi));
        }
        if let Some(connectable) = self.connectable {
            columns.push("connectable = ?");
            params.push(Box::new(connectable as i64));
        }
        (columns, params)
    }
}

/// Partial update for a sync-history record.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncPatch {
    /// Replacement sync time, epoch milliseconds.
    pub timestamp: Option<i64>,
}

impl SyncPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement sync time.
    #[must_use]
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// True when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
    }

    pub(crate) fn assignments(&self) -> Assignments {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(ts) = self.timestamp {
            columns.push("timestamp = ?");
            params.push(Box::new(ts));
        }
        (columns, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patches_report_empty() {
        assert!(TransactionPatch::new().is_empty());
        assert!(EnergyPatch::new().is_empty());
        assert!(AlertPatch::new().is_empty());
        assert!(PairingPatch::new().is_empty());
        assert!(SyncPatch::new().is_empty());
    }

    #[test]
    fn builder_fields_register_assignments() {
        let patch = TransactionPatch::new().delta(5.0).note("corrected");
        assert!(!patch.is_empty());
        let (columns, params) = patch.assignments();
        assert_eq!(columns, vec!["delta = ?", "note = ?"]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn alert_patch_covers_every_column() {
        let patch = AlertPatch::new()
            .kind(AlertKind::HighUsage)
            .title("t")
            .message("m")
            .timestamp(42)
            .severity(Severity::High)
            .read(true);
        let (columns, _) = patch.assignments();
        assert_eq!(columns.len(), 6);
    }
}
