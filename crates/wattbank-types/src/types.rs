//! Entity types persisted by the WattBank stores.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Origin of a credit-ledger transaction.
///
/// Persisted as lowercase text (`manual`, `voucher`, `system`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditSource {
    /// Top-up entered by the account holder in the app.
    Manual,
    /// Redemption of a prepaid voucher code.
    Voucher,
    /// Adjustment applied by the provider or support tooling.
    System,
}

impl CreditSource {
    /// The stored text form of this source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditSource::Manual => "manual",
            CreditSource::Voucher => "voucher",
            CreditSource::System => "system",
        }
    }
}

impl fmt::Display for CreditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(CreditSource::Manual),
            "voucher" => Ok(CreditSource::Voucher),
            "system" => Ok(CreditSource::System),
            other => Err(ParseError::UnknownVariant {
                kind: "credit source",
                value: other.to_string(),
            }),
        }
    }
}

/// An immutable credit-ledger entry.
///
/// The ledger is append-only: `id` and `ts` never change after insertion.
/// `delta` and `note` may be corrected through explicit update tooling.
/// The account balance is the sum of `delta` over all rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Store-assigned row id.
    pub id: i64,
    /// When the transaction occurred, epoch milliseconds.
    pub ts: i64,
    /// Signed credit amount; positive means credit added.
    pub delta: f64,
    /// Where the transaction came from.
    pub source: CreditSource,
    /// Optional free-form annotation.
    pub note: Option<String>,
}

/// A point-in-time energy consumption sample.
///
/// Samples arrive from the sensor-ingestion pipeline every quarter hour and
/// are append-only. `wh` is the energy delta for the sample interval in
/// watt-hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyRecord {
    /// Store-assigned row id.
    pub id: i64,
    /// Energy used during the sample interval, watt-hours.
    pub wh: i64,
    /// Sample time, epoch milliseconds.
    pub timestamp: i64,
}

/// Category of an account alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Balance dropped below the low-credit threshold.
    LowCredit,
    /// Forecast predicts the balance will run out soon.
    PredictedRunout,
    /// Usage is unusually high for the time of day.
    HighUsage,
    /// The energy monitor sensor link was lost.
    ConnectionLost,
}

impl AlertKind {
    /// The stored text form of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowCredit => "low_credit",
            AlertKind::PredictedRunout => "predicted_runout",
            AlertKind::HighUsage => "high_usage",
            AlertKind::ConnectionLost => "connection_lost",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_credit" => Ok(AlertKind::LowCredit),
            "predicted_runout" => Ok(AlertKind::PredictedRunout),
            "high_usage" => Ok(AlertKind::HighUsage),
            "connection_lost" => Ok(AlertKind::ConnectionLost),
            other => Err(ParseError::UnknownVariant {
                kind: "alert kind",
                value: other.to_string(),
            }),
        }
    }
}

/// How urgently an alert should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// The stored text form of this severity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(ParseError::UnknownVariant {
                kind: "severity",
                value: other.to_string(),
            }),
        }
    }
}

/// A generated notice about account or usage state.
///
/// `kind` and `severity` are fixed at creation; only `read` is expected to
/// change afterwards, though the store permits broader corrections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Store-assigned row id.
    pub id: i64,
    /// Alert category.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Short headline shown in the alert list.
    pub title: String,
    /// Full alert body.
    pub message: String,
    /// When the alert was raised, epoch milliseconds.
    pub timestamp: i64,
    /// Display urgency.
    pub severity: Severity,
    /// Whether the user has seen this alert.
    pub read: bool,
}

/// Fields for a new [`Alert`], before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    /// Alert category.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Short headline shown in the alert list.
    pub title: String,
    /// Full alert body.
    pub message: String,
    /// When the alert was raised, epoch milliseconds.
    pub timestamp: i64,
    /// Display urgency.
    pub severity: Severity,
    /// Initial read state, normally `false`.
    #[serde(default)]
    pub read: bool,
}

/// A Bluetooth pairing record logged by the device layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BluetoothConnection {
    /// Store-assigned row id.
    pub id: i64,
    /// Advertised device name.
    pub name: String,
    /// Signal strength at pairing time, dBm.
    pub rssi: i32,
    /// Whether the device advertised as connectable.
    pub connectable: bool,
}

/// A recorded successful synchronization with the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    /// Store-assigned row id.
    pub id: i64,
    /// When the sync completed, epoch milliseconds.
    pub timestamp: i64,
}

/// History window requested by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRange {
    /// Today, midnight-aligned: 24 hourly buckets.
    Day,
    /// Sliding 7-day window: 7 daily buckets.
    Week,
    /// Sliding 30-day window: 4 buckets.
    Month,
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HistoryRange::Day => "day",
            HistoryRange::Week => "week",
            HistoryRange::Month => "month",
        };
        f.write_str(s)
    }
}

impl FromStr for HistoryRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(HistoryRange::Day),
            "week" => Ok(HistoryRange::Week),
            "month" => Ok(HistoryRange::Month),
            other => Err(ParseError::UnknownVariant {
                kind: "history range",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_source_round_trips_through_text() {
        for source in [CreditSource::Manual, CreditSource::Voucher, CreditSource::System] {
            let parsed: CreditSource = source.as_str().parse().unwrap();
            assert_eq!(parsed, source);
        }
        assert!("wire-transfer".parse::<CreditSource>().is_err());
    }

    #[test]
    fn alert_kind_round_trips_through_text() {
        for kind in [
            AlertKind::LowCredit,
            AlertKind::PredictedRunout,
            AlertKind::HighUsage,
            AlertKind::ConnectionLost,
        ] {
            let parsed: AlertKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn severity_ordering_matches_urgency() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn alert_serializes_kind_as_type() {
        let alert = Alert {
            id: 1,
            kind: AlertKind::LowCredit,
            title: "Low credit".into(),
            message: "Balance below $10".into(),
            timestamp: 1_700_000_000_000,
            severity: Severity::Medium,
            read: false,
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "low_credit");
        assert_eq!(json["severity"], "medium");
    }

    #[test]
    fn wh_to_kwh_divides_by_thousand() {
        assert_eq!(crate::wh_to_kwh(1500), 1.5);
        assert_eq!(crate::wh_to_kwh(0), 0.0);
    }

    #[test]
    fn history_range_parses() {
        assert_eq!("week".parse::<HistoryRange>().unwrap(), HistoryRange::Week);
        assert!("year".parse::<HistoryRange>().is_err());
    }
}
