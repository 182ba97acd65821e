//! Time-window math and usage rollups.
//!
//! Raw energy samples are summed into display buckets:
//!
//! - day: 24 hourly buckets over the midnight-aligned today window
//! - week: 7 daily buckets over a sliding 7-day window ending now
//! - month: 4 buckets over a sliding 30-day window ending now
//!
//! The day window is calendar-aligned while week/month slide; that mismatch
//! is intentional product behavior. All math is integer arithmetic on epoch
//! milliseconds so there are no fallible timezone lookups in library code.

use wattbank_types::{DAY_MS, EnergyRecord, HOUR_MS, HistoryRange, wh_to_kwh};

/// Sliding week window length.
pub const WEEK_MS: i64 = 7 * DAY_MS;

/// Sliding month window length.
pub const MONTH_MS: i64 = 30 * DAY_MS;

/// Start of the calendar day containing `now`, in a fixed UTC offset.
///
/// `offset_minutes` is the local offset from UTC (e.g. 570 for UTC+9:30).
#[must_use]
pub fn day_start_ms(now: i64, offset_minutes: i32) -> i64 {
    let offset = i64::from(offset_minutes) * 60_000;
    let local = now + offset;
    local - local.rem_euclid(DAY_MS) - offset
}

/// Inclusive `[start, end]` query window for a history range.
///
/// The day window covers the full calendar day; week and month end at `now`.
#[must_use]
pub fn window(range: HistoryRange, now: i64, offset_minutes: i32) -> (i64, i64) {
    match range {
        HistoryRange::Day => {
            let start = day_start_ms(now, offset_minutes);
            (start, start + DAY_MS - 1)
        }
        HistoryRange::Week => (now - WEEK_MS, now),
        HistoryRange::Month => (now - MONTH_MS, now),
    }
}

/// Bucket count and width for a history range.
#[must_use]
pub fn bucket_layout(range: HistoryRange) -> (usize, i64) {
    match range {
        HistoryRange::Day => (24, HOUR_MS),
        HistoryRange::Week => (7, DAY_MS),
        HistoryRange::Month => (4, MONTH_MS / 4),
    }
}

/// Sum samples into chronological kWh buckets (oldest bucket first).
///
/// Bucket *i* covers `[start + i*bucket_ms, start + (i+1)*bucket_ms)`.
/// Samples on or past the terminal boundary fold into the final bucket;
/// samples before `start` are ignored. A range with no samples yields
/// all-zero buckets, never an error or a gap.
#[must_use]
pub fn bucket_kwh(records: &[EnergyRecord], start: i64, bucket_ms: i64, count: usize) -> Vec<f64> {
    let mut totals = vec![0i64; count];

    for record in records {
        if record.timestamp < start {
            continue;
        }
        let idx = ((record.timestamp - start) / bucket_ms) as usize;
        totals[idx.min(count - 1)] += record.wh;
    }

    totals.into_iter().map(wh_to_kwh).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUARTER_MS: i64 = 15 * 60 * 1000;

    fn sample(id: i64, wh: i64, timestamp: i64) -> EnergyRecord {
        EnergyRecord { id, wh, timestamp }
    }

    #[test]
    fn day_start_is_midnight_utc_by_default() {
        // 2023-11-14T22:13:20Z
        let now = 1_700_000_000_000;
        let start = day_start_ms(now, 0);
        assert_eq!(start % DAY_MS, 0);
        assert!(now - start < DAY_MS);
        // 2023-11-14T00:00:00Z
        assert_eq!(start, 1_699_920_000_000);
    }

    #[test]
    fn day_start_respects_utc_offset() {
        let now = 1_700_000_000_000;
        // UTC+9:30 (e.g. ACST): local midnight is 9.5h earlier in UTC terms
        let start = day_start_ms(now, 570);
        let local_start = start + 570 * 60_000;
        assert_eq!(local_start % DAY_MS, 0);
        assert!(now >= start && now - start < DAY_MS);

        // Negative offsets work the same way
        let start_west = day_start_ms(now, -300);
        let local_west = start_west - 300 * 60_000;
        assert_eq!(local_west % DAY_MS, 0);
    }

    #[test]
    fn quarter_hour_samples_bucket_into_hours() {
        // 96 quarter-hour samples covering exactly one day; sample i carries
        // (i + 1) watt-hours so every bucket has a distinct, known total.
        let day_start = 1_699_920_000_000;
        let records: Vec<EnergyRecord> = (0..96)
            .map(|i| sample(i + 1, i + 1, day_start + i * QUARTER_MS))
            .collect();

        let buckets = bucket_kwh(&records, day_start, HOUR_MS, 24);
        assert_eq!(buckets.len(), 24);

        for (hour, bucket) in buckets.iter().enumerate() {
            let expected: i64 = (0..4).map(|q| (hour as i64 * 4 + q) + 1).sum();
            assert_eq!(*bucket, expected as f64 / 1000.0, "hour {hour}");
        }

        // Total across buckets equals total day energy / 1000
        let total_wh: i64 = (1..=96).sum();
        let total_kwh: f64 = buckets.iter().sum();
        assert!((total_kwh - total_wh as f64 / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_range_yields_zero_buckets() {
        let buckets = bucket_kwh(&[], 0, HOUR_MS, 24);
        assert_eq!(buckets, vec![0.0; 24]);
    }

    #[test]
    fn terminal_boundary_folds_into_last_bucket() {
        let now = 1_700_000_000_000;
        let (start, end) = window(HistoryRange::Week, now, 0);
        assert_eq!(end, now);

        // A sample at exactly `now` lands in the final daily bucket
        let records = vec![sample(1, 500, now)];
        let buckets = bucket_kwh(&records, start, DAY_MS, 7);
        assert_eq!(buckets[6], 0.5);
        assert_eq!(buckets[..6], [0.0; 6]);
    }

    #[test]
    fn samples_before_start_are_ignored() {
        let records = vec![sample(1, 500, 100), sample(2, 300, 2_000)];
        let buckets = bucket_kwh(&records, 1_000, 1_000, 2);
        assert_eq!(buckets, vec![0.0, 0.3]);
    }

    #[test]
    fn window_shapes_match_layouts() {
        let now = 1_700_000_000_000;
        for range in [HistoryRange::Day, HistoryRange::Week, HistoryRange::Month] {
            let (start, end) = window(range, now, 0);
            let (count, width) = bucket_layout(range);
            // Buckets exactly tile the window (day window is end-exclusive
            // by construction, week/month fold the terminal sample).
            assert!(end - start <= count as i64 * width);
            assert!(end - start >= (count as i64 * width) - 1);
        }
    }
}
