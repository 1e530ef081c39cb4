use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CoinHistory, HistoryEntry};
use crate::models::TrendWindow;

const SECS_PER_DAY: i64 = 86_400;

/// Latest collected values plus the standard trend windows, the `current`
/// block history responses carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStats {
    pub hashrate: f64,
    pub difficulty: f64,
    pub price: f64,
    pub change_7d: f64,
    pub change_30d: f64,
    pub change_90d: f64,
}

/// Percentage hashrate change over a lookback window.
///
/// The comparison point is the latest entry at or before `latest.t -
/// window_days`. A series that does not reach back far enough yields 0.0 —
/// one policy applied uniformly. A zero past hashrate also yields 0.0; the
/// division can never produce NaN or infinity.
pub fn compute_change(entries: &[HistoryEntry], window_days: u32) -> f64 {
    let Some(current) = entries.last() else {
        return 0.0;
    };
    let cutoff = current.t - window_days as i64 * SECS_PER_DAY;
    let Some(past) = entries.iter().rev().find(|e| e.t <= cutoff) else {
        return 0.0;
    };
    if past.h == 0.0 {
        return 0.0;
    }
    ((current.h - past.h) / past.h) * 100.0
}

/// The standard lookback windows, in ascending order.
pub fn trend_windows(entries: &[HistoryEntry]) -> [TrendWindow; 3] {
    [7, 30, 90].map(|window_days| TrendWindow {
        window_days,
        pct_change: compute_change(entries, window_days),
    })
}

/// `None` when the log has no entries yet.
pub fn current_stats(history: &CoinHistory) -> Option<CurrentStats> {
    let latest = history.data.last()?;
    let chartable = history.chartable();
    let [week, month, quarter] = trend_windows(&chartable);

    Some(CurrentStats {
        hashrate: latest.h,
        difficulty: latest.d,
        price: latest.p,
        change_7d: week.pct_change,
        change_30d: month.pct_change,
        change_90d: quarter.pct_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(t: i64, h: f64) -> HistoryEntry {
        HistoryEntry {
            t,
            d: 0.0,
            h,
            p: 0.0,
        }
    }

    #[test]
    fn empty_series_yields_zero() {
        assert_eq!(compute_change(&[], 7), 0.0);
    }

    #[test]
    fn too_short_series_yields_zero() {
        let entries = vec![entry(0, 100.0), entry(SECS_PER_DAY, 110.0)];
        assert_eq!(compute_change(&entries, 7), 0.0);
    }

    #[test]
    fn zero_past_hashrate_never_divides() {
        let entries = vec![entry(0, 0.0), entry(10 * SECS_PER_DAY, 500.0)];
        let change = compute_change(&entries, 7);
        assert_eq!(change, 0.0);
        assert!(change.is_finite());
    }

    #[test]
    fn picks_closest_entry_at_or_before_the_cutoff() {
        let entries = vec![
            entry(0, 100.0),
            entry(2 * SECS_PER_DAY, 200.0),
            entry(10 * SECS_PER_DAY, 300.0),
        ];
        // cutoff is day 3; day 2 is the closest at-or-before entry
        let change = compute_change(&entries, 7);
        assert_eq!(change, 50.0);
    }

    #[test]
    fn computes_percentage_growth() {
        let entries = vec![entry(0, 100.0), entry(30 * SECS_PER_DAY, 150.0)];
        assert_eq!(compute_change(&entries, 30), 50.0);
        assert_eq!(compute_change(&entries, 7), 50.0);
    }

    #[test]
    fn current_stats_come_from_latest_entry() {
        let history = CoinHistory {
            coin: "BTC".into(),
            name: "Bitcoin".into(),
            algorithm: "SHA-256".into(),
            block_time: 600.0,
            data_started: "2024-01-01T00:00:00Z".into(),
            last_updated: None,
            total_entries: 2,
            data: vec![
                HistoryEntry {
                    t: 0,
                    d: 1.0,
                    h: 100.0,
                    p: 10.0,
                },
                HistoryEntry {
                    t: 30 * SECS_PER_DAY,
                    d: 2.0,
                    h: 150.0,
                    p: 20.0,
                },
            ],
        };
        let stats = current_stats(&history).unwrap();
        assert_eq!(stats.hashrate, 150.0);
        assert_eq!(stats.difficulty, 2.0);
        assert_eq!(stats.price, 20.0);
        assert_eq!(stats.change_30d, 50.0);
    }

    #[test]
    fn no_stats_for_an_empty_log() {
        let history = CoinHistory {
            coin: "BTC".into(),
            name: "Bitcoin".into(),
            algorithm: "SHA-256".into(),
            block_time: 600.0,
            data_started: "2024-01-01T00:00:00Z".into(),
            last_updated: None,
            total_entries: 0,
            data: vec![],
        };
        assert!(current_stats(&history).is_none());
    }
}
