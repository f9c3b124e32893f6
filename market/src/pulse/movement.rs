//! Movement Pulse
//!
//! Measures how far the latest price has travelled from the start of a
//! lookback, in percent:
//!
//! ```text
//! percentage_change = (current - initial) / initial * 100
//! ```
//!
//! Two lookbacks are read from the same history:
//! - the short window drives detection (`initial`, `current`, `high`, `low`)
//! - the historical window only adds context (`historical_percentage_change`)
//!
//! Computation is pure. Zero, negative and non-finite samples never take part
//! in the statistics. When the latest sample is one of them the pair is
//! reported as a [`PriceAnomaly`] for that tick; older ones are skipped.

use crate::rolling_window::PriceWindow;
use crate::types::Sample;

/// Snapshot of one pair's short-window statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementReading {
    pub initial: f64,
    pub current: f64,
    pub high: f64,
    pub low: f64,
    pub percentage_change: f64,
    pub historical_percentage_change: f64,
}

/// A sample that cannot be used as a ratio denominator or extreme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceAnomaly {
    pub sample: Sample,
}

pub fn percent_change(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

/// Compute the reading for a pair.
///
/// Returns `Ok(None)` when the short window is empty (nothing to say this
/// tick) and `Err` when the latest sample is unusable. An empty historical
/// window reports a historical change of `0`.
pub fn compute_movement(
    recent: PriceWindow<'_>,
    historical: PriceWindow<'_>,
) -> Result<Option<MovementReading>, PriceAnomaly> {
    if let Some(last) = recent.last().filter(|s| !s.is_valid()) {
        return Err(PriceAnomaly { sample: *last });
    }

    let (Some(first), Some(last), Some(high), Some(low)) = (
        recent.valid().next(),
        recent.valid().next_back(),
        recent.high(),
        recent.low(),
    ) else {
        return Ok(None);
    };

    let initial = first.price;
    let current = last.price;

    let historical_percentage_change = historical
        .valid()
        .next()
        .map(|h| percent_change(h.price, current))
        .unwrap_or(0.0);

    Ok(Some(MovementReading {
        initial,
        current,
        high,
        low,
        percentage_change: percent_change(initial, current),
        historical_percentage_change,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rolling_window::RollingWindow;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn series(points: &[(i64, f64)]) -> RollingWindow {
        let mut w = RollingWindow::new(Duration::from_secs(3600));
        for &(t, p) in points {
            w.push(at(t), p);
        }
        w
    }

    const SHORT: Duration = Duration::from_secs(300);
    const LONG: Duration = Duration::from_secs(3600);

    #[test]
    fn computes_short_and_historical_change() {
        let w = series(&[(0, 100.0), (1_000, 200.0), (1_100, 210.0), (1_200, 220.0)]);
        let now = at(1_200);

        let r = compute_movement(w.window(now, SHORT), w.window(now, LONG))
            .unwrap()
            .unwrap();

        assert_eq!(r.initial, 200.0);
        assert_eq!(r.current, 220.0);
        assert!((r.percentage_change - 10.0).abs() < 1e-9);
        assert!((r.historical_percentage_change - 120.0).abs() < 1e-9);
        assert_eq!(r.high, 220.0);
        assert_eq!(r.low, 200.0);
    }

    #[test]
    fn empty_short_window_yields_nothing() {
        let w = series(&[(0, 100.0)]);
        let now = at(1_000);
        let r = compute_movement(w.window(now, SHORT), w.window(now, LONG)).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn empty_historical_window_reports_zero() {
        let w = series(&[(0, 100.0), (60, 101.0)]);
        let now = at(60);
        let r = compute_movement(w.window(now, SHORT), PriceWindow::empty())
            .unwrap()
            .unwrap();
        assert_eq!(r.historical_percentage_change, 0.0);
    }

    #[test]
    fn single_sample_is_flat() {
        let w = series(&[(0, 42.0)]);
        let now = at(0);
        let r = compute_movement(w.window(now, SHORT), w.window(now, LONG))
            .unwrap()
            .unwrap();
        assert_eq!(r.percentage_change, 0.0);
        assert_eq!(r.high, r.low);
    }

    #[test]
    fn invalid_latest_sample_is_an_anomaly() {
        let w = series(&[(0, 10.0), (60, 0.0)]);
        let now = at(60);
        let err = compute_movement(w.window(now, SHORT), w.window(now, LONG)).unwrap_err();
        assert_eq!(err.sample.price, 0.0);
    }

    #[test]
    fn older_invalid_samples_are_left_out() {
        let w = series(&[(0, 10.0), (30, -5.0), (45, f64::NAN), (60, 10.5)]);
        let now = at(60);

        let r = compute_movement(w.window(now, SHORT), w.window(now, LONG))
            .unwrap()
            .unwrap();

        assert_eq!(r.initial, 10.0);
        assert_eq!(r.low, 10.0);
        assert_eq!(r.high, 10.5);
        assert!((r.percentage_change - 5.0).abs() < 1e-9);
    }

    #[test]
    fn stale_invalid_sample_in_historical_window_is_skipped() {
        let w = series(&[(0, -1.0), (1_000, 10.0), (1_060, 11.0)]);
        let now = at(1_060);

        let r = compute_movement(w.window(now, SHORT), w.window(now, LONG))
            .unwrap()
            .unwrap();

        assert!((r.percentage_change - 10.0).abs() < 1e-9);
        assert!((r.historical_percentage_change - 10.0).abs() < 1e-9);
    }
}
