use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::time::cutoff;
use crate::types::Sample;

/// Time-bounded price series for one pair.
///
/// Samples stay ordered by timestamp. Every push evicts samples older than
/// `retention` measured from the pushed timestamp.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<Sample>,
    retention: Duration,
}

impl RollingWindow {
    pub fn new(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Append a sample and evict expired ones.
    ///
    /// A timestamp earlier than the newest sample (wall clock stepped back)
    /// is clamped to the newest one so ordering holds.
    pub fn push(&mut self, ts: DateTime<Utc>, price: f64) {
        let ts = match self.samples.back() {
            Some(last) if ts < last.ts => last.ts,
            _ => ts,
        };
        self.samples.push_back(Sample::new(ts, price));
        self.evict_old(ts);
    }

    fn evict_old(&mut self, now: DateTime<Utc>) {
        let oldest_kept = cutoff(now, self.retention);
        while let Some(front) = self.samples.front() {
            if front.ts < oldest_kept {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Samples with `ts >= now - duration`, oldest first.
    pub fn window(&self, now: DateTime<Utc>, duration: Duration) -> PriceWindow<'_> {
        let from = cutoff(now, duration);
        let start = self.samples.partition_point(|s| s.ts < from);
        PriceWindow {
            samples: &self.samples,
            start,
        }
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + '_ {
        self.samples.iter()
    }
}

static EMPTY: VecDeque<Sample> = VecDeque::new();

/// Borrowed, ordered tail of a [`RollingWindow`].
#[derive(Debug, Clone, Copy)]
pub struct PriceWindow<'a> {
    samples: &'a VecDeque<Sample>,
    start: usize,
}

impl<'a> PriceWindow<'a> {
    pub fn empty() -> PriceWindow<'static> {
        PriceWindow {
            samples: &EMPTY,
            start: 0,
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Sample> + use<'a> {
        self.samples.range(self.start..)
    }

    pub fn len(&self) -> usize {
        self.samples.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<&'a Sample> {
        self.samples.get(self.start)
    }

    pub fn last(&self) -> Option<&'a Sample> {
        if self.is_empty() {
            None
        } else {
            self.samples.back()
        }
    }

    /// Samples that can take part in a percentage computation.
    pub fn valid(&self) -> impl DoubleEndedIterator<Item = &'a Sample> + use<'a> {
        self.iter().filter(|s| s.is_valid())
    }

    pub fn high(&self) -> Option<f64> {
        self.valid().map(|s| s.price).reduce(f64::max)
    }

    pub fn low(&self) -> Option<f64> {
        self.valid().map(|s| s.price).reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn evicts_samples_older_than_retention() {
        let mut w = RollingWindow::new(Duration::from_secs(60));
        w.push(at(0), 1.0);
        w.push(at(30), 2.0);
        w.push(at(61), 3.0);

        let prices: Vec<f64> = w.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![2.0, 3.0]);
    }

    #[test]
    fn sample_exactly_at_retention_edge_is_kept() {
        let mut w = RollingWindow::new(Duration::from_secs(60));
        w.push(at(0), 1.0);
        w.push(at(60), 2.0);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn window_returns_tail_in_order() {
        let mut w = RollingWindow::new(Duration::from_secs(3600));
        for (i, p) in [10.0, 11.0, 12.0, 13.0].into_iter().enumerate() {
            w.push(at(i as i64 * 60), p);
        }

        let tail = w.window(at(180), Duration::from_secs(120));
        let prices: Vec<f64> = tail.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![11.0, 12.0, 13.0]);
        assert_eq!(tail.first().map(|s| s.price), Some(11.0));
        assert_eq!(tail.last().map(|s| s.price), Some(13.0));
        assert_eq!(tail.high(), Some(13.0));
        assert_eq!(tail.low(), Some(11.0));
    }

    #[test]
    fn window_past_all_samples_is_empty() {
        let mut w = RollingWindow::new(Duration::from_secs(3600));
        w.push(at(0), 10.0);

        let tail = w.window(at(600), Duration::from_secs(60));
        assert!(tail.is_empty());
        assert!(tail.first().is_none());
        assert!(tail.last().is_none());
        assert!(tail.high().is_none());
    }

    #[test]
    fn backwards_clock_is_clamped() {
        let mut w = RollingWindow::new(Duration::from_secs(3600));
        w.push(at(100), 1.0);
        w.push(at(50), 2.0);

        let ts: Vec<_> = w.iter().map(|s| s.ts).collect();
        assert_eq!(ts, vec![at(100), at(100)]);
    }

    #[test]
    fn extremes_skip_invalid_prices() {
        let mut w = RollingWindow::new(Duration::from_secs(3600));
        w.push(at(0), 1.0);
        w.push(at(1), 0.0);
        w.push(at(2), f64::INFINITY);
        w.push(at(3), 2.0);
        let tail = w.window(at(3), Duration::from_secs(60));

        assert_eq!(tail.valid().count(), 2);
        assert_eq!(tail.high(), Some(2.0));
        assert_eq!(tail.low(), Some(1.0));
    }

    #[test]
    fn empty_window_has_no_samples() {
        let e = PriceWindow::empty();
        assert!(e.is_empty());
        assert_eq!(e.iter().count(), 0);
    }
}
