//! Per-pair price history.
//!
//! The store is owned by the scanner pipeline and mutated only between
//! fetch completion and evaluation, so no interior locking is needed.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::rolling_window::{PriceWindow, RollingWindow};
use crate::types::Pair;

#[derive(Debug)]
pub struct HistoryStore {
    retention: Duration,
    series: BTreeMap<Pair, RollingWindow>,
}

impl HistoryStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            series: BTreeMap::new(),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Record `price` for `pair` at `now`. An absent price leaves the
    /// existing history untouched.
    pub fn ingest(&mut self, pair: &Pair, price: Option<f64>, now: DateTime<Utc>) {
        let Some(price) = price else {
            return;
        };

        let retention = self.retention;
        self.series
            .entry(pair.clone())
            .or_insert_with(|| RollingWindow::new(retention))
            .push(now, price);
    }

    /// Ordered samples of `pair` no older than `now - duration`.
    pub fn window(&self, pair: &Pair, now: DateTime<Utc>, duration: Duration) -> PriceWindow<'_> {
        match self.series.get(pair) {
            Some(series) => series.window(now, duration),
            None => PriceWindow::empty(),
        }
    }

    /// Drop histories of pairs that are no longer tracked.
    pub fn retain(&mut self, tracked: &HashSet<Pair>) {
        let before = self.series.len();
        self.series.retain(|pair, _| tracked.contains(pair));
        let dropped = before - self.series.len();
        if dropped > 0 {
            debug!(dropped, "dropped history of untracked pairs");
        }
    }

    /// Pairs with history, in symbol order.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> + '_ {
        self.series.keys()
    }

    pub fn get(&self, pair: &Pair) -> Option<&RollingWindow> {
        self.series.get(pair)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn absent_price_is_a_noop() {
        let mut store = HistoryStore::new(Duration::from_secs(3600));
        let btc = Pair::usd("BTC");

        store.ingest(&btc, Some(100.0), at(0));
        store.ingest(&btc, None, at(15));

        let series = store.get(&btc).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().unwrap().ts, at(0));
    }

    #[test]
    fn absent_price_does_not_create_history() {
        let mut store = HistoryStore::new(Duration::from_secs(3600));
        store.ingest(&Pair::usd("ETH"), None, at(0));
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_pair_yields_empty_window() {
        let store = HistoryStore::new(Duration::from_secs(3600));
        assert!(
            store
                .window(&Pair::usd("DOGE"), at(0), Duration::from_secs(300))
                .is_empty()
        );
    }

    #[test]
    fn retain_drops_untracked_pairs() {
        let mut store = HistoryStore::new(Duration::from_secs(3600));
        store.ingest(&Pair::usd("BTC"), Some(1.0), at(0));
        store.ingest(&Pair::usd("ETH"), Some(1.0), at(0));

        let tracked: HashSet<Pair> = [Pair::usd("ETH")].into_iter().collect();
        store.retain(&tracked);

        let left: Vec<_> = store.pairs().map(|p| p.symbol().to_string()).collect();
        assert_eq!(left, vec!["ETH"]);
    }

    #[test]
    fn histories_are_independent_per_pair() {
        let mut store = HistoryStore::new(Duration::from_secs(60));
        let btc = Pair::usd("BTC");
        let eth = Pair::usd("ETH");

        store.ingest(&btc, Some(1.0), at(0));
        store.ingest(&eth, Some(2.0), at(120));

        // ETH's ingest must not evict BTC samples.
        assert_eq!(store.get(&btc).unwrap().len(), 1);
    }

    proptest! {
        #[test]
        fn retained_samples_are_within_retention(
            steps in prop::collection::vec((0i64..120, 1.0f64..1_000.0), 1..60),
            retention_s in 30u64..900,
        ) {
            let retention = Duration::from_secs(retention_s);
            let mut store = HistoryStore::new(retention);
            let pair = Pair::usd("BTC");
            let mut now = at(0);

            for (gap, price) in steps {
                now += TimeDelta::seconds(gap);
                store.ingest(&pair, Some(price), now);

                let series = store.get(&pair).unwrap();
                for s in series.iter() {
                    prop_assert!(now - s.ts <= TimeDelta::seconds(retention_s as i64));
                }
                let ordered = series
                    .iter()
                    .zip(series.iter().skip(1))
                    .all(|(a, b)| a.ts <= b.ts);
                prop_assert!(ordered);
            }
        }

        #[test]
        fn shorter_windows_are_subsets_of_longer_ones(
            steps in prop::collection::vec((0i64..90, 1.0f64..1_000.0), 1..60),
            d1 in 0u64..3_600,
            extra in 0u64..3_600,
        ) {
            let mut store = HistoryStore::new(Duration::from_secs(7_200));
            let pair = Pair::usd("ETH");
            let mut now = at(0);
            for (gap, price) in steps {
                now += TimeDelta::seconds(gap);
                store.ingest(&pair, Some(price), now);
            }

            let short = store.window(&pair, now, Duration::from_secs(d1));
            let long = store.window(&pair, now, Duration::from_secs(d1 + extra));

            prop_assert!(short.len() <= long.len());
            // Both are tails of the same series, so the short one is a suffix.
            let short_v: Vec<_> = short.iter().copied().collect();
            let long_v: Vec<_> = long.iter().copied().collect();
            prop_assert_eq!(&long_v[long_v.len() - short_v.len()..], &short_v[..]);
        }
    }
}
