//! MarketManager
//!
//! Owns all per-pair state of the scanner and runs the synchronous part of
//! a tick:
//!   • fold fetched prices into the history store
//!   • classify every pair with history
//!   • pass candidates through the throttle
//!   • render the survivors
//!
//! It is mutated only by the scanner loop, after all fetches of the tick
//! have completed.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::format::{Notification, NotificationFormatter};
use crate::history::HistoryStore;
use crate::pulse::{Classification, MovementClassifier};
use crate::throttle::{NotificationThrottle, ThrottleDecision};
use crate::types::Pair;

/// Prices gathered for one tick; `None` marks a failed fetch.
pub type PriceMap = HashMap<Pair, Option<f64>>;

/// Counters of a single evaluation, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub evaluated: usize,
    pub anomalies: usize,
    pub candidates: usize,
    pub suppressed_cooldown: usize,
    pub suppressed_price: usize,
    pub emitted: usize,
}

pub struct MarketManager {
    history: HistoryStore,
    classifier: MovementClassifier,
    throttle: NotificationThrottle,
    formatter: NotificationFormatter,
}

impl MarketManager {
    pub fn new(cfg: &ScannerConfig) -> Self {
        Self {
            history: HistoryStore::new(cfg.history_retention),
            classifier: MovementClassifier::new(cfg.movement()),
            throttle: NotificationThrottle::new(cfg.throttle()),
            formatter: NotificationFormatter::new(cfg.format()),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn throttle(&self) -> &NotificationThrottle {
        &self.throttle
    }

    /// Keep state only for `pairs`.
    pub fn track(&mut self, pairs: &[Pair]) {
        let tracked: HashSet<Pair> = pairs.iter().cloned().collect();
        self.history.retain(&tracked);
        self.throttle.retain(&tracked);
    }

    pub fn ingest(&mut self, prices: &PriceMap, now: DateTime<Utc>) {
        for (pair, price) in prices {
            self.history.ingest(pair, *price, now);
        }
    }

    /// Classify, throttle and render every pair with history.
    ///
    /// Notifications come back in pair order.
    pub fn evaluate(
        &mut self,
        now: DateTime<Utc>,
        generated_at: NaiveDateTime,
    ) -> (Vec<Notification>, EvaluationStats) {
        let mut stats = EvaluationStats::default();
        let mut out = Vec::new();

        let pairs: Vec<Pair> = self.history.pairs().cloned().collect();
        for pair in pairs {
            let event = match self.classifier.classify(&pair, &self.history, now) {
                Classification::Candidate(ev) => ev,
                Classification::Anomaly(_) => {
                    stats.anomalies += 1;
                    continue;
                }
                Classification::NoData | Classification::Quiet(_) => {
                    stats.evaluated += 1;
                    continue;
                }
            };
            stats.evaluated += 1;
            stats.candidates += 1;

            match self.throttle.admit(&event, now) {
                ThrottleDecision::Emit => {
                    info!(
                        pair = %pair,
                        change_pct = event.percentage_change,
                        historical_pct = event.historical_percentage_change,
                        price = event.current_price,
                        wick = event.is_wick(),
                        "movement notification"
                    );
                    stats.emitted += 1;
                    out.push(self.formatter.render(&event, generated_at));
                }
                ThrottleDecision::CooldownActive => {
                    debug!(pair = %pair, change_pct = event.percentage_change, "suppressed by cooldown");
                    stats.suppressed_cooldown += 1;
                }
                ThrottleDecision::PriceNotMoved => {
                    debug!(pair = %pair, price = event.current_price, "suppressed: price has not moved");
                    stats.suppressed_price += 1;
                }
            }
        }

        (out, stats)
    }
}
