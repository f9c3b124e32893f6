//! Market Pulses
//!
//! A pulse is a side-effect-free reading derived from a pair's price
//! history. The classifier combines them into at most one candidate
//! [`MovementEvent`] per pair and tick:
//!
//! 1. wick (short-window excursion beyond `wick_multiplier * threshold`)
//! 2. otherwise plain movement (`|percentage_change| >= threshold`)
//! 3. otherwise nothing

pub mod movement;
pub mod wick;

use chrono::{DateTime, Utc};
use tracing::warn;

use self::movement::{MovementReading, PriceAnomaly, compute_movement};
use self::wick::detect_wick;
use crate::config::MovementConfig;
use crate::history::HistoryStore;
use crate::types::{MovementEvent, MovementKind, Pair};

/// Outcome of classifying one pair at one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// No usable samples in the short window.
    NoData,
    /// The latest price is unusable; the pair sits this tick out.
    Anomaly(PriceAnomaly),
    /// Readings exist but no threshold was crossed.
    Quiet(MovementReading),
    /// Candidate for the notification throttle.
    Candidate(MovementEvent),
}

impl Classification {
    pub fn into_candidate(self) -> Option<MovementEvent> {
        match self {
            Classification::Candidate(ev) => Some(ev),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MovementClassifier {
    cfg: MovementConfig,
}

impl MovementClassifier {
    pub fn new(cfg: MovementConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.cfg
    }

    pub fn classify(&self, pair: &Pair, history: &HistoryStore, now: DateTime<Utc>) -> Classification {
        let recent = history.window(pair, now, self.cfg.short_window);
        let historical = history.window(pair, now, self.cfg.historical_window);

        match compute_movement(recent, historical) {
            Ok(None) => Classification::NoData,
            Ok(Some(reading)) => match self.classify_reading(pair, &reading) {
                Some(ev) => Classification::Candidate(ev),
                None => Classification::Quiet(reading),
            },
            Err(anomaly) => {
                warn!(
                    pair = %pair,
                    price = anomaly.sample.price,
                    sample_ts = %anomaly.sample.ts,
                    "price anomaly in latest sample; skipping pair this tick"
                );
                Classification::Anomaly(anomaly)
            }
        }
    }

    /// Turn a reading into a candidate event, wick first.
    pub fn classify_reading(&self, pair: &Pair, reading: &MovementReading) -> Option<MovementEvent> {
        let kind = match detect_wick(reading, self.cfg.threshold_pct, self.cfg.wick_multiplier) {
            Some(direction) => MovementKind::Wick(direction),
            None if reading.percentage_change.abs() >= self.cfg.threshold_pct => MovementKind::Plain,
            None => return None,
        };

        let note = match kind {
            MovementKind::Wick(_) => self.cfg.volatile_text.clone(),
            MovementKind::Plain => String::new(),
        };

        Some(MovementEvent {
            pair: pair.clone(),
            percentage_change: reading.percentage_change,
            current_price: reading.current,
            historical_percentage_change: reading.historical_percentage_change,
            kind,
            note,
        })
    }
}
