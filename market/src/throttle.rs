//! Decides whether a candidate movement actually produces a notification.
//!
//! Gates run in order and the first suppression short-circuits the rest,
//! including every state update:
//!
//! 1. cooldown: a plain notification went out less than `cooldown` ago and
//!    the change has not moved `threshold * cooldown_multiplier` since
//! 2. last price: price is within `threshold` percent of the last price
//!    that passed the gates
//!
//! Once through, `last_price` is updated for every event. Only plain
//! movements advance `last_notified_change` and `last_notification_time`;
//! wicks never touch the cooldown clock, so successive wicks are bounded by
//! the gates alone.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::ThrottleConfig;
use crate::pulse::movement::percent_change;
use crate::time::to_delta;
use crate::types::{MovementEvent, Pair};

/// Per-pair notification bookkeeping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThrottleState {
    pub last_notified_change: f64,
    pub last_notification_time: Option<DateTime<Utc>>,
    pub last_price: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    Emit,
    CooldownActive,
    PriceNotMoved,
}

impl ThrottleDecision {
    pub fn is_emit(&self) -> bool {
        matches!(self, ThrottleDecision::Emit)
    }
}

/// Gate 1. Pure.
pub fn cooldown_blocks(
    state: &ThrottleState,
    event: &MovementEvent,
    cfg: &ThrottleConfig,
    now: DateTime<Utc>,
) -> bool {
    let Some(last_ts) = state.last_notification_time else {
        return false;
    };

    let within_cooldown = now - last_ts < to_delta(cfg.cooldown);
    let delta = (event.percentage_change - state.last_notified_change).abs();

    within_cooldown && delta < cfg.threshold_pct * cfg.cooldown_multiplier
}

/// Gate 2. Pure.
pub fn last_price_blocks(state: &ThrottleState, event: &MovementEvent, cfg: &ThrottleConfig) -> bool {
    match state.last_price {
        Some(last) if last > 0.0 => {
            percent_change(last, event.current_price).abs() < cfg.threshold_pct
        }
        _ => false,
    }
}

#[derive(Debug)]
pub struct NotificationThrottle {
    cfg: ThrottleConfig,
    states: HashMap<Pair, ThrottleState>,
}

impl NotificationThrottle {
    pub fn new(cfg: ThrottleConfig) -> Self {
        Self {
            cfg,
            states: HashMap::new(),
        }
    }

    /// Run the gates for `event` and apply the resulting state updates.
    pub fn admit(&mut self, event: &MovementEvent, now: DateTime<Utc>) -> ThrottleDecision {
        let state = self.states.entry(event.pair.clone()).or_default();

        if cooldown_blocks(state, event, &self.cfg, now) {
            return ThrottleDecision::CooldownActive;
        }
        if last_price_blocks(state, event, &self.cfg) {
            return ThrottleDecision::PriceNotMoved;
        }

        state.last_price = Some(event.current_price);

        if !event.is_wick() {
            state.last_notified_change = event.percentage_change;
            state.last_notification_time = Some(now);
        }

        ThrottleDecision::Emit
    }

    pub fn state(&self, pair: &Pair) -> Option<&ThrottleState> {
        self.states.get(pair)
    }

    /// Forget pairs that are no longer tracked.
    pub fn retain(&mut self, tracked: &HashSet<Pair>) {
        self.states.retain(|pair, _| tracked.contains(pair));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MovementKind, WickDirection};
    use chrono::{TimeDelta, TimeZone};
    use std::time::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn cfg() -> ThrottleConfig {
        ThrottleConfig {
            threshold_pct: 1.0,
            cooldown: Duration::from_secs(300),
            cooldown_multiplier: 2.0,
        }
    }

    fn plain(change: f64, price: f64) -> MovementEvent {
        MovementEvent {
            pair: Pair::usd("BTC"),
            percentage_change: change,
            current_price: price,
            historical_percentage_change: 0.0,
            kind: MovementKind::Plain,
            note: String::new(),
        }
    }

    fn wick(change: f64, price: f64) -> MovementEvent {
        MovementEvent {
            kind: MovementKind::Wick(WickDirection::Up),
            note: "volatile".into(),
            ..plain(change, price)
        }
    }

    #[test]
    fn first_plain_event_emits_and_starts_cooldown() {
        let mut t = NotificationThrottle::new(cfg());
        let ev = plain(1.667, 30_500.0);

        assert_eq!(t.admit(&ev, at(0)), ThrottleDecision::Emit);

        let s = t.state(&ev.pair).unwrap();
        assert_eq!(s.last_notified_change, 1.667);
        assert_eq!(s.last_notification_time, Some(at(0)));
        assert_eq!(s.last_price, Some(30_500.0));
    }

    #[test]
    fn second_plain_event_inside_cooldown_is_suppressed() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&plain(1.5, 100.0), at(0)).is_emit());
        // Price moved enough for gate 2 but change delta (1.0) < 2.0.
        assert_eq!(
            t.admit(&plain(2.5, 103.0), at(60)),
            ThrottleDecision::CooldownActive
        );

        // Suppression leaves all state untouched.
        let s = t.state(&Pair::usd("BTC")).unwrap();
        assert_eq!(s.last_price, Some(100.0));
        assert_eq!(s.last_notification_time, Some(at(0)));
    }

    #[test]
    fn large_delta_breaks_through_cooldown() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&plain(1.0, 100.0), at(0)).is_emit());
        assert!(t.admit(&plain(3.5, 103.0), at(60)).is_emit());
        assert_eq!(t.state(&Pair::usd("BTC")).unwrap().last_notified_change, 3.5);
    }

    #[test]
    fn cooldown_expires() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&plain(1.5, 100.0), at(0)).is_emit());
        assert!(t.admit(&plain(1.5, 102.0), at(300)).is_emit());
    }

    #[test]
    fn unchanged_price_is_suppressed_after_cooldown() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&plain(1.5, 100.0), at(0)).is_emit());
        assert_eq!(
            t.admit(&plain(-1.5, 100.5), at(600)),
            ThrottleDecision::PriceNotMoved
        );
    }

    #[test]
    fn wick_does_not_advance_cooldown_bookkeeping() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&wick(0.5, 100.0), at(0)).is_emit());

        let s = t.state(&Pair::usd("BTC")).unwrap();
        assert_eq!(s.last_notified_change, 0.0);
        assert_eq!(s.last_notification_time, None);
        assert_eq!(s.last_price, Some(100.0));
    }

    #[test]
    fn consecutive_wicks_seconds_apart_both_emit() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&wick(0.2, 100.0), at(0)).is_emit());
        assert!(t.admit(&wick(0.4, 102.0), at(15)).is_emit());
        assert!(t.state(&Pair::usd("BTC")).unwrap().last_notification_time.is_none());
    }

    #[test]
    fn wick_after_plain_is_still_cooled_down() {
        let mut t = NotificationThrottle::new(cfg());

        assert!(t.admit(&plain(1.667, 30_500.0), at(0)).is_emit());
        assert_eq!(
            t.admit(&wick(1.667, 30_500.0), at(60)),
            ThrottleDecision::CooldownActive
        );
        assert_eq!(t.state(&Pair::usd("BTC")).unwrap().last_notified_change, 1.667);
    }

    #[test]
    fn pairs_are_throttled_independently() {
        let mut t = NotificationThrottle::new(cfg());
        let btc = plain(1.5, 100.0);
        let eth = MovementEvent {
            pair: Pair::usd("ETH"),
            ..plain(1.5, 100.0)
        };

        assert!(t.admit(&btc, at(0)).is_emit());
        assert!(t.admit(&eth, at(0)).is_emit());
    }

    #[test]
    fn retain_forgets_untracked_pairs() {
        let mut t = NotificationThrottle::new(cfg());
        t.admit(&plain(1.5, 100.0), at(0));

        t.retain(&HashSet::new());
        assert!(t.state(&Pair::usd("BTC")).is_none());
    }

    #[test]
    fn cooldown_gate_is_pure() {
        let state = ThrottleState {
            last_notified_change: 1.0,
            last_notification_time: Some(at(0)),
            last_price: Some(100.0),
        };
        let ev = plain(1.5, 110.0);
        assert!(cooldown_blocks(&state, &ev, &cfg(), at(0) + TimeDelta::seconds(299)));
        assert!(!cooldown_blocks(&state, &ev, &cfg(), at(0) + TimeDelta::seconds(300)));
        assert!(!last_price_blocks(&state, &ev, &cfg()));
    }
}
