//! Wick detection.
//!
//! A wick is an excursion of the short-window high or low beyond an
//! amplified threshold around the window's initial price:
//!
//! ```text
//! upper = initial * (1 + wick_multiplier * threshold / 100)
//! lower = initial * (1 - wick_multiplier * threshold / 100)
//! ```
//!
//! The upward side is checked first, so a window that crosses both bounds
//! is reported as an upward wick.

use super::movement::MovementReading;
use crate::types::WickDirection;

pub fn wick_bounds(initial: f64, threshold_pct: f64, wick_multiplier: f64) -> (f64, f64) {
    let span = wick_multiplier * threshold_pct / 100.0;
    (initial * (1.0 - span), initial * (1.0 + span))
}

pub fn detect_wick(
    reading: &MovementReading,
    threshold_pct: f64,
    wick_multiplier: f64,
) -> Option<WickDirection> {
    let (lower, upper) = wick_bounds(reading.initial, threshold_pct, wick_multiplier);

    if reading.high > upper {
        Some(WickDirection::Up)
    } else if reading.low < lower {
        Some(WickDirection::Down)
    } else {
        None
    }
}
