use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tradable asset quoted against a fiat currency (USD unless stated).
///
/// Symbols are normalized on construction (trimmed, upper-cased), so two
/// pairs built from `" btc"` and `"BTC"` compare equal and share state.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
}

impl Pair {
    pub const DEFAULT_QUOTE: &'static str = "USD";

    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: normalize_symbol(base.as_ref()),
            quote: normalize_symbol(quote.as_ref()),
        }
    }

    /// USD-quoted pair for `base`.
    pub fn usd(base: impl AsRef<str>) -> Self {
        Self::new(base, Self::DEFAULT_QUOTE)
    }

    /// Parse one persisted pair-list entry. Blank entries yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let base = normalize_symbol(raw);
        if base.is_empty() {
            return None;
        }
        Some(Self {
            base,
            quote: Self::DEFAULT_QUOTE.to_string(),
        })
    }

    /// Exchange product id, e.g. `BTC-USD`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// The base symbol, which is how pairs are shown and persisted.
    pub fn symbol(&self) -> &str {
        &self.base
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// One recorded spot price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub ts: DateTime<Utc>,
    pub price: f64,
}

impl Sample {
    pub fn new(ts: DateTime<Utc>, price: f64) -> Self {
        Self { ts, price }
    }

    /// Prices must be finite and strictly positive to take part in any ratio.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WickDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    /// Net start-to-end change crossed the threshold.
    Plain,
    /// A transient excursion crossed the amplified wick threshold.
    Wick(WickDirection),
}

/// Candidate notification produced by the classifier for a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementEvent {
    pub pair: Pair,
    pub percentage_change: f64,
    pub current_price: f64,
    pub historical_percentage_change: f64,
    pub kind: MovementKind,
    /// Free-form annotation appended to the rendered message. Empty for none.
    pub note: String,
}

impl MovementEvent {
    pub fn is_wick(&self) -> bool {
        matches!(self.kind, MovementKind::Wick(_))
    }
}
