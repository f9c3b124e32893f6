use std::time::Duration;

use tracing::warn;

use crate::error::MarketError;
use crate::time::whole_minutes;

/// Column widths of the rendered notification body.
///
/// Values wider than their column are never truncated; they push the
/// following columns to the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldWidths {
    /// `[PAIR]`, brackets included.
    pub pair: usize,
    /// `+1.23%`.
    pub percent: usize,
    /// `$123.45678`, dollar sign included.
    pub price: usize,
    /// `[60m +1.23%]`.
    pub historical: usize,
}

impl Default for FieldWidths {
    fn default() -> Self {
        Self {
            pair: 11,
            percent: 7,
            price: 10,
            historical: 13,
        }
    }
}

/// Inputs of the movement classifier.
#[derive(Clone, Debug)]
pub struct MovementConfig {
    pub short_window: Duration,
    pub historical_window: Duration,
    pub threshold_pct: f64,
    pub wick_multiplier: f64,
    pub volatile_text: String,
}

/// Inputs of the notification throttle.
#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    pub threshold_pct: f64,
    pub cooldown: Duration,
    pub cooldown_multiplier: f64,
}

/// Inputs of the notification formatter.
#[derive(Clone, Copy, Debug)]
pub struct FormatConfig {
    pub widths: FieldWidths,
    /// Label used in the historical column, e.g. `60` for `[60m ...]`.
    pub historical_minutes: u64,
}

#[derive(Clone, Debug)]
pub struct ScannerConfig {
    // =========================
    // Scheduling
    // =========================
    /// Time between price fetch ticks.
    pub fetch_interval: Duration,

    /// Time between pair-catalog refreshes.
    pub pair_refresh_interval: Duration,

    /// Attempts per pair and tick before the price counts as absent.
    pub retry_attempts: u32,

    /// Fixed pause between two attempts for the same pair.
    pub retry_delay: Duration,

    /// Upper bound on in-flight price requests.
    pub fetch_concurrency: usize,

    // =========================
    // Detection
    // =========================
    /// Minimum absolute percentage change that produces a notification.
    pub threshold_pct: f64,

    /// Multiple of the threshold a high/low excursion must exceed to be a wick.
    pub wick_multiplier: f64,

    /// Lookback of the primary change. Independent of `fetch_interval` so
    /// a missed tick does not distort the reading.
    pub short_window: Duration,

    /// Lookback of the context change shown next to the primary one.
    pub historical_window: Duration,

    /// How long samples are kept per pair.
    pub history_retention: Duration,

    /// Annotation appended to wick notifications.
    pub volatile_text: String,

    // =========================
    // Throttling
    // =========================
    /// Minimum spacing between plain notifications for one pair.
    pub cooldown: Duration,

    /// During cooldown only a change delta above `threshold * multiplier`
    /// breaks through.
    pub cooldown_multiplier: f64,

    // =========================
    // Output
    // =========================
    pub widths: FieldWidths,

    /// Send movement batches and lifecycle notices to the webhook sink.
    pub webhook_enabled: bool,

    /// Verbose fetch logging; movement notifications stay console-only.
    pub debug: bool,

    /// Announce the warm-up period once at startup.
    pub show_initial_alert: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(15),
            pair_refresh_interval: Duration::from_secs(300 * 60),
            retry_attempts: 5,
            retry_delay: Duration::from_secs(2),
            fetch_concurrency: 8,

            threshold_pct: 1.0,
            wick_multiplier: 3.0,
            short_window: Duration::from_secs(5 * 60),
            historical_window: Duration::from_secs(60 * 60),
            history_retention: Duration::from_secs(60 * 60),
            volatile_text: "wicked out of range".to_string(),

            cooldown: Duration::from_secs(5 * 60),
            cooldown_multiplier: 2.0,

            widths: FieldWidths::default(),
            webhook_enabled: true,
            debug: false,
            show_initial_alert: true,
        }
    }
}

impl ScannerConfig {
    /// Reject values that would make the pipeline divide by zero or spin.
    ///
    /// A retention shorter than a lookback is allowed but logged: the
    /// affected change is then computed from whatever samples remain.
    pub fn validate(&self) -> Result<(), MarketError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.threshold_pct) {
            return Err(MarketError::InvalidConfig(format!(
                "threshold_pct must be > 0, got {}",
                self.threshold_pct
            )));
        }
        if !positive(self.wick_multiplier) {
            return Err(MarketError::InvalidConfig(format!(
                "wick_multiplier must be > 0, got {}",
                self.wick_multiplier
            )));
        }
        if !positive(self.cooldown_multiplier) {
            return Err(MarketError::InvalidConfig(format!(
                "cooldown_multiplier must be > 0, got {}",
                self.cooldown_multiplier
            )));
        }
        if self.retry_attempts == 0 {
            return Err(MarketError::InvalidConfig(
                "retry_attempts must be at least 1".into(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(MarketError::InvalidConfig(
                "fetch_concurrency must be at least 1".into(),
            ));
        }
        for (name, d) in [
            ("fetch_interval", self.fetch_interval),
            ("pair_refresh_interval", self.pair_refresh_interval),
            ("short_window", self.short_window),
            ("historical_window", self.historical_window),
            ("history_retention", self.history_retention),
        ] {
            if d.is_zero() {
                return Err(MarketError::InvalidConfig(format!("{name} must be > 0")));
            }
        }

        let longest_lookback = self.short_window.max(self.historical_window);
        if self.history_retention < longest_lookback {
            warn!(
                retention_s = self.history_retention.as_secs(),
                lookback_s = longest_lookback.as_secs(),
                "history retention is shorter than the longest lookback; changes will use truncated history"
            );
        }

        Ok(())
    }

    pub fn movement(&self) -> MovementConfig {
        MovementConfig {
            short_window: self.short_window,
            historical_window: self.historical_window,
            threshold_pct: self.threshold_pct,
            wick_multiplier: self.wick_multiplier,
            volatile_text: self.volatile_text.clone(),
        }
    }

    pub fn throttle(&self) -> ThrottleConfig {
        ThrottleConfig {
            threshold_pct: self.threshold_pct,
            cooldown: self.cooldown,
            cooldown_multiplier: self.cooldown_multiplier,
        }
    }

    pub fn format(&self) -> FormatConfig {
        FormatConfig {
            widths: self.widths,
            historical_minutes: whole_minutes(self.historical_window),
        }
    }

    pub fn initial_alert_message(&self) -> String {
        format!(
            "Scanner has been updated, please allow {} minutes for accurate longer term accuracy.",
            whole_minutes(self.historical_window)
        )
    }

    pub fn post_initialization_message(&self) -> String {
        format!(
            "Initialization period of {} minutes has passed. All data moving forward will be accurate.",
            whole_minutes(self.historical_window)
        )
    }
}
