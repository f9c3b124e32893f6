use std::path::PathBuf;
use std::time::Duration;

use adapters::coinbase::client::{DEFAULT_EXCHANGE_URL, DEFAULT_SPOT_URL};
use clap::{ArgAction, Parser};
use common::logger::LogFormat;
use market::ScannerConfig;
use market::config::FieldWidths;

#[derive(Debug, Parser)]
#[clap(name = "spot-scanner", version, about = "Watches spot prices and reports sharp moves")]
pub struct Cli {
    /// Discord webhook for notifications. Without it only the console is used.
    #[clap(long, env = "DISCORD_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Send notifications to the webhook at all.
    #[clap(long, env = "WEBHOOK_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub webhook_enabled: bool,

    /// Console only for movement notifications; verbose logging.
    #[clap(long, env = "DEBUG_MODE")]
    pub debug: bool,

    /// Post the startup notice.
    #[clap(long, env = "SHOW_INITIAL_ALERT", default_value_t = true, action = ArgAction::Set)]
    pub show_initial_alert: bool,

    #[clap(long, env = "COINBASE_SPOT_URL", default_value = DEFAULT_SPOT_URL)]
    pub spot_url: String,

    #[clap(long, env = "COINBASE_EXCHANGE_URL", default_value = DEFAULT_EXCHANGE_URL)]
    pub exchange_url: String,

    /// Persisted pair list, one base symbol per line.
    #[clap(long, env = "PAIRS_FILE", default_value = "active_pairs_no_usd.txt")]
    pub pairs_file: PathBuf,

    /// `production` switches logs to JSON.
    #[clap(long, env = "APP_ENV", default_value = "development")]
    pub app_env: String,

    /// Per-request HTTP timeout (seconds)
    #[clap(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Seconds between ticks
    #[clap(long, env = "FETCH_INTERVAL_SECS", default_value_t = 15)]
    pub fetch_interval_secs: u64,

    /// Minutes between pair catalog refreshes
    #[clap(long, env = "PAIR_REFRESH_MINUTES", default_value_t = 300)]
    pub pair_refresh_minutes: u64,

    #[clap(long, env = "RETRY_ATTEMPTS", default_value_t = 5)]
    pub retry_attempts: u32,

    #[clap(long, env = "RETRY_DELAY_SECS", default_value_t = 2)]
    pub retry_delay_secs: u64,

    /// Maximum price requests in flight
    #[clap(long, env = "FETCH_CONCURRENCY", default_value_t = 8)]
    pub fetch_concurrency: usize,

    /// Percentage move that qualifies as notable
    #[clap(long, env = "THRESHOLD_PCT", default_value_t = 1.0)]
    pub threshold_pct: f64,

    #[clap(long, env = "WICK_MULTIPLIER", default_value_t = 3.0)]
    pub wick_multiplier: f64,

    #[clap(long, env = "SHORT_WINDOW_MINUTES", default_value_t = 5)]
    pub short_window_minutes: u64,

    #[clap(long, env = "HISTORICAL_WINDOW_MINUTES", default_value_t = 60)]
    pub historical_window_minutes: u64,

    #[clap(long, env = "HISTORY_RETENTION_MINUTES", default_value_t = 60)]
    pub history_retention_minutes: u64,

    #[clap(long, env = "VOLATILE_TEXT", default_value = "wicked out of range")]
    pub volatile_text: String,

    #[clap(long, env = "COOLDOWN_MINUTES", default_value_t = 5)]
    pub cooldown_minutes: u64,

    #[clap(long, env = "COOLDOWN_MULTIPLIER", default_value_t = 2.0)]
    pub cooldown_multiplier: f64,

    #[clap(long, default_value_t = 11)]
    pub pair_width: usize,

    #[clap(long, default_value_t = 7)]
    pub percent_width: usize,

    #[clap(long, default_value_t = 10)]
    pub price_width: usize,

    #[clap(long, default_value_t = 13)]
    pub historical_width: usize,
}

impl Cli {
    pub fn into_config(&self) -> ScannerConfig {
        ScannerConfig {
            fetch_interval: Duration::from_secs(self.fetch_interval_secs),
            pair_refresh_interval: minutes(self.pair_refresh_minutes),
            retry_attempts: self.retry_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            fetch_concurrency: self.fetch_concurrency,
            threshold_pct: self.threshold_pct,
            wick_multiplier: self.wick_multiplier,
            short_window: minutes(self.short_window_minutes),
            historical_window: minutes(self.historical_window_minutes),
            history_retention: minutes(self.history_retention_minutes),
            volatile_text: self.volatile_text.clone(),
            cooldown: minutes(self.cooldown_minutes),
            cooldown_multiplier: self.cooldown_multiplier,
            widths: FieldWidths {
                pair: self.pair_width,
                percent: self.percent_width,
                price: self.price_width,
                historical: self.historical_width,
            },
            webhook_enabled: self.webhook_enabled,
            debug: self.debug,
            show_initial_alert: self.show_initial_alert,
        }
    }

    pub fn log_format(&self) -> LogFormat {
        if self.app_env.eq_ignore_ascii_case("production") {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Webhook URL when webhook delivery is on and a non-blank URL was given.
    pub fn active_webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| self.webhook_enabled && !url.is_empty())
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}
