//! Notification rendering.
//!
//! Both renderings share one body layout:
//!
//! ```text
//! {sign}{glyph} {percent} {[PAIR]} {$price} {[60m +x.xx%]}{hglyph}{hsign} ({note})
//! ```
//!
//! The console form separates fields with tabs and is prefixed with a
//! `[YYYY-MM-DD HH:MM:SS]` timestamp; the webhook form wraps the fields in a
//! code span and links the pair's trading page. Rendering is pure: the
//! timestamp is an input.

use chrono::NaiveDateTime;

use crate::config::FormatConfig;
use crate::types::{MovementEvent, Pair};

pub const TRADE_URL_BASE: &str = "https://www.coinbase.com/advanced-trade/spot";
pub const CONSOLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity ladder over `|change|` in percent.
pub fn severity_glyph(change: f64) -> &'static str {
    let magnitude = change.abs();
    if magnitude < 1.0 {
        "\u{25AA}\u{FE0F}"
    } else if magnitude < 2.0 {
        "\u{25FC}"
    } else if magnitude < 3.0 {
        "🟫"
    } else if magnitude < 4.0 {
        "🟪"
    } else if magnitude < 5.0 {
        "🟦"
    } else if magnitude < 6.0 {
        "🟩"
    } else if magnitude < 7.0 {
        "🟨"
    } else if magnitude < 8.0 {
        "🟧"
    } else if magnitude < 9.0 {
        "🟥"
    } else {
        "💥"
    }
}

pub fn direction_marker(change: f64) -> &'static str {
    if change > 0.0 { "🔹" } else { "🔸" }
}

// Padding helpers. Width counts chars; longer text is returned whole.

pub fn pad_right(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

pub fn pad_left(text: &str, width: usize) -> String {
    format!("{text:>width$}")
}

pub fn center(text: &str, width: usize) -> String {
    format!("{text:^width$}")
}

/// Rendered message pair for one movement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub pair: Pair,
    pub console: String,
    pub webhook: String,
}

#[derive(Clone, Debug)]
pub struct NotificationFormatter {
    cfg: FormatConfig,
}

impl NotificationFormatter {
    pub fn new(cfg: FormatConfig) -> Self {
        Self { cfg }
    }

    pub fn render(&self, event: &MovementEvent, generated_at: NaiveDateTime) -> Notification {
        let (console, webhook) = self.format_parts(
            &event.pair,
            event.percentage_change,
            event.current_price,
            event.historical_percentage_change,
            &event.note,
            generated_at,
        );
        Notification {
            pair: event.pair.clone(),
            console,
            webhook,
        }
    }

    /// Returns `(console_text, webhook_text)`.
    pub fn format_parts(
        &self,
        pair: &Pair,
        change: f64,
        price: f64,
        historical_change: f64,
        note: &str,
        generated_at: NaiveDateTime,
    ) -> (String, String) {
        let w = self.cfg.widths;

        let sign = direction_marker(change);
        let glyph = severity_glyph(change);
        let hist_sign = direction_marker(historical_change);
        let hist_glyph = severity_glyph(historical_change);

        let hist_plus = if historical_change > 0.0 { "+" } else { "" };
        let hist_label = format!(
            "[{}m {hist_plus}{historical_change:.2}%]",
            self.cfg.historical_minutes
        );

        let percent = pad_right(&format!("{change:+.2}%"), w.percent);
        let pair_col = center(&format!("[{}]", pair.symbol()), w.pair);
        let price_col = center(&format!("${price:.5}"), w.price);
        let hist_col = pad_left(&hist_label, w.historical);

        let mut console = format!(
            "[{}] {sign}{glyph}\t{percent}\t{pair_col}\t{price_col}\t{hist_col}{hist_glyph}{hist_sign}",
            generated_at.format(CONSOLE_TIMESTAMP_FORMAT)
        );
        let mut webhook = format!(
            "{sign}{glyph}`{percent}{pair_col}{price_col}{hist_col}`{hist_glyph}{hist_sign}[{symbol}](<{TRADE_URL_BASE}/{id}>)",
            symbol = pair.symbol(),
            id = pair.id(),
        );

        if !note.is_empty() {
            console.push_str(&format!(" ({note})"));
            webhook.push_str(&format!(" ({note})"));
        }

        (console, webhook)
    }
}

/// Join lines with `\n` into as few messages as fit in `max_chars` each.
///
/// A single line longer than `max_chars` is sent on its own, untruncated.
pub fn batch_lines<S: AsRef<str>>(lines: &[S], max_chars: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in lines {
        let line = line.as_ref();
        let line_chars = line.chars().count();
        let needed = if current.is_empty() {
            line_chars
        } else {
            current_chars + 1 + line_chars
        };

        if !current.is_empty() && needed > max_chars {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_chars += 1;
        }
        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
