use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one scanner tick. `pairs` is recorded once the list is loaded.
pub fn tick_span(tick: u64, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "tick",
        tick = tick,
        trace_id = %trace_id.as_str(),
        pairs = field::Empty
    )
}

/// Await `fut` and warn when it takes longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = max.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
