//! Scanner loop
//!
//! Runs the fixed-cadence pipeline:
//! pair list → concurrent price fetch (with retry) → MarketManager → sinks
//!
//! Ticks never overlap: the next tick waits for the previous one to finish
//! dispatching. The catalog refresh runs on its own, much longer interval
//! in a background task so a slow catalog never delays price evaluation.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use common::logger::{TraceId, tick_span, warn_if_slow};
use futures::StreamExt;
use futures::stream;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{Instrument, Span, debug, error, info, warn};

use crate::config::ScannerConfig;
use crate::feed::{NotificationSink, PairCatalog, PriceFeed};
use crate::format::{Notification, batch_lines};
use crate::manager::{EvaluationStats, MarketManager, PriceMap};
use crate::pairs::{PairListFile, PairListUpdate};
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::time::to_delta;
use crate::types::Pair;

/// Discord rejects messages above this many characters.
pub const WEBHOOK_MAX_CHARS: usize = 2000;

/// Where rendered text goes.
#[derive(Clone)]
pub struct Sinks {
    pub console: Arc<dyn NotificationSink>,
    pub webhook: Option<Arc<dyn NotificationSink>>,
}

/// Summary of one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub pairs: usize,
    pub fetched: usize,
    pub failed: usize,
    pub stats: EvaluationStats,
}

/// Pull the catalog and persist it. Failures are logged and leave the file as is.
pub async fn refresh_pair_list<C: PairCatalog + ?Sized>(
    catalog: &C,
    file: &PairListFile,
) -> Option<PairListUpdate> {
    let current = match catalog.active_pairs().await {
        Ok(pairs) => pairs,
        Err(e) => {
            error!(error = %e, "failed to fetch pair catalog; keeping previous list");
            return None;
        }
    };

    match file.sync(&current).await {
        Ok(update) => {
            match &update {
                PairListUpdate::Created { count } => {
                    info!(path = %file.path().display(), count, "pair list created")
                }
                PairListUpdate::Updated { added, removed } => info!(
                    path = %file.path().display(),
                    added = ?added.iter().map(Pair::symbol).collect::<Vec<_>>(),
                    removed = ?removed.iter().map(Pair::symbol).collect::<Vec<_>>(),
                    "pair list updated"
                ),
                PairListUpdate::Unchanged => {
                    info!(path = %file.path().display(), "no changes in active pairs")
                }
            }
            Some(update)
        }
        Err(e) => {
            error!(error = %e, "failed to persist pair list");
            None
        }
    }
}

pub struct Scanner<F, C> {
    cfg: ScannerConfig,
    feed: Arc<F>,
    catalog: Arc<C>,
    pairs_file: PairListFile,
    sinks: Sinks,
    manager: MarketManager,
    retry: RetryPolicy,

    /// Last successfully loaded pair list.
    pairs: Vec<Pair>,

    started_at: DateTime<Utc>,
    initialization_announced: bool,
    last_refresh: Option<Instant>,
    refresh_task: Option<JoinHandle<()>>,
    ticks: u64,
}

impl<F: PriceFeed, C: PairCatalog> Scanner<F, C> {
    pub fn new(
        cfg: ScannerConfig,
        feed: Arc<F>,
        catalog: Arc<C>,
        pairs_file: PairListFile,
        sinks: Sinks,
        started_at: DateTime<Utc>,
    ) -> Self {
        let manager = MarketManager::new(&cfg);
        let retry = RetryPolicy::new(cfg.retry_attempts, cfg.retry_delay);
        Self {
            cfg,
            feed,
            catalog,
            pairs_file,
            sinks,
            manager,
            retry,
            pairs: Vec::new(),
            started_at,
            initialization_announced: false,
            last_refresh: None,
            refresh_task: None,
            ticks: 0,
        }
    }

    pub fn manager(&self) -> &MarketManager {
        &self.manager
    }

    pub fn initialization_announced(&self) -> bool {
        self.initialization_announced
    }

    /// Startup notice, then a blocking first catalog refresh so the first
    /// tick has pairs to look at.
    pub async fn start(&mut self) {
        if self.cfg.show_initial_alert {
            let msg = self.cfg.initial_alert_message();
            self.announce(&msg).await;
        }
        self.refresh_pairs().await;
    }

    /// Refresh the persisted pair list now, in the caller's task.
    pub async fn refresh_pairs(&mut self) -> Option<PairListUpdate> {
        self.last_refresh = Some(Instant::now());
        refresh_pair_list(self.catalog.as_ref(), &self.pairs_file).await
    }

    fn maybe_spawn_refresh(&mut self) {
        let due = self
            .last_refresh
            .is_none_or(|t| t.elapsed() >= self.cfg.pair_refresh_interval);
        let in_flight = self
            .refresh_task
            .as_ref()
            .is_some_and(|task| !task.is_finished());
        if !due || in_flight {
            return;
        }

        self.last_refresh = Some(Instant::now());
        let catalog = Arc::clone(&self.catalog);
        let file = self.pairs_file.clone();
        self.refresh_task = Some(tokio::spawn(
            async move {
                refresh_pair_list(catalog.as_ref(), &file).await;
            }
            .instrument(tracing::info_span!("pair_refresh")),
        ));
    }

    async fn load_pairs(&mut self) {
        match self.pairs_file.load().await {
            Ok(pairs) => self.pairs = pairs,
            Err(e) => warn!(error = %e, kept = self.pairs.len(), "failed to read pair list; keeping previous"),
        }
    }

    async fn fetch_prices(&self) -> PriceMap {
        let feed = self.feed.as_ref();
        let policy = self.retry;

        stream::iter(self.pairs.iter().cloned())
            .map(|pair| async move {
                let price = fetch_with_retry(feed, &pair, policy).await;
                (pair, price)
            })
            .buffer_unordered(self.cfg.fetch_concurrency.max(1))
            .collect()
            .await
    }

    /// One full pipeline pass at wall-clock `now`.
    pub async fn run_tick(&mut self, now: DateTime<Utc>) -> TickReport {
        self.ticks += 1;
        self.maybe_spawn_refresh();
        self.load_pairs().await;
        Span::current().record("pairs", self.pairs.len());

        self.manager.track(&self.pairs);

        let prices = self.fetch_prices().await;
        let fetched = prices.values().filter(|p| p.is_some()).count();
        debug!(?prices, "fetched prices");

        self.manager.ingest(&prices, now);
        let generated_at = now.with_timezone(&Local).naive_local();
        let (notifications, stats) = self.manager.evaluate(now, generated_at);

        self.dispatch(&notifications).await;
        self.maybe_announce_initialized(now).await;

        TickReport {
            pairs: self.pairs.len(),
            fetched,
            failed: prices.len() - fetched,
            stats,
        }
    }

    async fn dispatch(&self, notifications: &[Notification]) {
        if notifications.is_empty() {
            return;
        }

        for n in notifications {
            deliver(self.sinks.console.as_ref(), &n.console).await;
        }

        // Debug runs keep movement alerts off the shared channel.
        if self.cfg.debug {
            return;
        }
        if let Some(webhook) = self.webhook() {
            let lines: Vec<&str> = notifications.iter().map(|n| n.webhook.as_str()).collect();
            for batch in batch_lines(&lines, WEBHOOK_MAX_CHARS) {
                deliver(webhook, &batch).await;
            }
        }
    }

    async fn announce(&self, message: &str) {
        info!(text = message, "lifecycle announcement");
        deliver(self.sinks.console.as_ref(), message).await;
        if let Some(webhook) = self.webhook() {
            deliver(webhook, message).await;
        }
    }

    async fn maybe_announce_initialized(&mut self, now: DateTime<Utc>) {
        if self.initialization_announced {
            return;
        }
        let Some(ready_at) = self
            .started_at
            .checked_add_signed(to_delta(self.cfg.historical_window))
        else {
            return;
        };
        if now >= ready_at {
            let msg = self.cfg.post_initialization_message();
            self.announce(&msg).await;
            self.initialization_announced = true;
        }
    }

    fn webhook(&self) -> Option<&dyn NotificationSink> {
        if !self.cfg.webhook_enabled {
            return None;
        }
        self.sinks.webhook.as_deref()
    }

    /// Run until `shutdown` resolves.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        info!(
            every_ms = self.cfg.fetch_interval.as_millis() as u64,
            refresh_every_s = self.cfg.pair_refresh_interval.as_secs(),
            path = %self.pairs_file.path().display(),
            "scanner started"
        );

        self.start().await;

        let mut ticker = interval(self.cfg.fetch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let trace_id = TraceId::default();
            let span = tick_span(self.ticks + 1, &trace_id);
            let budget = self.cfg.fetch_interval;
            let report = warn_if_slow("scanner_tick", budget, self.run_tick(crate::time::now()))
                .instrument(span)
                .await;

            debug!(
                trace_id = %trace_id,
                pairs = report.pairs,
                fetched = report.fetched,
                failed = report.failed,
                emitted = report.stats.emitted,
                suppressed = report.stats.suppressed_cooldown + report.stats.suppressed_price,
                "tick complete"
            );
        }

        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        Ok(())
    }
}

async fn deliver(sink: &dyn NotificationSink, message: &str) {
    if let Err(e) = sink.deliver(message).await {
        warn!(sink = sink.name(), error = %e, "notification delivery failed");
    }
}
