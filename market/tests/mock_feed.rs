#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use market::feed::{NotificationSink, PairCatalog, PriceFeed};
use market::types::Pair;

/// Scripted prices. Pairs without a price fail every attempt.
#[derive(Default)]
pub struct MockFeed {
    prices: Mutex<HashMap<Pair, f64>>,
    pub calls: AtomicUsize,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(Pair::usd(symbol), price);
    }

    pub fn fail(&self, symbol: &str) {
        self.prices.lock().unwrap().remove(&Pair::usd(symbol));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    async fn spot_price(&self, pair: &Pair) -> anyhow::Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prices
            .lock()
            .unwrap()
            .get(pair)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("timeout fetching {}", pair.id()))
    }
}

pub struct MockCatalog {
    result: Mutex<Result<Vec<Pair>, String>>,
}

impl MockCatalog {
    pub fn with(symbols: &[&str]) -> Self {
        Self {
            result: Mutex::new(Ok(symbols.iter().map(Pair::usd).collect())),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Mutex::new(Err("503 Service Unavailable".into())),
        }
    }
}

#[async_trait]
impl PairCatalog for MockCatalog {
    async fn active_pairs(&self) -> anyhow::Result<Vec<Pair>> {
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(anyhow::Error::msg)
    }
}

/// Collects every delivered message; optionally fails every delivery.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.failing {
            anyhow::bail!("webhook returned 500");
        }
        Ok(())
    }
}
