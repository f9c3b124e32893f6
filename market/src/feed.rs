//! Collaborator seams of the scanner.
//!
//! Implementations live in the `adapters` crate; tests use in-memory mocks.

use async_trait::async_trait;

use crate::types::Pair;

/// Current spot price of a single pair.
#[async_trait]
pub trait PriceFeed: Send + Sync + 'static {
    /// One attempt. Retrying is the caller's job.
    async fn spot_price(&self, pair: &Pair) -> anyhow::Result<f64>;
}

/// Catalog of pairs currently eligible for USD trading.
#[async_trait]
pub trait PairCatalog: Send + Sync + 'static {
    /// Sorted, unique, upper-cased pairs.
    async fn active_pairs(&self) -> anyhow::Result<Vec<Pair>>;
}

/// Destination for pre-formatted notification text.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &str) -> anyhow::Result<()>;
}
