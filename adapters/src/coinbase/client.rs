use std::time::Duration;

use async_trait::async_trait;
use market::Pair;
use market::feed::{PairCatalog, PriceFeed};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::coinbase::errors::CoinbaseError;
use crate::coinbase::parser::{parse_spot_price, select_quoted_pairs};
use crate::coinbase::types::{Product, SpotEnvelope};

pub const DEFAULT_SPOT_URL: &str = "https://api.coinbase.com/v2";
pub const DEFAULT_EXCHANGE_URL: &str = "https://api.exchange.coinbase.com";

/// Public, unauthenticated Coinbase endpoints: retail spot prices and the
/// exchange product catalog.
#[derive(Clone)]
pub struct CoinbaseClient {
    http: Client,
    spot_url: String,
    exchange_url: String,
}

impl CoinbaseClient {
    pub fn new(
        spot_url: impl Into<String>,
        exchange_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CoinbaseError> {
        // The exchange API rejects requests without a user agent.
        let http = Client::builder()
            .user_agent(concat!("spot-scanner/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            spot_url: trim_base(spot_url.into()),
            exchange_url: trim_base(exchange_url.into()),
        })
    }

    #[instrument(skip(self), fields(pair = %pair.id()), level = "debug")]
    pub async fn fetch_spot_price(&self, pair: &Pair) -> Result<f64, CoinbaseError> {
        let url = format!("{}/prices/{}/spot", self.spot_url, pair.id());

        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let envelope: SpotEnvelope = resp.json().await?;
        let price = parse_spot_price(&envelope)?;

        debug!(price, "coinbase spot fetched");
        Ok(price)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_usd_pairs(&self) -> Result<Vec<Pair>, CoinbaseError> {
        let url = format!("{}/products", self.exchange_url);

        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let products: Vec<Product> = resp.json().await?;
        let pairs = select_quoted_pairs(&products, Pair::DEFAULT_QUOTE);

        debug!(
            products = products.len(),
            usd_pairs = pairs.len(),
            "coinbase products fetched"
        );
        Ok(pairs)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl PriceFeed for CoinbaseClient {
    async fn spot_price(&self, pair: &Pair) -> anyhow::Result<f64> {
        Ok(self.fetch_spot_price(pair).await?)
    }
}

#[async_trait]
impl PairCatalog for CoinbaseClient {
    async fn active_pairs(&self) -> anyhow::Result<Vec<Pair>> {
        Ok(self.fetch_usd_pairs().await?)
    }
}
