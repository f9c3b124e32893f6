pub mod cli;

use std::sync::Arc;

use adapters::coinbase::CoinbaseClient;
use adapters::console::ConsoleSink;
use adapters::discord::DiscordWebhook;
use anyhow::Context;
use clap::Parser;
use common::logger::init_logger;
use market::Scanner;
use market::feed::NotificationSink;
use market::pairs::PairListFile;
use market::scanner::Sinks;
use tracing::{info, warn};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("spot-scanner", cli.log_level(), cli.log_format());

    let cfg = cli.into_config();
    cfg.validate().context("invalid scanner configuration")?;

    let coinbase = Arc::new(
        CoinbaseClient::new(&cli.spot_url, &cli.exchange_url, cli.http_timeout())
            .context("failed to build coinbase client")?,
    );

    let webhook: Option<Arc<dyn NotificationSink>> = match cli.active_webhook_url() {
        Some(url) => Some(Arc::new(
            DiscordWebhook::new(url, cli.http_timeout()).context("failed to build webhook client")?,
        )),
        None => {
            warn!(
                webhook_enabled = cfg.webhook_enabled,
                "no webhook configured; notifications go to console only"
            );
            None
        }
    };

    let sinks = Sinks {
        console: Arc::new(ConsoleSink),
        webhook,
    };

    info!(
        pairs_file = %cli.pairs_file.display(),
        debug = cfg.debug,
        "bootstrapping scanner"
    );

    let scanner = Scanner::new(
        cfg,
        Arc::clone(&coinbase),
        coinbase,
        PairListFile::new(cli.pairs_file.clone()),
        sinks,
        chrono::Utc::now(),
    );

    scanner
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
