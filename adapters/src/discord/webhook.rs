use std::time::Duration;

use async_trait::async_trait;
use market::feed::NotificationSink;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected message with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts plain-text messages to a Discord channel webhook.
#[derive(Clone)]
pub struct DiscordWebhook {
    http: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WebhookError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    #[instrument(skip(self, content), fields(chars = content.chars().count()), level = "debug")]
    pub async fn post(&self, content: &str) -> Result<(), WebhookError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&WebhookPayload { content })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WebhookError::Rejected { status, body });
        }

        debug!(%status, "webhook delivered");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(&self, message: &str) -> anyhow::Result<()> {
        Ok(self.post(message).await?)
    }
}
