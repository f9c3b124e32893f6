pub mod webhook;

pub use webhook::{DiscordWebhook, WebhookError};
