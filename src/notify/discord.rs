//! Discord webhook delivery.
//!
//! Plain `{"content": …}` posts to a configured webhook URL. Nothing in
//! the response body is consumed beyond the status.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::Notifier;
use crate::types::WatchError;

pub struct DiscordWebhook {
    http: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for Discord")?;

        Ok(Self { http, url })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn post(&self, content: &str) -> Result<()> {
        let payload = serde_json::json!({ "content": content });

        let resp = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("Discord webhook request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(WatchError::Notify(format!("webhook returned {status}")).into());
        }

        debug!(len = content.len(), "Webhook message delivered");
        Ok(())
    }
}
