// src/notify/slack.rs
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::{BriefNotice, Channel, Notifier};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            webhook_url: url.to_string(),
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> Channel {
        Channel::Slack
    }

    async fn send(&self, notice: &BriefNotice) -> Result<()> {
        let text = format!(
            "*{}*\n{}\n<{}|Read the full brief>",
            notice.title(),
            notice.summary,
            notice.url
        );
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }
}
