// src/notify/discord.rs
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{excerpt, BriefNotice, Channel, Notifier};

const DESCRIPTION_MAX_CHARS: usize = 1000;
const EMBED_COLOR: u32 = 5_814_783;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook: &str, timeout: Duration) -> Self {
        Self {
            webhook: webhook.to_string(),
            client: Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn channel(&self) -> Channel {
        Channel::Discord
    }

    async fn send(&self, notice: &BriefNotice) -> Result<()> {
        let payload = DiscordWebhookPayload::brief(notice);
        let rsp = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("Discord webhook request failed: {e}"))?;
        rsp.error_for_status_ref()
            .map_err(|e| anyhow!("Discord webhook HTTP error: {e}"))?;
        Ok(())
    }
}

#[derive(Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Serialize)]
struct EmbedFooter {
    text: String,
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
    timestamp: String,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn brief(notice: &BriefNotice) -> Self {
        Self {
            embeds: vec![DiscordEmbed {
                title: notice.title(),
                description: excerpt(&notice.summary, DESCRIPTION_MAX_CHARS),
                color: EMBED_COLOR,
                fields: vec![EmbedField {
                    name: "Full brief".to_string(),
                    value: format!("[Open]({})", notice.url),
                    inline: true,
                }],
                footer: EmbedFooter {
                    text: "Trading Intelligence".to_string(),
                },
                timestamp: notice.sent_at.to_rfc3339(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn embed_shape() {
        let notice = BriefNotice {
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            summary: "y".repeat(1500),
            url: "https://example.test/".into(),
            sent_at: Utc::now(),
        };
        let v = serde_json::to_value(DiscordWebhookPayload::brief(&notice)).unwrap();
        let embed = &v["embeds"][0];
        assert_eq!(embed["color"], 5814783);
        assert_eq!(embed["description"].as_str().unwrap().chars().count(), 1000);
        assert_eq!(embed["fields"][0]["value"], "[Open](https://example.test/)");
    }
}
