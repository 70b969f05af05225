// src/notify/telegram.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{excerpt, BriefNotice, Channel, Notifier};
use crate::config::TelegramConfig;

const SUMMARY_MAX_CHARS: usize = 500;

pub struct TelegramNotifier {
    endpoint: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Self {
        Self {
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
            client: Client::new(),
            timeout,
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

pub(crate) fn message_text(notice: &BriefNotice) -> String {
    format!(
        "*{}*\n\n{}\n\n[Read the full brief]({})\n\n_Generated automatically by Trading Intelligence_",
        notice.title(),
        excerpt(&notice.summary, SUMMARY_MAX_CHARS),
        notice.url
    )
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn send(&self, notice: &BriefNotice) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message_text(notice),
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };
        self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("telegram post")?
            .error_for_status()
            .context("telegram non-2xx")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn summary_is_capped() {
        let notice = BriefNotice {
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            summary: "x".repeat(900),
            url: "https://example.test/".into(),
            sent_at: Utc::now(),
        };
        let text = message_text(&notice);
        assert!(text.starts_with("*Daily Trading Brief - 2026-01-02*"));
        assert!(!text.contains(&"x".repeat(501)));
        assert!(text.contains("(https://example.test/)"));
    }
}
