// src/notify/mod.rs
//! Notification fan-out: announce a freshly published brief on every configured
//! channel. One attempt per channel; failures are logged and reported, never raised.

pub mod discord;
pub mod email;
pub mod slack;
pub mod telegram;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use serde::Serialize;

use crate::config::{NotifyConfig, SiteConfig};
use crate::store::Document;

/// Used when the brief has no executive summary section.
pub const DEFAULT_SUMMARY: &str = "Today's brief is ready. Open the site for the full report.";

const SUMMARY_HEADING: &str = "executive summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Telegram,
    Discord,
    Slack,
    Email,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Telegram,
        Channel::Discord,
        Channel::Slack,
        Channel::Email,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Telegram => "telegram",
            Channel::Discord => "discord",
            Channel::Slack => "slack",
            Channel::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What every channel announces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefNotice {
    pub date: NaiveDate,
    pub summary: String,
    pub url: String,
    pub sent_at: DateTime<Utc>,
}

impl BriefNotice {
    pub fn from_document(doc: &Document, max_lines: usize, url: &str, now: DateTime<Utc>) -> Self {
        Self {
            date: doc.date,
            summary: extract_summary(&doc.body, max_lines)
                .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
            url: url.to_string(),
            sent_at: now,
        }
    }

    pub fn title(&self) -> String {
        format!("Daily Trading Brief - {}", self.date.format("%Y-%m-%d"))
    }
}

/// Lines after the first heading mentioning "Executive Summary", up to the next
/// `##` heading, capped at `max_lines` and trimmed. `None` when absent or empty.
pub fn extract_summary(markdown: &str, max_lines: usize) -> Option<String> {
    let mut lines = markdown.lines();
    lines.find(|l| l.starts_with('#') && l.to_lowercase().contains(SUMMARY_HEADING))?;
    let body: Vec<&str> = lines
        .take_while(|l| !l.starts_with("##"))
        .take(max_lines)
        .collect();
    let summary = body.join("\n").trim().to_string();
    (!summary.is_empty()).then_some(summary)
}

/// Char-boundary safe excerpt.
pub(crate) fn excerpt(s: &str, max_chars: usize) -> String {
    crate::prompt::truncate_chars(s, max_chars)
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    async fn send(&self, notice: &BriefNotice) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    NotConfigured,
    Delivered,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub outcomes: BTreeMap<Channel, ChannelOutcome>,
}

impl NotifyReport {
    pub fn delivered(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| **o == ChannelOutcome::Delivered)
            .count()
    }

    pub fn outcome(&self, channel: Channel) -> &ChannelOutcome {
        self.outcomes
            .get(&channel)
            .unwrap_or(&ChannelOutcome::NotConfigured)
    }
}

/// Every configured channel, in [`Channel::ALL`] order.
#[derive(Default)]
pub struct NotifierMux {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Channels without a config block are skipped. A channel whose config cannot
    /// be turned into a sender (bad SMTP host, bad address) is logged and skipped.
    pub fn from_config(config: &NotifyConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

        if let Some(t) = &config.telegram {
            notifiers.push(Box::new(telegram::TelegramNotifier::new(t, timeout)));
        }
        if let Some(d) = &config.discord {
            notifiers.push(Box::new(discord::DiscordNotifier::new(&d.webhook_url, timeout)));
        }
        if let Some(s) = &config.slack {
            notifiers.push(Box::new(slack::SlackNotifier::new(&s.webhook_url, timeout)));
        }
        if let Some(e) = &config.email {
            match email::EmailSender::new(e, timeout) {
                Ok(sender) => notifiers.push(Box::new(sender)),
                Err(err) => tracing::warn!(error = %format!("{err:#}"), "email channel misconfigured, skipping"),
            }
        }

        Self { notifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.notifiers.iter().map(|n| n.channel()).collect()
    }

    /// Send to every channel sequentially. Never fails.
    pub async fn notify(&self, notice: &BriefNotice) -> NotifyReport {
        let mut report = NotifyReport::default();
        if self.notifiers.is_empty() {
            tracing::info!(date = %notice.date, "no notification channel configured");
        }
        for n in &self.notifiers {
            let channel = n.channel();
            let outcome = match n.send(notice).await {
                Ok(()) => {
                    tracing::info!(%channel, date = %notice.date, "notification sent");
                    counter!("brief_notifications_total", "channel" => channel.as_str(), "outcome" => "delivered")
                        .increment(1);
                    ChannelOutcome::Delivered
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    tracing::warn!(%channel, error = %reason, "notification failed");
                    counter!("brief_notifications_total", "channel" => channel.as_str(), "outcome" => "failed")
                        .increment(1);
                    ChannelOutcome::Failed(reason)
                }
            };
            report.outcomes.insert(channel, outcome);
        }
        report
    }
}

/// Public URL the notices point at.
pub fn notice_url(site: &SiteConfig) -> &str {
    site.public_url_or_placeholder()
}

#[derive(Debug, Serialize)]
struct ChannelLog {
    configured: bool,
    delivered: bool,
}

#[derive(Debug, Serialize)]
struct NotificationLog {
    timestamp: DateTime<Utc>,
    date: NaiveDate,
    summary_length: usize,
    channels: BTreeMap<Channel, ChannelLog>,
}

/// Best-effort JSON record of the last notification run.
pub fn write_log(path: &Path, notice: &BriefNotice, report: &NotifyReport) {
    let log = NotificationLog {
        timestamp: notice.sent_at,
        date: notice.date,
        summary_length: notice.summary.chars().count(),
        channels: Channel::ALL
            .into_iter()
            .map(|c| {
                let outcome = report.outcome(c);
                let entry = ChannelLog {
                    configured: *outcome != ChannelOutcome::NotConfigured,
                    delivered: *outcome == ChannelOutcome::Delivered,
                };
                (c, entry)
            })
            .collect(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "cannot create notification log dir");
            return;
        }
    }
    let bytes = serde_json::to_vec_pretty(&log).unwrap_or_default();
    if let Err(e) = std::fs::write(path, bytes) {
        tracing::warn!(path = %path.display(), error = %e, "write notification log");
    }
}
