// src/notify/email.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{BriefNotice, Channel, Notifier};
use crate::config::EmailConfig;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// Validates host and addresses up front; nothing is sent here.
    pub fn new(config: &EmailConfig, timeout: Duration) -> Result<Self> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .with_context(|| format!("invalid SMTP host {}", config.host))?
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        let from = config
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", config.from))?;
        let to = config
            .to
            .parse()
            .with_context(|| format!("invalid recipient address {}", config.to))?;

        Ok(Self { mailer, from, to })
    }
}

pub(crate) fn plain_body(notice: &BriefNotice) -> String {
    format!(
        "{}\n\n{}\n\nFull brief: {}\n",
        notice.title(),
        notice.summary,
        notice.url
    )
}

#[async_trait]
impl Notifier for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, notice: &BriefNotice) -> Result<()> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notice.title())
            .header(header::ContentType::TEXT_PLAIN)
            .body(plain_body(notice))
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}
